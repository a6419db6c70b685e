use std::path::Path;

use heatgrid_core::errors::HeatgridError;
use walkdir::WalkDir;

use crate::io::store_error;

fn walk(dir: &Path, depth: usize) -> Result<Vec<walkdir::DirEntry>, HeatgridError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    WalkDir::new(dir)
        .min_depth(depth)
        .max_depth(depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) if entry.file_type().is_file() => Some(Ok(entry)),
            Ok(_) => None,
            Err(err) => Some(Err(store_error("store-list", dir, err))),
        })
        .collect()
}

fn stem_with_extension(path: &Path, extensions: &[&str]) -> Option<String> {
    let ext = path.extension()?.to_str()?;
    if !extensions.contains(&ext) {
        return None;
    }
    path.file_stem()?.to_str().map(str::to_string)
}

/// File stems directly under `dir` with one of `extensions`, sorted.
pub fn list_files(dir: &Path, extensions: &[&str]) -> Result<Vec<String>, HeatgridError> {
    Ok(walk(dir, 1)?
        .iter()
        .filter_map(|entry| stem_with_extension(entry.path(), extensions))
        .collect())
}

/// `(sub-directory, file stem)` pairs one level below `dir`, sorted.
pub fn list_nested(dir: &Path, extensions: &[&str]) -> Result<Vec<(String, String)>, HeatgridError> {
    Ok(walk(dir, 2)?
        .iter()
        .filter_map(|entry| {
            let stem = stem_with_extension(entry.path(), extensions)?;
            let parent = entry.path().parent()?.file_name()?.to_str()?.to_string();
            Some((parent, stem))
        })
        .collect())
}

/// Every file name directly under `dir`, sorted, temporary files excluded.
pub fn list_file_names(dir: &Path) -> Result<Vec<String>, HeatgridError> {
    Ok(walk(dir, 1)?
        .iter()
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| !name.starts_with(".tmp"))
        .collect())
}
