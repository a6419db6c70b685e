use std::fs;
use std::io::{self, Write};
use std::path::Path;

use heatgrid_core::errors::{ErrorInfo, HeatgridError};
use tempfile::NamedTempFile;

pub(crate) fn store_error(code: &str, path: &Path, err: impl ToString) -> HeatgridError {
    HeatgridError::StoreIo(
        ErrorInfo::new(code, err.to_string()).with_context("path", path.display()),
    )
}

/// Reads a file, mapping `NotFound` to `Ok(None)`.
pub(crate) fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, HeatgridError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(store_error("store-read", path, err)),
    }
}

/// Writes `bytes` to a temporary file next to `path`, then renames it over `path`.
///
/// The temporary file is removed on every error path, so readers only ever
/// see the previous content or the complete new content.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), HeatgridError> {
    let parent = path
        .parent()
        .ok_or_else(|| store_error("store-path", path, "path has no parent directory"))?;
    fs::create_dir_all(parent).map_err(|err| store_error("store-dir", parent, err))?;
    let mut tmp = NamedTempFile::new_in(parent).map_err(|err| store_error("store-temp", parent, err))?;
    tmp.write_all(bytes)
        .map_err(|err| store_error("store-write", path, err))?;
    tmp.as_file()
        .sync_all()
        .map_err(|err| store_error("store-sync", path, err))?;
    tmp.persist(path)
        .map_err(|err| store_error("store-rename", path, err.error))?;
    Ok(())
}
