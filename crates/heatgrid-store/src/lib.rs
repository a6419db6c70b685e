#![deny(missing_docs)]
#![doc = "File-backed persistence for heatgrid grids, reduced grids, heatmaps and criteria."]

mod io;
/// Per-key write serialization.
pub mod locks;
/// Directory enumeration helpers.
pub mod listing;
pub mod points;

use std::path::{Path, PathBuf};

use heatgrid_core::errors::{ErrorInfo, HeatgridError};
use heatgrid_core::serde_io::{from_json_slice, from_yaml_slice, to_canonical_json_bytes};
use heatgrid_core::{
    heatmap_key, CriteriaRegistry, CriteriaSet, CriteriaSetDef, Coordinate, Grid,
    HeatmapArtifact, ReducedGrid,
};
use serde::Serialize;
use tracing::{debug, warn};

use io::{read_optional, write_atomic};
use listing::{list_files, list_nested};

pub use locks::KeyLocks;
pub use points::{decode_points, DecodedPoints, RejectedPoint};

/// Directory holding source grids.
pub const GRIDS_DIR: &str = "grids";
/// Directory holding reduced grids.
pub const REDUCED_DIR: &str = "reduced";
/// Directory holding heatmap artefacts, one sub-directory per grid.
pub const HEATMAPS_DIR: &str = "heatmaps";
/// Directory holding criteria set definitions.
pub const CRITERIA_DIR: &str = "criteria";
/// Directory holding feature datasets referenced by criteria.
pub const DATASETS_DIR: &str = "datasets";
/// Directory holding files exported for the front end.
pub const STATIC_DIR: &str = "static";
/// Directory holding batch reports.
pub const REPORTS_DIR: &str = "reports";

/// Grid loaded from the store with the points that were skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedGrid {
    /// Valid points under the requested basename.
    pub grid: Grid,
    /// Malformed source points that were skipped.
    pub rejected: Vec<RejectedPoint>,
}

/// Store rooted at a directory, keyed by basename.
#[derive(Debug)]
pub struct GridStore {
    root: PathBuf,
    strict: bool,
    locks: KeyLocks,
}

impl GridStore {
    /// Opens a store rooted at `root`. Directories are created lazily on write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            strict: false,
            locks: KeyLocks::default(),
        }
    }

    /// Fails grid loads on the first malformed point instead of skipping it.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether strict point decoding is enabled.
    pub fn strict(&self) -> bool {
        self.strict
    }

    /// Runs `f` while holding the write lock for `key`.
    pub fn with_key_lock<T>(&self, key: &str, f: impl FnOnce() -> T) -> T {
        self.locks.with_key(key, f)
    }

    fn grid_path(&self, basename: &str) -> PathBuf {
        self.root.join(GRIDS_DIR).join(format!("{basename}.json"))
    }

    fn reduced_path(&self, basename: &str) -> PathBuf {
        self.root.join(REDUCED_DIR).join(format!("{basename}.json"))
    }

    fn heatmap_path(&self, grid: &str, criteria: &str) -> PathBuf {
        self.root
            .join(HEATMAPS_DIR)
            .join(grid)
            .join(format!("{criteria}.json"))
    }

    /// Loads a source grid, falling back to a reduced grid of the same basename.
    pub fn load_grid(&self, basename: &str) -> Result<LoadedGrid, HeatgridError> {
        let path = self.grid_path(basename);
        if let Some(bytes) = read_optional(&path)? {
            let decoded = decode_points(&bytes, self.strict).map_err(|info| {
                HeatgridError::GridNotFound(
                    info.with_context("grid", basename)
                        .with_context("path", path.display()),
                )
            })?;
            for rejected in &decoded.rejected {
                warn!(
                    grid = basename,
                    index = rejected.index,
                    reason = %rejected.reason,
                    "skipping malformed grid point"
                );
            }
            debug!(grid = basename, points = decoded.points.len(), "loaded grid");
            return Ok(LoadedGrid {
                grid: Grid::new(basename, decoded.points),
                rejected: decoded.rejected,
            });
        }
        match self.load_reduced(basename) {
            Ok(reduced) => Ok(LoadedGrid {
                grid: reduced.to_grid(),
                rejected: Vec::new(),
            }),
            Err(HeatgridError::GridNotFound(_)) => Err(HeatgridError::GridNotFound(
                ErrorInfo::new("grid-missing", "no grid stored under this basename")
                    .with_context("grid", basename)
                    .with_context("path", path.display()),
            )),
            Err(err) => Err(err),
        }
    }

    /// Writes a source grid as a `[lon, lat]` array.
    pub fn dump_grid(&self, grid: &Grid) -> Result<(), HeatgridError> {
        let path = self.grid_path(&grid.basename);
        let bytes = to_canonical_json_bytes(&grid.points)?;
        self.with_key_lock(&format!("{GRIDS_DIR}/{}", grid.basename), || {
            write_atomic(&path, &bytes)
        })?;
        debug!(grid = %grid.basename, points = grid.len(), "wrote grid");
        Ok(())
    }

    /// Loads a reduced grid by its reduced basename.
    pub fn load_reduced(&self, basename: &str) -> Result<ReducedGrid, HeatgridError> {
        let path = self.reduced_path(basename);
        let bytes = read_optional(&path)?.ok_or_else(|| {
            HeatgridError::GridNotFound(
                ErrorInfo::new("reduced-missing", "no reduced grid stored under this basename")
                    .with_context("grid", basename),
            )
        })?;
        from_json_slice(&bytes).map_err(|err| malformed(basename, &path, err))
    }

    /// Writes a reduced grid under its own basename.
    pub fn dump_reduced(&self, reduced: &ReducedGrid) -> Result<(), HeatgridError> {
        let path = self.reduced_path(&reduced.basename);
        let bytes = to_canonical_json_bytes(reduced)?;
        self.with_key_lock(&format!("{REDUCED_DIR}/{}", reduced.basename), || {
            write_atomic(&path, &bytes)
        })?;
        debug!(grid = %reduced.basename, points = reduced.len(), "wrote reduced grid");
        Ok(())
    }

    /// Loads the heatmap of `grid` under `criteria`.
    pub fn load_heatmap(&self, grid: &str, criteria: &str) -> Result<HeatmapArtifact, HeatgridError> {
        let path = self.heatmap_path(grid, criteria);
        let bytes = read_optional(&path)?.ok_or_else(|| {
            HeatgridError::StoreIo(
                ErrorInfo::new("heatmap-missing", "no heatmap stored for this grid and criteria")
                    .with_context("key", heatmap_key(grid, criteria))
                    .with_context("path", path.display()),
            )
        })?;
        from_json_slice(&bytes)
    }

    /// Writes a heatmap artefact. The caller serializes concurrent writes of one key.
    pub fn dump_heatmap(&self, artifact: &HeatmapArtifact) -> Result<(), HeatgridError> {
        let path = self.heatmap_path(&artifact.grid, &artifact.criteria);
        let bytes = to_canonical_json_bytes(artifact)?;
        write_atomic(&path, &bytes)?;
        debug!(key = %artifact.key(), points = artifact.len(), "wrote heatmap");
        Ok(())
    }

    /// Whether a heatmap has been materialized for the pair.
    pub fn heatmap_exists(&self, grid: &str, criteria: &str) -> bool {
        self.heatmap_path(grid, criteria).is_file()
    }

    /// Loads a feature dataset. Malformed entries are skipped with a warning.
    pub fn load_dataset(&self, name: &str) -> Result<Vec<Coordinate>, HeatgridError> {
        let path = self.root.join(DATASETS_DIR).join(format!("{name}.json"));
        let bytes = read_optional(&path)?.ok_or_else(|| {
            HeatgridError::StoreIo(
                ErrorInfo::new("dataset-missing", "no dataset stored under this name")
                    .with_context("dataset", name)
                    .with_context("path", path.display()),
            )
        })?;
        let decoded = decode_points(&bytes, self.strict).map_err(|info| {
            HeatgridError::StoreIo(info.with_context("dataset", name))
        })?;
        if !decoded.rejected.is_empty() {
            warn!(
                dataset = name,
                rejected = decoded.rejected.len(),
                "skipping malformed dataset points"
            );
        }
        Ok(decoded.points)
    }

    /// Loads a single criteria set definition and resolves its datasets.
    pub fn load_criteria(&self, name: &str) -> Result<CriteriaSet, HeatgridError> {
        let dir = self.root.join(CRITERIA_DIR);
        let path = ["yaml", "yml"]
            .iter()
            .map(|ext| dir.join(format!("{name}.{ext}")))
            .find(|path| path.is_file())
            .ok_or_else(|| {
                HeatgridError::CriteriaNotFound(
                    ErrorInfo::new("criteria-file-missing", "no criteria file with this name")
                        .with_context("criteria", name)
                        .with_context("dir", dir.display()),
                )
            })?;
        let bytes = read_optional(&path)?.unwrap_or_default();
        let def: CriteriaSetDef = from_yaml_slice(&bytes)?;
        CriteriaSet::from_def(def, |dataset| self.load_dataset(dataset))
    }

    /// Writes a criteria set definition as YAML.
    pub fn dump_criteria(&self, def: &CriteriaSetDef) -> Result<(), HeatgridError> {
        let path = self
            .root
            .join(CRITERIA_DIR)
            .join(format!("{}.yaml", def.name));
        let text = heatgrid_core::serde_io::to_yaml_string(def)?;
        write_atomic(&path, text.as_bytes())
    }

    /// Loads every criteria file into an immutable registry.
    pub fn load_registry(&self) -> Result<CriteriaRegistry, HeatgridError> {
        let sets = self
            .list_criteria()?
            .iter()
            .map(|name| self.load_criteria(name))
            .collect::<Result<Vec<_>, _>>()?;
        CriteriaRegistry::new(sets)
    }

    /// Writes a JSON export under `static/`.
    pub fn write_static<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf, HeatgridError> {
        let path = self.root.join(STATIC_DIR).join(name);
        write_atomic(&path, &to_canonical_json_bytes(value)?)?;
        Ok(path)
    }

    /// Writes a batch report under `reports/`.
    pub fn write_report<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf, HeatgridError> {
        let path = self.root.join(REPORTS_DIR).join(format!("{name}.json"));
        write_atomic(&path, &to_canonical_json_bytes(value)?)?;
        Ok(path)
    }

    /// Basenames of source grids.
    pub fn list_heatmap_grids(&self) -> Result<Vec<String>, HeatgridError> {
        list_files(&self.root.join(GRIDS_DIR), &["json"])
    }

    /// Basenames of reduced grids.
    pub fn list_reduced_grids(&self) -> Result<Vec<String>, HeatgridError> {
        list_files(&self.root.join(REDUCED_DIR), &["json"])
    }

    /// Materialized `(grid, criteria)` heatmap pairs.
    pub fn list_heatmaps(&self) -> Result<Vec<(String, String)>, HeatgridError> {
        list_nested(&self.root.join(HEATMAPS_DIR), &["json"])
    }

    /// Names of feature datasets.
    pub fn list_datasets(&self) -> Result<Vec<String>, HeatgridError> {
        list_files(&self.root.join(DATASETS_DIR), &["json"])
    }

    /// Names of criteria definition files.
    pub fn list_criteria(&self) -> Result<Vec<String>, HeatgridError> {
        list_files(&self.root.join(CRITERIA_DIR), &["yaml", "yml"])
    }

    /// File names under `static/`.
    pub fn list_static(&self) -> Result<Vec<String>, HeatgridError> {
        listing::list_file_names(&self.root.join(STATIC_DIR))
    }
}

fn malformed(basename: &str, path: &Path, err: HeatgridError) -> HeatgridError {
    let message = err
        .info()
        .map(|info| info.message.clone())
        .unwrap_or_else(|| err.to_string());
    HeatgridError::GridNotFound(
        ErrorInfo::new("grid-malformed", message)
            .with_context("grid", basename)
            .with_context("path", path.display()),
    )
}
