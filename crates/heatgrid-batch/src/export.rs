//! Static JSON exports consumed by the map front end.

use std::collections::BTreeMap;
use std::path::PathBuf;

use heatgrid_core::errors::{HeatgridError, ItemFailure};
use heatgrid_core::{reduced_basename, BoundingBox, HeatmapPoint, Precision, ReductionMethod};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::dispatch::{reduce_unit, BatchRunner};
use crate::report::{BatchReport, JobState};

/// File name of the areas export under `static/`.
pub const AREAS_FILE: &str = "areas.json";

/// Extent of one grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaEntry {
    /// Number of valid points.
    pub points: usize,
    /// Bounding box, `None` for an empty grid.
    pub bbox: Option<BoundingBox>,
}

/// Contents of `static/areas.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreasExport {
    /// Extents keyed by grid basename.
    pub areas: BTreeMap<String, AreaEntry>,
    /// Grids that could not be loaded.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ItemFailure>,
}

/// Contents of `static/heatmaps.<method>-<precision>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapBundle {
    /// Reduction strategy applied to every grid.
    pub method: ReductionMethod,
    /// Reduction resolution.
    pub precision: Precision,
    /// Scored points keyed by criteria name, then by reduced grid basename.
    pub heatmaps: BTreeMap<String, BTreeMap<String, Vec<HeatmapPoint>>>,
}

/// What [`BatchRunner::export_bundle`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleExport {
    /// Where the bundle was written.
    pub path: PathBuf,
    /// Outcome of the reduction stage.
    pub reduction: BatchReport,
    /// Outcome of the scoring stage.
    pub generation: BatchReport,
}

/// Static file name of the bundle for a method and precision.
pub fn bundle_file_name(method: ReductionMethod, precision: Precision) -> String {
    format!(
        "heatmaps.{}-{precision}.json",
        method.as_str().to_ascii_lowercase()
    )
}

impl BatchRunner<'_> {
    /// Writes the bounding box and point count of every source grid.
    pub fn export_areas(&self) -> Result<(PathBuf, AreasExport), HeatgridError> {
        let store = self.store();
        let mut export = AreasExport {
            areas: BTreeMap::new(),
            failures: Vec::new(),
        };
        for grid in store.list_heatmap_grids()? {
            match store.load_grid(&grid) {
                Ok(loaded) => {
                    let entry = AreaEntry {
                        points: loaded.grid.len(),
                        bbox: BoundingBox::from_points(&loaded.grid.points),
                    };
                    export.areas.insert(grid, entry);
                }
                Err(error) => {
                    warn!(grid = %grid, error = %error, "grid left out of areas export");
                    export.failures.push(ItemFailure { unit: grid, error });
                }
            }
        }
        let path = store.write_static(AREAS_FILE, &export)?;
        info!(areas = export.areas.len(), failed = export.failures.len(), "areas exported");
        Ok((path, export))
    }

    /// Reduces every grid, scores the reduced grids and writes one bundle.
    ///
    /// Reduced grids are always rescored, so every bundled heatmap matches
    /// the reduced grid written in the same run. Grids whose reduction or
    /// scoring fails are absent from the bundle and listed in the returned
    /// reports.
    pub fn export_bundle(
        &self,
        precision: f64,
        method: ReductionMethod,
    ) -> Result<BundleExport, HeatgridError> {
        let precision = Precision::new(precision)?;
        let store = self.store();
        let reduction = self.reduce_all(precision.value(), method)?;

        let reduced: Vec<String> = store
            .list_heatmap_grids()?
            .iter()
            .filter(|grid| {
                let unit = reduce_unit(grid, method, precision.value());
                reduction
                    .jobs
                    .iter()
                    .any(|job| job.unit == unit && job.state == JobState::Complete)
            })
            .map(|grid| reduced_basename(grid, method, precision))
            .collect();
        let generation = self.generate_for("export_bundle", &reduced, true)?;

        let mut heatmaps: BTreeMap<String, BTreeMap<String, Vec<HeatmapPoint>>> = BTreeMap::new();
        for criteria in self.registry().iter() {
            let per_grid = heatmaps.entry(criteria.name().to_string()).or_default();
            for grid in &reduced {
                if !store.heatmap_exists(grid, criteria.name()) {
                    continue;
                }
                let artifact = store.load_heatmap(grid, criteria.name())?;
                per_grid.insert(grid.clone(), artifact.points);
            }
        }

        let bundle = HeatmapBundle {
            method,
            precision,
            heatmaps,
        };
        let path = store.write_static(&bundle_file_name(method, precision), &bundle)?;
        info!(
            method = %method,
            precision = %precision,
            grids = reduced.len(),
            path = %path.display(),
            "heatmap bundle exported"
        );
        Ok(BundleExport {
            path,
            reduction,
            generation,
        })
    }
}
