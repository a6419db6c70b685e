//! Scores every point of a grid and persists the resulting heatmap.

use heatgrid_core::errors::HeatgridError;
use heatgrid_core::{
    heatmap_key, points_hash, stable_hash_string, CriteriaSet, Grid, HeatmapArtifact,
    HeatmapPoint, Provenance, ARTIFACT_SCHEMA,
};
use heatgrid_store::GridStore;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::scorer::{ensure_not_empty, Scorer};

/// Scores a grid in parallel, preserving grid order.
pub fn score_grid(
    scorer: &Scorer,
    grid: &Grid,
    criteria: &CriteriaSet,
) -> Result<Vec<HeatmapPoint>, HeatgridError> {
    ensure_not_empty(criteria)?;
    grid.points
        .par_iter()
        .map(|point| {
            scorer.rank(point, criteria).map(|mark| HeatmapPoint {
                coordinate: *point,
                mark,
            })
        })
        .collect()
}

/// Builds heatmap artefacts from stored grids.
#[derive(Debug)]
pub struct HeatmapGenerator<'a> {
    store: &'a GridStore,
    scorer: Scorer,
}

impl<'a> HeatmapGenerator<'a> {
    /// Generator writing into `store`.
    pub fn new(store: &'a GridStore, scorer: Scorer) -> Self {
        Self { store, scorer }
    }

    /// Scorer used for every point.
    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    /// Scores an in-memory grid without touching the store.
    pub fn score(&self, grid: &Grid, criteria: &CriteriaSet) -> Result<HeatmapArtifact, HeatgridError> {
        let points = score_grid(&self.scorer, grid, criteria)?;
        build_artifact(grid, criteria, points, 0)
    }

    /// Loads `grid_basename`, scores it against `criteria` and persists the artefact.
    ///
    /// Generation of one `(grid, criteria)` key is serialized through the
    /// store's key lock; the last writer wins.
    pub fn generate(
        &self,
        grid_basename: &str,
        criteria: &CriteriaSet,
    ) -> Result<HeatmapArtifact, HeatgridError> {
        let key = heatmap_key(grid_basename, criteria.name());
        info!(key = %key, "generating heatmap");
        self.store.with_key_lock(&key, || {
            let loaded = self.store.load_grid(grid_basename)?;
            let points = score_grid(&self.scorer, &loaded.grid, criteria)?;
            debug!(key = %key, points = points.len(), "scored grid");
            let artifact = build_artifact(&loaded.grid, criteria, points, loaded.rejected.len())?;
            self.store.dump_heatmap(&artifact)?;
            info!(
                key = %key,
                points = artifact.len(),
                rejected = artifact.rejected,
                "heatmap written"
            );
            Ok(artifact)
        })
    }
}

fn build_artifact(
    grid: &Grid,
    criteria: &CriteriaSet,
    points: Vec<HeatmapPoint>,
    rejected: usize,
) -> Result<HeatmapArtifact, HeatgridError> {
    let provenance = Provenance::now(
        points_hash(&grid.points),
        stable_hash_string(criteria)?,
    );
    Ok(HeatmapArtifact {
        schema: ARTIFACT_SCHEMA,
        grid: grid.basename.clone(),
        criteria: criteria.name().to_string(),
        points,
        rejected,
        provenance,
    })
}
