#![deny(missing_docs)]
#![doc = "Batch orchestration over a heatgrid store: generation, reduction, exports and configuration."]

/// Cooperative cancellation of batch runs.
pub mod cancel;
pub mod config;
pub mod dispatch;
pub mod export;
/// Per-unit and per-batch outcomes.
pub mod report;

use heatgrid_core::errors::HeatgridError;
use heatgrid_core::{CriteriaRegistry, HeatmapArtifact, ReducedGrid, ReductionMethod};
use heatgrid_engine::{grid_stats, GridReducer, GridStats, HeatmapGenerator, Scorer};
use heatgrid_store::GridStore;
use tracing::info;

pub use cancel::CancelToken;
pub use config::{load_config, BatchConfig, HeatgridConfig, ScoringConfig};
pub use dispatch::{reduce_unit, BatchRunner};
pub use export::{
    bundle_file_name, AreaEntry, AreasExport, BundleExport, HeatmapBundle, AREAS_FILE,
};
pub use report::{BatchReport, JobReport, JobState};

/// Store, criteria registry and scorer assembled from one configuration.
#[derive(Debug)]
pub struct Pipeline {
    config: HeatgridConfig,
    store: GridStore,
    registry: CriteriaRegistry,
    scorer: Scorer,
    cancel: CancelToken,
}

impl Pipeline {
    /// Opens the store named by `config` and loads every criteria set in it.
    pub fn open(config: HeatgridConfig) -> Result<Self, HeatgridError> {
        let store = GridStore::new(config.store_root.clone()).with_strict(config.strict);
        let registry = store.load_registry()?;
        info!(
            root = %store.root().display(),
            criteria = registry.len(),
            "pipeline opened"
        );
        Ok(Self::with_registry(config, store, registry))
    }

    /// Assembles a pipeline around an already built store and registry.
    pub fn with_registry(
        config: HeatgridConfig,
        store: GridStore,
        registry: CriteriaRegistry,
    ) -> Self {
        let scorer = Scorer::from_kind(config.scoring.combiner);
        Self {
            config,
            store,
            registry,
            scorer,
            cancel: CancelToken::new(),
        }
    }

    /// Configuration in effect.
    pub fn config(&self) -> &HeatgridConfig {
        &self.config
    }

    /// Underlying store.
    pub fn store(&self) -> &GridStore {
        &self.store
    }

    /// Registered criteria sets.
    pub fn registry(&self) -> &CriteriaRegistry {
        &self.registry
    }

    /// Token cancelling batch runs started from this pipeline.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Batch runner sharing this pipeline's store, registry and cancel token.
    pub fn runner(&self) -> BatchRunner<'_> {
        BatchRunner::new(
            &self.store,
            &self.registry,
            self.scorer.clone(),
            self.config.reducer.clone(),
            self.config.batch.clone(),
            self.cancel.clone(),
        )
    }

    /// Scores one grid against one registered criteria set and persists the heatmap.
    pub fn gen_heatmap(
        &self,
        grid: &str,
        criteria: &str,
    ) -> Result<HeatmapArtifact, HeatgridError> {
        let criteria = self.registry.get(criteria)?;
        HeatmapGenerator::new(&self.store, self.scorer.clone()).generate(grid, &criteria)
    }

    /// Reduces one grid and persists the reduced grid.
    pub fn reduce_grid(
        &self,
        grid: &str,
        precision: f64,
        method: ReductionMethod,
    ) -> Result<ReducedGrid, HeatgridError> {
        GridReducer::new(&self.store, self.config.reducer.clone()).reduce(grid, precision, method)
    }

    /// Reduces every source grid. Per-grid failures land in the report.
    pub fn reduce_all(
        &self,
        precision: f64,
        method: ReductionMethod,
    ) -> Result<BatchReport, HeatgridError> {
        self.runner().reduce_all(precision, method)
    }

    /// Generates every missing heatmap. Per-unit failures land in the report.
    pub fn gen_all_heatmaps(&self) -> Result<BatchReport, HeatgridError> {
        self.runner().generate_all()
    }

    /// Point count, bounding box and mean nearest-neighbour distance of a grid.
    pub fn avg_geo_delta(&self, grid: &str) -> Result<GridStats, HeatgridError> {
        let loaded = self.store.load_grid(grid)?;
        let stats = grid_stats(&loaded.grid);
        info!(
            grid,
            points = stats.points,
            avg_geo_delta_m = stats.avg_geo_delta_m.unwrap_or(0.0),
            "grid statistics"
        );
        Ok(stats)
    }

    /// Writes `static/areas.json`.
    pub fn export_areas(&self) -> Result<AreasExport, HeatgridError> {
        self.runner().export_areas().map(|(_, export)| export)
    }

    /// Writes the reduced heatmap bundle for `method` at `precision`.
    pub fn export_bundle(
        &self,
        precision: f64,
        method: ReductionMethod,
    ) -> Result<BundleExport, HeatgridError> {
        self.runner().export_bundle(precision, method)
    }
}
