//! Fans generation and reduction out over every known grid and criteria set.

use std::sync::Arc;

use heatgrid_core::errors::{ErrorInfo, HeatgridError};
use heatgrid_core::{heatmap_key, CriteriaRegistry, CriteriaSet, Precision, ReductionMethod};
use heatgrid_engine::{GridReducer, HeatmapGenerator, ReducerConfig, Scorer};
use heatgrid_store::GridStore;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::cancel::CancelToken;
use crate::config::BatchConfig;
use crate::report::{BatchReport, JobReport};

fn pool_error(err: impl ToString) -> HeatgridError {
    HeatgridError::StoreIo(ErrorInfo::new("thread-pool", err.to_string()))
}

/// Unit key of one `reduce_all` job, e.g. `lyon_part1@FGR-50`.
pub fn reduce_unit(grid: &str, method: ReductionMethod, precision: f64) -> String {
    format!("{grid}@{method}-{precision}")
}

enum Outcome {
    Written(usize),
    Skipped,
}

struct GenerateJob {
    grid: String,
    criteria: Arc<CriteriaSet>,
}

/// Runs batch operations against one store and registry.
#[derive(Debug)]
pub struct BatchRunner<'a> {
    store: &'a GridStore,
    registry: &'a CriteriaRegistry,
    scorer: Scorer,
    reducer: ReducerConfig,
    opts: BatchConfig,
    cancel: CancelToken,
}

impl<'a> BatchRunner<'a> {
    /// Creates a runner from its collaborators.
    pub fn new(
        store: &'a GridStore,
        registry: &'a CriteriaRegistry,
        scorer: Scorer,
        reducer: ReducerConfig,
        opts: BatchConfig,
        cancel: CancelToken,
    ) -> Self {
        Self {
            store,
            registry,
            scorer,
            reducer,
            opts,
            cancel,
        }
    }

    /// Store the runner reads from and writes to.
    pub fn store(&self) -> &'a GridStore {
        self.store
    }

    /// Criteria sets every grid is scored against.
    pub fn registry(&self) -> &'a CriteriaRegistry {
        self.registry
    }

    /// Generates every `(grid, criteria)` heatmap not yet materialized.
    pub fn generate_all(&self) -> Result<BatchReport, HeatgridError> {
        let grids = self.store.list_heatmap_grids()?;
        self.generate_for("generate_all", &grids, self.opts.force)
    }

    /// Generates heatmaps for `grids` against every registered criteria set.
    ///
    /// Heatmaps already stored are skipped unless `force` is set.
    pub fn generate_for(
        &self,
        operation: &str,
        grids: &[String],
        force: bool,
    ) -> Result<BatchReport, HeatgridError> {
        let jobs: Vec<GenerateJob> = grids
            .iter()
            .flat_map(|grid| {
                self.registry.iter().map(move |criteria| GenerateJob {
                    grid: grid.clone(),
                    criteria: Arc::clone(criteria),
                })
            })
            .collect();
        let generator = HeatmapGenerator::new(self.store, self.scorer.clone());
        self.run(
            operation,
            &jobs,
            |job| heatmap_key(&job.grid, job.criteria.name()),
            |job| {
                if !force && self.store.heatmap_exists(&job.grid, job.criteria.name()) {
                    return Ok(Outcome::Skipped);
                }
                let artifact = generator.generate(&job.grid, &job.criteria)?;
                Ok(Outcome::Written(artifact.len()))
            },
        )
    }

    /// Reduces every source grid with `method` at `precision`.
    ///
    /// An invalid precision fails the whole call before any unit runs.
    pub fn reduce_all(
        &self,
        precision: f64,
        method: ReductionMethod,
    ) -> Result<BatchReport, HeatgridError> {
        let precision = Precision::new(precision)?.value();
        let grids = self.store.list_heatmap_grids()?;
        let reducer = GridReducer::new(self.store, self.reducer.clone());
        self.run(
            "reduce_all",
            &grids,
            |grid| reduce_unit(grid, method, precision),
            |grid| {
                let reduced = reducer.reduce(grid, precision, method)?;
                Ok(Outcome::Written(reduced.len()))
            },
        )
    }

    fn run<J, U, E>(
        &self,
        operation: &str,
        jobs: &[J],
        unit_of: U,
        execute: E,
    ) -> Result<BatchReport, HeatgridError>
    where
        J: Sync,
        U: Fn(&J) -> String + Sync,
        E: Fn(&J) -> Result<Outcome, HeatgridError> + Sync,
    {
        info!(operation, jobs = jobs.len(), "batch started");
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.opts.concurrency)
            .build()
            .map_err(pool_error)?;
        let reports: Vec<JobReport> = pool.install(|| {
            jobs.par_iter()
                .map(|job| {
                    let unit = unit_of(job);
                    if self.cancel.is_cancelled() {
                        return JobReport::cancelled(unit);
                    }
                    match execute(job) {
                        Ok(Outcome::Written(points)) => JobReport::complete(unit, points),
                        Ok(Outcome::Skipped) => JobReport::skipped(unit),
                        Err(err) => {
                            warn!(operation, unit = %unit, error = %err, "batch unit failed");
                            JobReport::failed(unit, err)
                        }
                    }
                })
                .collect()
        });
        let report = BatchReport::new(operation, reports);
        self.store.write_report(operation, &report)?;
        info!(
            operation,
            succeeded = report.succeeded,
            skipped = report.skipped,
            failed = report.failed,
            cancelled = report.cancelled,
            "batch finished"
        );
        Ok(report)
    }
}
