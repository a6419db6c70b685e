//! Spatial reduction of grids and heatmaps to a target precision.
//!
//! Both strategies first partition the input into groups of point indices
//! and then collapse every group into one representative, so the output
//! never holds more points than the input and every representative lies
//! inside the bounding box of its group.

/// Fixed lattice partitioning.
pub mod fgr;
mod params;
/// Quad-tree partitioning.
pub mod qcgr;

use heatgrid_core::errors::HeatgridError;
use heatgrid_core::{
    points_hash, reduced_basename, stable_hash_string, Coordinate, Grid, HeatmapArtifact,
    HeatmapPoint, Precision, Provenance, ReducedGrid, ReductionMethod, ARTIFACT_SCHEMA,
};
use heatgrid_store::GridStore;
use tracing::info;

pub use fgr::Lattice;
pub use params::ReducerConfig;
pub use qcgr::{Leaf, QuadTree};

/// A located value that can be merged with its neighbours.
pub trait Sample: Sized {
    /// Location used for partitioning.
    fn coordinate(&self) -> Coordinate;

    /// Merges a non-empty group into one representative.
    fn collapse(group: &[&Self]) -> Self;
}

impl Sample for Coordinate {
    fn coordinate(&self) -> Coordinate {
        *self
    }

    fn collapse(group: &[&Self]) -> Self {
        Coordinate::centroid(group.iter().copied()).unwrap_or(*group[0])
    }
}

impl Sample for HeatmapPoint {
    fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    fn collapse(group: &[&Self]) -> Self {
        let coordinate = Coordinate::centroid(group.iter().map(|point| &point.coordinate))
            .unwrap_or(group[0].coordinate);
        let (min, max) = group.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.mark), hi.max(p.mark))
        });
        let mean = group.iter().map(|point| point.mark).sum::<f64>() / group.len() as f64;
        HeatmapPoint {
            coordinate,
            mark: mean.clamp(min, max),
        }
    }
}

/// Partitions `coordinates` with `method`, returning index groups ordered by first member.
pub fn partition(
    coordinates: &[Coordinate],
    precision: Precision,
    method: ReductionMethod,
    config: &ReducerConfig,
) -> Result<Vec<Vec<usize>>, HeatgridError> {
    Ok(match method {
        ReductionMethod::Fgr => {
            fgr::partition(coordinates, &Lattice::new(precision, config.unit)?)
        }
        ReductionMethod::Qcgr => QuadTree::new(precision, config)
            .partition(coordinates)
            .into_iter()
            .map(|leaf| leaf.members)
            .collect(),
    })
}

/// Reduces any slice of samples with `method`.
pub fn reduce_samples<T: Sample>(
    samples: &[T],
    precision: Precision,
    method: ReductionMethod,
    config: &ReducerConfig,
) -> Result<Vec<T>, HeatgridError> {
    let coordinates: Vec<Coordinate> = samples.iter().map(Sample::coordinate).collect();
    Ok(partition(&coordinates, precision, method, config)?
        .iter()
        .map(|group| {
            let members: Vec<&T> = group.iter().map(|&idx| &samples[idx]).collect();
            T::collapse(&members)
        })
        .collect())
}

/// Reduces an in-memory grid.
pub fn reduce_grid(
    grid: &Grid,
    precision: Precision,
    method: ReductionMethod,
    config: &ReducerConfig,
) -> Result<ReducedGrid, HeatgridError> {
    let points = reduce_samples(&grid.points, precision, method, config)?;
    Ok(ReducedGrid {
        schema: ARTIFACT_SCHEMA,
        basename: reduced_basename(&grid.basename, method, precision),
        source: grid.basename.clone(),
        method,
        precision,
        unit: config.unit,
        points,
        provenance: Provenance::now(points_hash(&grid.points), String::new()),
    })
}

/// Reduces a heatmap artefact, averaging the marks of collapsed points.
pub fn reduce_heatmap(
    artifact: &HeatmapArtifact,
    precision: Precision,
    method: ReductionMethod,
    config: &ReducerConfig,
) -> Result<HeatmapArtifact, HeatgridError> {
    let points = reduce_samples(&artifact.points, precision, method, config)?;
    let grid = reduced_basename(&artifact.grid, method, precision);
    Ok(HeatmapArtifact {
        schema: ARTIFACT_SCHEMA,
        grid,
        criteria: artifact.criteria.clone(),
        provenance: Provenance::now(
            stable_hash_string(&artifact.points)?,
            artifact.provenance.criteria_hash.clone(),
        ),
        points,
        rejected: artifact.rejected,
    })
}

/// Reduces stored grids and persists the results.
#[derive(Debug)]
pub struct GridReducer<'a> {
    store: &'a GridStore,
    config: ReducerConfig,
}

impl<'a> GridReducer<'a> {
    /// Reducer reading from and writing to `store`.
    pub fn new(store: &'a GridStore, config: ReducerConfig) -> Self {
        Self {
            store,
            config: config.sanitised(),
        }
    }

    /// Reduction options in effect.
    pub fn config(&self) -> &ReducerConfig {
        &self.config
    }

    /// Loads `grid_basename`, reduces it and stores the result under its reduced basename.
    pub fn reduce(
        &self,
        grid_basename: &str,
        precision: f64,
        method: ReductionMethod,
    ) -> Result<ReducedGrid, HeatgridError> {
        let precision = Precision::new(precision)?;
        let loaded = self.store.load_grid(grid_basename)?;
        let reduced = reduce_grid(&loaded.grid, precision, method, &self.config)?;
        self.store.dump_reduced(&reduced)?;
        info!(
            grid = grid_basename,
            reduced = %reduced.basename,
            method = %method,
            precision = %precision,
            before = loaded.grid.len(),
            after = reduced.len(),
            "grid reduced"
        );
        Ok(reduced)
    }
}
