#![deny(missing_docs)]
#![doc = "Deterministic grid scoring, heatmap generation and spatial reduction (FGR, QCGR)."]

/// Heatmap generation over stored grids.
pub mod generate;
/// Grid and heatmap reduction.
pub mod reduce;
pub mod scorer;
pub mod stats;

pub use generate::{score_grid, HeatmapGenerator};
pub use reduce::{
    partition, reduce_grid, reduce_heatmap, reduce_samples, GridReducer, Lattice, Leaf, QuadTree,
    ReducerConfig, Sample,
};
pub use scorer::{CombinerKind, MarkCombiner, Scorer, Term, WeightedGeometric, WeightedMean};
pub use stats::{avg_geo_delta, grid_stats, GridStats};
