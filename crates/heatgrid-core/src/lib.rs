#![deny(missing_docs)]
#![doc = "Core data types, criteria model and error surface for the heatgrid engine."]

/// Heatmap artefacts, reduced grids and reduction parameters.
pub mod artifact;
/// Coordinates, grids and scored points.
pub mod coordinate;
/// Weighted criteria definitions and the criteria registry.
pub mod criteria;
pub mod errors;
/// Great-circle distances and bounding boxes.
pub mod geo;
/// Canonical content hashing.
pub mod hash;
pub mod provenance;
/// Canonical JSON and YAML helpers.
#[path = "serde.rs"]
pub mod serde_io;

pub use artifact::{
    heatmap_key, reduced_basename, HeatmapArtifact, Precision, ReducedGrid, ReductionMethod,
    ResolutionUnit, ARTIFACT_SCHEMA,
};
pub use coordinate::{Coordinate, Grid, HeatmapPoint, Mark};
pub use criteria::{
    CriteriaRegistry, CriteriaSet, CriteriaSetDef, Criterion, CriterionDef, CriterionKind, RuleDef,
};
pub use errors::{BatchFailure, ErrorInfo, HeatgridError, ItemFailure};
pub use geo::{haversine_m, BoundingBox, METERS_PER_DEGREE};
pub use hash::{points_hash, stable_hash_string};
pub use provenance::{Provenance, SchemaVersion};
