//! Heatmap artefacts and reduced grids as produced by the engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::coordinate::{Coordinate, Grid, HeatmapPoint};
use crate::errors::{ErrorInfo, HeatgridError};
use crate::provenance::{Provenance, SchemaVersion};

/// Current schema of [`HeatmapArtifact`] and [`ReducedGrid`] files.
pub const ARTIFACT_SCHEMA: SchemaVersion = SchemaVersion::new(1, 0, 0);

/// Scored points for one grid and one criteria set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapArtifact {
    /// Schema of the serialized payload.
    pub schema: SchemaVersion,
    /// Basename of the source grid.
    pub grid: String,
    /// Name of the criteria set.
    pub criteria: String,
    /// One point per source grid point, in grid order.
    pub points: Vec<HeatmapPoint>,
    /// Source points skipped because they were malformed.
    #[serde(default)]
    pub rejected: usize,
    /// How the artefact was produced.
    pub provenance: Provenance,
}

impl HeatmapArtifact {
    /// Number of scored points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the artefact holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Store key `grid/criteria`.
    pub fn key(&self) -> String {
        heatmap_key(&self.grid, &self.criteria)
    }
}

/// Store key for the heatmap of `grid` under `criteria`.
pub fn heatmap_key(grid: &str, criteria: &str) -> String {
    format!("{grid}/{criteria}")
}

/// Spatial reduction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReductionMethod {
    /// Fixed Grid Reduction: one point per lattice cell.
    #[serde(rename = "FGR")]
    Fgr,
    /// Quad/Cluster Grid Reduction: adaptive quad-tree leaves.
    #[serde(rename = "QCGR")]
    Qcgr,
}

impl ReductionMethod {
    /// Canonical upper-case tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReductionMethod::Fgr => "FGR",
            ReductionMethod::Qcgr => "QCGR",
        }
    }
}

impl fmt::Display for ReductionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReductionMethod {
    type Err = HeatgridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FGR" => Ok(ReductionMethod::Fgr),
            "QCGR" => Ok(ReductionMethod::Qcgr),
            _ => Err(HeatgridError::UnknownMethod(
                ErrorInfo::new("method-unknown", "reduction method must be FGR or QCGR")
                    .with_context("method", s),
            )),
        }
    }
}

/// Linear unit in which a [`Precision`] is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionUnit {
    /// Meters on the ground.
    #[default]
    Meters,
    /// Decimal degrees.
    Degrees,
}

/// Strictly positive, finite reduction resolution.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Precision(f64);

impl Precision {
    /// Validates a raw precision value.
    pub fn new(value: f64) -> Result<Self, HeatgridError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(HeatgridError::InvalidPrecision(
                ErrorInfo::new("precision-range", "precision must be finite and > 0")
                    .with_context("precision", value),
            ));
        }
        Ok(Self(value))
    }

    /// Raw value in the configured unit.
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Precision {
    type Error = HeatgridError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Precision> for f64 {
    fn from(value: Precision) -> Self {
        value.0
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lower density grid derived from a source grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReducedGrid {
    /// Schema of the serialized payload.
    pub schema: SchemaVersion,
    /// Store key of the reduced grid, see [`reduced_basename`].
    pub basename: String,
    /// Basename of the grid that was reduced.
    pub source: String,
    /// Strategy used.
    pub method: ReductionMethod,
    /// Target resolution.
    pub precision: Precision,
    /// Unit of `precision`.
    pub unit: ResolutionUnit,
    /// Representative points.
    pub points: Vec<Coordinate>,
    /// How the grid was produced.
    pub provenance: Provenance,
}

impl ReducedGrid {
    /// Views the reduced points as a plain grid under the reduced basename.
    pub fn to_grid(&self) -> Grid {
        Grid::new(self.basename.clone(), self.points.clone())
    }

    /// Number of representative points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the reduced grid holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Store key of `source` reduced with `method` at `precision`, e.g. `lyon_part1.fgr-50`.
pub fn reduced_basename(source: &str, method: ReductionMethod, precision: Precision) -> String {
    format!(
        "{source}.{}-{precision}",
        method.as_str().to_ascii_lowercase()
    )
}
