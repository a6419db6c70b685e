//! Fixed Grid Reduction: one representative per lattice cell.

use std::collections::HashMap;

use heatgrid_core::errors::{ErrorInfo, HeatgridError};
use heatgrid_core::{Coordinate, Precision, ResolutionUnit, METERS_PER_DEGREE};

/// Fraction of a cell within which a value snaps to the next cell boundary.
///
/// Decimal inputs such as `4.80` land a hair below `48 × 0.1` once divided;
/// they belong to the upper cell.
const BOUNDARY_SNAP: f64 = 1e-9;

/// Most cells a lattice may span along one axis while indices stay exact.
const MAX_CELLS_PER_AXIS: f64 = (1u64 << 52) as f64;

fn cell_index(value: f64, size: f64) -> f64 {
    (value / size + BOUNDARY_SNAP).floor()
}

/// Fixed lattice anchored at `(0°, 0°)`.
///
/// Rows are `dlat` degrees tall. In meter mode each row's columns are
/// widened by `1 / cos(φ)` at the row's center latitude, so cells stay
/// roughly square on the ground while the lattice still depends only on
/// absolute position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lattice {
    dlat: f64,
    unit: ResolutionUnit,
}

impl Lattice {
    /// Lattice with cells of side `precision` in `unit`.
    ///
    /// Fails with `InvalidPrecision` when cells are so small that the
    /// longitude range no longer maps onto distinct integer indices.
    pub fn new(precision: Precision, unit: ResolutionUnit) -> Result<Self, HeatgridError> {
        let dlat = match unit {
            ResolutionUnit::Degrees => precision.value(),
            ResolutionUnit::Meters => precision.value() / METERS_PER_DEGREE,
        };
        if 180.0 / dlat > MAX_CELLS_PER_AXIS {
            return Err(HeatgridError::InvalidPrecision(
                ErrorInfo::new("precision-too-fine", "precision exceeds the lattice resolution")
                    .with_context("precision", precision)
                    .with_context("cell_deg", dlat),
            ));
        }
        Ok(Self { dlat, unit })
    }

    /// `(row, column)` index of the cell containing `point`.
    pub fn cell(&self, point: &Coordinate) -> (i64, i64) {
        let row = cell_index(point.lat(), self.dlat);
        let dlon = match self.unit {
            ResolutionUnit::Degrees => self.dlat,
            ResolutionUnit::Meters => {
                let center = ((row + 0.5) * self.dlat).clamp(-90.0, 90.0);
                self.dlat / center.to_radians().cos().max(1e-6)
            }
        };
        let col = cell_index(point.lon(), dlon);
        (row as i64, col as i64)
    }
}

/// Groups point indices by lattice cell, ordered by each cell's first point.
pub fn partition(points: &[Coordinate], lattice: &Lattice) -> Vec<Vec<usize>> {
    let mut slots: HashMap<(i64, i64), usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (idx, point) in points.iter().enumerate() {
        let slot = *slots.entry(lattice.cell(point)).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(idx);
    }
    groups
}
