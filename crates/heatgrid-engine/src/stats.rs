//! Descriptive statistics used to pick reduction precisions.

use heatgrid_core::geo::EARTH_RADIUS_M;
use heatgrid_core::{haversine_m, BoundingBox, Coordinate, Grid};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Summary of a grid's spatial layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridStats {
    /// Basename of the grid.
    pub grid: String,
    /// Number of points.
    pub points: usize,
    /// Bounding box, `None` for an empty grid.
    pub bbox: Option<BoundingBox>,
    /// Mean distance in meters from each point to its nearest neighbour.
    pub avg_geo_delta_m: Option<f64>,
}

/// Computes [`GridStats`] for a grid.
pub fn grid_stats(grid: &Grid) -> GridStats {
    GridStats {
        grid: grid.basename.clone(),
        points: grid.len(),
        bbox: BoundingBox::from_points(&grid.points),
        avg_geo_delta_m: avg_geo_delta(&grid.points),
    }
}

/// Mean nearest-neighbour distance in meters, `None` below two points.
pub fn avg_geo_delta(points: &[Coordinate]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    let mut sorted: Vec<Coordinate> = points.to_vec();
    sorted.sort_by(|a, b| a.lat().total_cmp(&b.lat()));
    let distances: Vec<f64> = (0..sorted.len())
        .into_par_iter()
        .map(|idx| nearest_distance(&sorted, idx))
        .collect();
    Some(distances.iter().sum::<f64>() / sorted.len() as f64)
}

/// Sweeps outwards in latitude order, stopping once the latitude gap alone
/// exceeds the best distance found.
fn nearest_distance(sorted: &[Coordinate], idx: usize) -> f64 {
    let origin = &sorted[idx];
    let mut best = f64::INFINITY;
    let forward = sorted[idx + 1..].iter();
    let backward = sorted[..idx].iter().rev();
    for side in [
        Box::new(forward) as Box<dyn Iterator<Item = &Coordinate>>,
        Box::new(backward),
    ] {
        for other in side {
            let lat_gap = (other.lat() - origin.lat()).abs().to_radians() * EARTH_RADIUS_M;
            if lat_gap > best {
                break;
            }
            best = best.min(haversine_m(origin, other));
        }
    }
    best
}
