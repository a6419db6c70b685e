//! Distance and bounding-box helpers on the WGS84 sphere approximation.

use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;

/// Mean Earth radius in meters (IUGG).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Length of one degree of latitude in meters.
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Great-circle distance between two coordinates in meters.
pub fn haversine_m(a: &Coordinate, b: &Coordinate) -> f64 {
    let phi_a = a.lat().to_radians();
    let phi_b = b.lat().to_radians();
    let d_phi = (b.lat() - a.lat()).to_radians();
    let d_lambda = (b.lon() - a.lon()).to_radians();
    let h = (d_phi / 2.0).sin().powi(2) + phi_a.cos() * phi_b.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Axis aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Southern edge.
    pub min_lat: f64,
    /// Northern edge.
    pub max_lat: f64,
    /// Western edge.
    pub min_lon: f64,
    /// Eastern edge.
    pub max_lon: f64,
}

impl BoundingBox {
    /// Smallest box containing every coordinate, `None` for an empty input.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coordinate>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = Self {
            min_lat: first.lat(),
            max_lat: first.lat(),
            min_lon: first.lon(),
            max_lon: first.lon(),
        };
        for point in iter {
            bbox.min_lat = bbox.min_lat.min(point.lat());
            bbox.max_lat = bbox.max_lat.max(point.lat());
            bbox.min_lon = bbox.min_lon.min(point.lon());
            bbox.max_lon = bbox.max_lon.max(point.lon());
        }
        Some(bbox)
    }

    /// Whether the coordinate lies inside or on the edge of the box.
    pub fn contains(&self, point: &Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat())
            && (self.min_lon..=self.max_lon).contains(&point.lon())
    }

    /// Latitude span in degrees.
    pub fn height_deg(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Longitude span in degrees.
    pub fn width_deg(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Latitude of the box center.
    pub fn mid_lat(&self) -> f64 {
        (self.min_lat + self.max_lat) / 2.0
    }

    /// Longitude of the box center.
    pub fn mid_lon(&self) -> f64 {
        (self.min_lon + self.max_lon) / 2.0
    }
}
