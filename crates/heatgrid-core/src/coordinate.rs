//! Geographic value types: coordinates, grids and heatmap points.

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, HeatgridError};

/// Scalar produced by scoring one coordinate against a criteria set, in `[0, 1]`.
pub type Mark = f64;

/// Immutable `(latitude, longitude)` pair in decimal degrees.
///
/// On disk a coordinate is the two element array `[lon, lat]`, longitude
/// first, which is how source grids are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    lat: f64,
    lon: f64,
}

impl Coordinate {
    /// Creates a validated coordinate.
    pub fn new(lat: f64, lon: f64) -> Result<Self, HeatgridError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(HeatgridError::InvalidCoordinate(
                ErrorInfo::new("latitude-range", "latitude must lie within [-90, 90]")
                    .with_context("lat", lat)
                    .with_context("lon", lon),
            ));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(HeatgridError::InvalidCoordinate(
                ErrorInfo::new("longitude-range", "longitude must lie within [-180, 180]")
                    .with_context("lat", lat)
                    .with_context("lon", lon),
            ));
        }
        Ok(Self { lat, lon })
    }

    /// Creates a coordinate from a `[lon, lat]` pair.
    pub fn from_lon_lat(lon: f64, lat: f64) -> Result<Self, HeatgridError> {
        Self::new(lat, lon)
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Mean position of `points`, `None` when empty.
    ///
    /// The mean is clamped to the points' bounding box so rounding can never
    /// move it outside the group it summarizes.
    pub fn centroid<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coordinate>,
    {
        let mut count = 0usize;
        let (mut sum_lat, mut sum_lon) = (0.0, 0.0);
        let (mut min_lat, mut max_lat) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_lon, mut max_lon) = (f64::INFINITY, f64::NEG_INFINITY);
        for point in points {
            count += 1;
            sum_lat += point.lat;
            sum_lon += point.lon;
            min_lat = min_lat.min(point.lat);
            max_lat = max_lat.max(point.lat);
            min_lon = min_lon.min(point.lon);
            max_lon = max_lon.max(point.lon);
        }
        if count == 0 {
            return None;
        }
        let n = count as f64;
        Some(Self {
            lat: (sum_lat / n).clamp(min_lat, max_lat),
            lon: (sum_lon / n).clamp(min_lon, max_lon),
        })
    }

    /// Re-checks the range invariant.
    pub fn validate(&self) -> Result<(), HeatgridError> {
        Self::new(self.lat, self.lon).map(|_| ())
    }
}

impl TryFrom<[f64; 2]> for Coordinate {
    type Error = HeatgridError;

    fn try_from(value: [f64; 2]) -> Result<Self, Self::Error> {
        Self::from_lon_lat(value[0], value[1])
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(value: Coordinate) -> Self {
        [value.lon, value.lat]
    }
}

/// Ordered set of sample coordinates identified by a basename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    /// Store key of the grid.
    pub basename: String,
    /// Points in source-file order.
    pub points: Vec<Coordinate>,
}

impl Grid {
    /// Creates a grid from its parts.
    pub fn new(basename: impl Into<String>, points: Vec<Coordinate>) -> Self {
        Self {
            basename: basename.into(),
            points,
        }
    }

    /// Number of points in the grid.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the grid holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A scored grid point. Serialized as `[[lon, lat], mark]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(Coordinate, f64)", into = "(Coordinate, f64)")]
pub struct HeatmapPoint {
    /// Location of the point.
    pub coordinate: Coordinate,
    /// Score of the point.
    pub mark: Mark,
}

impl From<(Coordinate, f64)> for HeatmapPoint {
    fn from((coordinate, mark): (Coordinate, f64)) -> Self {
        Self { coordinate, mark }
    }
}

impl From<HeatmapPoint> for (Coordinate, f64) {
    fn from(point: HeatmapPoint) -> Self {
        (point.coordinate, point.mark)
    }
}
