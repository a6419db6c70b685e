//! Tolerant decoding of `[lon, lat]` point arrays.

use heatgrid_core::errors::{ErrorInfo, HeatgridError};
use heatgrid_core::Coordinate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A source point that could not be decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedPoint {
    /// Position of the point in the source array.
    pub index: usize,
    /// Why the point was rejected.
    pub reason: String,
}

/// Points decoded from a source file along with the ones that were skipped.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedPoints {
    /// Valid points in source order.
    pub points: Vec<Coordinate>,
    /// Skipped entries in source order.
    pub rejected: Vec<RejectedPoint>,
}

/// Decodes a JSON array of `[lon, lat]` pairs.
///
/// A document that is not a JSON array fails as a whole. Individual
/// malformed entries are skipped and recorded, or fail the decode when
/// `strict` is set.
pub fn decode_points(bytes: &[u8], strict: bool) -> Result<DecodedPoints, ErrorInfo> {
    let raw: Vec<Value> = serde_json::from_slice(bytes)
        .map_err(|err| ErrorInfo::new("points-malformed", err.to_string()))?;
    let mut decoded = DecodedPoints {
        points: Vec::with_capacity(raw.len()),
        rejected: Vec::new(),
    };
    for (index, value) in raw.into_iter().enumerate() {
        match decode_point(value) {
            Ok(point) => decoded.points.push(point),
            Err(reason) if strict => {
                return Err(ErrorInfo::new("point-malformed", reason)
                    .with_context("index", index)
                    .with_hint("disable strict mode to skip malformed points"));
            }
            Err(reason) => decoded.rejected.push(RejectedPoint { index, reason }),
        }
    }
    Ok(decoded)
}

fn decode_point(value: Value) -> Result<Coordinate, String> {
    let pair: [f64; 2] = serde_json::from_value(value).map_err(|err| err.to_string())?;
    Coordinate::try_from(pair).map_err(|err: HeatgridError| err.to_string())
}
