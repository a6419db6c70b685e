//! Content hashes recorded in artefact provenance.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::coordinate::Coordinate;
use crate::errors::HeatgridError;
use crate::serde_io::write_canonical_json;

fn hex(hasher: Sha256) -> String {
    format!("{:x}", hasher.finalize())
}

/// Hex SHA-256 of the canonical JSON form of `value`.
pub fn stable_hash_string<T: Serialize>(value: &T) -> Result<String, HeatgridError> {
    let mut hasher = Sha256::new();
    write_canonical_json(&mut hasher, value)?;
    Ok(hex(hasher))
}

/// Hex SHA-256 over the raw `(lon, lat)` bits of `points`, in order.
///
/// Grids are hashed this way instead of through JSON; large grids skip the
/// intermediate tree and two lists match only when bit-identical.
pub fn points_hash(points: &[Coordinate]) -> String {
    let mut hasher = Sha256::new();
    hasher.update((points.len() as u64).to_le_bytes());
    for point in points {
        hasher.update(point.lon().to_bits().to_le_bytes());
        hasher.update(point.lat().to_bits().to_le_bytes());
    }
    hex(hasher)
}
