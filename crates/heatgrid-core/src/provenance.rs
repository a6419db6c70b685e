//! Provenance and schema descriptors attached to persisted artefacts.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Semantic version describing the schema of serialized payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Major version incremented for breaking changes.
    pub major: u32,
    /// Minor version incremented for additive changes.
    pub minor: u32,
    /// Patch version incremented for bug fixes.
    pub patch: u32,
}

impl SchemaVersion {
    /// Creates a new schema version descriptor.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

/// Describes how an artefact was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Provenance {
    /// Canonical hash of the input points.
    pub input_hash: String,
    /// Canonical hash of the criteria set, empty for reductions.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub criteria_hash: String,
    /// RFC 3339 timestamp recording when the artefact was generated.
    pub created_at: String,
    /// Version of the crate that wrote the artefact.
    pub tool_version: String,
}

impl Provenance {
    /// Stamps a provenance record with the current time.
    pub fn now(input_hash: String, criteria_hash: String) -> Self {
        Self {
            input_hash,
            criteria_hash,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
