use heatgrid_core::ResolutionUnit;
use serde::{Deserialize, Serialize};

/// Options controlling spatial reduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReducerConfig {
    /// Unit in which precisions are expressed.
    pub unit: ResolutionUnit,
    /// Maximum number of input points collapsed into one QCGR leaf.
    pub leaf_capacity: usize,
    /// Deepest QCGR subdivision level.
    pub max_depth: u32,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            unit: ResolutionUnit::Meters,
            leaf_capacity: 4,
            max_depth: 24,
        }
    }
}

impl ReducerConfig {
    /// Ensures the configuration is well-formed and returns a sanitised copy.
    pub fn sanitised(&self) -> Self {
        Self {
            unit: self.unit,
            leaf_capacity: self.leaf_capacity.max(1),
            max_depth: self.max_depth.min(64),
        }
    }
}
