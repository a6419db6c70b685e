//! YAML configuration for a heatgrid pipeline.

use std::fs;
use std::path::{Path, PathBuf};

use heatgrid_core::errors::{ErrorInfo, HeatgridError};
use heatgrid_core::serde_io::{from_yaml_slice, to_yaml_string};
use heatgrid_engine::{CombinerKind, ReducerConfig};
use serde::{Deserialize, Serialize};

/// Scoring options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScoringConfig {
    /// Function folding weighted criterion scores into a mark.
    pub combiner: CombinerKind,
}

/// Options for batch runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Worker threads per batch, zero for one per core.
    pub concurrency: usize,
    /// Regenerate heatmaps that already exist.
    pub force: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 0,
            force: false,
        }
    }
}

/// Top level pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatgridConfig {
    /// Root directory of the grid store.
    pub store_root: PathBuf,
    /// Fail grid loads on the first malformed point.
    pub strict: bool,
    /// Scoring options.
    pub scoring: ScoringConfig,
    /// Reduction options.
    pub reducer: ReducerConfig,
    /// Batch options.
    pub batch: BatchConfig,
}

impl Default for HeatgridConfig {
    fn default() -> Self {
        Self {
            store_root: PathBuf::from("data"),
            strict: false,
            scoring: ScoringConfig::default(),
            reducer: ReducerConfig::default(),
            batch: BatchConfig::default(),
        }
    }
}

impl HeatgridConfig {
    /// Configuration with defaults rooted at `store_root`.
    pub fn with_root(store_root: impl Into<PathBuf>) -> Self {
        Self {
            store_root: store_root.into(),
            ..Self::default()
        }
    }

    /// Serializes the configuration into YAML.
    pub fn to_yaml_string(&self) -> Result<String, HeatgridError> {
        to_yaml_string(self)
    }
}

/// Loads a configuration file. Relative store roots resolve against the file's directory.
pub fn load_config(path: &Path) -> Result<HeatgridConfig, HeatgridError> {
    let bytes = fs::read(path).map_err(|err| {
        HeatgridError::StoreIo(
            ErrorInfo::new("config-read", err.to_string())
                .with_context("path", path.display()),
        )
    })?;
    let mut config: HeatgridConfig = from_yaml_slice(&bytes)?;
    if config.store_root.is_relative() {
        if let Some(parent) = path.parent() {
            config.store_root = parent.join(&config.store_root);
        }
    }
    Ok(config)
}
