//! Structured error types shared across heatgrid crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Code, message and context carried by every [`HeatgridError`] variant.
///
/// Codes are kebab-case and stable; tooling keys on them. Context entries
/// name the grid, criteria set, path or value the failure concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable code, e.g. `grid-missing`.
    pub code: String,
    /// Diagnostic message.
    pub message: String,
    /// What the error is about, keyed by role.
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// How to fix it, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Payload with no context.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Records `value` under `key`, replacing any earlier entry.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Display) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    /// Attaches a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Context value recorded under `key`.
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }
}

/// Renders as `[code] message (key=value, ...); hint: ...`.
impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        let mut entries = self.context.iter();
        if let Some((key, value)) = entries.next() {
            write!(f, " ({key}={value}")?;
            for (key, value) in entries {
                write!(f, ", {key}={value}")?;
            }
            f.write_str(")")?;
        }
        match &self.hint {
            Some(hint) => write!(f, "; hint: {hint}"),
            None => Ok(()),
        }
    }
}

/// A single failed unit inside a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    /// Unit identifier, e.g. `lyon_part1/schools` or `lyon_part1@FGR-50`.
    pub unit: String,
    /// Error that stopped the unit.
    pub error: HeatgridError,
}

/// Aggregate payload for [`HeatgridError::PartialBatchFailure`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    /// Batch operation name (`generate_all`, `reduce_all`, ...).
    pub operation: String,
    /// Number of units that completed.
    pub succeeded: usize,
    /// Per-unit failures in unit order.
    pub failures: Vec<ItemFailure>,
}

impl Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} succeeded, {} failed",
            self.operation,
            self.succeeded,
            self.failures.len()
        )?;
        for failure in &self.failures {
            write!(f, "\n  {}: {}", failure.unit, failure.error)?;
        }
        Ok(())
    }
}

/// Canonical error type for the heatgrid engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum HeatgridError {
    /// Latitude or longitude outside the valid range, or not finite.
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(ErrorInfo),
    /// Criteria set without any criterion.
    #[error("empty criteria set: {0}")]
    EmptyCriteriaSet(ErrorInfo),
    /// Criterion definition with an unusable weight or parameter.
    #[error("invalid criteria: {0}")]
    InvalidCriteria(ErrorInfo),
    /// Criteria set name missing from the registry.
    #[error("criteria not found: {0}")]
    CriteriaNotFound(ErrorInfo),
    /// Grid absent from the store or malformed.
    #[error("grid not found: {0}")]
    GridNotFound(ErrorInfo),
    /// Reduction precision that is not strictly positive.
    #[error("invalid precision: {0}")]
    InvalidPrecision(ErrorInfo),
    /// Reduction method tag outside {FGR, QCGR}.
    #[error("unknown method: {0}")]
    UnknownMethod(ErrorInfo),
    /// Read or write failure in the persistent store.
    #[error("store io error: {0}")]
    StoreIo(ErrorInfo),
    /// Serialization and schema errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
    /// Work abandoned after a cancellation request.
    #[error("cancelled: {0}")]
    Cancelled(ErrorInfo),
    /// Batch run in which at least one unit failed.
    #[error("partial batch failure: {0}")]
    PartialBatchFailure(BatchFailure),
}

impl HeatgridError {
    /// Returns the payload describing the error, if the variant carries one.
    pub fn info(&self) -> Option<&ErrorInfo> {
        match self {
            HeatgridError::InvalidCoordinate(info)
            | HeatgridError::EmptyCriteriaSet(info)
            | HeatgridError::InvalidCriteria(info)
            | HeatgridError::CriteriaNotFound(info)
            | HeatgridError::GridNotFound(info)
            | HeatgridError::InvalidPrecision(info)
            | HeatgridError::UnknownMethod(info)
            | HeatgridError::StoreIo(info)
            | HeatgridError::Serde(info)
            | HeatgridError::Cancelled(info) => Some(info),
            HeatgridError::PartialBatchFailure(_) => None,
        }
    }

    /// Short family tag matching the serialized `family` field.
    pub fn family(&self) -> &'static str {
        match self {
            HeatgridError::InvalidCoordinate(_) => "InvalidCoordinate",
            HeatgridError::EmptyCriteriaSet(_) => "EmptyCriteriaSet",
            HeatgridError::InvalidCriteria(_) => "InvalidCriteria",
            HeatgridError::CriteriaNotFound(_) => "CriteriaNotFound",
            HeatgridError::GridNotFound(_) => "GridNotFound",
            HeatgridError::InvalidPrecision(_) => "InvalidPrecision",
            HeatgridError::UnknownMethod(_) => "UnknownMethod",
            HeatgridError::StoreIo(_) => "StoreIo",
            HeatgridError::Serde(_) => "Serde",
            HeatgridError::Cancelled(_) => "Cancelled",
            HeatgridError::PartialBatchFailure(_) => "PartialBatchFailure",
        }
    }
}
