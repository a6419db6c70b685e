//! Outcomes of batch units and whole runs.

use heatgrid_core::errors::{BatchFailure, ErrorInfo, HeatgridError, ItemFailure};
use serde::{Deserialize, Serialize};

/// State of one batch unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobState {
    /// Unit ran and persisted its output.
    Complete,
    /// Output already existed and was left alone.
    Skipped,
    /// Unit failed; see the job error.
    Failed,
    /// Unit never started because the batch was cancelled.
    Cancelled,
}

/// Outcome of one batch unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobReport {
    /// Unit identifier, `grid/criteria` or `grid@METHOD-precision`.
    pub unit: String,
    /// Final state.
    pub state: JobState,
    /// Points written by the unit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<usize>,
    /// Failure detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<HeatgridError>,
}

impl JobReport {
    /// Completed unit that wrote `points` points.
    pub fn complete(unit: impl Into<String>, points: usize) -> Self {
        Self {
            unit: unit.into(),
            state: JobState::Complete,
            points: Some(points),
            error: None,
        }
    }

    /// Unit whose output already existed.
    pub fn skipped(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            state: JobState::Skipped,
            points: None,
            error: None,
        }
    }

    /// Failed unit.
    pub fn failed(unit: impl Into<String>, error: HeatgridError) -> Self {
        Self {
            unit: unit.into(),
            state: JobState::Failed,
            points: None,
            error: Some(error),
        }
    }

    /// Unit abandoned before it started.
    pub fn cancelled(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            state: JobState::Cancelled,
            points: None,
            error: None,
        }
    }
}

/// Summary of a batch run. Failures are collected, never raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Operation name, e.g. `generate_all` or `reduce_all`.
    pub operation: String,
    /// Units that completed.
    pub succeeded: usize,
    /// Units skipped because their output existed.
    pub skipped: usize,
    /// Units that failed.
    pub failed: usize,
    /// Units abandoned after cancellation.
    pub cancelled: usize,
    /// Per-unit outcomes ordered by unit.
    pub jobs: Vec<JobReport>,
}

impl BatchReport {
    /// Tallies a list of job reports.
    pub fn new(operation: impl Into<String>, mut jobs: Vec<JobReport>) -> Self {
        jobs.sort_by(|a, b| a.unit.cmp(&b.unit));
        let count = |state: JobState| jobs.iter().filter(|job| job.state == state).count();
        Self {
            operation: operation.into(),
            succeeded: count(JobState::Complete),
            skipped: count(JobState::Skipped),
            failed: count(JobState::Failed),
            cancelled: count(JobState::Cancelled),
            jobs,
        }
    }

    /// Whether every unit completed or was skipped.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.cancelled == 0
    }

    /// Failed units with their errors.
    pub fn failures(&self) -> Vec<ItemFailure> {
        self.jobs
            .iter()
            .filter_map(|job| {
                job.error.clone().map(|error| ItemFailure {
                    unit: job.unit.clone(),
                    error,
                })
            })
            .collect()
    }

    /// `PartialBatchFailure` summarizing the failed units, if any.
    pub fn failure(&self) -> Option<HeatgridError> {
        if self.failed == 0 {
            return None;
        }
        Some(HeatgridError::PartialBatchFailure(BatchFailure {
            operation: self.operation.clone(),
            succeeded: self.succeeded,
            failures: self.failures(),
        }))
    }

    /// Converts the report into an error when any unit failed or was cancelled.
    ///
    /// Failures take precedence over cancellation.
    pub fn into_result(self) -> Result<Self, HeatgridError> {
        if let Some(err) = self.failure() {
            return Err(err);
        }
        if self.cancelled > 0 {
            return Err(HeatgridError::Cancelled(
                ErrorInfo::new("batch-cancelled", "batch cancelled before every unit ran")
                    .with_context("operation", &self.operation)
                    .with_context("cancelled", self.cancelled)
                    .with_context("succeeded", self.succeeded),
            ));
        }
        Ok(self)
    }
}
