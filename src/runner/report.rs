//! Run reports.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of a single step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    /// One-based step number.
    pub step: usize,
    /// Short fingerprint of the applied configuration.
    pub fingerprint: String,
    /// Whether the apply changed anything.
    pub changed: bool,
    /// Checks that passed.
    pub checks_passed: usize,
    /// Checks in the step.
    pub checks_total: usize,
    /// Time spent applying and checking, in milliseconds.
    pub duration_ms: u64,
}

/// Outcome of a whole scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Scenario name.
    pub scenario: String,
    /// Provisioner used.
    pub provisioner: String,
    /// Resource address.
    pub address: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When teardown finished.
    pub finished_at: DateTime<Utc>,
    /// Completed steps, in order.
    pub steps: Vec<StepReport>,
}

impl RunReport {
    /// Total checks passed across steps.
    #[must_use]
    pub fn checks_passed(&self) -> usize {
        self.steps.iter().map(|s| s.checks_passed).sum()
    }

    /// Wall-clock duration of the run in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
