//! Run report types for import/sync reconciliation.
//!
//! A [`RunReport`] is created fresh at the start of each run, mutated by the
//! reconciler on every processed record, and returned to the caller. There is
//! no persisted run history.

use serde::Serialize;

/// Default cap on the per-row error list carried by a [`RunReport`].
pub const MAX_REPORT_ERRORS: usize = 50;

/// Terminal state of processing a single record during an import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    /// No existing entity matched - a new one was persisted
    Created,
    /// An existing entity matched and at least one field differed
    Updated,
    /// An existing entity matched with no field changes, or the row was
    /// dropped by policy
    Skipped,
}

/// Accumulated counters and bounded error list for one import/sync run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub message: String,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    /// Muscle groups auto-vivified while resolving references.
    pub muscle_groups_created: usize,
    /// Total number of rows that errored, including those past the cap.
    pub error_count: usize,
    /// Per-row error messages, truncated at the cap.
    pub errors: Vec<String>,
    /// Set when the external source became unreachable mid-run; the
    /// counters above still reflect the progress made before the failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_error: Option<String>,
    #[serde(skip)]
    error_cap: usize,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    /// Creates an empty report with the default error cap.
    pub fn new() -> Self {
        Self::with_cap(MAX_REPORT_ERRORS)
    }

    /// Creates an empty report with a custom error cap.
    pub fn with_cap(error_cap: usize) -> Self {
        Self {
            message: String::new(),
            created: 0,
            updated: 0,
            skipped: 0,
            muscle_groups_created: 0,
            error_count: 0,
            errors: Vec::new(),
            fetch_error: None,
            error_cap,
        }
    }

    /// Records a non-error outcome, incrementing the matching counter.
    pub fn record(&mut self, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Created => self.created += 1,
            RowOutcome::Updated => self.updated += 1,
            RowOutcome::Skipped => self.skipped += 1,
        }
    }

    /// Records a per-row error. Messages past the cap are dropped from the
    /// list but still counted; processing never stops at the cap.
    pub fn record_error(&mut self, message: String) {
        self.error_count += 1;
        if self.errors.len() < self.error_cap {
            self.errors.push(message);
        }
    }

    /// Stamps the summary message, returning the finished report.
    pub fn finish(mut self, message: &str) -> Self {
        self.message = message.to_string();
        self
    }

    /// Marks the run as cut short by a source fetch failure. The report
    /// still carries everything processed before the failure.
    pub fn fail_fetch(mut self, message: &str, error: String) -> Self {
        self.message = message.to_string();
        self.fetch_error = Some(error);
        self
    }

    /// Total number of records accounted for.
    pub fn total(&self) -> usize {
        self.created + self.updated + self.skipped + self.error_count
    }
}
