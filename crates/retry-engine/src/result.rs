//! Structured retry outcomes

use chrono::{DateTime, Utc};
use serde::Serialize;
use steadyweb_core_types::{AutomationError, ErrorKind};

/// Terminal state of one `execute` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryOutcome {
    /// The operation eventually succeeded
    Success,

    /// Retries ran out (or the policy declined another attempt)
    Exhausted,

    /// A non-retryable error kind stopped the loop immediately
    NonRetryable,

    /// Cooperative cancellation was observed
    Cancelled,
}

/// One failed attempt in the audit trail
#[derive(Debug, Clone, Serialize)]
pub struct AttemptError {
    /// 1-based attempt number
    pub attempt: u32,

    /// Classification of the error
    pub kind: ErrorKind,

    /// Rendered error message
    pub message: String,

    /// When the failure was recorded
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl AttemptError {
    /// Record a failed attempt
    pub fn new(attempt: u32, error: &AutomationError) -> Self {
        Self {
            attempt,
            kind: error.kind(),
            message: error.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Complete outcome of one `execute` call
///
/// Constructed fresh per call and fully populated by the time the call
/// returns; never mutated afterward. The error history is appended before any
/// control-flow decision, so it is complete on every path.
#[derive(Debug)]
pub struct RetryResult<T> {
    /// Terminal state
    pub outcome: RetryOutcome,

    /// Present only on success
    pub value: Option<T>,

    /// Attempts actually performed
    pub total_attempts: u32,

    /// Sum of the delays slept between attempts (milliseconds)
    pub total_delay_ms: f64,

    /// Per-attempt error history, in attempt order
    pub errors: Vec<AttemptError>,

    /// The final error, typed, for callers that re-surface it
    pub last_error: Option<AutomationError>,
}

impl<T> RetryResult<T> {
    /// Whether the operation ultimately succeeded
    pub fn is_success(&self) -> bool {
        self.outcome == RetryOutcome::Success
    }

    /// Last recorded attempt failure, if any
    pub fn last_attempt_error(&self) -> Option<&AttemptError> {
        self.errors.last()
    }

    /// Convert into a plain `Result`, surfacing the final error on failure
    pub fn into_result(self) -> Result<T, AutomationError> {
        match (self.outcome, self.value) {
            (RetryOutcome::Success, Some(value)) => Ok(value),
            (_, _) => Err(self.last_error.unwrap_or_else(|| {
                AutomationError::Cancelled("cancelled before any attempt completed".to_string())
            })),
        }
    }
}
