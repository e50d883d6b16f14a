//! Error taxonomy shared by the selector and retry engines

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification kind attached to every [`AutomationError`].
///
/// Retry policies hold sets of kinds rather than concrete error values, so a
/// kind must be cheap to hash and compare. Caller-raised business errors carry
/// their own kind label and are only classified when a policy names them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Browsing context is closed or detached (fatal for resolution)
    ClosedContext,

    /// No selector in a chain produced a live element
    ElementNotFound,

    /// A UI action or wait exceeded its timeout
    ActionTimeout,

    /// Transport-level failure (navigation, request, websocket)
    Network,

    /// Input data failed validation (programming mistake, not flakiness)
    Validation,

    /// Missing or malformed configuration (e.g. unknown chain key)
    Configuration,

    /// Operation was cancelled cooperatively
    Cancelled,

    /// Caller-defined business error kind
    Business(String),
}

impl ErrorKind {
    /// Short label used in logs and serialized reports
    pub fn label(&self) -> &str {
        match self {
            ErrorKind::ClosedContext => "closed_context",
            ErrorKind::ElementNotFound => "element_not_found",
            ErrorKind::ActionTimeout => "action_timeout",
            ErrorKind::Network => "network",
            ErrorKind::Validation => "validation",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Business(kind) => kind.as_str(),
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Automation error enumeration
#[derive(Debug, Error, Clone)]
pub enum AutomationError {
    /// Browsing context is closed or detached
    #[error("browsing context is closed: {0}")]
    ClosedContext(String),

    /// Element not found after exhausting a selector chain
    #[error("element not found: {0}")]
    ElementNotFound(String),

    /// Wait or action timed out
    #[error("action timed out: {0}")]
    ActionTimeout(String),

    /// Network-level failure
    #[error("network error: {0}")]
    Network(String),

    /// Invalid input or state
    #[error("validation failed: {0}")]
    Validation(String),

    /// Configuration mistake (unknown key, bad chain definition)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Cooperative cancellation observed
    #[error("operation cancelled: {0}")]
    Cancelled(String),

    /// Caller-raised business error with an explicit kind label
    #[error("{kind}: {message}")]
    Business { kind: String, message: String },
}

impl AutomationError {
    /// Construct an error from a classification kind and message.
    ///
    /// Used by reporting code that rebuilds a typed error from a recorded
    /// attempt entry.
    pub fn from_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::ClosedContext => AutomationError::ClosedContext(message),
            ErrorKind::ElementNotFound => AutomationError::ElementNotFound(message),
            ErrorKind::ActionTimeout => AutomationError::ActionTimeout(message),
            ErrorKind::Network => AutomationError::Network(message),
            ErrorKind::Validation => AutomationError::Validation(message),
            ErrorKind::Configuration => AutomationError::Configuration(message),
            ErrorKind::Cancelled => AutomationError::Cancelled(message),
            ErrorKind::Business(kind) => AutomationError::Business { kind, message },
        }
    }

    /// Get the classification kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AutomationError::ClosedContext(_) => ErrorKind::ClosedContext,
            AutomationError::ElementNotFound(_) => ErrorKind::ElementNotFound,
            AutomationError::ActionTimeout(_) => ErrorKind::ActionTimeout,
            AutomationError::Network(_) => ErrorKind::Network,
            AutomationError::Validation(_) => ErrorKind::Validation,
            AutomationError::Configuration(_) => ErrorKind::Configuration,
            AutomationError::Cancelled(_) => ErrorKind::Cancelled,
            AutomationError::Business { kind, .. } => ErrorKind::Business(kind.clone()),
        }
    }

    /// Check if this error is retryable absent any policy classification.
    ///
    /// Transient UI and transport failures qualify; programming and setup
    /// mistakes do not. Unclassified business kinds default to non-retryable.
    pub fn is_retryable_by_default(&self) -> bool {
        matches!(
            self,
            AutomationError::ElementNotFound(_)
                | AutomationError::ActionTimeout(_)
                | AutomationError::Network(_)
        )
    }

    /// Check if this error is fatal for the current browsing context
    pub fn is_fatal(&self) -> bool {
        matches!(self, AutomationError::ClosedContext(_))
    }
}
