//! Retry policy configuration

use futures::future::BoxFuture;
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use steadyweb_core_types::{AutomationError, ErrorKind};

/// Recovery hook run between a failed attempt and the next delay.
///
/// Best-effort by contract: its own failure is logged and swallowed, never
/// allowed to replace the primary error or abort the retry loop.
pub type RecoveryAction =
    Arc<dyn Fn() -> BoxFuture<'static, Result<(), AutomationError>> + Send + Sync>;

/// Predicate overriding the retryable-kind classification when present
pub type RetryPredicate = Arc<dyn Fn(&AutomationError, u32) -> bool + Send + Sync>;

/// Configuration value object for the retry engine
///
/// Immutable by convention: built once at bootstrap, then shared read-only
/// across concurrent `execute` calls.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Upper bound on attempts (always >= 1)
    pub max_attempts: u32,

    /// Delay before the second attempt (milliseconds)
    pub initial_delay_ms: u64,

    /// Multiplier applied to the delay after each attempt
    pub backoff_factor: f64,

    /// Cap on any single computed delay (milliseconds)
    pub max_delay_ms: u64,

    /// Kinds worth retrying
    pub retryable_kinds: HashSet<ErrorKind>,

    /// Kinds that stop the loop immediately; takes precedence over
    /// `retryable_kinds` when a kind appears in both
    pub non_retryable_kinds: HashSet<ErrorKind>,

    /// Whether to perturb delays randomly
    pub jitter: bool,

    /// Relative jitter amplitude in `[0, 1)`
    pub jitter_factor: f64,

    /// Overrides the retryable-kind check when present
    pub should_retry: Option<RetryPredicate>,

    /// Hook run between a failed attempt and the next delay
    pub recovery_action: Option<RecoveryAction>,

    /// Run the recovery hook once more after the final failed attempt
    pub recover_on_final_failure: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 500,
            backoff_factor: 2.0,
            max_delay_ms: 10_000,
            retryable_kinds: default_retryable_kinds(),
            non_retryable_kinds: default_non_retryable_kinds(),
            jitter: true,
            jitter_factor: 0.1,
            should_retry: None,
            recovery_action: None,
            recover_on_final_failure: false,
        }
    }
}

/// Kinds retried absent explicit classification: transient UI and transport
/// failures
fn default_retryable_kinds() -> HashSet<ErrorKind> {
    HashSet::from([
        ErrorKind::ElementNotFound,
        ErrorKind::ActionTimeout,
        ErrorKind::Network,
    ])
}

/// Kinds that indicate a programming or setup mistake, or a dead context
fn default_non_retryable_kinds() -> HashSet<ErrorKind> {
    HashSet::from([
        ErrorKind::ClosedContext,
        ErrorKind::Validation,
        ErrorKind::Configuration,
        ErrorKind::Cancelled,
    ])
}

impl RetryPolicy {
    /// Create a policy with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// "step" profile: single UI interactions.
    ///
    /// Few attempts, short delay, light jitter.
    pub fn step() -> Self {
        Self {
            max_attempts: 2,
            initial_delay_ms: 200,
            backoff_factor: 2.0,
            max_delay_ms: 2_000,
            jitter_factor: 0.1,
            ..Self::default()
        }
    }

    /// "stage" profile: multi-step business phases.
    ///
    /// More attempts, longer delays, recovery also fires after the final
    /// failure so the page is left in a recoverable state.
    pub fn stage() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1_000,
            backoff_factor: 2.0,
            max_delay_ms: 15_000,
            jitter_factor: 0.2,
            recover_on_final_failure: true,
            ..Self::default()
        }
    }

    /// Set the attempt bound (clamped to >= 1)
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the exponential backoff parameters
    pub fn with_backoff(mut self, initial_delay_ms: u64, factor: f64, max_delay_ms: u64) -> Self {
        self.initial_delay_ms = initial_delay_ms;
        self.backoff_factor = factor.max(1.0);
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Enable or disable jitter; factor is clamped to `[0, 1)`
    pub fn with_jitter(mut self, jitter: bool, factor: f64) -> Self {
        self.jitter = jitter;
        self.jitter_factor = factor.clamp(0.0, 0.999);
        self
    }

    /// Replace the retryable kind set
    pub fn with_retryable_kinds<I>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = ErrorKind>,
    {
        self.retryable_kinds = kinds.into_iter().collect();
        self
    }

    /// Replace the non-retryable kind set
    pub fn with_non_retryable_kinds<I>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = ErrorKind>,
    {
        self.non_retryable_kinds = kinds.into_iter().collect();
        self
    }

    /// Add a single retryable kind
    pub fn retryable_on(mut self, kind: ErrorKind) -> Self {
        self.retryable_kinds.insert(kind);
        self
    }

    /// Add a single non-retryable kind
    pub fn non_retryable_on(mut self, kind: ErrorKind) -> Self {
        self.non_retryable_kinds.insert(kind);
        self
    }

    /// Install a predicate that overrides the retryable-kind check
    pub fn with_should_retry<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&AutomationError, u32) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Some(Arc::new(predicate));
        self
    }

    /// Install an async recovery action
    pub fn with_recovery_action<F, Fut>(mut self, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), AutomationError>> + Send + 'static,
    {
        self.recovery_action = Some(Arc::new(move || Box::pin(action())));
        self
    }

    /// Also run the recovery action after the final failed attempt
    pub fn with_recover_on_final_failure(mut self, enabled: bool) -> Self {
        self.recover_on_final_failure = enabled;
        self
    }

    /// Un-jittered delay before the attempt following `attempt` (1-based).
    ///
    /// `min(initial × factor^(attempt-1), max)`, exponent capped so `powi`
    /// cannot overflow.
    pub fn base_delay_ms(&self, attempt: u32) -> f64 {
        let exponent = attempt.saturating_sub(1).min(31) as i32;
        let raw = self.initial_delay_ms as f64 * self.backoff_factor.powi(exponent);
        raw.min(self.max_delay_ms as f64)
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("initial_delay_ms", &self.initial_delay_ms)
            .field("backoff_factor", &self.backoff_factor)
            .field("max_delay_ms", &self.max_delay_ms)
            .field("retryable_kinds", &self.retryable_kinds)
            .field("non_retryable_kinds", &self.non_retryable_kinds)
            .field("jitter", &self.jitter)
            .field("jitter_factor", &self.jitter_factor)
            .field("should_retry", &self.should_retry.as_ref().map(|_| "<predicate>"))
            .field(
                "recovery_action",
                &self.recovery_action.as_ref().map(|_| "<action>"),
            )
            .field("recover_on_final_failure", &self.recover_on_final_failure)
            .finish()
    }
}
