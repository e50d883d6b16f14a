//! Retry execution loop
//!
//! Attempts are strictly sequential: attempt N+1 never starts before attempt
//! N's operation and (if it failed) its recovery action have both settled.
//! Cancellation is observed at the top of each iteration and during each
//! backoff sleep; there is no unbounded wait anywhere in the loop.

use crate::policy::RetryPolicy;
use crate::result::{AttemptError, RetryOutcome, RetryResult};
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use steadyweb_core_types::AutomationError;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Adaptive retry engine
///
/// Holds only the jitter source so policies can be shared read-only across
/// concurrent `execute` calls. The jitter source is injectable for
/// deterministic tests; the default samples uniformly within the offset.
#[derive(Clone)]
pub struct RetryEngine {
    jitter_source: Arc<dyn Fn(f64) -> f64 + Send + Sync>,
}

impl Default for RetryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryEngine {
    /// Create an engine with the default random jitter source
    pub fn new() -> Self {
        Self {
            jitter_source: Arc::new(default_jitter),
        }
    }

    /// Create an engine with an injected jitter source.
    ///
    /// The source receives the maximum offset (`base_delay × jitter_factor`)
    /// and returns the signed offset to apply.
    pub fn with_jitter_source<F>(jitter_source: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Self {
            jitter_source: Arc::new(jitter_source),
        }
    }

    /// Execute `operation` under `policy`, returning the structured result
    pub async fn execute<T, F, Fut>(&self, policy: &RetryPolicy, operation: F) -> RetryResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AutomationError>>,
    {
        self.execute_cancellable(policy, &CancellationToken::new(), operation)
            .await
    }

    /// Execute `operation` and surface the final error on failure
    pub async fn run<T, F, Fut>(
        &self,
        policy: &RetryPolicy,
        operation: F,
    ) -> Result<T, AutomationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AutomationError>>,
    {
        self.execute(policy, operation).await.into_result()
    }

    /// Execute `operation` under `policy` with cooperative cancellation.
    ///
    /// Classification order per failed attempt: the non-retryable set is
    /// checked first (so a kind in both sets is never retried), then the
    /// `should_retry` predicate (which overrides the retryable set when
    /// present), then the attempt bound. The recovery hook runs between the
    /// backoff computation and the sleep; its own failure is swallowed.
    pub async fn execute_cancellable<T, F, Fut>(
        &self,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> RetryResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AutomationError>>,
    {
        let op_id = Uuid::new_v4();
        let max_attempts = policy.max_attempts.max(1);
        let mut errors: Vec<AttemptError> = Vec::new();
        let mut total_delay_ms = 0.0;
        let mut last_error: Option<AutomationError> = None;
        let mut attempt: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                debug!(%op_id, attempt, "cancelled before attempt");
                return RetryResult {
                    outcome: RetryOutcome::Cancelled,
                    value: None,
                    total_attempts: attempt,
                    total_delay_ms,
                    errors,
                    last_error: Some(AutomationError::Cancelled(format!(
                        "cancelled after {} attempts",
                        attempt
                    ))),
                };
            }

            attempt += 1;
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        info!(%op_id, attempt, "operation succeeded after retries");
                    } else {
                        debug!(%op_id, "operation succeeded on first attempt");
                    }
                    return RetryResult {
                        outcome: RetryOutcome::Success,
                        value: Some(value),
                        total_attempts: attempt,
                        total_delay_ms,
                        errors,
                        last_error: None,
                    };
                }
                Err(err) => {
                    // Recorded before any control-flow decision so the trail
                    // is complete on every path
                    errors.push(AttemptError::new(attempt, &err));
                    let kind = err.kind();

                    if policy.non_retryable_kinds.contains(&kind) {
                        warn!(%op_id, attempt, kind = %kind, error = %err, "non-retryable error, stopping");
                        last_error = Some(err);
                        return RetryResult {
                            outcome: RetryOutcome::NonRetryable,
                            value: None,
                            total_attempts: attempt,
                            total_delay_ms,
                            errors,
                            last_error,
                        };
                    }

                    let classified_retryable = policy.retryable_kinds.contains(&kind);
                    let wants_retry = match &policy.should_retry {
                        Some(predicate) => predicate(&err, attempt),
                        None => classified_retryable,
                    };
                    warn!(%op_id, attempt, kind = %kind, error = %err, "attempt failed");
                    last_error = Some(err);

                    if !wants_retry || attempt >= max_attempts {
                        warn!(
                            %op_id, attempt, max_attempts, wants_retry,
                            "giving up, surfacing last error"
                        );
                        if policy.recover_on_final_failure {
                            run_recovery(&op_id, policy, "final-failure").await;
                        }
                        return RetryResult {
                            outcome: RetryOutcome::Exhausted,
                            value: None,
                            total_attempts: attempt,
                            total_delay_ms,
                            errors,
                            last_error,
                        };
                    }

                    let base = policy.base_delay_ms(attempt);
                    let delay_ms = if policy.jitter {
                        let offset = (self.jitter_source)(base * policy.jitter_factor);
                        (base + offset).max(0.0)
                    } else {
                        base
                    };
                    debug!(%op_id, attempt, delay_ms, "backing off before next attempt");

                    run_recovery(&op_id, policy, "between-attempts").await;

                    tokio::select! {
                        _ = cancel.cancelled() => {
                            debug!(%op_id, attempt, "cancelled during backoff");
                            return RetryResult {
                                outcome: RetryOutcome::Cancelled,
                                value: None,
                                total_attempts: attempt,
                                total_delay_ms,
                                errors,
                                last_error: Some(AutomationError::Cancelled(format!(
                                    "cancelled after {} attempts",
                                    attempt
                                ))),
                            };
                        }
                        _ = sleep(Duration::from_secs_f64(delay_ms / 1_000.0)) => {
                            total_delay_ms += delay_ms;
                        }
                    }
                }
            }
        }
    }
}

/// Run the policy's recovery hook, swallowing its failure.
///
/// A broken recovery hook must never mask the real error or abort the loop.
async fn run_recovery(op_id: &Uuid, policy: &RetryPolicy, phase: &str) {
    let Some(action) = &policy.recovery_action else {
        return;
    };
    debug!(%op_id, phase, "running recovery action");
    if let Err(err) = action().await {
        warn!(%op_id, phase, error = %err, "recovery action failed, continuing");
    }
}

fn default_jitter(max_offset: f64) -> f64 {
    if max_offset <= 0.0 {
        return 0.0;
    }
    rand::thread_rng().gen_range(-max_offset..=max_offset)
}
