//! Explicit retry composition
//!
//! Instead of annotating functions at their definition site, an operation is
//! wrapped together with a policy into a [`Retryable`] value; calling it adds
//! only the retry-and-delay behavior while preserving the async calling
//! convention and propagating errors unchanged.

use crate::engine::RetryEngine;
use crate::policy::RetryPolicy;
use crate::result::RetryResult;
use std::future::Future;
use std::sync::Arc;
use steadyweb_core_types::AutomationError;

/// An operation bound to a retry policy and engine
pub struct Retryable<F> {
    engine: Arc<RetryEngine>,
    policy: RetryPolicy,
    operation: F,
}

impl<F> Retryable<F> {
    /// Bind `operation` to `policy` on `engine`
    pub fn new(engine: Arc<RetryEngine>, policy: RetryPolicy, operation: F) -> Self {
        Self {
            engine,
            policy,
            operation,
        }
    }

    /// The bound policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Invoke the operation under retry, surfacing the final error
    pub async fn call<T, Fut>(&mut self) -> Result<T, AutomationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AutomationError>>,
    {
        let engine = self.engine.clone();
        engine.run(&self.policy, &mut self.operation).await
    }

    /// Invoke the operation under retry, returning the structured result
    pub async fn call_with_result<T, Fut>(&mut self) -> RetryResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AutomationError>>,
    {
        let engine = self.engine.clone();
        engine.execute(&self.policy, &mut self.operation).await
    }
}

impl RetryEngine {
    /// Wrap an operation into a [`Retryable`] bound to this engine
    pub fn wrap<F>(self: &Arc<Self>, policy: RetryPolicy, operation: F) -> Retryable<F> {
        Retryable::new(self.clone(), policy, operation)
    }
}

/// One-shot helper for call sites that do not keep an engine around
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: F,
) -> Result<T, AutomationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AutomationError>>,
{
    RetryEngine::new().run(policy, operation).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick_policy() -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(3)
            .with_backoff(1, 2.0, 10)
            .with_jitter(false, 0.0)
    }

    #[tokio::test]
    async fn test_retryable_call_retries_and_succeeds() {
        let engine = Arc::new(RetryEngine::new());
        let attempts = Arc::new(AtomicU32::new(0));
        let ops = attempts.clone();

        let mut retryable = engine.wrap(quick_policy(), move || {
            let ops = ops.clone();
            async move {
                let n = ops.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(AutomationError::Network("flap".to_string()))
                } else {
                    Ok(n)
                }
            }
        });

        assert_eq!(retryable.call().await.unwrap(), 3);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retryable_propagates_error_unchanged() {
        let engine = Arc::new(RetryEngine::new());
        let mut retryable = engine.wrap(quick_policy(), || async {
            Err::<(), _>(AutomationError::Validation("broken form".to_string()))
        });

        let err = retryable.call().await.unwrap_err();
        assert!(matches!(err, AutomationError::Validation(_)));
        assert_eq!(err.to_string(), "validation failed: broken form");
    }

    #[tokio::test]
    async fn test_retryable_is_reusable() {
        let engine = Arc::new(RetryEngine::new());
        let calls = Arc::new(AtomicU32::new(0));
        let ops = calls.clone();

        let mut retryable = engine.wrap(quick_policy(), move || {
            let ops = ops.clone();
            async move {
                ops.fetch_add(1, Ordering::SeqCst);
                Ok::<_, AutomationError>(())
            }
        });

        retryable.call().await.unwrap();
        retryable.call().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_with_retry_helper() {
        let attempts = Arc::new(AtomicU32::new(0));
        let ops = attempts.clone();

        let value = with_retry(&quick_policy(), move || {
            let ops = ops.clone();
            async move {
                let n = ops.fetch_add(1, Ordering::SeqCst) + 1;
                if n == 1 {
                    Err(AutomationError::ActionTimeout("cold cache".to_string()))
                } else {
                    Ok("ready")
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, "ready");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
