//! Adaptive retry engine
//!
//! Wraps arbitrary asynchronous operations with bounded, classified,
//! backoff-and-jitter retry: errors are classified by kind against a
//! [`RetryPolicy`], an optional recovery action runs between attempts, and
//! every `execute` call produces a [`RetryResult`] audit trail whether or not
//! the operation ultimately succeeded.

pub mod compose;
pub mod engine;
pub mod policy;
pub mod result;

pub use compose::{with_retry, Retryable};
pub use engine::RetryEngine;
pub use policy::{RecoveryAction, RetryPolicy, RetryPredicate};
pub use result::{AttemptError, RetryOutcome, RetryResult};
