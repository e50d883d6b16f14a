//! Shared primitives for the SteadyWeb fault-tolerance layer.
//!
//! Both engines (selector resolution and adaptive retry) report failures
//! through the single [`AutomationError`] channel defined here, so retry
//! policies can classify errors regardless of which layer raised them.

pub mod errors;

pub use errors::{AutomationError, ErrorKind};
