//! Selector chain registry and fallback resolution engine
//!
//! Resolves a logical UI target (e.g. "claim button") to a live element
//! handle by walking an ordered chain of concrete selectors, splitting the
//! caller's timeout budget across them, and recording which selector actually
//! worked. Per-chain hit metrics feed an advisory layer that flags selector
//! drift; chains are never reordered automatically.

pub mod advisor;
pub mod chain;
pub mod config;
pub mod driver;
pub mod engine;
pub mod metrics;

#[cfg(any(test, feature = "stub"))]
pub mod stub;

pub use advisor::{Suggestion, SuggestionKind};
pub use chain::{ChainRegistry, SelectorChain, WaitState};
pub use config::ChainCatalog;
pub use driver::{ElementHandle, PageContext};
pub use engine::{LocateOptions, SelectorEngine, MIN_PER_SELECTOR_TIMEOUT_MS};
pub use metrics::{MetricsStore, SelectorHitMetrics};
