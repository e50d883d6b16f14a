//! Selector chains and the chain registry

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use steadyweb_core_types::AutomationError;
use tracing::debug;

/// Default per-selector budget when a chain does not specify one (milliseconds)
pub const DEFAULT_PER_SELECTOR_TIMEOUT_MS: u64 = 2_000;

/// Element state to wait for during resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    /// Present in the DOM
    Attached,

    /// Removed from the DOM
    Detached,

    /// Attached, rendered and non-zero sized
    Visible,

    /// Detached or not rendered
    Hidden,
}

impl Default for WaitState {
    fn default() -> Self {
        WaitState::Visible
    }
}

impl WaitState {
    /// Get state name as string
    pub fn name(&self) -> &'static str {
        match self {
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
        }
    }
}

/// An ordered chain of alternative selectors for one logical UI target
///
/// `primary` is tried first, then each fallback in declared order. Ordering is
/// significant (most-specific-first) and is never re-sorted by the engine;
/// only the advisory layer proposes changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorChain {
    /// Stable logical key callers use (e.g. "claim_button")
    pub key: String,

    /// Highest-priority selector expression
    pub primary: String,

    /// Selectors tried in order after the primary
    #[serde(default)]
    pub fallbacks: Vec<String>,

    /// Default element state to wait for
    #[serde(default)]
    pub wait_state: WaitState,

    /// Baseline per-selector budget when the caller gives no total timeout
    #[serde(default = "default_per_selector_timeout")]
    pub timeout_per_selector_ms: u64,
}

fn default_per_selector_timeout() -> u64 {
    DEFAULT_PER_SELECTOR_TIMEOUT_MS
}

impl SelectorChain {
    /// Create a chain with a primary selector only
    pub fn new(key: impl Into<String>, primary: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            primary: primary.into(),
            fallbacks: Vec::new(),
            wait_state: WaitState::default(),
            timeout_per_selector_ms: DEFAULT_PER_SELECTOR_TIMEOUT_MS,
        }
    }

    /// Add fallback selectors (appended in order)
    pub fn with_fallbacks<I, S>(mut self, fallbacks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallbacks.extend(fallbacks.into_iter().map(Into::into));
        self
    }

    /// Set the default wait state
    pub fn with_wait_state(mut self, state: WaitState) -> Self {
        self.wait_state = state;
        self
    }

    /// Set the baseline per-selector timeout
    pub fn with_timeout_per_selector(mut self, timeout_ms: u64) -> Self {
        self.timeout_per_selector_ms = timeout_ms;
        self
    }

    /// All selectors in resolution order (primary first)
    pub fn all_selectors(&self) -> Vec<&str> {
        let mut selectors = Vec::with_capacity(1 + self.fallbacks.len());
        selectors.push(self.primary.as_str());
        selectors.extend(self.fallbacks.iter().map(String::as_str));
        selectors
    }

    /// Number of selectors in the chain (always >= 1 after validation)
    pub fn selector_count(&self) -> usize {
        1 + self.fallbacks.len()
    }

    /// Validate structural invariants (non-empty key and primary)
    pub fn validate(&self) -> Result<(), AutomationError> {
        if self.key.trim().is_empty() {
            return Err(AutomationError::Configuration(
                "selector chain key must not be empty".to_string(),
            ));
        }
        if self.primary.trim().is_empty() {
            return Err(AutomationError::Configuration(format!(
                "chain '{}' has an empty primary selector",
                self.key
            )));
        }
        if let Some(pos) = self.fallbacks.iter().position(|s| s.trim().is_empty()) {
            return Err(AutomationError::Configuration(format!(
                "chain '{}' has an empty fallback selector at index {}",
                self.key,
                pos + 1
            )));
        }
        Ok(())
    }
}

/// Catalog mapping logical keys to selector chains
///
/// Shared read-mostly across concurrent resolutions; registrations
/// add-or-overwrite and never touch existing metrics for the key.
#[derive(Default)]
pub struct ChainRegistry {
    chains: DashMap<String, Arc<SelectorChain>>,
}

impl ChainRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from a set of chains
    pub fn from_chains<I>(chains: I) -> Result<Self, AutomationError>
    where
        I: IntoIterator<Item = SelectorChain>,
    {
        let registry = Self::new();
        for chain in chains {
            registry.register(chain)?;
        }
        Ok(registry)
    }

    /// Add or overwrite a chain
    pub fn register(&self, chain: SelectorChain) -> Result<(), AutomationError> {
        chain.validate()?;
        debug!(
            key = %chain.key,
            selectors = chain.selector_count(),
            "registering selector chain"
        );
        self.chains.insert(chain.key.clone(), Arc::new(chain));
        Ok(())
    }

    /// Look up a chain by key
    pub fn get(&self, key: &str) -> Option<Arc<SelectorChain>> {
        self.chains.get(key).map(|entry| entry.value().clone())
    }

    /// All registered keys
    pub fn keys(&self) -> Vec<String> {
        self.chains.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of registered chains
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_selector_order() {
        let chain = SelectorChain::new("claim_button", "#claim")
            .with_fallbacks(["button.claim", "text=领取"]);

        assert_eq!(chain.selector_count(), 3);
        assert_eq!(chain.all_selectors(), vec!["#claim", "button.claim", "text=领取"]);
    }

    #[test]
    fn test_chain_defaults() {
        let chain = SelectorChain::new("k", "#a");
        assert_eq!(chain.wait_state, WaitState::Visible);
        assert_eq!(chain.timeout_per_selector_ms, DEFAULT_PER_SELECTOR_TIMEOUT_MS);
        assert!(chain.fallbacks.is_empty());
    }

    #[test]
    fn test_chain_validation() {
        assert!(SelectorChain::new("k", "#a").validate().is_ok());
        assert!(SelectorChain::new("", "#a").validate().is_err());
        assert!(SelectorChain::new("k", "  ").validate().is_err());
        assert!(SelectorChain::new("k", "#a")
            .with_fallbacks([""])
            .validate()
            .is_err());
    }

    #[test]
    fn test_registry_register_and_get() {
        let registry = ChainRegistry::new();
        registry
            .register(SelectorChain::new("save", "#save-btn"))
            .unwrap();

        assert_eq!(registry.len(), 1);
        let chain = registry.get("save").unwrap();
        assert_eq!(chain.primary, "#save-btn");
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_registry_overwrite() {
        let registry = ChainRegistry::new();
        registry.register(SelectorChain::new("save", "#old")).unwrap();
        registry.register(SelectorChain::new("save", "#new")).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("save").unwrap().primary, "#new");
    }

    #[test]
    fn test_registry_rejects_invalid_chain() {
        let registry = ChainRegistry::new();
        let result = registry.register(SelectorChain::new("bad", ""));
        assert!(result.is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_wait_state_serde() {
        let yaml = serde_yaml::to_string(&WaitState::Attached).unwrap();
        assert_eq!(yaml.trim(), "attached");
        let state: WaitState = serde_yaml::from_str("hidden").unwrap();
        assert_eq!(state, WaitState::Hidden);
    }
}
