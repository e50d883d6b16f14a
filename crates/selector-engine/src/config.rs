//! Selector catalog loading from configuration files

use crate::chain::{ChainRegistry, SelectorChain};
use serde::{Deserialize, Serialize};
use std::path::Path;
use steadyweb_core_types::AutomationError;
use tracing::info;

/// On-disk selector catalog
///
/// ```yaml
/// chains:
///   - key: claim_button
///     primary: "#claim-btn"
///     fallbacks:
///       - "button.claim"
///       - "text=领取"
///     wait_state: visible
///     timeout_per_selector_ms: 2000
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainCatalog {
    /// Selector chains in declaration order
    #[serde(default)]
    pub chains: Vec<SelectorChain>,
}

impl ChainCatalog {
    /// Parse a catalog from YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self, AutomationError> {
        serde_yaml::from_str(yaml).map_err(|err| {
            AutomationError::Configuration(format!("invalid selector catalog: {}", err))
        })
    }

    /// Load a catalog from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, AutomationError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            AutomationError::Configuration(format!(
                "cannot read selector catalog {}: {}",
                path.display(),
                err
            ))
        })?;
        let catalog = Self::from_yaml_str(&text)?;
        info!(
            path = %path.display(),
            chains = catalog.chains.len(),
            "loaded selector catalog"
        );
        Ok(catalog)
    }

    /// Build a registry from this catalog
    pub fn into_registry(self) -> Result<ChainRegistry, AutomationError> {
        ChainRegistry::from_chains(self.chains)
    }
}

impl ChainRegistry {
    /// Build a registry directly from YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self, AutomationError> {
        ChainCatalog::from_yaml_str(yaml)?.into_registry()
    }

    /// Build a registry directly from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, AutomationError> {
        ChainCatalog::from_yaml_file(path)?.into_registry()
    }
}
