//! Metrics discovery configuration.
//!
//! Only the document structure is interpreted here. Rule bodies are kept
//! as raw YAML and handed to the serving layer unchanged.

use crate::error::DiscoveryError;
use serde::Deserialize;
use std::{fs, path::Path};
use tracing::debug;

/// Loaded discovery configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsDiscoveryConfig {
    /// Custom metrics rules
    #[serde(default)]
    pub rules: Vec<serde_yaml::Value>,
    /// Resource metrics rules
    #[serde(default)]
    pub resource_rules: Option<serde_yaml::Value>,
    /// External metrics rules
    #[serde(default)]
    pub external_rules: Vec<serde_yaml::Value>,
}

impl MetricsDiscoveryConfig {
    /// Load the configuration at `path`.
    ///
    /// An empty document yields an empty configuration.
    ///
    /// # Errors
    ///
    /// [`DiscoveryError`] when the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, DiscoveryError> {
        let raw = fs::read_to_string(path).map_err(|source| DiscoveryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&raw).map_err(|source| DiscoveryError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(
            path = %path.display(),
            rules = config.rules.len(),
            external_rules = config.external_rules.len(),
            "loaded metrics discovery configuration"
        );
        Ok(config)
    }

    fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }
}
