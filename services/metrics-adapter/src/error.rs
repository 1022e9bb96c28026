//! Adapter error types.

use prom_client::ClientError;
use std::{io, path::PathBuf};
use thiserror::Error;

/// Errors loading the metrics discovery configuration.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// File could not be read
    #[error("unable to read {}: {source}", path.display())]
    Read {
        /// Configuration path
        path: PathBuf,
        /// Read failure
        source: io::Error,
    },

    /// File is not a valid discovery document
    #[error("unable to parse {}: {source}", path.display())]
    Parse {
        /// Configuration path
        path: PathBuf,
        /// Parser failure
        source: serde_yaml::Error,
    },
}

/// Adapter option errors.
#[derive(Error, Debug)]
pub enum OptionsError {
    /// `load_config` was called without a configuration file
    #[error("no metrics discovery configuration file specified (set ADAPTER_CONFIG_FILE)")]
    MissingConfigFile,

    /// Discovery configuration could not be loaded
    #[error("unable to load metrics discovery configuration: {0}")]
    ConfigLoad(#[from] DiscoveryError),

    /// Environment variable parse error
    #[error("Failed to parse environment variable {name}: {reason}")]
    ParseError {
        /// Variable name
        name: String,
        /// Parser message
        reason: String,
    },

    /// Prometheus client could not be built
    #[error(transparent)]
    Client(#[from] ClientError),
}
