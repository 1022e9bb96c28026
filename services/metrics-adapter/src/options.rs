//! Adapter options.
//!
//! Options come from the environment (optionally seeded from a `.env` file)
//! and map one to one onto the adapter's Prometheus connection settings.

use crate::{discovery::MetricsDiscoveryConfig, error::OptionsError};
use prom_client::{ClientConfig, PrometheusClient, build_client};
use std::{env, path::PathBuf, str::FromStr, time::Duration};

/// Default Prometheus endpoint.
pub const DEFAULT_PROMETHEUS_URL: &str = "http://ack-prometheus-operator-prometheus.monitoring.svc:9090";

/// Default interval between metric relists.
pub const DEFAULT_RELIST_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Default period queried for available metrics.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(20 * 60);

/// Options for connecting the adapter to Prometheus.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterOptions {
    /// Prometheus base URL
    pub prometheus_url: String,
    /// Use the in-cluster service account
    pub prometheus_auth_in_cluster: bool,
    /// Kubeconfig with auth details
    pub prometheus_auth_config: Option<PathBuf>,
    /// CA bundle to pin
    pub prometheus_ca_file: Option<PathBuf>,
    /// Bearer token file
    pub prometheus_token_file: Option<PathBuf>,
    /// Raw `key=value` headers
    pub prometheus_headers: Vec<String>,
    /// Metrics discovery configuration file
    pub adapter_config_file: Option<PathBuf>,
    /// Interval between metric relists
    pub metrics_relist_interval: Duration,
    /// Period queried for available metrics
    pub metrics_max_age: Duration,
    /// Loaded discovery configuration
    pub metrics_config: MetricsDiscoveryConfig,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            prometheus_url: DEFAULT_PROMETHEUS_URL.to_string(),
            prometheus_auth_in_cluster: false,
            prometheus_auth_config: None,
            prometheus_ca_file: None,
            prometheus_token_file: None,
            prometheus_headers: Vec::new(),
            adapter_config_file: None,
            metrics_relist_interval: DEFAULT_RELIST_INTERVAL,
            metrics_max_age: DEFAULT_MAX_AGE,
            metrics_config: MetricsDiscoveryConfig::default(),
        }
    }
}

impl AdapterOptions {
    /// Loads options from environment variables, after reading `.env`.
    ///
    /// # Errors
    ///
    /// [`OptionsError::ParseError`] when a variable has the wrong type.
    pub fn from_env() -> Result<Self, OptionsError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads options through `lookup`; unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// [`OptionsError::ParseError`] when a variable has the wrong type.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, OptionsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let path = |name: &str| lookup(name).filter(|v| !v.is_empty()).map(PathBuf::from);

        Ok(Self {
            prometheus_url: lookup("PROMETHEUS_URL").unwrap_or(defaults.prometheus_url),
            prometheus_auth_in_cluster: parse_var(&lookup, "PROMETHEUS_AUTH_INCLUSTER", false)?,
            prometheus_auth_config: path("PROMETHEUS_AUTH_CONFIG"),
            prometheus_ca_file: path("PROMETHEUS_CA_FILE"),
            prometheus_token_file: path("PROMETHEUS_TOKEN_FILE"),
            prometheus_headers: lookup("PROMETHEUS_HEADERS")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
            adapter_config_file: path("ADAPTER_CONFIG_FILE"),
            metrics_relist_interval: parse_var(
                &lookup,
                "METRICS_RELIST_INTERVAL_SECS",
                defaults.metrics_relist_interval.as_secs(),
            )
            .map(Duration::from_secs)?,
            metrics_max_age: parse_var(&lookup, "METRICS_MAX_AGE_SECS", defaults.metrics_max_age.as_secs())
                .map(Duration::from_secs)?,
            metrics_config: defaults.metrics_config,
        })
    }

    /// Client configuration for these options.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            url: self.prometheus_url.clone(),
            ca_file: self.prometheus_ca_file.clone(),
            use_cluster_credentials: self.prometheus_auth_in_cluster,
            external_credentials: self.prometheus_auth_config.clone(),
            token_file: self.prometheus_token_file.clone(),
            headers: self.prometheus_headers.clone(),
        }
    }

    /// Load the metrics discovery configuration into `metrics_config`.
    ///
    /// # Errors
    ///
    /// [`OptionsError::MissingConfigFile`] when no file is named, or
    /// [`OptionsError::ConfigLoad`] when it cannot be loaded.
    pub fn load_config(&mut self) -> Result<(), OptionsError> {
        let path = self
            .adapter_config_file
            .as_deref()
            .ok_or(OptionsError::MissingConfigFile)?;
        self.metrics_config = MetricsDiscoveryConfig::from_file(path)?;
        Ok(())
    }

    /// Build the Prometheus client.
    ///
    /// # Errors
    ///
    /// [`OptionsError::Client`] with the construction failure.
    pub async fn make_prom_client(&self) -> Result<PrometheusClient, OptionsError> {
        Ok(build_client(&self.client_config()).await?)
    }
}

/// Parse a variable with a default value.
fn parse_var<T, F>(lookup: &F, name: &str, default: T) -> Result<T, OptionsError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(val) => val.parse().map_err(|e: T::Err| OptionsError::ParseError {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Parse a comma-separated list, dropping empty entries.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
