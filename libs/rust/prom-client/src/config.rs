//! Client configuration.

use std::path::{Path, PathBuf};

/// Everything needed to build a Prometheus client.
///
/// Empty paths are treated the same as unset ones, so values copied straight
/// from flags or environment variables behave as expected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the Prometheus-compatible endpoint
    pub url: String,
    /// PEM bundle that becomes the only trust root
    pub ca_file: Option<PathBuf>,
    /// Load credentials from the in-cluster service account
    pub use_cluster_credentials: bool,
    /// Kubeconfig file holding credentials
    pub external_credentials: Option<PathBuf>,
    /// File whose full contents are sent as a bearer token
    pub token_file: Option<PathBuf>,
    /// Raw `key=value` header arguments
    pub headers: Vec<String>,
}

impl ClientConfig {
    /// Create a configuration for `url` with no authentication.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Pin trust to the certificates in `path`.
    #[must_use]
    pub fn with_ca_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_file = Some(path.into());
        self
    }

    /// Request in-cluster credentials.
    #[must_use]
    pub const fn with_cluster_credentials(mut self, enabled: bool) -> Self {
        self.use_cluster_credentials = enabled;
        self
    }

    /// Load credentials from a kubeconfig at `path`.
    #[must_use]
    pub fn with_external_credentials(mut self, path: impl Into<PathBuf>) -> Self {
        self.external_credentials = Some(path.into());
        self
    }

    /// Overlay a bearer token read from `path`.
    #[must_use]
    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = Some(path.into());
        self
    }

    /// Append a raw `key=value` header argument.
    #[must_use]
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.headers.push(header.into());
        self
    }

    /// CA bundle path, if set and non-empty.
    #[must_use]
    pub fn ca_file(&self) -> Option<&Path> {
        non_empty(self.ca_file.as_deref())
    }

    /// Kubeconfig path, if set and non-empty.
    #[must_use]
    pub fn external_credentials(&self) -> Option<&Path> {
        non_empty(self.external_credentials.as_deref())
    }

    /// Token file path, if set and non-empty.
    #[must_use]
    pub fn token_file(&self) -> Option<&Path> {
        non_empty(self.token_file.as_deref())
    }
}

fn non_empty(path: Option<&Path>) -> Option<&Path> {
    path.filter(|p| !p.as_os_str().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_unauthenticated() {
        let config = ClientConfig::new("http://metrics.local:9090");
        assert_eq!(config.url, "http://metrics.local:9090");
        assert!(config.ca_file().is_none());
        assert!(!config.use_cluster_credentials);
        assert!(config.external_credentials().is_none());
        assert!(config.token_file().is_none());
        assert!(config.headers.is_empty());
    }

    #[test]
    fn test_empty_paths_are_unset() {
        let config = ClientConfig::new("http://metrics.local:9090")
            .with_ca_file("")
            .with_external_credentials("")
            .with_token_file("");

        assert!(config.ca_file().is_none());
        assert!(config.external_credentials().is_none());
        assert!(config.token_file().is_none());
    }

    #[test]
    fn test_builder_keeps_header_order() {
        let config = ClientConfig::new("http://metrics.local:9090")
            .with_header("a=1")
            .with_header("b");
        assert_eq!(config.headers, vec!["a=1".to_string(), "b".to_string()]);
    }
}
