//! Kubeconfig credentials.

use super::{CredentialProvider, CredentialSource, RestCredentials};
use crate::error::CredentialError;
use async_trait::async_trait;
use kube::config::{KubeConfigOptions, Kubeconfig};
use std::path::PathBuf;
use tracing::debug;

/// Loads credentials for the current context of an explicit kubeconfig.
///
/// Parsing, context selection and relative path resolution are done by
/// `kube`, so every user type it understands works here: client
/// certificates, static and file-backed tokens, basic auth, `exec` plugins
/// and `auth-provider` entries.
#[derive(Debug, Clone)]
pub struct KubeconfigProvider {
    path: PathBuf,
}

impl KubeconfigProvider {
    /// Provider for the kubeconfig at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CredentialProvider for KubeconfigProvider {
    fn source(&self) -> CredentialSource {
        CredentialSource::Kubeconfig(self.path.clone())
    }

    async fn load(&self) -> Result<RestCredentials, CredentialError> {
        let kubeconfig = Kubeconfig::read_from(&self.path)?;
        let context = kubeconfig.current_context.clone().unwrap_or_default();
        let config =
            kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?;

        let creds = RestCredentials::from_kube_config(&config)?;
        debug!(
            path = %self.path.display(),
            %context,
            host = %creds.host,
            "loaded kubeconfig credentials"
        );
        Ok(creds)
    }
}
