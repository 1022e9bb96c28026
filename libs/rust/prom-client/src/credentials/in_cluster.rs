//! In-cluster service account credentials.

use super::{CredentialProvider, CredentialSource, RestCredentials};
use crate::error::CredentialError;
use async_trait::async_trait;
use tracing::debug;

/// Loads the identity injected into the pod.
///
/// The API endpoint comes from `KUBERNETES_SERVICE_HOST` and
/// `KUBERNETES_SERVICE_PORT`. The service account token is attached as a
/// file-backed token that `kube` re-reads so rotations are picked up.
#[derive(Debug, Clone, Copy, Default)]
pub struct InClusterProvider;

impl InClusterProvider {
    /// Provider reading the standard mount and environment.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CredentialProvider for InClusterProvider {
    fn source(&self) -> CredentialSource {
        CredentialSource::InCluster
    }

    async fn load(&self) -> Result<RestCredentials, CredentialError> {
        let config = kube::Config::incluster()?;
        let creds = RestCredentials::from_kube_config(&config)?;
        debug!(host = %creds.host, "loaded in-cluster credentials");
        Ok(creds)
    }
}
