//! Authentication strategy resolution.

use crate::{
    config::ClientConfig,
    error::{ClientError, ClientResult},
};
use std::path::PathBuf;

/// The single authentication strategy a client is built with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStrategy {
    /// Unauthenticated default transport
    NoAuth,
    /// Credentials from the in-cluster service account
    ClusterCredentials,
    /// Credentials from an explicit kubeconfig
    ExternalCredentials {
        /// Kubeconfig path
        kubeconfig: PathBuf,
    },
    /// Trust pinned to a CA bundle, no credentials
    CaPinned {
        /// CA bundle path
        ca_file: PathBuf,
    },
}

impl AuthStrategy {
    /// Resolve the strategy for `config`.
    ///
    /// A CA file wins unconditionally and the credential flags are then
    /// ignored, conflicting or not. Otherwise in-cluster credentials and a
    /// kubeconfig are mutually exclusive, and neither means [`Self::NoAuth`].
    /// Touches neither the filesystem nor the network.
    ///
    /// # Errors
    ///
    /// [`ClientError::ConflictingAuthSources`] when both credential sources
    /// are requested without a CA file.
    pub fn resolve(config: &ClientConfig) -> ClientResult<Self> {
        if let Some(ca_file) = config.ca_file() {
            return Ok(Self::CaPinned {
                ca_file: ca_file.to_path_buf(),
            });
        }

        match (config.use_cluster_credentials, config.external_credentials()) {
            (true, Some(kubeconfig)) => Err(ClientError::ConflictingAuthSources {
                kubeconfig: kubeconfig.to_path_buf(),
            }),
            (false, Some(kubeconfig)) => Ok(Self::ExternalCredentials {
                kubeconfig: kubeconfig.to_path_buf(),
            }),
            (true, None) => Ok(Self::ClusterCredentials),
            (false, None) => Ok(Self::NoAuth),
        }
    }

    /// Short name used in logs and errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::NoAuth => "default",
            Self::ClusterCredentials => "in-cluster",
            Self::ExternalCredentials { .. } => "kubeconfig",
            Self::CaPinned { .. } => "ca-pinned",
        }
    }
}
