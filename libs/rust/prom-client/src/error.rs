//! Error types for client construction and queries.
//!
//! [`ClientError`] covers everything that can go wrong while building the
//! client. Every variant is fatal to construction and names the file or
//! strategy involved so an operator can correct the configuration.
//! [`QueryError`] covers failures of individual requests afterwards.

use crate::credentials::CredentialSource;
use std::{io, path::PathBuf};
use thiserror::Error;

/// Client construction errors.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ClientError {
    /// Base URL could not be parsed
    #[error("invalid Prometheus URL {url:?}: {source}")]
    InvalidUrl {
        /// The rejected URL
        url: String,
        /// Parser failure
        source: url::ParseError,
    },

    /// CA bundle could not be read
    #[error("failed to read prometheus-ca-file {}: {source}", path.display())]
    CaFileUnreadable {
        /// CA bundle path
        path: PathBuf,
        /// Read failure
        source: io::Error,
    },

    /// CA bundle holds no parseable certificate
    #[error("no certs found in prometheus-ca-file {}", path.display())]
    CaNoCertsFound {
        /// CA bundle path
        path: PathBuf,
    },

    /// In-cluster credentials and a kubeconfig were both requested
    #[error(
        "may not use both in-cluster auth and an explicit kubeconfig ({}) at the same time",
        kubeconfig.display()
    )]
    ConflictingAuthSources {
        /// The explicit kubeconfig path
        kubeconfig: PathBuf,
    },

    /// Credential provider failed
    #[error("unable to construct {origin} auth configuration for connecting to Prometheus: {cause}")]
    CredentialLoadFailed {
        /// Which provider failed
        origin: CredentialSource,
        /// Underlying failure
        #[source]
        cause: CredentialError,
    },

    /// Transport could not be derived for the selected strategy
    #[error("unable to construct {strategy} transport for connecting to Prometheus: {source}")]
    TransportConstructionFailed {
        /// Strategy name
        strategy: &'static str,
        /// Underlying failure
        source: TransportError,
    },

    /// Bearer token file could not be read
    #[error("failed to read prometheus-token-file {}: {source}", path.display())]
    TokenFileUnreadable {
        /// Token file path
        path: PathBuf,
        /// Read failure
        source: io::Error,
    },

    /// Bearer token file contents cannot be sent in a header
    #[error("prometheus-token-file {} cannot be used as a bearer token: {reason}", path.display())]
    TokenFileInvalid {
        /// Token file path
        path: PathBuf,
        /// What is wrong with the contents
        reason: &'static str,
    },

    /// Instrumentation could not be registered
    #[error("unable to register client metrics: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Result type for client construction.
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Wrap a transport failure for the named strategy.
    #[must_use]
    pub fn transport(strategy: &'static str, source: impl Into<TransportError>) -> Self {
        Self::TransportConstructionFailed {
            strategy,
            source: source.into(),
        }
    }

    /// Whether the error stems from the CA pinning input.
    #[must_use]
    pub const fn is_ca_error(&self) -> bool {
        matches!(
            self,
            Self::CaFileUnreadable { .. } | Self::CaNoCertsFound { .. }
        )
    }
}

/// Failures inside a credential provider.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CredentialError {
    /// Service account environment or mount is unavailable
    #[error("unable to load in-cluster configuration: {0}")]
    InCluster(#[from] kube::config::InClusterError),

    /// Kubeconfig could not be read or resolved
    #[error("unable to load kubeconfig: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    /// A referenced file could not be read
    #[error("unable to read {}: {source}", path.display())]
    Read {
        /// File path
        path: PathBuf,
        /// Read failure
        source: io::Error,
    },

    /// Inline base64 data could not be decoded
    #[error("unable to decode {field}: {source}")]
    Decode {
        /// Kubeconfig field
        field: &'static str,
        /// Decoder failure
        source: base64::DecodeError,
    },

    /// CA data held no parseable certificate
    #[error("no certificates found in {0}")]
    NoCertificates(String),

    /// Configuration is structurally invalid
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// Auth section could not be turned into an authorization source
    #[error("unable to set up authorization: {0}")]
    Authorization(#[source] kube::Error),
}

impl CredentialError {
    /// Create a read error for `path`.
    #[must_use]
    pub fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Failures while deriving a transport from resolved credentials.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TransportError {
    /// TLS roots or client identity were rejected
    #[error("TLS setup failed: {0}")]
    Tls(#[from] reqwest::Error),
}

/// Request-time errors.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum QueryError {
    /// Configured header cannot be sent
    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader {
        /// Header name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// Cluster credentials could not produce an `Authorization` header
    #[error("unable to authorize request: {0}")]
    Authorization(#[source] tower::BoxError),

    /// Request could not be sent or its body read
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a status that carries no API envelope
    #[error("bad response: {0}")]
    BadResponse(String),

    /// Server returned an error envelope
    #[error("{error_type}: {message}")]
    Api {
        /// Prometheus error type
        error_type: String,
        /// Error message
        message: String,
    },

    /// Response body did not match the expected shape
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl QueryError {
    /// Create an invalid header error.
    #[must_use]
    pub fn invalid_header(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidHeader {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a bad response error.
    #[must_use]
    pub fn bad_response(msg: impl Into<String>) -> Self {
        Self::BadResponse(msg.into())
    }
}
