//! Request transports.
//!
//! A transport is a chain of [`RoundTripper`]s ending in a reqwest client.
//! Authentication layers wrap the chain from the outside and delegate to
//! whatever they wrap, so TLS identity, credential headers and the bearer
//! token overlay compose independently.

mod auth;

pub use auth::{BearerAuthRoundTripper, ClusterAuth, ClusterAuthRoundTripper, bearer_header};

use crate::{
    ca::CertPool,
    credentials::RestCredentials,
    error::{QueryError, TransportError},
};
use adapter_common::{HttpConfig, base_client_builder};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Identity, Request, Response, header::InvalidHeaderValue};
use secrecy::ExposeSecret;
use std::fmt;

/// Sends a request and returns its response.
#[async_trait]
pub trait RoundTripper: Send + Sync + fmt::Debug {
    /// Execute `request`.
    async fn round_trip(&self, request: Request) -> Result<Response, QueryError>;
}

/// Innermost round tripper backed by a reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Wrap a configured client.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RoundTripper for HttpTransport {
    async fn round_trip(&self, request: Request) -> Result<Response, QueryError> {
        Ok(self.client.execute(request).await?)
    }
}

/// Trust roots used to verify the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustRoots {
    /// Bundled web PKI roots
    System,
    /// Exactly the certificates in the pool
    Pinned(CertPool),
    /// No verification
    InsecureSkipVerify,
}

/// One layer of a transport chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// reqwest client
    Http,
    /// Fixed `Authorization: Bearer`
    BearerAuth,
    /// `Authorization` from Kubernetes credentials
    ClusterAuth,
}

/// Owned transport chain with a description of how it was assembled.
pub struct TransportHandle {
    round_tripper: Box<dyn RoundTripper>,
    trust: TrustRoots,
    layers: Vec<Layer>,
}

impl TransportHandle {
    /// Transport sending straight through `client`.
    #[must_use]
    pub fn new(client: Client, trust: TrustRoots) -> Self {
        Self {
            round_tripper: Box::new(HttpTransport::new(client)),
            trust,
            layers: vec![Layer::Http],
        }
    }

    /// Trust roots of the underlying client.
    #[must_use]
    pub const fn trust_roots(&self) -> &TrustRoots {
        &self.trust
    }

    /// Layers from outermost to innermost.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Wrap the chain with a fixed bearer token layer.
    ///
    /// # Errors
    ///
    /// When `token` cannot be carried in a header.
    pub fn with_bearer_token(self, token: &str) -> Result<Self, InvalidHeaderValue> {
        let Self {
            round_tripper,
            trust,
            mut layers,
        } = self;
        let round_tripper = BearerAuthRoundTripper::new(token, round_tripper)?;
        layers.insert(0, Layer::BearerAuth);
        Ok(Self {
            round_tripper: Box::new(round_tripper),
            trust,
            layers,
        })
    }

    /// Wrap the chain with Kubernetes credential authorization.
    #[must_use]
    pub fn with_cluster_auth(self, auth: ClusterAuth) -> Self {
        let Self {
            round_tripper,
            trust,
            mut layers,
        } = self;
        layers.insert(0, Layer::ClusterAuth);
        Self {
            round_tripper: Box::new(ClusterAuthRoundTripper::new(auth, round_tripper)),
            trust,
            layers,
        }
    }

    /// Send `request` through the chain.
    ///
    /// # Errors
    ///
    /// Whatever the outermost layer reports.
    pub async fn round_trip(&self, request: Request) -> Result<Response, QueryError> {
        self.round_tripper.round_trip(request).await
    }
}

impl fmt::Debug for TransportHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportHandle")
            .field("trust", &self.trust)
            .field("layers", &self.layers)
            .finish_non_exhaustive()
    }
}

fn pin_roots(builder: ClientBuilder, pool: &CertPool) -> Result<ClientBuilder, reqwest::Error> {
    pool.to_reqwest()?
        .into_iter()
        .try_fold(builder.tls_built_in_root_certs(false), |b, cert| {
            Ok(b.add_root_certificate(cert))
        })
}

/// Unauthenticated transport using the system roots.
///
/// # Errors
///
/// [`TransportError::Tls`] if the client cannot be initialised.
pub fn default_transport(http: &HttpConfig) -> Result<TransportHandle, TransportError> {
    let client = base_client_builder(http).build()?;
    Ok(TransportHandle::new(client, TrustRoots::System))
}

/// Transport trusting exactly the certificates in `pool`.
///
/// # Errors
///
/// [`TransportError::Tls`] if a certificate or the client is rejected.
pub fn ca_transport(pool: &CertPool, http: &HttpConfig) -> Result<TransportHandle, TransportError> {
    let client = pin_roots(base_client_builder(http), pool)?.build()?;
    Ok(TransportHandle::new(client, TrustRoots::Pinned(pool.clone())))
}

/// Transport carrying `creds`.
///
/// TLS settings go into the reqwest client; header-based credentials become
/// an outer layer.
///
/// # Errors
///
/// [`TransportError::Tls`] when TLS material is rejected.
pub fn transport_for(
    creds: &RestCredentials,
    http: &HttpConfig,
) -> Result<TransportHandle, TransportError> {
    let mut builder = base_client_builder(http);

    let trust = if creds.insecure_skip_tls_verify {
        builder = builder.danger_accept_invalid_certs(true);
        TrustRoots::InsecureSkipVerify
    } else if let Some(pool) = &creds.root_certs {
        builder = pin_roots(builder, pool)?;
        TrustRoots::Pinned(pool.clone())
    } else {
        TrustRoots::System
    };

    if let Some(identity) = &creds.client_identity {
        let mut pem = identity.cert_pem.clone();
        if !pem.ends_with('\n') {
            pem.push('\n');
        }
        pem.push_str(identity.key_pem.expose_secret());
        builder = builder.identity(Identity::from_pem(pem.as_bytes())?);
    }

    let handle = TransportHandle::new(builder.build()?, trust);
    Ok(match &creds.authorization {
        Some(auth) => handle.with_cluster_auth(auth.clone()),
        None => handle,
    })
}
