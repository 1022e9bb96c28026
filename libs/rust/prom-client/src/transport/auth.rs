//! Authorization header layers.

use super::RoundTripper;
use crate::error::QueryError;
use async_trait::async_trait;
use kube::client::{Body, ConfigExt, middleware::AuthLayer};
use reqwest::{
    Request, Response,
    header::{AUTHORIZATION, HeaderValue, InvalidHeaderValue},
};
use std::fmt;
use tower::{BoxError, Layer as _, ServiceExt, service_fn, util::BoxCloneSyncService};

/// `Authorization: Bearer <token>` marked sensitive.
///
/// # Errors
///
/// When `token` contains bytes an HTTP header cannot carry.
pub fn bearer_header(token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut header = HeaderValue::from_str(&format!("Bearer {token}"))?;
    header.set_sensitive(true);
    Ok(header)
}

type AuthService = BoxCloneSyncService<http::Request<Body>, http::Response<()>, BoxError>;

/// Authorization derived from a Kubernetes client configuration.
///
/// The configuration's auth layer is stacked on a service that only reads
/// back the header it was given. Static tokens, basic auth, token files,
/// exec plugins and auth providers all go through the same layer, which
/// refreshes expiring credentials on its own.
#[derive(Clone)]
pub struct ClusterAuth {
    service: AuthService,
}

impl ClusterAuth {
    /// Authorization for `config`, or `None` when it carries no
    /// header-based credentials.
    ///
    /// # Errors
    ///
    /// When the auth section is unusable, for example an unreadable token
    /// file or a failing exec plugin.
    pub fn from_config(config: &kube::Config) -> Result<Option<Self>, kube::Error> {
        Ok(config.auth_layer()?.map(Self::new))
    }

    /// Wrap an auth layer.
    #[must_use]
    pub fn new(layer: AuthLayer) -> Self {
        let echo = service_fn(|request: http::Request<Body>| async move {
            let mut response = http::Response::new(());
            if let Some(value) = request.headers().get(AUTHORIZATION) {
                response.headers_mut().insert(AUTHORIZATION, value.clone());
            }
            Ok::<_, BoxError>(response)
        });
        Self {
            service: BoxCloneSyncService::new(layer.layer(echo)),
        }
    }

    /// Current `Authorization` header value.
    ///
    /// # Errors
    ///
    /// [`QueryError::Authorization`] when a refresh fails.
    pub async fn header(&self) -> Result<Option<HeaderValue>, QueryError> {
        let response = self
            .service
            .clone()
            .oneshot(http::Request::new(Body::empty()))
            .await
            .map_err(QueryError::Authorization)?;
        Ok(response.headers().get(AUTHORIZATION).cloned())
    }
}

impl fmt::Debug for ClusterAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterAuth").finish_non_exhaustive()
    }
}

/// Sets a fixed `Authorization: Bearer` header unless the request already
/// carries an `Authorization` header, then delegates.
#[derive(Debug)]
pub struct BearerAuthRoundTripper {
    header: HeaderValue,
    inner: Box<dyn RoundTripper>,
}

impl BearerAuthRoundTripper {
    /// Wrap `inner`.
    ///
    /// # Errors
    ///
    /// When `token` contains bytes an HTTP header cannot carry.
    pub fn new(token: &str, inner: Box<dyn RoundTripper>) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            header: bearer_header(token)?,
            inner,
        })
    }
}

#[async_trait]
impl RoundTripper for BearerAuthRoundTripper {
    async fn round_trip(&self, mut request: Request) -> Result<Response, QueryError> {
        if !request.headers().contains_key(AUTHORIZATION) {
            request.headers_mut().insert(AUTHORIZATION, self.header.clone());
        }
        self.inner.round_trip(request).await
    }
}

/// Sets the header produced by [`ClusterAuth`] unless the request already
/// carries an `Authorization` header, then delegates.
#[derive(Debug)]
pub struct ClusterAuthRoundTripper {
    auth: ClusterAuth,
    inner: Box<dyn RoundTripper>,
}

impl ClusterAuthRoundTripper {
    /// Wrap `inner`.
    #[must_use]
    pub fn new(auth: ClusterAuth, inner: Box<dyn RoundTripper>) -> Self {
        Self { auth, inner }
    }
}

#[async_trait]
impl RoundTripper for ClusterAuthRoundTripper {
    async fn round_trip(&self, mut request: Request) -> Result<Response, QueryError> {
        if !request.headers().contains_key(AUTHORIZATION) {
            if let Some(header) = self.auth.header().await? {
                request.headers_mut().insert(AUTHORIZATION, header);
            }
        }
        self.inner.round_trip(request).await
    }
}
