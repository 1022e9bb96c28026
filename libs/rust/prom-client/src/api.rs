//! Low-level Prometheus HTTP API access.

use crate::{error::QueryError, headers::HeaderSet, transport::TransportHandle};
use async_trait::async_trait;
use reqwest::{Method, Request, StatusCode};
use serde::Deserialize;
use tracing::debug;
use url::Url;

/// `status` field of the API envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    /// Request succeeded
    Success,
    /// Request failed, see `errorType` and `error`
    Error,
}

/// The JSON envelope every Prometheus API endpoint returns.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    /// Outcome
    pub status: ResponseStatus,
    /// Endpoint-specific payload
    #[serde(default)]
    pub data: serde_json::Value,
    /// Error category when `status` is `error`
    #[serde(default)]
    pub error_type: String,
    /// Error message when `status` is `error`
    #[serde(default)]
    pub error: String,
    /// Non-fatal warnings
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Executes raw API calls.
#[async_trait]
pub trait GenericApiClient: Send + Sync {
    /// Call `endpoint` (relative to the base URL) with `query` parameters.
    ///
    /// # Errors
    ///
    /// Any [`QueryError`]; an error envelope becomes [`QueryError::Api`].
    async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(String, String)],
    ) -> Result<ApiResponse, QueryError>;
}

/// [`GenericApiClient`] bound to a base URL, transport and header set.
#[derive(Debug)]
pub struct PrometheusApiClient {
    base_url: Url,
    transport: TransportHandle,
    headers: HeaderSet,
}

impl PrometheusApiClient {
    /// Bind the client parts together.
    #[must_use]
    pub const fn new(base_url: Url, transport: TransportHandle, headers: HeaderSet) -> Self {
        Self {
            base_url,
            transport,
            headers,
        }
    }

    /// Base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Transport chain.
    #[must_use]
    pub const fn transport(&self) -> &TransportHandle {
        &self.transport
    }

    /// Headers sent with every request.
    #[must_use]
    pub const fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    /// Absolute URL for `endpoint`.
    ///
    /// The endpoint path is appended to the base path; `query` replaces any
    /// query string on the base URL.
    #[must_use]
    pub fn endpoint_url(&self, endpoint: &str, query: &[(String, String)]) -> Url {
        let mut url = self.base_url.clone();
        let path = format!(
            "{}/{}",
            self.base_url.path().trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );
        url.set_path(&path);
        url.set_query(None);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        url
    }
}

#[async_trait]
impl GenericApiClient for PrometheusApiClient {
    async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(String, String)],
    ) -> Result<ApiResponse, QueryError> {
        let url = self.endpoint_url(endpoint, query);
        let mut request = Request::new(method, url);
        self.headers.apply(request.headers_mut())?;

        debug!(endpoint, "sending Prometheus request");
        let response = self.transport.round_trip(request).await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !carries_envelope(status) {
            return Err(QueryError::bad_response(format!(
                "unknown response code {}",
                status.as_u16()
            )));
        }

        let envelope: ApiResponse = serde_json::from_slice(&body)
            .map_err(|e| QueryError::bad_response(e.to_string()))?;

        if envelope.status == ResponseStatus::Error {
            return Err(QueryError::Api {
                error_type: envelope.error_type,
                message: envelope.error,
            });
        }
        Ok(envelope)
    }
}

fn carries_envelope(status: StatusCode) -> bool {
    status.is_success()
        || matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY | StatusCode::SERVICE_UNAVAILABLE
        )
}
