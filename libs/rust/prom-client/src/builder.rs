//! Client construction.

use crate::{
    api::PrometheusApiClient,
    ca::CertPool,
    config::ClientConfig,
    credentials::{CredentialProvider, InClusterProvider, KubeconfigProvider},
    error::{ClientError, ClientResult},
    headers::parse_header_args,
    instrument::{ClientMetrics, instrument_api_client},
    query::PrometheusClient,
    strategy::AuthStrategy,
    transport::{TransportHandle, ca_transport, default_transport},
};
use adapter_common::HttpConfig;
use std::{fs, path::Path, sync::Arc};
use tracing::{debug, info, instrument};
use url::Url;

/// Builds [`PrometheusClient`]s from [`ClientConfig`]s.
///
/// The builder carries the collaborators that are not part of the
/// configuration itself: HTTP tuning, the in-cluster provider and the
/// metrics the finished client reports to.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    http: HttpConfig,
    in_cluster: Arc<dyn CredentialProvider>,
    metrics: Option<Arc<ClientMetrics>>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            in_cluster: Arc::new(InClusterProvider::new()),
            metrics: None,
        }
    }
}

impl ClientBuilder {
    /// Builder with default collaborators.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `http` for every reqwest client built.
    #[must_use]
    pub fn with_http_config(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    /// Use `provider` for in-cluster credentials.
    #[must_use]
    pub fn with_in_cluster_provider(mut self, provider: impl CredentialProvider + 'static) -> Self {
        self.in_cluster = Arc::new(provider);
        self
    }

    /// Report request durations to `metrics` instead of the global set.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<ClientMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build a client for `config`.
    ///
    /// Nothing is sent to Prometheus. Credential plugins named by a
    /// kubeconfig may run. Every failure is returned before a client exists.
    ///
    /// # Errors
    ///
    /// Any [`ClientError`]; see the variant docs.
    #[instrument(skip_all, fields(url = %config.url))]
    pub async fn build(&self, config: &ClientConfig) -> ClientResult<PrometheusClient> {
        let base_url = Url::parse(&config.url).map_err(|source| ClientError::InvalidUrl {
            url: config.url.clone(),
            source,
        })?;

        let strategy = AuthStrategy::resolve(config)?;
        debug!(strategy = strategy.name(), "resolved auth strategy");

        let mut transport = self.base_transport(&strategy).await?;

        if let Some(path) = config.token_file() {
            let token = read_token_overlay(path)?;
            transport = transport
                .with_bearer_token(&token)
                .map_err(|_| ClientError::TokenFileInvalid {
                    path: path.to_path_buf(),
                    reason: INVALID_TOKEN_BYTES,
                })?;
            debug!(path = %path.display(), "bearer token overlay enabled");
        }

        let headers = parse_header_args(&config.headers);
        let metrics = match &self.metrics {
            Some(metrics) => Arc::clone(metrics),
            None => ClientMetrics::global()?,
        };

        let server = config.url.clone();
        let api = PrometheusApiClient::new(base_url, transport, headers);
        Ok(PrometheusClient::new(instrument_api_client(api, server, metrics)))
    }

    async fn base_transport(&self, strategy: &AuthStrategy) -> ClientResult<TransportHandle> {
        match strategy {
            AuthStrategy::NoAuth => default_transport(&self.http)
                .map_err(|e| ClientError::transport(strategy.name(), e)),
            AuthStrategy::CaPinned { ca_file } => {
                let pool = CertPool::from_file(ca_file)?;
                let transport = ca_transport(&pool, &self.http)
                    .map_err(|e| ClientError::transport(strategy.name(), e))?;
                info!(path = %ca_file.display(), certs = pool.len(), "successfully loaded ca from file");
                Ok(transport)
            }
            AuthStrategy::ClusterCredentials => {
                self.credential_transport(strategy, self.in_cluster.as_ref())
                    .await
            }
            AuthStrategy::ExternalCredentials { kubeconfig } => {
                self.credential_transport(strategy, &KubeconfigProvider::new(kubeconfig))
                    .await
            }
        }
    }

    async fn credential_transport(
        &self,
        strategy: &AuthStrategy,
        provider: &dyn CredentialProvider,
    ) -> ClientResult<TransportHandle> {
        let creds = provider
            .load()
            .await
            .map_err(|cause| ClientError::CredentialLoadFailed {
                origin: provider.source(),
                cause,
            })?;
        debug!(
            origin = %provider.source(),
            host = %creds.host,
            trust = ?creds.root_certs,
            "loaded credentials"
        );
        creds
            .transport(&self.http)
            .map_err(|e| ClientError::transport(strategy.name(), e))
    }
}

const TRAILING_NEWLINE: &str = "contents end with a newline";
const INVALID_TOKEN_BYTES: &str = "contents contain bytes not allowed in an HTTP header";

/// Read the overlay token. The file contents are used exactly as stored.
fn read_token_overlay(path: &Path) -> ClientResult<String> {
    let token = fs::read_to_string(path).map_err(|source| ClientError::TokenFileUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    if token.ends_with(['\n', '\r']) {
        return Err(ClientError::TokenFileInvalid {
            path: path.to_path_buf(),
            reason: TRAILING_NEWLINE,
        });
    }
    Ok(token)
}

/// Build a client for `config` with default collaborators.
///
/// # Errors
///
/// See [`ClientBuilder::build`].
pub async fn build_client(config: &ClientConfig) -> ClientResult<PrometheusClient> {
    ClientBuilder::new().build(config).await
}
