//! Request-duration instrumentation for API clients.

use crate::{
    api::{ApiResponse, GenericApiClient},
    error::QueryError,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use prometheus::{HistogramOpts, HistogramVec, Registry};
use reqwest::Method;
use std::{sync::Arc, time::Instant};

static GLOBAL: Mutex<Option<Arc<ClientMetrics>>> = Mutex::new(None);

/// Metrics recorded for every upstream API call.
#[derive(Debug, Clone)]
pub struct ClientMetrics {
    request_duration: HistogramVec,
}

impl ClientMetrics {
    /// Create the metrics and register them with `registry`.
    ///
    /// # Errors
    ///
    /// When the collector is already registered or the options are invalid.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "prometheus_client_request_duration_seconds",
                "Prometheus client query latencies in seconds, partitioned by server and path.",
            )
            .namespace("metrics_adapter")
            .buckets(prometheus::exponential_buckets(0.0001, 2.0, 15)?),
            &["path", "server"],
        )?;
        registry.register(Box::new(request_duration.clone()))?;

        Ok(Self { request_duration })
    }

    /// Metrics registered once with the process-wide default registry.
    ///
    /// # Errors
    ///
    /// When registration fails on first use.
    pub fn global() -> Result<Arc<Self>, prometheus::Error> {
        let mut slot = GLOBAL.lock();
        if let Some(metrics) = slot.as_ref() {
            return Ok(Arc::clone(metrics));
        }
        let metrics = Arc::new(Self::new(prometheus::default_registry())?);
        *slot = Some(Arc::clone(&metrics));
        Ok(metrics)
    }

    /// Record one call.
    pub fn observe(&self, path: &str, server: &str, seconds: f64) {
        self.request_duration
            .with_label_values(&[path, server])
            .observe(seconds);
    }

    /// Underlying histogram.
    #[must_use]
    pub const fn request_duration(&self) -> &HistogramVec {
        &self.request_duration
    }
}

/// Wraps a [`GenericApiClient`] and times every call.
#[derive(Debug)]
pub struct InstrumentedApiClient<C> {
    inner: C,
    server: String,
    metrics: Arc<ClientMetrics>,
}

/// Wrap `client`, labelling observations with `server`.
pub fn instrument_api_client<C: GenericApiClient>(
    client: C,
    server: impl Into<String>,
    metrics: Arc<ClientMetrics>,
) -> InstrumentedApiClient<C> {
    InstrumentedApiClient {
        inner: client,
        server: server.into(),
        metrics,
    }
}

impl<C> InstrumentedApiClient<C> {
    /// Wrapped client.
    #[must_use]
    pub const fn inner(&self) -> &C {
        &self.inner
    }

    /// Server label.
    #[must_use]
    pub fn server(&self) -> &str {
        &self.server
    }
}

#[async_trait]
impl<C: GenericApiClient> GenericApiClient for InstrumentedApiClient<C> {
    async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(String, String)],
    ) -> Result<ApiResponse, QueryError> {
        let started = Instant::now();
        let result = self.inner.execute(method, endpoint, query).await;
        self.metrics
            .observe(endpoint, &self.server, started.elapsed().as_secs_f64());
        result
    }
}
