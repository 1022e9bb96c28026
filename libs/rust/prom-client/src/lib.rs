//! Authenticated Prometheus client construction.
//!
//! Turns a [`ClientConfig`] into a ready-to-use [`PrometheusClient`]:
//! - exactly one authentication strategy is resolved ([`AuthStrategy`])
//! - the matching base transport is built (CA pinning, cluster or
//!   kubeconfig credentials, or the unauthenticated default)
//! - an optional bearer token overlay is composed on top
//! - the configured header set is attached to every request
//! - the result is wrapped for request-duration instrumentation

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod builder;
pub mod ca;
pub mod config;
pub mod credentials;
pub mod error;
pub mod headers;
pub mod instrument;
pub mod query;
pub mod strategy;
pub mod transport;

pub use api::{ApiResponse, GenericApiClient, PrometheusApiClient, ResponseStatus};
pub use builder::{ClientBuilder, build_client};
pub use ca::CertPool;
pub use config::ClientConfig;
pub use credentials::{
    ClientIdentity, CredentialProvider, CredentialSource, InClusterProvider, KubeconfigProvider,
    RestCredentials,
};
pub use error::{ClientError, ClientResult, CredentialError, QueryError, TransportError};
pub use headers::{HeaderSet, parse_header_args};
pub use instrument::{ClientMetrics, InstrumentedApiClient, instrument_api_client};
pub use query::{
    Interval, Metric, PrometheusClient, QueryResult, Range, Sample, SamplePair, SampleStream,
    StringPair,
};
pub use strategy::AuthStrategy;
pub use transport::{ClusterAuth, Layer, RoundTripper, TransportHandle, TrustRoots};
