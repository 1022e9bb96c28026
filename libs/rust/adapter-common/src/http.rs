//! Base HTTP client settings.
//!
//! Every transport the adapter builds starts from the same reqwest builder so
//! that timeouts and the user agent stay consistent no matter which
//! authentication path produced the client.

use reqwest::ClientBuilder;
use std::time::Duration;

/// HTTP client configuration shared by all upstream transports.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Total request timeout; `None` leaves requests unbounded (default: none)
    pub timeout: Option<Duration>,
    /// Connection timeout (default: 10s)
    pub connect_timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("metrics-adapter/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    /// Bound every request by `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Start a reqwest builder carrying the shared settings.
///
/// Callers layer trust roots and client identities on top before calling
/// `build()`. The builder uses rustls with the bundled web PKI roots unless
/// the caller disables them.
///
/// # Examples
///
/// ```
/// use adapter_common::{HttpConfig, base_client_builder};
/// use std::time::Duration;
///
/// let config = HttpConfig::default().with_timeout(Duration::from_secs(60));
/// let client = base_client_builder(&config).build();
/// assert!(client.is_ok());
/// ```
#[must_use]
pub fn base_client_builder(config: &HttpConfig) -> ClientBuilder {
    let mut builder = ClientBuilder::new()
        .use_rustls_tls()
        .connect_timeout(config.connect_timeout)
        .user_agent(&config.user_agent);

    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }

    builder
}
