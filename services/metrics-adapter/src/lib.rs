//! Metrics adapter process.
//!
//! Loads the adapter options and the metrics discovery configuration, and
//! builds the authenticated Prometheus client the serving layer queries.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod discovery;
pub mod error;
pub mod options;

pub use discovery::MetricsDiscoveryConfig;
pub use error::{DiscoveryError, OptionsError};
pub use options::AdapterOptions;
