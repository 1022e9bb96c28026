//! Shared setup for the metrics adapter crates.
//!
//! This crate provides:
//! - Base HTTP client settings applied to every upstream transport
//! - Tracing subscriber initialisation for binaries

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod http;
pub mod tracing_config;

pub use http::{HttpConfig, base_client_builder};
pub use tracing_config::{TracingConfig, init_tracing};
