//! Shared test utilities for metrics-adapter crates.
//!
//! This crate provides:
//! - Certificate fixtures and scratch directories
//! - A kubeconfig builder
//! - Proptest generators for client configuration inputs
//! - Canned Prometheus API responses for wiremock
//! - An HTTPS server for TLS trust tests

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod mocks;
pub mod tls;

pub use generators::*;
