//! Metrics Adapter - startup check.
//!
//! Builds the Prometheus client from the environment and issues a single
//! instant query to prove the connection and credentials work.

use adapter_common::{TracingConfig, init_tracing};
use anyhow::Context;
use metrics_adapter::AdapterOptions;
use std::env;
use tracing::{Instrument, info};

const DEFAULT_STARTUP_QUERY: &str = "up";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let options = AdapterOptions::from_env()?;

    let json_output = env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let tracing_config = TracingConfig {
        json_output,
        ..TracingConfig::default()
    };
    init_tracing(&tracing_config);

    run(options).instrument(tracing_config.root_span()).await
}

async fn run(mut options: AdapterOptions) -> anyhow::Result<()> {
    if options.adapter_config_file.is_some() {
        options.load_config()?;
        info!(
            rules = options.metrics_config.rules.len(),
            external_rules = options.metrics_config.external_rules.len(),
            "loaded metrics discovery configuration"
        );
    }

    let client = options.make_prom_client().await?;
    info!(url = %options.prometheus_url, "Prometheus client ready");

    let query = env::var("STARTUP_QUERY").unwrap_or_else(|_| DEFAULT_STARTUP_QUERY.to_string());
    let result = client
        .query(&query, None)
        .await
        .with_context(|| format!("startup query {query:?} failed"))?;

    info!(query = %query, series = result.len(), "startup query succeeded");
    Ok(())
}
