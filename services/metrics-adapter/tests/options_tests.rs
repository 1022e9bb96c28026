//! Options to client integration tests.

use metrics_adapter::{AdapterOptions, OptionsError};
use prom_client::{ClientBuilder, ClientError, ClientMetrics};
use prometheus::Registry;
use std::{collections::HashMap, sync::Arc};
use test_utils::{
    fixtures::{CA_ALPHA_PEM, FixtureDir},
    mocks::{QUERY_PATH, prometheus_ok, vector_data},
};
use wiremock::{
    Mock, MockServer,
    matchers::{header, method, path},
};

fn options(vars: &[(&str, String)]) -> AdapterOptions {
    let vars: HashMap<&str, String> = vars.iter().cloned().collect();
    AdapterOptions::from_lookup(|name| vars.get(name).cloned()).unwrap()
}

#[tokio::test]
async fn options_drive_authenticated_queries() {
    let server = MockServer::start().await;
    let labels: &[(&str, &str)] = &[("job", "node")];
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(header("authorization", "Bearer tenant-token"))
        .and(header("x-scope-orgid", "tenant-a"))
        .respond_with(prometheus_ok(vector_data(&[(labels, "1")], 1.0)))
        .expect(1)
        .mount(&server)
        .await;

    let dir = FixtureDir::new();
    let token = dir.write("token", "tenant-token");
    let options = options(&[
        ("PROMETHEUS_URL", server.uri()),
        ("PROMETHEUS_TOKEN_FILE", token.display().to_string()),
        ("PROMETHEUS_HEADERS", "X-Scope-OrgID=tenant-a".to_string()),
    ]);

    let client = ClientBuilder::new()
        .with_metrics(Arc::new(ClientMetrics::new(&Registry::new()).unwrap()))
        .build(&options.client_config())
        .await
        .unwrap();
    let result = client.query("up", None).await.unwrap();
    assert_eq!(result.len(), 1);
}

#[test]
fn discovery_config_is_loaded() {
    let dir = FixtureDir::new();
    let config = dir.write(
        "config.yaml",
        "rules:\n- seriesQuery: 'up'\n  metricsQuery: 'sum(<<.Series>>)'\n",
    );
    let mut options = options(&[("ADAPTER_CONFIG_FILE", config.display().to_string())]);

    options.load_config().unwrap();
    assert_eq!(options.metrics_config.rules.len(), 1);
}

#[test]
fn unreadable_discovery_config() {
    let dir = FixtureDir::new();
    let missing = dir.path().join("missing.yaml");
    let mut options = options(&[("ADAPTER_CONFIG_FILE", missing.display().to_string())]);

    let err = options.load_config().unwrap_err();
    assert!(matches!(err, OptionsError::ConfigLoad(_)));
    assert!(err.to_string().starts_with("unable to load metrics discovery configuration"));
}

#[tokio::test]
async fn ca_file_from_options_is_validated() {
    let dir = FixtureDir::new();
    let bad = dir.write("ca.pem", "not a certificate\n");
    let options = options(&[("PROMETHEUS_CA_FILE", bad.display().to_string())]);

    let err = options.make_prom_client().await.unwrap_err();
    assert!(matches!(err, OptionsError::Client(ClientError::CaNoCertsFound { .. })));
}

#[tokio::test]
async fn ca_file_from_options_builds() {
    let dir = FixtureDir::new();
    let ca = dir.write("ca.pem", CA_ALPHA_PEM);
    let options = options(&[
        ("PROMETHEUS_URL", "https://prometheus.monitoring.svc:9090".to_string()),
        ("PROMETHEUS_CA_FILE", ca.display().to_string()),
    ]);

    let client = ClientBuilder::new()
        .with_metrics(Arc::new(ClientMetrics::new(&Registry::new()).unwrap()))
        .build(&options.client_config())
        .await;
    assert!(client.is_ok());
}
