//! Trust decisions checked against a real TLS handshake.

use prom_client::{
    ClientBuilder, ClientConfig, ClientMetrics, PrometheusClient, QueryError, QueryResult,
};
use prometheus::Registry;
use std::sync::Arc;
use test_utils::{
    fixtures::{
        CA_ALPHA_PEM, CA_BETA_PEM, CLIENT_CERT_PEM, CLIENT_KEY_PEM, FixtureDir, KubeconfigFixture,
    },
    mocks::{success_envelope, vector_data},
    tls::TlsServer,
};

async fn build(config: &ClientConfig) -> PrometheusClient {
    ClientBuilder::new()
        .with_metrics(Arc::new(ClientMetrics::new(&Registry::new()).unwrap()))
        .build(config)
        .await
        .unwrap()
}

async fn server() -> TlsServer {
    let labels: &[(&str, &str)] = &[("job", "prometheus")];
    TlsServer::start(success_envelope(vector_data(&[(labels, "1")], 1_700_000_000.0))).await
}

async fn mutual_server() -> TlsServer {
    TlsServer::start_mutual(success_envelope(vector_data(&[], 0.0))).await
}

#[tokio::test]
async fn issuing_ca_pin_is_trusted() {
    let server = server().await;
    let dir = FixtureDir::new();
    let ca = dir.write("ca.pem", CA_ALPHA_PEM);
    let client = build(&ClientConfig::new(server.uri()).with_ca_file(&ca)).await;

    let result = client.query("up", None).await.unwrap();
    assert!(matches!(result, QueryResult::Vector(ref v) if v.len() == 1));
}

#[tokio::test]
async fn unrelated_ca_pin_is_rejected() {
    let server = server().await;
    let dir = FixtureDir::new();
    let ca = dir.write("ca.pem", CA_BETA_PEM);
    let client = build(&ClientConfig::new(server.uri()).with_ca_file(&ca)).await;

    let err = client.query("up", None).await.unwrap_err();
    assert!(matches!(err, QueryError::Transport(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn system_roots_do_not_trust_private_ca() {
    let server = server().await;
    let client = build(&ClientConfig::new(server.uri())).await;

    let err = client.query("up", None).await.unwrap_err();
    assert!(matches!(err, QueryError::Transport(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn insecure_kubeconfig_skips_verification() {
    let server = server().await;
    let dir = FixtureDir::new();
    let kubeconfig = dir.write(
        "kubeconfig",
        KubeconfigFixture::new("https://10.0.0.1:6443").insecure().to_yaml(),
    );
    let client =
        build(&ClientConfig::new(server.uri()).with_external_credentials(&kubeconfig)).await;

    client.query("up", None).await.unwrap();
}

#[tokio::test]
async fn kubeconfig_client_certificate_is_presented() {
    let server = mutual_server().await;
    let dir = FixtureDir::new();
    let kubeconfig = dir.write(
        "kubeconfig",
        KubeconfigFixture::new("https://10.0.0.1:6443")
            .with_ca_data(CA_ALPHA_PEM)
            .with_client_cert_data(CLIENT_CERT_PEM, CLIENT_KEY_PEM)
            .to_yaml(),
    );
    let client =
        build(&ClientConfig::new(server.uri()).with_external_credentials(&kubeconfig)).await;

    let result = client.query("up", None).await.unwrap();
    assert!(matches!(result, QueryResult::Vector(ref v) if v.is_empty()));
}

#[tokio::test]
async fn missing_client_certificate_is_refused() {
    let server = mutual_server().await;
    let dir = FixtureDir::new();
    let kubeconfig = dir.write(
        "kubeconfig",
        KubeconfigFixture::new("https://10.0.0.1:6443")
            .with_ca_data(CA_ALPHA_PEM)
            .to_yaml(),
    );
    let client =
        build(&ClientConfig::new(server.uri()).with_external_credentials(&kubeconfig)).await;

    let err = client.query("up", None).await.unwrap_err();
    assert!(matches!(err, QueryError::Transport(_)), "unexpected error: {err}");
}
