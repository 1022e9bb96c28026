//! HTTPS Prometheus stand-in.
//!
//! Serves [`SERVER_CERT_PEM`] on `127.0.0.1` and answers every request with
//! the same JSON body, so TLS trust decisions can be tested against a real
//! handshake.

use crate::fixtures::{CA_ALPHA_PEM, SERVER_CERT_PEM, SERVER_KEY_PEM};
use rustls::{
    RootCertStore, ServerConfig,
    crypto::{CryptoProvider, ring},
    pki_types::CertificateDer,
    server::WebPkiClientVerifier,
};
use serde_json::Value;
use std::{net::SocketAddr, sync::Arc};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    task::JoinHandle,
};
use tokio_rustls::TlsAcceptor;

/// A running HTTPS server, stopped on drop.
#[derive(Debug)]
pub struct TlsServer {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl TlsServer {
    /// Serve `body` to any client that trusts the server certificate.
    pub async fn start(body: Value) -> Self {
        Self::spawn(body, false).await
    }

    /// Serve `body` only to clients presenting a certificate issued by
    /// [`CA_ALPHA_PEM`].
    pub async fn start_mutual(body: Value) -> Self {
        Self::spawn(body, true).await
    }

    /// Base URI, `https://127.0.0.1:<port>`.
    #[must_use]
    pub fn uri(&self) -> String {
        format!("https://{}", self.addr)
    }

    async fn spawn(body: Value, mutual: bool) -> Self {
        let acceptor = TlsAcceptor::from(Arc::new(server_config(mutual)));
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|e| panic!("unable to bind TLS listener: {e}"));
        let addr = listener
            .local_addr()
            .unwrap_or_else(|e| panic!("unable to read listener address: {e}"));
        let response = Arc::new(http_response(&body));

        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let acceptor = acceptor.clone();
                let response = Arc::clone(&response);
                tokio::spawn(serve(acceptor, stream, response));
            }
        });
        Self { addr, task }
    }
}

impl Drop for TlsServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(acceptor: TlsAcceptor, stream: TcpStream, response: Arc<Vec<u8>>) {
    // Failed handshakes are what the trust tests look for.
    let Ok(mut tls) = acceptor.accept(stream).await else {
        return;
    };

    let mut request = Vec::new();
    let mut chunk = [0_u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match tls.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&chunk[..n]),
        }
    }

    if tls.write_all(&response).await.is_ok() {
        let _ = tls.shutdown().await;
    }
}

fn http_response(body: &Value) -> Vec<u8> {
    let body = body.to_string();
    format!(
        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    )
    .into_bytes()
}

fn pem_certs(pem: &str) -> Vec<CertificateDer<'static>> {
    rustls_pemfile::certs(&mut pem.as_bytes())
        .collect::<Result<_, _>>()
        .unwrap_or_else(|e| panic!("invalid certificate fixture: {e}"))
}

fn server_config(mutual: bool) -> ServerConfig {
    let provider = Arc::new(ring::default_provider());
    let builder = ServerConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()
        .unwrap_or_else(|e| panic!("no usable TLS versions: {e}"));

    let builder = if mutual {
        builder.with_client_cert_verifier(client_verifier(provider))
    } else {
        builder.with_no_client_auth()
    };

    let key = rustls_pemfile::private_key(&mut SERVER_KEY_PEM.as_bytes())
        .unwrap_or_else(|e| panic!("invalid key fixture: {e}"))
        .unwrap_or_else(|| panic!("no private key in fixture"));
    builder
        .with_single_cert(pem_certs(SERVER_CERT_PEM), key)
        .unwrap_or_else(|e| panic!("unable to configure server certificate: {e}"))
}

fn client_verifier(
    provider: Arc<CryptoProvider>,
) -> Arc<dyn rustls::server::danger::ClientCertVerifier> {
    let mut roots = RootCertStore::empty();
    for cert in pem_certs(CA_ALPHA_PEM) {
        roots
            .add(cert)
            .unwrap_or_else(|e| panic!("unable to trust CA fixture: {e}"));
    }
    WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider)
        .build()
        .unwrap_or_else(|e| panic!("unable to build client verifier: {e}"))
}
