//! Test fixtures with sample data.
//!
//! The certificates are long-lived, self-contained test material: two
//! independent CAs plus a server and a client certificate issued by the
//! first.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::{Map, Value, json};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

/// Self-signed CA, `CN=metrics-ca-alpha`.
pub const CA_ALPHA_PEM: &str = include_str!("../fixtures/ca-alpha.pem");

/// Self-signed CA, `CN=metrics-ca-beta`.
pub const CA_BETA_PEM: &str = include_str!("../fixtures/ca-beta.pem");

/// Client certificate `CN=metrics-adapter`, issued by [`CA_ALPHA_PEM`].
pub const CLIENT_CERT_PEM: &str = include_str!("../fixtures/client.pem");

/// PKCS#8 key for [`CLIENT_CERT_PEM`].
pub const CLIENT_KEY_PEM: &str = include_str!("../fixtures/client-key.pem");

/// Server certificate `CN=prometheus.test` for `127.0.0.1` and `localhost`,
/// issued by [`CA_ALPHA_PEM`].
pub const SERVER_CERT_PEM: &str = include_str!("../fixtures/server.pem");

/// PKCS#8 key for [`SERVER_CERT_PEM`].
pub const SERVER_KEY_PEM: &str = include_str!("../fixtures/server-key.pem");

/// Concatenate PEM blocks into one bundle.
#[must_use]
pub fn ca_bundle(pems: &[&str]) -> String {
    pems.iter().fold(String::new(), |mut bundle, pem| {
        bundle.push_str(pem);
        if !pem.ends_with('\n') {
            bundle.push('\n');
        }
        bundle
    })
}

/// Scratch directory removed on drop.
#[derive(Debug)]
pub struct FixtureDir {
    dir: TempDir,
}

impl Default for FixtureDir {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureDir {
    /// Create an empty directory.
    ///
    /// # Panics
    ///
    /// When no temporary directory can be created.
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap_or_else(|e| panic!("unable to create fixture dir: {e}"));
        Self { dir }
    }

    /// Directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `name`, replacing any previous file.
    ///
    /// # Panics
    ///
    /// When the file cannot be written.
    pub fn write(&self, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents)
            .unwrap_or_else(|e| panic!("unable to write {}: {e}", path.display()));
        path
    }
}

/// Builds a single-context kubeconfig.
///
/// Context, cluster and user are all named `default`. Inline data is
/// stored as plain text and base64-encoded on output.
#[derive(Debug, Clone, Default)]
pub struct KubeconfigFixture {
    cluster: Map<String, Value>,
    user: Map<String, Value>,
}

impl KubeconfigFixture {
    /// Kubeconfig pointing at `server`.
    #[must_use]
    pub fn new(server: &str) -> Self {
        let mut fixture = Self::default();
        fixture.cluster.insert("server".into(), json!(server));
        fixture
    }

    /// Inline CA bundle.
    #[must_use]
    pub fn with_ca_data(mut self, pem: &str) -> Self {
        self.cluster
            .insert("certificate-authority-data".into(), json!(STANDARD.encode(pem)));
        self
    }

    /// CA bundle file.
    #[must_use]
    pub fn with_ca_file(mut self, path: &str) -> Self {
        self.cluster.insert("certificate-authority".into(), json!(path));
        self
    }

    /// Skip server verification.
    #[must_use]
    pub fn insecure(mut self) -> Self {
        self.cluster.insert("insecure-skip-tls-verify".into(), json!(true));
        self
    }

    /// Inline bearer token.
    #[must_use]
    pub fn with_token(mut self, token: &str) -> Self {
        self.user.insert("token".into(), json!(token));
        self
    }

    /// Bearer token file.
    #[must_use]
    pub fn with_token_file(mut self, path: &str) -> Self {
        self.user.insert("tokenFile".into(), json!(path));
        self
    }

    /// Client certificate and key files.
    #[must_use]
    pub fn with_client_cert_files(mut self, cert: &str, key: &str) -> Self {
        self.user.insert("client-certificate".into(), json!(cert));
        self.user.insert("client-key".into(), json!(key));
        self
    }

    /// Inline client certificate and key.
    #[must_use]
    pub fn with_client_cert_data(mut self, cert_pem: &str, key_pem: &str) -> Self {
        self.user
            .insert("client-certificate-data".into(), json!(STANDARD.encode(cert_pem)));
        self.user
            .insert("client-key-data".into(), json!(STANDARD.encode(key_pem)));
        self
    }

    /// Username and password.
    #[must_use]
    pub fn with_basic_auth(mut self, username: &str, password: &str) -> Self {
        self.user.insert("username".into(), json!(username));
        self.user.insert("password".into(), json!(password));
        self
    }

    /// Credential plugin run as `command args...`.
    #[must_use]
    pub fn with_exec(mut self, command: &str, args: &[&str]) -> Self {
        self.user.insert(
            "exec".into(),
            json!({
                "apiVersion": "client.authentication.k8s.io/v1",
                "command": command,
                "args": args,
            }),
        );
        self
    }

    /// Render as YAML.
    ///
    /// # Panics
    ///
    /// Never in practice; the document is built from plain JSON values.
    #[must_use]
    pub fn to_yaml(&self) -> String {
        let doc = json!({
            "apiVersion": "v1",
            "kind": "Config",
            "current-context": "default",
            "contexts": [{"name": "default", "context": {"cluster": "default", "user": "default"}}],
            "clusters": [{"name": "default", "cluster": self.cluster}],
            "users": [{"name": "default", "user": self.user}],
        });
        serde_yaml::to_string(&doc).unwrap_or_else(|e| panic!("unable to render kubeconfig: {e}"))
    }
}
