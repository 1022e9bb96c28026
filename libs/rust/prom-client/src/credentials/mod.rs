//! Credential providers.
//!
//! Both the in-cluster service account and an explicit kubeconfig are
//! loaded through `kube` into a [`kube::Config`]. [`CredentialProvider`] is
//! the capability of producing one, and [`RestCredentials`] is the part of it
//! a Prometheus transport needs.

mod in_cluster;
mod kubeconfig;

pub use in_cluster::InClusterProvider;
pub use kubeconfig::KubeconfigProvider;

use crate::{
    ca::CertPool,
    error::{CredentialError, TransportError},
    transport::{self, ClusterAuth, TransportHandle},
};
use adapter_common::HttpConfig;
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use kube::config::AuthInfo;
use secrecy::{ExposeSecret, SecretString};
use std::{fmt, fs, path::PathBuf};

/// Where credentials come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// In-cluster service account
    InCluster,
    /// Explicit kubeconfig file
    Kubeconfig(PathBuf),
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InCluster => f.write_str("in-cluster"),
            Self::Kubeconfig(path) => write!(f, "kubeconfig {}", path.display()),
        }
    }
}

/// Produces credentials a transport can be derived from.
#[async_trait]
pub trait CredentialProvider: Send + Sync + fmt::Debug {
    /// Where this provider reads from.
    fn source(&self) -> CredentialSource;

    /// Load the credentials.
    ///
    /// # Errors
    ///
    /// Any [`CredentialError`] raised while reading or interpreting the
    /// source.
    async fn load(&self) -> Result<RestCredentials, CredentialError>;
}

/// Client TLS identity in PEM form.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    /// Certificate chain
    pub cert_pem: String,
    /// Private key
    pub key_pem: SecretString,
}

/// Resolved credential material.
#[derive(Debug, Clone, Default)]
pub struct RestCredentials {
    /// API server the credentials were issued for
    pub host: String,
    /// Exclusive trust roots
    pub root_certs: Option<CertPool>,
    /// Skip server certificate verification
    pub insecure_skip_tls_verify: bool,
    /// Client certificate and key
    pub client_identity: Option<ClientIdentity>,
    /// Header-based credentials
    pub authorization: Option<ClusterAuth>,
}

impl RestCredentials {
    /// Extract the transport-relevant parts of a Kubernetes client
    /// configuration.
    ///
    /// # Errors
    ///
    /// [`CredentialError`] when the CA data holds no certificate, the CA is
    /// combined with insecure mode, the client identity is incomplete or
    /// unreadable, or the auth section cannot be set up.
    pub fn from_kube_config(config: &kube::Config) -> Result<Self, CredentialError> {
        let root_certs = match &config.root_cert {
            Some(ders) => {
                let pool = CertPool::from_der(ders);
                if pool.is_empty() {
                    return Err(CredentialError::NoCertificates(
                        "certificate-authority".to_string(),
                    ));
                }
                Some(pool)
            }
            None => None,
        };
        if root_certs.is_some() && config.accept_invalid_certs {
            return Err(CredentialError::invalid(
                "specifying a root certificates file with the insecure flag is not allowed",
            ));
        }

        Ok(Self {
            host: config.cluster_url.to_string(),
            root_certs,
            insecure_skip_tls_verify: config.accept_invalid_certs,
            client_identity: client_identity(&config.auth_info)?,
            authorization: ClusterAuth::from_config(config)
                .map_err(CredentialError::Authorization)?,
        })
    }

    /// Derive a transport carrying these credentials.
    ///
    /// # Errors
    ///
    /// [`TransportError`] when the TLS material is rejected.
    pub fn transport(&self, http: &HttpConfig) -> Result<TransportHandle, TransportError> {
        transport::transport_for(self, http)
    }
}

fn client_identity(auth: &AuthInfo) -> Result<Option<ClientIdentity>, CredentialError> {
    let cert = pem_material(
        "client-certificate-data",
        auth.client_certificate_data.as_deref(),
        auth.client_certificate.as_deref(),
    )?;
    let key = pem_material(
        "client-key-data",
        auth.client_key_data.as_ref().map(|key| key.expose_secret()),
        auth.client_key.as_deref(),
    )?;

    match (cert, key) {
        (Some(cert_pem), Some(key_pem)) => Ok(Some(ClientIdentity {
            cert_pem,
            key_pem: SecretString::from(key_pem),
        })),
        (None, None) => Ok(None),
        (Some(_), None) => Err(CredentialError::invalid(
            "client-certificate is set but client-key is missing",
        )),
        (None, Some(_)) => Err(CredentialError::invalid(
            "client-key is set but client-certificate is missing",
        )),
    }
}

/// Inline base64 data wins over a file reference.
fn pem_material(
    field: &'static str,
    data: Option<&str>,
    file: Option<&str>,
) -> Result<Option<String>, CredentialError> {
    if let Some(data) = data.filter(|d| !d.is_empty()) {
        let raw = STANDARD
            .decode(data.trim())
            .map_err(|source| CredentialError::Decode { field, source })?;
        return String::from_utf8(raw)
            .map(Some)
            .map_err(|_| CredentialError::invalid(format!("{field} is not valid UTF-8 PEM")));
    }
    file.filter(|f| !f.is_empty())
        .map(|f| fs::read_to_string(f).map_err(|e| CredentialError::read(f, e)))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::fixtures::{
        CA_ALPHA_PEM, CLIENT_CERT_PEM, CLIENT_KEY_PEM, FixtureDir, ca_bundle,
    };

    fn config() -> kube::Config {
        kube::Config::new("https://10.0.0.1:6443".parse().unwrap())
    }

    fn ders(pem: &str) -> Vec<Vec<u8>> {
        CertPool::from_pem(pem.as_bytes()).der_certs().map(<[u8]>::to_vec).collect()
    }

    #[test]
    fn test_source_display() {
        assert_eq!(CredentialSource::InCluster.to_string(), "in-cluster");
        assert_eq!(
            CredentialSource::Kubeconfig(PathBuf::from("/kube/conf")).to_string(),
            "kubeconfig /kube/conf"
        );
    }

    #[test]
    fn test_plain_config() {
        let creds = RestCredentials::from_kube_config(&config()).unwrap();
        assert_eq!(creds.host, "https://10.0.0.1:6443/");
        assert!(creds.root_certs.is_none());
        assert!(creds.client_identity.is_none());
        assert!(creds.authorization.is_none());
    }

    #[test]
    fn test_root_certs_are_pinned() {
        let mut config = config();
        config.root_cert = Some(ders(&ca_bundle(&[CA_ALPHA_PEM])));
        let creds = RestCredentials::from_kube_config(&config).unwrap();
        assert_eq!(creds.root_certs.map(|p| p.len()), Some(1));
    }

    #[test]
    fn test_empty_root_certs_are_rejected() {
        let mut config = config();
        config.root_cert = Some(Vec::new());
        assert!(matches!(
            RestCredentials::from_kube_config(&config),
            Err(CredentialError::NoCertificates(_))
        ));
    }

    #[test]
    fn test_ca_with_insecure_conflicts() {
        let mut config = config();
        config.root_cert = Some(ders(CA_ALPHA_PEM));
        config.accept_invalid_certs = true;
        assert!(matches!(
            RestCredentials::from_kube_config(&config),
            Err(CredentialError::Invalid(_))
        ));
    }

    #[test]
    fn test_insecure_without_ca() {
        let mut config = config();
        config.accept_invalid_certs = true;
        let creds = RestCredentials::from_kube_config(&config).unwrap();
        assert!(creds.insecure_skip_tls_verify);
    }

    #[test]
    fn test_inline_identity() {
        let mut config = config();
        config.auth_info.client_certificate_data = Some(STANDARD.encode(CLIENT_CERT_PEM));
        config.auth_info.client_key_data =
            Some(SecretString::from(STANDARD.encode(CLIENT_KEY_PEM)));

        let identity = RestCredentials::from_kube_config(&config)
            .unwrap()
            .client_identity
            .unwrap();
        assert_eq!(identity.cert_pem, CLIENT_CERT_PEM);
        assert_eq!(identity.key_pem.expose_secret(), CLIENT_KEY_PEM);
    }

    #[test]
    fn test_identity_files() {
        let dir = FixtureDir::new();
        let cert = dir.write("client.pem", CLIENT_CERT_PEM);
        let key = dir.write("client-key.pem", CLIENT_KEY_PEM);
        let mut config = config();
        config.auth_info.client_certificate = Some(cert.display().to_string());
        config.auth_info.client_key = Some(key.display().to_string());

        let identity = RestCredentials::from_kube_config(&config)
            .unwrap()
            .client_identity
            .unwrap();
        assert_eq!(identity.cert_pem, CLIENT_CERT_PEM);
    }

    #[test]
    fn test_identity_without_key() {
        let mut config = config();
        config.auth_info.client_certificate_data = Some(STANDARD.encode(CLIENT_CERT_PEM));
        assert!(matches!(
            RestCredentials::from_kube_config(&config),
            Err(CredentialError::Invalid(_))
        ));
    }

    #[test]
    fn test_identity_bad_base64() {
        let mut config = config();
        config.auth_info.client_certificate_data = Some("%%%".to_string());
        config.auth_info.client_key_data = Some(SecretString::from("%%%".to_string()));
        assert!(matches!(
            RestCredentials::from_kube_config(&config),
            Err(CredentialError::Decode {
                field: "client-certificate-data",
                ..
            })
        ));
    }

    #[test]
    fn test_identity_file_missing() {
        let dir = FixtureDir::new();
        let mut config = config();
        let missing = |name: &str| Some(dir.path().join(name).display().to_string());
        config.auth_info.client_certificate = missing("c.pem");
        config.auth_info.client_key = missing("k.pem");
        assert!(matches!(
            RestCredentials::from_kube_config(&config),
            Err(CredentialError::Read { .. })
        ));
    }

    #[test]
    fn test_token_becomes_authorization() {
        let mut config = config();
        config.auth_info.token = Some(SecretString::from("hunter2".to_string()));
        let creds = RestCredentials::from_kube_config(&config).unwrap();

        assert!(creds.authorization.is_some());
        assert!(!format!("{creds:?}").contains("hunter2"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let creds = RestCredentials {
            client_identity: Some(ClientIdentity {
                cert_pem: "cert".to_string(),
                key_pem: SecretString::from("s3cret".to_string()),
            }),
            ..Default::default()
        };
        assert!(!format!("{creds:?}").contains("s3cret"));
    }
}
