//! PEM certificate pools.

use crate::error::{ClientError, ClientResult};
use std::{fmt, fs, io::Cursor, path::Path};
use tracing::debug;
use x509_parser::parse_x509_certificate;

/// An ordered set of X.509 certificates used as trust roots.
///
/// Only blocks that decode as X.509 end up in the pool; anything else in the
/// bundle is skipped.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CertPool {
    certs: Vec<PooledCert>,
}

#[derive(Clone, PartialEq, Eq)]
struct PooledCert {
    der: Vec<u8>,
    subject: String,
}

impl CertPool {
    /// Parse every certificate in a PEM bundle.
    #[must_use]
    pub fn from_pem(data: &[u8]) -> Self {
        let mut cursor = Cursor::new(data);
        let ders = rustls_pemfile::certs(&mut cursor).filter_map(|item| match item {
            Ok(der) => Some(der),
            Err(e) => {
                debug!(error = %e, "skipping malformed PEM block");
                None
            }
        });
        Self::from_der(ders)
    }

    /// Build a pool from DER encoded certificates.
    #[must_use]
    pub fn from_der<I, D>(ders: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: AsRef<[u8]>,
    {
        let certs = ders
            .into_iter()
            .filter_map(|der| match parse_x509_certificate(der.as_ref()) {
                Ok((_, cert)) => Some(PooledCert {
                    subject: cert.subject().to_string(),
                    der: der.as_ref().to_vec(),
                }),
                Err(e) => {
                    debug!(error = %e, "skipping unparseable certificate");
                    None
                }
            })
            .collect();
        Self { certs }
    }

    /// Load a CA bundle that must contain at least one certificate.
    ///
    /// # Errors
    ///
    /// [`ClientError::CaFileUnreadable`] when the file cannot be read and
    /// [`ClientError::CaNoCertsFound`] when it holds no certificate.
    pub fn from_file(path: &Path) -> ClientResult<Self> {
        let data = fs::read(path).map_err(|source| ClientError::CaFileUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let pool = Self::from_pem(&data);
        if pool.is_empty() {
            return Err(ClientError::CaNoCertsFound {
                path: path.to_path_buf(),
            });
        }
        Ok(pool)
    }

    /// Number of certificates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.certs.len()
    }

    /// Whether the pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    /// Subject names in bundle order.
    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.certs.iter().map(|c| c.subject.as_str())
    }

    /// DER encodings in bundle order.
    pub fn der_certs(&self) -> impl Iterator<Item = &[u8]> {
        self.certs.iter().map(|c| c.der.as_slice())
    }

    pub(crate) fn to_reqwest(&self) -> Result<Vec<reqwest::Certificate>, reqwest::Error> {
        self.der_certs().map(reqwest::Certificate::from_der).collect()
    }
}

impl fmt::Debug for CertPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.subjects()).finish()
    }
}
