use crate::config::{TrustConfig, TrustStoreSource};
use crate::error::{Error, Result};
use crate::types::TrustVerdict;
use rustls::client::danger::ServerCertVerifier;
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, CertificateRevocationListDer, ServerName, UnixTime};
use rustls::{CertificateError, RootCertStore};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Decides whether a leaf-first chain is trusted for `domain`.
///
/// Implementations must not cache verdicts: revocation data and root stores
/// can change between two lookups of the same host.
pub trait TrustEvaluator: Send + Sync {
    fn evaluate(&self, domain: &str, chain: &[CertificateDer<'static>]) -> Result<TrustVerdict>;
}

/// Trust evaluation backed by webpki path building over a rustls root store.
#[derive(Debug)]
pub struct WebPkiTrustEvaluator {
    // None when the root store is empty.
    verifier: Option<Arc<WebPkiServerVerifier>>,
    anchors: usize,
}

impl WebPkiTrustEvaluator {
    pub fn new(config: &TrustConfig) -> Result<Self> {
        let mut roots = RootCertStore::empty();

        if matches!(config.source, TrustStoreSource::Native | TrustStoreSource::Both) {
            load_native_roots(&mut roots);
        }
        if matches!(config.source, TrustStoreSource::Bundled | TrustStoreSource::Both) {
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        }

        for path in &config.extra_anchors {
            let (added, ignored) = roots.add_parsable_certificates(read_pem_certs(path)?);
            debug!(path = %path.display(), added, ignored, "loaded extra trust anchors");
        }

        let mut crls = Vec::new();
        for path in &config.crl_files {
            crls.extend(read_pem_crls(path)?);
        }

        Self::from_parts(roots, crls)
    }

    /// Build from an explicit root store and CRL set.
    pub fn from_parts(
        roots: RootCertStore,
        crls: Vec<CertificateRevocationListDer<'static>>,
    ) -> Result<Self> {
        let anchors = roots.len();
        if anchors == 0 {
            warn!("trust store is empty, every chain will be untrusted");
            return Ok(Self {
                verifier: None,
                anchors,
            });
        }

        let mut builder =
            WebPkiServerVerifier::builder_with_provider(Arc::new(roots), crypto_provider());
        if !crls.is_empty() {
            builder = builder.with_crls(crls).allow_unknown_revocation_status();
        }
        let verifier = builder
            .build()
            .map_err(|e| Error::Config(format!("failed to build trust verifier: {}", e)))?;

        Ok(Self {
            verifier: Some(verifier),
            anchors,
        })
    }

    pub fn anchor_count(&self) -> usize {
        self.anchors
    }
}

impl TrustEvaluator for WebPkiTrustEvaluator {
    fn evaluate(&self, domain: &str, chain: &[CertificateDer<'static>]) -> Result<TrustVerdict> {
        let (end_entity, intermediates) = chain
            .split_first()
            .ok_or_else(|| Error::AssemblyFailed("nothing to evaluate".to_string()))?;

        let Some(verifier) = &self.verifier else {
            return Ok(TrustVerdict::Untrusted);
        };

        let server_name = ServerName::try_from(domain.to_string()).map_err(|e| {
            Error::TrustEvaluation(format!("invalid server name '{}': {}", domain, e))
        })?;

        let outcome = verifier.verify_server_cert(
            end_entity,
            intermediates,
            &server_name,
            &[],
            UnixTime::now(),
        );

        match outcome {
            Ok(_) => Ok(TrustVerdict::Trusted),
            Err(rustls::Error::InvalidCertificate(CertificateError::Revoked)) => {
                Ok(TrustVerdict::Revoked)
            }
            Err(rustls::Error::InvalidCertificate(reason)) => {
                debug!(domain, ?reason, "chain not trusted");
                Ok(TrustVerdict::Untrusted)
            }
            Err(e) => Err(Error::TrustEvaluation(e.to_string())),
        }
    }
}

/// Default CryptoProvider shared by the probe and the evaluator.
pub(crate) fn crypto_provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

fn load_native_roots(roots: &mut RootCertStore) {
    let result = rustls_native_certs::load_native_certs();
    for error in &result.errors {
        warn!("error when loading native certs: {}", error);
    }
    let (added, ignored) = roots.add_parsable_certificates(result.certs);
    debug!(added, ignored, "loaded native trust anchors");
}

fn read_pem_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let mut reader = BufReader::new(File::open(path)?);
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
    if certs.is_empty() {
        return Err(Error::Config(format!(
            "no certificates found in {}",
            path.display()
        )));
    }
    Ok(certs)
}

fn read_pem_crls(path: &Path) -> Result<Vec<CertificateRevocationListDer<'static>>> {
    let mut reader = BufReader::new(File::open(path)?);
    let crls = rustls_pemfile::crls(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
    if crls.is_empty() {
        return Err(Error::Config(format!("no CRLs found in {}", path.display())));
    }
    Ok(crls)
}
