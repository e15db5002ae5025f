use std::io;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Host unreachable: {0}")]
    Unreachable(String),

    #[error("TLS handshake failed: {0}")]
    HandshakeFailed(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to assemble certificate chain: {0}")]
    AssemblyFailed(String),

    #[error("Trust evaluation failed: {0}")]
    TrustEvaluation(String),

    #[error("Malformed certificate: {0}")]
    MalformedCertificate(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// True for failures caused by the network or the peer rather than by
    /// the caller's input or an internal defect.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Error::Unreachable(_) | Error::HandshakeFailed(_) | Error::Timeout(_)
        )
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}

impl From<x509_parser::error::X509Error> for Error {
    fn from(err: x509_parser::error::X509Error) -> Self {
        Error::MalformedCertificate(err.to_string())
    }
}

impl From<x509_parser::nom::Err<x509_parser::error::X509Error>> for Error {
    fn from(err: x509_parser::nom::Err<x509_parser::error::X509Error>) -> Self {
        Error::MalformedCertificate(err.to_string())
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
