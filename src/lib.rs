//! certchain - retrieve and inspect the TLS certificate chain of a remote host
//!
//! A lookup performs a TLS handshake against an `https` endpoint, captures
//! the certificates the server presents, and produces an immutable
//! [`CertificateChain`] that carries:
//!
//! - every certificate in presentation order, leaf first
//! - the role of each certificate (server, intermediate CA, root CA)
//! - a trust verdict from the configured [`TrustEvaluator`]
//! - the negotiated cipher suite and protocol version
//!
//! No application data is ever sent to the server.
//!
//! # Examples
//!
//! ## Awaiting a lookup
//!
//! ```no_run
//! use certchain::{CertificateChain, LookupOptions, TrustConfig, WebPkiTrustEvaluator};
//! use std::sync::Arc;
//!
//! # async fn run() -> certchain::Result<()> {
//! let evaluator = WebPkiTrustEvaluator::new(&TrustConfig::default())?;
//! let options = LookupOptions::new(Arc::new(evaluator));
//!
//! let chain = CertificateChain::fetch("https://example.com", &options).await?;
//! println!("{} is {}", chain.domain(), chain.trusted());
//! # Ok(())
//! # }
//! ```
//!
//! ## Completion callback
//!
//! ```no_run
//! use certchain::{CertificateChain, LookupOptions, TrustConfig, WebPkiTrustEvaluator};
//! use std::sync::Arc;
//!
//! # async fn run() -> certchain::Result<()> {
//! let evaluator = WebPkiTrustEvaluator::new(&TrustConfig::default())?;
//! let options = LookupOptions::new(Arc::new(evaluator));
//!
//! let handle = CertificateChain::lookup("https://example.com", options, |result| {
//!     match result {
//!         Ok(chain) => println!("{} certificates", chain.certificates().len()),
//!         Err(e) => eprintln!("lookup failed: {}", e),
//!     }
//! });
//! handle.join().await;
//! # Ok(())
//! # }
//! ```

pub mod certificate;
pub mod chain;
pub mod classify;
pub mod config;
pub mod display;
pub mod error;
pub mod probe;
pub mod trust;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{Error, Result};

pub use certificate::Certificate;
pub use chain::{evaluate_trust, CertificateChain, LookupHandle, LookupState};
pub use classify::{classify, Classification};
pub use config::{LookupOptions, Target, TrustConfig, TrustStoreSource};
pub use display::{display_certificate_chain, OutputFormat};
pub use probe::{probe, Handshake};
pub use trust::{TrustEvaluator, WebPkiTrustEvaluator};
pub use types::{CertRole, CipherSuite, ProtocolVersion, TrustStatus, TrustVerdict};
