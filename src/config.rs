use crate::error::{Error, Result};
use crate::trust::TrustEvaluator;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DEFAULT_PORT: u16 = 443;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Host and port extracted from an `https` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse a URL, accepting only the `https` scheme. A bare `host[:port]`
    /// is treated as `https://host[:port]`.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let url = if input.contains("://") {
            Url::parse(input)?
        } else {
            Url::parse(&format!("https://{}", input))?
        };

        if url.scheme() != "https" {
            return Err(Error::InvalidUrl(format!(
                "unsupported scheme '{}', only https is allowed",
                url.scheme()
            )));
        }

        let host = match url.host() {
            Some(url::Host::Domain(domain)) => domain.to_string(),
            Some(url::Host::Ipv4(ip)) => ip.to_string(),
            Some(url::Host::Ipv6(ip)) => ip.to_string(),
            None => return Err(Error::InvalidUrl(format!("no host in '{}'", input))),
        };
        if host.is_empty() {
            return Err(Error::InvalidUrl(format!("no host in '{}'", input)));
        }

        let port = url.port().unwrap_or(DEFAULT_PORT);

        Ok(Self { host, port })
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Where root anchors come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustStoreSource {
    /// The operating system's certificate store.
    Native,
    /// The Mozilla root program, compiled into the binary.
    Bundled,
    Both,
}

impl TrustStoreSource {
    pub fn name(&self) -> &'static str {
        match self {
            TrustStoreSource::Native => "native",
            TrustStoreSource::Bundled => "bundled",
            TrustStoreSource::Both => "both",
        }
    }
}

impl std::str::FromStr for TrustStoreSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "native" | "system" | "platform" => Ok(TrustStoreSource::Native),
            "bundled" | "mozilla" | "webpki" => Ok(TrustStoreSource::Bundled),
            "both" | "all" => Ok(TrustStoreSource::Both),
            _ => Err(Error::Config(format!("unknown trust store '{}'", s))),
        }
    }
}

/// Trust store and supplemental revocation data for the default evaluator.
#[derive(Debug, Clone)]
pub struct TrustConfig {
    pub source: TrustStoreSource,
    pub extra_anchors: Vec<PathBuf>,
    pub crl_files: Vec<PathBuf>,
}

impl TrustConfig {
    pub fn new(source: TrustStoreSource) -> Self {
        Self {
            source,
            extra_anchors: Vec::new(),
            crl_files: Vec::new(),
        }
    }

    pub fn with_anchor_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.extra_anchors.push(path.into());
        self
    }

    pub fn with_crl_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.crl_files.push(path.into());
        self
    }
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self::new(TrustStoreSource::Native)
    }
}

/// Per-lookup settings.
#[derive(Clone)]
pub struct LookupOptions {
    pub timeout: Duration,
    pub evaluator: Arc<dyn TrustEvaluator>,
}

impl LookupOptions {
    pub fn new(evaluator: Arc<dyn TrustEvaluator>) -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            evaluator,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for LookupOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupOptions")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
