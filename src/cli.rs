use crate::chain::CertificateChain;
use crate::config::{LookupOptions, TrustConfig, TrustStoreSource, DEFAULT_TIMEOUT};
use crate::display::{display_certificate_chain, OutputFormat};
use crate::error::Result;
use crate::trust::WebPkiTrustEvaluator;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "certchain")]
#[command(version, about = "Retrieve and inspect the TLS certificate chain of a remote host", long_about = None)]
pub struct Cli {
    #[arg(help = "Target URL (e.g., https://example.com or example.com:8443)")]
    pub url: String,

    #[arg(
        short,
        long,
        default_value = "pretty",
        help = "Output format: pretty or json"
    )]
    pub format: String,

    #[arg(
        short,
        long,
        default_value_t = DEFAULT_TIMEOUT.as_secs(),
        help = "Timeout in seconds for connect and handshake"
    )]
    pub timeout: u64,

    #[arg(
        long,
        default_value = "native",
        help = "Trust anchors: native, bundled or both"
    )]
    pub trust_store: String,

    #[arg(long, help = "Additional PEM trust anchors (repeatable)")]
    pub ca_file: Vec<PathBuf>,

    #[arg(long, help = "PEM CRL used for revocation checks (repeatable)")]
    pub crl_file: Vec<PathBuf>,

    #[arg(short, long, help = "Save chain info to file")]
    pub output: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count, help = "Increase log verbosity")]
    pub verbose: u8,
}

impl Cli {
    fn trust_config(&self) -> Result<TrustConfig> {
        let source = self.trust_store.parse::<TrustStoreSource>()?;
        let mut config = TrustConfig::new(source);
        for path in &self.ca_file {
            config = config.with_anchor_file(path);
        }
        for path in &self.crl_file {
            config = config.with_crl_file(path);
        }
        Ok(config)
    }

    fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

fn init_logging(level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    // A subscriber may already be installed when embedded.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level());

    let output_format = cli.format.parse::<OutputFormat>()?;
    let evaluator = WebPkiTrustEvaluator::new(&cli.trust_config()?)?;
    tracing::debug!(anchors = evaluator.anchor_count(), "trust store ready");

    let options = LookupOptions::new(Arc::new(evaluator))
        .with_timeout(Duration::from_secs(cli.timeout));

    eprintln!(
        "{}",
        format!("Fetching certificate chain from {}...", cli.url).cyan()
    );

    let chain = CertificateChain::fetch(&cli.url, &options).await?;

    let display = display_certificate_chain(&chain, output_format)?;
    println!("{}", display);

    if let Some(out_path) = cli.output {
        std::fs::write(&out_path, &display)?;
        eprintln!("\n{}", format!("Saved to: {}", out_path.display()).green());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["certchain", "example.com"]).unwrap();
        assert_eq!(cli.url, "example.com");
        assert_eq!(cli.format, "pretty");
        assert_eq!(cli.timeout, DEFAULT_TIMEOUT.as_secs());
        assert_eq!(cli.log_level(), Level::WARN);
        assert!(cli.output.is_none());

        let config = cli.trust_config().unwrap();
        assert_eq!(config.source, TrustStoreSource::Native);
    }

    #[test]
    fn test_repeatable_files_and_verbosity() {
        let cli = Cli::try_parse_from([
            "certchain",
            "https://example.com:8443",
            "--trust-store",
            "both",
            "--ca-file",
            "a.pem",
            "--ca-file",
            "b.pem",
            "--crl-file",
            "c.pem",
            "-vv",
        ])
        .unwrap();

        let config = cli.trust_config().unwrap();
        assert_eq!(config.source, TrustStoreSource::Both);
        assert_eq!(config.extra_anchors.len(), 2);
        assert_eq!(config.crl_files.len(), 1);
        assert_eq!(cli.log_level(), Level::DEBUG);
    }

    #[test]
    fn test_invalid_trust_store() {
        let cli = Cli::try_parse_from(["certchain", "example.com", "--trust-store", "x"]).unwrap();
        assert!(cli.trust_config().is_err());
    }
}
