use crate::chain::CertificateChain;
use crate::error::Result;
use crate::types::TrustStatus;
use colored::Colorize;

pub enum OutputFormat {
    Pretty,
    #[cfg(feature = "json")]
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(OutputFormat::Pretty),
            #[cfg(feature = "json")]
            "json" => Ok(OutputFormat::Json),
            _ => Err(crate::Error::Config(format!("Invalid format: {}", s))),
        }
    }
}

pub fn display_certificate_chain(chain: &CertificateChain, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Pretty => Ok(display_pretty(chain)),
        #[cfg(feature = "json")]
        OutputFormat::Json => display_json(chain),
    }
}

fn display_pretty(chain: &CertificateChain) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n{} {}\n",
        "Certificate Chain for".bold().cyan(),
        chain.domain().bold()
    ));
    output.push_str(&format!("{}\n", "=".repeat(80)));

    let trusted = match chain.trusted() {
        TrustStatus::Trusted => chain.trusted().name().green().bold(),
        TrustStatus::SelfSigned => chain.trusted().name().yellow().bold(),
        TrustStatus::Untrusted | TrustStatus::Revoked => chain.trusted().name().red().bold(),
    };
    output.push_str(&format!("{}: {}\n", "Trust Status".bold(), trusted));
    output.push_str(&format!("{}: {}\n", "Protocol".bold(), chain.protocol_string()));
    output.push_str(&format!("{}: {}\n\n", "Cipher Suite".bold(), chain.cipher_string()));

    for (idx, cert) in chain.certificates().iter().enumerate() {
        output.push_str(&format!(
            "{} {}\n",
            "Certificate".bold(),
            format!("[{}]", idx).dimmed()
        ));
        output.push_str(&format!("{}: {}\n", "Type".bold(), chain.role_of(idx).label()));
        output.push_str(&format!("{}\n", "-".repeat(80)));

        output.push_str(&format!("  {}: {}\n", "Subject".bold().yellow(), cert.subject));
        output.push_str(&format!("  {}: {}\n", "Issuer".bold().yellow(), cert.issuer));
        output.push_str(&format!(
            "  {}: {}\n",
            "Serial Number".bold().yellow(),
            cert.serial_number
        ));

        let validity_color = if cert.is_valid {
            cert.validity_status.green()
        } else {
            cert.validity_status.red()
        };
        output.push_str(&format!(
            "  {}: {}\n",
            "Validity Status".bold().yellow(),
            validity_color
        ));
        output.push_str(&format!(
            "  {}: {}\n",
            "Not Before".bold().yellow(),
            cert.not_before.dimmed()
        ));
        output.push_str(&format!(
            "  {}: {}\n",
            "Not After".bold().yellow(),
            cert.not_after.dimmed()
        ));
        output.push_str(&format!(
            "  {}: {}\n",
            "Signature Algorithm".bold().yellow(),
            cert.signature_algorithm.dimmed()
        ));

        let pk_info = match cert.public_key_size {
            Some(size) => format!("{} ({} bits)", cert.public_key_algorithm, size),
            None => cert.public_key_algorithm.clone(),
        };
        output.push_str(&format!(
            "  {}: {}\n",
            "Public Key".bold().yellow(),
            pk_info.dimmed()
        ));
        output.push_str(&format!(
            "  {}: {}\n",
            "SHA-256 Fingerprint".bold().yellow(),
            cert.fingerprint_sha256.dimmed()
        ));

        if cert.is_ca {
            output.push_str(&format!(
                "  {}: {}\n",
                "CA Certificate".bold().yellow(),
                "Yes".green()
            ));
        }

        if cert.is_self_signed() {
            output.push_str(&format!(
                "  {}: {}\n",
                "Self-Signed".bold().yellow(),
                "Yes".yellow()
            ));
        }

        if !cert.key_usage.is_empty() {
            output.push_str(&format!(
                "  {}: {}\n",
                "Key Usage".bold().yellow(),
                cert.key_usage.join(", ").dimmed()
            ));
        }

        if !cert.extended_key_usage.is_empty() {
            output.push_str(&format!(
                "  {}: {}\n",
                "Extended Key Usage".bold().yellow(),
                cert.extended_key_usage.join(", ").dimmed()
            ));
        }

        if !cert.subject_alt_names.is_empty() {
            output.push_str(&format!(
                "  {}:\n",
                "Subject Alternative Names".bold().yellow()
            ));
            for san in &cert.subject_alt_names {
                output.push_str(&format!("    - {}\n", san.cyan()));
            }
        }

        output.push('\n');
    }

    output.push_str(&format!("{}\n", "=".repeat(80)));
    output.push_str(&format!(
        "{}: {}\n",
        "Total Certificates".bold().cyan(),
        chain.certificates().len()
    ));

    output
}

#[cfg(feature = "json")]
fn display_json(chain: &CertificateChain) -> Result<String> {
    use serde::Serialize;

    #[derive(Serialize)]
    struct JsonCertificate<'a> {
        role: &'static str,
        subject: &'a str,
        issuer: &'a str,
        serial_number: &'a str,
        not_before: &'a str,
        not_after: &'a str,
        signature_algorithm: &'a str,
        public_key_algorithm: &'a str,
        public_key_size: Option<usize>,
        subject_alt_names: &'a [String],
        key_usage: &'a [String],
        extended_key_usage: &'a [String],
        is_ca: bool,
        is_self_signed: bool,
        is_valid: bool,
        fingerprint_sha256: &'a str,
    }

    #[derive(Serialize)]
    struct JsonChain<'a> {
        domain: &'a str,
        trusted: &'static str,
        protocol: String,
        cipher: String,
        server: usize,
        intermediate_ca: Option<usize>,
        root_ca: Option<usize>,
        certificates: Vec<JsonCertificate<'a>>,
    }

    let certificates = chain
        .certificates()
        .iter()
        .enumerate()
        .map(|(idx, cert)| JsonCertificate {
            role: chain.role_of(idx).label(),
            subject: &cert.subject,
            issuer: &cert.issuer,
            serial_number: &cert.serial_number,
            not_before: &cert.not_before,
            not_after: &cert.not_after,
            signature_algorithm: &cert.signature_algorithm,
            public_key_algorithm: &cert.public_key_algorithm,
            public_key_size: cert.public_key_size,
            subject_alt_names: &cert.subject_alt_names,
            key_usage: &cert.key_usage,
            extended_key_usage: &cert.extended_key_usage,
            is_ca: cert.is_ca,
            is_self_signed: cert.is_self_signed(),
            is_valid: cert.is_valid,
            fingerprint_sha256: &cert.fingerprint_sha256,
        })
        .collect();

    let roles = chain.roles();
    let json_chain = JsonChain {
        domain: chain.domain(),
        trusted: chain.trusted().name(),
        protocol: chain.protocol_string(),
        cipher: chain.cipher_string(),
        server: roles.server,
        intermediate_ca: roles.intermediate_ca,
        root_ca: roles.root_ca,
        certificates,
    };

    Ok(serde_json::to_string_pretty(&json_chain)?)
}
