use crate::error::{Error, Result};
use sha2::{Digest, Sha256};
use x509_parser::prelude::*;

/// Read-only decoded view of a single DER-encoded X.509 certificate.
///
/// Two certificates are equal when their DER encodings are equal.
#[derive(Debug, Clone)]
pub struct Certificate {
    der: Vec<u8>,
    pub subject: String,
    pub issuer: String,
    pub serial_number: String,
    pub not_before: String,
    pub not_after: String,
    pub signature_algorithm: String,
    pub public_key_algorithm: String,
    pub public_key_size: Option<usize>,
    pub subject_alt_names: Vec<String>,
    pub key_usage: Vec<String>,
    pub extended_key_usage: Vec<String>,
    pub is_ca: bool,
    pub is_valid: bool,
    pub validity_status: String,
    pub fingerprint_sha256: String,
    self_signed: bool,
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Certificate {}

impl Certificate {
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (rest, x509) = X509Certificate::from_der(der)?;
        if !rest.is_empty() {
            return Err(Error::MalformedCertificate(format!(
                "{} trailing bytes after certificate",
                rest.len()
            )));
        }

        let subject = format_dn(x509.subject());
        let issuer = format_dn(x509.issuer());
        let serial_number = format_hex(x509.raw_serial());
        let self_signed = x509.subject().as_raw() == x509.issuer().as_raw();

        let validity = x509.validity();
        let not_before = validity.not_before.to_string();
        let not_after = validity.not_after.to_string();

        let now = chrono::Utc::now().timestamp();
        let not_before_ts = validity.not_before.timestamp();
        let not_after_ts = validity.not_after.timestamp();

        let is_valid = now >= not_before_ts && now <= not_after_ts;
        let validity_status = if now < not_before_ts {
            "Not yet valid".to_string()
        } else if now > not_after_ts {
            "Expired".to_string()
        } else {
            "Valid".to_string()
        };

        let signature_algorithm = signature_algorithm_name(&x509);

        let (public_key_algorithm, public_key_size) = match x509.public_key().parsed() {
            Ok(x509_parser::public_key::PublicKey::RSA(rsa)) => {
                ("RSA".to_string(), Some(rsa.key_size()))
            }
            Ok(x509_parser::public_key::PublicKey::EC(_)) => ("ECDSA".to_string(), None),
            Ok(x509_parser::public_key::PublicKey::DSA(_)) => ("DSA".to_string(), None),
            _ => ("Unknown".to_string(), None),
        };

        let mut subject_alt_names = Vec::new();
        if let Ok(Some(san_ext)) = x509.subject_alternative_name() {
            for san in &san_ext.value.general_names {
                match san {
                    GeneralName::DNSName(name) => {
                        subject_alt_names.push(format!("DNS:{}", name));
                    }
                    GeneralName::IPAddress(ip) => {
                        subject_alt_names.push(format!("IP:{}", format_ip(ip)));
                    }
                    GeneralName::RFC822Name(email) => {
                        subject_alt_names.push(format!("Email:{}", email));
                    }
                    GeneralName::URI(uri) => {
                        subject_alt_names.push(format!("URI:{}", uri));
                    }
                    _ => {}
                }
            }
        }

        let key_usage = key_usage_names(&x509);
        let extended_key_usage = extended_key_usage_names(&x509);

        let is_ca = x509
            .basic_constraints()
            .ok()
            .flatten()
            .map(|bc| bc.value.ca)
            .unwrap_or(false);

        let fingerprint_sha256 = format_hex(&Sha256::digest(der));

        Ok(Self {
            der: der.to_vec(),
            subject,
            issuer,
            serial_number,
            not_before,
            not_after,
            signature_algorithm,
            public_key_algorithm,
            public_key_size,
            subject_alt_names,
            key_usage,
            extended_key_usage,
            is_ca,
            is_valid,
            validity_status,
            fingerprint_sha256,
            self_signed,
        })
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Issuer name equals subject name (compared on the raw encoding).
    pub fn is_self_signed(&self) -> bool {
        self.self_signed
    }
}

fn signature_algorithm_name(x509: &X509Certificate<'_>) -> String {
    let oid = x509.signature_algorithm.algorithm.to_id_string();
    let name = match oid.as_str() {
        "1.2.840.113549.1.1.5" => "sha1WithRSAEncryption",
        "1.2.840.113549.1.1.11" => "sha256WithRSAEncryption",
        "1.2.840.113549.1.1.12" => "sha384WithRSAEncryption",
        "1.2.840.113549.1.1.13" => "sha512WithRSAEncryption",
        "1.2.840.113549.1.1.10" => "rsassaPss",
        "1.2.840.10045.4.3.2" => "ecdsa-with-SHA256",
        "1.2.840.10045.4.3.3" => "ecdsa-with-SHA384",
        "1.2.840.10045.4.3.4" => "ecdsa-with-SHA512",
        "1.3.101.112" => "Ed25519",
        _ => return oid,
    };
    name.to_string()
}

fn key_usage_names(x509: &X509Certificate<'_>) -> Vec<String> {
    let Ok(Some(ku_ext)) = x509.key_usage() else {
        return Vec::new();
    };
    let ku = &ku_ext.value;
    [
        (ku.digital_signature(), "Digital Signature"),
        (ku.non_repudiation(), "Non Repudiation"),
        (ku.key_encipherment(), "Key Encipherment"),
        (ku.data_encipherment(), "Data Encipherment"),
        (ku.key_agreement(), "Key Agreement"),
        (ku.key_cert_sign(), "Certificate Sign"),
        (ku.crl_sign(), "CRL Sign"),
    ]
    .into_iter()
    .filter(|(set, _)| *set)
    .map(|(_, name)| name.to_string())
    .collect()
}

fn extended_key_usage_names(x509: &X509Certificate<'_>) -> Vec<String> {
    let Ok(Some(eku_ext)) = x509.extended_key_usage() else {
        return Vec::new();
    };
    let eku = &eku_ext.value;
    let mut names: Vec<String> = [
        (eku.any, "Any"),
        (eku.server_auth, "TLS Web Server Authentication"),
        (eku.client_auth, "TLS Web Client Authentication"),
        (eku.code_signing, "Code Signing"),
        (eku.email_protection, "Email Protection"),
        (eku.time_stamping, "Time Stamping"),
        (eku.ocsp_signing, "OCSP Signing"),
    ]
    .into_iter()
    .filter(|(set, _)| *set)
    .map(|(_, name)| name.to_string())
    .collect();
    names.extend(eku.other.iter().map(|oid| oid.to_id_string()));
    names
}

fn format_dn(dn: &X509Name) -> String {
    let mut parts = Vec::new();

    for rdn in dn.iter() {
        for attr in rdn.iter() {
            let name = match attr.attr_type().to_id_string().as_str() {
                "2.5.4.3" => "CN",
                "2.5.4.10" => "O",
                "2.5.4.11" => "OU",
                "2.5.4.6" => "C",
                "2.5.4.7" => "L",
                "2.5.4.8" => "ST",
                _ => continue,
            };

            parts.push(format!("{}={}", name, attr.as_str().unwrap_or("?")));
        }
    }

    parts.join(", ")
}

fn format_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

fn format_ip(ip_bytes: &[u8]) -> String {
    match ip_bytes.len() {
        4 => {
            let octets: [u8; 4] = [ip_bytes[0], ip_bytes[1], ip_bytes[2], ip_bytes[3]];
            std::net::Ipv4Addr::from(octets).to_string()
        }
        16 => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(ip_bytes);
            std::net::Ipv6Addr::from(octets).to_string()
        }
        _ => format!("{:?}", ip_bytes),
    }
}
