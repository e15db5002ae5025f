use std::fmt;

/// Trust status of an assembled certificate chain.
///
/// `SelfSigned` sits beside the trust outcomes rather than under
/// `Untrusted`: it is decided from the shape of the chain before any trust
/// store is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrustStatus {
    /// The trust store validates the chain.
    Trusted,
    /// The trust store does not validate the chain.
    Untrusted,
    /// The server certificate (or an intermediate) is revoked.
    Revoked,
    /// A single certificate whose issuer is its own subject.
    SelfSigned,
}

impl TrustStatus {
    pub fn name(&self) -> &'static str {
        match self {
            TrustStatus::Trusted => "Trusted",
            TrustStatus::Untrusted => "Untrusted",
            TrustStatus::Revoked => "Revoked",
            TrustStatus::SelfSigned => "Self-Signed",
        }
    }
}

impl fmt::Display for TrustStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a trust evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrustVerdict {
    Trusted,
    Untrusted,
    Revoked,
}

impl From<TrustVerdict> for TrustStatus {
    fn from(verdict: TrustVerdict) -> Self {
        match verdict {
            TrustVerdict::Trusted => TrustStatus::Trusted,
            TrustVerdict::Untrusted => TrustStatus::Untrusted,
            TrustVerdict::Revoked => TrustStatus::Revoked,
        }
    }
}

/// Role a certificate plays in a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CertRole {
    Server,
    IntermediateCA,
    RootCA,
    /// Sits between the server and the intermediate in chains of four or
    /// more certificates.
    Other,
}

impl CertRole {
    pub fn label(&self) -> &'static str {
        match self {
            CertRole::Server => "Server Certificate",
            CertRole::IntermediateCA => "Intermediate CA Certificate",
            CertRole::RootCA => "Root CA Certificate",
            CertRole::Other => "CA Certificate",
        }
    }
}

/// Negotiated protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolVersion {
    SSLv2,
    SSLv3,
    TLSv1_0,
    TLSv1_1,
    TLSv1_2,
    TLSv1_3,
    DTLSv1_0,
    DTLSv1_2,
    Unknown(u16),
}

impl ProtocolVersion {
    pub fn id(&self) -> u16 {
        match self {
            ProtocolVersion::SSLv2 => 0x0200,
            ProtocolVersion::SSLv3 => 0x0300,
            ProtocolVersion::TLSv1_0 => 0x0301,
            ProtocolVersion::TLSv1_1 => 0x0302,
            ProtocolVersion::TLSv1_2 => 0x0303,
            ProtocolVersion::TLSv1_3 => 0x0304,
            ProtocolVersion::DTLSv1_0 => 0xfeff,
            ProtocolVersion::DTLSv1_2 => 0xfefd,
            ProtocolVersion::Unknown(id) => *id,
        }
    }

    pub fn name(&self) -> Option<&'static str> {
        match self {
            ProtocolVersion::SSLv2 => Some("SSL 2.0"),
            ProtocolVersion::SSLv3 => Some("SSL 3.0"),
            ProtocolVersion::TLSv1_0 => Some("TLS 1.0"),
            ProtocolVersion::TLSv1_1 => Some("TLS 1.1"),
            ProtocolVersion::TLSv1_2 => Some("TLS 1.2"),
            ProtocolVersion::TLSv1_3 => Some("TLS 1.3"),
            ProtocolVersion::DTLSv1_0 => Some("DTLS 1.0"),
            ProtocolVersion::DTLSv1_2 => Some("DTLS 1.2"),
            ProtocolVersion::Unknown(_) => None,
        }
    }
}

impl From<u16> for ProtocolVersion {
    fn from(id: u16) -> Self {
        match id {
            0x0200 => ProtocolVersion::SSLv2,
            0x0300 => ProtocolVersion::SSLv3,
            0x0301 => ProtocolVersion::TLSv1_0,
            0x0302 => ProtocolVersion::TLSv1_1,
            0x0303 => ProtocolVersion::TLSv1_2,
            0x0304 => ProtocolVersion::TLSv1_3,
            0xfeff => ProtocolVersion::DTLSv1_0,
            0xfefd => ProtocolVersion::DTLSv1_2,
            other => ProtocolVersion::Unknown(other),
        }
    }
}

impl From<rustls::ProtocolVersion> for ProtocolVersion {
    fn from(version: rustls::ProtocolVersion) -> Self {
        ProtocolVersion::from(u16::from(version))
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "UNKNOWN (0x{:04X})", self.id()),
        }
    }
}

macro_rules! cipher_suites {
    ($($variant:ident = $id:literal => $name:literal,)+) => {
        /// Negotiated cipher suite, by IANA identifier.
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum CipherSuite {
            $($variant,)+
            Unknown(u16),
        }

        impl CipherSuite {
            pub fn id(&self) -> u16 {
                match self {
                    $(CipherSuite::$variant => $id,)+
                    CipherSuite::Unknown(id) => *id,
                }
            }

            pub fn name(&self) -> Option<&'static str> {
                match self {
                    $(CipherSuite::$variant => Some($name),)+
                    CipherSuite::Unknown(_) => None,
                }
            }
        }

        impl From<u16> for CipherSuite {
            fn from(id: u16) -> Self {
                match id {
                    $($id => CipherSuite::$variant,)+
                    other => CipherSuite::Unknown(other),
                }
            }
        }
    };
}

cipher_suites! {
    TLS13_AES_128_GCM_SHA256 = 0x1301 => "TLS_AES_128_GCM_SHA256",
    TLS13_AES_256_GCM_SHA384 = 0x1302 => "TLS_AES_256_GCM_SHA384",
    TLS13_CHACHA20_POLY1305_SHA256 = 0x1303 => "TLS_CHACHA20_POLY1305_SHA256",
    TLS13_AES_128_CCM_SHA256 = 0x1304 => "TLS_AES_128_CCM_SHA256",
    TLS13_AES_128_CCM_8_SHA256 = 0x1305 => "TLS_AES_128_CCM_8_SHA256",
    ECDHE_ECDSA_AES_128_GCM_SHA256 = 0xc02b => "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256",
    ECDHE_ECDSA_AES_256_GCM_SHA384 = 0xc02c => "TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384",
    ECDHE_RSA_AES_128_GCM_SHA256 = 0xc02f => "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256",
    ECDHE_RSA_AES_256_GCM_SHA384 = 0xc030 => "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384",
    ECDHE_RSA_CHACHA20_POLY1305_SHA256 = 0xcca8 => "TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256",
    ECDHE_ECDSA_CHACHA20_POLY1305_SHA256 = 0xcca9 => "TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256",
    ECDHE_ECDSA_AES_128_CBC_SHA256 = 0xc023 => "TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA256",
    ECDHE_ECDSA_AES_256_CBC_SHA384 = 0xc024 => "TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA384",
    ECDHE_RSA_AES_128_CBC_SHA256 = 0xc027 => "TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA256",
    ECDHE_RSA_AES_256_CBC_SHA384 = 0xc028 => "TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA384",
    ECDHE_ECDSA_AES_128_CBC_SHA = 0xc009 => "TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA",
    ECDHE_ECDSA_AES_256_CBC_SHA = 0xc00a => "TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA",
    ECDHE_RSA_AES_128_CBC_SHA = 0xc013 => "TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA",
    ECDHE_RSA_AES_256_CBC_SHA = 0xc014 => "TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA",
    DHE_RSA_AES_128_GCM_SHA256 = 0x009e => "TLS_DHE_RSA_WITH_AES_128_GCM_SHA256",
    DHE_RSA_AES_256_GCM_SHA384 = 0x009f => "TLS_DHE_RSA_WITH_AES_256_GCM_SHA384",
    DHE_RSA_CHACHA20_POLY1305_SHA256 = 0xccaa => "TLS_DHE_RSA_WITH_CHACHA20_POLY1305_SHA256",
    RSA_AES_128_GCM_SHA256 = 0x009c => "TLS_RSA_WITH_AES_128_GCM_SHA256",
    RSA_AES_256_GCM_SHA384 = 0x009d => "TLS_RSA_WITH_AES_256_GCM_SHA384",
    RSA_AES_128_CBC_SHA = 0x002f => "TLS_RSA_WITH_AES_128_CBC_SHA",
    RSA_AES_256_CBC_SHA = 0x0035 => "TLS_RSA_WITH_AES_256_CBC_SHA",
    RSA_AES_128_CBC_SHA256 = 0x003c => "TLS_RSA_WITH_AES_128_CBC_SHA256",
    RSA_AES_256_CBC_SHA256 = 0x003d => "TLS_RSA_WITH_AES_256_CBC_SHA256",
    RSA_3DES_EDE_CBC_SHA = 0x000a => "TLS_RSA_WITH_3DES_EDE_CBC_SHA",
    RSA_RC4_128_SHA = 0x0005 => "TLS_RSA_WITH_RC4_128_SHA",
}

impl From<rustls::CipherSuite> for CipherSuite {
    fn from(suite: rustls::CipherSuite) -> Self {
        CipherSuite::from(u16::from(suite))
    }
}

impl fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "UNKNOWN (0x{:04X})", self.id()),
        }
    }
}
