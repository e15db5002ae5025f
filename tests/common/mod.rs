#![allow(dead_code)]

use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, SanType,
};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::{RootCertStore, ServerConfig, ServerConnection};
use std::net::{IpAddr, Ipv4Addr, TcpListener};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub struct Pki {
    pub chain: Vec<CertificateDer<'static>>,
    pub key: Vec<u8>,
}

impl Pki {
    pub fn root(&self) -> &CertificateDer<'static> {
        self.chain.last().unwrap()
    }

    pub fn roots(&self) -> RootCertStore {
        let mut roots = RootCertStore::empty();
        roots.add(self.root().clone()).unwrap();
        roots
    }
}

fn ca_params(cn: &str) -> CertificateParams {
    let mut params = CertificateParams::new(vec![]);
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, cn);
    params.distinguished_name = dn;
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params
}

fn loopback_leaf_params() -> CertificateParams {
    let mut params = CertificateParams::new(vec![]);
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, "127.0.0.1");
    params.distinguished_name = dn;
    params.subject_alt_names = vec![SanType::IpAddress(IpAddr::V4(Ipv4Addr::LOCALHOST))];
    params
}

/// Leaf for 127.0.0.1 signed by an intermediate signed by a root.
pub fn three_cert_pki() -> Pki {
    let root = rcgen::Certificate::from_params(ca_params("Loopback Root CA")).unwrap();
    let inter = rcgen::Certificate::from_params(ca_params("Loopback Intermediate CA")).unwrap();
    let leaf = rcgen::Certificate::from_params(loopback_leaf_params()).unwrap();

    Pki {
        chain: vec![
            CertificateDer::from(leaf.serialize_der_with_signer(&inter).unwrap()),
            CertificateDer::from(inter.serialize_der_with_signer(&root).unwrap()),
            CertificateDer::from(root.serialize_der().unwrap()),
        ],
        key: leaf.serialize_private_key_der(),
    }
}

/// Leaf and intermediate only; the root is withheld.
pub fn two_cert_pki() -> Pki {
    let root = rcgen::Certificate::from_params(ca_params("Hidden Root CA")).unwrap();
    let inter = rcgen::Certificate::from_params(ca_params("Hidden Intermediate CA")).unwrap();
    let leaf = rcgen::Certificate::from_params(loopback_leaf_params()).unwrap();

    Pki {
        chain: vec![
            CertificateDer::from(leaf.serialize_der_with_signer(&inter).unwrap()),
            CertificateDer::from(inter.serialize_der_with_signer(&root).unwrap()),
        ],
        key: leaf.serialize_private_key_der(),
    }
}

pub fn self_signed_pki() -> Pki {
    let leaf = rcgen::Certificate::from_params(loopback_leaf_params()).unwrap();
    Pki {
        chain: vec![CertificateDer::from(leaf.serialize_der().unwrap())],
        key: leaf.serialize_private_key_der(),
    }
}

/// Serve `pki` over TLS for a single connection. Returns the port.
pub fn spawn_tls_server(pki: &Pki) -> u16 {
    let config = ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .unwrap()
    .with_no_client_auth()
    .with_single_cert(
        pki.chain.clone(),
        PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(pki.key.clone())),
    )
    .unwrap();
    let config = Arc::new(config);

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    thread::spawn(move || {
        let (mut sock, _) = listener.accept().unwrap();
        sock.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let mut conn = ServerConnection::new(config).unwrap();
        for _ in 0..32 {
            if !conn.is_handshaking() || conn.complete_io(&mut sock).is_err() {
                break;
            }
        }
    });

    port
}

/// Accept one connection and never answer.
pub fn spawn_silent_server() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    thread::spawn(move || {
        if let Ok((sock, _)) = listener.accept() {
            thread::sleep(Duration::from_secs(30));
            drop(sock);
        }
    });

    port
}
