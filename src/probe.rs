use crate::config::Target;
use crate::error::{Error, Result};
use crate::trust::crypto_provider;
use crate::types::{CipherSuite, ProtocolVersion};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, ClientConnection, DigitallySignedStruct, SignatureScheme};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

/// Raw material observed during a handshake.
#[derive(Debug, Clone)]
pub struct Handshake {
    /// Peer chain, leaf first, exactly as presented.
    pub certificates: Vec<CertificateDer<'static>>,
    pub cipher: CipherSuite,
    pub protocol: ProtocolVersion,
}

/// Records the peer's chain and accepts it unverified.
#[derive(Debug)]
struct CapturingVerifier {
    captured: OnceLock<Vec<CertificateDer<'static>>>,
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for CapturingVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        let mut certs = Vec::with_capacity(intermediates.len() + 1);
        certs.push(end_entity.clone().into_owned());
        certs.extend(intermediates.iter().map(|c| c.clone().into_owned()));
        let _ = self.captured.set(certs);
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// Run a handshake against `target` far enough to observe the peer's chain
/// and the negotiated parameters. No application data is sent.
///
/// `deadline` bounds name resolution, connect and handshake together. When
/// it elapses the connection is dropped and `Error::Timeout` returned.
pub async fn probe(target: &Target, deadline: Duration) -> Result<Handshake> {
    match tokio::time::timeout(deadline, probe_inner(target)).await {
        Ok(result) => result,
        Err(_) => {
            debug!(%target, ?deadline, "probe deadline elapsed");
            Err(Error::Timeout(deadline))
        }
    }
}

async fn probe_inner(target: &Target) -> Result<Handshake> {
    let server_name = ServerName::try_from(target.host.clone())
        .map_err(|e| Error::InvalidUrl(format!("Invalid server name '{}': {}", target.host, e)))?;

    let provider = crypto_provider();
    let verifier = Arc::new(CapturingVerifier {
        captured: OnceLock::new(),
        provider: provider.clone(),
    });

    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::HandshakeFailed(format!("Failed to configure TLS: {}", e)))?
        .dangerous()
        .with_custom_certificate_verifier(verifier.clone())
        .with_no_client_auth();

    let mut conn = ClientConnection::new(Arc::new(config), server_name)
        .map_err(|e| Error::HandshakeFailed(format!("Failed to create TLS connection: {}", e)))?;

    let mut sock = connect(target).await?;
    debug!(%target, "connected, starting handshake");

    let outcome = drive_handshake(&mut conn, &mut sock, &verifier).await;

    // Whatever rustls queued after the certificate (key exchange, Finished)
    // stays unsent; the connection is closed with the handshake incomplete.
    let _ = sock.shutdown().await;

    let certificates = outcome?;

    let cipher = conn
        .negotiated_cipher_suite()
        .map(|suite| CipherSuite::from(suite.suite()))
        .ok_or_else(|| Error::HandshakeFailed("No cipher suite was negotiated".to_string()))?;
    let protocol = conn
        .protocol_version()
        .map(ProtocolVersion::from)
        .ok_or_else(|| Error::HandshakeFailed("No protocol version was negotiated".to_string()))?;

    debug!(
        %target,
        certificates = certificates.len(),
        %cipher,
        %protocol,
        "captured peer certificate chain"
    );

    Ok(Handshake {
        certificates,
        cipher,
        protocol,
    })
}

async fn connect(target: &Target) -> Result<TcpStream> {
    let addrs: Vec<_> = tokio::net::lookup_host((target.host.as_str(), target.port))
        .await
        .map_err(|e| Error::Unreachable(format!("Failed to resolve {}: {}", target.host, e)))?
        .collect();

    if addrs.is_empty() {
        return Err(Error::Unreachable(format!(
            "No addresses found for {}",
            target.host
        )));
    }

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(sock) => return Ok(sock),
            Err(e) => {
                debug!(%addr, error = %e, "connect failed");
                last_err = Some(e);
            }
        }
    }

    Err(Error::Unreachable(format!(
        "Failed to connect to {}: {}",
        target,
        last_err.map(|e| e.to_string()).unwrap_or_default()
    )))
}

/// Pump TLS records until the verifier has seen the peer's chain. Nothing
/// is written to the peer once the chain has been captured.
async fn drive_handshake(
    conn: &mut ClientConnection,
    sock: &mut TcpStream,
    verifier: &CapturingVerifier,
) -> Result<Vec<CertificateDer<'static>>> {
    let mut buf = vec![0u8; 16 * 1024];

    loop {
        if let Some(certs) = verifier.captured.get() {
            if certs.is_empty() {
                return Err(Error::HandshakeFailed(
                    "Peer sent an empty certificate message".to_string(),
                ));
            }
            return Ok(certs.clone());
        }

        if !conn.is_handshaking() {
            return Err(Error::HandshakeFailed(
                "Handshake completed without a server certificate".to_string(),
            ));
        }

        flush_tls(conn, sock).await?;

        let n = sock
            .read(&mut buf)
            .await
            .map_err(|e| Error::HandshakeFailed(format!("Failed to read from peer: {}", e)))?;
        if n == 0 {
            return Err(Error::HandshakeFailed(
                "Peer closed the connection before sending a certificate".to_string(),
            ));
        }

        let mut received = &buf[..n];
        while !received.is_empty() {
            conn.read_tls(&mut received)
                .map_err(|e| Error::HandshakeFailed(format!("Failed to read TLS record: {}", e)))?;
            if let Err(e) = conn.process_new_packets() {
                // Deliver the alert before giving up.
                let _ = flush_tls(conn, sock).await;
                return Err(Error::HandshakeFailed(e.to_string()));
            }
        }
    }
}

async fn flush_tls(conn: &mut ClientConnection, sock: &mut TcpStream) -> Result<()> {
    while conn.wants_write() {
        let mut out = Vec::new();
        conn.write_tls(&mut out)
            .map_err(|e| Error::HandshakeFailed(format!("Failed to encode TLS record: {}", e)))?;
        sock.write_all(&out)
            .await
            .map_err(|e| Error::HandshakeFailed(format!("Failed to write to peer: {}", e)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate::tests::leaf_params;
    use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
    use rustls::{ServerConfig, ServerConnection, SupportedProtocolVersion};
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;

    /// Serve one TLS connection until the client goes away, then report
    /// whether the server was still waiting for the client's Finished.
    fn spawn_tls_server(
        versions: &[&'static SupportedProtocolVersion],
    ) -> (u16, mpsc::Receiver<bool>) {
        let cert = rcgen::Certificate::from_params(leaf_params("localhost")).unwrap();
        let config = ServerConfig::builder_with_provider(crypto_provider())
            .with_protocol_versions(versions)
            .unwrap()
            .with_no_client_auth()
            .with_single_cert(
                vec![CertificateDer::from(cert.serialize_der().unwrap())],
                PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(cert.serialize_private_key_der())),
            )
            .unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || {
            let (mut sock, _) = listener.accept().unwrap();
            sock.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
            let mut conn = ServerConnection::new(Arc::new(config)).unwrap();
            let mut buf = [0u8; 16 * 1024];

            loop {
                while conn.wants_write() {
                    let mut out = Vec::new();
                    conn.write_tls(&mut out).unwrap();
                    if sock.write_all(&out).is_err() {
                        break;
                    }
                }
                let n = match sock.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => n,
                };
                let mut received = &buf[..n];
                let mut failed = false;
                while !received.is_empty() && !failed {
                    failed = conn.read_tls(&mut received).is_err()
                        || conn.process_new_packets().is_err();
                }
                if failed {
                    break;
                }
            }
            let _ = tx.send(conn.is_handshaking());
        });

        (port, rx)
    }

    fn assert_stops_after_certificate(
        versions: &[&'static SupportedProtocolVersion],
        expected: ProtocolVersion,
    ) {
        let (port, server_handshaking) = spawn_tls_server(versions);

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let handshake = runtime
            .block_on(probe(&Target::new("127.0.0.1", port), Duration::from_secs(5)))
            .unwrap();
        drop(runtime);

        assert_eq!(handshake.certificates.len(), 1);
        assert_eq!(handshake.protocol, expected);
        assert!(server_handshaking
            .recv_timeout(Duration::from_secs(10))
            .unwrap());
    }

    #[test]
    fn test_tls13_stops_after_certificate() {
        assert_stops_after_certificate(&[&rustls::version::TLS13], ProtocolVersion::TLSv1_3);
    }

    #[test]
    fn test_tls12_stops_after_certificate() {
        assert_stops_after_certificate(&[&rustls::version::TLS12], ProtocolVersion::TLSv1_2);
    }

    #[tokio::test]
    async fn test_connection_refused_is_unreachable() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let result = probe(&Target::new("127.0.0.1", port), Duration::from_secs(5)).await;
        assert!(matches!(result, Err(Error::Unreachable(_))), "{:?}", result);
    }

    #[tokio::test]
    async fn test_unresolvable_host_is_unreachable() {
        let result = probe(
            &Target::new("certchain-does-not-exist.invalid", 443),
            Duration::from_secs(10),
        )
        .await;
        assert!(
            matches!(result, Err(Error::Unreachable(_)) | Err(Error::Timeout(_))),
            "{:?}",
            result
        );
    }

    #[tokio::test]
    async fn test_silent_peer_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            // Swallow the ClientHello and never answer; returns on close.
            while let Ok(n) = sock.read(&mut buf).await {
                if n == 0 {
                    break;
                }
            }
        });

        let result = probe(&Target::new("127.0.0.1", port), Duration::from_millis(300)).await;
        assert!(matches!(result, Err(Error::Timeout(_))), "{:?}", result);

        // The server sees EOF once the probe dropped its socket.
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("connection was not closed")
            .unwrap();
    }

    #[tokio::test]
    async fn test_peer_closing_early_is_handshake_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (sock, _) = listener.accept().await.unwrap();
            drop(sock);
        });

        let result = probe(&Target::new("127.0.0.1", port), Duration::from_secs(5)).await;
        assert!(matches!(result, Err(Error::HandshakeFailed(_))), "{:?}", result);
    }

    #[tokio::test]
    async fn test_non_tls_peer_is_handshake_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let _ = sock
                .write_all(b"HTTP/1.1 400 Bad Request\r\nConnection: close\r\n\r\n")
                .await;
        });

        let result = probe(&Target::new("127.0.0.1", port), Duration::from_secs(5)).await;
        assert!(matches!(result, Err(Error::HandshakeFailed(_))), "{:?}", result);
    }
}
