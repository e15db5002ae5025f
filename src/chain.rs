use crate::certificate::Certificate;
use crate::classify::{classify, Classification};
use crate::config::{LookupOptions, Target};
use crate::error::{Error, Result};
use crate::probe::{probe, Handshake};
use crate::trust::TrustEvaluator;
use crate::types::{CertRole, CipherSuite, ProtocolVersion, TrustStatus, TrustVerdict};
use rustls::pki_types::CertificateDer;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// A chain of certificates and metadata about the handshake that produced
/// it. Immutable once assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateChain {
    domain: String,
    certificates: Vec<Certificate>,
    roles: Classification,
    trusted: TrustStatus,
    cipher: CipherSuite,
    protocol: ProtocolVersion,
}

impl CertificateChain {
    /// Query `url` for its certificate chain.
    ///
    /// Only `https` URLs are accepted; the port defaults to 443. Dropping
    /// the returned future abandons the lookup and closes its connection.
    pub async fn fetch(url: &str, options: &LookupOptions) -> Result<Self> {
        let target = Target::parse(url)?;
        Self::fetch_target(&target, options, &mut |_: LookupState| {}).await
    }

    /// Callback flavour of [`CertificateChain::fetch`].
    ///
    /// The lookup runs on a spawned task of the current tokio runtime and
    /// `finished` is called on that task exactly once, unless the lookup is
    /// cancelled first. Must be called from within a tokio runtime.
    pub fn lookup<F>(url: &str, options: LookupOptions, finished: F) -> LookupHandle
    where
        F: FnOnce(Result<CertificateChain>) + Send + 'static,
    {
        let latch = Arc::new(Completion::new(Box::new(finished)));
        let url = url.to_string();

        let task_latch = latch.clone();
        let task = tokio::spawn(async move {
            let result = match Target::parse(&url) {
                Ok(target) => {
                    let mut observe = |state: LookupState| task_latch.transition(state);
                    Self::fetch_target(&target, &options, &mut observe).await
                }
                Err(e) => Err(e),
            };
            task_latch.fire(result);
        });

        LookupHandle { latch, task }
    }

    async fn fetch_target(
        target: &Target,
        options: &LookupOptions,
        observe: &mut (dyn FnMut(LookupState) + Send),
    ) -> Result<Self> {
        observe(LookupState::ProbeInFlight);
        let handshake = match probe(target, options.timeout).await {
            Ok(handshake) => handshake,
            Err(e) => {
                warn!(%target, error = %e, "probe failed");
                observe(LookupState::ProbeFailed);
                return Err(e);
            }
        };

        observe(LookupState::Assembling);
        match Self::assemble(&target.host, handshake, options.evaluator.as_ref()) {
            Ok(chain) => {
                info!(
                    domain = %chain.domain,
                    certificates = chain.certificates.len(),
                    trusted = %chain.trusted,
                    "certificate chain assembled"
                );
                observe(LookupState::Complete);
                Ok(chain)
            }
            Err(e) => {
                error!(%target, error = %e, "certificate chain assembly failed");
                observe(LookupState::AssemblyFailed);
                Err(e)
            }
        }
    }

    /// Build a chain from the raw material of a handshake.
    ///
    /// A single self-signed certificate is reported as `SelfSigned` without
    /// consulting `evaluator`. Evaluator failures degrade to `Untrusted`.
    pub fn assemble(
        domain: &str,
        handshake: Handshake,
        evaluator: &dyn TrustEvaluator,
    ) -> Result<Self> {
        let certificates = decode_chain(&handshake.certificates)?;
        let roles = classify(&certificates)?;
        let trusted = if roles.self_signed {
            TrustStatus::SelfSigned
        } else {
            evaluate_trust(evaluator, domain, &handshake.certificates).into()
        };

        Self::from_parts(
            domain,
            certificates,
            roles,
            trusted,
            handshake.cipher,
            handshake.protocol,
        )
    }

    /// Combine independently computed parts into a chain.
    ///
    /// `roles` must be the classification of `certificates`, and `trusted`
    /// is `SelfSigned` exactly when the chain is a single self-signed
    /// certificate.
    pub fn from_parts(
        domain: &str,
        certificates: Vec<Certificate>,
        roles: Classification,
        trusted: TrustStatus,
        cipher: CipherSuite,
        protocol: ProtocolVersion,
    ) -> Result<Self> {
        if domain.is_empty() {
            return Err(Error::AssemblyFailed("empty domain".to_string()));
        }
        if certificates.is_empty() {
            return Err(Error::AssemblyFailed(
                "no server certificate in an empty chain".to_string(),
            ));
        }
        if roles != classify(&certificates)? {
            return Err(Error::AssemblyFailed(
                "classification does not match the chain".to_string(),
            ));
        }
        if roles.self_signed != (trusted == TrustStatus::SelfSigned) {
            return Err(Error::AssemblyFailed(format!(
                "trust status {} is inconsistent with the chain",
                trusted
            )));
        }

        Ok(Self {
            domain: domain.to_string(),
            certificates,
            roles,
            trusted,
            cipher,
            protocol,
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// All certificates, leaf first, in the order the peer presented them.
    pub fn certificates(&self) -> &[Certificate] {
        &self.certificates
    }

    pub fn server(&self) -> &Certificate {
        &self.certificates[self.roles.server]
    }

    pub fn intermediate_ca(&self) -> Option<&Certificate> {
        self.roles.intermediate_ca.map(|i| &self.certificates[i])
    }

    pub fn root_ca(&self) -> Option<&Certificate> {
        self.roles.root_ca.map(|i| &self.certificates[i])
    }

    /// Role assignment as indices into [`CertificateChain::certificates`].
    pub fn roles(&self) -> Classification {
        self.roles
    }

    pub fn role_of(&self, index: usize) -> CertRole {
        self.roles.role_of(index)
    }

    pub fn trusted(&self) -> TrustStatus {
        self.trusted
    }

    pub fn cipher(&self) -> CipherSuite {
        self.cipher
    }

    pub fn cipher_string(&self) -> String {
        self.cipher.to_string()
    }

    pub fn protocol(&self) -> ProtocolVersion {
        self.protocol
    }

    pub fn protocol_string(&self) -> String {
        self.protocol.to_string()
    }
}

fn decode_chain(raw: &[CertificateDer<'static>]) -> Result<Vec<Certificate>> {
    raw.iter()
        .enumerate()
        .map(|(idx, der)| {
            Certificate::from_der(der).map_err(|e| {
                Error::AssemblyFailed(format!("certificate {} could not be decoded: {}", idx, e))
            })
        })
        .collect()
}

/// Run `evaluator`, treating any failure as `Untrusted`.
pub fn evaluate_trust(
    evaluator: &dyn TrustEvaluator,
    domain: &str,
    chain: &[CertificateDer<'static>],
) -> TrustVerdict {
    match evaluator.evaluate(domain, chain) {
        Ok(verdict) => verdict,
        Err(e) => {
            warn!(domain, error = %e, "trust evaluation failed, treating chain as untrusted");
            TrustVerdict::Untrusted
        }
    }
}

/// Progress of a single lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupState {
    Pending,
    ProbeInFlight,
    ProbeFailed,
    Assembling,
    AssemblyFailed,
    Complete,
    Cancelled,
}

impl LookupState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LookupState::ProbeFailed
                | LookupState::AssemblyFailed
                | LookupState::Complete
                | LookupState::Cancelled
        )
    }
}

type Finished = Box<dyn FnOnce(Result<CertificateChain>) + Send>;

struct Inner {
    state: LookupState,
    finished: Option<Finished>,
}

/// One-shot completion latch. Whoever takes the callback first decides the
/// outcome; the callback is never invoked twice or after cancellation.
struct Completion {
    inner: Mutex<Inner>,
}

impl Completion {
    fn new(finished: Finished) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: LookupState::Pending,
                finished: Some(finished),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn transition(&self, state: LookupState) {
        let mut inner = self.lock();
        if inner.state.is_terminal() {
            return;
        }
        debug!(from = ?inner.state, to = ?state, "lookup state");
        inner.state = state;
    }

    fn fire(&self, result: Result<CertificateChain>) {
        let finished = {
            let mut inner = self.lock();
            let finished = inner.finished.take();
            if finished.is_some() && !inner.state.is_terminal() {
                // Only reachable for inputs rejected before probing.
                inner.state = LookupState::ProbeFailed;
            }
            finished
        };
        // Called outside the lock so the callback may inspect the handle.
        if let Some(finished) = finished {
            finished(result);
        }
    }

    /// Returns false if the callback had already been taken.
    fn cancel(&self) -> bool {
        let mut inner = self.lock();
        match inner.finished.take() {
            Some(_) => {
                inner.state = LookupState::Cancelled;
                true
            }
            None => false,
        }
    }
}

/// Handle to a lookup started with [`CertificateChain::lookup`].
pub struct LookupHandle {
    latch: Arc<Completion>,
    task: JoinHandle<()>,
}

impl LookupHandle {
    pub fn state(&self) -> LookupState {
        self.latch.lock().state
    }

    /// Abandon the lookup. Once this returns the callback will not be
    /// invoked, and the in-flight connection is closed. Returns false if
    /// the callback had already been invoked.
    pub fn cancel(&self) -> bool {
        let cancelled = self.latch.cancel();
        self.task.abort();
        if cancelled {
            debug!("lookup cancelled");
        }
        cancelled
    }

    /// Wait for the lookup task to finish. Returns false if it was
    /// cancelled or panicked, for instance inside the callback.
    pub async fn join(self) -> bool {
        match self.task.await {
            Ok(()) => true,
            Err(e) if e.is_cancelled() => {
                debug!("joined a cancelled lookup");
                false
            }
            Err(e) => {
                error!(error = %e, "lookup task panicked");
                false
            }
        }
    }
}

impl std::fmt::Debug for LookupHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupHandle")
            .field("state", &self.state())
            .finish()
    }
}
