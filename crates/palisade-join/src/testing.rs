//! Shared test doubles: an in-memory connector and authority that count
//! every call and close so the protocol tests can assert resource
//! discipline.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use palisade_core::{CertificateBundle, IdentityId, JoinError, JoinToken, Result, Role};

use crate::client::{
    AuthClient, CertificateIssuer, GenerateServerKeysRequest, LocalCa, RegisterUsingTokenRequest,
};
use crate::connector::Connector;
use crate::register::RegisterParams;
use crate::tls::TlsTrust;

/// Self-signed certificate PEM with the given common name.
pub(crate) fn ca_pem(cn: &str) -> Vec<u8> {
    let mut params = rcgen::CertificateParams::default();
    params
        .distinguished_name
        .push(rcgen::DnType::CommonName, cn);
    let key = rcgen::KeyPair::generate().unwrap();
    params.self_signed(&key).unwrap().pem().into_bytes()
}

/// A bundle that passes identity assembly.
pub(crate) fn issued_bundle() -> CertificateBundle {
    CertificateBundle {
        key: None,
        ssh_cert: b"ssh-host-cert".to_vec(),
        tls_cert: ca_pem("node-1.example.com"),
        tls_ca_certs: vec![ca_pem("Cluster CA")],
    }
}

/// Register parameters with no trust strategy selected.
pub(crate) fn test_params() -> RegisterParams {
    RegisterParams {
        data_dir: "/var/lib/palisade".into(),
        token: JoinToken::Literal("t1".to_string()),
        id: IdentityId::new("2c19b1c5-60aa-4a35-a2d8-fb08ae3a5b9e", "node-1", Role::Node),
        servers: vec!["https://auth.example.com:3025".to_string()],
        additional_principals: vec!["node-1.internal".to_string()],
        private_key: b"key-pem".to_vec(),
        public_tls_key: b"tls-pub".to_vec(),
        public_ssh_key: b"ssh-pub".to_vec(),
        cipher_suites: vec![],
        ca_path: None,
        ca_pin: None,
        insecure_skip_ca_verification: false,
    }
}

/// What the fake authority answers to an issuance request.
#[derive(Debug, Clone)]
pub(crate) enum RegisterResponse {
    Bundle(CertificateBundle),
    Reject(u16, String),
}

impl RegisterResponse {
    pub(crate) fn bundle(bundle: CertificateBundle) -> Self {
        Self::Bundle(bundle)
    }

    pub(crate) fn reject(status: u16, message: &str) -> Self {
        Self::Reject(status, message.to_string())
    }
}

impl Default for RegisterResponse {
    fn default() -> Self {
        Self::Bundle(issued_bundle())
    }
}

#[derive(Debug, Default)]
struct Shared {
    fetches: AtomicUsize,
    registers: AtomicUsize,
    seen: Mutex<Option<RegisterUsingTokenRequest>>,
}

/// In-memory [`AuthClient`] with per-instance close accounting.
#[derive(Debug)]
pub(crate) struct FakeAuthClient {
    shared: Arc<Shared>,
    closes: Arc<AtomicUsize>,
    ca: Vec<u8>,
    response: RegisterResponse,
    fail_fetch: bool,
}

#[async_trait]
impl AuthClient for FakeAuthClient {
    async fn fetch_local_ca(&self) -> Result<LocalCa> {
        self.shared.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch {
            return Err(JoinError::connection(
                "https://auth.example.com:3025",
                "connection reset",
            ));
        }
        Ok(LocalCa {
            tls_ca: self.ca.clone(),
        })
    }

    async fn register_with_token(
        &self,
        req: RegisterUsingTokenRequest,
    ) -> Result<CertificateBundle> {
        self.shared.registers.fetch_add(1, Ordering::SeqCst);
        *self.shared.seen.lock().unwrap() = Some(req);
        match &self.response {
            RegisterResponse::Bundle(bundle) => Ok(bundle.clone()),
            RegisterResponse::Reject(status, message) => Err(JoinError::ServerRejected {
                status: *status,
                message: message.clone(),
            }),
        }
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory [`Connector`] that records every trust decision it is handed
/// and every client it creates.
pub(crate) struct FakeConnector {
    ca: Vec<u8>,
    response: RegisterResponse,
    fail_fetch: bool,
    shared: Arc<Shared>,
    trusts: Mutex<Vec<TlsTrust>>,
    closes: Mutex<Vec<Arc<AtomicUsize>>>,
}

impl FakeConnector {
    pub(crate) fn new(ca: Vec<u8>, response: RegisterResponse) -> Self {
        Self {
            ca,
            response,
            fail_fetch: false,
            shared: Arc::new(Shared::default()),
            trusts: Mutex::new(Vec::new()),
            closes: Mutex::new(Vec::new()),
        }
    }

    /// Make every phase-1 CA fetch fail at the transport level.
    pub(crate) fn fail_fetch(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    pub(crate) fn connects(&self) -> usize {
        self.trusts.lock().unwrap().len()
    }

    pub(crate) fn trusts(&self) -> Vec<TlsTrust> {
        self.trusts.lock().unwrap().clone()
    }

    pub(crate) fn fetches(&self) -> usize {
        self.shared.fetches.load(Ordering::SeqCst)
    }

    pub(crate) fn registers(&self) -> usize {
        self.shared.registers.load(Ordering::SeqCst)
    }

    pub(crate) fn seen_register(&self) -> Option<RegisterUsingTokenRequest> {
        self.shared.seen.lock().unwrap().clone()
    }

    /// Every client this connector ever produced was closed exactly once.
    pub(crate) fn assert_all_closed_once(&self) {
        for (i, closes) in self.closes.lock().unwrap().iter().enumerate() {
            assert_eq!(
                closes.load(Ordering::SeqCst),
                1,
                "client {i} close count"
            );
        }
    }
}

#[async_trait]
impl Connector for FakeConnector {
    type Client = FakeAuthClient;

    async fn connect(
        &self,
        _servers: &[String],
        trust: TlsTrust,
        _cipher_suites: &[String],
    ) -> Result<Self::Client> {
        self.trusts.lock().unwrap().push(trust);
        let closes = Arc::new(AtomicUsize::new(0));
        self.closes.lock().unwrap().push(Arc::clone(&closes));
        Ok(FakeAuthClient {
            shared: Arc::clone(&self.shared),
            closes,
            ca: self.ca.clone(),
            response: self.response.clone(),
            fail_fetch: self.fail_fetch,
        })
    }
}

/// In-memory [`CertificateIssuer`] for rotation and local issuance tests.
pub(crate) struct FakeIssuer {
    bundle: CertificateBundle,
    calls: AtomicUsize,
    seen: Mutex<Option<GenerateServerKeysRequest>>,
}

impl FakeIssuer {
    pub(crate) fn new(bundle: CertificateBundle) -> Self {
        Self {
            bundle,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(None),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn seen(&self) -> Option<GenerateServerKeysRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl CertificateIssuer for FakeIssuer {
    async fn generate_server_keys(
        &self,
        req: GenerateServerKeysRequest,
    ) -> Result<CertificateBundle> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.seen.lock().unwrap() = Some(req);
        Ok(self.bundle.clone())
    }
}
