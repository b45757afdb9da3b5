//! Capability traits for talking to the cluster authority.
//!
//! The protocols never depend on a concrete transport: a real HTTPS client
//! and a test double are interchangeable behind [`AuthClient`], and the
//! rotation/local paths only require [`CertificateIssuer`].

use async_trait::async_trait;
use palisade_core::{base64_bytes, base64_bytes_opt, CertificateBundle, Result, Role};
use serde::{Deserialize, Serialize};

/// The authority's root CA as returned by the unauthenticated CA endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalCa {
    /// PEM-encoded TLS CA certificate
    #[serde(rename = "tls_ca", with = "base64_bytes")]
    pub tls_ca: Vec<u8>,
}

/// Token-authorized issuance request for a first-time join.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUsingTokenRequest {
    /// Join token proving the request was authorized
    pub token: String,
    /// Host UUID of the joining member
    pub host_id: String,
    /// Node name of the joining member
    pub node_name: String,
    /// Role the certificates are scoped to
    pub role: Role,
    /// Extra SSH principals to include in the host certificate
    pub additional_principals: Vec<String>,
    /// Public TLS key to sign; the private half never leaves the caller
    #[serde(with = "base64_bytes")]
    pub public_tls_key: Vec<u8>,
    /// Public SSH key to sign
    #[serde(with = "base64_bytes")]
    pub public_ssh_key: Vec<u8>,
}

/// Issuance request over an already-trusted channel (rotation or local).
///
/// When the public keys are absent the authority generates the key pair and
/// returns the private key inside the bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateServerKeysRequest {
    /// Host UUID of the member
    pub host_id: String,
    /// Node name of the member
    pub node_name: String,
    /// Roles the certificates are scoped to
    pub roles: Vec<Role>,
    /// Extra SSH principals to include in the host certificate
    pub additional_principals: Vec<String>,
    /// Public TLS key to sign, if the caller holds its own key pair
    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_bytes_opt")]
    pub public_tls_key: Option<Vec<u8>>,
    /// Public SSH key to sign, if the caller holds its own key pair
    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_bytes_opt")]
    pub public_ssh_key: Option<Vec<u8>>,
}

/// What a join attempt consumes from the authority's transport client.
///
/// A client is bound to exactly one trust decision for its whole lifetime
/// and must be closed exactly once on every exit path.
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Fetch the authority's claimed root CA. Callable without any prior
    /// authentication; nothing returned here is trusted until verified.
    async fn fetch_local_ca(&self) -> Result<LocalCa>;

    /// Present a join token and request certificates.
    async fn register_with_token(
        &self,
        req: RegisterUsingTokenRequest,
    ) -> Result<CertificateBundle>;

    /// Deterministic channel teardown.
    async fn close(&self);
}

/// Issues certificates over a channel whose trust is already established:
/// an authenticated client during rotation, or the authority itself on the
/// in-process local path.
#[async_trait]
pub trait CertificateIssuer: Send + Sync {
    /// Request a fresh certificate bundle for the given host identity.
    async fn generate_server_keys(
        &self,
        req: GenerateServerKeysRequest,
    ) -> Result<CertificateBundle>;
}
