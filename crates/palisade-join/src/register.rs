//! Join, rotation, and local issuance.
//!
//! Three ways a node obtains its identity:
//!
//! - [`register`] — first-time network join: prove possession of a join
//!   token over a freshly trust-bootstrapped channel
//! - [`re_register`] — rotation: the authenticated channel itself is the
//!   proof, no token involved
//! - [`local_register`] — the node and the authority share a process; no
//!   network, no token

use std::fmt;
use std::path::PathBuf;

use palisade_core::{CertificateBundle, Identity, IdentityId, JoinError, JoinToken, Result};

use crate::client::{
    AuthClient, CertificateIssuer, GenerateServerKeysRequest, RegisterUsingTokenRequest,
};
use crate::connector::Connector;
use crate::trust::TrustStrategy;

/// Parameters for a first-time join.
///
/// Request-scoped: consumed by one [`register`] call and discarded.
#[derive(Clone)]
pub struct RegisterParams {
    /// Data directory the caller stores cluster state in; threaded through
    /// to identity persistence, unused by the protocol itself
    pub data_dir: PathBuf,
    /// Join credential, literal or file-backed
    pub token: JoinToken,
    /// Who is joining
    pub id: IdentityId,
    /// Auth server addresses, tried in order
    pub servers: Vec<String>,
    /// Extra SSH principals to include in the host certificate
    pub additional_principals: Vec<String>,
    /// PEM private key; stays on this side of the wire
    pub private_key: Vec<u8>,
    /// Public TLS key for the authority to sign
    pub public_tls_key: Vec<u8>,
    /// Public SSH key for the authority to sign
    pub public_ssh_key: Vec<u8>,
    /// TLS cipher suites to allow, by name; empty means provider defaults
    pub cipher_suites: Vec<String>,
    /// Path to a provisioned CA certificate (path strategy)
    pub ca_path: Option<PathBuf>,
    /// SPKI pin of the cluster CA (pin strategy)
    pub ca_pin: Option<String>,
    /// Skip CA verification entirely (insecure strategy)
    pub insecure_skip_ca_verification: bool,
}

// Keep key material out of debug logs.
impl fmt::Debug for RegisterParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterParams")
            .field("data_dir", &self.data_dir)
            .field("id", &self.id)
            .field("servers", &self.servers)
            .field("additional_principals", &self.additional_principals)
            .field("private_key", &"<redacted>")
            .field("cipher_suites", &self.cipher_suites)
            .field("ca_path", &self.ca_path)
            .field("ca_pin", &self.ca_pin)
            .field(
                "insecure_skip_ca_verification",
                &self.insecure_skip_ca_verification,
            )
            .finish_non_exhaustive()
    }
}

/// Parameters for certificate rotation.
///
/// No token: the pre-authenticated client passed to [`re_register`] is the
/// proof of identity.
#[derive(Clone)]
pub struct ReRegisterParams {
    /// Identity being rotated; host identity stays the same
    pub id: IdentityId,
    /// Extra SSH principals to include in the host certificate
    pub additional_principals: Vec<String>,
    /// Fresh PEM private key; stays on this side of the wire
    pub private_key: Vec<u8>,
    /// Fresh public TLS key for the authority to sign
    pub public_tls_key: Vec<u8>,
    /// Fresh public SSH key for the authority to sign
    pub public_ssh_key: Vec<u8>,
}

impl fmt::Debug for ReRegisterParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReRegisterParams")
            .field("id", &self.id)
            .field("additional_principals", &self.additional_principals)
            .field("private_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// First-time join over the network.
///
/// Resolves the token, bootstraps trust in the authority via exactly one
/// strategy, presents the token for issuance, and assembles the identity
/// from the returned bundle plus the caller's private key. Any failing step
/// aborts the whole flow; the transport client is closed on every exit
/// path.
pub async fn register<C: Connector>(connector: &C, params: RegisterParams) -> Result<Identity> {
    // Token first: a misconfigured token must not cost a network roundtrip.
    let token = params.token.resolve().await?;

    let strategy = TrustStrategy::select(&params)?;
    let client = strategy.establish(connector, &params).await?;

    let issued = issue_certificates(&client, &params, token).await;
    client.close().await;
    let bundle = issued?;

    Identity::assemble(params.id, params.private_key, bundle)
}

async fn issue_certificates<A: AuthClient>(
    client: &A,
    params: &RegisterParams,
    token: String,
) -> Result<CertificateBundle> {
    client
        .register_with_token(RegisterUsingTokenRequest {
            token,
            host_id: params.id.host_uuid.clone(),
            node_name: params.id.node_name.clone(),
            role: params.id.role,
            additional_principals: params.additional_principals.clone(),
            public_tls_key: params.public_tls_key.clone(),
            public_ssh_key: params.public_ssh_key.clone(),
        })
        .await
}

/// Rotate certificates over an already-authenticated channel.
///
/// No trust bootstrap runs and no token is involved; the channel's existing
/// identity authorizes the request. The returned identity fully replaces
/// the previous one; persisting it is the caller's concern.
pub async fn re_register<I: CertificateIssuer>(
    client: &I,
    params: ReRegisterParams,
) -> Result<Identity> {
    let host_id = params.id.host_id()?;

    let bundle = client
        .generate_server_keys(GenerateServerKeysRequest {
            host_id: host_id.to_string(),
            node_name: params.id.node_name.clone(),
            roles: vec![params.id.role],
            additional_principals: params.additional_principals.clone(),
            public_tls_key: Some(params.public_tls_key.clone()),
            public_ssh_key: Some(params.public_ssh_key.clone()),
        })
        .await?;

    Identity::assemble(params.id, params.private_key, bundle)
}

/// Issue an identity from an authority in the same process.
///
/// Used when a cluster's first auth server bootstraps itself: no network,
/// no token. The authority generates the key pair, so the returned bundle
/// must carry the private key.
pub async fn local_register<A: CertificateIssuer>(
    authority: &A,
    id: IdentityId,
    additional_principals: Vec<String>,
) -> Result<Identity> {
    let bundle = authority
        .generate_server_keys(GenerateServerKeysRequest {
            host_id: id.host_uuid.clone(),
            node_name: id.node_name.clone(),
            roles: vec![id.role],
            additional_principals,
            public_tls_key: None,
            public_ssh_key: None,
        })
        .await?;

    let private_key = bundle.key.clone().ok_or_else(|| {
        JoinError::assembly("authority returned no private key for locally issued identity")
    })?;

    Identity::assemble(id, private_key, bundle)
}
