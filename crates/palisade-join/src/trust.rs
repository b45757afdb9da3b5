//! Trust-bootstrap strategies.
//!
//! Before a node can ask the cluster authority for certificates it has to
//! decide why it believes it is talking to the genuine authority. Exactly
//! one strategy is active per join attempt, selected with a fixed
//! precedence: insecure flag, then CA pin, then CA path. The precedence is
//! a contract; changing it silently downgrades callers' security.

use std::path::{Path, PathBuf};

use palisade_core::{JoinError, Result};
use tracing::{info, warn};

use crate::client::AuthClient;
use crate::connector::Connector;
use crate::register::RegisterParams;
use crate::tls::{CaCertificate, CaPin, TlsTrust};

/// How this join attempt establishes trust in the authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustStrategy {
    /// Accept any server certificate; caller explicitly accepted MITM
    /// exposure
    Insecure,
    /// Verify the authority's CA against an out-of-band SPKI pin
    Pin(CaPin),
    /// Trust a CA certificate provisioned on local disk
    Path(PathBuf),
}

impl TrustStrategy {
    /// Select the strategy for these parameters. First match wins:
    /// insecure flag, then a non-empty pin, then a CA path.
    pub fn select(params: &RegisterParams) -> Result<Self> {
        if params.insecure_skip_ca_verification {
            return Ok(Self::Insecure);
        }
        if let Some(pin) = params.ca_pin.as_deref() {
            if !pin.is_empty() {
                return CaPin::parse(pin).map(Self::Pin);
            }
        }
        if let Some(path) = &params.ca_path {
            return Ok(Self::Path(path.clone()));
        }
        Err(JoinError::configuration(
            "to join the cluster, one of CA pin, CA path, or insecure mode is required",
        ))
    }

    /// Produce a client bound to this strategy's trust decision.
    pub async fn establish<C: Connector>(
        &self,
        connector: &C,
        params: &RegisterParams,
    ) -> Result<C::Client> {
        match self {
            Self::Insecure => insecure_client(connector, params).await,
            Self::Pin(pin) => pin_client(connector, params, pin).await,
            Self::Path(path) => path_client(connector, params, path).await,
        }
    }
}

/// Connect without validating the server certificate at all.
async fn insecure_client<C: Connector>(
    connector: &C,
    params: &RegisterParams,
) -> Result<C::Client> {
    warn!(
        "joining cluster with insecure CA verification; an attacker with \
         privileged network access can man-in-the-middle this connection"
    );
    connector
        .connect(&params.servers, TlsTrust::AcceptAny, &params.cipher_suites)
        .await
}

/// Two-phase pin bootstrap.
///
/// Phase 1 fetches the authority's claimed CA over an unauthenticated
/// connection. Nothing from that connection is trusted until the CA's SPKI
/// fingerprint matches the caller's pin; a MITM on phase 1 only hands us a
/// certificate that fails the check. Phase 2 is a fresh connection trusting
/// exactly the verified CA.
async fn pin_client<C: Connector>(
    connector: &C,
    params: &RegisterParams,
    pin: &CaPin,
) -> Result<C::Client> {
    let probe = connector
        .connect(&params.servers, TlsTrust::AcceptAny, &params.cipher_suites)
        .await?;
    let fetched = probe.fetch_local_ca().await;
    probe.close().await;

    let ca = CaCertificate::from_pem(&fetched?.tls_ca)?;
    pin.verify(&ca)?;

    info!(
        cluster = %ca.subject_common_name(),
        "joining cluster with CA pin"
    );

    connector
        .connect(
            &params.servers,
            TlsTrust::Exclusive(ca),
            &params.cipher_suites,
        )
        .await
}

/// Trust a CA certificate provisioned out-of-band on local disk.
async fn path_client<C: Connector>(
    connector: &C,
    params: &RegisterParams,
    path: &Path,
) -> Result<C::Client> {
    let pem_bytes = tokio::fs::read(path).await.map_err(|e| {
        JoinError::trust(format!("reading CA certificate at {}: {e}", path.display()))
    })?;
    let ca = CaCertificate::from_pem(&pem_bytes).map_err(|e| match e {
        JoinError::TrustVerification { reason } => {
            JoinError::trust(format!("CA certificate at {}: {reason}", path.display()))
        }
        other => other,
    })?;

    info!(
        cluster = %ca.subject_common_name(),
        "joining cluster with CA file"
    );

    connector
        .connect(
            &params.servers,
            TlsTrust::Exclusive(ca),
            &params.cipher_suites,
        )
        .await
}
