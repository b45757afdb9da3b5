//! TLS trust configuration.
//!
//! A join attempt makes exactly one trust decision and the resulting
//! [`TlsTrust`] captures it: either accept any server certificate (the
//! caller explicitly opted into MITM exposure) or trust exactly one CA
//! certificate and nothing else. [`client_config`] turns that decision into
//! a `rustls::ClientConfig`, optionally restricted to a caller-supplied
//! cipher-suite list.

use std::sync::Arc;

use palisade_core::{JoinError, Result};
use ring::digest::{digest, SHA256};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};

/// A parsed CA certificate with the attributes trust decisions need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaCertificate {
    der: Vec<u8>,
    subject_cn: String,
    spki_sha256: String,
}

impl CaCertificate {
    /// Parse the first CERTIFICATE block out of a PEM document.
    pub fn from_pem(pem_bytes: &[u8]) -> Result<Self> {
        let blocks = pem::parse_many(pem_bytes)
            .map_err(|e| JoinError::trust(format!("CA certificate is not valid PEM: {e}")))?;
        let block = blocks
            .iter()
            .find(|p| p.tag() == "CERTIFICATE")
            .ok_or_else(|| JoinError::trust("CA PEM has no CERTIFICATE block"))?;
        Self::from_der(block.contents())
    }

    /// Parse a DER-encoded X.509 certificate.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (_, cert) = x509_parser::parse_x509_certificate(der)
            .map_err(|e| JoinError::trust(format!("malformed CA certificate: {e}")))?;

        let subject_cn = cert
            .subject()
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .unwrap_or("<no common name>")
            .to_string();
        let spki_sha256 = hex::encode(digest(&SHA256, cert.public_key().raw));

        Ok(Self {
            der: der.to_vec(),
            subject_cn,
            spki_sha256,
        })
    }

    /// DER bytes of the certificate.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Subject common name, for log lines.
    pub fn subject_common_name(&self) -> &str {
        &self.subject_cn
    }

    /// Lowercase hex SHA-256 of the SubjectPublicKeyInfo.
    pub fn spki_sha256(&self) -> &str {
        &self.spki_sha256
    }

    /// The pin string this certificate would satisfy.
    pub fn spki_fingerprint(&self) -> String {
        format!("sha256:{}", self.spki_sha256)
    }
}

/// A caller-supplied SPKI pin in `sha256:<hex>` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaPin {
    hex: String,
}

impl CaPin {
    /// Parse and normalize a pin string.
    pub fn parse(pin: &str) -> Result<Self> {
        let rest = pin.strip_prefix("sha256:").ok_or_else(|| {
            JoinError::configuration(format!("CA pin must look like sha256:<hex>, got {pin:?}"))
        })?;
        if rest.len() != 64 || !rest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(JoinError::configuration(format!(
                "CA pin digest must be 64 hex characters, got {rest:?}"
            )));
        }
        Ok(Self {
            hex: rest.to_ascii_lowercase(),
        })
    }

    /// Check a fetched CA certificate against this pin.
    ///
    /// A mismatch is a hard trust failure; the certificate must not be used
    /// for anything afterwards.
    pub fn verify(&self, cert: &CaCertificate) -> Result<()> {
        if cert.spki_sha256() == self.hex {
            Ok(())
        } else {
            Err(JoinError::trust(format!(
                "CA pin mismatch: expected sha256:{}, cluster CA has {}",
                self.hex,
                cert.spki_fingerprint()
            )))
        }
    }
}

/// The single trust decision a transport client is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsTrust {
    /// Accept any server certificate. Only reachable through the explicit
    /// insecure flag or the pin strategy's unauthenticated first phase.
    AcceptAny,
    /// Trust exactly this CA certificate; the built-in roots are not used.
    Exclusive(CaCertificate),
}

/// Build a `rustls::ClientConfig` for one trust decision.
///
/// `cipher_suites` restricts the provider's suites by name (for example
/// `TLS13_AES_128_GCM_SHA256`); an empty list keeps the provider defaults.
pub fn client_config(trust: &TlsTrust, cipher_suites: &[String]) -> Result<ClientConfig> {
    let provider = provider_with_suites(cipher_suites)?;
    let builder = ClientConfig::builder_with_provider(Arc::new(provider))
        .with_safe_default_protocol_versions()
        .map_err(|e| JoinError::configuration(format!("TLS protocol versions: {e}")))?;

    let config = match trust {
        TlsTrust::AcceptAny => builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert))
            .with_no_client_auth(),
        TlsTrust::Exclusive(ca) => {
            let mut roots = RootCertStore::empty();
            roots
                .add(CertificateDer::from(ca.der().to_vec()))
                .map_err(|e| JoinError::trust(format!("CA rejected by trust store: {e}")))?;
            builder.with_root_certificates(roots).with_no_client_auth()
        }
    };

    Ok(config)
}

/// Ring provider, optionally filtered to the named cipher suites.
fn provider_with_suites(names: &[String]) -> Result<CryptoProvider> {
    let mut provider = rustls::crypto::ring::default_provider();
    if names.is_empty() {
        return Ok(provider);
    }

    let wanted: Vec<String> = names.iter().map(|n| n.to_ascii_uppercase()).collect();
    provider
        .cipher_suites
        .retain(|s| wanted.contains(&format!("{:?}", s.suite())));
    if provider.cipher_suites.is_empty() {
        return Err(JoinError::configuration(format!(
            "no supported TLS cipher suites match {names:?}"
        )));
    }
    Ok(provider)
}

/// Verifier that accepts every server certificate.
///
/// The TLS handshake signature is still checked so the peer at least holds
/// the key for whatever certificate it presented.
#[derive(Debug)]
struct AcceptAnyServerCert;

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &rustls::crypto::ring::default_provider().signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &rustls::crypto::ring::default_provider().signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}
