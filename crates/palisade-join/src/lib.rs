//! Cluster join and certificate rotation protocols for palisade.
//!
//! A node (SSH server, proxy, or auth server) uses this crate to obtain a
//! signed identity from the cluster authority and to rotate it later:
//!
//! - [`register`] — first-time join over the network, authorized by a join
//!   token, with trust in the authority bootstrapped by exactly one of
//!   three strategies (insecure, SPKI pin, provisioned CA file)
//! - [`re_register`] — certificate rotation over an already-authenticated
//!   channel; no token, no trust bootstrap
//! - [`local_register`] — in-process issuance when the node and authority
//!   share a trust domain
//!
//! # Example
//!
//! ```rust,ignore
//! use palisade_join::{register, HttpConnector, RegisterParams};
//!
//! let connector = HttpConnector::new();
//! let identity = register(&connector, params).await?;
//! ```
//!
//! The authority is consumed through the [`AuthClient`] and
//! [`CertificateIssuer`] traits, so a real transport and a test double are
//! interchangeable. Retry and backoff are deliberately left to the caller;
//! every operation is a single attempt.

mod client;
mod connector;
mod http;
mod register;
mod tls;
mod trust;

#[cfg(test)]
mod testing;

pub use client::{
    AuthClient, CertificateIssuer, GenerateServerKeysRequest, LocalCa, RegisterUsingTokenRequest,
};
pub use connector::{Connector, HttpConnector};
pub use http::HttpAuthClient;
pub use register::{local_register, re_register, register, RegisterParams, ReRegisterParams};
pub use tls::{client_config, CaCertificate, CaPin, TlsTrust};
pub use trust::TrustStrategy;

pub use palisade_core::{
    CertificateBundle, Identity, IdentityId, JoinError, JoinToken, Result, Role,
};
