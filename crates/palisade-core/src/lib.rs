//! Core types and errors for palisade cluster enrollment.
//!
//! This crate provides the foundational pieces shared by the enrollment
//! protocols in `palisade-join`:
//!
//! - **Errors**: the [`JoinError`] taxonomy covering every way a join or
//!   rotation attempt can fail
//! - **Identity**: [`IdentityId`] naming a cluster member and [`Identity`],
//!   the materialized credential set (private key + signed certificates)
//! - **Bundle**: [`CertificateBundle`], the authority's issuance response
//! - **Token**: [`JoinToken`], a join credential given literally or via a
//!   file on disk
//!
//! # Example
//!
//! ```rust,ignore
//! use palisade_core::{IdentityId, JoinToken, Role};
//!
//! let id = IdentityId::new("b3a0cbd1-…", "node-1", Role::Node);
//! let token = JoinToken::parse("/var/lib/palisade/token");
//! ```

mod bundle;
mod error;
mod identity;
mod token;

pub use bundle::{base64_bytes, base64_bytes_opt, base64_bytes_vec, CertificateBundle};
pub use error::{JoinError, Result};
pub use identity::{Identity, IdentityId, Role};
pub use token::JoinToken;
