use std::path::Path;

use thiserror::Error;

/// Result type alias for enrollment operations
pub type Result<T> = std::result::Result<T, JoinError>;

/// Errors that can occur while joining a cluster or rotating credentials
#[derive(Error, Debug)]
pub enum JoinError {
    /// Caller-supplied parameters are unusable before any network activity
    #[error("configuration error: {reason}")]
    Configuration {
        /// What was wrong with the parameters
        reason: String,
    },

    /// The issuing authority could not be verified as genuine
    #[error("trust verification failed: {reason}")]
    TrustVerification {
        /// Why verification failed (pin mismatch details, parse failure, path)
        reason: String,
    },

    /// Dialing or talking to an auth server failed at the transport level
    #[error("connection to {addr} failed: {reason}")]
    Connection {
        /// Server address the failure applies to
        addr: String,
        /// Underlying transport error
        reason: String,
    },

    /// The join token could not be read or was malformed
    #[error("token error: {reason}")]
    Token {
        /// What went wrong, including the offending path for file tokens
        reason: String,
    },

    /// The authority declined to issue certificates
    #[error("server rejected issuance ({status}): {message}")]
    ServerRejected {
        /// HTTP status code returned by the authority
        status: u16,
        /// Error message from the authority
        message: String,
    },

    /// The returned certificate bundle could not be turned into an identity
    #[error("identity assembly failed: {reason}")]
    IdentityAssembly {
        /// Which part of the bundle was malformed or missing
        reason: String,
    },
}

impl JoinError {
    /// Build a `Configuration` error.
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Build a `TrustVerification` error.
    pub fn trust(reason: impl Into<String>) -> Self {
        Self::TrustVerification {
            reason: reason.into(),
        }
    }

    /// Build an `IdentityAssembly` error.
    pub fn assembly(reason: impl Into<String>) -> Self {
        Self::IdentityAssembly {
            reason: reason.into(),
        }
    }

    /// Build a `Token` error for an unreadable token file.
    pub fn token_file(path: &Path, err: &std::io::Error) -> Self {
        Self::Token {
            reason: format!("reading token file {}: {err}", path.display()),
        }
    }

    /// Build a `Connection` error for a transport failure against one server.
    pub fn connection(addr: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Connection {
            addr: addr.into(),
            reason: err.to_string(),
        }
    }

    /// Returns true if retrying the whole attempt later could succeed.
    ///
    /// The protocols never retry internally; this guides the caller's own
    /// rotation or startup schedule.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// Returns true if the failure happened before anything was trusted.
    #[must_use]
    pub const fn is_trust_failure(&self) -> bool {
        matches!(self, Self::TrustVerification { .. })
    }
}
