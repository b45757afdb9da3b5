//! Join token handling.
//!
//! A token is supplied either literally ("abc123") or as an absolute path to
//! a file holding it ("/var/lib/palisade/token"). The form is decided once,
//! when the caller's configuration is parsed, not re-derived on each use.

use std::path::PathBuf;

use crate::error::{JoinError, Result};

/// A join credential in its configured form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinToken {
    /// The token value itself
    Literal(String),
    /// An absolute path to a file holding the token
    File(PathBuf),
}

impl JoinToken {
    /// Classify a configured token string.
    ///
    /// A leading `/` marks a file reference; anything else is the token
    /// value itself.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.starts_with('/') {
            Self::File(PathBuf::from(value))
        } else {
            Self::Literal(value.to_string())
        }
    }

    /// Produce the token value to present to the authority.
    ///
    /// File contents are trimmed of surrounding whitespace, since tokens
    /// written to disk tend to carry a trailing newline. An unreadable token
    /// file is an error naming the path; a misconfigured path must not
    /// degrade into an empty token that the authority rejects opaquely.
    pub async fn resolve(&self) -> Result<String> {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::File(path) => {
                let contents = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| JoinError::token_file(path, &e))?;
                Ok(contents.trim().to_string())
            }
        }
    }
}
