//! Turning a trust decision into a transport client.
//!
//! [`Connector`] is the seam between the join protocol and the network: the
//! protocol decides *what* to trust, the connector produces a client bound
//! to that decision. Tests swap in a fake connector; production uses
//! [`HttpConnector`].

use std::time::Duration;

use async_trait::async_trait;
use palisade_core::{JoinError, Result};

use crate::client::AuthClient;
use crate::http::HttpAuthClient;
use crate::tls::{client_config, TlsTrust};

/// Default request timeout for authority calls
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Produces a transport client bound to one trust decision.
#[async_trait]
pub trait Connector: Send + Sync {
    /// The client type this connector produces.
    type Client: AuthClient;

    /// Build a client for the given auth servers, trusting exactly what
    /// `trust` says and nothing more.
    async fn connect(
        &self,
        servers: &[String],
        trust: TlsTrust,
        cipher_suites: &[String],
    ) -> Result<Self::Client>;
}

/// Real connector: HTTPS via reqwest with a preconfigured rustls trust
/// decision.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    timeout: Duration,
}

impl HttpConnector {
    /// Create a connector with the default timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for HttpConnector {
    type Client = HttpAuthClient;

    async fn connect(
        &self,
        servers: &[String],
        trust: TlsTrust,
        cipher_suites: &[String],
    ) -> Result<Self::Client> {
        if servers.is_empty() {
            return Err(JoinError::configuration(
                "at least one auth server address is required",
            ));
        }

        let tls = client_config(&trust, cipher_suites)?;
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .use_preconfigured_tls(tls)
            .build()
            .map_err(|e| JoinError::configuration(format!("building HTTP client: {e}")))?;

        Ok(HttpAuthClient::new(http, servers.to_vec()))
    }
}
