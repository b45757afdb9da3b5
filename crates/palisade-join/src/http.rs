//! HTTPS implementation of the authority client.

use async_trait::async_trait;
use palisade_core::{CertificateBundle, JoinError, Result};
use tracing::debug;
use url::Url;

use crate::client::{AuthClient, LocalCa, RegisterUsingTokenRequest};

/// Unauthenticated endpoint returning the cluster's root CA
const CA_PATH: &str = "/v1/ca";

/// Token-authorized issuance endpoint
const REGISTER_PATH: &str = "/v1/tokens/register";

/// Authority client over HTTPS.
///
/// Holds a reqwest client whose TLS trust was fixed at construction time by
/// [`HttpConnector`](crate::HttpConnector). Servers are tried in order;
/// transport failures move on to the next address, while any HTTP response
/// is treated as authoritative.
#[derive(Debug)]
pub struct HttpAuthClient {
    http: reqwest::Client,
    servers: Vec<String>,
}

impl HttpAuthClient {
    /// Wrap a preconfigured HTTP client and server address list.
    #[must_use]
    pub fn new(http: reqwest::Client, servers: Vec<String>) -> Self {
        Self { http, servers }
    }

    fn endpoint(&self, server: &str, path: &str) -> Result<Url> {
        Url::parse(server)
            .and_then(|u| u.join(path))
            .map_err(|e| {
                JoinError::configuration(format!("invalid auth server address {server:?}: {e}"))
            })
    }
}

#[async_trait]
impl AuthClient for HttpAuthClient {
    async fn fetch_local_ca(&self) -> Result<LocalCa> {
        let mut last_err: Option<JoinError> = None;

        for server in &self.servers {
            let url = self.endpoint(server, CA_PATH)?;
            debug!(url = %url, "fetching cluster CA");

            match self.http.get(url).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if !status.is_success() {
                        return Err(JoinError::connection(
                            server,
                            format!("CA fetch returned HTTP {status}"),
                        ));
                    }
                    return resp
                        .json::<LocalCa>()
                        .await
                        .map_err(|e| JoinError::connection(server, e));
                }
                Err(e) => {
                    debug!(server = %server, error = %e, "auth server unreachable, trying next");
                    last_err = Some(JoinError::connection(server, e));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            JoinError::configuration("at least one auth server address is required")
        }))
    }

    async fn register_with_token(
        &self,
        req: RegisterUsingTokenRequest,
    ) -> Result<CertificateBundle> {
        let mut last_err: Option<JoinError> = None;

        for server in &self.servers {
            let url = self.endpoint(server, REGISTER_PATH)?;
            debug!(url = %url, host_id = %req.host_id, "requesting certificates");

            match self.http.post(url).json(&req).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return resp
                            .json::<CertificateBundle>()
                            .await
                            .map_err(|e| JoinError::connection(server, e));
                    }
                    let body = resp.text().await.unwrap_or_default();
                    let message = serde_json::from_str::<serde_json::Value>(&body)
                        .ok()
                        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
                        .unwrap_or(body);
                    return Err(JoinError::ServerRejected {
                        status: status.as_u16(),
                        message,
                    });
                }
                Err(e) => {
                    debug!(server = %server, error = %e, "auth server unreachable, trying next");
                    last_err = Some(JoinError::connection(server, e));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            JoinError::configuration("at least one auth server address is required")
        }))
    }

    async fn close(&self) {
        // Dropping the client tears down the connection pool; nothing to
        // flush at this layer.
        debug!("closing auth client");
    }
}
