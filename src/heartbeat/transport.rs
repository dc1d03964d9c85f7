//! Heartbeat wire format and the HTTP transport that delivers it.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::config::HeartbeatConfig;
use crate::error::{BeaconError, Result};

/// Header carrying the installation identity.
pub const PLAYER_ID_HEADER: &str = "X-Player-ID";

/// JSON body of a heartbeat: `{"modpack":"<name>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatPayload {
    pub modpack: String,
}

/// One heartbeat: the body plus the identity header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatRequest {
    /// Value of the `X-Player-ID` header.
    pub player_id: String,
    /// Request body.
    pub payload: HeartbeatPayload,
}

impl HeartbeatRequest {
    /// Build a request for `player_id` reporting `modpack`.
    pub fn new(player_id: &str, modpack: &str) -> Self {
        Self {
            player_id: player_id.to_string(),
            payload: HeartbeatPayload {
                modpack: modpack.to_string(),
            },
        }
    }
}

/// Status and raw body of the collection service's reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    /// Any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Delivers heartbeat requests.
///
/// Non-2xx replies are `Ok`; `Err` is reserved for requests that produced no
/// reply at all.
#[async_trait]
pub trait HeartbeatTransport: Send + Sync {
    /// POST one heartbeat.
    async fn post(&self, request: &HeartbeatRequest) -> Result<TransportResponse>;
}

/// `reqwest`-backed transport. One client is reused for every send.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    endpoint: Url,
}

impl ReqwestTransport {
    /// Build a transport with the config's timeout and user agent.
    pub fn new(config: &HeartbeatConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.as_str())
            .build()?;
        Self::with_client(config, client)
    }

    /// Build a transport around a client the host already owns.
    pub fn with_client(config: &HeartbeatConfig, client: Client) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            BeaconError::Config(format!("Invalid endpoint '{}': {}", config.endpoint, e))
        })?;
        Ok(Self { client, endpoint })
    }

    /// Target URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl HeartbeatTransport for ReqwestTransport {
    async fn post(&self, request: &HeartbeatRequest) -> Result<TransportResponse> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(PLAYER_ID_HEADER, &request.player_id)
            .json(&request.payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(TransportResponse { status, body })
    }
}
