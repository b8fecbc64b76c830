//! Push gateway client.
//!
//! The gateway accepts a JSON array of up to 100 messages and answers with
//! one ticket per message, in request order: `{"data": [{"status": "ok", "id": ...}, ...]}`.

use crate::error::GatewayError;
use async_trait::async_trait;
use casa_core::constants::PUSH_GATEWAY_BATCH_LIMIT;
use casa_core::models::{PushMessage, PushTicket};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Whether `token` is a device token the push gateway accepts.
pub fn is_push_token(token: &str) -> bool {
    (token.starts_with("ExponentPushToken[") || token.starts_with("ExpoPushToken["))
        && token.ends_with(']')
        && !token.ends_with("[]")
}

#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Send one batch. Tickets are returned in message order.
    async fn send_batch(&self, messages: &[PushMessage]) -> Result<Vec<PushTicket>, GatewayError>;
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    data: Option<Vec<PushTicket>>,
    #[serde(default)]
    errors: Option<serde_json::Value>,
}

#[derive(Clone)]
pub struct ExpoPushGateway {
    client: Client,
    url: String,
    access_token: Option<String>,
}

impl ExpoPushGateway {
    pub fn new(
        url: String,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url,
            access_token,
        })
    }
}

#[async_trait]
impl PushGateway for ExpoPushGateway {
    async fn send_batch(&self, messages: &[PushMessage]) -> Result<Vec<PushTicket>, GatewayError> {
        if messages.len() > PUSH_GATEWAY_BATCH_LIMIT {
            return Err(GatewayError::BatchTooLarge {
                size: messages.len(),
                limit: PUSH_GATEWAY_BATCH_LIMIT,
            });
        }

        let mut request = self
            .client
            .post(&self.url)
            .header("Accept", "application/json")
            .json(messages);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let start = std::time::Instant::now();
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SendResponse = serde_json::from_str(&body)
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        match (parsed.data, parsed.errors) {
            (Some(tickets), _) => {
                tracing::debug!(
                    messages = messages.len(),
                    tickets = tickets.len(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Push batch sent"
                );
                Ok(tickets)
            }
            (None, Some(errors)) => Err(GatewayError::InvalidResponse(errors.to_string())),
            (None, None) => Err(GatewayError::InvalidResponse(
                "response has neither data nor errors".to_string(),
            )),
        }
    }
}
