//! Push delivery through a JSON-over-HTTP gateway
//!
//! Each message is one POST:
//!
//! ```json
//! {"token": "...", "notification": {"title": "...", "body": "..."}, "data": {"k": "v"}}
//! ```
//!
//! A 2xx response is a delivery; its body may carry `{"message_id": "..."}`.
//! 404 and 410 mean the device token is gone.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use crate::{DeliveryReceipt, Notification, PushError, PushResult, PushTransport};

#[derive(Serialize)]
struct PushMessage<'a> {
    token: &'a str,
    notification: PushBody<'a>,
    data: &'a BTreeMap<String, String>,
}

#[derive(Serialize)]
struct PushBody<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Deserialize, Default)]
struct GatewayReply {
    #[serde(default, alias = "name")]
    message_id: Option<String>,
}

/// HTTP push transport
pub struct HttpPushTransport {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpPushTransport {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout: Duration) -> PushResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| PushError::Internal(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PushTransport for HttpPushTransport {
    async fn send(&self, token: &str, notification: &Notification) -> PushResult<DeliveryReceipt> {
        let message = PushMessage {
            token,
            notification: PushBody {
                title: &notification.title,
                body: &notification.body,
            },
            data: &notification.data,
        };

        let mut request = self.client.post(&self.endpoint).json(&message);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let reply: GatewayReply = serde_json::from_str(&text).unwrap_or_default();
            debug!(status = %status, message_id = ?reply.message_id, "Push delivered");
            return Ok(DeliveryReceipt {
                message_id: reply.message_id,
            });
        }

        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Err(PushError::InvalidToken);
        }

        let body = response.text().await.unwrap_or_default();
        Err(PushError::Rejected {
            status: status.as_u16(),
            body,
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
