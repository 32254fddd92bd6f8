//! Push transport traits

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from push delivery
#[derive(Debug, Error)]
pub enum PushError {
    #[error("Push gateway rejected the message: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Push request failed: {0}")]
    Request(String),

    #[error("Invalid push token")]
    InvalidToken,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for PushError {
    fn from(e: reqwest::Error) -> Self {
        PushError::Request(e.to_string())
    }
}

pub type PushResult<T> = Result<T, PushError>;

/// Message delivered to a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Opaque key/value payload for the client app
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            data: BTreeMap::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// Result of a delivery attempt accepted by the transport
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeliveryReceipt {
    /// Message ID assigned by the gateway, when it returns one
    pub message_id: Option<String>,
}

/// Push transport trait - implemented by delivery backends
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Deliver one notification to one device token
    async fn send(&self, token: &str, notification: &Notification) -> PushResult<DeliveryReceipt>;

    /// Short backend name for logs
    fn name(&self) -> &'static str;
}
