//! Mock push transport for testing

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::{DeliveryReceipt, Notification, PushError, PushResult, PushTransport};

/// A notification captured by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub token: String,
    pub notification: Notification,
}

/// Mock push transport for unit/integration testing
#[derive(Clone, Default)]
pub struct MockTransport {
    sent: Arc<Mutex<Vec<SentNotification>>>,

    /// Configure every send to fail
    pub fail_all: Arc<Mutex<bool>>,

    /// Tokens whose delivery fails
    pub failing_tokens: Arc<Mutex<HashSet<String>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notification delivered so far
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().unwrap().clone()
    }

    /// Notifications delivered to one token
    pub fn sent_to(&self, token: &str) -> Vec<Notification> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.token == token)
            .map(|s| s.notification.clone())
            .collect()
    }

    pub fn set_fail_all(&self, fail: bool) {
        *self.fail_all.lock().unwrap() = fail;
    }

    pub fn fail_token(&self, token: impl Into<String>) {
        self.failing_tokens.lock().unwrap().insert(token.into());
    }
}

#[async_trait]
impl PushTransport for MockTransport {
    async fn send(&self, token: &str, notification: &Notification) -> PushResult<DeliveryReceipt> {
        if *self.fail_all.lock().unwrap() || self.failing_tokens.lock().unwrap().contains(token) {
            return Err(PushError::Request("Mock delivery failure".into()));
        }

        let mut sent = self.sent.lock().unwrap();
        sent.push(SentNotification {
            token: token.to_string(),
            notification: notification.clone(),
        });

        Ok(DeliveryReceipt {
            message_id: Some(format!("mock-{}", sent.len())),
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
