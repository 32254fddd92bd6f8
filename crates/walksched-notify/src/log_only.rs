//! Transport used when no push gateway is configured

use async_trait::async_trait;
use tracing::info;

use crate::{DeliveryReceipt, Notification, PushResult, PushTransport};

/// Logs every notification instead of delivering it
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyTransport;

#[async_trait]
impl PushTransport for LogOnlyTransport {
    async fn send(&self, token: &str, notification: &Notification) -> PushResult<DeliveryReceipt> {
        info!(
            token_suffix = %token_suffix(token),
            title = %notification.title,
            data = ?notification.data,
            "Push delivery disabled, notification logged"
        );
        Ok(DeliveryReceipt::default())
    }

    fn name(&self) -> &'static str {
        "log-only"
    }
}

/// Last few characters of a token, enough to correlate without leaking it
pub fn token_suffix(token: &str) -> &str {
    let start = token
        .char_indices()
        .rev()
        .nth(5)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &token[start..]
}
