//! Push notification collaborator.
//!
//! Delivery is best-effort and never gates a request: callers spawn sends
//! off the request path and log failures. The default sender only logs;
//! wiring an actual Web Push client is a deployment concern.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::PushSubscription;

/// Payload delivered to a subscriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Push delivery failure. Non-fatal everywhere.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// External push delivery service.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, sub: &PushSubscription, payload: &PushPayload) -> Result<(), PushError>;
}

/// Sender that logs instead of delivering.
#[derive(Default)]
pub struct LoggingPushSender;

#[async_trait]
impl PushSender for LoggingPushSender {
    async fn send(&self, sub: &PushSubscription, payload: &PushPayload) -> Result<(), PushError> {
        tracing::info!(
            endpoint = %sub.endpoint,
            title = %payload.title,
            "push notification (logging sender, not delivered)"
        );
        Ok(())
    }
}

/// Fan a payload out to every subscription, logging failures.
pub async fn notify_all(
    sender: &dyn PushSender,
    subs: &[PushSubscription],
    payload: &PushPayload,
) {
    for sub in subs {
        if let Err(err) = sender.send(sub, payload).await {
            tracing::warn!(endpoint = %sub.endpoint, error = %err, "push delivery failed");
        }
    }
}
