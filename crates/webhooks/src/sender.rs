//! Outbound HTTP delivery.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::envelope::{EVENT_HEADER, SIGNATURE_HEADER};

/// Delivery attempts are bounded by this timeout; there is no retry.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// A single outbound POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundWebhook {
    pub url: String,
    /// `X-Webhook-Event` value; absent for unsigned rule-action posts.
    pub event: Option<String>,
    /// Hex HMAC of `body`; absent when the target carries no secret.
    pub signature: Option<String>,
    /// Raw JSON body, exactly the bytes that were signed.
    pub body: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WebhookDeliveryError {
    #[error("webhook endpoint returned status {0}")]
    Status(u16),

    #[error("webhook delivery failed: {0}")]
    Network(String),
}

/// Delivery boundary. Callers treat failures as best-effort: log, never
/// retry, never surface to the end user.
#[async_trait]
pub trait WebhookSender: Send + Sync {
    async fn send(&self, outbound: OutboundWebhook) -> Result<(), WebhookDeliveryError>;
}

/// reqwest-backed sender with the fixed delivery timeout baked into the
/// client. One attempt per call; timeouts surface as `Network` errors for the
/// caller to swallow.
pub struct HttpWebhookSender {
    client: reqwest::Client,
}

impl HttpWebhookSender {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpWebhookSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebhookSender for HttpWebhookSender {
    async fn send(&self, outbound: OutboundWebhook) -> Result<(), WebhookDeliveryError> {
        let mut req = self
            .client
            .post(&outbound.url)
            .header("content-type", "application/json")
            .body(outbound.body);

        if let Some(event) = &outbound.event {
            req = req.header(EVENT_HEADER, event);
        }
        if let Some(signature) = &outbound.signature {
            req = req.header(SIGNATURE_HEADER, signature);
        }

        let res = req
            .send()
            .await
            .map_err(|e| WebhookDeliveryError::Network(e.to_string()))?;

        if res.status().is_success() {
            Ok(())
        } else {
            Err(WebhookDeliveryError::Status(res.status().as_u16()))
        }
    }
}
