//! Wire format for registered webhooks.
//!
//! The envelope and signature are consumed by external systems and must stay
//! bit-exact: JSON body `{event, data, timestamp}` with an ISO-8601
//! timestamp, signed with hex-encoded HMAC-SHA256 of the raw body.

use chrono::{DateTime, SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex HMAC-SHA256 of the raw JSON body.
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// Header carrying the event name.
pub const EVENT_HEADER: &str = "X-Webhook-Event";

#[derive(Debug, Clone, Serialize)]
pub struct WebhookEnvelope {
    pub event: String,
    pub data: serde_json::Value,
    pub timestamp: String,
}

impl WebhookEnvelope {
    pub fn new(event: impl Into<String>, data: serde_json::Value, at: DateTime<Utc>) -> Self {
        Self {
            event: event.into(),
            data,
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Serialize to the raw body that gets signed. Field order is fixed by
    /// the struct definition, so the signature is reproducible.
    pub fn to_body(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Hex-encoded HMAC-SHA256 of `body` with the registration secret.
pub fn sign_body(secret: &str, body: &str) -> String {
    // HMAC accepts keys of any length; new_from_slice only fails for
    // pathological key types, not lengths.
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| HmacSha256::new_from_slice(b"").unwrap());
    mac.update(body.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
