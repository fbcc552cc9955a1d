//! `ledgerly-webhooks` — outbound webhook delivery.
//!
//! Delivery is best-effort by contract: one attempt, a fixed timeout, no
//! retry, failures logged and swallowed. The [`WebhookSender`] trait isolates
//! that policy so a retrying sender could be swapped in without touching
//! callers.

pub mod envelope;
pub mod publisher;
pub mod registration;
pub mod sender;

pub use envelope::{WebhookEnvelope, sign_body};
pub use publisher::WebhookPublisher;
pub use registration::{WebhookId, WebhookRegistration, WebhookStore};
pub use sender::{HttpWebhookSender, OutboundWebhook, WebhookDeliveryError, WebhookSender};
