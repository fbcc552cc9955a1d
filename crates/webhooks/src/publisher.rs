//! Fan-out of domain events to a tenant's registered webhooks.

use std::sync::Arc;

use chrono::Utc;

use ledgerly_core::TenantId;

use crate::envelope::{WebhookEnvelope, sign_body};
use crate::registration::WebhookStore;
use crate::sender::{OutboundWebhook, WebhookSender};

/// Delivers signed envelopes to every enabled registration subscribed to an
/// event. Failures are logged and swallowed per registration; one dead
/// endpoint never blocks the others.
pub struct WebhookPublisher {
    store: Arc<dyn WebhookStore>,
    sender: Arc<dyn WebhookSender>,
}

impl WebhookPublisher {
    pub fn new(store: Arc<dyn WebhookStore>, sender: Arc<dyn WebhookSender>) -> Self {
        Self { store, sender }
    }

    /// Publish `event` with `data` to all matching registrations.
    pub async fn publish(&self, tenant_id: TenantId, event: &str, data: serde_json::Value) {
        let envelope = WebhookEnvelope::new(event, data, Utc::now());
        let body = envelope.to_body();

        for registration in self.store.list(tenant_id) {
            if !registration.subscribes_to(event) {
                continue;
            }

            let outbound = OutboundWebhook {
                url: registration.url.clone(),
                event: Some(event.to_string()),
                signature: Some(sign_body(&registration.secret, &body)),
                body: body.clone(),
            };

            if let Err(e) = self.sender.send(outbound).await {
                tracing::debug!(
                    webhook_id = %registration.id,
                    %event,
                    error = %e,
                    "webhook delivery failed (best-effort, not retried)"
                );
            }
        }
    }
}
