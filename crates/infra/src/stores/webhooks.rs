//! Webhook registration storage.

use ledgerly_core::TenantId;
use ledgerly_webhooks::{WebhookId, WebhookRegistration, WebhookStore};

use crate::tenant_store::{InMemoryTenantStore, TenantStore};

#[derive(Default)]
pub struct InMemoryWebhookStore {
    registrations: InMemoryTenantStore<WebhookId, WebhookRegistration>,
}

impl InMemoryWebhookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WebhookStore for InMemoryWebhookStore {
    fn get(&self, tenant_id: TenantId, id: WebhookId) -> Option<WebhookRegistration> {
        self.registrations.get(tenant_id, &id)
    }

    fn list(&self, tenant_id: TenantId) -> Vec<WebhookRegistration> {
        let mut all = self.registrations.list(tenant_id);
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    fn upsert(&self, registration: WebhookRegistration) {
        self.registrations
            .upsert(registration.tenant_id, registration.id, registration);
    }

    fn remove(&self, tenant_id: TenantId, id: WebhookId) -> bool {
        self.registrations.remove(tenant_id, &id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registrations_are_tenant_scoped() {
        let store = InMemoryWebhookStore::new();
        let tenant = TenantId::new();
        let registration = WebhookRegistration {
            id: WebhookId::new(),
            tenant_id: tenant,
            name: "billing".to_string(),
            url: "https://example.test/hook".to_string(),
            secret: "s3cret".to_string(),
            events: vec![],
            enabled: true,
        };
        let id = registration.id;
        store.upsert(registration);

        assert!(store.get(tenant, id).is_some());
        assert!(store.get(TenantId::new(), id).is_none());
        assert!(store.list(TenantId::new()).is_empty());
    }
}
