use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ledgerly_core::{Entity, TenantId};

/// Unique identifier for a webhook registration.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WebhookId(Uuid);

impl WebhookId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for WebhookId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for WebhookId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WebhookId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// A tenant's registered webhook endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookRegistration {
    pub id: WebhookId,
    pub tenant_id: TenantId,
    pub name: String,
    pub url: String,
    /// Per-registration signing secret; never serialized into API responses.
    #[serde(skip_serializing, default)]
    pub secret: String,
    /// Subscribed event names; empty subscribes to everything.
    pub events: Vec<String>,
    pub enabled: bool,
}

impl WebhookRegistration {
    pub fn subscribes_to(&self, event: &str) -> bool {
        self.enabled && (self.events.is_empty() || self.events.iter().any(|e| e == event))
    }
}

impl Entity for WebhookRegistration {
    type Id = WebhookId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Tenant-scoped registration storage port (implemented in infra).
pub trait WebhookStore: Send + Sync {
    fn get(&self, tenant_id: TenantId, id: WebhookId) -> Option<WebhookRegistration>;
    fn list(&self, tenant_id: TenantId) -> Vec<WebhookRegistration>;
    fn upsert(&self, registration: WebhookRegistration);
    fn remove(&self, tenant_id: TenantId, id: WebhookId) -> bool;
}
