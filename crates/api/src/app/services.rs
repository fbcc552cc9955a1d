//! Service wiring: stores, alert engine, guard, JWT, rate limiting.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};

use ledgerly_alerts::{
    AlertEngine, DedupeWindow, Notification, NotificationId, NotificationStore,
};
use ledgerly_auth::{Guard, Hs256JwtValidator, Role, User, UserStatus, hash_password};
use ledgerly_core::{DomainError, TenantId, UserId};
use ledgerly_infra::{
    InMemoryAlertRuleStore, InMemoryDirectory, InMemoryFinanceStore, InMemoryNotificationStore,
    InMemorySettingsStore, InMemoryWebhookStore, LoginRateLimiter, PostgresNotificationStore,
};
use ledgerly_webhooks::{HttpWebhookSender, WebhookPublisher, WebhookSender};

/// Realtime message broadcasted via SSE.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RealtimeMessage {
    pub tenant_id: TenantId,
    pub topic: String,
    pub payload: serde_json::Value,
}

/// Notification store decorator that pushes every insert onto the tenant's
/// SSE stream (lossy; no backpressure on the engine).
pub struct BroadcastingNotificationStore {
    inner: Arc<dyn NotificationStore>,
    realtime_tx: broadcast::Sender<RealtimeMessage>,
}

impl NotificationStore for BroadcastingNotificationStore {
    fn insert(&self, notification: Notification) {
        if let Ok(payload) = serde_json::to_value(&notification) {
            let _ = self.realtime_tx.send(RealtimeMessage {
                tenant_id: notification.tenant_id,
                topic: "notification.created".to_string(),
                payload,
            });
        }
        self.inner.insert(notification);
    }

    fn list(&self, tenant_id: TenantId) -> Vec<Notification> {
        self.inner.list(tenant_id)
    }

    fn mark_read(&self, tenant_id: TenantId, id: NotificationId) -> bool {
        self.inner.mark_read(tenant_id, id)
    }

    fn exists_similar(
        &self,
        tenant_id: TenantId,
        user_id: Option<UserId>,
        title_fragment: &str,
        message_fragment: &str,
        window: DedupeWindow,
        now: DateTime<Utc>,
    ) -> bool {
        self.inner
            .exists_similar(tenant_id, user_id, title_fragment, message_fragment, window, now)
    }
}

pub struct AppServices {
    pub directory: Arc<InMemoryDirectory>,
    pub finance: Arc<InMemoryFinanceStore>,
    pub rules: Arc<InMemoryAlertRuleStore>,
    pub notifications: Arc<BroadcastingNotificationStore>,
    pub settings: Arc<InMemorySettingsStore>,
    pub webhooks: Arc<InMemoryWebhookStore>,
    pub publisher: Arc<WebhookPublisher>,
    pub login_limiter: LoginRateLimiter,
    engine: AlertEngine,
    guard: Guard<Arc<InMemoryDirectory>>,
    jwt: Arc<Hs256JwtValidator>,
    realtime_tx: broadcast::Sender<RealtimeMessage>,
}

impl AppServices {
    pub fn guard(&self) -> &Guard<Arc<InMemoryDirectory>> {
        &self.guard
    }

    pub fn engine(&self) -> &AlertEngine {
        &self.engine
    }

    pub fn jwt(&self) -> Arc<Hs256JwtValidator> {
        self.jwt.clone()
    }

    pub fn realtime_tx(&self) -> &broadcast::Sender<RealtimeMessage> {
        &self.realtime_tx
    }

    /// Create a tenant with its built-in roles and an owner user.
    ///
    /// Fails with `Conflict` when the email is already registered anywhere.
    pub fn provision_tenant(
        &self,
        email: &str,
        display_name: &str,
        password: &str,
    ) -> Result<(TenantId, User), DomainError> {
        if self.directory.find_by_email(email).is_some() {
            return Err(DomainError::conflict("email is already registered"));
        }
        if password.len() < 8 {
            return Err(DomainError::validation("password must be at least 8 characters"));
        }

        let tenant_id = TenantId::new();
        let owner = Role::owner(tenant_id);
        let owner_role_id = owner.id;
        self.directory.upsert_role(owner);
        self.directory.upsert_role(Role::member(tenant_id));
        self.directory.upsert_role(Role::viewer(tenant_id));

        let password_hash = hash_password(password)
            .map_err(|_| DomainError::validation("failed to hash password"))?;

        let user = User {
            id: UserId::new(),
            tenant_id,
            email: email.to_string(),
            display_name: display_name.to_string(),
            role_id: owner_role_id,
            status: UserStatus::Active,
            password_hash,
        };
        self.directory.upsert_user(user.clone());

        tracing::info!(%tenant_id, user_id = %user.id, "tenant provisioned");
        Ok((tenant_id, user))
    }
}

fn persistent_stores_requested(raw: Option<String>) -> bool {
    raw.unwrap_or_else(|| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false)
}

/// In-memory notifications by default; `USE_PERSISTENT_STORES=true` selects
/// the Postgres store, with `DATABASE_URL` naming the database. Connection
/// or configuration failures fall back to in-memory with a warning.
async fn notification_backend() -> Arc<dyn NotificationStore> {
    if persistent_stores_requested(std::env::var("USE_PERSISTENT_STORES").ok()) {
        match std::env::var("DATABASE_URL") {
            Ok(url) => match PostgresNotificationStore::connect(&url).await {
                Ok(store) => return Arc::new(store),
                Err(e) => tracing::warn!(
                    error = %e,
                    "failed to connect to Postgres, falling back to in-memory notifications"
                ),
            },
            Err(_) => tracing::warn!(
                "USE_PERSISTENT_STORES=true but DATABASE_URL not set, falling back to in-memory"
            ),
        }
    }
    Arc::new(InMemoryNotificationStore::new())
}

pub async fn build_services(jwt_secret: String) -> AppServices {
    let (realtime_tx, _) = broadcast::channel::<RealtimeMessage>(256);

    let directory = InMemoryDirectory::shared();
    let finance = Arc::new(InMemoryFinanceStore::new());
    let rules = Arc::new(InMemoryAlertRuleStore::new());
    let webhooks = Arc::new(InMemoryWebhookStore::new());
    let settings = Arc::new(InMemorySettingsStore::new(directory.clone()));
    let notifications = Arc::new(BroadcastingNotificationStore {
        inner: notification_backend().await,
        realtime_tx: realtime_tx.clone(),
    });

    let sender: Arc<dyn WebhookSender> = Arc::new(HttpWebhookSender::new());
    let publisher = Arc::new(WebhookPublisher::new(webhooks.clone(), sender.clone()));

    let engine = AlertEngine::new(
        rules.clone(),
        notifications.clone(),
        finance.clone(),
        settings.clone(),
        sender,
        publisher.clone(),
    );

    AppServices {
        guard: Guard::new(directory.clone()),
        jwt: Arc::new(Hs256JwtValidator::new(jwt_secret.into_bytes())),
        login_limiter: LoginRateLimiter::default_policy(),
        directory,
        finance,
        rules,
        notifications,
        settings,
        webhooks,
        publisher,
        engine,
        realtime_tx,
    }
}

pub fn tenant_sse_stream(
    services: Arc<AppServices>,
    tenant_id: TenantId,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = services.realtime_tx().subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |msg| match msg {
        Ok(m) if m.tenant_id == tenant_id => {
            let data = serde_json::to_string(&m.payload).unwrap_or_else(|_| "{}".to_string());
            Some(Ok(SseEvent::default().event(m.topic).data(data)))
        }
        _ => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistent_stores_are_opt_in() {
        assert!(!persistent_stores_requested(None));
        assert!(!persistent_stores_requested(Some("false".to_string())));
        assert!(!persistent_stores_requested(Some("yes please".to_string())));
        assert!(persistent_stores_requested(Some("true".to_string())));
    }
}
