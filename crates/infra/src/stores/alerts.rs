//! Alert rules, notifications and notification settings.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use ledgerly_alerts::{
    AlertRule, AlertRuleId, AlertRuleStore, DedupeWindow, Notification, NotificationId,
    NotificationStore, RawAlertRule, SettingsStore, TenantSettings, UserNotificationPrefs,
    notification::is_duplicate,
};
use ledgerly_core::{TenantId, UserId};

use crate::stores::directory::InMemoryDirectory;
use crate::tenant_store::{InMemoryTenantStore, TenantStore};

#[derive(Default)]
pub struct InMemoryAlertRuleStore {
    rules: InMemoryTenantStore<AlertRuleId, RawAlertRule>,
}

impl InMemoryAlertRuleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AlertRuleStore for InMemoryAlertRuleStore {
    fn get(&self, tenant_id: TenantId, id: AlertRuleId) -> Option<AlertRule> {
        self.rules.get(tenant_id, &id).and_then(|r| r.decode().ok())
    }

    fn list(&self, tenant_id: TenantId) -> Vec<RawAlertRule> {
        let mut rules = self.rules.list(tenant_id);
        rules.sort_by(|a, b| a.name.cmp(&b.name));
        rules
    }

    fn active_rules(&self, tenant_id: TenantId) -> Vec<RawAlertRule> {
        self.list(tenant_id)
            .into_iter()
            .filter(|r| r.active)
            .collect()
    }

    fn upsert(&self, rule: AlertRule) {
        let raw = rule.into_raw();
        self.rules.upsert(raw.tenant_id, raw.id, raw);
    }

    fn remove(&self, tenant_id: TenantId, id: AlertRuleId) -> bool {
        self.rules.remove(tenant_id, &id)
    }

    fn record_trigger(&self, tenant_id: TenantId, id: AlertRuleId, at: DateTime<Utc>) {
        if let Some(mut raw) = self.rules.get(tenant_id, &id) {
            raw.last_triggered = Some(at);
            raw.trigger_count += 1;
            self.rules.upsert(tenant_id, id, raw);
        }
    }
}

#[derive(Default)]
pub struct InMemoryNotificationStore {
    notifications: InMemoryTenantStore<NotificationId, Notification>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NotificationStore for InMemoryNotificationStore {
    fn insert(&self, notification: Notification) {
        self.notifications
            .upsert(notification.tenant_id, notification.id, notification);
    }

    /// Newest first.
    fn list(&self, tenant_id: TenantId) -> Vec<Notification> {
        let mut all = self.notifications.list(tenant_id);
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    fn mark_read(&self, tenant_id: TenantId, id: NotificationId) -> bool {
        match self.notifications.get(tenant_id, &id) {
            Some(mut n) => {
                n.read = true;
                self.notifications.upsert(tenant_id, id, n);
                true
            }
            None => false,
        }
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
        self.notifications
            .list(tenant_id)
            .iter()
            .any(|n| is_duplicate(n, user_id, title_fragment, message_fragment, window, now))
    }
}

/// Tenant settings and per-user notification preferences, with defaults for
/// anything never explicitly saved.
pub struct InMemorySettingsStore {
    settings: InMemoryTenantStore<(), TenantSettings>,
    prefs: InMemoryTenantStore<UserId, UserNotificationPrefs>,
    directory: Arc<InMemoryDirectory>,
}

impl InMemorySettingsStore {
    pub fn new(directory: Arc<InMemoryDirectory>) -> Self {
        Self {
            settings: InMemoryTenantStore::new(),
            prefs: InMemoryTenantStore::new(),
            directory,
        }
    }

    pub fn save_tenant_settings(&self, settings: TenantSettings) {
        self.settings.upsert(settings.tenant_id, (), settings);
    }

    pub fn save_user_prefs(&self, tenant_id: TenantId, user_id: UserId, prefs: UserNotificationPrefs) {
        self.prefs.upsert(tenant_id, user_id, prefs);
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn tenant_settings(&self, tenant_id: TenantId) -> TenantSettings {
        self.settings
            .get(tenant_id, &())
            .unwrap_or_else(|| TenantSettings::defaults(tenant_id))
    }

    fn user_prefs(&self, tenant_id: TenantId, user_id: UserId) -> UserNotificationPrefs {
        self.prefs.get(tenant_id, &user_id).unwrap_or_default()
    }

    fn recipients(&self, tenant_id: TenantId) -> Vec<UserId> {
        self.directory
            .users(tenant_id)
            .into_iter()
            .filter(|u| u.can_authenticate())
            .map(|u| u.id)
            .collect()
    }
}
