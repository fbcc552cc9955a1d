//! Storage ports consumed by the engine (implemented in `ledgerly-infra`).
//!
//! Every method takes a `TenantId` and must filter by it; cross-tenant reads
//! or writes are the single most important invariant for implementations to
//! preserve.

use chrono::{DateTime, Utc};

use ledgerly_budgets::{Budget, Goal};
use ledgerly_core::{AccountId, CategoryId, Money, TenantId, UserId};
use ledgerly_ledger::Account;

use crate::notification::{DedupeWindow, Notification, NotificationId};
use crate::rule::{AlertRule, AlertRuleId, RawAlertRule};
use crate::settings::{TenantSettings, UserNotificationPrefs};

/// Alert rule storage. The engine reads raw rules (decode happens per rule so
/// malformed blobs stay isolated) and records triggers back.
pub trait AlertRuleStore: Send + Sync {
    fn get(&self, tenant_id: TenantId, id: AlertRuleId) -> Option<AlertRule>;
    fn list(&self, tenant_id: TenantId) -> Vec<RawAlertRule>;
    fn active_rules(&self, tenant_id: TenantId) -> Vec<RawAlertRule>;
    fn upsert(&self, rule: AlertRule);
    fn remove(&self, tenant_id: TenantId, id: AlertRuleId) -> bool;

    /// Set `last_triggered` and increment the trigger counter.
    /// Last-write-wins; no optimistic concurrency by design.
    fn record_trigger(&self, tenant_id: TenantId, id: AlertRuleId, at: DateTime<Utc>);
}

/// Notification storage with the content-based idempotence query.
pub trait NotificationStore: Send + Sync {
    fn insert(&self, notification: Notification);
    fn list(&self, tenant_id: TenantId) -> Vec<Notification>;
    fn mark_read(&self, tenant_id: TenantId, id: NotificationId) -> bool;

    /// Does an equivalent notification already exist? Matched by tenant +
    /// user + title-substring + message-substring within the window.
    fn exists_similar(
        &self,
        tenant_id: TenantId,
        user_id: Option<UserId>,
        title_fragment: &str,
        message_fragment: &str,
        window: DedupeWindow,
        now: DateTime<Utc>,
    ) -> bool;
}

/// Read-only view of the tenant's financial state.
pub trait FinanceReader: Send + Sync {
    fn accounts(&self, tenant_id: TenantId) -> Vec<Account>;

    /// Computed balance; `None` when the account is unknown to the tenant.
    fn account_balance(&self, tenant_id: TenantId, account_id: AccountId) -> Option<Money>;

    /// This-month expense total for a category; `None` when the category is
    /// unknown to the tenant.
    fn month_category_spend(
        &self,
        tenant_id: TenantId,
        category_id: CategoryId,
        reference: DateTime<Utc>,
    ) -> Option<Money>;

    fn budgets(&self, tenant_id: TenantId) -> Vec<Budget>;
    fn goals(&self, tenant_id: TenantId) -> Vec<Goal>;
}

/// Tenant settings, user preferences, and notification recipients.
pub trait SettingsStore: Send + Sync {
    fn tenant_settings(&self, tenant_id: TenantId) -> TenantSettings;
    fn user_prefs(&self, tenant_id: TenantId, user_id: UserId) -> UserNotificationPrefs;

    /// Users who receive periodic-check notifications for this tenant.
    fn recipients(&self, tenant_id: TenantId) -> Vec<UserId>;
}
