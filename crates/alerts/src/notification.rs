//! Notifications and the content-based duplicate-suppression predicate.

use core::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ledgerly_core::{Entity, TenantId, UserId};
use ledgerly_ledger::same_calendar_month;

/// Unique identifier for a notification.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(Uuid);

impl NotificationId {
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

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NotificationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// A notification row. Immutable after creation except for the `read` flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub tenant_id: TenantId,
    pub user_id: Option<UserId>,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub read: bool,
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        tenant_id: TenantId,
        user_id: Option<UserId>,
        title: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            tenant_id,
            user_id,
            title: title.into(),
            message: message.into(),
            severity,
            read: false,
            link: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

impl Entity for Notification {
    type Id = NotificationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Time window used by duplicate suppression.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DedupeWindow {
    /// Same calendar month (budget and goal-milestone notifications).
    CalendarMonth,
    /// Within the last 24 hours (low-balance notifications).
    Last24Hours,
}

impl DedupeWindow {
    pub fn contains(self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            DedupeWindow::CalendarMonth => same_calendar_month(created_at, now),
            DedupeWindow::Last24Hours => now - created_at <= Duration::hours(24),
        }
    }
}

/// The duplicate-suppression predicate: an existing notification for the same
/// tenant and user whose title and message *contain* the given fragments,
/// created within the window.
///
/// Substring matching (not exact equality) is deliberate, preserved for
/// compatibility: "reached 25%" and "reached 50%" are distinct fragments, so
/// threshold crossings each emit once while re-runs within the window are
/// suppressed.
pub fn is_duplicate(
    existing: &Notification,
    user_id: Option<UserId>,
    title_fragment: &str,
    message_fragment: &str,
    window: DedupeWindow,
    now: DateTime<Utc>,
) -> bool {
    existing.user_id == user_id
        && existing.title.contains(title_fragment)
        && existing.message.contains(message_fragment)
        && window.contains(existing.created_at, now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_match_suppresses_same_milestone_only() {
        let tenant = TenantId::new();
        let user = UserId::new();
        let existing = Notification::new(
            tenant,
            Some(user),
            "Goal milestone",
            "Goal \"vacation\" reached 25% of its target",
            Severity::Info,
        );
        let now = existing.created_at;

        assert!(is_duplicate(
            &existing,
            Some(user),
            "Goal milestone",
            "reached 25%",
            DedupeWindow::CalendarMonth,
            now,
        ));
        assert!(!is_duplicate(
            &existing,
            Some(user),
            "Goal milestone",
            "reached 50%",
            DedupeWindow::CalendarMonth,
            now,
        ));
    }

    #[test]
    fn different_user_is_not_a_duplicate() {
        let tenant = TenantId::new();
        let existing = Notification::new(
            tenant,
            Some(UserId::new()),
            "Budget exceeded",
            "Budget \"groceries\" has reached 100% of its monthly limit",
            Severity::Critical,
        );
        assert!(!is_duplicate(
            &existing,
            Some(UserId::new()),
            "Budget exceeded",
            "Budget \"groceries\"",
            DedupeWindow::CalendarMonth,
            existing.created_at,
        ));
    }

    #[test]
    fn last_24_hours_window_expires() {
        let created = Utc::now();
        let window = DedupeWindow::Last24Hours;
        assert!(window.contains(created, created + Duration::hours(23)));
        assert!(!window.contains(created, created + Duration::hours(25)));
    }
}
