//! Capability permissions as a closed set.
//!
//! The set of valid permission strings is fixed and enumerable, so it is
//! modeled as an enum rather than free-form strings compared at runtime. A
//! role's permission list is always a subset of this set (or the wildcard).
//!
//! Older clients still send the colon-delimited spellings from the previous
//! API generation; those are remapped through [`LEGACY_ALIASES`] at parse
//! time, so an alias resolving to a capability the role already holds
//! authorizes exactly like the canonical spelling.

use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A capability required to perform an operation.
///
/// `Wildcard` ("*") grants every permission; it only ever appears in role
/// permission lists, but a legacy alias may also *request* it, in which case
/// the role must hold the literal wildcard.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Permission {
    Wildcard,
    AccountsRead,
    AccountsWrite,
    TransactionsRead,
    TransactionsWrite,
    BudgetsRead,
    BudgetsWrite,
    GoalsRead,
    GoalsWrite,
    AlertsRead,
    AlertsWrite,
    NotificationsRead,
    NotificationsWrite,
    WebhooksManage,
    SettingsManage,
    ReportsRead,
    UsersRead,
    UsersChangeRole,
}

/// Every concrete (non-wildcard) permission, for enumeration and RBAC audit
/// endpoints. Process-wide, immutable, safe to share without synchronization.
pub const ALL_PERMISSIONS: &[Permission] = &[
    Permission::AccountsRead,
    Permission::AccountsWrite,
    Permission::TransactionsRead,
    Permission::TransactionsWrite,
    Permission::BudgetsRead,
    Permission::BudgetsWrite,
    Permission::GoalsRead,
    Permission::GoalsWrite,
    Permission::AlertsRead,
    Permission::AlertsWrite,
    Permission::NotificationsRead,
    Permission::NotificationsWrite,
    Permission::WebhooksManage,
    Permission::SettingsManage,
    Permission::ReportsRead,
    Permission::UsersRead,
    Permission::UsersChangeRole,
];

/// Deprecated spellings from the previous API generation, remapped before
/// comparison. `admin:all` is the wildcard sentinel: requesting it requires
/// the literal wildcard in the role's set.
pub const LEGACY_ALIASES: &[(&str, Permission)] = &[
    ("accounts:read", Permission::AccountsRead),
    ("accounts:write", Permission::AccountsWrite),
    ("transactions:read", Permission::TransactionsRead),
    ("transactions:write", Permission::TransactionsWrite),
    ("budgets:read", Permission::BudgetsRead),
    ("budgets:write", Permission::BudgetsWrite),
    ("goals:read", Permission::GoalsRead),
    ("goals:write", Permission::GoalsWrite),
    ("alerts:manage", Permission::AlertsWrite),
    ("notifications:manage", Permission::NotificationsWrite),
    ("webhooks:write", Permission::WebhooksManage),
    ("settings:write", Permission::SettingsManage),
    ("reports:view", Permission::ReportsRead),
    ("users:view", Permission::UsersRead),
    ("users:role", Permission::UsersChangeRole),
    ("admin:all", Permission::Wildcard),
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown permission '{0}'")]
pub struct ParsePermissionError(pub String);

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Wildcard => "*",
            Permission::AccountsRead => "accounts.read",
            Permission::AccountsWrite => "accounts.write",
            Permission::TransactionsRead => "transactions.read",
            Permission::TransactionsWrite => "transactions.write",
            Permission::BudgetsRead => "budgets.read",
            Permission::BudgetsWrite => "budgets.write",
            Permission::GoalsRead => "goals.read",
            Permission::GoalsWrite => "goals.write",
            Permission::AlertsRead => "alerts.read",
            Permission::AlertsWrite => "alerts.write",
            Permission::NotificationsRead => "notifications.read",
            Permission::NotificationsWrite => "notifications.write",
            Permission::WebhooksManage => "webhooks.manage",
            Permission::SettingsManage => "settings.manage",
            Permission::ReportsRead => "reports.read",
            Permission::UsersRead => "users.read",
            Permission::UsersChangeRole => "users.change_role",
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Permission::Wildcard)
    }
}

impl FromStr for Permission {
    type Err = ParsePermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "*" {
            return Ok(Permission::Wildcard);
        }
        if let Some(p) = ALL_PERMISSIONS.iter().find(|p| p.as_str() == s) {
            return Ok(*p);
        }
        if let Some((_, p)) = LEGACY_ALIASES.iter().find(|(alias, _)| *alias == s) {
            return Ok(*p);
        }
        Err(ParsePermissionError(s.to_string()))
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Permission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names_round_trip() {
        for p in ALL_PERMISSIONS {
            assert_eq!(p.as_str().parse::<Permission>().unwrap(), *p);
        }
    }

    #[test]
    fn legacy_aliases_parse_to_canonical() {
        assert_eq!(
            "accounts:write".parse::<Permission>().unwrap(),
            Permission::AccountsWrite
        );
        assert_eq!(
            "users:role".parse::<Permission>().unwrap(),
            Permission::UsersChangeRole
        );
    }

    #[test]
    fn wildcard_sentinel_alias_maps_to_wildcard() {
        assert_eq!("admin:all".parse::<Permission>().unwrap(), Permission::Wildcard);
    }

    #[test]
    fn unknown_permission_is_rejected() {
        assert!("accounts:delete_all".parse::<Permission>().is_err());
    }

    #[test]
    fn serde_uses_canonical_spelling() {
        let json = serde_json::to_string(&Permission::BudgetsRead).unwrap();
        assert_eq!(json, "\"budgets.read\"");
        let back: Permission = serde_json::from_str("\"budgets:read\"").unwrap();
        assert_eq!(back, Permission::BudgetsRead);
    }
}
