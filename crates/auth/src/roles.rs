//! Tenant-scoped roles and the directory used for fresh resolution.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ledgerly_core::{TenantId, UserId};

use crate::permissions::Permission;

/// Unique identifier for a role within a tenant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(Uuid);

impl RoleId {
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

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for RoleId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RoleId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// A role: a named permission set within one tenant.
///
/// Built-in roles are provisioned per tenant (tenant-scoped copies) and are
/// neither editable nor deletable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub tenant_id: TenantId,
    pub name: String,
    pub permissions: Vec<Permission>,
    pub built_in: bool,
}

impl Role {
    /// Does this role grant `required`?
    ///
    /// Wildcard grants everything. Requesting the wildcard itself (via the
    /// `admin:all` legacy sentinel) requires the literal wildcard in the set.
    pub fn grants(&self, required: Permission) -> bool {
        self.permissions
            .iter()
            .any(|p| p.is_wildcard() || *p == required)
    }

    /// Built-in "owner" role: all permissions via the wildcard.
    pub fn owner(tenant_id: TenantId) -> Self {
        Self {
            id: RoleId::new(),
            tenant_id,
            name: "owner".to_string(),
            permissions: vec![Permission::Wildcard],
            built_in: true,
        }
    }

    /// Built-in "member" role: full access to financial data, no tenant
    /// administration.
    pub fn member(tenant_id: TenantId) -> Self {
        Self {
            id: RoleId::new(),
            tenant_id,
            name: "member".to_string(),
            permissions: vec![
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
                Permission::ReportsRead,
            ],
            built_in: true,
        }
    }

    /// Built-in "viewer" role: read-only.
    pub fn viewer(tenant_id: TenantId) -> Self {
        Self {
            id: RoleId::new(),
            tenant_id,
            name: "viewer".to_string(),
            permissions: vec![
                Permission::AccountsRead,
                Permission::TransactionsRead,
                Permission::BudgetsRead,
                Permission::GoalsRead,
                Permission::AlertsRead,
                Permission::NotificationsRead,
                Permission::ReportsRead,
            ],
            built_in: true,
        }
    }
}

/// Fresh per-request role resolution.
///
/// The guard never trusts a permission list embedded in a token; it resolves
/// the user's current role through this directory on every request, so role
/// and permission edits take effect immediately.
pub trait RoleDirectory: Send + Sync {
    /// Resolve the current role of `user_id` within `tenant_id`.
    ///
    /// Returns `None` when the user does not (or no longer does) belong to
    /// the tenant.
    fn role_of(&self, tenant_id: TenantId, user_id: UserId) -> Option<Role>;
}

impl<D> RoleDirectory for std::sync::Arc<D>
where
    D: RoleDirectory + ?Sized,
{
    fn role_of(&self, tenant_id: TenantId, user_id: UserId) -> Option<Role> {
        (**self).role_of(tenant_id, user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_role_grants_every_permission() {
        let role = Role::owner(TenantId::new());
        for p in crate::permissions::ALL_PERMISSIONS {
            assert!(role.grants(*p));
        }
        assert!(role.grants(Permission::Wildcard));
    }

    #[test]
    fn viewer_cannot_write() {
        let role = Role::viewer(TenantId::new());
        assert!(role.grants(Permission::AccountsRead));
        assert!(!role.grants(Permission::AccountsWrite));
        assert!(!role.grants(Permission::Wildcard));
    }
}
