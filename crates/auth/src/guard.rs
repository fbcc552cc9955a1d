//! The tenant/permission guard.
//!
//! Resolution order, applied on every authenticated route:
//! 1. no valid session → `Unauthenticated`
//! 2. load the identity's role + permission list fresh from the directory
//! 3. the requested permission has already been alias-remapped at parse time
//! 4. wildcard or exact membership → success, otherwise `Forbidden`
//!
//! The guard is read-only and produces exactly these two error outcomes.

use serde::Serialize;
use thiserror::Error;

use ledgerly_core::{TenantId, UserId};

use crate::permissions::Permission;
use crate::roles::{Role, RoleDirectory, RoleId};

/// A validated, tenant-scoped session: the output of a successful guard
/// check. `tenant_id` is a mandatory filter on every subsequent storage
/// operation in the handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantSession {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub role_id: RoleId,
    pub role_name: String,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// No valid session (HTTP 401).
    #[error("unauthenticated")]
    Unauthenticated,

    /// Valid session, missing capability (HTTP 403).
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(Permission),
}

/// Pure policy check: does `role` authorize `required`?
///
/// - No IO
/// - No panics
/// - No business logic
pub fn authorize(role: &Role, required: Permission) -> Result<(), AuthzError> {
    if role.grants(required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required))
    }
}

/// Storage-backed guard: authenticated identity → authorized tenant session.
pub struct Guard<D> {
    directory: D,
}

impl<D: RoleDirectory> Guard<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    /// Authorize `required` for the identity behind `session`, resolving the
    /// role fresh from the directory.
    ///
    /// `session` is `None` when the transport produced no authenticated
    /// identity. A stale identity (user removed from the tenant after token
    /// issuance) also fails as `Unauthenticated`: the session no longer
    /// refers to a member.
    pub fn require_permission(
        &self,
        session: Option<(TenantId, UserId)>,
        required: Permission,
    ) -> Result<TenantSession, AuthzError> {
        let (tenant_id, user_id) = session.ok_or(AuthzError::Unauthenticated)?;

        let role = self
            .directory
            .role_of(tenant_id, user_id)
            .ok_or(AuthzError::Unauthenticated)?;

        authorize(&role, required)?;

        Ok(TenantSession {
            tenant_id,
            user_id,
            role_id: role.id,
            role_name: role.name,
            permissions: role.permissions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FixedDirectory {
        members: HashMap<(TenantId, UserId), Role>,
    }

    impl RoleDirectory for FixedDirectory {
        fn role_of(&self, tenant_id: TenantId, user_id: UserId) -> Option<Role> {
            self.members.get(&(tenant_id, user_id)).cloned()
        }
    }

    fn guard_with(tenant: TenantId, user: UserId, role: Role) -> Guard<FixedDirectory> {
        let mut members = HashMap::new();
        members.insert((tenant, user), role);
        Guard::new(FixedDirectory { members })
    }

    #[test]
    fn missing_session_is_unauthenticated_regardless_of_permission() {
        let guard = guard_with(TenantId::new(), UserId::new(), Role::owner(TenantId::new()));
        for p in crate::permissions::ALL_PERMISSIONS {
            assert_eq!(
                guard.require_permission(None, *p),
                Err(AuthzError::Unauthenticated)
            );
        }
    }

    #[test]
    fn wildcard_role_authorizes_every_permission() {
        let tenant = TenantId::new();
        let user = UserId::new();
        let guard = guard_with(tenant, user, Role::owner(tenant));
        for p in crate::permissions::ALL_PERMISSIONS {
            assert!(guard.require_permission(Some((tenant, user)), *p).is_ok());
        }
    }

    #[test]
    fn read_only_role_denies_write_allows_read() {
        let tenant = TenantId::new();
        let user = UserId::new();
        let role = Role {
            id: RoleId::new(),
            tenant_id: tenant,
            name: "reader".into(),
            permissions: vec![Permission::AccountsRead],
            built_in: false,
        };
        let guard = guard_with(tenant, user, role);

        assert!(
            guard
                .require_permission(Some((tenant, user)), Permission::AccountsRead)
                .is_ok()
        );
        assert_eq!(
            guard.require_permission(Some((tenant, user)), Permission::AccountsWrite),
            Err(AuthzError::Forbidden(Permission::AccountsWrite))
        );
    }

    #[test]
    fn legacy_alias_is_idempotent_with_canonical_grant() {
        let tenant = TenantId::new();
        let user = UserId::new();
        let role = Role {
            id: RoleId::new(),
            tenant_id: tenant,
            name: "bookkeeper".into(),
            permissions: vec![Permission::AccountsWrite],
            built_in: false,
        };
        let guard = guard_with(tenant, user, role);

        // Deprecated spelling remaps to a capability the role already holds.
        let requested: Permission = "accounts:write".parse().unwrap();
        assert!(guard.require_permission(Some((tenant, user)), requested).is_ok());
    }

    #[test]
    fn wildcard_sentinel_alias_requires_literal_wildcard() {
        let tenant = TenantId::new();
        let user = UserId::new();
        let role = Role::member(tenant); // broad, but no wildcard
        let guard = guard_with(tenant, user, role);

        let requested: Permission = "admin:all".parse().unwrap();
        assert_eq!(
            guard.require_permission(Some((tenant, user)), requested),
            Err(AuthzError::Forbidden(Permission::Wildcard))
        );
    }

    #[test]
    fn session_for_one_tenant_never_resolves_in_another() {
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();
        let user = UserId::new();
        // Identical role shapes in both tenants; user belongs to A only.
        let guard = guard_with(tenant_a, user, Role::owner(tenant_a));

        assert_eq!(
            guard.require_permission(Some((tenant_b, user)), Permission::AccountsRead),
            Err(AuthzError::Unauthenticated)
        );
    }
}
