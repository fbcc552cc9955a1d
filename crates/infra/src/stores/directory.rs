//! Users and roles, with the per-request role lookup the guard relies on.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use ledgerly_auth::{Role, RoleDirectory, RoleId, User};
use ledgerly_core::{TenantId, UserId};

use crate::tenant_store::{InMemoryTenantStore, TenantStore};

/// In-memory user/role directory.
///
/// Email lookup is global (login happens before the tenant is known); the
/// tenant comes back out of the stored user record.
#[derive(Default)]
pub struct InMemoryDirectory {
    users: InMemoryTenantStore<UserId, User>,
    roles: InMemoryTenantStore<RoleId, Role>,
    by_email: RwLock<HashMap<String, (TenantId, UserId)>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn upsert_user(&self, user: User) {
        if let Ok(mut index) = self.by_email.write() {
            index.insert(user.email.to_lowercase(), (user.tenant_id, user.id));
        }
        self.users.upsert(user.tenant_id, user.id, user);
    }

    pub fn user(&self, tenant_id: TenantId, user_id: UserId) -> Option<User> {
        self.users.get(tenant_id, &user_id)
    }

    pub fn users(&self, tenant_id: TenantId) -> Vec<User> {
        self.users.list(tenant_id)
    }

    pub fn find_by_email(&self, email: &str) -> Option<User> {
        let (tenant_id, user_id) = *self.by_email.read().ok()?.get(&email.to_lowercase())?;
        self.users.get(tenant_id, &user_id)
    }

    pub fn upsert_role(&self, role: Role) {
        self.roles.upsert(role.tenant_id, role.id, role);
    }

    pub fn role(&self, tenant_id: TenantId, role_id: RoleId) -> Option<Role> {
        self.roles.get(tenant_id, &role_id)
    }

    pub fn roles(&self, tenant_id: TenantId) -> Vec<Role> {
        self.roles.list(tenant_id)
    }
}

impl RoleDirectory for InMemoryDirectory {
    fn role_of(&self, tenant_id: TenantId, user_id: UserId) -> Option<Role> {
        let user = self.users.get(tenant_id, &user_id)?;
        self.roles.get(tenant_id, &user.role_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerly_auth::{Permission, UserStatus};

    fn user(tenant_id: TenantId, role_id: RoleId, email: &str) -> User {
        User {
            id: UserId::new(),
            tenant_id,
            email: email.to_string(),
            display_name: "Test User".to_string(),
            role_id,
            status: UserStatus::Active,
            password_hash: String::new(),
        }
    }

    #[test]
    fn role_of_follows_the_stored_role_id() {
        let dir = InMemoryDirectory::new();
        let tenant = TenantId::new();
        let viewer = Role::viewer(tenant);
        let u = user(tenant, viewer.id, "a@example.com");
        let user_id = u.id;
        dir.upsert_role(viewer.clone());
        dir.upsert_user(u);

        let resolved = dir.role_of(tenant, user_id).unwrap();
        assert_eq!(resolved.id, viewer.id);
        assert!(resolved.grants(Permission::AccountsRead));
    }

    #[test]
    fn role_of_reflects_role_changes_immediately() {
        let dir = InMemoryDirectory::new();
        let tenant = TenantId::new();
        let viewer = Role::viewer(tenant);
        let owner = Role::owner(tenant);
        dir.upsert_role(viewer.clone());
        dir.upsert_role(owner.clone());

        let mut u = user(tenant, viewer.id, "b@example.com");
        let user_id = u.id;
        dir.upsert_user(u.clone());
        assert!(!dir.role_of(tenant, user_id).unwrap().grants(Permission::AccountsWrite));

        u.role_id = owner.id;
        dir.upsert_user(u);
        assert!(dir.role_of(tenant, user_id).unwrap().grants(Permission::AccountsWrite));
    }

    #[test]
    fn role_of_is_none_outside_the_users_tenant() {
        let dir = InMemoryDirectory::new();
        let tenant = TenantId::new();
        let other = TenantId::new();
        let role = Role::owner(tenant);
        let u = user(tenant, role.id, "c@example.com");
        let user_id = u.id;
        dir.upsert_role(role);
        dir.upsert_user(u);

        assert!(dir.role_of(other, user_id).is_none());
    }

    #[test]
    fn email_lookup_is_case_insensitive() {
        let dir = InMemoryDirectory::new();
        let tenant = TenantId::new();
        let role = Role::member(tenant);
        dir.upsert_role(role.clone());
        dir.upsert_user(user(tenant, role.id, "Mixed@Example.com"));

        assert!(dir.find_by_email("mixed@example.com").is_some());
    }
}
