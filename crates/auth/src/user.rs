//! User identity records.
//!
//! # Invariants
//! - A user belongs to exactly one tenant (`tenant_id` is immutable).
//! - A user references exactly one tenant-scoped role.
//! - Suspended users cannot authenticate.

use serde::{Deserialize, Serialize};

use ledgerly_core::{Entity, TenantId, UserId};

use crate::roles::RoleId;

/// User account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum UserStatus {
    /// User is active and can authenticate/transact.
    #[default]
    Active,
    /// User is suspended and cannot authenticate.
    Suspended,
}

/// An authenticated identity within a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub tenant_id: TenantId,
    pub email: String,
    pub display_name: String,
    pub role_id: RoleId,
    pub status: UserStatus,
    /// Argon2 PHC string; never serialized into API responses.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
}

impl User {
    pub fn can_authenticate(&self) -> bool {
        self.status == UserStatus::Active
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
