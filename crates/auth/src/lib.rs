//! `ledgerly-auth` — pure authentication/authorization boundary (zero-trust).
//!
//! This crate is intentionally decoupled from HTTP and storage. Tokens carry
//! identity and tenant only; permissions are re-resolved from storage on every
//! request so role edits take effect immediately (freshness over performance).

pub mod claims;
pub mod guard;
pub mod password;
pub mod permissions;
pub mod roles;
pub mod user;

pub use claims::{Hs256JwtValidator, JwtClaims, JwtValidator, TokenValidationError, validate_claims};
pub use guard::{AuthzError, Guard, TenantSession, authorize};
pub use password::{hash_password, verify_password};
pub use permissions::{ParsePermissionError, Permission};
pub use roles::{Role, RoleDirectory, RoleId};
pub use user::{User, UserStatus};
