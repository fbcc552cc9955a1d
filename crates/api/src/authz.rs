//! API-side permission enforcement.
//!
//! Each handler names the permission it needs and calls [`require`] before
//! touching any data. The guard re-resolves the caller's role from storage,
//! so a role edit takes effect on the very next request.

use axum::http::StatusCode;

use ledgerly_auth::{AuthzError, Permission, TenantSession};

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::{PrincipalContext, TenantContext};

/// Resolve the caller's session and check `required` against their current
/// role. Returns a ready-to-send error response on failure.
pub fn require(
    services: &AppServices,
    tenant: &TenantContext,
    principal: &PrincipalContext,
    required: Permission,
) -> Result<TenantSession, axum::response::Response> {
    services
        .guard()
        .require_permission(Some((tenant.tenant_id(), principal.user_id())), required)
        .map_err(|e| match e {
            AuthzError::Unauthenticated => {
                errors::json_error(StatusCode::UNAUTHORIZED, "unauthenticated", e.to_string())
            }
            AuthzError::Forbidden(_) => {
                errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string())
            }
        })
}
