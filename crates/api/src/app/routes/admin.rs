//! Tenant administration: users, roles, permissions, settings.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};

use ledgerly_alerts::SettingsStore;
use ledgerly_auth::{Permission, Role, User, UserStatus, hash_password, permissions::ALL_PERMISSIONS};
use ledgerly_core::UserId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;

pub fn router() -> Router {
    Router::new()
        .route("/roles", get(list_roles))
        .route("/permissions", get(list_permissions))
        .route("/users", get(list_users).post(invite_user))
        .route("/users/:id/role", put(change_role))
        .route("/settings", get(get_settings).put(update_settings))
}

fn role_to_json(role: &Role) -> serde_json::Value {
    serde_json::json!({
        "id": role.id.to_string(),
        "name": role.name,
        "permissions": role.permissions,
        "built_in": role.built_in,
    })
}

fn user_to_json(user: &User) -> serde_json::Value {
    serde_json::json!({
        "id": user.id.to_string(),
        "email": user.email,
        "display_name": user.display_name,
        "role_id": user.role_id.to_string(),
        "status": user.status,
    })
}

pub async fn list_roles(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::UsersRead) {
        return resp;
    }

    let mut roles = services.directory.roles(tenant.tenant_id());
    roles.sort_by(|a, b| a.name.cmp(&b.name));
    let roles: Vec<_> = roles.iter().map(role_to_json).collect();

    (StatusCode::OK, Json(serde_json::json!({ "roles": roles }))).into_response()
}

pub async fn list_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::UsersRead) {
        return resp;
    }

    let permissions: Vec<&str> = ALL_PERMISSIONS.iter().map(|p| p.as_str()).collect();
    (
        StatusCode::OK,
        Json(serde_json::json!({ "permissions": permissions })),
    )
        .into_response()
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::UsersRead) {
        return resp;
    }

    let mut users = services.directory.users(tenant.tenant_id());
    users.sort_by(|a, b| a.email.cmp(&b.email));
    let users: Vec<_> = users.iter().map(user_to_json).collect();

    (StatusCode::OK, Json(serde_json::json!({ "users": users }))).into_response()
}

pub async fn invite_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Json(body): Json<dto::InviteUserRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::UsersChangeRole) {
        return resp;
    }

    let tenant_id = tenant.tenant_id();
    if services.directory.find_by_email(&body.email).is_some() {
        return errors::json_error(StatusCode::CONFLICT, "conflict", "email is already registered");
    }
    if services.directory.role(tenant_id, body.role_id).is_none() {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "role not found");
    }
    let Ok(password_hash) = hash_password(&body.password) else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "failed to hash password",
        );
    };

    let user = User {
        id: UserId::new(),
        tenant_id,
        email: body.email,
        display_name: body.display_name,
        role_id: body.role_id,
        status: UserStatus::Active,
        password_hash,
    };
    let json = user_to_json(&user);
    services.directory.upsert_user(user);

    (StatusCode::CREATED, Json(json)).into_response()
}

/// Assign a different role to a user. Takes effect on the user's next
/// request; nothing is cached in tokens.
pub async fn change_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<UserId>,
    Json(body): Json<dto::ChangeRoleRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::UsersChangeRole) {
        return resp;
    }

    let tenant_id = tenant.tenant_id();
    let Some(mut user) = services.directory.user(tenant_id, id) else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "user not found");
    };
    if services.directory.role(tenant_id, body.role_id).is_none() {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "role not found");
    }

    user.role_id = body.role_id;
    let json = user_to_json(&user);
    services.directory.upsert_user(user);

    (StatusCode::OK, Json(json)).into_response()
}

pub async fn get_settings(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::SettingsManage) {
        return resp;
    }

    let settings = services.settings.tenant_settings(tenant.tenant_id());
    (StatusCode::OK, Json(settings)).into_response()
}

pub async fn update_settings(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Json(body): Json<dto::UpdateSettingsRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::SettingsManage) {
        return resp;
    }

    let tenant_id = tenant.tenant_id();
    let mut settings = services.settings.tenant_settings(tenant_id);

    if let Some(v) = body.budget_warning_percent {
        settings.budget_warning_percent = v;
    }
    if let Some(v) = body.budget_critical_percent {
        settings.budget_critical_percent = v;
    }
    if let Some(v) = body.low_balance_threshold {
        settings.low_balance_threshold = v;
    }
    if settings.budget_warning_percent > settings.budget_critical_percent {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "warning threshold cannot exceed critical threshold",
        );
    }

    let json = serde_json::to_value(&settings).unwrap_or_default();
    services.settings.save_tenant_settings(settings);

    (StatusCode::OK, Json(json)).into_response()
}
