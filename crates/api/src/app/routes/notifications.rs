//! Notification listing, read marking, preferences, and the periodic check.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};

use ledgerly_alerts::{NotificationId, NotificationStore, SettingsStore};
use ledgerly_auth::Permission;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_notifications))
        .route("/:id/read", post(mark_read))
        .route("/check", post(run_periodic_check))
        .route("/prefs", get(get_prefs).put(update_prefs))
}

pub async fn list_notifications(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::NotificationsRead) {
        return resp;
    }

    let user_id = principal.user_id();
    // Tenant-wide notifications plus the caller's own; never other users'.
    let notifications: Vec<_> = services
        .notifications
        .list(tenant.tenant_id())
        .into_iter()
        .filter(|n| n.user_id.is_none() || n.user_id == Some(user_id))
        .collect();

    (
        StatusCode::OK,
        Json(serde_json::json!({ "notifications": notifications })),
    )
        .into_response()
}

pub async fn mark_read(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<NotificationId>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::NotificationsWrite) {
        return resp;
    }

    if services.notifications.mark_read(tenant.tenant_id(), id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        errors::json_error(StatusCode::NOT_FOUND, "not_found", "notification not found")
    }
}

/// Run budget/balance/goal checks now. Safe to call repeatedly; duplicate
/// suppression makes it idempotent within each window.
pub async fn run_periodic_check(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::NotificationsWrite) {
        return resp;
    }

    let created = services.engine().run_periodic_checks(tenant.tenant_id()).await;
    (
        StatusCode::OK,
        Json(serde_json::json!({ "notifications_created": created })),
    )
        .into_response()
}

pub async fn get_prefs(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::NotificationsRead) {
        return resp;
    }

    let prefs = services
        .settings
        .user_prefs(tenant.tenant_id(), principal.user_id());
    (StatusCode::OK, Json(prefs)).into_response()
}

pub async fn update_prefs(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Json(body): Json<dto::UpdatePrefsRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::NotificationsWrite) {
        return resp;
    }

    let tenant_id = tenant.tenant_id();
    let user_id = principal.user_id();
    let mut prefs = services.settings.user_prefs(tenant_id, user_id);

    if let Some(v) = body.notify_on_budget_exceeded {
        prefs.notify_on_budget_exceeded = v;
    }
    if let Some(v) = body.notify_on_low_balance {
        prefs.notify_on_low_balance = v;
    }
    if let Some(v) = body.notify_on_goal_milestone {
        prefs.notify_on_goal_milestone = v;
    }

    services.settings.save_user_prefs(tenant_id, user_id, prefs);
    (StatusCode::OK, Json(prefs)).into_response()
}
