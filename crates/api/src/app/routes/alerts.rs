//! Alert rule CRUD and on-demand evaluation.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use ledgerly_alerts::{AlertRuleId, AlertRuleStore, RawAlertRule};
use ledgerly_auth::Permission;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;

pub fn router() -> Router {
    Router::new()
        .route("/rules", post(create_rule).get(list_rules))
        .route("/rules/:id", get(get_rule).put(update_rule).delete(delete_rule))
        .route("/check", post(run_check))
}

/// Validate the loose JSON condition/action and produce the typed rule.
fn decode_or_response(raw: RawAlertRule) -> Result<ledgerly_alerts::AlertRule, axum::response::Response> {
    raw.decode().map_err(|e| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_rule", e.to_string())
    })
}

pub async fn create_rule(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Json(body): Json<dto::CreateAlertRuleRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::AlertsWrite) {
        return resp;
    }

    let raw = RawAlertRule {
        id: AlertRuleId::new(),
        tenant_id: tenant.tenant_id(),
        name: body.name,
        condition: body.condition,
        action: body.action,
        active: body.active,
        last_triggered: None,
        trigger_count: 0,
    };
    let rule = match decode_or_response(raw) {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    let json = serde_json::to_value(rule.clone().into_raw()).unwrap_or_default();
    services.rules.upsert(rule);

    (StatusCode::CREATED, Json(json)).into_response()
}

pub async fn list_rules(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::AlertsRead) {
        return resp;
    }

    let rules = services.rules.list(tenant.tenant_id());
    (StatusCode::OK, Json(serde_json::json!({ "rules": rules }))).into_response()
}

pub async fn get_rule(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<AlertRuleId>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::AlertsRead) {
        return resp;
    }

    match services.rules.get(tenant.tenant_id(), id) {
        Some(rule) => (StatusCode::OK, Json(rule.into_raw())).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "alert rule not found"),
    }
}

pub async fn update_rule(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<AlertRuleId>,
    Json(body): Json<dto::UpdateAlertRuleRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::AlertsWrite) {
        return resp;
    }

    let tenant_id = tenant.tenant_id();
    let Some(existing) = services.rules.get(tenant_id, id) else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "alert rule not found");
    };

    let mut raw = existing.into_raw();
    if let Some(name) = body.name {
        raw.name = name;
    }
    if let Some(condition) = body.condition {
        raw.condition = condition;
    }
    if let Some(action) = body.action {
        raw.action = action;
    }
    if let Some(active) = body.active {
        raw.active = active;
    }

    let rule = match decode_or_response(raw) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let json = serde_json::to_value(rule.clone().into_raw()).unwrap_or_default();
    services.rules.upsert(rule);

    (StatusCode::OK, Json(json)).into_response()
}

pub async fn delete_rule(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<AlertRuleId>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::AlertsWrite) {
        return resp;
    }

    if services.rules.remove(tenant.tenant_id(), id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        errors::json_error(StatusCode::NOT_FOUND, "not_found", "alert rule not found")
    }
}

/// Evaluate all active rules without a triggering transaction.
pub async fn run_check(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::AlertsRead) {
        return resp;
    }

    let report = services.engine().evaluate(tenant.tenant_id(), None).await;
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "evaluated": report.evaluated(),
            "triggered": report.triggered(),
            "skipped": report.skipped(),
        })),
    )
        .into_response()
}
