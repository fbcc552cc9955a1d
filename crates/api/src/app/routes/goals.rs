use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use ledgerly_alerts::FinanceReader;
use ledgerly_auth::Permission;
use ledgerly_budgets::{Goal, GoalId};
use ledgerly_core::Money;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_goal).get(list_goals))
        .route("/:id", get(get_goal).delete(delete_goal))
        .route("/:id/contribute", post(contribute))
}

pub async fn create_goal(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Json(body): Json<dto::CreateGoalRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::GoalsWrite) {
        return resp;
    }
    if body.target <= Money::ZERO {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "target must be positive",
        );
    }

    let goal = Goal {
        id: GoalId::new(),
        tenant_id: tenant.tenant_id(),
        name: body.name,
        target: body.target,
        saved: Money::ZERO,
        created_at: Utc::now(),
    };
    let json = dto::goal_to_json(&goal);
    services.finance.upsert_goal(goal);

    (StatusCode::CREATED, Json(json)).into_response()
}

pub async fn list_goals(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::GoalsRead) {
        return resp;
    }

    let mut goals = services.finance.goals(tenant.tenant_id());
    goals.sort_by(|a, b| a.name.cmp(&b.name));
    let reports: Vec<serde_json::Value> = goals.iter().map(dto::goal_to_json).collect();

    (StatusCode::OK, Json(serde_json::json!({ "goals": reports }))).into_response()
}

pub async fn get_goal(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<GoalId>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::GoalsRead) {
        return resp;
    }

    match services.finance.goal(tenant.tenant_id(), id) {
        Some(goal) => (StatusCode::OK, Json(dto::goal_to_json(&goal))).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "goal not found"),
    }
}

/// Add to a goal's saved amount. Milestone crossings caused by this
/// contribution come back in the response; the notification fan-out happens
/// on the next periodic check.
pub async fn contribute(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<GoalId>,
    Json(body): Json<dto::ContributeRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::GoalsWrite) {
        return resp;
    }
    if body.amount <= Money::ZERO {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "amount must be positive",
        );
    }

    let tenant_id = tenant.tenant_id();
    let Some(mut goal) = services.finance.goal(tenant_id, id) else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "goal not found");
    };

    let milestones = goal.contribute(body.amount);
    let json = dto::goal_to_json(&goal);
    services.finance.upsert_goal(goal);

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "goal": json,
            "milestones_crossed": milestones,
        })),
    )
        .into_response()
}

pub async fn delete_goal(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<GoalId>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::GoalsWrite) {
        return resp;
    }

    if services.finance.remove_goal(tenant.tenant_id(), id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        errors::json_error(StatusCode::NOT_FOUND, "not_found", "goal not found")
    }
}
