use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use ledgerly_alerts::{FinanceReader, SettingsStore};
use ledgerly_auth::Permission;
use ledgerly_budgets::{Budget, BudgetId};
use ledgerly_core::Money;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_budget).get(list_budgets))
        .route("/:id", get(get_budget).put(update_budget).delete(delete_budget))
}

fn budget_report(services: &AppServices, budget: &Budget) -> serde_json::Value {
    let now = Utc::now();
    let spent = services
        .finance
        .month_category_spend(budget.tenant_id, budget.category_id, now)
        .unwrap_or(Money::ZERO);
    let settings = services.settings.tenant_settings(budget.tenant_id);
    let status = budget.status(
        spent,
        settings.budget_warning_percent,
        settings.budget_critical_percent,
    );
    dto::budget_to_json(budget, spent, status)
}

pub async fn create_budget(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Json(body): Json<dto::CreateBudgetRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::BudgetsWrite) {
        return resp;
    }

    let tenant_id = tenant.tenant_id();
    if body.monthly_limit <= Money::ZERO {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "monthly_limit must be positive",
        );
    }
    if services.finance.category(tenant_id, body.category_id).is_none() {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "category not found");
    }
    // One budget per category.
    if services
        .finance
        .budgets(tenant_id)
        .iter()
        .any(|b| b.category_id == body.category_id)
    {
        return errors::json_error(
            StatusCode::CONFLICT,
            "conflict",
            "a budget for this category already exists",
        );
    }

    let budget = Budget {
        id: BudgetId::new(),
        tenant_id,
        category_id: body.category_id,
        name: body.name,
        monthly_limit: body.monthly_limit,
    };
    let json = budget_report(&services, &budget);
    services.finance.upsert_budget(budget);

    (StatusCode::CREATED, Json(json)).into_response()
}

pub async fn list_budgets(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::BudgetsRead) {
        return resp;
    }

    let mut budgets = services.finance.budgets(tenant.tenant_id());
    budgets.sort_by(|a, b| a.name.cmp(&b.name));
    let reports: Vec<serde_json::Value> = budgets
        .iter()
        .map(|b| budget_report(&services, b))
        .collect();

    (StatusCode::OK, Json(serde_json::json!({ "budgets": reports }))).into_response()
}

pub async fn get_budget(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<BudgetId>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::BudgetsRead) {
        return resp;
    }

    match services.finance.budget(tenant.tenant_id(), id) {
        Some(budget) => (StatusCode::OK, Json(budget_report(&services, &budget))).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "budget not found"),
    }
}

pub async fn update_budget(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<BudgetId>,
    Json(body): Json<dto::UpdateBudgetRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::BudgetsWrite) {
        return resp;
    }

    let Some(mut budget) = services.finance.budget(tenant.tenant_id(), id) else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "budget not found");
    };

    if let Some(name) = body.name {
        budget.name = name;
    }
    if let Some(limit) = body.monthly_limit {
        if limit <= Money::ZERO {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "monthly_limit must be positive",
            );
        }
        budget.monthly_limit = limit;
    }

    let json = budget_report(&services, &budget);
    services.finance.upsert_budget(budget);

    (StatusCode::OK, Json(json)).into_response()
}

pub async fn delete_budget(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<BudgetId>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::BudgetsWrite) {
        return resp;
    }

    if services.finance.remove_budget(tenant.tenant_id(), id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        errors::json_error(StatusCode::NOT_FOUND, "not_found", "budget not found")
    }
}
