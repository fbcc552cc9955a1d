use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};

use ledgerly_auth::Permission;
use ledgerly_core::CategoryId;
use ledgerly_ledger::Category;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_category).get(list_categories))
        .route("/:id", axum::routing::delete(delete_category))
}

pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Json(body): Json<dto::CreateCategoryRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::TransactionsWrite) {
        return resp;
    }
    if body.name.trim().is_empty() {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "name is required");
    }

    let tenant_id = tenant.tenant_id();
    // Category names are unique per tenant.
    if services
        .finance
        .categories(tenant_id)
        .iter()
        .any(|c| c.name.eq_ignore_ascii_case(&body.name))
    {
        return errors::json_error(StatusCode::CONFLICT, "conflict", "category already exists");
    }

    let category = Category {
        id: CategoryId::new(),
        tenant_id,
        name: body.name,
    };
    let json = serde_json::to_value(&category).unwrap_or_default();
    services.finance.upsert_category(category);

    (StatusCode::CREATED, Json(json)).into_response()
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::TransactionsRead) {
        return resp;
    }

    let mut categories = services.finance.categories(tenant.tenant_id());
    categories.sort_by(|a, b| a.name.cmp(&b.name));

    (StatusCode::OK, Json(serde_json::json!({ "categories": categories }))).into_response()
}

pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<CategoryId>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::TransactionsWrite) {
        return resp;
    }

    if services.finance.remove_category(tenant.tenant_id(), id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        errors::json_error(StatusCode::NOT_FOUND, "not_found", "category not found")
    }
}
