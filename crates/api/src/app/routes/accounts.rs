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
use ledgerly_core::{AccountId, Money};
use ledgerly_ledger::Account;

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::authz;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_account).get(list_accounts))
        .route(
            "/:id",
            get(get_account).put(update_account).delete(delete_account),
        )
        .route("/:id/balance", get(account_balance))
}

pub async fn create_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Json(body): Json<dto::CreateAccountRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::AccountsWrite) {
        return resp;
    }
    if body.name.trim().is_empty() {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "name is required");
    }

    let account = Account {
        id: AccountId::new(),
        tenant_id: tenant.tenant_id(),
        name: body.name,
        kind: body.kind,
        created_at: Utc::now(),
    };
    let json = dto::account_to_json(&account, Money::ZERO);
    services.finance.upsert_account(account);

    (StatusCode::CREATED, Json(json)).into_response()
}

pub async fn list_accounts(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::AccountsRead) {
        return resp;
    }

    let tenant_id = tenant.tenant_id();
    let accounts: Vec<serde_json::Value> = services
        .finance
        .accounts(tenant_id)
        .iter()
        .map(|a| {
            let balance = services
                .finance
                .account_balance(tenant_id, a.id)
                .unwrap_or(Money::ZERO);
            dto::account_to_json(a, balance)
        })
        .collect();

    (StatusCode::OK, Json(serde_json::json!({ "accounts": accounts }))).into_response()
}

pub async fn get_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<AccountId>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::AccountsRead) {
        return resp;
    }

    let tenant_id = tenant.tenant_id();
    match services.finance.account(tenant_id, id) {
        Some(account) => {
            let balance = services
                .finance
                .account_balance(tenant_id, id)
                .unwrap_or(Money::ZERO);
            (StatusCode::OK, Json(dto::account_to_json(&account, balance))).into_response()
        }
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "account not found"),
    }
}

pub async fn update_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<AccountId>,
    Json(body): Json<dto::UpdateAccountRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::AccountsWrite) {
        return resp;
    }

    let tenant_id = tenant.tenant_id();
    let Some(mut account) = services.finance.account(tenant_id, id) else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "account not found");
    };

    if let Some(name) = body.name {
        if name.trim().is_empty() {
            return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "name is required");
        }
        account.name = name;
    }
    if let Some(kind) = body.kind {
        account.kind = kind;
    }

    let balance = services
        .finance
        .account_balance(tenant_id, id)
        .unwrap_or(Money::ZERO);
    let json = dto::account_to_json(&account, balance);
    services.finance.upsert_account(account);

    (StatusCode::OK, Json(json)).into_response()
}

pub async fn delete_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<AccountId>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::AccountsWrite) {
        return resp;
    }

    if services.finance.remove_account(tenant.tenant_id(), id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        errors::json_error(StatusCode::NOT_FOUND, "not_found", "account not found")
    }
}

pub async fn account_balance(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<AccountId>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::AccountsRead) {
        return resp;
    }

    match services.finance.account_balance(tenant.tenant_id(), id) {
        Some(balance) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "account_id": id.to_string(),
                "balance": balance,
            })),
        )
            .into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "account not found"),
    }
}
