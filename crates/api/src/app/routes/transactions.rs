//! Transaction recording.
//!
//! Creating a transaction kicks off alert evaluation with the transaction as
//! context; the response reports how many rules fired.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use ledgerly_alerts::AlertContext;
use ledgerly_auth::Permission;
use ledgerly_core::Money;
use ledgerly_ledger::{Transaction, TransactionId, TransactionKind};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_transaction).get(list_transactions))
        .route("/:id", get(get_transaction).delete(delete_transaction))
}

pub async fn create_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Json(body): Json<dto::CreateTransactionRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::TransactionsWrite) {
        return resp;
    }

    let tenant_id = tenant.tenant_id();
    if body.amount <= Money::ZERO {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "amount must be positive",
        );
    }
    if services.finance.account(tenant_id, body.account_id).is_none() {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "account not found");
    }
    if let TransactionKind::Transfer { to_account } = body.kind {
        if services.finance.account(tenant_id, to_account).is_none() {
            return errors::json_error(
                StatusCode::NOT_FOUND,
                "not_found",
                "destination account not found",
            );
        }
        if to_account == body.account_id {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "cannot transfer to the same account",
            );
        }
    }
    if let Some(category_id) = body.category_id {
        if services.finance.category(tenant_id, category_id).is_none() {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "category not found");
        }
    }

    let transaction = Transaction {
        id: TransactionId::new(),
        tenant_id,
        account_id: body.account_id,
        category_id: body.category_id,
        kind: body.kind,
        amount: body.amount,
        description: body.description,
        occurred_at: body.occurred_at.unwrap_or_else(Utc::now),
    };
    let ctx = AlertContext::for_transaction(&transaction);
    let json = serde_json::to_value(&transaction).unwrap_or_default();
    services.finance.insert_transaction(transaction);

    let report = services.engine().evaluate(tenant_id, Some(&ctx)).await;

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "transaction": json,
            "alerts_triggered": report.triggered(),
        })),
    )
        .into_response()
}

pub async fn list_transactions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::TransactionsRead) {
        return resp;
    }

    let transactions = services.finance.transactions(tenant.tenant_id());
    (
        StatusCode::OK,
        Json(serde_json::json!({ "transactions": transactions })),
    )
        .into_response()
}

pub async fn get_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<TransactionId>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::TransactionsRead) {
        return resp;
    }

    match services.finance.transaction(tenant.tenant_id(), id) {
        Some(tx) => (StatusCode::OK, Json(tx)).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "transaction not found"),
    }
}

pub async fn delete_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<TransactionId>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::TransactionsWrite) {
        return resp;
    }

    if services.finance.remove_transaction(tenant.tenant_id(), id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        errors::json_error(StatusCode::NOT_FOUND, "not_found", "transaction not found")
    }
}
