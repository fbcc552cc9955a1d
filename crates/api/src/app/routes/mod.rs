use axum::{Router, routing::get};

pub mod accounts;
pub mod admin;
pub mod alerts;
pub mod auth;
pub mod budgets;
pub mod categories;
pub mod goals;
pub mod notifications;
pub mod system;
pub mod transactions;
pub mod webhooks;

/// Router for all authenticated (tenant-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/stream", get(system::stream))
        .nest("/accounts", accounts::router())
        .nest("/categories", categories::router())
        .nest("/transactions", transactions::router())
        .nest("/budgets", budgets::router())
        .nest("/goals", goals::router())
        .nest("/alerts", alerts::router())
        .nest("/notifications", notifications::router())
        .nest("/webhooks", webhooks::router())
        .nest("/admin", admin::router())
}
