//! Webhook registration CRUD and test delivery.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use ledgerly_auth::Permission;
use ledgerly_webhooks::{WebhookId, WebhookRegistration, WebhookStore};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_webhook).get(list_webhooks))
        .route("/:id", get(get_webhook).put(update_webhook).delete(delete_webhook))
        .route("/:id/test", post(test_webhook))
}

pub async fn create_webhook(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Json(body): Json<dto::CreateWebhookRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::WebhooksManage) {
        return resp;
    }
    if !body.url.starts_with("http://") && !body.url.starts_with("https://") {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "url must be http(s)",
        );
    }

    let registration = WebhookRegistration {
        id: WebhookId::new(),
        tenant_id: tenant.tenant_id(),
        name: body.name,
        url: body.url,
        secret: body.secret,
        events: body.events,
        enabled: body.enabled,
    };
    // The secret is skipped on serialize, so the response never echoes it.
    let json = serde_json::to_value(&registration).unwrap_or_default();
    services.webhooks.upsert(registration);

    (StatusCode::CREATED, Json(json)).into_response()
}

pub async fn list_webhooks(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::WebhooksManage) {
        return resp;
    }

    let webhooks = services.webhooks.list(tenant.tenant_id());
    (StatusCode::OK, Json(serde_json::json!({ "webhooks": webhooks }))).into_response()
}

pub async fn get_webhook(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<WebhookId>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::WebhooksManage) {
        return resp;
    }

    match services.webhooks.get(tenant.tenant_id(), id) {
        Some(w) => (StatusCode::OK, Json(w)).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "webhook not found"),
    }
}

pub async fn update_webhook(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<WebhookId>,
    Json(body): Json<dto::UpdateWebhookRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::WebhooksManage) {
        return resp;
    }

    let Some(mut registration) = services.webhooks.get(tenant.tenant_id(), id) else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "webhook not found");
    };

    if let Some(name) = body.name {
        registration.name = name;
    }
    if let Some(url) = body.url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "url must be http(s)",
            );
        }
        registration.url = url;
    }
    if let Some(secret) = body.secret {
        registration.secret = secret;
    }
    if let Some(events) = body.events {
        registration.events = events;
    }
    if let Some(enabled) = body.enabled {
        registration.enabled = enabled;
    }

    let json = serde_json::to_value(&registration).unwrap_or_default();
    services.webhooks.upsert(registration);

    (StatusCode::OK, Json(json)).into_response()
}

pub async fn delete_webhook(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<WebhookId>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::WebhooksManage) {
        return resp;
    }

    if services.webhooks.remove(tenant.tenant_id(), id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        errors::json_error(StatusCode::NOT_FOUND, "not_found", "webhook not found")
    }
}

/// Fire a signed test event at the registration's URL.
pub async fn test_webhook(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<crate::context::TenantContext>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<WebhookId>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&services, &tenant, &principal, Permission::WebhooksManage) {
        return resp;
    }

    let tenant_id = tenant.tenant_id();
    if services.webhooks.get(tenant_id, id).is_none() {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "webhook not found");
    }

    // Delivery is fire-and-forget; the response only confirms dispatch.
    services
        .publisher
        .publish(
            tenant_id,
            "webhook.test",
            serde_json::json!({ "sent_at": Utc::now() }),
        )
        .await;

    (StatusCode::ACCEPTED, Json(serde_json::json!({ "dispatched": true }))).into_response()
}
