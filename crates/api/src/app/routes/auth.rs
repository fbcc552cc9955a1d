//! Credential login and tenant signup (public endpoints).

use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use chrono::{Duration, Utc};

use ledgerly_auth::{JwtClaims, verify_password};

use crate::app::dto;
use crate::app::errors;
use crate::app::services::AppServices;

const TOKEN_LIFETIME_MINUTES: i64 = 60;

pub async fn signup(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::SignupRequest>,
) -> axum::response::Response {
    match services.provision_tenant(&body.email, &body.display_name, &body.password) {
        Ok((tenant_id, user)) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "tenant_id": tenant_id.to_string(),
                "user_id": user.id.to_string(),
            })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> axum::response::Response {
    // Rate limit keys on the credential, not the caller, so lockout pressure
    // lands on the attacked account only.
    if !services.login_limiter.check(&body.email) {
        return errors::json_error(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "too many login attempts; try again later",
        );
    }

    let Some(user) = services.directory.find_by_email(&body.email) else {
        return invalid_credentials();
    };

    if !user.can_authenticate() || !verify_password(&body.password, &user.password_hash) {
        return invalid_credentials();
    }

    let now = Utc::now();
    let claims = JwtClaims {
        sub: user.id,
        tenant_id: user.tenant_id,
        issued_at: now,
        expires_at: now + Duration::minutes(TOKEN_LIFETIME_MINUTES),
    };

    let token = match services.jwt().encode(&claims) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "failed to encode login token");
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "token_error",
                "failed to issue token",
            );
        }
    };

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "token": token,
            "tenant_id": user.tenant_id.to_string(),
            "user_id": user.id.to_string(),
            "expires_at": claims.expires_at,
        })),
    )
        .into_response()
}

fn invalid_credentials() -> axum::response::Response {
    errors::json_error(
        StatusCode::UNAUTHORIZED,
        "invalid_credentials",
        "email or password is incorrect",
    )
}
