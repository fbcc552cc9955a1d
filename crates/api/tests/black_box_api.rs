use chrono::{Duration as ChronoDuration, Utc};
use ledgerly_auth::JwtClaims;
use ledgerly_core::{TenantId, UserId};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(jwt_secret: &str) -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let app = ledgerly_api::app::build_app(jwt_secret.to_string()).await;
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(jwt_secret: &str, tenant_id: TenantId, user_id: UserId) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: user_id,
        tenant_id,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

/// Sign up a fresh tenant and log its owner in; returns (tenant_id, user_id, token).
async fn signup_and_login(
    client: &reqwest::Client,
    base_url: &str,
    email: &str,
) -> (String, String, String) {
    let res = client
        .post(format!("{}/auth/signup", base_url))
        .json(&json!({
            "email": email,
            "display_name": "Owner",
            "password": "correct horse battery",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let signup: serde_json::Value = res.json().await.unwrap();

    let res = client
        .post(format!("{}/auth/login", base_url))
        .json(&json!({
            "email": email,
            "password": "correct horse battery",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let login: serde_json::Value = res.json().await.unwrap();

    (
        signup["tenant_id"].as_str().unwrap().to_string(),
        signup["user_id"].as_str().unwrap().to_string(),
        login["token"].as_str().unwrap().to_string(),
    )
}

async fn create_account(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    name: &str,
) -> serde_json::Value {
    let res = client
        .post(format!("{}/accounts", base_url))
        .bearer_auth(token)
        .json(&json!({ "name": name, "kind": "checking" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn("test-secret").await;

    let res = reqwest::Client::new()
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn("test-secret").await;

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_for_unknown_user_cannot_reach_data() {
    // A syntactically valid token is not enough: the guard resolves the
    // user's role from storage and finds nothing.
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, TenantId::new(), UserId::new());

    let res = reqwest::Client::new()
        .get(format!("{}/accounts", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_rejects_bad_password() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();
    signup_and_login(&client, &srv.base_url, "badpw@example.com").await;

    let res = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "email": "badpw@example.com", "password": "wrong" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_is_rate_limited_per_credential() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    // Default policy allows 5 attempts per credential per minute.
    let mut last = StatusCode::OK;
    for _ in 0..6 {
        let res = client
            .post(format!("{}/auth/login", srv.base_url))
            .json(&json!({ "email": "hammered@example.com", "password": "nope" }))
            .send()
            .await
            .unwrap();
        last = res.status();
    }
    assert_eq!(last, StatusCode::TOO_MANY_REQUESTS);

    // A different credential is unaffected.
    let res = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "email": "other@example.com", "password": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_rejects_duplicate_email() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();
    signup_and_login(&client, &srv.base_url, "dup@example.com").await;

    let res = client
        .post(format!("{}/auth/signup", srv.base_url))
        .json(&json!({
            "email": "dup@example.com",
            "display_name": "Second",
            "password": "another password",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn whoami_reports_identity_and_current_role() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();
    let (tenant_id, user_id, token) =
        signup_and_login(&client, &srv.base_url, "whoami@example.com").await;

    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();

    assert_eq!(body["tenant_id"], tenant_id.as_str());
    assert_eq!(body["user_id"], user_id.as_str());
    assert_eq!(body["role"], "owner");
}

#[tokio::test]
async fn accounts_are_isolated_between_tenants() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();
    let (_, _, token_a) = signup_and_login(&client, &srv.base_url, "a@example.com").await;
    let (_, _, token_b) = signup_and_login(&client, &srv.base_url, "b@example.com").await;

    let account = create_account(&client, &srv.base_url, &token_a, "A checking").await;
    let account_id = account["id"].as_str().unwrap();

    // Tenant B can't see it, by id or in listing.
    let res = client
        .get(format!("{}/accounts/{}", srv.base_url, account_id))
        .bearer_auth(&token_b)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .get(format!("{}/accounts", srv.base_url))
        .bearer_auth(&token_b)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["accounts"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn viewer_cannot_write_accounts() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();
    let (tenant_id, _, owner_token) =
        signup_and_login(&client, &srv.base_url, "owner-v@example.com").await;

    // Find the built-in viewer role.
    let res = client
        .get(format!("{}/admin/roles", srv.base_url))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap();
    let roles: serde_json::Value = res.json().await.unwrap();
    let viewer_role_id = roles["roles"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == "viewer")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    // Invite a viewer and mint a token for them directly.
    let res = client
        .post(format!("{}/admin/users", srv.base_url))
        .bearer_auth(&owner_token)
        .json(&json!({
            "email": "viewer@example.com",
            "display_name": "Viewer",
            "password": "viewer password",
            "role_id": viewer_role_id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let viewer: serde_json::Value = res.json().await.unwrap();
    let viewer_token = mint_jwt(
        jwt_secret,
        tenant_id.parse().unwrap(),
        viewer["id"].as_str().unwrap().parse().unwrap(),
    );

    // Reads are fine, writes are forbidden.
    let res = client
        .get(format!("{}/accounts", srv.base_url))
        .bearer_auth(&viewer_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(format!("{}/accounts", srv.base_url))
        .bearer_auth(&viewer_token)
        .json(&json!({ "name": "nope", "kind": "checking" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn role_change_takes_effect_on_next_request() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();
    let (tenant_id, _, owner_token) =
        signup_and_login(&client, &srv.base_url, "owner-rc@example.com").await;

    let res = client
        .get(format!("{}/admin/roles", srv.base_url))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap();
    let roles: serde_json::Value = res.json().await.unwrap();
    let role_id = |name: &str| {
        roles["roles"]
            .as_array()
            .unwrap()
            .iter()
            .find(|r| r["name"] == name)
            .unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string()
    };

    let res = client
        .post(format!("{}/admin/users", srv.base_url))
        .bearer_auth(&owner_token)
        .json(&json!({
            "email": "member-rc@example.com",
            "display_name": "Member",
            "password": "member password",
            "role_id": role_id("member"),
        }))
        .send()
        .await
        .unwrap();
    let member: serde_json::Value = res.json().await.unwrap();
    let member_id = member["id"].as_str().unwrap().to_string();
    let member_token = mint_jwt(
        jwt_secret,
        tenant_id.parse().unwrap(),
        member_id.parse().unwrap(),
    );

    // Member can write.
    create_account(&client, &srv.base_url, &member_token, "member account").await;

    // Demote to viewer; the same token loses write access immediately.
    let res = client
        .put(format!("{}/admin/users/{}/role", srv.base_url, member_id))
        .bearer_auth(&owner_token)
        .json(&json!({ "role_id": role_id("viewer") }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(format!("{}/accounts", srv.base_url))
        .bearer_auth(&member_token)
        .json(&json!({ "name": "no longer", "kind": "checking" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn transaction_above_threshold_triggers_alert_notification() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();
    let (_, _, token) = signup_and_login(&client, &srv.base_url, "alerts@example.com").await;

    let account = create_account(&client, &srv.base_url, &token, "checking").await;
    let account_id = account["id"].as_str().unwrap();

    let res = client
        .post(format!("{}/alerts/rules", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "name": "large expense",
            "condition": { "kind": "amount_above", "value": 10000 },
            "action": { "kind": "create_notification" },
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    // Below threshold: no trigger.
    let res = client
        .post(format!("{}/transactions", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "account_id": account_id,
            "kind": "expense",
            "amount": 5000,
            "description": "groceries",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["alerts_triggered"], 0);

    // Above threshold: triggers and leaves a notification behind.
    let res = client
        .post(format!("{}/transactions", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "account_id": account_id,
            "kind": "expense",
            "amount": 25000,
            "description": "new laptop",
        }))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["alerts_triggered"], 1);

    let res = client
        .get(format!("{}/notifications", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    let notifications = body["notifications"].as_array().unwrap();
    assert!(
        notifications
            .iter()
            .any(|n| n["title"].as_str().unwrap().contains("large expense"))
    );
}

#[tokio::test]
async fn malformed_rule_condition_is_rejected_up_front() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();
    let (_, _, token) = signup_and_login(&client, &srv.base_url, "malformed@example.com").await;

    let res = client
        .post(format!("{}/alerts/rules", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "name": "broken",
            "condition": { "kind": "no_such_condition" },
            "action": { "kind": "create_notification" },
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_rule");
}

#[tokio::test]
async fn periodic_check_is_idempotent_within_the_month() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();
    let (_, _, token) = signup_and_login(&client, &srv.base_url, "budget@example.com").await;

    let account = create_account(&client, &srv.base_url, &token, "spending").await;
    let account_id = account["id"].as_str().unwrap();

    let res = client
        .post(format!("{}/categories", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "groceries" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let category: serde_json::Value = res.json().await.unwrap();
    let category_id = category["id"].as_str().unwrap();

    let res = client
        .post(format!("{}/budgets", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "category_id": category_id,
            "name": "groceries",
            "monthly_limit": 10000,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    // Fund the account so the low-balance check stays quiet, then blow the
    // budget.
    let res = client
        .post(format!("{}/transactions", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "account_id": account_id,
            "kind": "income",
            "amount": 100000,
            "description": "salary",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(format!("{}/transactions", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "account_id": account_id,
            "category_id": category_id,
            "kind": "expense",
            "amount": 15000,
            "description": "big shop",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let check = |_: ()| {
        client
            .post(format!("{}/notifications/check", srv.base_url))
            .bearer_auth(&token)
            .send()
    };

    let first: serde_json::Value = check(()).await.unwrap().json().await.unwrap();
    assert_eq!(first["notifications_created"], 1);

    let second: serde_json::Value = check(()).await.unwrap().json().await.unwrap();
    assert_eq!(second["notifications_created"], 0);
}

#[tokio::test]
async fn goal_contribution_reports_milestones_once() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();
    let (_, _, token) = signup_and_login(&client, &srv.base_url, "goal@example.com").await;

    let res = client
        .post(format!("{}/goals", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "vacation", "target": 100000 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let goal: serde_json::Value = res.json().await.unwrap();
    let goal_id = goal["id"].as_str().unwrap();

    let res = client
        .post(format!("{}/goals/{}/contribute", srv.base_url, goal_id))
        .bearer_auth(&token)
        .json(&json!({ "amount": 30000 }))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["milestones_crossed"], json!([25]));

    // Jumping past several milestones reports each exactly once.
    let res = client
        .post(format!("{}/goals/{}/contribute", srv.base_url, goal_id))
        .bearer_auth(&token)
        .json(&json!({ "amount": 70000 }))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["milestones_crossed"], json!([50, 75, 100]));
}

#[tokio::test]
async fn webhook_secret_is_never_echoed() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();
    let (_, _, token) = signup_and_login(&client, &srv.base_url, "hooks@example.com").await;

    let res = client
        .post(format!("{}/webhooks", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "name": "billing",
            "url": "https://example.test/hook",
            "secret": "super-secret",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body.get("secret").is_none());

    let res = client
        .get(format!("{}/webhooks", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body = res.text().await.unwrap();
    assert!(!body.contains("super-secret"));
}
