/// Integration tests for the TaskZen API
///
/// Verifies the full system end to end:
/// - registration, login, and the uniform invalid-credentials response
/// - bearer-token gating and token lifetime handling
/// - owner isolation on every task operation
/// - identity resolution for OAuth profiles, including email linking
///
/// Tests touching Postgres are `#[ignore]`d; run them with
/// `cargo test -- --ignored` against a disposable database.
mod common;

use axum::http::StatusCode;
use chrono::Duration;
use common::{unique_email, TestContext, TEST_JWT_SECRET};
use serde_json::json;
use uuid::Uuid;

use taskzen_shared::auth::identity::{
    resolve_by_password, resolve_or_create_github, resolve_or_create_google, ExternalProfile,
};
use taskzen_shared::auth::jwt::{create_token, Claims};

// ---------------------------------------------------------------------------
// Tests that run without a database
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_register_validation_errors() {
    let ctx = TestContext::new_lazy();

    // Missing fields
    let (status, body) = ctx.request("POST", "/auth/register", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    // Malformed email
    let (status, body) = ctx
        .request(
            "POST",
            "/auth/register",
            None,
            Some(json!({"name": "Ann", "email": "nope", "password": "secret123"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert!(body["details"].is_array());

    // Short password
    let (status, _) = ctx
        .request(
            "POST",
            "/auth/register",
            None,
            Some(json!({"name": "Ann", "email": "a@x.com", "password": "short"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_tasks_require_bearer_token() {
    let ctx = TestContext::new_lazy();

    // No Authorization header
    let (status, body) = ctx.request("GET", "/tasks", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    // Garbage token
    let (status, body) = ctx.request("GET", "/tasks", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let ctx = TestContext::new_lazy();

    // Well past the validator's clock-skew leeway
    let claims = Claims::new(Uuid::new_v4(), Duration::hours(-1));
    let token = create_token(&claims, TEST_JWT_SECRET).unwrap();

    let (status, body) = ctx.request("GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_token_signed_with_wrong_secret_is_rejected() {
    let ctx = TestContext::new_lazy();

    let claims = Claims::new(Uuid::new_v4(), Duration::hours(1));
    let token = create_token(&claims, "some-other-secret-that-is-32-bytes!!").unwrap();

    let (status, _) = ctx.request("GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_oauth_routes_unconfigured() {
    let ctx = TestContext::new_lazy();

    let (status, body) = ctx.request("GET", "/auth/google", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "service_unavailable");

    let (status, _) = ctx.request("GET", "/auth/github", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_prioritize_requires_token() {
    let ctx = TestContext::new_lazy();

    // The gate runs before the handler can notice the missing service
    let (status, _) = ctx.request("GET", "/tasks/prioritize", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Tests that need a running Postgres
// ---------------------------------------------------------------------------

#[tokio::test]
#[ignore] // Requires running Postgres instance
async fn test_register_and_me_roundtrip() {
    let ctx = TestContext::new().await.unwrap();
    let email = unique_email("ann");

    let (token, user) = ctx.register_user("Ann", &email, "secret123").await;
    assert_eq!(user["name"], "Ann");
    assert_eq!(user["email"], email.as_str());
    assert!(user.get("password_hash").is_none());

    let (status, body) = ctx.request("GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Ann");
    assert_eq!(body["user"]["email"], email.as_str());
    assert!(body["user"].get("password_hash").is_none());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running Postgres instance
async fn test_duplicate_email_registration_conflicts() {
    let ctx = TestContext::new().await.unwrap();
    let email = unique_email("dup");

    ctx.register_user("First", &email, "secret123").await;

    let (status, body) = ctx
        .request(
            "POST",
            "/auth/register",
            None,
            Some(json!({"name": "Second", "email": email, "password": "secret456"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running Postgres instance
async fn test_login_and_uniform_invalid_credentials() {
    let ctx = TestContext::new().await.unwrap();
    let email = unique_email("login");

    ctx.register_user("Ann", &email, "secret123").await;

    // Correct credentials
    let (status, body) = ctx
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": email, "password": "secret123"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());

    // Wrong password twice: byte-identical error bodies
    let mut bodies = Vec::new();
    for _ in 0..2 {
        let (status, body) = ctx
            .request(
                "POST",
                "/auth/login",
                None,
                Some(json!({"email": email, "password": "wrong-password"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        bodies.push(body);
    }
    assert_eq!(bodies[0], bodies[1]);

    // Unknown email: same shape as wrong password
    let (status, body) = ctx
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": unique_email("ghost"), "password": "secret123"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, bodies[0]);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running Postgres instance
async fn test_task_crud_flow() {
    let ctx = TestContext::new().await.unwrap();
    let (token, _) = ctx
        .register_user("Ann", &unique_email("crud"), "secret123")
        .await;

    // Missing status is rejected at the boundary
    let (status, body) = ctx
        .request(
            "POST",
            "/tasks",
            Some(&token),
            Some(json!({"title": "No status", "priority": "LOW"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    // Malformed enum value
    let (status, _) = ctx
        .request(
            "POST",
            "/tasks",
            Some(&token),
            Some(json!({"title": "Bad", "priority": "URGENT", "status": "TODO"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Create with a deadline
    let (status, created) = ctx
        .request(
            "POST",
            "/tasks",
            Some(&token),
            Some(json!({
                "title": "Write spec",
                "priority": "high",
                "status": "todo",
                "deadline": "2025-06-01T12:00:00Z",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["title"], "Write spec");
    assert_eq!(created["priority"], "HIGH");
    assert_eq!(created["status"], "TODO");
    assert_eq!(created["description"], "");
    let task_id = created["id"].as_str().unwrap().to_string();

    // List contains it
    let (status, list) = ctx.request("GET", "/tasks", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(list
        .as_array()
        .unwrap()
        .iter()
        .any(|t| t["id"] == task_id.as_str()));

    // Partial update: status only
    let (status, updated) = ctx
        .request(
            "PUT",
            &format!("/tasks/{}", task_id),
            Some(&token),
            Some(json!({"status": "IN_PROGRESS"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "IN_PROGRESS");
    assert_eq!(updated["title"], "Write spec");

    // Clearing the deadline with an explicit null
    let (status, updated) = ctx
        .request(
            "PUT",
            &format!("/tasks/{}", task_id),
            Some(&token),
            Some(json!({"deadline": null})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(updated["deadline"].is_null());

    // Delete, then the id is gone
    let (status, _) = ctx
        .request("DELETE", &format!("/tasks/{}", task_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .request("GET", &format!("/tasks/{}", task_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running Postgres instance
async fn test_owner_isolation() {
    let ctx = TestContext::new().await.unwrap();

    let (token_a, _) = ctx
        .register_user("Ann", &unique_email("owner-a"), "secret123")
        .await;
    let (token_b, _) = ctx
        .register_user("Bob", &unique_email("owner-b"), "secret123")
        .await;

    let task_id = ctx.create_task(&token_a, "Ann's task").await;

    // B cannot see, update, or delete A's task; every answer is the same 404
    let (status, body) = ctx
        .request("GET", &format!("/tasks/{}", task_id), Some(&token_b), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _) = ctx
        .request(
            "PUT",
            &format!("/tasks/{}", task_id),
            Some(&token_b),
            Some(json!({"title": "Hijacked"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .request("DELETE", &format!("/tasks/{}", task_id), Some(&token_b), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // B's listing does not include it
    let (_, list) = ctx.request("GET", "/tasks", Some(&token_b), None).await;
    assert!(list
        .as_array()
        .unwrap()
        .iter()
        .all(|t| t["id"] != task_id.as_str()));

    // And the task is untouched for A
    let (status, body) = ctx
        .request("GET", &format!("/tasks/{}", task_id), Some(&token_a), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Ann's task");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running Postgres instance
async fn test_token_for_deleted_user_is_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let (token, user) = ctx
        .register_user("Ghost", &unique_email("ghost"), "secret123")
        .await;

    let user_id: Uuid = user["id"].as_str().unwrap().parse().unwrap();
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&ctx.db)
        .await
        .unwrap();

    // The token still carries a valid signature; the gate rejects at lookup
    let (status, body) = ctx.request("GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running Postgres instance
async fn test_oauth_resolution_is_idempotent() {
    let ctx = TestContext::new().await.unwrap();

    let profile = ExternalProfile {
        provider_id: format!("gh-{}", Uuid::new_v4()),
        name: "octocat".to_string(),
        email: None,
    };

    let first = resolve_or_create_github(&ctx.db, &profile).await.unwrap();
    let second = resolve_or_create_github(&ctx.db, &profile).await.unwrap();

    assert_eq!(first.id, second.id);
    assert!(first.email.is_none(), "absent provider email stays unset");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running Postgres instance
async fn test_oauth_email_match_links_instead_of_duplicating() {
    let ctx = TestContext::new().await.unwrap();
    let email = unique_email("link");

    ctx.register_user("Ann", &email, "secret123").await;

    let profile = ExternalProfile {
        provider_id: format!("goog-{}", Uuid::new_v4()),
        name: "Ann G".to_string(),
        email: Some(email.clone()),
    };

    let resolved = resolve_or_create_google(&ctx.db, &profile).await.unwrap();
    assert_eq!(resolved.email.as_deref(), Some(email.as_str()));
    assert_eq!(resolved.google_id.as_deref(), Some(profile.provider_id.as_str()));
    // The password identity survives the link
    assert!(resolved.password_hash.is_some());

    // Password login still resolves to the same account
    let by_password = resolve_by_password(&ctx.db, &email, "secret123")
        .await
        .unwrap();
    assert_eq!(by_password.id, resolved.id);

    // Only one user row for this email
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(&email)
            .fetch_one(&ctx.db)
            .await
            .unwrap();
    assert_eq!(count, 1);

    ctx.cleanup().await.unwrap();
}
