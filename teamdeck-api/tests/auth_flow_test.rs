/// Integration tests for the session endpoints
///
/// Run against a real PostgreSQL instance:
///
/// ```bash
/// DATABASE_URL=postgres://localhost/teamdeck_test cargo test -p teamdeck-api -- --ignored
/// ```

mod common;

use axum::http::StatusCode;
use chrono::Duration;
use common::{body_json, TestContext, ACCESS_SECRET};
use serde_json::json;
use teamdeck_shared::auth::jwt::{issue_token, Claims};
use uuid::Uuid;

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_register_conflict_on_duplicate_email() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.register_user("First").await.unwrap();

    let response = ctx
        .post(
            "/v1/auth/register",
            json!({
                "name": "Second",
                "email": user.email,
                "password": "different8pass",
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"], "email_exists");

    ctx.cleanup_user(&user).await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_register_rejects_weak_password() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .post(
            "/v1/auth/register",
            json!({
                "email": format!("weak-{}@example.com", Uuid::new_v4()),
                "password": "nodigits",
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_login_same_code_for_unknown_email_and_wrong_password() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.register_user("Login").await.unwrap();

    let wrong_password = ctx
        .post(
            "/v1/auth/login",
            json!({"email": user.email, "password": "not-the-password1"}),
        )
        .await;
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    let wrong_body = body_json(wrong_password).await;

    let unknown_email = ctx
        .post(
            "/v1/auth/login",
            json!({
                "email": format!("missing-{}@example.com", Uuid::new_v4()),
                "password": user.password,
            }),
        )
        .await;
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    let unknown_body = body_json(unknown_email).await;

    // Both failures carry the same code so emails cannot be enumerated
    assert_eq!(wrong_body["error"], "invalid_credentials");
    assert_eq!(unknown_body["error"], wrong_body["error"]);

    ctx.cleanup_user(&user).await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_login_returns_tokens_and_organizations() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.register_user("Login").await.unwrap();

    let response = ctx
        .post(
            "/v1/auth/login",
            json!({"email": user.email, "password": user.password}),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());
    assert!(body["organizations"].is_array());
    assert!(body["user"]["password_hash"].is_null());

    ctx.cleanup_user(&user).await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_logout_then_refresh_fails_invalid() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.register_user("Logout").await.unwrap();

    let logout = ctx
        .post("/v1/auth/logout", json!({"refresh_token": user.refresh_token}))
        .await;
    assert_eq!(logout.status(), StatusCode::OK);

    // Idempotent: a second logout still succeeds
    let again = ctx
        .post("/v1/auth/logout", json!({"refresh_token": user.refresh_token}))
        .await;
    assert_eq!(again.status(), StatusCode::OK);

    // The revoked token is invalid, not expired
    let refresh = ctx
        .post("/v1/auth/refresh", json!({"refresh_token": user.refresh_token}))
        .await;
    assert_eq!(refresh.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(refresh).await;
    assert_eq!(body["error"], "token_invalid");

    ctx.cleanup_user(&user).await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_refresh_rotation_makes_old_token_single_use() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.register_user("Rotate").await.unwrap();

    let first = ctx
        .post("/v1/auth/refresh", json!({"refresh_token": user.refresh_token}))
        .await;
    assert_eq!(first.status(), StatusCode::OK);
    let first_body = body_json(first).await;
    let new_refresh = first_body["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(new_refresh, user.refresh_token);

    let replay = ctx
        .post("/v1/auth/refresh", json!({"refresh_token": user.refresh_token}))
        .await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(replay).await["error"], "token_invalid");

    let second = ctx
        .post("/v1/auth/refresh", json!({"refresh_token": new_refresh}))
        .await;
    assert_eq!(second.status(), StatusCode::OK);

    ctx.cleanup_user(&user).await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_expired_stored_refresh_token_reports_expired() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.register_user("Expired").await.unwrap();

    sqlx::query("UPDATE refresh_tokens SET expires_at = NOW() - INTERVAL '1 hour' WHERE user_id = $1")
        .bind(user.user_id)
        .execute(&ctx.db)
        .await
        .unwrap();

    let refresh = ctx
        .post("/v1/auth/refresh", json!({"refresh_token": user.refresh_token}))
        .await;
    assert_eq!(refresh.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(refresh).await["error"], "token_expired");

    ctx.cleanup_user(&user).await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_me_requires_valid_access_token() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.register_user("Me").await.unwrap();

    // No header: rejected before any business logic
    let missing = ctx.get("/v1/auth/me").await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    // Garbage token
    let garbage = ctx
        .request_authed("GET", "/v1/auth/me", "not.a.token", None)
        .await;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(garbage).await["error"], "token_invalid");

    // Expired token is distinguished so clients refresh instead of re-login
    let expired_claims = Claims::access(
        user.user_id,
        user.email.clone(),
        None,
        Duration::seconds(-3600),
    );
    let expired_token = issue_token(&expired_claims, ACCESS_SECRET).unwrap();
    let expired = ctx
        .request_authed("GET", "/v1/auth/me", &expired_token, None)
        .await;
    assert_eq!(expired.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(expired).await["error"], "token_expired");

    // Valid token
    let ok = ctx
        .request_authed("GET", "/v1/auth/me", &user.access_token, None)
        .await;
    assert_eq!(ok.status(), StatusCode::OK);
    let body = body_json(ok).await;
    assert_eq!(body["user"]["email"], user.email.as_str());

    ctx.cleanup_user(&user).await;
}
