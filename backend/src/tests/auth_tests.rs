use axum::http::StatusCode;
use axum::http::header;
use serde_json::Value;
use serde_json::json;

use crate::auth;
use crate::cfg;
use crate::tests::support::{self, JWT_SECRET, TEST_PASSWORD};

#[tokio::test]
async fn test_signup_returns_tokens_role_and_home() {
    let app = support::spawn_app().await;

    let body = app.signup("Owner@Example.com", "owner", "9876543210").await;
    assert_eq!(body["result"], "ok");
    assert!(body["tokens"]["access_token"].is_string());
    assert!(body["tokens"]["refresh_token"].is_string());
    assert_eq!(body["user"]["email"], "owner@example.com");
    assert_eq!(body["role"], "owner");
    assert_eq!(body["home"], "/owner/dashboard");
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_signup_duplicate_email_conflicts() {
    let app = support::spawn_app().await;
    app.signup("tenant@example.com", "tenant", "").await;

    let response = app
        .server
        .post("/auth/signup")
        .json(&json!({
            "email": "tenant@example.com",
            "password": TEST_PASSWORD,
            "full_name": "Someone Else",
            "role": "owner",
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["result"], "error");
}

#[tokio::test]
async fn test_signup_rejects_admin_role_and_short_password() {
    let app = support::spawn_app().await;

    let response = app
        .server
        .post("/auth/signup")
        .json(&json!({
            "email": "sneaky@example.com",
            "password": TEST_PASSWORD,
            "full_name": "Sneaky",
            "role": "admin",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = app
        .server
        .post("/auth/signup")
        .json(&json!({
            "email": "short@example.com",
            "password": "abc",
            "full_name": "Short",
            "role": "tenant",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_success() {
    let app = support::spawn_app().await;
    app.signup("owner@example.com", "owner", "").await;

    let response = app
        .server
        .post("/auth/login")
        .json(&json!({
            "email": "owner@example.com",
            "password": TEST_PASSWORD
        }))
        .await;

    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["result"], "ok");
    assert!(body["tokens"]["access_token"].is_string());
    assert_eq!(body["role"], "owner");
    assert_eq!(body["home"], "/owner/dashboard");
}

#[tokio::test]
async fn test_login_invalid_credentials() {
    let app = support::spawn_app().await;
    app.signup("owner@example.com", "owner", "").await;

    let response = app
        .server
        .post("/auth/login")
        .json(&json!({
            "email": "owner@example.com",
            "password": "wrong_password"
        }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["result"], "error");
}

#[tokio::test]
async fn test_login_nonexistent_user() {
    let app = support::spawn_app().await;

    let response = app
        .server
        .post("/auth/login")
        .json(&json!({
            "email": "nobody@example.com",
            "password": "password"
        }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_and_revoke_token() {
    let app = support::spawn_app().await;
    let body = app.signup("tenant@example.com", "tenant", "").await;
    let refresh_token = body["tokens"]["refresh_token"].as_str().unwrap();

    let refresh_response = app
        .server
        .post("/auth/refresh")
        .json(&json!({"refresh_token": refresh_token}))
        .await;
    refresh_response.assert_status(StatusCode::OK);
    let refresh_body: Value = refresh_response.json();
    assert!(refresh_body["access_token"].is_string());
    assert_eq!(refresh_body["user"]["email"], "tenant@example.com");

    app.server
        .post("/auth/revoke")
        .json(&json!({"refresh_token": refresh_token}))
        .await
        .assert_status(StatusCode::OK);

    app.server
        .post("/auth/refresh")
        .json(&json!({"refresh_token": refresh_token}))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_refresh_tokens() {
    let app = support::spawn_app().await;
    let body = app.signup("owner@example.com", "owner", "").await;
    let access_token = body["tokens"]["access_token"].as_str().unwrap();
    let refresh_token = body["tokens"]["refresh_token"].as_str().unwrap();

    app.server
        .get("/auth/logout")
        .add_header(header::AUTHORIZATION, format!("Bearer {access_token}"))
        .await
        .assert_status(StatusCode::OK);

    app.server
        .post("/auth/refresh")
        .json(&json!({"refresh_token": refresh_token}))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_states() {
    let app = support::spawn_app().await;

    let anonymous: Value = app.server.get("/auth/session").await.json();
    assert_eq!(anonymous["state"], "anonymous");

    let (_, token) = app.signup_token("tenant@example.com", "tenant").await;
    let resolved: Value = app
        .server
        .get("/auth/session")
        .add_header(header::AUTHORIZATION, format!("Bearer {token}"))
        .await
        .json();
    assert_eq!(resolved["state"], "resolved");
    assert_eq!(resolved["role"], "tenant");
    assert_eq!(resolved["home"], "/tenant/dashboard");

    let (_, pending_token) = app.pending_user("pending@example.com").await;
    let pending: Value = app
        .server
        .get("/auth/session")
        .add_header(header::AUTHORIZATION, format!("Bearer {pending_token}"))
        .await
        .json();
    assert_eq!(pending["state"], "pending");
}

#[tokio::test]
async fn test_change_password() {
    let app = support::spawn_app().await;
    let (_, token) = app.signup_token("owner@example.com", "owner").await;

    app.server
        .post("/auth/password")
        .add_header(header::AUTHORIZATION, format!("Bearer {token}"))
        .json(&json!({"current_password": "not-it", "new_password": "brand-new-secret"}))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    app.server
        .post("/auth/password")
        .add_header(header::AUTHORIZATION, format!("Bearer {token}"))
        .json(&json!({"current_password": TEST_PASSWORD, "new_password": "brand-new-secret"}))
        .await
        .assert_status(StatusCode::OK);

    app.server
        .post("/auth/login")
        .json(&json!({"email": "owner@example.com", "password": "brand-new-secret"}))
        .await
        .assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let app = support::spawn_app().await;
    let response = app.server.get("/api/profile").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["redirect"], "/auth");
}

#[tokio::test]
async fn test_protected_route_with_invalid_token() {
    let app = support::spawn_app().await;

    let response = app
        .server
        .get("/api/profile")
        .add_header(header::AUTHORIZATION, "Bearer invalid_token")
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_access_token_expiry() {
    // an already expired token signed with the server's key
    use chrono::Utc;
    use jsonwebtoken as jwt;
    use uuid::Uuid;

    let app = support::spawn_app().await;
    let (user_id, token) = app.signup_token("owner@example.com", "owner").await;

    app.server
        .get("/api/profile")
        .add_header(header::AUTHORIZATION, format!("Bearer {token}"))
        .await
        .assert_status(StatusCode::OK);

    let jwt_context = auth::JwtContext::new(&cfg::JwtSettings::default(), JWT_SECRET);
    let expired_time = Utc::now().timestamp() - 3600;
    let expired_claims = auth::AccessTokenClaims {
        sub: user_id.to_string(),
        email: "owner@example.com".to_string(),
        exp: expired_time,
        iat: expired_time - 3600,
        jti: Uuid::new_v4().to_string(),
        token_type: auth::TokenType::Access,
    };
    let expired_token =
        jwt::encode(&jwt::Header::new(jwt::Algorithm::HS256), &expired_claims, &jwt_context.encoding_key).unwrap();

    app.server
        .get("/api/profile")
        .add_header(header::AUTHORIZATION, format!("Bearer {expired_token}"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sign_in_is_rate_limited() {
    let mut settings = support::test_settings();
    settings.auth.rate_limit_max_requests = 2;
    let app = support::spawn_app_with(settings).await;

    for _ in 0..2 {
        app.server
            .post("/auth/login")
            .json(&json!({"email": "nobody@example.com", "password": "password"}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    app.server
        .post("/auth/login")
        .json(&json!({"email": "nobody@example.com", "password": "password"}))
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_missing_fields_login() {
    let app = support::spawn_app().await;

    let response = app
        .server
        .post("/auth/login")
        .json(&json!({"email": "owner@example.com"}))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}
