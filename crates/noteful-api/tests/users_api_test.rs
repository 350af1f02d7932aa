//! Router tests for signup, login, refresh and the health check.

mod common;

use axum::http::{header, Method, StatusCode};
use chrono::{Duration, Utc};
use serde_json::json;

use common::{TestApp, PASSWORD};
use noteful_core::{NewSession, SessionRepository};
use noteful_crypto::{generate_token, token_digest};

async fn signup(app: &TestApp, body: serde_json::Value) -> common::TestResponse {
    app.request(Method::POST, "/api/users", None, Some(body)).await
}

#[tokio::test]
async fn test_signup_returns_public_fields_only() {
    let app = TestApp::new();

    let res = signup(
        &app,
        json!({ "fullname": "  Alice A  ", "username": "alice", "password": PASSWORD }),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["username"], "alice");
    assert_eq!(res.body["fullname"], "Alice A");
    assert!(res.body.get("password").is_none());
    assert!(res.body.get("passwordHash").is_none());

    let location = res.headers[header::LOCATION].to_str().unwrap();
    assert_eq!(
        location,
        format!("/api/users/{}", res.body["id"].as_str().unwrap())
    );
}

#[tokio::test]
async fn test_signup_field_errors_are_unprocessable() {
    let app = TestApp::new();

    let res = signup(&app, json!({ "username": "alice" })).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.body["location"], "password");

    let res = signup(&app, json!({ "username": " alice", "password": PASSWORD })).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.body["location"], "username");
    assert_eq!(res.body["error"], "Cannot start or end with whitespace");

    let res = signup(&app, json!({ "username": "alice", "password": "short" })).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.body["location"], "password");
}

#[tokio::test]
async fn test_duplicate_username_is_bad_request() {
    let app = TestApp::new();
    app.user("alice").await;

    let res = signup(&app, json!({ "username": "alice", "password": PASSWORD })).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "The username already exists");
}

#[tokio::test]
async fn test_login_rejects_bad_credentials_uniformly() {
    let app = TestApp::new();
    app.user("alice").await;

    for body in [
        json!({ "username": "alice", "password": "wrong-password" }),
        json!({ "username": "nobody", "password": PASSWORD }),
        json!({ "username": "alice" }),
    ] {
        let res = app
            .request(Method::POST, "/api/login", None, Some(body))
            .await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.body["error"], "Incorrect username or password");
    }
}

#[tokio::test]
async fn test_login_token_authenticates_and_refreshes() {
    let app = TestApp::new();
    let (_, token) = app.user("alice").await;
    assert!(token.starts_with("nf_at_"));

    let res = app.get("/api/folders", &token).await;
    assert_eq!(res.status, StatusCode::OK);

    let res = app
        .request(Method::POST, "/api/refresh", Some(&token), None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let fresh = res.body["authToken"].as_str().unwrap();
    assert_ne!(fresh, token);
    assert!(res.body["expiresAt"].is_string());

    assert_eq!(app.get("/api/folders", fresh).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_expired_token_is_unauthorized() {
    let app = TestApp::new();
    let (user_id, _) = app.user("alice").await;

    let token = generate_token();
    SessionRepository::create(
        &app.store,
        NewSession {
            token_digest: token_digest(&token),
            user_id,
            expires_at: Utc::now() - Duration::minutes(1),
        },
    )
    .await
    .unwrap();

    let res = app.get("/api/notes", &token).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_with_unrepresentable_expiry_is_server_error() {
    let lifetime = Duration::try_days(100_000_000).expect("within TimeDelta range");
    let app = TestApp::with_session_lifetime(lifetime);
    let res = signup(&app, json!({ "username": "alice", "password": PASSWORD })).await;
    assert_eq!(res.status, StatusCode::CREATED);

    let res = app
        .request(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "username": "alice", "password": PASSWORD })),
        )
        .await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body["error"], "Internal Server Error");
}

#[tokio::test]
async fn test_refresh_requires_token() {
    let app = TestApp::new();
    let res = app.request(Method::POST, "/api/refresh", None, None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new();
    let res = signup(&app, json!({ "username": 42, "password": PASSWORD })).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["error"].is_string());
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();
    let res = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "ok");
    assert!(res.headers.contains_key("x-request-id"));
}
