//! Shared harness for router tests against the in-memory store.

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use noteful_api::{build_router, ApiConfig, AppState};
use noteful_core::mock::MockStore;
use noteful_crypto::{HashParams, PasswordHasher};

pub const PASSWORD: &str = "password123";

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub struct TestApp {
    pub router: Router,
    pub store: MockStore,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_session_lifetime(chrono::Duration::hours(1))
    }

    pub fn with_session_lifetime(session_lifetime: chrono::Duration) -> Self {
        let store = MockStore::new();
        let hasher = PasswordHasher::new(HashParams::fast()).expect("fast params are valid");
        let state = AppState::from_store(store.clone(), hasher, session_lifetime);
        let router = build_router(state, &ApiConfig::default());
        Self { router, store }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("router response");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Sign up `username` and log in; returns the user id and bearer token.
    pub async fn user(&self, username: &str) -> (Uuid, String) {
        let signup = self
            .request(
                Method::POST,
                "/api/users",
                None,
                Some(json!({ "fullname": username, "username": username, "password": PASSWORD })),
            )
            .await;
        assert_eq!(signup.status, StatusCode::CREATED, "{:?}", signup.body);
        let id: Uuid = signup.body["id"].as_str().expect("id").parse().expect("uuid");

        let login = self
            .request(
                Method::POST,
                "/api/login",
                None,
                Some(json!({ "username": username, "password": PASSWORD })),
            )
            .await;
        assert_eq!(login.status, StatusCode::OK, "{:?}", login.body);
        let token = login.body["authToken"].as_str().expect("token").to_string();
        (id, token)
    }

    /// Create a folder through the API and return its id.
    pub async fn folder(&self, token: &str, name: &str) -> String {
        let res = self.post("/api/folders", token, json!({ "name": name })).await;
        assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.body);
        res.body["id"].as_str().expect("id").to_string()
    }

    /// Create a tag through the API and return its id.
    pub async fn tag(&self, token: &str, name: &str) -> String {
        let res = self.post("/api/tags", token, json!({ "name": name })).await;
        assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.body);
        res.body["id"].as_str().expect("id").to_string()
    }

    /// Create a note through the API and return its body.
    pub async fn note(&self, token: &str, body: Value) -> Value {
        let res = self.post("/api/notes", token, body).await;
        assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.body);
        res.body
    }
}
