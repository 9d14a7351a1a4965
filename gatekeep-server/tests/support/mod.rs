#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode, header},
};
use gatekeep_config::{ConfigLoader, EnvConfig};
use gatekeep_server::{
    AppState, create_app,
    infra::startup::{StoreBackend, build_app_state},
};
use serde_json::{Value, json};
use tower::ServiceExt;

pub const TEST_SIGNING_KEY: &str = "server-test-signing-key-0123456789abcdef";

/// Environment with a strong key and the cheapest Argon2 parameters.
pub fn test_env() -> EnvConfig {
    EnvConfig {
        token_key: Some(TEST_SIGNING_KEY.into()),
        argon2_memory_kib: Some("8".into()),
        argon2_iterations: Some("1".into()),
        argon2_parallelism: Some("1".into()),
        ..EnvConfig::default()
    }
}

pub async fn test_state_with(env: EnvConfig) -> AppState {
    let config = ConfigLoader::new()
        .with_env(env)
        .load()
        .expect("test configuration should load")
        .config;

    build_app_state(Arc::new(config), StoreBackend::InMemory)
        .await
        .expect("in-memory state should build")
}

pub async fn test_app() -> Router {
    create_app(test_state_with(test_env()).await)
}

pub async fn test_app_with(env: EnvConfig) -> Router {
    create_app(test_state_with(env).await)
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn raw_request(method: &str, uri: &str, content_type: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn session_request(token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri("/auth/session");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn register(app: &Router, username: &str, password: &str) -> StatusCode {
    send(
        app,
        json_request(
            "POST",
            "/auth/register",
            json!({ "username": username, "password": password }),
        ),
    )
    .await
    .status()
}

pub async fn login(app: &Router, username: &str, password: &str) -> Response<Body> {
    send(
        app,
        json_request(
            "POST",
            "/auth/login",
            json!({ "username": username, "password": password }),
        ),
    )
    .await
}

/// Log in and return the issued token, panicking on anything but 200.
pub async fn login_token(app: &Router, username: &str, password: &str) -> String {
    let response = login(app, username, password).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["token"]
        .as_str()
        .expect("login response carries a token")
        .to_string()
}
