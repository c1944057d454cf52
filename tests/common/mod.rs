#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use chrono::Duration;
use coupon_hub::config::app_config::{AppState, AuthConfig};
use coupon_hub::db::repo::memory_store::{MemoryCredentialStore, MemoryRefreshTokenStore};
use coupon_hub::service::token_issuer::TokenIssuer;
use coupon_hub::util::crypto_helper;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_ACCESS_SECRET: &str = "integration-test-secret";

/// App state over in-memory stores; no database or network needed.
pub fn test_state() -> Arc<AppState> {
    test_state_with(Duration::minutes(15), Duration::days(30))
}

pub fn test_state_with(access_ttl: Duration, refresh_ttl: Duration) -> Arc<AppState> {
    Arc::new(AppState {
        users: Arc::new(MemoryCredentialStore::new()),
        refresh_tokens: Arc::new(MemoryRefreshTokenStore::new()),
        token_issuer: TokenIssuer::new(TEST_ACCESS_SECRET, access_ttl),
        auth: AuthConfig {
            refresh_token_ttl: refresh_ttl,
            cookie_secure: false,
            dummy_password_hash: crypto_helper::hash_password("dummy-password")
                .expect("Failed to hash dummy password"),
        },
    })
}

/// Same wiring as the server binary, minus CORS and the docs route.
pub fn test_app(state: Arc<AppState>) -> Router {
    coupon_hub::api::handler::router(state)
}

pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, nanoid())
}

fn nanoid() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    (0..10)
        .map(|_| char::from(rng.gen_range(b'a'..=b'z')))
        .collect()
}

pub async fn make_request(
    app: Router,
    method: Method,
    uri: &str,
    json_body: Option<String>,
) -> Response {
    make_request_with_cookie(app, method, uri, json_body, None).await
}

pub async fn make_request_with_cookie(
    app: Router,
    method: Method,
    uri: &str,
    json_body: Option<String>,
    cookie: Option<&str>,
) -> Response {
    let mut builder = Request::builder()
        .uri(uri)
        .method(method)
        .header("Content-Type", "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header("Cookie", format!("refresh_token={cookie}"));
    }
    let request = match json_body {
        Some(body) => builder.body(Body::from(body)).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn make_bearer_request(
    app: Router,
    method: Method,
    uri: &str,
    access_token: &str,
) -> Response {
    let request = Request::builder()
        .uri(uri)
        .method(method)
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {access_token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("Response body is not JSON")
}

/// Raw `Set-Cookie` header, if the response carries one.
pub fn set_cookie_header(response: &Response) -> Option<String> {
    response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// The refresh token value from the `Set-Cookie` header.
pub fn refresh_cookie_value(response: &Response) -> Option<String> {
    let header = set_cookie_header(response)?;
    let value = header.strip_prefix("refresh_token=")?;
    let value = value.split(';').next()?.to_string();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
