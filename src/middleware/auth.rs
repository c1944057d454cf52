use crate::config::app_config::AppState;
use crate::error::error_model::{AppError, ErrorType};
use crate::service::token_issuer::TokenError;
use axum::extract::State;
use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

pub use crate::service::token_issuer::Principal;

/// Middleware that enforces Bearer access-token authentication.
///
/// # Behavior
/// 1. Extracts the `Authorization` header from the request.
/// 2. Validates the header format and ensures it contains a Bearer token.
/// 3. Verifies signature and expiry through the token issuer; there is no
///    store lookup on this path.
/// 4. Inserts a `Principal` into the request extensions for downstream
///    handlers and authorization checks.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let unauthorized = |msg: &str| -> Response {
        AppError::new(ErrorType::UnauthorizedError, msg).into_response()
    };

    let auth_header_val = match req.headers().get(header::AUTHORIZATION) {
        Some(v) => match v.to_str() {
            Ok(s) => s,
            Err(_) => return unauthorized("Invalid Authorization header"),
        },
        None => return unauthorized("Missing Authorization header"),
    };

    let token = match auth_header_val.strip_prefix("Bearer ") {
        Some(t) if !t.is_empty() => t,
        _ => return unauthorized("Authorization header must be Bearer token"),
    };

    let principal = match state.token_issuer.verify(token) {
        Ok(principal) => principal,
        Err(TokenError::Expired) => return unauthorized("Token has expired"),
        Err(_) => return unauthorized("Invalid token"),
    };

    req.extensions_mut().insert(principal);
    next.run(req).await
}
