use crate::api::model::auth::{
    LoginRequest, LogoutResponse, RefreshResponse, SignupRequest, TokenResponse,
};
use crate::config::app_config::AppState;
use crate::error::error_model::{ApiError, AppError};
use crate::middleware::auth::Principal;
use crate::service::auth_service;
use axum::extract::State;
use axum::response::Response;
use axum::routing::post;
use axum::{Extension, Json, Router};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

/// Routes reachable without an access token. Refresh and logout authenticate
/// through the httpOnly refresh cookie alone.
pub fn public_auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(signup_handler))
        .route("/login", post(login_handler))
        .route("/refresh", post(refresh_handler))
        .route("/logout", post(logout_handler))
}

/// Routes that additionally require a valid Bearer access token.
pub fn protected_auth_routes() -> Router<Arc<AppState>> {
    Router::new().route("/logout-all", post(logout_all_handler))
}

// Signup handler.
/// Register user
///
/// Create an account and open the first session.
#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "Authentication",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User registered successfully", body = TokenResponse),
        (status = 400, description = "Missing or invalid fields", body = ApiError),
        (status = 409, description = "Email already registered", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError),
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(signup_request): Json<SignupRequest>,
) -> Result<Response, AppError> {
    // Call service method.
    auth_service::signup_user(State(state), Json(signup_request)).await
}

// Login handler.
/// Authenticate user
///
/// Authenticate user with email and password.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "User authenticated successfully", body = TokenResponse),
        (status = 400, description = "Missing fields", body = ApiError),
        (status = 401, description = "Unauthorized error", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(login_request): Json<LoginRequest>,
) -> Result<Response, AppError> {
    // Call service method.
    auth_service::login_user(State(state), Json(login_request)).await
}

// Refresh token handler.
/// Refresh session
///
/// Rotate the refresh cookie and mint a fresh access token.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "Authentication",
    responses(
        (status = 200, description = "Session refreshed successfully", body = RefreshResponse),
        (status = 401, description = "Missing, invalid or expired refresh token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError),
    )
)]
pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    // Call service method.
    auth_service::refresh_session(State(state), jar).await
}

// Logout handler.
/// Logout user
///
/// Revoke the refresh token in the cookie; never fails to the caller.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Authentication",
    responses(
        (status = 200, description = "Logout successful", body = LogoutResponse),
        (status = 500, description = "Internal server error", body = ApiError),
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    // Call service method.
    auth_service::logout_user(State(state), jar).await
}

// Logout-everywhere handler.
/// Logout everywhere
///
/// Revoke every refresh token lineage of the authenticated user.
#[utoipa::path(
    post,
    path = "/auth/logout-all",
    tag = "Authentication",
    responses(
        (status = 200, description = "All sessions revoked", body = LogoutResponse),
        (status = 401, description = "Unauthorized error", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError),
    )
)]
pub async fn logout_all_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    // Call service method.
    auth_service::logout_everywhere(State(state), Extension(principal), jar).await
}
