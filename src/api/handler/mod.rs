pub mod auth_handler;
pub mod user_handler;
pub mod welcome_handler;

use crate::config::app_config::AppState;
use crate::middleware::auth;
use axum::routing::get;
use axum::{middleware, Router};
use std::sync::Arc;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        welcome_handler::welcome_handler,
        auth_handler::signup_handler,
        auth_handler::login_handler,
        auth_handler::refresh_handler,
        auth_handler::logout_handler,
        auth_handler::logout_all_handler,
        user_handler::me_handler,
    ),
    components(schemas(
        crate::api::model::auth::SignupRequest,
        crate::api::model::auth::LoginRequest,
        crate::api::model::auth::TokenResponse,
        crate::api::model::auth::RefreshResponse,
        crate::api::model::auth::LogoutResponse,
        crate::api::model::user::PublicUser,
        crate::api::model::user::Message,
        crate::db::entity::user::Role,
        crate::error::error_model::ApiError,
        crate::error::error_model::ValidationError,
    )),
    tags(
        (name = "Authentication", description = "Session lifecycle endpoints"),
        (name = "Users", description = "User profile endpoints"),
        (name = "Status", description = "Service status"),
    )
)]
pub struct ApiDoc;

/// Builds the full application router. The same wiring backs the server
/// binary and the integration tests.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(welcome_handler::welcome_handler))
        .nest("/auth", auth_handler::public_auth_routes())
        .nest(
            "/auth",
            auth_handler::protected_auth_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_auth,
            )),
        )
        .nest(
            "/users",
            user_handler::user_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_auth,
            )),
        )
        .with_state(state)
}
