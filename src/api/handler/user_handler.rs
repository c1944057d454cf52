use crate::api::model::user::PublicUser;
use crate::config::app_config::AppState;
use crate::error::error_model::{ApiError, AppError, ErrorType};
use crate::middleware::auth::Principal;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use std::sync::Arc;

pub fn user_routes() -> Router<Arc<AppState>> {
    Router::new().route("/me", get(me_handler))
}

// Current user handler.
/// Get current user
///
/// Return the profile of the authenticated principal.
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Current user profile", body = PublicUser),
        (status = 401, description = "Unauthorized error", body = ApiError),
        (status = 404, description = "User no longer exists", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError),
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Response, AppError> {
    let user = state
        .users
        .find_by_key(&principal.user_key)
        .await
        .map_err(|_| {
            AppError::new(
                ErrorType::InternalServerError,
                "Something went wrong. Please try again later.",
            )
        })?
        .ok_or_else(|| AppError::new(ErrorType::NotFound, "User not found."))?;

    Ok(Json(PublicUser::from(user)).into_response())
}
