use crate::api::model::user::Message;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

// Health check.
/// Service status
///
/// Report that the API is up.
#[utoipa::path(
    get,
    path = "/",
    tag = "Status",
    responses(
        (status = 200, description = "API is running", body = Message),
    )
)]
pub async fn welcome_handler() -> Response {
    (
        StatusCode::OK,
        Json(Message {
            message: "API is running".to_string(),
            status: "Success".to_string(),
        }),
    )
        .into_response()
}
