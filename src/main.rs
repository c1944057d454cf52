use axum::http::{header, HeaderValue, Method, StatusCode};
use coupon_hub::api::handler::{self, ApiDoc};
use coupon_hub::config::app_config;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

#[tokio::main]
async fn main() {
    // Logging handler using tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    dotenvy::dotenv().ok();
    let state = app_config::initialize_app_state().await;

    // Credentialed CORS for the browser front end.
    let origins: Vec<HeaderValue> = app_config::allowed_origins()
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    // build our application with the auth and user routes
    let app = handler::router(state)
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .layer(cors)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ));

    // run it
    let server_address = app_config::get_server_address();
    info!("Starting server at {}", server_address);
    let listener = tokio::net::TcpListener::bind(&server_address)
        .await
        .expect("Failed to bind server address");
    axum::serve(listener, app).await.expect("Server error");
}
