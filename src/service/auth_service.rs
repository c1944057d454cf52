use crate::api::model::auth::{
    LoginRequest, LogoutResponse, RefreshResponse, SignupRequest, TokenResponse,
};
use crate::db::entity::user::{Role, Users};
use crate::db::repo::{RefreshTokenError, StoreError};
use crate::error::error_model::{AppError, ErrorType};
use crate::service::token_issuer::Principal;
use crate::util::crypto_helper;
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use axum_extra::extract::CookieJar;
use std::sync::Arc;
use tracing::{error, info};
use validator::Validate;

const REFRESH_COOKIE_NAME: &str = "refresh_token";
// Cookie is scoped to the auth route prefix so it never rides along on
// ordinary API calls.
const REFRESH_COOKIE_PATH: &str = "/auth";

// Deliberately identical for unknown email and wrong password.
const INVALID_CREDENTIALS: &str = "Invalid credentials. Check email and password.";

fn refresh_cookie(value: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{REFRESH_COOKIE_NAME}={value}; HttpOnly; SameSite=Lax; Path={REFRESH_COOKIE_PATH}; Max-Age={max_age_secs}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn set_refresh_cookie(response: &mut Response, state: &AppState, token: &str) {
    response.headers_mut().insert(
        axum::http::header::SET_COOKIE,
        refresh_cookie(
            token,
            state.auth.refresh_token_ttl.num_seconds(),
            state.auth.cookie_secure,
        )
        .parse()
        .unwrap(),
    );
}

fn clear_refresh_cookie(response: &mut Response, state: &AppState) {
    response.headers_mut().insert(
        axum::http::header::SET_COOKIE,
        refresh_cookie("", 0, state.auth.cookie_secure)
            .parse()
            .unwrap(),
    );
}

fn store_error(e: StoreError) -> AppError {
    match e {
        StoreError::Conflict => AppError::new(ErrorType::Conflict, "User already exists."),
        StoreError::Backend { message } => {
            error!("Store failure: {message}");
            AppError::new(
                ErrorType::InternalServerError,
                "Something went wrong. Please try again later.",
            )
        }
    }
}

fn principal_of(user: &Users) -> Principal {
    Principal {
        user_key: user.key.clone(),
        email: user.email.clone(),
        roles: user.roles.clone(),
    }
}

/// Mints the access token and a fresh refresh token for one device lineage.
async fn issue_session(state: &AppState, user: &Users) -> Result<(String, String), AppError> {
    let access_token = state.token_issuer.sign(&principal_of(user)).map_err(|e| {
        error!("Error signing access token: {e}");
        AppError::new(
            ErrorType::InternalServerError,
            "Something went wrong. Please try again later.",
        )
    })?;
    let refresh_token = state
        .refresh_tokens
        .issue(&user.key, state.auth.refresh_token_ttl)
        .await
        .map_err(store_error)?;
    Ok((access_token, refresh_token))
}

/// Registers a new user and opens their first session.
///
/// Fails with 400 on missing or malformed fields, 409 when the email is
/// already taken. On success the refresh token travels only in the httpOnly
/// cookie; the body carries the access token and public user fields.
pub async fn signup_user(
    State(state): State<Arc<AppState>>,
    Json(signup_request): Json<SignupRequest>,
) -> Result<Response, AppError> {
    if let Err(e) = signup_request.validate() {
        return Err(AppError::new(
            ErrorType::RequestValidationError {
                validation_error: e,
                object: "SignupRequest".to_string(),
            },
            "Validation error. Check the request body.",
        ));
    }

    let password_hash = crypto_helper::hash_password(&signup_request.password)?;
    let user = state
        .users
        .create(
            &signup_request.email,
            &signup_request.name,
            &password_hash,
            &[Role::User],
        )
        .await
        .map_err(store_error)?;
    info!("New user registered: {}", user.key);

    let (access_token, refresh_token) = issue_session(&state, &user).await?;

    let mut response = (
        StatusCode::CREATED,
        Json(TokenResponse {
            access_token,
            user: user.into(),
        }),
    )
        .into_response();
    set_refresh_cookie(&mut response, &state, &refresh_token);
    Ok(response)
}

/// Authenticates a user with email and password.
///
/// Bad credentials always produce the same generic 401, and an unknown email
/// still burns one hash verification so response timing stays flat. Every
/// successful login creates a new refresh token lineage; concurrent logins
/// from other devices stay valid.
pub async fn login_user(
    State(state): State<Arc<AppState>>,
    Json(login_request): Json<LoginRequest>,
) -> Result<Response, AppError> {
    if let Err(e) = login_request.validate() {
        return Err(AppError::new(
            ErrorType::RequestValidationError {
                validation_error: e,
                object: "LoginRequest".to_string(),
            },
            "Validation error. Check the request body.",
        ));
    }

    let user = state
        .users
        .find_by_email(&login_request.email)
        .await
        .map_err(store_error)?;

    let Some(user) = user else {
        let _ = crypto_helper::verify_password(
            &login_request.password,
            &state.auth.dummy_password_hash,
        );
        return Err(AppError::new(ErrorType::UnauthorizedError, INVALID_CREDENTIALS));
    };

    if !crypto_helper::verify_password(&login_request.password, &user.password_hash) {
        return Err(AppError::new(ErrorType::UnauthorizedError, INVALID_CREDENTIALS));
    }

    let (access_token, refresh_token) = issue_session(&state, &user).await?;

    let mut response = (
        StatusCode::OK,
        Json(TokenResponse {
            access_token,
            user: user.into(),
        }),
    )
        .into_response();
    set_refresh_cookie(&mut response, &state, &refresh_token);
    Ok(response)
}

/// Rotates the refresh token presented in the cookie and mints a fresh
/// access token.
///
/// Consumption is single-use: the presented token is gone the moment it is
/// looked up, so a replayed cookie fails with 401 from then on. The user row
/// is re-fetched so role changes made since login show up in the new access
/// token.
pub async fn refresh_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let Some(cookie) = jar.get(REFRESH_COOKIE_NAME) else {
        return Err(AppError::new(ErrorType::UnauthorizedError, "No refresh token"));
    };

    let record = match state.refresh_tokens.consume(cookie.value()).await {
        Ok(record) => record,
        Err(RefreshTokenError::Invalid) => {
            return Ok(unauthorized_with_cleared_cookie(
                &state,
                "Invalid refresh token",
            ));
        }
        Err(RefreshTokenError::Expired) => {
            return Ok(unauthorized_with_cleared_cookie(
                &state,
                "Refresh token expired",
            ));
        }
        Err(RefreshTokenError::Store(e)) => return Err(store_error(e)),
    };

    let user = state
        .users
        .find_by_key(&record.user_key)
        .await
        .map_err(store_error)?;
    let Some(user) = user else {
        return Ok(unauthorized_with_cleared_cookie(&state, "User not found"));
    };

    let (access_token, refresh_token) = issue_session(&state, &user).await?;

    let mut response = (StatusCode::OK, Json(RefreshResponse { access_token })).into_response();
    set_refresh_cookie(&mut response, &state, &refresh_token);
    Ok(response)
}

fn unauthorized_with_cleared_cookie(state: &AppState, message: &str) -> Response {
    let mut response = AppError::new(ErrorType::UnauthorizedError, message).into_response();
    clear_refresh_cookie(&mut response, state);
    response
}

/// Ends the lineage whose token rides in the cookie. Best-effort: an absent
/// or already-revoked token still results in a 200, so logout is always safe
/// to call redundantly.
pub async fn logout_user(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    if let Some(cookie) = jar.get(REFRESH_COOKIE_NAME) {
        if let Err(e) = state.refresh_tokens.revoke(cookie.value()).await {
            // Continue with logout even if revoking fails.
            error!("Error revoking refresh token on logout: {e}");
        }
    }

    let mut response = (StatusCode::OK, Json(LogoutResponse { ok: true })).into_response();
    clear_refresh_cookie(&mut response, &state);
    Ok(response)
}

/// Revokes every refresh token lineage of the authenticated user.
pub async fn logout_everywhere(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    _jar: CookieJar,
) -> Result<Response, AppError> {
    state
        .refresh_tokens
        .revoke_all_for_user(&principal.user_key)
        .await
        .map_err(store_error)?;
    info!("All sessions revoked for user {}", principal.user_key);

    let mut response = (StatusCode::OK, Json(LogoutResponse { ok: true })).into_response();
    clear_refresh_cookie(&mut response, &state);
    Ok(response)
}
