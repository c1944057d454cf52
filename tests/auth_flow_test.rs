mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn signup_returns_tokens_and_rejects_duplicate_email() {
    let state = common::test_state();
    let app = common::test_app(state);
    let email = "a@x.com";

    let signup = json!({ "name": "Alice", "email": email, "password": "secret123" });
    let response = common::make_request(
        app.clone(),
        Method::POST,
        "/auth/signup",
        Some(signup.to_string()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let cookie = common::set_cookie_header(&response).expect("refresh cookie must be set");
    assert!(cookie.starts_with("refresh_token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Path=/auth"));

    let body = common::body_json(response).await;
    assert!(!body["accessToken"].as_str().unwrap().is_empty());
    assert_eq!(body["user"]["email"], email);
    assert_eq!(body["user"]["roles"], json!(["user"]));
    // Password material must never appear in the response.
    assert!(body["user"].get("passwordHash").is_none());

    let again = common::make_request(
        app,
        Method::POST,
        "/auth/signup",
        Some(signup.to_string()),
    )
    .await;
    assert_eq!(again.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn signup_with_missing_fields_is_a_bad_request() {
    let app = common::test_app(common::test_state());

    let response = common::make_request(
        app.clone(),
        Method::POST,
        "/auth/signup",
        Some(json!({ "email": "a@x.com" }).to_string()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = common::make_request(
        app,
        Method::POST,
        "/auth/signup",
        Some(json!({ "password": "secret123" }).to_string()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_issues_a_fresh_access_token() {
    let app = common::test_app(common::test_state());
    let email = common::unique_email("login");

    let signup = common::make_request(
        app.clone(),
        Method::POST,
        "/auth/signup",
        Some(json!({ "email": email, "password": "secret123" }).to_string()),
    )
    .await;
    let signup_token = common::body_json(signup).await["accessToken"]
        .as_str()
        .unwrap()
        .to_string();

    // iat has one-second resolution; step past it so the tokens differ.
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    let login = common::make_request(
        app,
        Method::POST,
        "/auth/login",
        Some(json!({ "email": email, "password": "secret123" }).to_string()),
    )
    .await;
    assert_eq!(login.status(), StatusCode::OK);
    let login_token = common::body_json(login).await["accessToken"]
        .as_str()
        .unwrap()
        .to_string();
    assert_ne!(signup_token, login_token);
}

#[tokio::test]
async fn login_failures_do_not_reveal_whether_the_account_exists() {
    let app = common::test_app(common::test_state());
    let email = common::unique_email("enum");

    common::make_request(
        app.clone(),
        Method::POST,
        "/auth/signup",
        Some(json!({ "email": email, "password": "secret123" }).to_string()),
    )
    .await;

    let wrong_password = common::make_request(
        app.clone(),
        Method::POST,
        "/auth/login",
        Some(json!({ "email": email, "password": "wrong-password" }).to_string()),
    )
    .await;
    let no_such_user = common::make_request(
        app,
        Method::POST,
        "/auth/login",
        Some(json!({ "email": "nobody@example.com", "password": "whatever1" }).to_string()),
    )
    .await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(no_such_user.status(), StatusCode::UNAUTHORIZED);
    let a = common::body_json(wrong_password).await;
    let b = common::body_json(no_such_user).await;
    assert_eq!(a["debugMessage"], b["debugMessage"]);
}

#[tokio::test]
async fn refresh_without_cookie_is_unauthorized() {
    let app = common::test_app(common::test_state());
    let response = common::make_request(app, Method::POST, "/auth/refresh", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_rotates_the_token_and_rejects_replay() {
    let app = common::test_app(common::test_state());
    let email = common::unique_email("rotate");

    let signup = common::make_request(
        app.clone(),
        Method::POST,
        "/auth/signup",
        Some(json!({ "email": email, "password": "secret123" }).to_string()),
    )
    .await;
    let first = common::refresh_cookie_value(&signup).unwrap();

    let refreshed = common::make_request_with_cookie(
        app.clone(),
        Method::POST,
        "/auth/refresh",
        None,
        Some(&first),
    )
    .await;
    assert_eq!(refreshed.status(), StatusCode::OK);
    let second = common::refresh_cookie_value(&refreshed).unwrap();
    assert_ne!(first, second);
    let body = common::body_json(refreshed).await;
    assert!(!body["accessToken"].as_str().unwrap().is_empty());

    // The consumed token string must never be accepted again.
    let replay = common::make_request_with_cookie(
        app.clone(),
        Method::POST,
        "/auth/refresh",
        None,
        Some(&first),
    )
    .await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
    // A replayed-token failure clears the stale cookie.
    let cleared = common::set_cookie_header(&replay).unwrap();
    assert!(cleared.contains("Max-Age=0"));

    // The rotated token still works.
    let rotated = common::make_request_with_cookie(
        app,
        Method::POST,
        "/auth/refresh",
        None,
        Some(&second),
    )
    .await;
    assert_eq!(rotated.status(), StatusCode::OK);
}

#[tokio::test]
async fn expired_refresh_token_is_rejected_and_purged() {
    // Refresh tokens are minted already expired.
    let state = common::test_state_with(chrono::Duration::minutes(15), chrono::Duration::seconds(-1));
    let app = common::test_app(state.clone());
    let email = common::unique_email("expired");

    let signup = common::make_request(
        app.clone(),
        Method::POST,
        "/auth/signup",
        Some(json!({ "email": email, "password": "secret123" }).to_string()),
    )
    .await;
    let token = common::refresh_cookie_value(&signup).unwrap();

    let response = common::make_request_with_cookie(
        app,
        Method::POST,
        "/auth/refresh",
        None,
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The expired row is gone from the store, not just rejected.
    assert!(matches!(
        state.refresh_tokens.consume(&token).await,
        Err(coupon_hub::db::repo::RefreshTokenError::Invalid)
    ));
}

#[tokio::test]
async fn logout_revokes_the_token_and_is_safe_to_repeat() {
    let app = common::test_app(common::test_state());
    let email = common::unique_email("logout");

    let signup = common::make_request(
        app.clone(),
        Method::POST,
        "/auth/signup",
        Some(json!({ "email": email, "password": "secret123" }).to_string()),
    )
    .await;
    let token = common::refresh_cookie_value(&signup).unwrap();

    let logout = common::make_request_with_cookie(
        app.clone(),
        Method::POST,
        "/auth/logout",
        None,
        Some(&token),
    )
    .await;
    assert_eq!(logout.status(), StatusCode::OK);
    assert_eq!(common::body_json(logout).await["ok"], json!(true));

    // Refresh with the revoked token fails.
    let refresh = common::make_request_with_cookie(
        app.clone(),
        Method::POST,
        "/auth/refresh",
        None,
        Some(&token),
    )
    .await;
    assert_eq!(refresh.status(), StatusCode::UNAUTHORIZED);

    // Redundant logouts, with or without a cookie, still succeed.
    let again = common::make_request_with_cookie(
        app.clone(),
        Method::POST,
        "/auth/logout",
        None,
        Some(&token),
    )
    .await;
    assert_eq!(again.status(), StatusCode::OK);
    let without_cookie = common::make_request(app, Method::POST, "/auth/logout", None).await;
    assert_eq!(without_cookie.status(), StatusCode::OK);
}

#[tokio::test]
async fn bearer_token_grants_access_to_protected_routes() {
    let app = common::test_app(common::test_state());
    let email = common::unique_email("bearer");

    let signup = common::make_request(
        app.clone(),
        Method::POST,
        "/auth/signup",
        Some(json!({ "email": email, "password": "secret123" }).to_string()),
    )
    .await;
    let access_token = common::body_json(signup).await["accessToken"]
        .as_str()
        .unwrap()
        .to_string();

    let me = common::make_bearer_request(app.clone(), Method::GET, "/users/me", &access_token).await;
    assert_eq!(me.status(), StatusCode::OK);
    assert_eq!(common::body_json(me).await["email"], email);

    let no_header = common::make_request(app.clone(), Method::GET, "/users/me", None).await;
    assert_eq!(no_header.status(), StatusCode::UNAUTHORIZED);

    let garbage = common::make_bearer_request(app, Method::GET, "/users/me", "not-a-token").await;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_all_revokes_every_device_lineage() {
    let app = common::test_app(common::test_state());
    let email = common::unique_email("everywhere");

    let signup = common::make_request(
        app.clone(),
        Method::POST,
        "/auth/signup",
        Some(json!({ "email": email, "password": "secret123" }).to_string()),
    )
    .await;
    let device_one = common::refresh_cookie_value(&signup).unwrap();
    let access_token = common::body_json(signup).await["accessToken"]
        .as_str()
        .unwrap()
        .to_string();

    // Second device logs in independently.
    let login = common::make_request(
        app.clone(),
        Method::POST,
        "/auth/login",
        Some(json!({ "email": email, "password": "secret123" }).to_string()),
    )
    .await;
    let device_two = common::refresh_cookie_value(&login).unwrap();
    assert_ne!(device_one, device_two);

    let response =
        common::make_bearer_request(app.clone(), Method::POST, "/auth/logout-all", &access_token)
            .await;
    assert_eq!(response.status(), StatusCode::OK);

    for token in [device_one, device_two] {
        let refresh = common::make_request_with_cookie(
            app.clone(),
            Method::POST,
            "/auth/refresh",
            None,
            Some(&token),
        )
        .await;
        assert_eq!(refresh.status(), StatusCode::UNAUTHORIZED);
    }
}
