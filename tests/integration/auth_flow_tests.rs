// ==================================
// tests/integration/auth_flow_tests.rs
// ==================================
use axum::http::StatusCode;
use serde_json::json;

use crate::test_utils::{credentials, signup, test_app, TestRequest};

const SIGNUP: &str = "/api/v1/auth/signup";
const LOGIN: &str = "/api/v1/auth/login";
const REFRESH: &str = "/api/v1/auth/refresh";

#[tokio::test]
async fn test_signup_login_refresh_flow() {
    let (app, state) = test_app();

    let tokens = signup(&app, "a@x.com", "secret1").await;
    assert!(!tokens.access_token.is_empty());
    assert!(!tokens.refresh_token.is_empty());
    assert_eq!(tokens.expires_in, 600);

    let user = state.auth.validate_access_token(&tokens.access_token).unwrap();
    assert_eq!(user.email, "a@x.com");

    let wrong = TestRequest::post(LOGIN, &credentials("a@x.com", "wrong"))
        .send(&app)
        .await;
    assert_eq!(wrong.status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong.error_code(), "AUTH_002");

    let ok = TestRequest::post(LOGIN, &credentials("a@x.com", "secret1"))
        .send(&app)
        .await;
    assert_eq!(ok.status, StatusCode::OK);
    let login_user = state
        .auth
        .validate_access_token(&ok.auth().access_token)
        .unwrap();
    assert_eq!(login_user.user_id, user.user_id);

    let refreshed = TestRequest::post(REFRESH, &json!({ "refresh_token": tokens.refresh_token }))
        .send(&app)
        .await;
    assert_eq!(refreshed.status, StatusCode::OK);
    assert_ne!(refreshed.auth().refresh_token, tokens.refresh_token);
}

#[tokio::test]
async fn test_login_gives_no_account_oracle() {
    let (app, _) = test_app();
    signup(&app, "a@x.com", "secret1").await;

    let wrong_password = TestRequest::post(LOGIN, &credentials("a@x.com", "wrong1"))
        .send(&app)
        .await;
    let unknown_email = TestRequest::post(LOGIN, &credentials("nobody@x.com", "secret1"))
        .send(&app)
        .await;

    assert_eq!(wrong_password.status, unknown_email.status);
    assert_eq!(wrong_password.body, unknown_email.body);
}

#[tokio::test]
async fn test_duplicate_signup_rejected() {
    let (app, _) = test_app();
    signup(&app, "a@x.com", "secret1").await;

    let response = TestRequest::post(SIGNUP, &credentials("A@X.COM", "another1"))
        .send(&app)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "CONFLICT_001");
}

#[tokio::test]
async fn test_signup_validation_errors() {
    let (app, _) = test_app();

    let bad_email = TestRequest::post(SIGNUP, &credentials("not-an-email", "secret1"))
        .send(&app)
        .await;
    assert_eq!(bad_email.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_email.error_code(), "VAL_002");

    let weak = TestRequest::post(SIGNUP, &credentials("a@x.com", "12345"))
        .send(&app)
        .await;
    assert_eq!(weak.status, StatusCode::BAD_REQUEST);
    assert_eq!(weak.error_code(), "VAL_003");

    let malformed = TestRequest::post_raw(SIGNUP, "{\"email\": ")
        .send(&app)
        .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert_eq!(malformed.error_code(), "VAL_001");

    let missing_field = TestRequest::post(SIGNUP, &json!({ "email": "a@x.com" }))
        .send(&app)
        .await;
    assert_eq!(missing_field.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing_field.error_code(), "VAL_001");
}

#[tokio::test]
async fn test_refresh_rejects_access_token_and_garbage() {
    let (app, _) = test_app();
    let tokens = signup(&app, "a@x.com", "secret1").await;

    let with_access = TestRequest::post(REFRESH, &json!({ "refresh_token": tokens.access_token }))
        .send(&app)
        .await;
    assert_eq!(with_access.status, StatusCode::UNAUTHORIZED);
    assert_eq!(with_access.error_code(), "AUTH_003");

    let garbage = TestRequest::post(REFRESH, &json!({ "refresh_token": "abc" }))
        .send(&app)
        .await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);

    let empty = TestRequest::post(REFRESH, &json!({ "refresh_token": "" }))
        .send(&app)
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_old_refresh_token_still_usable_after_rotation() {
    let (app, _) = test_app();
    let tokens = signup(&app, "a@x.com", "secret1").await;

    let body = json!({ "refresh_token": tokens.refresh_token });
    let first = TestRequest::post(REFRESH, &body).send(&app).await;
    let replay = TestRequest::post(REFRESH, &body).send(&app).await;

    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(replay.status, StatusCode::OK);
}
