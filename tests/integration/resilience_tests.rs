use axum::http::StatusCode;

use crate::test_utils::{credentials, signup, test_app, test_app_with, test_settings, TestRequest};

const LOGIN: &str = "/api/v1/auth/login";

#[tokio::test]
async fn test_login_rate_limit_counts_every_attempt() {
    let (app, _) = test_app();
    signup(&app, "a@x.com", "secret1").await;

    for attempt in 0..5 {
        // successful logins count as attempts too
        let password = if attempt % 2 == 0 { "secret1" } else { "wrong1" };
        let response = TestRequest::post(LOGIN, &credentials("a@x.com", password))
            .peer([203, 0, 113, 7])
            .send(&app)
            .await;
        assert_ne!(response.status, StatusCode::TOO_MANY_REQUESTS);
    }

    let limited = TestRequest::post(LOGIN, &credentials("a@x.com", "secret1"))
        .peer([203, 0, 113, 7])
        .send(&app)
        .await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.error_code(), "RATE_001");
    let retry_after: u64 = limited.headers["retry-after"].to_str().unwrap().parse().unwrap();
    assert!(retry_after > 0 && retry_after <= 900);

    let other_client = TestRequest::post(LOGIN, &credentials("a@x.com", "secret1"))
        .peer([198, 51, 100, 1])
        .send(&app)
        .await;
    assert_eq!(other_client.status, StatusCode::OK);
}

#[tokio::test]
async fn test_spoofed_forwarded_for_does_not_reset_login_limit() {
    let (app, _) = test_app();

    for attempt in 0..6 {
        let response = TestRequest::post(LOGIN, &credentials("a@x.com", "secret1"))
            .peer([203, 0, 113, 7])
            .header("x-forwarded-for", &format!("10.0.0.{attempt}"))
            .send(&app)
            .await;
        if attempt < 5 {
            assert_ne!(response.status, StatusCode::TOO_MANY_REQUESTS, "attempt {attempt}");
        } else {
            assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
        }
    }
}

#[tokio::test]
async fn test_forwarded_for_honored_when_proxy_is_trusted() {
    let mut settings = test_settings();
    settings.rate_limit.trust_forwarded_headers = true;
    let (app, _) = test_app_with(settings);

    for attempt in 0..6 {
        let response = TestRequest::post(LOGIN, &credentials("a@x.com", "secret1"))
            .peer([10, 0, 0, 1])
            .header("x-forwarded-for", &format!("198.51.100.{attempt}"))
            .send(&app)
            .await;
        assert_ne!(response.status, StatusCode::TOO_MANY_REQUESTS, "attempt {attempt}");
    }
}

#[tokio::test]
async fn test_signup_is_not_rate_limited() {
    let (app, _) = test_app();
    for i in 0..8 {
        let response = TestRequest::post(
            "/api/v1/auth/signup",
            &credentials(&format!("user{i}@x.com"), "secret1"),
        )
        .peer([203, 0, 113, 7])
        .send(&app)
        .await;
        assert_eq!(response.status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_client_errors_do_not_open_breaker() {
    let (app, state) = test_app();

    for _ in 0..10 {
        let response = TestRequest::get("/api/v1/holdings").send(&app).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    let breaker = state.breakers.get("/api/v1/holdings").unwrap();
    assert_eq!(breaker.state(), backend_lib::breaker::CircuitState::Closed);
    assert_eq!(breaker.counts().total_failures, 0);
}

#[tokio::test]
async fn test_breakers_are_keyed_per_route() {
    let (app, state) = test_app();
    let tokens = signup(&app, "a@x.com", "secret1").await;

    TestRequest::get("/api/v1/positions")
        .bearer(&tokens.access_token)
        .send(&app)
        .await;

    let names: Vec<String> = state
        .breakers
        .snapshot()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(names, vec!["/api/v1/auth/signup", "/api/v1/positions"]);
}

#[tokio::test]
async fn test_open_breaker_short_circuits_route() {
    let (app, state) = test_app_with(test_settings());
    let tokens = signup(&app, "a@x.com", "secret1").await;

    // trip the holdings breaker directly
    let breaker = state.breakers.get_or_create("/api/v1/holdings");
    for _ in 0..3 {
        let _ = breaker.execute(|| async { Err::<(), _>("downstream") }).await;
    }

    let rejected = TestRequest::get("/api/v1/holdings")
        .bearer(&tokens.access_token)
        .send(&app)
        .await;
    assert_eq!(rejected.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(rejected.error_code(), "AVAIL_001");

    // other routes keep working
    let positions = TestRequest::get("/api/v1/positions")
        .bearer(&tokens.access_token)
        .send(&app)
        .await;
    assert_eq!(positions.status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_and_unknown_routes() {
    let (app, _) = test_app();

    let health = TestRequest::get("/health").send(&app).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "healthy");

    let missing = TestRequest::get("/api/v1/nope").send(&app).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.error_code(), "NF_001");
}

#[tokio::test]
async fn test_cors_headers_on_cross_origin_request() {
    let (app, _) = test_app();

    let response = TestRequest::get("/health")
        .header("origin", "http://localhost:3000")
        .send(&app)
        .await;
    assert_eq!(response.headers["access-control-allow-origin"], "*");
}
