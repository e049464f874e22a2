use axum::http::StatusCode;

use crate::test_utils::{signup, test_app, TestRequest};

#[tokio::test]
async fn test_portfolio_requires_access_token() {
    let (app, _) = test_app();

    for uri in ["/api/v1/holdings", "/api/v1/orderbook", "/api/v1/positions"] {
        let response = TestRequest::get(uri).send(&app).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(response.error_code(), "AUTH_001");
    }
}

#[tokio::test]
async fn test_refresh_token_rejected_by_auth_gate() {
    let (app, _) = test_app();
    let tokens = signup(&app, "a@x.com", "secret1").await;

    let response = TestRequest::get("/api/v1/holdings")
        .bearer(&tokens.refresh_token)
        .send(&app)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_portfolio_views() {
    let (app, _) = test_app();
    let tokens = signup(&app, "a@x.com", "secret1").await;

    let holdings = TestRequest::get("/api/v1/holdings")
        .bearer(&tokens.access_token)
        .send(&app)
        .await;
    assert_eq!(holdings.status, StatusCode::OK);
    assert_eq!(holdings.body["holdings"].as_array().unwrap().len(), 5);
    assert_eq!(holdings.body["pnl_card"]["total_pnl"], 642.35);

    let orderbook = TestRequest::get("/api/v1/orderbook")
        .bearer(&tokens.access_token)
        .send(&app)
        .await;
    assert_eq!(orderbook.status, StatusCode::OK);
    let orders = orderbook.body["orders"].as_array().unwrap();
    assert_eq!(orders[0]["order_type"], "BUY");
    assert_eq!(orders[2]["status"], "PENDING");
    assert!(orders[2].get("executed_time").is_none());

    let positions = TestRequest::get("/api/v1/positions")
        .bearer(&tokens.access_token)
        .send(&app)
        .await;
    assert_eq!(positions.status, StatusCode::OK);
    assert_eq!(positions.body["positions"][3]["position_type"], "SHORT");
}
