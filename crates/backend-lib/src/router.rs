// crates/backend-lib/src/router.rs

//! HTTP routing and the layers around it.
use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::any::Any;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::CorsSettings;
use crate::error::AppError;
use crate::handlers::{self, auth, portfolio};
use crate::middleware::{circuit_breaker, login_rate_limit, require_auth};
use crate::AppState;

pub const API_PREFIX: &str = "/api/v1";

/// Build the application router.
///
/// Every `/api/v1` route runs under its own circuit breaker, with handler
/// panics turned into 500s inside it. Login is additionally rate limited
/// before the breaker sees it, and the portfolio routes sit behind the
/// access-token gate.
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/holdings", get(portfolio::holdings))
        .route("/orderbook", get(portfolio::orderbook))
        .route("/positions", get(portfolio::positions))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let login = guard_routes(Router::new().route("/auth/login", post(auth::login)), &state)
        .route_layer(from_fn_with_state(state.clone(), login_rate_limit));

    let api = guard_routes(
        Router::new()
            .route("/auth/signup", post(auth::signup))
            .route("/auth/refresh", post(auth::refresh))
            .merge(protected),
        &state,
    )
    .merge(login);

    let cors = cors_layer(&state.settings.cors);

    Router::new()
        .route("/health", get(handlers::health))
        .nest(API_PREFIX, api)
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Circuit breaker around panic recovery around `routes`
fn guard_routes(routes: Router<AppState>, state: &AppState) -> Router<AppState> {
    routes
        .route_layer(CatchPanicLayer::custom(panic_response))
        .route_layer(from_fn_with_state(state.clone(), circuit_breaker))
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    AppError::Internal(format!("handler panicked: {detail}")).into_response()
}

fn cors_layer(settings: &CorsSettings) -> CorsLayer {
    let origins = if settings.allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            settings
                .allowed_origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::AUTHORIZATION])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breaker::CircuitState;
    use crate::config::Settings;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;
    use tradedesk_common::ErrorBody;

    async fn exploding_handler() -> &'static str {
        panic!("handler exploded")
    }

    fn guarded_app(state: &AppState) -> Router {
        guard_routes(Router::new().route("/explode", get(exploding_handler)), state)
            .with_state(state.clone())
    }

    async fn call(app: &Router) -> (StatusCode, Vec<u8>) {
        let request = Request::builder().uri("/explode").body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_internal_error() {
        let state = AppState::in_memory(Settings::default()).unwrap();
        let app = guarded_app(&state);

        let (status, body) = call(&app).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let body: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.error.code, "INT_001");
        assert!(!body.error.message.contains("exploded"));

        let counts = state.breakers.get("/explode").unwrap().counts();
        assert_eq!(counts.requests, 1);
        assert_eq!(counts.total_failures, 1);
    }

    #[tokio::test]
    async fn test_repeated_panics_open_the_breaker() {
        let state = AppState::in_memory(Settings::default()).unwrap();
        let app = guarded_app(&state);

        for _ in 0..3 {
            let (status, _) = call(&app).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        }
        assert_eq!(
            state.breakers.get("/explode").unwrap().state(),
            CircuitState::Open
        );

        let (status, _) = call(&app).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
