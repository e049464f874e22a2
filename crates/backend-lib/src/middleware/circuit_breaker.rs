use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::counter;
use tracing::warn;

use crate::breaker::CircuitError;
use crate::metrics::BREAKER_REJECTED;
use crate::{error::AppError, AppState};

/// Run the rest of the stack under the breaker named after the matched route.
///
/// 5xx responses count as failures but are still returned unchanged. When
/// the breaker rejects the call the handler is not run.
pub async fn circuit_breaker(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let name = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let breaker = state.breakers.get_or_create(&name);

    let result = breaker
        .execute(move || async move {
            let response = next.run(request).await;
            if response.status().is_server_error() {
                Err(response)
            } else {
                Ok(response)
            }
        })
        .await;

    match result {
        Ok(response) | Err(CircuitError::Inner(response)) => response,
        Err(CircuitError::Open | CircuitError::TooManyTrialRequests) => {
            counter!(BREAKER_REJECTED, "breaker" => name.clone()).increment(1);
            warn!(breaker = %name, "request rejected by circuit breaker");
            AppError::CircuitOpen(name).into_response()
        },
        Err(CircuitError::Timeout(limit)) => {
            warn!(breaker = %name, ?limit, "request timed out under circuit breaker");
            AppError::UpstreamTimeout(name).into_response()
        },
    }
}
