use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use metrics::counter;
use std::net::SocketAddr;
use tracing::warn;

use crate::auth::RateLimitDecision;
use crate::metrics::AUTH_RATE_LIMITED;
use crate::{error::AppError, AppState};

/// Limit login attempts per client
pub async fn login_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client = client_key(&request, state.settings.rate_limit.trust_forwarded_headers);

    match state.login_limiter.check_and_increment(&client).await {
        RateLimitDecision::Allowed { .. } => Ok(next.run(request).await),
        RateLimitDecision::Limited { retry_after } => {
            counter!(AUTH_RATE_LIMITED).increment(1);
            warn!(%client, "login rate limit exceeded");
            Err(AppError::RateLimitExceeded {
                retry_after_secs: retry_after.as_secs().max(1),
            })
        },
    }
}

/// Client identity for rate limiting.
///
/// The peer address, else `"unknown"`. With `trust_forwarded_headers` the
/// first `X-Forwarded-For` entry and then `X-Real-IP` take precedence.
pub fn client_key(request: &Request, trust_forwarded_headers: bool) -> String {
    if trust_forwarded_headers {
        if let Some(forwarded) = forwarded_client(request) {
            return forwarded;
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_client(request: &Request) -> Option<String> {
    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(forwarded) = header("x-forwarded-for") {
        if let Some(first) = forwarded.split(',').map(str::trim).find(|v| !v.is_empty()) {
            return Some(first.to_string());
        }
    }

    header("x-real-ip").map(str::to_string)
}
