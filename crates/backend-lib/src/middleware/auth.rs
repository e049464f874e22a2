use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, AppState};

/// Reject requests without a valid access token and attach the caller's
/// [`AuthenticatedUser`](crate::auth::AuthenticatedUser) to the request.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let value = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Authorization header required".to_string()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("Authorization header is not valid text".to_string()))?;

    let token = bearer_token(value).ok_or_else(|| {
        AppError::Unauthorized("Authorization header must be 'Bearer <token>'".to_string())
    })?;

    let user = state.auth.validate_access_token(token)?;
    tracing::debug!(user_id = %user.user_id, "request authenticated");

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Token of a `Bearer <token>` header value; exactly two space separated parts
fn bearer_token(value: &str) -> Option<&str> {
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}
