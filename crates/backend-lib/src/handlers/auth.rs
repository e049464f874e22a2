use axum::{extract::rejection::JsonRejection, extract::State, Json};
use tradedesk_common::{AuthResponse, LoginRequest, RefreshRequest, SignupRequest};
use zeroize::Zeroize;

use crate::{error::AppError, AppState};

pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(mut request) = payload?;
    let result = state.auth.signup(&request.email, &request.password).await;
    request.password.zeroize();
    Ok(Json(result?))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(mut request) = payload?;
    let result = state.auth.login(&request.email, &request.password).await;
    request.password.zeroize();
    Ok(Json(result?))
}

pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(request) = payload?;
    if request.refresh_token.is_empty() {
        return Err(AppError::InvalidInput("refresh_token is required".to_string()));
    }
    Ok(Json(state.auth.refresh(&request.refresh_token).await?))
}
