// crates/backend-lib/src/handlers/mod.rs

//! HTTP handlers.

pub mod auth;
pub mod portfolio;

use axum::{http::Uri, Json};
use chrono::Utc;
use tradedesk_common::HealthResponse;

use crate::error::AppError;

pub const SERVICE_NAME: &str = "trading-platform-backend";

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        service: SERVICE_NAME.to_string(),
    })
}

pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}
