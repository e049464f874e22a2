// ================
// crates/common/src/lib.rs
// ================
//! Common types and structures
//! used for communication between tradedesk clients and the backend.
//! This module defines the JSON request and response bodies of the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a registered user
pub type UserId = Uuid;

/// Body of `POST /auth/signup`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/login`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/refresh`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Token pair returned by signup, login and refresh
/// # Fields
/// * `access_token` - Short-lived bearer token for API calls
/// * `refresh_token` - Long-lived token used only to mint new access tokens
/// * `expires_in` - Access token lifetime in seconds
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
}

/// Error body shape shared by every failing endpoint
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Stable code plus a human readable message
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Profit and loss summary attached to every portfolio view
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PnlCard {
    pub total_pnl: f64,
    pub total_pnl_percent: f64,
    pub day_pnl: f64,
    pub day_pnl_percent: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
}

/// A long-term stock holding
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Holding {
    pub symbol: String,
    pub quantity: u32,
    pub average_price: f64,
    pub current_price: f64,
    pub pnl: f64,
    pub pnl_percent: f64,
}

/// Buy or sell side of an order
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Lifecycle status of an order
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

/// An entry of the user's order book
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Order {
    pub id: String,
    pub symbol: String,
    pub order_type: OrderSide,
    pub quantity: u32,
    pub price: f64,
    pub status: OrderStatus,
    pub order_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executed_time: Option<DateTime<Utc>>,
}

/// Direction of an intraday position
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionType {
    Long,
    Short,
}

/// An open intraday position
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub quantity: u32,
    pub average_price: f64,
    pub current_price: f64,
    pub unrealized_pnl: f64,
    pub unrealized_pnl_percent: f64,
    pub position_type: PositionType,
}

/// Response of `GET /holdings`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HoldingsResponse {
    pub holdings: Vec<Holding>,
    pub pnl_card: PnlCard,
}

/// Response of `GET /orderbook`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OrderbookResponse {
    pub orders: Vec<Order>,
    pub pnl_card: PnlCard,
}

/// Response of `GET /positions`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PositionsResponse {
    pub positions: Vec<Position>,
    pub pnl_card: PnlCard,
}

/// Response of `GET /health`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub service: String,
}
