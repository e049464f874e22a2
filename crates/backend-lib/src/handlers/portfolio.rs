use axum::{extract::State, Extension, Json};
use tradedesk_common::{HoldingsResponse, OrderbookResponse, PositionsResponse};

use crate::{auth::AuthenticatedUser, AppState};

pub async fn holdings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Json<HoldingsResponse> {
    Json(state.portfolio.holdings(user.user_id))
}

pub async fn orderbook(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Json<OrderbookResponse> {
    Json(state.portfolio.orderbook(user.user_id))
}

pub async fn positions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Json<PositionsResponse> {
    Json(state.portfolio.positions(user.user_id))
}
