// ============================
// crates/backend-lib/src/portfolio.rs
// ============================
//! Read-only portfolio views. The figures are fixed demo data.
use chrono::{DateTime, Duration, Utc};
use tradedesk_common::{
    Holding, HoldingsResponse, Order, OrderSide, OrderStatus, OrderbookResponse, PnlCard, Position,
    PositionType, PositionsResponse, UserId,
};

#[derive(Debug, Clone, Default)]
pub struct PortfolioService;

impl PortfolioService {
    pub fn new() -> Self {
        Self
    }

    pub fn holdings(&self, user_id: UserId) -> HoldingsResponse {
        tracing::debug!(%user_id, "serving holdings");

        HoldingsResponse {
            holdings: vec![
                holding("RELIANCE", 10, 2450.50, 2485.20, 347.00, 1.42),
                holding("TCS", 5, 3820.75, 3795.30, -127.25, -0.67),
                holding("HDFCBANK", 8, 1675.40, 1702.80, 219.20, 1.64),
                holding("INFY", 15, 1834.60, 1856.90, 334.50, 1.22),
                holding("HINDUNILVR", 6, 2720.30, 2698.45, -131.10, -0.80),
            ],
            pnl_card: PnlCard {
                total_pnl: 642.35,
                total_pnl_percent: 0.96,
                day_pnl: 234.50,
                day_pnl_percent: 0.35,
                realized_pnl: 1250.75,
                unrealized_pnl: 642.35,
            },
        }
    }

    pub fn orderbook(&self, user_id: UserId) -> OrderbookResponse {
        self.orderbook_at(user_id, Utc::now())
    }

    /// Orderbook with order times relative to `now`
    pub fn orderbook_at(&self, user_id: UserId, now: DateTime<Utc>) -> OrderbookResponse {
        tracing::debug!(%user_id, "serving orderbook");

        let placed = |minutes_ago: i64| now - Duration::minutes(minutes_ago);
        let executed = |minutes_ago: i64, fill_minutes: i64| {
            Some(placed(minutes_ago) + Duration::minutes(fill_minutes))
        };

        OrderbookResponse {
            orders: vec![
                Order {
                    id: "ORD001".to_string(),
                    symbol: "RELIANCE".to_string(),
                    order_type: OrderSide::Buy,
                    quantity: 10,
                    price: 2450.50,
                    status: OrderStatus::Completed,
                    order_time: placed(120),
                    executed_time: executed(120, 5),
                },
                Order {
                    id: "ORD002".to_string(),
                    symbol: "TCS".to_string(),
                    order_type: OrderSide::Sell,
                    quantity: 3,
                    price: 3825.00,
                    status: OrderStatus::Completed,
                    order_time: placed(60),
                    executed_time: executed(60, 2),
                },
                Order {
                    id: "ORD003".to_string(),
                    symbol: "HDFCBANK".to_string(),
                    order_type: OrderSide::Buy,
                    quantity: 5,
                    price: 1680.25,
                    status: OrderStatus::Pending,
                    order_time: placed(30),
                    executed_time: None,
                },
                Order {
                    id: "ORD004".to_string(),
                    symbol: "INFY".to_string(),
                    order_type: OrderSide::Buy,
                    quantity: 8,
                    price: 1840.00,
                    status: OrderStatus::Cancelled,
                    order_time: placed(45),
                    executed_time: None,
                },
                Order {
                    id: "ORD005".to_string(),
                    symbol: "ITC".to_string(),
                    order_type: OrderSide::Sell,
                    quantity: 12,
                    price: 415.75,
                    status: OrderStatus::Completed,
                    order_time: placed(180),
                    executed_time: executed(180, 1),
                },
            ],
            pnl_card: PnlCard {
                total_pnl: 1893.10,
                total_pnl_percent: 2.84,
                day_pnl: 567.25,
                day_pnl_percent: 0.85,
                realized_pnl: 1250.75,
                unrealized_pnl: 642.35,
            },
        }
    }

    pub fn positions(&self, user_id: UserId) -> PositionsResponse {
        tracing::debug!(%user_id, "serving positions");

        PositionsResponse {
            positions: vec![
                position("BHARTIARTL", 20, 965.30, 972.85, 151.00, 0.78, PositionType::Long),
                position("SBIN", 25, 587.40, 582.15, -131.25, -0.89, PositionType::Long),
                position("KOTAKBANK", 12, 1789.60, 1795.20, 67.20, 0.31, PositionType::Long),
                position("ITC", 30, 418.75, 415.30, -103.50, -0.82, PositionType::Short),
            ],
            pnl_card: PnlCard {
                total_pnl: -16.55,
                total_pnl_percent: -0.02,
                day_pnl: -16.55,
                day_pnl_percent: -0.02,
                realized_pnl: 0.0,
                unrealized_pnl: -16.55,
            },
        }
    }
}

fn holding(
    symbol: &str,
    quantity: u32,
    average_price: f64,
    current_price: f64,
    pnl: f64,
    pnl_percent: f64,
) -> Holding {
    Holding {
        symbol: symbol.to_string(),
        quantity,
        average_price,
        current_price,
        pnl,
        pnl_percent,
    }
}

fn position(
    symbol: &str,
    quantity: u32,
    average_price: f64,
    current_price: f64,
    unrealized_pnl: f64,
    unrealized_pnl_percent: f64,
    position_type: PositionType,
) -> Position {
    Position {
        symbol: symbol.to_string(),
        quantity,
        average_price,
        current_price,
        unrealized_pnl,
        unrealized_pnl_percent,
        position_type,
    }
}
