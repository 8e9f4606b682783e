//! Account push events from the user-data stream.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::order::{OrderId, OrderSide, OrderType, PositionSide};

/// Why an order update was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionType {
    New,
    Canceled,
    Calculated,
    Expired,
    Trade,
    Amendment,
    #[serde(other)]
    Unknown,
}

/// An order or fill update for the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTradeUpdate {
    pub symbol: String,
    pub order_id: OrderId,
    pub side: OrderSide,
    pub position_side: PositionSide,
    pub order_type: OrderType,
    pub execution_type: ExecutionType,
    pub order_status: String,
    pub last_filled_price: Decimal,
    pub last_filled_qty: Decimal,
    pub realized_profit: Decimal,
    pub event_time: DateTime<Utc>,
}

impl OrderTradeUpdate {
    /// Whether this update reports an actual fill.
    #[must_use]
    pub fn is_trade(&self) -> bool {
        self.execution_type == ExecutionType::Trade
    }

    /// A take-profit fill closes the position.
    #[must_use]
    pub fn is_take_profit_fill(&self) -> bool {
        self.is_trade() && self.order_type == OrderType::TakeProfitMarket
    }
}

/// Events delivered on the account push stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountEvent {
    OrderTradeUpdate(OrderTradeUpdate),
    /// The session key expired; the stream delivers nothing further.
    ListenKeyExpired,
    /// Any event type the listener does not act on.
    Other(String),
}
