//! Order types shared by the orchestrator and exchange adapters.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Exchange-assigned order identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub i64);

impl OrderId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }
}

/// Position side in hedge mode. `Both` is reported in one-way mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionSide {
    Long,
    Short,
    Both,
}

impl PositionSide {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PositionSide::Long => "LONG",
            PositionSide::Short => "SHORT",
            PositionSide::Both => "BOTH",
        }
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Futures order types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Market,
    Limit,
    Stop,
    StopMarket,
    TakeProfit,
    TakeProfitMarket,
    TrailingStopMarket,
    #[serde(other)]
    Unknown,
}

impl OrderType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
            OrderType::Stop => "STOP",
            OrderType::StopMarket => "STOP_MARKET",
            OrderType::TakeProfit => "TAKE_PROFIT",
            OrderType::TakeProfitMarket => "TAKE_PROFIT_MARKET",
            OrderType::TrailingStopMarket => "TRAILING_STOP_MARKET",
            OrderType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Margin mode of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarginType {
    Isolated,
    Crossed,
}

impl MarginType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            MarginType::Isolated => "ISOLATED",
            MarginType::Crossed => "CROSSED",
        }
    }
}

/// Price used to evaluate trigger conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkingType {
    MarkPrice,
    ContractPrice,
}

impl WorkingType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            WorkingType::MarkPrice => "MARK_PRICE",
            WorkingType::ContractPrice => "CONTRACT_PRICE",
        }
    }
}

/// Which protective bracket an order represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtectionKind {
    TakeProfit,
    StopLoss,
}

impl ProtectionKind {
    /// Trigger order type used for this bracket.
    #[must_use]
    pub const fn order_type(self) -> OrderType {
        match self {
            ProtectionKind::TakeProfit => OrderType::TakeProfitMarket,
            ProtectionKind::StopLoss => OrderType::StopMarket,
        }
    }
}

impl fmt::Display for ProtectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtectionKind::TakeProfit => f.write_str("take profit"),
            ProtectionKind::StopLoss => f.write_str("stop loss"),
        }
    }
}

/// An order to submit to the exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub position_side: PositionSide,
    pub order_type: OrderType,
    /// Absent for close-position trigger orders.
    pub quantity: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub close_position: bool,
    pub working_type: Option<WorkingType>,
    pub price_protect: bool,
    /// Good-till-cancel; only sent for trigger orders.
    pub good_till_cancel: bool,
}

impl OrderRequest {
    /// A market order that opens or increases a position.
    pub fn market(
        symbol: impl Into<String>,
        side: OrderSide,
        position_side: PositionSide,
        quantity: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            position_side,
            order_type: OrderType::Market,
            quantity: Some(quantity),
            stop_price: None,
            close_position: false,
            working_type: None,
            price_protect: false,
            good_till_cancel: false,
        }
    }

    /// A mark-price triggered, price-protected order that closes the whole position.
    pub fn close_position(
        symbol: impl Into<String>,
        kind: ProtectionKind,
        side: OrderSide,
        position_side: PositionSide,
        stop_price: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            position_side,
            order_type: kind.order_type(),
            quantity: None,
            stop_price: Some(stop_price),
            close_position: true,
            working_type: Some(WorkingType::MarkPrice),
            price_protect: true,
            good_till_cancel: true,
        }
    }
}

/// Acknowledgement for an accepted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: OrderId,
    pub symbol: String,
    pub status: String,
}

/// A resting order as listed by the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenOrder {
    pub order_id: OrderId,
    pub symbol: String,
    pub side: OrderSide,
    pub position_side: PositionSide,
    pub order_type: OrderType,
}
