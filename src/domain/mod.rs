//! Exchange-agnostic domain types and arithmetic.

mod command;
mod event;
mod order;
mod position;
mod pricing;
mod trade;

pub use command::{Command, Side};
pub use event::{AccountEvent, ExecutionType, OrderTradeUpdate};
pub use order::{
    MarginType, OpenOrder, OrderAck, OrderId, OrderRequest, OrderSide, OrderType, PositionSide,
    ProtectionKind, WorkingType,
};
pub use position::PositionRisk;
pub use pricing::{
    leveraged_quantity, return_on_equity, round_half_away, PriceCalculator, ProtectivePrices,
    SymbolPrecision,
};
pub use trade::{AccountTrade, RealizedPnl};
