//! Binance USDT-M futures wire types.
//!
//! Prices and quantities arrive as JSON strings; `rust_decimal` parses them
//! directly.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::{
    AccountTrade, ExecutionType, OpenOrder, OrderAck, OrderId, OrderSide, OrderTradeUpdate,
    OrderType, PositionRisk, PositionSide, SymbolPrecision,
};
use crate::exchange::LeverageChange;

/// Error body returned with non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorDto {
    pub code: i64,
    pub msg: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRiskDto {
    pub symbol: String,
    pub position_side: PositionSide,
    pub entry_price: Decimal,
    pub mark_price: Decimal,
    #[serde(default)]
    pub isolated_wallet: Decimal,
    pub position_amt: Decimal,
}

impl From<PositionRiskDto> for PositionRisk {
    fn from(dto: PositionRiskDto) -> Self {
        Self {
            symbol: dto.symbol,
            position_side: dto.position_side,
            entry_price: dto.entry_price,
            mark_price: dto.mark_price,
            isolated_wallet: dto.isolated_wallet,
            position_amt: dto.position_amt,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeverageDto {
    pub symbol: String,
    pub leverage: u32,
    pub max_notional_value: Decimal,
}

impl From<LeverageDto> for LeverageChange {
    fn from(dto: LeverageDto) -> Self {
        Self {
            symbol: dto.symbol,
            leverage: dto.leverage,
            max_notional_value: dto.max_notional_value,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub order_id: i64,
    pub symbol: String,
    pub status: String,
    pub side: OrderSide,
    pub position_side: PositionSide,
    #[serde(rename = "type")]
    pub order_type: OrderType,
}

impl From<OrderDto> for OrderAck {
    fn from(dto: OrderDto) -> Self {
        Self {
            order_id: OrderId(dto.order_id),
            symbol: dto.symbol,
            status: dto.status,
        }
    }
}

impl From<OrderDto> for OpenOrder {
    fn from(dto: OrderDto) -> Self {
        Self {
            order_id: OrderId(dto.order_id),
            symbol: dto.symbol,
            side: dto.side,
            position_side: dto.position_side,
            order_type: dto.order_type,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExchangeInfoDto {
    pub symbols: Vec<SymbolInfoDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfoDto {
    pub symbol: String,
    pub price_precision: u32,
    pub quantity_precision: u32,
}

impl ExchangeInfoDto {
    pub fn precision(&self, symbol: &str) -> Option<SymbolPrecision> {
        self.symbols
            .iter()
            .find(|s| s.symbol == symbol)
            .map(|s| SymbolPrecision::new(s.price_precision, s.quantity_precision))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumIndexDto {
    pub symbol: String,
    pub mark_price: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTradeDto {
    pub id: i64,
    pub symbol: String,
    pub realized_pnl: Decimal,
    pub commission: Decimal,
    pub time: i64,
}

impl From<UserTradeDto> for AccountTrade {
    fn from(dto: UserTradeDto) -> Self {
        Self {
            id: dto.id,
            symbol: dto.symbol,
            realized_pnl: dto.realized_pnl,
            commission: dto.commission.abs(),
            time: millis_to_utc(dto.time),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenKeyDto {
    pub listen_key: String,
}

/// Envelope of a user-data stream message; only the event type is inspected first.
#[derive(Debug, Deserialize)]
pub struct StreamEnvelopeDto {
    #[serde(rename = "e")]
    pub event_type: String,
}

#[derive(Debug, Deserialize)]
pub struct OrderTradeUpdateDto {
    #[serde(rename = "E")]
    pub event_time: i64,
    #[serde(rename = "o")]
    pub order: OrderUpdateDto,
}

#[derive(Debug, Deserialize)]
pub struct OrderUpdateDto {
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "S")]
    pub side: OrderSide,
    #[serde(rename = "o")]
    pub order_type: OrderType,
    #[serde(rename = "x")]
    pub execution_type: ExecutionType,
    #[serde(rename = "X")]
    pub order_status: String,
    #[serde(rename = "i")]
    pub order_id: i64,
    #[serde(rename = "L")]
    pub last_filled_price: Decimal,
    #[serde(rename = "l")]
    pub last_filled_qty: Decimal,
    #[serde(rename = "rp", default)]
    pub realized_profit: Decimal,
    #[serde(rename = "ps")]
    pub position_side: PositionSide,
}

impl From<OrderTradeUpdateDto> for OrderTradeUpdate {
    fn from(dto: OrderTradeUpdateDto) -> Self {
        let o = dto.order;
        Self {
            symbol: o.symbol,
            order_id: OrderId(o.order_id),
            side: o.side,
            position_side: o.position_side,
            order_type: o.order_type,
            execution_type: o.execution_type,
            order_status: o.order_status,
            last_filled_price: o.last_filled_price,
            last_filled_qty: o.last_filled_qty,
            realized_profit: o.realized_profit,
            event_time: millis_to_utc(dto.event_time),
        }
    }
}

pub(crate) fn millis_to_utc(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}
