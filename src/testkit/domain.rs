//! Builders for domain values used across tests.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::domain::{
    AccountEvent, AccountTrade, ExecutionType, OrderId, OrderSide, OrderTradeUpdate, OrderType,
    PositionRisk, PositionSide,
};

/// Midnight UTC on the given day.
pub fn day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// A fill with id 0; `MockExchange::set_trades` numbers them.
pub fn trade(symbol: &str, realized_pnl: Decimal, commission: Decimal, time: DateTime<Utc>) -> AccountTrade {
    AccountTrade {
        id: 0,
        symbol: symbol.into(),
        realized_pnl,
        commission,
        time,
    }
}

/// An open position with the given entry, mark and isolated margin.
pub fn position(
    symbol: &str,
    side: PositionSide,
    entry_price: Decimal,
    mark_price: Decimal,
    isolated_wallet: Decimal,
) -> PositionRisk {
    PositionRisk {
        symbol: symbol.into(),
        position_side: side,
        entry_price,
        mark_price,
        isolated_wallet,
        position_amt: Decimal::ONE,
    }
}

/// A filled order update on the push stream.
pub fn fill(symbol: &str, order_type: OrderType, position_side: PositionSide, realized: Decimal) -> AccountEvent {
    let side = match (order_type, position_side) {
        (OrderType::Market, PositionSide::Short) => OrderSide::Sell,
        (OrderType::Market, _) => OrderSide::Buy,
        (_, PositionSide::Short) => OrderSide::Buy,
        _ => OrderSide::Sell,
    };
    AccountEvent::OrderTradeUpdate(OrderTradeUpdate {
        symbol: symbol.into(),
        order_id: OrderId(1),
        side,
        position_side,
        order_type,
        execution_type: ExecutionType::Trade,
        order_status: "FILLED".into(),
        last_filled_price: Decimal::ONE_HUNDRED,
        last_filled_qty: Decimal::ONE,
        realized_profit: realized,
        event_time: day(2024, 3, 1),
    })
}

/// A non-fill order update (an order was accepted).
pub fn accepted(symbol: &str, order_type: OrderType, position_side: PositionSide) -> AccountEvent {
    let AccountEvent::OrderTradeUpdate(mut update) = fill(symbol, order_type, position_side, Decimal::ZERO) else {
        unreachable!("fill always builds an order update");
    };
    update.execution_type = ExecutionType::New;
    update.order_status = "NEW".into();
    AccountEvent::OrderTradeUpdate(update)
}
