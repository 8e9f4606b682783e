//! In-memory [`FuturesExchange`] for driving the services without a network.
//!
//! Market entries fill immediately at the mark price and open (or grow) the
//! matching position, so protective orders can read back an entry price.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::domain::{
    AccountTrade, MarginType, OpenOrder, OrderAck, OrderId, OrderRequest, OrderType,
    PositionRisk, PositionSide, SymbolPrecision,
};
use crate::error::ExchangeError;
use crate::exchange::{FuturesExchange, LeverageChange, TradeQuery, MAX_TRADE_PAGE};

/// One recorded exchange call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    PositionRisk(String),
    ChangeLeverage(String, u32),
    ChangeMarginType(String, MarginType),
    ChangePositionMode(bool),
    OpenOrders(String),
    CancelOrder(String, OrderId),
    PlaceOrder(OrderRequest),
    SymbolPrecision(String),
    MarkPrice(String),
    AccountTrades(Option<String>),
    StartUserStream,
    KeepaliveUserStream,
}

#[derive(Default)]
struct State {
    mark_prices: HashMap<String, Decimal>,
    precisions: HashMap<String, SymbolPrecision>,
    positions: HashMap<(String, PositionSide), PositionRisk>,
    open_orders: Vec<OpenOrder>,
    placed: Vec<OrderRequest>,
    trades: Vec<AccountTrade>,
    failing: HashSet<&'static str>,
    rejected_types: HashSet<OrderType>,
    calls: Vec<Call>,
    next_order_id: i64,
}

pub struct MockExchange {
    state: Mutex<State>,
}

impl MockExchange {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_order_id: 1,
                ..State::default()
            }),
        }
    }

    /// An exchange listing `symbol` at `mark_price` with two price and three quantity decimals.
    pub fn with_market(symbol: &str, mark_price: Decimal) -> Self {
        let exchange = Self::new();
        exchange.set_market(symbol, mark_price, SymbolPrecision::new(2, 3));
        exchange
    }

    pub fn set_market(&self, symbol: &str, mark_price: Decimal, precision: SymbolPrecision) {
        let mut state = self.state.lock();
        state.mark_prices.insert(symbol.to_string(), mark_price);
        state.precisions.insert(symbol.to_string(), precision);
    }

    pub fn set_mark_price(&self, symbol: &str, mark_price: Decimal) {
        self.state
            .lock()
            .mark_prices
            .insert(symbol.to_string(), mark_price);
    }

    pub fn set_position(&self, risk: PositionRisk) {
        self.state
            .lock()
            .positions
            .insert((risk.symbol.clone(), risk.position_side), risk);
    }

    pub fn add_open_order(&self, order: OpenOrder) {
        self.state.lock().open_orders.push(order);
    }

    /// Replace the trade history. Trades get ids `1..` in the given order.
    pub fn set_trades(&self, mut trades: Vec<AccountTrade>) {
        for (id, trade) in (1..).zip(trades.iter_mut()) {
            trade.id = id;
        }
        self.state.lock().trades = trades;
    }

    /// Make every later call to `operation` fail. Names match the trait methods.
    pub fn fail_on(&self, operation: &'static str) {
        self.state.lock().failing.insert(operation);
    }

    /// Reject `place_order` for one order type only.
    pub fn reject_order_type(&self, order_type: OrderType) {
        self.state.lock().rejected_types.insert(order_type);
    }

    pub fn recover(&self, operation: &'static str) {
        self.state.lock().failing.remove(operation);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    /// Every order request accepted so far, in submission order.
    pub fn placed_orders(&self) -> Vec<OrderRequest> {
        self.state.lock().placed.clone()
    }

    pub fn open_order_ids(&self, symbol: &str) -> Vec<OrderId> {
        self.state
            .lock()
            .open_orders
            .iter()
            .filter(|o| o.symbol == symbol)
            .map(|o| o.order_id)
            .collect()
    }

    pub fn position(&self, symbol: &str, side: PositionSide) -> Option<PositionRisk> {
        self.state
            .lock()
            .positions
            .get(&(symbol.to_string(), side))
            .cloned()
    }

    fn enter(&self, operation: &'static str, call: Call) -> Result<(), ExchangeError> {
        let mut state = self.state.lock();
        state.calls.push(call);
        if state.failing.contains(operation) {
            return Err(ExchangeError::Other(format!("mock failure: {operation}")));
        }
        Ok(())
    }
}

impl Default for MockExchange {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FuturesExchange for MockExchange {
    async fn position_risk(&self, symbol: &str) -> Result<Vec<PositionRisk>, ExchangeError> {
        self.enter("position_risk", Call::PositionRisk(symbol.to_string()))?;
        let state = self.state.lock();
        let mut positions: Vec<PositionRisk> = state
            .positions
            .values()
            .filter(|p| p.symbol == symbol)
            .cloned()
            .collect();
        positions.sort_by_key(|p| p.position_side.as_str());
        Ok(positions)
    }

    async fn change_leverage(
        &self,
        symbol: &str,
        leverage: u32,
    ) -> Result<LeverageChange, ExchangeError> {
        self.enter(
            "change_leverage",
            Call::ChangeLeverage(symbol.to_string(), leverage),
        )?;
        Ok(LeverageChange {
            symbol: symbol.to_string(),
            leverage,
            max_notional_value: Decimal::from(1_000_000),
        })
    }

    async fn change_margin_type(
        &self,
        symbol: &str,
        margin_type: MarginType,
    ) -> Result<(), ExchangeError> {
        self.enter(
            "change_margin_type",
            Call::ChangeMarginType(symbol.to_string(), margin_type),
        )
    }

    async fn change_position_mode(&self, dual_side: bool) -> Result<(), ExchangeError> {
        self.enter("change_position_mode", Call::ChangePositionMode(dual_side))
    }

    async fn open_orders(&self, symbol: &str) -> Result<Vec<OpenOrder>, ExchangeError> {
        self.enter("open_orders", Call::OpenOrders(symbol.to_string()))?;
        Ok(self
            .state
            .lock()
            .open_orders
            .iter()
            .filter(|o| o.symbol == symbol)
            .cloned()
            .collect())
    }

    async fn cancel_order(&self, symbol: &str, order_id: OrderId) -> Result<(), ExchangeError> {
        self.enter(
            "cancel_order",
            Call::CancelOrder(symbol.to_string(), order_id),
        )?;
        let mut state = self.state.lock();
        let before = state.open_orders.len();
        state
            .open_orders
            .retain(|o| !(o.symbol == symbol && o.order_id == order_id));
        if state.open_orders.len() == before {
            return Err(ExchangeError::Api {
                code: -2011,
                msg: "Unknown order sent.".into(),
            });
        }
        Ok(())
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, ExchangeError> {
        self.enter("place_order", Call::PlaceOrder(order.clone()))?;
        let mut state = self.state.lock();
        if state.rejected_types.contains(&order.order_type) {
            return Err(ExchangeError::Api {
                code: -2021,
                msg: "Order would immediately trigger.".into(),
            });
        }
        let order_id = OrderId(state.next_order_id);
        state.next_order_id += 1;
        state.placed.push(order.clone());

        if order.order_type == OrderType::Market {
            let mark = state
                .mark_prices
                .get(&order.symbol)
                .copied()
                .unwrap_or_default();
            let quantity = order.quantity.unwrap_or_default();
            let signed = match order.position_side {
                PositionSide::Short => -quantity,
                _ => quantity,
            };
            let position = state
                .positions
                .entry((order.symbol.clone(), order.position_side))
                .or_insert_with(|| PositionRisk::flat(&order.symbol, order.position_side, mark));
            if !position.is_open() {
                position.entry_price = mark;
            }
            position.mark_price = mark;
            position.position_amt += signed;
        } else {
            state.open_orders.push(OpenOrder {
                order_id,
                symbol: order.symbol.clone(),
                side: order.side,
                position_side: order.position_side,
                order_type: order.order_type,
            });
        }

        Ok(OrderAck {
            order_id,
            symbol: order.symbol.clone(),
            status: "NEW".into(),
        })
    }

    async fn symbol_precision(&self, symbol: &str) -> Result<SymbolPrecision, ExchangeError> {
        self.enter("symbol_precision", Call::SymbolPrecision(symbol.to_string()))?;
        self.state
            .lock()
            .precisions
            .get(symbol)
            .copied()
            .ok_or_else(|| ExchangeError::UnknownSymbol(symbol.to_string()))
    }

    async fn mark_price(&self, symbol: &str) -> Result<Decimal, ExchangeError> {
        self.enter("mark_price", Call::MarkPrice(symbol.to_string()))?;
        self.state
            .lock()
            .mark_prices
            .get(symbol)
            .copied()
            .ok_or_else(|| ExchangeError::UnknownSymbol(symbol.to_string()))
    }

    /// Pages like the exchange: at most `limit` rows, capped at [`MAX_TRADE_PAGE`],
    /// and a `from_id` query ignores the time bounds.
    async fn account_trades(&self, query: &TradeQuery) -> Result<Vec<AccountTrade>, ExchangeError> {
        self.enter("account_trades", Call::AccountTrades(query.symbol.clone()))?;
        Ok(self
            .state
            .lock()
            .trades
            .iter()
            .filter(|t| query.symbol.as_ref().map_or(true, |s| &t.symbol == s))
            .filter(|t| match query.from_id {
                Some(from_id) => t.id >= from_id,
                None => t.time >= query.start && t.time <= query.end,
            })
            .take(query.limit.min(MAX_TRADE_PAGE))
            .cloned()
            .collect())
    }

    async fn start_user_stream(&self) -> Result<String, ExchangeError> {
        self.enter("start_user_stream", Call::StartUserStream)?;
        Ok("mock-listen-key".into())
    }

    async fn keepalive_user_stream(&self) -> Result<(), ExchangeError> {
        self.enter("keepalive_user_stream", Call::KeepaliveUserStream)
    }

    fn exchange_name(&self) -> &'static str {
        "mock"
    }
}
