//! Exchange trait definitions.
//!
//! These traits define the capability surface the orchestrator needs from a
//! futures exchange. Every call is a single attempt; implementations do not retry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::{
    AccountEvent, AccountTrade, MarginType, OpenOrder, OrderAck, OrderId, OrderRequest,
    PositionRisk, SymbolPrecision,
};
use crate::error::ExchangeError;

/// Leverage accepted by the exchange after a change request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeverageChange {
    pub symbol: String,
    pub leverage: u32,
    pub max_notional_value: Decimal,
}

/// Largest page of account trades a single request may return.
pub const MAX_TRADE_PAGE: usize = 1000;

/// One page of an account trade-history request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeQuery {
    pub symbol: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Continue from this trade id. The exchange then ignores the time bounds,
    /// so callers filter the page against `start..=end` themselves.
    pub from_id: Option<i64>,
    pub limit: usize,
}

impl TradeQuery {
    /// First page of fills between `start` and `end`, inclusive.
    pub fn new(symbol: Option<&str>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.map(str::to_string),
            start,
            end,
            from_id: None,
            limit: MAX_TRADE_PAGE,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.clamp(1, MAX_TRADE_PAGE);
        self
    }
}

/// Account, order and market-data operations on a USDT-margined futures exchange.
#[async_trait]
pub trait FuturesExchange: Send + Sync {
    /// Position risk for every position side of `symbol`.
    async fn position_risk(&self, symbol: &str) -> Result<Vec<PositionRisk>, ExchangeError>;

    async fn change_leverage(
        &self,
        symbol: &str,
        leverage: u32,
    ) -> Result<LeverageChange, ExchangeError>;

    async fn change_margin_type(
        &self,
        symbol: &str,
        margin_type: MarginType,
    ) -> Result<(), ExchangeError>;

    /// Switch between hedge (`dual_side = true`) and one-way position mode.
    async fn change_position_mode(&self, dual_side: bool) -> Result<(), ExchangeError>;

    async fn open_orders(&self, symbol: &str) -> Result<Vec<OpenOrder>, ExchangeError>;

    async fn cancel_order(&self, symbol: &str, order_id: OrderId) -> Result<(), ExchangeError>;

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, ExchangeError>;

    async fn symbol_precision(&self, symbol: &str) -> Result<SymbolPrecision, ExchangeError>;

    async fn mark_price(&self, symbol: &str) -> Result<Decimal, ExchangeError>;

    /// One page of account fills, at most `query.limit`, in ascending id order.
    ///
    /// `symbol = None` queries the whole account where the exchange allows it.
    async fn account_trades(&self, query: &TradeQuery) -> Result<Vec<AccountTrade>, ExchangeError>;

    /// Open a user-data stream and return its session (listen) key.
    async fn start_user_stream(&self) -> Result<String, ExchangeError>;

    /// Extend the validity of the current session key.
    async fn keepalive_user_stream(&self) -> Result<(), ExchangeError>;

    /// Get the exchange name for logging/debugging.
    fn exchange_name(&self) -> &'static str;
}

/// A long-lived subscription to account push events.
#[async_trait]
pub trait AccountEventStream: Send {
    /// Receive the next account event.
    ///
    /// Blocks until an event is available. Returns `None` when the stream is closed.
    async fn next_event(&mut self) -> Option<AccountEvent>;
}
