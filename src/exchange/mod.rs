//! Exchange abstraction layer.
//!
//! The orchestrator depends only on these traits; the Binance adapter and the
//! test doubles implement them.

mod traits;

pub use traits::{AccountEventStream, FuturesExchange, LeverageChange, TradeQuery, MAX_TRADE_PAGE};
