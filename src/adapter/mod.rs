//! Adapters connecting the services to the outside world.
//!
//! - `binance`: signed REST client and user-data stream for USDT-M futures
//! - `webhook`: HTTP intake for TradingView alerts

pub mod binance;
pub mod webhook;
