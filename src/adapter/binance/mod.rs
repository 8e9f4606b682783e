//! Binance USDT-M futures adapter: signed REST client and user-data stream.

mod client;
mod dto;
mod stream;

pub use client::{BinanceCredentials, BinanceFutures};
pub use stream::{parse_event, BinanceUserStream};
