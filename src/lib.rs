//! Tradebridge - signal-driven, risk-controlled order execution for Binance
//! USDT-M futures.
//!
//! TradingView alerts arrive as compact command strings
//! (`SYMBOL_SIDE_AMOUNTUSD_TP_SL[_CHECKWL[_ONLYONE]]`). Each command passes a
//! whitelist check, a per-symbol/side debounce, and a position risk guard
//! before the exchange is prepared and a market entry is placed. Take-profit
//! and stop-loss orders are then bracketed around the reported entry price.
//!
//! # Modules
//!
//! - [`domain`] - Exchange-agnostic types: commands, orders, positions, pricing
//! - [`exchange`] - Trait definitions for exchange implementations
//! - [`service`] - Orchestration, risk guard, debounce, PnL, scheduling, notifications
//! - [`adapter`] - Binance REST/WebSocket client and the webhook
//! - [`app`] - Configuration and the process runtime
//! - [`cli`] - Command-line entry points
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```
//! use tradebridge::domain::{Command, Side};
//!
//! let command: Command = "ETHUSDT_LONG_500_true_true_true".parse().unwrap();
//! assert_eq!(command.side, Side::Long);
//! assert!(command.wants_protection());
//! ```

pub mod adapter;
pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod exchange;
pub mod service;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
