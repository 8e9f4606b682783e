//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.
//! Avoids each test module defining its own slightly-different defaults.

use rust_decimal_macros::dec;

use crate::app::{Config, TradingConfig};

/// Leverage 5, 10% take profit, 5% stop loss, guard on every open position.
///
/// Whitelist: `BTCUSDT`, `ETHUSDT`.
pub fn trading_config() -> TradingConfig {
    TradingConfig {
        leverage: 5,
        take_profit_pct: dec!(10),
        stop_loss_pct: dec!(5),
        limit_margin_size: dec!(0),
        win_or_loss_ratio: dec!(0),
        token_whitelist: vec!["BTCUSDT".into(), "ETHUSDT".into()],
        debounce_secs: 330,
    }
}

/// Full config around [`trading_config`] with notifications off and UTC scheduling.
pub fn config() -> Config {
    let mut config = Config::default();
    config.trading = trading_config();
    config.notify.line_enabled = false;
    config.schedule.timezone = "UTC".into();
    config
}
