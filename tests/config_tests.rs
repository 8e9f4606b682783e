use std::io::Write;

use rust_decimal_macros::dec;
use tempfile::NamedTempFile;
use tradebridge::app::Config;
use tradebridge::error::{ConfigError, Error};

fn write_temp_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}

#[test]
fn config_loads_every_section() {
    let file = write_temp_config(
        r#"
[exchange]
rest_url = "https://testnet.binancefuture.com"
ws_url = "wss://stream.binancefuture.com"
recv_window_ms = 10000

[trading]
leverage = 10
take_profit_pct = 3
stop_loss_pct = 1.5
limit_margin_size = 20
win_or_loss_ratio = -5
token_whitelist = ["BTCUSDT", "ETHUSDT"]
debounce_secs = 60

[schedule]
timezone = "Asia/Bangkok"
daily_report_at = "23:50"
keepalive_interval_secs = 900

[pnl]
day_end = "23:59:59.059"
include_zero_pnl_commission = true

[notify]
line_enabled = false

[logging]
level = "debug"
format = "json"
"#,
    );

    let config = Config::load(file.path()).unwrap();

    assert_eq!(config.exchange.rest_url, "https://testnet.binancefuture.com");
    assert_eq!(config.exchange.recv_window_ms, 10000);
    assert_eq!(config.trading.leverage, 10);
    assert_eq!(config.trading.stop_loss_pct, dec!(1.5));
    assert_eq!(config.trading.win_or_loss_ratio, dec!(-5));
    assert_eq!(config.trading.debounce_secs, 60);
    assert!(config.trading.is_whitelisted("btcusdt"));
    assert_eq!(config.schedule.keepalive_interval_secs, 900);
    assert!(config.pnl.include_zero_pnl_commission);
    assert_eq!(config.pnl_symbols(), vec!["BTCUSDT", "ETHUSDT"]);
    assert!(!config.notify.line_enabled);
    assert_eq!(config.logging.format, "json");
}

#[test]
fn missing_file_is_a_read_error() {
    let err = Config::load("/nonexistent/tradebridge.toml").unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::ReadFile(_))));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let file = write_temp_config("[trading\nleverage = ");
    let err = Config::load(file.path()).unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::Parse(_))));
}

#[test]
fn out_of_range_leverage_is_rejected() {
    let file = write_temp_config("[trading]\nleverage = 200\n");
    let err = Config::load(file.path()).unwrap_err();
    match err {
        Error::Config(ConfigError::InvalidValue { field, .. }) => {
            assert_eq!(field, "trading.leverage");
        }
        other => panic!("expected invalid value, got {other:?}"),
    }
}

#[test]
fn take_profit_of_a_hundred_percent_is_rejected() {
    let file = write_temp_config("[trading]\ntake_profit_pct = 100\n");
    let err = Config::load(file.path()).unwrap_err();
    match err {
        Error::Config(ConfigError::InvalidValue { field, .. }) => {
            assert_eq!(field, "trading.take_profit_pct");
        }
        other => panic!("expected invalid value, got {other:?}"),
    }
}

#[test]
fn bad_report_time_is_rejected() {
    let file = write_temp_config("[schedule]\ndaily_report_at = \"25:99\"\n");
    let err = Config::load(file.path()).unwrap_err();
    assert!(err.to_string().contains("schedule.daily_report_at"));
}

#[test]
fn unknown_log_format_is_rejected() {
    let file = write_temp_config("[logging]\nformat = \"xml\"\n");
    assert!(Config::load(file.path()).is_err());
}
