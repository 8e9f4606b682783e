//! Application configuration loading and validation.
//!
//! Configuration is loaded from a TOML file with environment variable overrides
//! for sensitive values (`BINANCE_API_KEY`, `BINANCE_API_SECRET`) and `PORT`.
//! Every section is optional; missing fields take their defaults.

use std::path::Path;

use chrono::NaiveTime;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use crate::adapter::binance::BinanceCredentials;
use crate::error::{ConfigError, Result};
use crate::service::{default_day_end, DEFAULT_LINE_NOTIFY_URL, DEFAULT_WINDOW_SECS};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub trading: TradingConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub pnl: PnlConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Loaded from the environment only, never from the file.
    #[serde(skip)]
    pub credentials: Option<BinanceCredentials>,
}

/// Exchange endpoints and transport settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    #[serde(default = "default_rest_url")]
    pub rest_url: String,
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    #[serde(default = "default_recv_window_ms")]
    pub recv_window_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_rest_url() -> String {
    "https://fapi.binance.com".into()
}

fn default_ws_url() -> String {
    "wss://fstream.binance.com".into()
}

fn default_recv_window_ms() -> u64 {
    5000
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            rest_url: default_rest_url(),
            ws_url: default_ws_url(),
            recv_window_ms: default_recv_window_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Sizing, bracket and guard parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct TradingConfig {
    #[serde(default = "default_leverage")]
    pub leverage: u32,
    /// Take-profit distance from entry, in percent.
    #[serde(default = "default_take_profit_pct")]
    pub take_profit_pct: Decimal,
    /// Stop-loss distance from entry, in percent.
    #[serde(default = "default_stop_loss_pct")]
    pub stop_loss_pct: Decimal,
    /// Isolated margin above which the ROE guard applies.
    #[serde(default)]
    pub limit_margin_size: Decimal,
    /// Minimum ROE (percent) an existing position must show to be added to.
    #[serde(default)]
    pub win_or_loss_ratio: Decimal,
    #[serde(default)]
    pub token_whitelist: Vec<String>,
    #[serde(default = "default_debounce_secs")]
    pub debounce_secs: i64,
}

fn default_leverage() -> u32 {
    5
}

fn default_take_profit_pct() -> Decimal {
    dec!(10)
}

fn default_stop_loss_pct() -> Decimal {
    dec!(5)
}

fn default_debounce_secs() -> i64 {
    DEFAULT_WINDOW_SECS
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            leverage: default_leverage(),
            take_profit_pct: default_take_profit_pct(),
            stop_loss_pct: default_stop_loss_pct(),
            limit_margin_size: Decimal::ZERO,
            win_or_loss_ratio: Decimal::ZERO,
            token_whitelist: Vec::new(),
            debounce_secs: default_debounce_secs(),
        }
    }
}

impl TradingConfig {
    #[must_use]
    pub fn is_whitelisted(&self, symbol: &str) -> bool {
        self.token_whitelist
            .iter()
            .any(|s| s.trim().eq_ignore_ascii_case(symbol))
    }
}

/// Background task timing.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// IANA zone the exchange day and the report time are expressed in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Local `HH:MM[:SS]` time of the daily PnL report.
    #[serde(default = "default_daily_report_at")]
    pub daily_report_at: String,
    #[serde(default = "default_keepalive_interval_secs")]
    pub keepalive_interval_secs: u64,
}

fn default_timezone() -> String {
    "Asia/Bangkok".into()
}

fn default_daily_report_at() -> String {
    "23:55".into()
}

fn default_keepalive_interval_secs() -> u64 {
    30 * 60
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            daily_report_at: default_daily_report_at(),
            keepalive_interval_secs: default_keepalive_interval_secs(),
        }
    }
}

impl ScheduleConfig {
    pub fn timezone(&self) -> std::result::Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "schedule.timezone",
                reason: e.to_string(),
            })
    }

    pub fn report_time(&self) -> std::result::Result<NaiveTime, ConfigError> {
        parse_time(&self.daily_report_at, "schedule.daily_report_at")
    }
}

/// Realized PnL window settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PnlConfig {
    /// Inclusive local upper bound of the daily window, `HH:MM:SS[.fff]`.
    #[serde(default = "default_day_end_str")]
    pub day_end: String,
    #[serde(default)]
    pub include_zero_pnl_commission: bool,
    /// Symbols to aggregate. Empty falls back to the token whitelist.
    #[serde(default)]
    pub symbols: Vec<String>,
}

fn default_day_end_str() -> String {
    default_day_end().format("%H:%M:%S%.3f").to_string()
}

impl Default for PnlConfig {
    fn default() -> Self {
        Self {
            day_end: default_day_end_str(),
            include_zero_pnl_commission: false,
            symbols: Vec::new(),
        }
    }
}

impl PnlConfig {
    pub fn day_end(&self) -> std::result::Result<NaiveTime, ConfigError> {
        parse_time(&self.day_end, "pnl.day_end")
    }
}

/// Webhook listener.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Notification channels. The LINE token comes from `LINE_NOTIFY_TOKEN`.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_true")]
    pub line_enabled: bool,
    #[serde(default = "default_line_url")]
    pub line_url: String,
}

fn default_true() -> bool {
    true
}

fn default_line_url() -> String {
    DEFAULT_LINE_NOTIFY_URL.into()
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            line_enabled: true,
            line_url: default_line_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn parse_time(value: &str, field: &'static str) -> std::result::Result<NaiveTime, ConfigError> {
    ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(value.trim(), fmt).ok())
        .ok_or_else(|| ConfigError::InvalidValue {
            field,
            reason: format!("'{value}' is not a HH:MM[:SS[.fff]] time"),
        })
}

impl Config {
    /// Load from a TOML file, apply environment overrides and validate.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let mut config = Self::parse(&content)?;
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML without touching the environment.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content).map_err(ConfigError::Parse)?)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Credentials are never read from the config file.
        let api_key = std::env::var("BINANCE_API_KEY").ok();
        let api_secret = std::env::var("BINANCE_API_SECRET").ok();
        if let (Some(api_key), Some(api_secret)) = (api_key, api_secret) {
            self.credentials = Some(BinanceCredentials {
                api_key,
                api_secret,
            });
        }

        if let Ok(port) = std::env::var("PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: "PORT",
                reason: format!("'{port}' is not a port number"),
            })?;
        }
        Ok(())
    }

    /// Credentials, or the missing variable's name.
    pub fn require_credentials(&self) -> Result<BinanceCredentials> {
        if let Some(credentials) = &self.credentials {
            return Ok(credentials.clone());
        }
        let name = if std::env::var("BINANCE_API_KEY").is_err() {
            "BINANCE_API_KEY"
        } else {
            "BINANCE_API_SECRET"
        };
        Err(ConfigError::MissingEnv { name }.into())
    }

    /// Symbols the PnL report covers.
    #[must_use]
    pub fn pnl_symbols(&self) -> Vec<String> {
        let symbols = if self.pnl.symbols.is_empty() {
            &self.trading.token_whitelist
        } else {
            &self.pnl.symbols
        };
        symbols.iter().map(|s| s.trim().to_ascii_uppercase()).collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.exchange.rest_url.is_empty() {
            return Err(ConfigError::MissingField { field: "exchange.rest_url" }.into());
        }
        if self.exchange.ws_url.is_empty() {
            return Err(ConfigError::MissingField { field: "exchange.ws_url" }.into());
        }
        if !(1..=125).contains(&self.trading.leverage) {
            return Err(ConfigError::InvalidValue {
                field: "trading.leverage",
                reason: format!("{} is outside 1..=125", self.trading.leverage),
            }
            .into());
        }
        // A short's take-profit is entry * (1 - pct / 100).
        if self.trading.take_profit_pct <= Decimal::ZERO || self.trading.take_profit_pct >= dec!(100)
        {
            return Err(ConfigError::InvalidValue {
                field: "trading.take_profit_pct",
                reason: "must be between 0 and 100 exclusive".into(),
            }
            .into());
        }
        if self.trading.stop_loss_pct <= Decimal::ZERO || self.trading.stop_loss_pct >= dec!(100) {
            return Err(ConfigError::InvalidValue {
                field: "trading.stop_loss_pct",
                reason: "must be between 0 and 100 exclusive".into(),
            }
            .into());
        }
        if self.trading.debounce_secs < 0 {
            return Err(ConfigError::InvalidValue {
                field: "trading.debounce_secs",
                reason: "must not be negative".into(),
            }
            .into());
        }
        if self.schedule.keepalive_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "schedule.keepalive_interval_secs",
                reason: "must be positive".into(),
            }
            .into());
        }
        self.schedule.timezone()?;
        self.schedule.report_time()?;
        self.pnl.day_end()?;
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::InvalidValue {
                field: "logging.format",
                reason: format!("'{}' is not pretty or json", self.logging.format),
            }
            .into());
        }
        Ok(())
    }

    /// Initialize the global tracing subscriber. `RUST_LOG` wins over `logging.level`.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.logging.level));

        match self.logging.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}
