use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::{ProtectionKind, Side};

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("missing environment variable: {name}")]
    MissingEnv { name: &'static str },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Validation errors for inbound trading commands.
///
/// Raised before any exchange call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("command is empty")]
    Empty,

    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid side '{0}': expected LONG or SHORT")]
    InvalidSide(String),

    #[error("invalid amount '{0}': expected a positive integer")]
    InvalidAmount(String),

    #[error("invalid value '{value}' for {field}: expected true or false")]
    InvalidFlag { field: &'static str, value: String },

    #[error("too many fields: got {count}, at most 7 are accepted")]
    TooManyFields { count: usize },

    #[error("symbol {0} is not in the token whitelist")]
    NotWhitelisted(String),
}

/// Position risk guard rejections.
#[derive(Error, Debug, Clone)]
pub enum RiskError {
    #[error(
        "skipping order: side={side} entry={entry_price} mark={mark_price} roe={roe}% below threshold {threshold}%"
    )]
    RatioBreached {
        side: Side,
        entry_price: Decimal,
        mark_price: Decimal,
        roe: Decimal,
        threshold: Decimal,
    },

    #[error("skipping order: side={side} entry={entry_price} has no usable mark price")]
    InvalidMarkPrice { side: Side, entry_price: Decimal },
}

/// Failures reported by the exchange or its transport.
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("exchange API error {code}: {msg}")]
    Api { code: i64, msg: String },

    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),

    #[error("no {side} position found for {symbol}")]
    PositionNotFound { symbol: String, side: Side },

    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("{0}")]
    Other(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for ExchangeError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ExchangeError::WebSocket(Box::new(err))
    }
}

/// Non-fatal failures while preparing exchange state for an entry.
///
/// These are logged and the flow continues with best-effort state.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("failed to cancel order {order_id}: {source}")]
    Cancel {
        order_id: i64,
        #[source]
        source: ExchangeError,
    },

    #[error("failed to change leverage: {0}")]
    Leverage(#[source] ExchangeError),

    #[error("failed to change margin type: {0}")]
    MarginType(#[source] ExchangeError),

    #[error("failed to change position mode: {0}")]
    PositionMode(#[source] ExchangeError),
}

/// Failures that prevent the entry order from being placed.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("failed to list open orders: {0}")]
    OpenOrders(#[source] ExchangeError),

    #[error("failed to load precision for {symbol}: {source}")]
    Precision {
        symbol: String,
        #[source]
        source: ExchangeError,
    },

    #[error("computed zero quantity for {symbol}, entry not placed")]
    ZeroQuantity { symbol: String },

    #[error("entry order rejected: {0}")]
    EntryRejected(#[source] ExchangeError),
}

/// Failures placing protective orders after a successful entry.
///
/// Never surfaced to the caller; the position stays open without the bracket.
#[derive(Error, Debug)]
pub enum ProtectionError {
    #[error("failed to read entry price: {0}")]
    EntryPrice(#[source] ExchangeError),

    #[error("no entry price reported for {symbol} {side}")]
    NoEntryPrice { symbol: String, side: Side },

    #[error("{kind} order at {trigger_price} rejected: {source}")]
    Rejected {
        kind: ProtectionKind,
        trigger_price: Decimal,
        #[source]
        source: ExchangeError,
    },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] CommandError),

    #[error("delay open order: {symbol} {side} is cooling down for another {remaining_secs}s")]
    Debounced {
        symbol: String,
        side: Side,
        remaining_secs: i64,
    },

    #[error(transparent)]
    Risk(#[from] RiskError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
