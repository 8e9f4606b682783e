//! Application layer: configuration and the process runtime.

mod config;
mod runtime;

pub use config::{
    Config, ExchangeConfig, LoggingConfig, NotifyConfig, PnlConfig, ScheduleConfig, ServerConfig,
    TradingConfig,
};
pub use runtime::{App, BackgroundTasks};
