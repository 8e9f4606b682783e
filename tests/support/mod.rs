//! Shared wiring for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal_macros::dec;
use tradebridge::app::TradingConfig;
use tradebridge::domain::SymbolPrecision;
use tradebridge::service::{DebounceGate, NotifierRegistry, OrderOrchestrator};
use tradebridge::testkit::config::trading_config;
use tradebridge::testkit::{ManualClock, MockExchange, RecordingNotifier};

/// An orchestrator over a mock exchange with every collaborator exposed.
pub struct Harness {
    pub exchange: Arc<MockExchange>,
    pub clock: Arc<ManualClock>,
    pub debounce: Arc<DebounceGate>,
    pub notifier: RecordingNotifier,
    pub orchestrator: Arc<OrderOrchestrator>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(trading_config())
    }

    /// ETHUSDT at 2000, BTCUSDT at 20000 and DOGEUSDT at 0.1.
    pub fn with_config(config: TradingConfig) -> Self {
        let exchange = Arc::new(MockExchange::new());
        exchange.set_market("ETHUSDT", dec!(2000), SymbolPrecision::new(2, 3));
        exchange.set_market("BTCUSDT", dec!(20000), SymbolPrecision::new(2, 3));
        exchange.set_market("DOGEUSDT", dec!(0.1), SymbolPrecision::new(5, 0));

        let clock = Arc::new(ManualClock::default());
        let debounce = Arc::new(DebounceGate::with_window_secs(config.debounce_secs));
        let notifier = RecordingNotifier::new();
        let mut registry = NotifierRegistry::new();
        registry.register(Box::new(notifier.clone()));

        let orchestrator = Arc::new(OrderOrchestrator::new(
            config,
            exchange.clone(),
            Arc::clone(&debounce),
            clock.clone(),
            Arc::new(registry),
        ));

        Self {
            exchange,
            clock,
            debounce,
            notifier,
            orchestrator,
        }
    }
}
