//! Order orchestration.
//!
//! Each command moves through a fixed sequence of states:
//!
//! ```text
//! Received -> WhitelistChecked -> Debounced -> RiskChecked -> SetupComplete
//!          -> Sized -> Entered -> ProtectionPlaced -> Done
//! ```
//!
//! Any guard failure before `Entered` returns an error and nothing is sent to
//! the exchange beyond read-only queries and setup. Once the entry is placed
//! the call succeeds: protective order failures are notified, not returned,
//! and the position stays open without its bracket.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::app::TradingConfig;
use crate::domain::{
    Command, OrderId, OrderRequest, PriceCalculator, ProtectionKind, ProtectivePrices, Side,
    SymbolPrecision,
};
use crate::error::{CommandError, Error, ExecutionError, ProtectionError, Result};
use crate::exchange::FuturesExchange;

use super::clock::Clock;
use super::debounce::DebounceGate;
use super::notifier::{Event, NotifierRegistry, ProtectionEvent};
use super::risk::{PositionRiskEvaluator, RiskCheckResult};
use super::setup::{SetupOutcome, TradeSetupCoordinator};
use super::sizing::QuantitySizer;

/// Progress of a single command through the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OrderState {
    Received,
    WhitelistChecked,
    Debounced,
    RiskChecked,
    SetupComplete,
    Sized,
    Entered,
    ProtectionPlaced,
    Done,
}

/// Result of a protective order request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtectionStatus {
    /// The command did not ask for this bracket.
    Disabled,
    Placed {
        order_id: OrderId,
        trigger_price: Decimal,
    },
    Failed {
        reason: String,
    },
}

impl ProtectionStatus {
    #[must_use]
    pub fn is_placed(&self) -> bool {
        matches!(self, ProtectionStatus::Placed { .. })
    }
}

/// Summary of an executed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    pub entry_order_id: OrderId,
    pub cancelled_orders: Vec<OrderId>,
    pub take_profit: ProtectionStatus,
    pub stop_loss: ProtectionStatus,
    pub state: OrderState,
}

/// Successful outcome of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderOutcome {
    Executed(ExecutionReport),
    /// The command was valid but deliberately not acted on.
    Skipped { reason: String },
}

/// Sequences guards, setup, sizing, entry and protective orders.
pub struct OrderOrchestrator {
    config: TradingConfig,
    exchange: Arc<dyn FuturesExchange>,
    debounce: Arc<DebounceGate>,
    clock: Arc<dyn Clock>,
    notifiers: Arc<NotifierRegistry>,
    risk: PositionRiskEvaluator,
    setup: TradeSetupCoordinator,
    sizer: QuantitySizer,
    prices: PriceCalculator,
}

impl OrderOrchestrator {
    pub fn new(
        config: TradingConfig,
        exchange: Arc<dyn FuturesExchange>,
        debounce: Arc<DebounceGate>,
        clock: Arc<dyn Clock>,
        notifiers: Arc<NotifierRegistry>,
    ) -> Self {
        Self {
            risk: PositionRiskEvaluator::from_config(Arc::clone(&exchange), &config),
            setup: TradeSetupCoordinator::new(Arc::clone(&exchange), config.leverage),
            sizer: QuantitySizer::new(Arc::clone(&exchange), config.leverage),
            prices: PriceCalculator::new(config.take_profit_pct, config.stop_loss_pct),
            config,
            exchange,
            debounce,
            clock,
            notifiers,
        }
    }

    /// Execute a command on the side it names.
    pub async fn execute(&self, command: &Command) -> Result<OrderOutcome> {
        match command.side {
            Side::Long => self.open_long(command).await,
            Side::Short => self.open_short(command).await,
        }
    }

    /// Open or increase a long position.
    pub async fn open_long(&self, command: &Command) -> Result<OrderOutcome> {
        self.open(command, Side::Long).await
    }

    /// Open or increase a short position.
    pub async fn open_short(&self, command: &Command) -> Result<OrderOutcome> {
        self.open(command, Side::Short).await
    }

    async fn open(&self, command: &Command, side: Side) -> Result<OrderOutcome> {
        let command = Command {
            side,
            ..command.clone()
        };
        let result = self.run(&command).await;
        match &result {
            Ok(OrderOutcome::Executed(report)) => info!(
                symbol = %report.symbol,
                side = %report.side,
                quantity = %report.quantity,
                order_id = %report.entry_order_id,
                "Command executed"
            ),
            Ok(OrderOutcome::Skipped { reason }) => {
                info!(symbol = %command.symbol, side = %side, reason = %reason, "Command skipped");
            }
            Err(e) => warn!(symbol = %command.symbol, side = %side, error = %e, "Command rejected"),
        }
        result
    }

    async fn run(&self, command: &Command) -> Result<OrderOutcome> {
        let symbol = command.symbol.as_str();
        let side = command.side;
        let mut state = OrderState::Received;

        if command.check_whitelist && !self.config.is_whitelisted(symbol) {
            return Err(CommandError::NotWhitelisted(symbol.to_string()).into());
        }
        advance(&mut state, OrderState::WhitelistChecked, symbol);

        let now = self.clock.now();
        if !self.debounce.allow(symbol, side, now) {
            return Err(Error::Debounced {
                symbol: symbol.to_string(),
                side,
                remaining_secs: self.debounce.remaining(symbol, side, now).num_seconds(),
            });
        }
        advance(&mut state, OrderState::Debounced, symbol);

        if let RiskCheckResult::Rejected(e) = self.risk.evaluate(command).await? {
            return Err(e.into());
        }
        advance(&mut state, OrderState::RiskChecked, symbol);

        let cancelled_orders = match self.setup.prepare(command).await? {
            SetupOutcome::Ready { cancelled, .. } => cancelled,
            SetupOutcome::Skipped { open_orders } => {
                return Ok(OrderOutcome::Skipped {
                    reason: format!("{symbol} already has {open_orders} open order(s)"),
                });
            }
        };
        advance(&mut state, OrderState::SetupComplete, symbol);

        let precision = self
            .exchange
            .symbol_precision(symbol)
            .await
            .map_err(|source| ExecutionError::Precision {
                symbol: symbol.to_string(),
                source,
            })?;
        let quantity = self
            .sizer
            .size(symbol, command.amount_usd, precision.quantity_precision)
            .await;
        if quantity.is_zero() {
            return Err(ExecutionError::ZeroQuantity {
                symbol: symbol.to_string(),
            }
            .into());
        }
        advance(&mut state, OrderState::Sized, symbol);

        let entry = OrderRequest::market(
            symbol,
            side.entry_order_side(),
            side.position_side(),
            quantity,
        );
        let ack = self
            .exchange
            .place_order(&entry)
            .await
            .map_err(ExecutionError::EntryRejected)?;
        advance(&mut state, OrderState::Entered, symbol);

        let mut report = ExecutionReport {
            symbol: symbol.to_string(),
            side,
            quantity,
            entry_order_id: ack.order_id,
            cancelled_orders,
            take_profit: ProtectionStatus::Disabled,
            stop_loss: ProtectionStatus::Disabled,
            state,
        };

        if command.wants_protection() {
            self.protect(command, precision, &mut report).await;
            advance(&mut state, OrderState::ProtectionPlaced, symbol);
        }

        advance(&mut state, OrderState::Done, symbol);
        report.state = state;
        Ok(OrderOutcome::Executed(report))
    }

    /// Place the requested brackets around the entry price the exchange reports.
    async fn protect(
        &self,
        command: &Command,
        precision: SymbolPrecision,
        report: &mut ExecutionReport,
    ) {
        let prices = match self.protective_prices(command, precision).await {
            Ok(prices) => prices,
            Err(e) => {
                self.protection_failed(command, None, &e);
                let failed = ProtectionStatus::Failed {
                    reason: e.to_string(),
                };
                if command.take_profit {
                    report.take_profit = failed.clone();
                }
                if command.stop_loss {
                    report.stop_loss = failed;
                }
                return;
            }
        };

        if command.take_profit {
            report.take_profit = self
                .place_protection(command, ProtectionKind::TakeProfit, prices.take_profit)
                .await;
        }
        if command.stop_loss {
            report.stop_loss = self
                .place_protection(command, ProtectionKind::StopLoss, prices.stop_loss)
                .await;
        }
    }

    async fn protective_prices(
        &self,
        command: &Command,
        precision: SymbolPrecision,
    ) -> std::result::Result<ProtectivePrices, ProtectionError> {
        let risk = self
            .risk
            .fetch_risk(&command.symbol, command.side)
            .await
            .map_err(ProtectionError::EntryPrice)?;
        if !risk.is_open() {
            return Err(ProtectionError::NoEntryPrice {
                symbol: command.symbol.clone(),
                side: command.side,
            });
        }
        let prices = self
            .prices
            .calculate(command.side, risk.entry_price, precision.price_precision);
        debug!(
            symbol = %command.symbol,
            entry_price = %risk.entry_price,
            take_profit = %prices.take_profit,
            stop_loss = %prices.stop_loss,
            "Computed protective prices"
        );
        Ok(prices)
    }

    async fn place_protection(
        &self,
        command: &Command,
        kind: ProtectionKind,
        trigger_price: Decimal,
    ) -> ProtectionStatus {
        let order = OrderRequest::close_position(
            command.symbol.as_str(),
            kind,
            command.side.exit_order_side(),
            command.side.position_side(),
            trigger_price,
        );
        match self.exchange.place_order(&order).await {
            Ok(ack) => {
                info!(
                    symbol = %command.symbol,
                    kind = %kind,
                    trigger_price = %trigger_price,
                    order_id = %ack.order_id,
                    "Protective order placed"
                );
                ProtectionStatus::Placed {
                    order_id: ack.order_id,
                    trigger_price,
                }
            }
            Err(source) => {
                let e = ProtectionError::Rejected {
                    kind,
                    trigger_price,
                    source,
                };
                self.protection_failed(command, Some(kind), &e);
                ProtectionStatus::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn protection_failed(
        &self,
        command: &Command,
        kind: Option<ProtectionKind>,
        error: &ProtectionError,
    ) {
        warn!(symbol = %command.symbol, side = %command.side, error = %error, "Position left unprotected");
        self.notifiers
            .notify_all(Event::ProtectionFailed(ProtectionEvent {
                symbol: command.symbol.clone(),
                side: command.side,
                kind,
                reason: error.to_string(),
            }));
    }
}

fn advance(state: &mut OrderState, next: OrderState, symbol: &str) {
    debug!(symbol, from = ?*state, to = ?next, "Order state");
    *state = next;
}
