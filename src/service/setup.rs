//! Exchange-state preparation before an entry order.
//!
//! Stale same-side orders are cancelled and the symbol is switched to the
//! configured leverage, isolated margin and hedge mode. Only the open-order
//! listing is fatal; every other step is best effort.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{Command, MarginType, OpenOrder, OrderId};
use crate::error::{ExecutionError, SetupError};
use crate::exchange::FuturesExchange;

/// What the coordinator did to prepare for an entry.
#[derive(Debug)]
pub enum SetupOutcome {
    /// Exchange state is prepared; the entry may proceed.
    Ready {
        cancelled: Vec<OrderId>,
        /// Non-fatal failures encountered along the way.
        warnings: Vec<SetupError>,
    },
    /// The command asked for a single order and the symbol already has some.
    Skipped { open_orders: usize },
}

impl SetupOutcome {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, SetupOutcome::Ready { .. })
    }
}

/// Prepares leverage, margin mode, position mode and resting orders.
pub struct TradeSetupCoordinator {
    exchange: Arc<dyn FuturesExchange>,
    leverage: u32,
}

impl TradeSetupCoordinator {
    pub fn new(exchange: Arc<dyn FuturesExchange>, leverage: u32) -> Self {
        Self { exchange, leverage }
    }

    pub async fn prepare(&self, command: &Command) -> Result<SetupOutcome, ExecutionError> {
        let symbol = command.symbol.as_str();
        let open_orders = self
            .exchange
            .open_orders(symbol)
            .await
            .map_err(ExecutionError::OpenOrders)?;

        if command.only_one_order && !open_orders.is_empty() {
            info!(
                symbol,
                open_orders = open_orders.len(),
                "Symbol already has open orders, skipping entry"
            );
            return Ok(SetupOutcome::Skipped {
                open_orders: open_orders.len(),
            });
        }

        let mut warnings = Vec::new();
        let cancelled = self.cancel_same_side(command, &open_orders, &mut warnings).await;

        if let Err(e) = self.exchange.change_leverage(symbol, self.leverage).await {
            warnings.push(SetupError::Leverage(e));
        }
        if let Err(e) = self
            .exchange
            .change_margin_type(symbol, MarginType::Isolated)
            .await
        {
            warnings.push(SetupError::MarginType(e));
        }
        if let Err(e) = self.exchange.change_position_mode(true).await {
            warnings.push(SetupError::PositionMode(e));
        }

        for warning in &warnings {
            warn!(symbol, error = %warning, "Setup step failed, continuing");
        }

        Ok(SetupOutcome::Ready {
            cancelled,
            warnings,
        })
    }

    async fn cancel_same_side(
        &self,
        command: &Command,
        open_orders: &[OpenOrder],
        warnings: &mut Vec<SetupError>,
    ) -> Vec<OrderId> {
        let position_side = command.side.position_side();
        let mut cancelled = Vec::new();

        for order in open_orders.iter().filter(|o| o.position_side == position_side) {
            match self.exchange.cancel_order(&command.symbol, order.order_id).await {
                Ok(()) => {
                    info!(
                        symbol = %command.symbol,
                        order_id = %order.order_id,
                        order_type = %order.order_type,
                        "Cancelled stale order"
                    );
                    cancelled.push(order.order_id);
                }
                Err(source) => warnings.push(SetupError::Cancel {
                    order_id: order.order_id.value(),
                    source,
                }),
            }
        }

        cancelled
    }
}
