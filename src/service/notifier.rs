//! Notification system for alerts and events.
//!
//! The `Notifier` trait defines the interface for notification handlers.
//! Multiple notifiers can be registered with the `NotifierRegistry`. Every
//! event renders to a plain-text message; delivery is best-effort and never
//! blocks or fails the caller.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::{OrderTradeUpdate, ProtectionKind, RealizedPnl, Side};

/// Events that can trigger notifications.
#[derive(Debug, Clone)]
pub enum Event {
    /// A protective order could not be placed; the position is unprotected.
    ProtectionFailed(ProtectionEvent),
    /// A fill that opened or increased a position.
    PositionOpened(FillEvent),
    /// A take-profit fill that closed a position.
    PositionClosed(FillEvent),
    /// Realized PnL for the current day, sent after a close.
    PnlSummary(PnlEvent),
    /// Scheduled end-of-day realized PnL report.
    DailyReport(PnlEvent),
    /// The push-event session key expired.
    ListenKeyExpired,
    /// Renewing the session key failed.
    KeepaliveFailed { reason: String },
}

/// Protective order placement failure.
#[derive(Debug, Clone)]
pub struct ProtectionEvent {
    pub symbol: String,
    pub side: Side,
    pub kind: Option<ProtectionKind>,
    pub reason: String,
}

/// A fill reported by the account stream.
#[derive(Debug, Clone)]
pub struct FillEvent {
    pub symbol: String,
    pub side: String,
    pub position_side: String,
    pub order_type: String,
    pub price: Decimal,
    pub quantity: Decimal,
    pub realized_profit: Decimal,
}

impl From<&OrderTradeUpdate> for FillEvent {
    fn from(update: &OrderTradeUpdate) -> Self {
        Self {
            symbol: update.symbol.clone(),
            side: update.side.as_str().to_string(),
            position_side: update.position_side.to_string(),
            order_type: update.order_type.to_string(),
            price: update.last_filled_price,
            quantity: update.last_filled_qty,
            realized_profit: update.realized_profit,
        }
    }
}

/// Realized PnL for one exchange-local day.
#[derive(Debug, Clone)]
pub struct PnlEvent {
    pub date: NaiveDate,
    pub pnl: RealizedPnl,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::ProtectionFailed(e) => {
                let kind = e.kind.map_or_else(|| "protection".to_string(), |k| k.to_string());
                write!(
                    f,
                    "\n[{} {}] {kind} not placed, position is unprotected\n{}",
                    e.symbol, e.side, e.reason
                )
            }
            Event::PositionOpened(e) => write!(
                f,
                "\n[OPEN] {} {} {}\nType: {}\nPrice: {}\nQty: {}",
                e.symbol, e.position_side, e.side, e.order_type, e.price, e.quantity
            ),
            Event::PositionClosed(e) => write!(
                f,
                "\n[CLOSE] {} {} {}\nType: {}\nPrice: {}\nQty: {}\nRealized: {}",
                e.symbol,
                e.position_side,
                e.side,
                e.order_type,
                e.price,
                e.quantity,
                e.realized_profit
            ),
            Event::PnlSummary(e) => write!(f, "\nPnL {}\n{}", e.date, e.pnl),
            Event::DailyReport(e) => write!(f, "\nDaily report {}\n{}", e.date, e.pnl),
            Event::ListenKeyExpired => {
                f.write_str("\nUser data stream key expired, account events are no longer received")
            }
            Event::KeepaliveFailed { reason } => {
                write!(f, "\nFailed to renew user data stream key: {reason}")
            }
        }
    }
}

/// Trait for notification handlers.
///
/// Implement this trait to receive events from the system.
/// Notifications are fire-and-forget (async but not awaited).
pub trait Notifier: Send + Sync {
    /// Handle an event.
    fn notify(&self, event: Event);
}

/// Registry of notifiers.
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { notifiers: vec![] }
    }

    /// Register a notifier.
    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    /// Notify all registered notifiers.
    pub fn notify_all(&self, event: Event) {
        for notifier in &self.notifiers {
            notifier.notify(event.clone());
        }
    }

    /// Number of registered notifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Check if registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A no-op notifier for testing or when notifications are disabled.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: Event) {}
}

/// A logging notifier that logs events via tracing.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: Event) {
        use tracing::{info, warn};
        match &event {
            Event::ProtectionFailed(e) => {
                warn!(
                    symbol = %e.symbol,
                    side = %e.side,
                    kind = ?e.kind,
                    reason = %e.reason,
                    "Protective order failed"
                );
            }
            Event::PositionOpened(e) => {
                info!(
                    symbol = %e.symbol,
                    position_side = %e.position_side,
                    price = %e.price,
                    qty = %e.quantity,
                    "Position opened"
                );
            }
            Event::PositionClosed(e) => {
                info!(
                    symbol = %e.symbol,
                    position_side = %e.position_side,
                    price = %e.price,
                    realized = %e.realized_profit,
                    "Position closed"
                );
            }
            Event::PnlSummary(e) | Event::DailyReport(e) => {
                info!(
                    date = %e.date,
                    profit = %e.pnl.profit,
                    loss = %e.pnl.loss,
                    commission = %e.pnl.commission,
                    net = %e.pnl.net_profit,
                    "Realized PnL"
                );
            }
            Event::ListenKeyExpired => {
                warn!("Listen key expired");
            }
            Event::KeepaliveFailed { reason } => {
                warn!(reason = %reason, "Listen key keepalive failed");
            }
        }
    }
}
