//! Account event consumer.
//!
//! Fills become open/close notifications; a take-profit fill also triggers a
//! realized PnL summary for the day. Listen-key expiry is reported and ends
//! the listener; renewal is left to the keepalive task.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::{AccountEvent, OrderTradeUpdate};
use crate::exchange::AccountEventStream;

use super::clock::Clock;
use super::notifier::{Event, FillEvent, NotifierRegistry, PnlEvent};
use super::pnl::PnlAggregator;
use super::scheduler::wait_for_shutdown;

/// Why the listener stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerExit {
    KeyExpired,
    StreamClosed,
    Shutdown,
}

pub struct EventStreamListener {
    pnl: Arc<PnlAggregator>,
    notifiers: Arc<NotifierRegistry>,
    clock: Arc<dyn Clock>,
}

impl EventStreamListener {
    pub fn new(
        pnl: Arc<PnlAggregator>,
        notifiers: Arc<NotifierRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            pnl,
            notifiers,
            clock,
        }
    }

    /// Consume events until the key expires, the stream closes or shutdown is raised.
    pub async fn run<S>(&self, stream: &mut S, mut shutdown: watch::Receiver<bool>) -> ListenerExit
    where
        S: AccountEventStream + ?Sized,
    {
        loop {
            let event = tokio::select! {
                () = wait_for_shutdown(&mut shutdown) => return ListenerExit::Shutdown,
                event = stream.next_event() => event,
            };
            let Some(event) = event else {
                warn!("Account event stream closed");
                return ListenerExit::StreamClosed;
            };
            if let Some(exit) = self.handle(event).await {
                return exit;
            }
        }
    }

    /// Run on its own task, taking ownership of the stream.
    pub fn spawn(
        self: Arc<Self>,
        mut stream: Box<dyn AccountEventStream>,
        shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<ListenerExit> {
        tokio::spawn(async move {
            let exit = self.run(stream.as_mut(), shutdown).await;
            info!(exit = ?exit, "Account event listener stopped");
            exit
        })
    }

    /// Handle one event. Returns `Some` when the listener must stop.
    pub async fn handle(&self, event: AccountEvent) -> Option<ListenerExit> {
        match event {
            AccountEvent::OrderTradeUpdate(update) => {
                self.on_order_update(&update).await;
                None
            }
            AccountEvent::ListenKeyExpired => {
                warn!("Listen key expired, stopping listener");
                self.notifiers.notify_all(Event::ListenKeyExpired);
                Some(ListenerExit::KeyExpired)
            }
            AccountEvent::Other(kind) => {
                debug!(event = %kind, "Ignoring account event");
                None
            }
        }
    }

    async fn on_order_update(&self, update: &OrderTradeUpdate) {
        if !update.is_trade() {
            debug!(
                symbol = %update.symbol,
                execution_type = ?update.execution_type,
                "Ignoring non-fill order update"
            );
            return;
        }

        let fill = FillEvent::from(update);
        if !update.is_take_profit_fill() {
            self.notifiers.notify_all(Event::PositionOpened(fill));
            return;
        }

        self.notifiers.notify_all(Event::PositionClosed(fill));
        let date = self.pnl.local_date(self.clock.now());
        match self.pnl.daily_realized(date).await {
            Ok(pnl) => self
                .notifiers
                .notify_all(Event::PnlSummary(PnlEvent { date, pnl })),
            Err(e) => warn!(error = %e, "Failed to compute PnL after close"),
        }
    }
}
