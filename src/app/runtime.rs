//! Process runtime.
//!
//! Wires the Binance adapter, the services and the webhook together, owns the
//! background task handles and stops them when the shutdown flag is raised.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::adapter::binance::{BinanceFutures, BinanceUserStream};
use crate::adapter::webhook;
use crate::app::config::Config;
use crate::error::Result;
use crate::exchange::FuturesExchange;
use crate::service::{
    wait_for_shutdown, Clock, DebounceGate, EventStreamListener, LineConfig, LineNotifier,
    ListenerExit, LogNotifier, NotifierRegistry, OrderOrchestrator, PnlAggregator,
    SchedulerLoop, SystemClock,
};

/// Handles of the long-running background tasks.
///
/// Dropping this without calling [`BackgroundTasks::shutdown`] leaves the
/// tasks running until the runtime exits.
pub struct BackgroundTasks {
    shutdown: watch::Sender<bool>,
    periodic: Vec<JoinHandle<()>>,
    listener: Option<JoinHandle<ListenerExit>>,
}

impl BackgroundTasks {
    #[must_use]
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            shutdown,
            periodic: Vec::new(),
            listener: None,
        }
    }

    /// A receiver that observes this set's shutdown flag.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    pub fn push(&mut self, handle: JoinHandle<()>) {
        self.periodic.push(handle);
    }

    pub fn extend(&mut self, handles: impl IntoIterator<Item = JoinHandle<()>>) {
        self.periodic.extend(handles);
    }

    pub fn set_listener(&mut self, handle: JoinHandle<ListenerExit>) {
        self.listener = Some(handle);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.periodic.len() + usize::from(self.listener.is_some())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raise the shutdown flag and wait for every task to finish.
    ///
    /// Returns how the listener ended, if one was running.
    pub async fn shutdown(self) -> Option<ListenerExit> {
        self.shutdown.send_replace(true);

        for handle in self.periodic {
            if let Err(e) = handle.await {
                warn!(error = %e, "Background task ended abnormally");
            }
        }

        match self.listener {
            Some(handle) => match handle.await {
                Ok(exit) => Some(exit),
                Err(e) => {
                    warn!(error = %e, "Account event listener ended abnormally");
                    None
                }
            },
            None => None,
        }
    }
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new()
    }
}

/// Main application struct.
pub struct App;

impl App {
    /// Run until `shutdown` is raised or the webhook server fails.
    pub async fn run(config: Config, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let credentials = config.require_credentials()?;
        let exchange: Arc<dyn FuturesExchange> = Arc::new(BinanceFutures::new(
            config.exchange.rest_url.clone(),
            credentials,
            config.exchange.recv_window_ms,
            Duration::from_secs(config.exchange.timeout_secs),
        )?);
        info!(exchange = exchange.exchange_name(), url = %config.exchange.rest_url, "Exchange client ready");

        let notifiers = Arc::new(build_notifier_registry(&config));
        info!(notifiers = notifiers.len(), "Notifiers initialized");

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let debounce = Arc::new(DebounceGate::with_window_secs(config.trading.debounce_secs));
        let orchestrator = Arc::new(OrderOrchestrator::new(
            config.trading.clone(),
            Arc::clone(&exchange),
            debounce,
            Arc::clone(&clock),
            Arc::clone(&notifiers),
        ));

        let pnl = Arc::new(
            PnlAggregator::new(
                Arc::clone(&exchange),
                config.pnl_symbols(),
                config.schedule.timezone()?,
            )
            .with_day_end(config.pnl.day_end()?)
            .with_zero_pnl_commission(config.pnl.include_zero_pnl_commission),
        );

        let mut tasks = BackgroundTasks::new();

        let scheduler = Arc::new(
            SchedulerLoop::new(
                Arc::clone(&pnl),
                Arc::clone(&exchange),
                Arc::clone(&notifiers),
                Arc::clone(&clock),
                config.schedule.report_time()?,
            )
            .with_keepalive_interval(Duration::from_secs(config.schedule.keepalive_interval_secs)),
        );
        let scheduler_shutdown = tasks.subscribe();
        tasks.extend(scheduler.spawn(scheduler_shutdown));

        let listener = Arc::new(EventStreamListener::new(pnl, Arc::clone(&notifiers), clock));
        match open_user_stream(exchange.as_ref(), &config.exchange.ws_url).await {
            Some(stream) => {
                let listener_shutdown = tasks.subscribe();
                tasks.set_listener(listener.spawn(Box::new(stream), listener_shutdown));
            }
            None => warn!("Running without account event notifications"),
        }
        info!(tasks = tasks.len(), "Background tasks started");

        let router = webhook::build_router(orchestrator);
        let addr = config.server.addr();
        let tcp = tokio::net::TcpListener::bind(&addr).await?;
        info!(addr = %addr, "Webhook listening");

        let served = axum::serve(tcp, router)
            .with_graceful_shutdown(async move { wait_for_shutdown(&mut shutdown).await })
            .await;

        info!("Stopping background tasks");
        if let Some(exit) = tasks.shutdown().await {
            info!(exit = ?exit, "Account event listener joined");
        }

        served?;
        Ok(())
    }
}

/// Start a user-data stream session. Failures are logged; the webhook still runs.
async fn open_user_stream(
    exchange: &dyn FuturesExchange,
    ws_url: &str,
) -> Option<BinanceUserStream> {
    let listen_key = match exchange.start_user_stream().await {
        Ok(key) => key,
        Err(e) => {
            error!(error = %e, "Failed to start user data stream");
            return None;
        }
    };

    match BinanceUserStream::connect(ws_url, &listen_key).await {
        Ok(stream) => Some(stream),
        Err(e) => {
            error!(error = %e, "Failed to connect user data stream");
            None
        }
    }
}

fn build_notifier_registry(config: &Config) -> NotifierRegistry {
    let mut registry = NotifierRegistry::new();

    // Always add log notifier
    registry.register(Box::new(LogNotifier));

    if config.notify.line_enabled {
        if let Some(line_config) = LineConfig::from_env(config.notify.line_url.clone()) {
            registry.register(Box::new(LineNotifier::new(
                line_config,
                reqwest::Client::new(),
            )));
            info!("LINE notifier enabled");
        } else {
            warn!("LINE enabled but LINE_NOTIFY_TOKEN not set");
        }
    }

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_joins_periodic_tasks() {
        let mut tasks = BackgroundTasks::new();
        let mut rx = tasks.subscribe();
        tasks.push(tokio::spawn(async move {
            wait_for_shutdown(&mut rx).await;
        }));
        assert_eq!(tasks.len(), 1);

        assert!(tasks.shutdown().await.is_none());
    }

    #[tokio::test]
    async fn test_empty_task_set() {
        let tasks = BackgroundTasks::default();
        assert!(tasks.is_empty());
        assert!(tasks.shutdown().await.is_none());
    }

    #[test]
    fn test_registry_always_has_log_notifier() {
        let mut config = Config::default();
        config.notify.line_enabled = false;
        assert_eq!(build_notifier_registry(&config).len(), 1);
    }
}
