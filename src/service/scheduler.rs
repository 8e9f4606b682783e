//! Background periodic tasks: the daily PnL report and listen-key keepalive.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::domain::RealizedPnl;
use crate::error::ExchangeError;
use crate::exchange::FuturesExchange;

use super::clock::Clock;
use super::notifier::{Event, NotifierRegistry, PnlEvent};
use super::pnl::PnlAggregator;

/// Default keepalive period for the user-data stream key.
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Next occurrence of `at` in `tz`, strictly after `after`.
#[must_use]
pub fn next_report_at(after: DateTime<Utc>, tz: Tz, at: NaiveTime) -> DateTime<Utc> {
    let local_after = after.with_timezone(&tz);
    let mut date = local_after.date_naive();
    loop {
        if let Some(target) = date.and_time(at).and_local_timezone(tz).earliest() {
            if target > local_after {
                return target.with_timezone(&Utc);
            }
        }
        date = match date.succ_opt() {
            Some(next) => next,
            None => return after,
        };
    }
}

/// Time until the next occurrence of `at` in `tz`, strictly after `now`.
#[must_use]
pub fn next_report_delay(now: DateTime<Utc>, tz: Tz, at: NaiveTime) -> Duration {
    (next_report_at(now, tz, at) - now)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Wait until the shutdown flag is raised or the sender is dropped.
pub(crate) async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// Drives the daily report and the keepalive on their own tasks.
pub struct SchedulerLoop {
    pnl: Arc<PnlAggregator>,
    exchange: Arc<dyn FuturesExchange>,
    notifiers: Arc<NotifierRegistry>,
    clock: Arc<dyn Clock>,
    report_at: NaiveTime,
    keepalive_interval: Duration,
}

impl SchedulerLoop {
    pub fn new(
        pnl: Arc<PnlAggregator>,
        exchange: Arc<dyn FuturesExchange>,
        notifiers: Arc<NotifierRegistry>,
        clock: Arc<dyn Clock>,
        report_at: NaiveTime,
    ) -> Self {
        Self {
            pnl,
            exchange,
            notifiers,
            clock,
            report_at,
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    /// Compute today's realized PnL and send it as the daily report.
    pub async fn report_daily(&self) -> Result<RealizedPnl, ExchangeError> {
        let date = self.pnl.local_date(self.clock.now());
        let pnl = self.pnl.daily_realized(date).await?;
        info!(date = %date, net = %pnl.net_profit, "Sending daily report");
        self.notifiers
            .notify_all(Event::DailyReport(PnlEvent { date, pnl }));
        Ok(pnl)
    }

    /// Renew the listen key. Failures are notified, never retried.
    pub async fn keepalive(&self) -> bool {
        match self.exchange.keepalive_user_stream().await {
            Ok(()) => {
                debug!("Listen key renewed");
                true
            }
            Err(e) => {
                warn!(error = %e, "Listen key keepalive failed");
                self.notifiers.notify_all(Event::KeepaliveFailed {
                    reason: e.to_string(),
                });
                false
            }
        }
    }

    /// Start both periodic tasks. They stop when `shutdown` is raised.
    pub fn spawn(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        vec![
            tokio::spawn(Arc::clone(&self).run_daily_report(shutdown.clone())),
            tokio::spawn(self.run_keepalive(shutdown)),
        ]
    }

    async fn run_daily_report(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let tz = self.pnl.timezone();
        let mut last_target: Option<DateTime<Utc>> = None;
        loop {
            let now = self.clock.now();
            // The wall clock can trail the sleep timer; a reported target never fires twice.
            let after = last_target.map_or(now, |last| last.max(now));
            let target = next_report_at(after, tz, self.report_at);
            let delay = (target - now).to_std().unwrap_or(Duration::ZERO);
            debug!(next = %target, delay_secs = delay.as_secs(), "Next daily report scheduled");
            tokio::select! {
                () = wait_for_shutdown(&mut shutdown) => break,
                () = tokio::time::sleep(delay) => {
                    last_target = Some(target);
                    if let Err(e) = self.report_daily().await {
                        error!(error = %e, "Daily report failed");
                    }
                }
            }
        }
        info!("Daily report task stopped");
    }

    async fn run_keepalive(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.keepalive_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // First tick completes immediately; the key was just created.
        interval.tick().await;
        loop {
            tokio::select! {
                () = wait_for_shutdown(&mut shutdown) => break,
                _ = interval.tick() => {
                    self.keepalive().await;
                }
            }
        }
        info!("Keepalive task stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_next_report_later_today() {
        // 10:00 Bangkok
        let delay = next_report_delay(
            utc("2024-03-01T03:00:00Z"),
            chrono_tz::Asia::Bangkok,
            at(23, 55),
        );
        assert_eq!(delay, Duration::from_secs((13 * 60 + 55) * 60));
    }

    #[test]
    fn test_next_report_rolls_to_tomorrow() {
        // 23:56 Bangkok
        let delay = next_report_delay(
            utc("2024-03-01T16:56:00Z"),
            chrono_tz::Asia::Bangkok,
            at(23, 55),
        );
        assert_eq!(delay, Duration::from_secs((23 * 60 + 59) * 60));
    }

    #[test]
    fn test_next_report_at_exact_time_is_tomorrow() {
        let delay = next_report_delay(utc("2024-03-01T23:55:00Z"), chrono_tz::UTC, at(23, 55));
        assert_eq!(delay, Duration::from_secs(24 * 60 * 60));
    }

    #[test]
    fn test_next_report_after_a_reported_target_is_a_day_later() {
        let reported = utc("2024-03-01T23:55:00Z");
        assert_eq!(
            next_report_at(reported, chrono_tz::UTC, at(23, 55)),
            utc("2024-03-02T23:55:00Z")
        );
    }

    #[tokio::test]
    async fn test_wait_for_shutdown_returns_when_sender_dropped() {
        let (tx, mut rx) = watch::channel(false);
        drop(tx);
        wait_for_shutdown(&mut rx).await;
    }
}
