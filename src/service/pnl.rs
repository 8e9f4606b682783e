//! Realized profit/loss over an exchange-local calendar day.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::domain::{AccountTrade, RealizedPnl};
use crate::error::ExchangeError;
use crate::exchange::{FuturesExchange, TradeQuery, MAX_TRADE_PAGE};

/// Default inclusive upper bound of the daily window, `23:59:59.999`.
#[must_use]
pub fn default_day_end() -> NaiveTime {
    NaiveTime::MIN - Duration::milliseconds(1)
}

/// Aggregates account trades into a [`RealizedPnl`].
pub struct PnlAggregator {
    exchange: Arc<dyn FuturesExchange>,
    /// Symbols to query; empty means the whole account in one request.
    symbols: Vec<String>,
    timezone: Tz,
    day_end: NaiveTime,
    include_zero_pnl_commission: bool,
    page_limit: usize,
}

impl PnlAggregator {
    pub fn new(exchange: Arc<dyn FuturesExchange>, symbols: Vec<String>, timezone: Tz) -> Self {
        Self {
            exchange,
            symbols,
            timezone,
            day_end: default_day_end(),
            include_zero_pnl_commission: false,
            page_limit: MAX_TRADE_PAGE,
        }
    }

    #[must_use]
    pub fn with_day_end(mut self, day_end: NaiveTime) -> Self {
        self.day_end = day_end;
        self
    }

    #[must_use]
    pub fn with_zero_pnl_commission(mut self, include: bool) -> Self {
        self.include_zero_pnl_commission = include;
        self
    }

    /// Rows requested per trade-history page, at most [`MAX_TRADE_PAGE`].
    #[must_use]
    pub fn with_page_limit(mut self, limit: usize) -> Self {
        self.page_limit = limit.clamp(1, MAX_TRADE_PAGE);
        self
    }

    #[must_use]
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Exchange-local date of an instant.
    #[must_use]
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.timezone).date_naive()
    }

    /// `[00:00:00.000, day_end]` of `date` in exchange-local time, as UTC instants.
    #[must_use]
    pub fn day_window(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = local_to_utc(self.timezone, date.and_time(NaiveTime::MIN));
        let end = local_to_utc(self.timezone, date.and_time(self.day_end));
        (start, end)
    }

    /// Realized PnL for one exchange-local day.
    pub async fn daily_realized(&self, date: NaiveDate) -> Result<RealizedPnl, ExchangeError> {
        let (start, end) = self.day_window(date);

        let trades = if self.symbols.is_empty() {
            self.fetch_trades(None, start, end).await?
        } else {
            let mut trades = Vec::new();
            for symbol in &self.symbols {
                trades.extend(self.fetch_trades(Some(symbol), start, end).await?);
            }
            trades
        };

        let pnl = RealizedPnl::from_trades(&trades, self.include_zero_pnl_commission);
        debug!(
            date = %date,
            trades = trades.len(),
            net = %pnl.net_profit,
            "Aggregated realized PnL"
        );
        Ok(pnl)
    }

    /// Every fill in `start..=end`, following `from_id` until a short page
    /// or a page that ends past the window.
    async fn fetch_trades(
        &self,
        symbol: Option<&str>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AccountTrade>, ExchangeError> {
        let mut query = TradeQuery::new(symbol, start, end).with_limit(self.page_limit);
        let mut trades = Vec::new();
        loop {
            let page = self.exchange.account_trades(&query).await?;
            let full = page.len() >= query.limit;
            let last = page.last().map(|t| (t.id, t.time));
            trades.extend(page.into_iter().filter(|t| t.time >= start && t.time <= end));
            match last {
                Some((id, time)) if full && time <= end => {
                    debug!(symbol = ?symbol, from_id = id + 1, "Fetching next trade page");
                    query.from_id = Some(id + 1);
                }
                _ => break,
            }
        }
        Ok(trades)
    }
}

/// Resolve a local wall-clock time; the earlier instant wins when ambiguous.
///
/// A time skipped by a DST jump resolves to the first instant after the gap.
fn local_to_utc(tz: Tz, local: NaiveDateTime) -> DateTime<Utc> {
    if let Some(t) = tz.from_local_datetime(&local).earliest() {
        return t.with_timezone(&Utc);
    }
    // Transitions fall on whole minutes and no gap exceeds a day.
    let mut candidate = local
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(local);
    for _ in 0..24 * 60 {
        candidate += Duration::minutes(1);
        if let Some(t) = tz.from_local_datetime(&candidate).earliest() {
            return t.with_timezone(&Utc);
        }
    }
    tz.from_utc_datetime(&local).with_timezone(&Utc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AccountTrade;
    use crate::testkit::MockExchange;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_day_window_in_bangkok() {
        let exchange = Arc::new(MockExchange::new());
        let pnl = PnlAggregator::new(exchange, vec![], chrono_tz::Asia::Bangkok);

        let (start, end) = pnl.day_window(date());

        assert_eq!(start, utc("2024-02-29T17:00:00Z"));
        assert_eq!(end, utc("2024-03-01T16:59:59.999Z"));
    }

    #[test]
    fn test_day_end_is_configurable() {
        let exchange = Arc::new(MockExchange::new());
        let day_end = NaiveTime::from_hms_milli_opt(23, 59, 59, 59).unwrap();
        let pnl = PnlAggregator::new(exchange, vec![], chrono_tz::UTC).with_day_end(day_end);

        let (_, end) = pnl.day_window(date());

        assert_eq!(end, utc("2024-03-01T23:59:59.059Z"));
    }

    #[tokio::test]
    async fn test_daily_realized_filters_window_and_sums_symbols() {
        let exchange = Arc::new(MockExchange::new());
        let trade = |symbol: &str, pnl, time: &str| AccountTrade {
            id: 0,
            symbol: symbol.into(),
            realized_pnl: pnl,
            commission: dec!(1),
            time: utc(time),
        };
        exchange.set_trades(vec![
            trade("BTCUSDT", dec!(10), "2024-03-01T01:00:00Z"),
            trade("ETHUSDT", dec!(-4), "2024-03-01T02:00:00Z"),
            trade("BTCUSDT", dec!(6), "2024-03-01T03:00:00Z"),
            trade("BTCUSDT", dec!(0), "2024-03-01T04:00:00Z"),
            trade("BTCUSDT", dec!(100), "2024-03-02T04:00:00Z"),
        ]);
        let pnl = PnlAggregator::new(
            exchange,
            vec!["BTCUSDT".into(), "ETHUSDT".into()],
            chrono_tz::UTC,
        );

        let result = pnl.daily_realized(date()).await.unwrap();

        assert_eq!(result.profit, dec!(16));
        assert_eq!(result.loss, dec!(-4));
        assert_eq!(result.commission, dec!(3));
        assert_eq!(result.net_profit, dec!(17));
    }

    #[test]
    fn test_day_window_starts_after_a_midnight_dst_gap() {
        // Havana skips 00:00-01:00 on 2024-03-10 (CST -5 to CDT -4).
        let exchange = Arc::new(MockExchange::new());
        let pnl = PnlAggregator::new(exchange, vec![], chrono_tz::America::Havana);

        let (start, end) = pnl.day_window(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());

        assert_eq!(start, utc("2024-03-10T05:00:00Z"));
        assert_eq!(end, utc("2024-03-11T03:59:59.999Z"));
    }

    #[test]
    fn test_local_date() {
        let exchange = Arc::new(MockExchange::new());
        let pnl = PnlAggregator::new(exchange, vec![], chrono_tz::Asia::Bangkok);
        assert_eq!(pnl.local_date(utc("2024-02-29T18:00:00Z")), date());
    }
}
