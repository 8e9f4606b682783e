use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal_macros::dec;
use tradebridge::service::PnlAggregator;
use tradebridge::testkit::domain::trade;
use tradebridge::testkit::{Call, MockExchange};

fn utc(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn march_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

fn mixed_day(exchange: &MockExchange) {
    exchange.set_trades(vec![
        trade("BTCUSDT", dec!(10), dec!(1), utc("2024-03-01T01:00:00Z")),
        trade("BTCUSDT", dec!(-4), dec!(1), utc("2024-03-01T02:00:00Z")),
        trade("BTCUSDT", dec!(6), dec!(1), utc("2024-03-01T03:00:00Z")),
        trade("BTCUSDT", dec!(0), dec!(1), utc("2024-03-01T04:00:00Z")),
    ]);
}

#[tokio::test]
async fn zero_pnl_commission_is_excluded_by_default() {
    let exchange = Arc::new(MockExchange::new());
    mixed_day(&exchange);
    let pnl = PnlAggregator::new(exchange, vec!["BTCUSDT".into()], chrono_tz::UTC);

    let result = pnl.daily_realized(march_first()).await.unwrap();

    assert_eq!(result.profit, dec!(16));
    assert_eq!(result.loss, dec!(-4));
    assert_eq!(result.commission, dec!(3));
    assert_eq!(result.net_profit, (result.profit - result.loss) - result.commission);
    assert_eq!(result.trades, 3);
}

#[tokio::test]
async fn zero_pnl_commission_can_be_included() {
    let exchange = Arc::new(MockExchange::new());
    mixed_day(&exchange);
    let pnl = PnlAggregator::new(exchange, vec!["BTCUSDT".into()], chrono_tz::UTC)
        .with_zero_pnl_commission(true);

    let result = pnl.daily_realized(march_first()).await.unwrap();

    assert_eq!(result.commission, dec!(4));
    assert_eq!(result.net_profit, dec!(16));
}

#[tokio::test]
async fn bangkok_day_boundaries_are_inclusive() {
    let exchange = Arc::new(MockExchange::new());
    exchange.set_trades(vec![
        // 23:59:59 on Feb 29 local
        trade("ETHUSDT", dec!(100), dec!(0), utc("2024-02-29T16:59:59Z")),
        // 00:00:00.000 local
        trade("ETHUSDT", dec!(1), dec!(0), utc("2024-02-29T17:00:00Z")),
        // 23:59:59.999 local
        trade("ETHUSDT", dec!(2), dec!(0), utc("2024-03-01T16:59:59.999Z")),
        // 00:00:00.000 on Mar 2 local
        trade("ETHUSDT", dec!(200), dec!(0), utc("2024-03-01T17:00:00Z")),
    ]);
    let pnl = PnlAggregator::new(exchange, vec!["ETHUSDT".into()], chrono_tz::Asia::Bangkok);

    let result = pnl.daily_realized(march_first()).await.unwrap();

    assert_eq!(result.profit, dec!(3));
}

#[tokio::test]
async fn each_symbol_is_queried_separately() {
    let exchange = Arc::new(MockExchange::new());
    exchange.set_trades(vec![
        trade("BTCUSDT", dec!(5), dec!(1), utc("2024-03-01T01:00:00Z")),
        trade("ETHUSDT", dec!(-2), dec!(1), utc("2024-03-01T01:00:00Z")),
        trade("SOLUSDT", dec!(50), dec!(1), utc("2024-03-01T01:00:00Z")),
    ]);
    let pnl = PnlAggregator::new(
        exchange.clone(),
        vec!["BTCUSDT".into(), "ETHUSDT".into()],
        chrono_tz::UTC,
    );

    let result = pnl.daily_realized(march_first()).await.unwrap();

    assert_eq!(result.profit, dec!(5));
    assert_eq!(result.loss, dec!(-2));
    assert_eq!(
        exchange.calls(),
        vec![
            Call::AccountTrades(Some("BTCUSDT".into())),
            Call::AccountTrades(Some("ETHUSDT".into())),
        ]
    );
}

#[tokio::test]
async fn no_symbols_queries_the_whole_account_once() {
    let exchange = Arc::new(MockExchange::new());
    mixed_day(&exchange);
    let pnl = PnlAggregator::new(exchange.clone(), vec![], chrono_tz::UTC);

    let result = pnl.daily_realized(march_first()).await.unwrap();

    assert_eq!(result.profit, dec!(16));
    assert_eq!(exchange.calls(), vec![Call::AccountTrades(None)]);
}

#[tokio::test]
async fn busy_day_is_read_across_trade_pages() {
    let exchange = Arc::new(MockExchange::new());
    exchange.set_trades(vec![
        trade("BTCUSDT", dec!(1), dec!(0.1), utc("2024-03-01T01:00:00Z")),
        trade("BTCUSDT", dec!(2), dec!(0.1), utc("2024-03-01T02:00:00Z")),
        trade("BTCUSDT", dec!(3), dec!(0.1), utc("2024-03-01T03:00:00Z")),
        trade("BTCUSDT", dec!(4), dec!(0.1), utc("2024-03-01T04:00:00Z")),
        trade("BTCUSDT", dec!(-5), dec!(0.1), utc("2024-03-01T05:00:00Z")),
        // next day, returned on the last page and dropped
        trade("BTCUSDT", dec!(100), dec!(0.1), utc("2024-03-02T01:00:00Z")),
    ]);
    let pnl = PnlAggregator::new(exchange.clone(), vec!["BTCUSDT".into()], chrono_tz::UTC)
        .with_page_limit(2);

    let result = pnl.daily_realized(march_first()).await.unwrap();

    assert_eq!(result.trades, 5);
    assert_eq!(result.profit, dec!(10));
    assert_eq!(result.loss, dec!(-5));
    assert_eq!(result.commission, dec!(0.5));
    assert_eq!(exchange.calls().len(), 3);
}

#[tokio::test]
async fn short_first_page_is_not_followed() {
    let exchange = Arc::new(MockExchange::new());
    mixed_day(&exchange);
    let pnl = PnlAggregator::new(exchange.clone(), vec!["BTCUSDT".into()], chrono_tz::UTC)
        .with_page_limit(10);

    pnl.daily_realized(march_first()).await.unwrap();

    assert_eq!(exchange.calls().len(), 1);
}

#[tokio::test]
async fn trade_fetch_failure_is_returned() {
    let exchange = Arc::new(MockExchange::new());
    exchange.fail_on("account_trades");
    let pnl = PnlAggregator::new(exchange, vec!["BTCUSDT".into()], chrono_tz::UTC);

    assert!(pnl.daily_realized(march_first()).await.is_err());
}

#[test]
fn summary_renders_every_figure() {
    let result = tradebridge::domain::RealizedPnl::from_trades(
        &[trade("BTCUSDT", dec!(10), dec!(1), utc("2024-03-01T01:00:00Z"))],
        false,
    );
    let text = result.to_string();

    assert!(text.contains("Profit: 10.0000 USDT"));
    assert!(text.contains("Commission: 1.0000 USDT"));
    assert!(text.contains("Net Profit: 9.0000 USDT"));
}
