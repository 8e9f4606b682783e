use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal_macros::dec;
use tokio::sync::watch;
use tradebridge::domain::{AccountEvent, OrderType, PositionSide};
use tradebridge::service::{Event, EventStreamListener, ListenerExit, NotifierRegistry, PnlAggregator};
use tradebridge::testkit::domain::{accepted, fill, trade};
use tradebridge::testkit::{ManualClock, MockExchange, RecordingNotifier, ScriptedEventStream};

fn utc(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

struct Fixture {
    exchange: Arc<MockExchange>,
    notifier: RecordingNotifier,
    listener: Arc<EventStreamListener>,
}

fn fixture() -> Fixture {
    let exchange = Arc::new(MockExchange::new());
    let notifier = RecordingNotifier::new();
    let mut registry = NotifierRegistry::new();
    registry.register(Box::new(notifier.clone()));

    let pnl = Arc::new(PnlAggregator::new(
        exchange.clone(),
        vec!["ETHUSDT".into()],
        chrono_tz::UTC,
    ));
    let listener = Arc::new(EventStreamListener::new(
        pnl,
        Arc::new(registry),
        Arc::new(ManualClock::default()),
    ));

    Fixture {
        exchange,
        notifier,
        listener,
    }
}

#[tokio::test]
async fn take_profit_fill_sends_close_and_pnl_summary() {
    let f = fixture();
    f.exchange.set_trades(vec![trade(
        "ETHUSDT",
        dec!(25),
        dec!(1),
        utc("2024-03-01T00:00:00Z"),
    )]);
    let mut stream = ScriptedEventStream::new(vec![fill(
        "ETHUSDT",
        OrderType::TakeProfitMarket,
        PositionSide::Long,
        dec!(25),
    )]);
    let (_tx, rx) = watch::channel(false);

    let exit = f.listener.run(&mut stream, rx).await;

    assert_eq!(exit, ListenerExit::StreamClosed);
    let events = f.notifier.events();
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], Event::PositionClosed(e) if e.realized_profit == dec!(25)));
    match &events[1] {
        Event::PnlSummary(summary) => assert_eq!(summary.pnl.net_profit, dec!(24)),
        other => panic!("expected PnL summary, got {other:?}"),
    }
}

#[tokio::test]
async fn other_fills_send_an_open_notification() {
    let f = fixture();
    let mut stream = ScriptedEventStream::new(vec![
        fill("ETHUSDT", OrderType::Market, PositionSide::Short, dec!(0)),
        fill("ETHUSDT", OrderType::StopMarket, PositionSide::Short, dec!(-10)),
    ]);
    let (_tx, rx) = watch::channel(false);

    f.listener.run(&mut stream, rx).await;

    let events = f.notifier.events();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| matches!(e, Event::PositionOpened(_))));
    assert!(f.exchange.calls().is_empty());
}

#[tokio::test]
async fn non_fill_updates_and_other_events_are_ignored() {
    let f = fixture();
    let mut stream = ScriptedEventStream::new(vec![
        accepted("ETHUSDT", OrderType::TakeProfitMarket, PositionSide::Long),
        AccountEvent::Other("ACCOUNT_UPDATE".into()),
    ]);
    let (_tx, rx) = watch::channel(false);

    f.listener.run(&mut stream, rx).await;

    assert!(f.notifier.is_empty());
}

#[tokio::test]
async fn listen_key_expiry_alerts_and_stops() {
    let f = fixture();
    let mut stream = ScriptedEventStream::new(vec![
        AccountEvent::ListenKeyExpired,
        fill("ETHUSDT", OrderType::Market, PositionSide::Long, dec!(0)),
    ]);
    let (_tx, rx) = watch::channel(false);

    let exit = f.listener.run(&mut stream, rx).await;

    assert_eq!(exit, ListenerExit::KeyExpired);
    assert_eq!(stream.remaining(), 1);
    let events = f.notifier.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], Event::ListenKeyExpired));
}

#[tokio::test]
async fn pnl_failure_after_close_still_sends_close() {
    let f = fixture();
    f.exchange.fail_on("account_trades");
    let mut stream = ScriptedEventStream::new(vec![fill(
        "ETHUSDT",
        OrderType::TakeProfitMarket,
        PositionSide::Long,
        dec!(25),
    )]);
    let (_tx, rx) = watch::channel(false);

    f.listener.run(&mut stream, rx).await;

    let events = f.notifier.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], Event::PositionClosed(_)));
}

#[tokio::test]
async fn spawned_listener_stops_on_shutdown() {
    let f = fixture();
    let stream = ScriptedEventStream::new(vec![]).hold_open();
    let (tx, rx) = watch::channel(false);

    let handle = Arc::clone(&f.listener).spawn(Box::new(stream), rx);
    tx.send(true).unwrap();

    assert_eq!(handle.await.unwrap(), ListenerExit::Shutdown);
}
