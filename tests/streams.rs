mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use btce_watch::exchanges::PublicResource;
use btce_watch::{ClientOptions, Currency, Pair, PriceTrigger, StreamKind, StreamStatus};
use common::{account_json, advance, client, fee_json, orders_json, ticker_json, ScriptedRest};

fn recorder<T: Send + 'static>() -> (Arc<Mutex<Vec<T>>>, Arc<Mutex<Vec<T>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    (seen.clone(), seen)
}

#[tokio::test(start_paused = true)]
async fn test_always_policy_notifies_on_identical_ticks() {
    let rest = ScriptedRest::new();
    rest.script_public(PublicResource::Ticker, Pair::BtcUsd, vec![ticker_json("100", "105")]);
    let client = client(&rest, ClientOptions::default());
    let (seen, sink) = recorder();
    let _sub = client.on_price_changed(move |tick, change| {
        sink.lock().unwrap().push((tick.buy, change.first_time));
    });

    advance(2_500).await;
    assert_eq!(
        *seen.lock().unwrap(),
        vec![(dec!(100), true), (dec!(100), false), (dec!(100), false)]
    );
    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_buy_policy_ignores_unchanged_buy() {
    let rest = ScriptedRest::new();
    rest.script_public(
        PublicResource::Ticker,
        Pair::BtcUsd,
        vec![
            ticker_json("100", "105"),
            ticker_json("100", "105"),
            ticker_json("100", "107"),
            ticker_json("101", "107"),
        ],
    );
    let options = ClientOptions {
        price_trigger: PriceTrigger::BUY,
        ..ClientOptions::default()
    };
    let client = client(&rest, options);
    assert_eq!(client.price_trigger(), PriceTrigger::BUY);
    let (seen, sink) = recorder();
    let _sub = client.on_price_changed(move |tick, change| {
        sink.lock().unwrap().push((tick.buy, change.first_time, change.movement.buy_up));
    });

    advance(3_500).await;
    assert_eq!(
        *seen.lock().unwrap(),
        vec![(dec!(100), true, false), (dec!(101), false, true)]
    );
    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_account_balance_change_names_currency() {
    let rest = ScriptedRest::new();
    rest.script_private(
        "getInfo",
        vec![
            account_json(&[("btc", "1.0"), ("usd", "50")], 0),
            account_json(&[("btc", "1.0"), ("usd", "50")], 0),
            account_json(&[("btc", "1.0"), ("usd", "75")], 0),
        ],
    );
    rest.script_private("ActiveOrders", vec![orders_json(&[])]);
    let client = client(&rest, ClientOptions::default());
    let (seen, sink) = recorder();
    let _sub = client.on_account_changed(move |_, change| {
        sink.lock().unwrap().push(change.clone());
    });

    client.set_credentials("KEY", "secret").await.unwrap();
    advance(14_000).await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert!(seen[0].first_time);
    assert!(!seen[1].first_time);
    assert_eq!(seen[1].changed_currencies, vec![Currency::Usd]);
    assert!(!seen[1].rights_changed);
    assert!(!seen[1].open_orders_changed);
    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_first_order_count_is_not_compared() {
    let rest = ScriptedRest::new();
    rest.script_private("getInfo", vec![account_json(&[("usd", "10")], 3)]);
    rest.script_private(
        "ActiveOrders",
        vec![
            orders_json(&["1", "1", "1"]),
            orders_json(&["1", "1", "1"]),
            orders_json(&["1", "1", "1", "0.5", "0.5"]),
        ],
    );
    let client = client(&rest, ClientOptions::default());
    let (seen, sink) = recorder();
    let _sub = client.on_orders_changed(move |orders, change| {
        sink.lock().unwrap().push((orders.count(), *change));
    });

    client.set_credentials("KEY", "secret").await.unwrap();
    advance(13_000).await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    let (count, first) = seen[0];
    assert_eq!(count, 3);
    assert!(first.first_time);
    assert!(!first.count_changed);
    assert_eq!(first.previous_count, None);

    let (count, second) = seen[1];
    assert_eq!(count, 5);
    assert!(second.count_changed);
    assert!(second.amount_changed);
    assert_eq!(second.previous_count, Some(3));
    assert_eq!(second.previous_amount, Some(dec!(3)));
    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_unsubscribed_stream_never_fetches() {
    let rest = ScriptedRest::new();
    rest.script_public(PublicResource::Ticker, Pair::BtcUsd, vec![ticker_json("1", "2")]);
    let client = client(&rest, ClientOptions::default());

    advance(5_000).await;
    assert!(rest.public_calls(PublicResource::Ticker).is_empty());
    assert_eq!(client.ticker().status(), StreamStatus::Disabled);

    let sub = client.on_price_changed(|_, _| {});
    advance(1_500).await;
    assert_eq!(rest.public_calls(PublicResource::Ticker).len(), 2);

    drop(sub);
    advance(5_000).await;
    assert_eq!(rest.public_calls(PublicResource::Ticker).len(), 2);
    assert!(rest.public_calls(PublicResource::Fee).is_empty());
    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_slow_venue_does_not_overlap_polls() {
    let rest = ScriptedRest::new();
    rest.script_public(PublicResource::Ticker, Pair::BtcUsd, vec![ticker_json("1", "2")]);
    rest.set_latency(Duration::from_millis(2_500));
    let client = client(&rest, ClientOptions::default());
    let _sub = client.on_price_changed(|_, _| {});

    advance(10_000).await;
    assert!(!rest.overlapped());
    // 2.5s fetch + 1s period per cycle
    assert_eq!(rest.public_calls(PublicResource::Ticker).len(), 3);
    client.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_slow_subscriber_delays_only_its_own_stream() {
    let rest = ScriptedRest::new();
    rest.script_public(PublicResource::Ticker, Pair::BtcUsd, vec![ticker_json("1", "2")]);
    rest.script_public(PublicResource::Fee, Pair::BtcUsd, vec![fee_json("0.2")]);
    let options = ClientOptions {
        ticker_period: Duration::from_millis(200),
        fee_period: Duration::from_millis(100),
        ..ClientOptions::default()
    };
    let client = client(&rest, options);

    let blocked = Arc::new(AtomicBool::new(false));
    let released: Arc<Mutex<Option<tokio::time::Instant>>> = Arc::new(Mutex::new(None));
    let _ticker = {
        let blocked = blocked.clone();
        let released = released.clone();
        client.on_price_changed(move |_, _| {
            if !blocked.swap(true, Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(800));
                *released.lock().unwrap() = Some(tokio::time::Instant::now());
            }
        })
    };
    let _fee = client.on_fee_changed(|_, _| {});

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    client.shutdown().await;

    let ticks = rest.public_call_times(PublicResource::Ticker);
    let released = released.lock().unwrap().unwrap();
    assert!(ticks.len() >= 2);
    // next ticker fetch waits for the callback, then one full period
    assert!(ticks[1] >= released + Duration::from_millis(200));

    let fees_while_blocked = rest
        .public_call_times(PublicResource::Fee)
        .into_iter()
        .filter(|at| *at > ticks[0] && *at < released)
        .count();
    assert!(fees_while_blocked >= 3, "fee fetched {fees_while_blocked} times while ticker was blocked");
}

#[tokio::test(start_paused = true)]
async fn test_set_pair_resets_public_streams() {
    let rest = ScriptedRest::new();
    rest.script_public(PublicResource::Ticker, Pair::BtcUsd, vec![ticker_json("100", "105")]);
    rest.script_public(PublicResource::Ticker, Pair::LtcUsd, vec![ticker_json("3", "4")]);
    rest.script_public(PublicResource::Fee, Pair::BtcUsd, vec![fee_json("0.2")]);
    rest.script_public(PublicResource::Fee, Pair::LtcUsd, vec![fee_json("0.5")]);
    let client = client(&rest, ClientOptions::default());
    let (ticks, tick_sink) = recorder();
    let _ticker = client.on_price_changed(move |tick, change| {
        tick_sink.lock().unwrap().push((tick.pair, change.first_time));
    });
    let (fees, fee_sink) = recorder();
    let _fee = client.on_fee_changed(move |fee, change| {
        fee_sink.lock().unwrap().push((fee.trade, change.previous));
    });

    advance(500).await;
    client.set_pair(Pair::LtcUsd);
    assert_eq!(client.pair(), Pair::LtcUsd);
    advance(100).await;

    assert_eq!(
        *ticks.lock().unwrap(),
        vec![(Pair::BtcUsd, true), (Pair::LtcUsd, true)]
    );
    assert_eq!(
        *fees.lock().unwrap(),
        vec![(dec!(0.2), None), (dec!(0.5), None)]
    );
    assert_eq!(client.current_fee().trade, dec!(0.5));
    assert_eq!(client.ticker().latest().unwrap().pair, Pair::LtcUsd);
    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_default_fee_until_first_poll() {
    let rest = ScriptedRest::new();
    rest.script_public(PublicResource::Fee, Pair::BtcUsd, vec![fee_json("0.25")]);
    let client = client(&rest, ClientOptions::default());
    assert_eq!(client.current_fee().trade, dec!(0.2));

    let _fee = client.on_fee_changed(|_, _| {});
    advance(100).await;
    assert_eq!(client.current_fee().trade, dec!(0.25));
    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_set_period_retunes_running_stream() {
    let rest = ScriptedRest::new();
    rest.script_public(PublicResource::Ticker, Pair::BtcUsd, vec![ticker_json("1", "2")]);
    let options = ClientOptions {
        ticker_period: Duration::from_secs(60),
        ..ClientOptions::default()
    };
    let client = client(&rest, options);
    let _sub = client.on_price_changed(|_, _| {});

    advance(100).await;
    assert_eq!(rest.public_calls(PublicResource::Ticker).len(), 1);

    client.set_period(StreamKind::Ticker, Duration::from_secs(1));
    advance(2_500).await;
    assert_eq!(rest.public_calls(PublicResource::Ticker).len(), 3);
    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_transport_errors_are_retried() {
    let rest = ScriptedRest::new();
    rest.script_public(
        PublicResource::Ticker,
        Pair::BtcUsd,
        vec![common::remote_error("invalid pair"), Ok("not json".to_string()), ticker_json("7", "8")],
    );
    let client = client(&rest, ClientOptions::default());
    let (seen, sink) = recorder();
    let _sub = client.on_price_changed(move |tick, _| sink.lock().unwrap().push(tick.buy));

    advance(2_500).await;
    assert_eq!(*seen.lock().unwrap(), vec![Decimal::from(7)]);
    assert_eq!(client.ticker().completed_cycles(), 3);
    assert_ne!(client.ticker().status(), StreamStatus::Paused);

    client.shutdown().await;
    assert_eq!(client.ticker().status(), StreamStatus::Stopped);
}
