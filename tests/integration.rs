//! Integration tests for the exchange.

use parking_lot::Mutex;
use quotecast::{
    Decimal, Decision, DeliveryError, Exchange, MobilePushNotifier, NotificationEvent,
    SubscribeOutcome, Subscriber, Topic, TraderNotifier, TradingRobot,
};
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn dec(value: i64) -> Decimal {
    Decimal::from(value)
}

fn topic(s: &str) -> Topic {
    Topic::parse(s).unwrap()
}

/// Keeps every event it is handed.
struct Inbox {
    name: &'static str,
    events: Mutex<Vec<NotificationEvent>>,
}

impl Inbox {
    fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            events: Mutex::new(Vec::new()),
        })
    }

    fn prices(&self) -> Vec<Decimal> {
        self.events.lock().iter().map(|e| e.price).collect()
    }
}

impl Subscriber for Inbox {
    fn name(&self) -> &str {
        self.name
    }

    fn on_price_changed(&self, event: &NotificationEvent) -> Result<(), DeliveryError> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

fn count_for(exchange: &Exchange, symbol: &str, subscriber: &str) -> u64 {
    exchange
        .subscriptions_report()
        .into_iter()
        .find(|r| r.topic.as_str() == symbol && r.subscriber == subscriber)
        .map(|r| r.delivery_count)
        .unwrap()
}

fn messages(exchange: &Exchange) -> Vec<String> {
    exchange
        .event_log_snapshot()
        .into_iter()
        .map(|e| e.message)
        .collect()
}

// --- Realistic Workflow Tests ---

#[test]
fn test_tsla_filter_end_to_end() {
    init_tracing();
    let exchange = Exchange::new();
    let a = Inbox::new("A");
    let b = Inbox::new("B");

    exchange.subscribe("TSLA", &a, None).unwrap();
    exchange.subscribe("TSLA", &b, Some(dec(200))).unwrap();

    let first = exchange.update_price("TSLA", dec(190), "news").unwrap();
    assert_eq!(first.delivered, vec!["A"]);
    assert_eq!(first.skipped, vec!["B"]);

    let second = exchange.update_price("TSLA", dec(205), "rally").unwrap();
    assert_eq!(second.delivered, vec!["A", "B"]);

    assert_eq!(count_for(&exchange, "TSLA", "A"), 2);
    assert_eq!(count_for(&exchange, "TSLA", "B"), 1);
    assert_eq!(a.prices(), vec![dec(190), dec(205)]);
    assert_eq!(b.prices(), vec![dec(205)]);
}

#[test]
fn test_stock_exchange_session() {
    init_tracing();
    let exchange = Exchange::new();

    let trader = Arc::new(TraderNotifier::new("Amir"));
    let phone = Arc::new(MobilePushNotifier::new("Alikhan"));
    let robot = Arc::new(
        TradingRobot::new("RBT-01")
            .with_buy_level(topic("AAPL"), dec(170))
            .with_buy_level(topic("TSLA"), dec(210))
            .with_sell_level(topic("AAPL"), dec(210))
            .with_sell_level(topic("TSLA"), dec(280)),
    );

    exchange.subscribe("AAPL", &trader, None).unwrap();
    exchange.subscribe("TSLA", &trader, Some(dec(200))).unwrap();
    exchange.subscribe("AAPL", &phone, Some(dec(180))).unwrap();
    exchange.subscribe("TSLA", &robot, None).unwrap();
    exchange.subscribe("AAPL", &robot, None).unwrap();

    exchange.update_price("AAPL", dec(175), "regular session").unwrap();
    exchange.update_price("TSLA", dec(205), "positive company news").unwrap();
    exchange.update_price("AAPL", dec(215), "quarterly report").unwrap();

    assert!(exchange.unsubscribe("AAPL", &phone));

    exchange.update_price("AAPL", dec(168), "market correction").unwrap();
    exchange.update_price("TSLA", dec(290), "EV demand").unwrap();

    let report: Vec<_> = exchange
        .subscriptions_report()
        .into_iter()
        .map(|r| r.to_string())
        .collect();
    assert_eq!(
        report,
        vec![
            "AAPL | Amir | no filter | notifications: 3",
            "AAPL | RBT-01 | no filter | notifications: 3",
            "TSLA | Amir | filter >= 200 | notifications: 2",
            "TSLA | RBT-01 | no filter | notifications: 2",
        ]
    );

    // The phone only heard the 215 update before unsubscribing.
    assert_eq!(phone.sent(), vec!["Push: AAPL = 215"]);

    let decisions: Vec<_> = robot
        .decisions()
        .into_iter()
        .map(|(t, p, d)| (t.to_string(), p, d))
        .collect();
    assert_eq!(
        decisions,
        vec![
            ("AAPL".to_string(), dec(175), Decision::Hold),
            ("TSLA".to_string(), dec(205), Decision::Buy),
            ("AAPL".to_string(), dec(215), Decision::Sell),
            ("AAPL".to_string(), dec(168), Decision::Buy),
            ("TSLA".to_string(), dec(290), Decision::Sell),
        ]
    );

    let aapl = exchange.price("aapl").unwrap();
    assert_eq!(aapl.price, dec(168));
    assert_eq!(aapl.previous, Some(dec(215)));
    assert_eq!(aapl.updates, 3);
}

#[test]
fn test_duplicate_subscription_keeps_count() {
    let exchange = Exchange::new();
    let a = Inbox::new("A");

    exchange.subscribe("AAPL", &a, None).unwrap();
    exchange.update_price("AAPL", dec(100), "first").unwrap();

    let outcome = exchange.subscribe(" aapl ", &a, Some(dec(500))).unwrap();
    assert_eq!(outcome, SubscribeOutcome::AlreadySubscribed);

    let report = exchange.subscriptions_report();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].delivery_count, 1);
    assert_eq!(report[0].min_notify_price, None);

    // The original unfiltered subscription is still the one in effect.
    exchange.update_price("AAPL", dec(101), "second").unwrap();
    assert_eq!(count_for(&exchange, "AAPL", "A"), 2);

    assert!(messages(&exchange).contains(&"duplicate subscription skipped: A -> AAPL".to_string()));
}

#[test]
fn test_unsubscribe_stops_delivery() {
    let exchange = Exchange::new();
    let a = Inbox::new("A");
    let b = Inbox::new("B");
    exchange.subscribe("AAPL", &a, None).unwrap();
    exchange.subscribe("AAPL", &b, None).unwrap();

    exchange.update_price("AAPL", dec(10), "before").unwrap();
    assert!(exchange.unsubscribe("AAPL", &a));
    let log_mark = exchange.event_log().last_sequence();

    let report = exchange.update_price("AAPL", dec(11), "after").unwrap();

    assert_eq!(report.delivered, vec!["B"]);
    assert_eq!(a.prices(), vec![dec(10)]);
    assert_eq!(b.prices(), vec![dec(10), dec(11)]);

    let later: Vec<_> = exchange
        .event_log()
        .entries_since(log_mark)
        .into_iter()
        .map(|e| e.message)
        .collect();
    assert!(later.iter().all(|m| !m.contains("notified A")));
    assert_eq!(
        later,
        vec!["price updated: AAPL = 11 | reason: after", "notified B for AAPL"]
    );
}

#[test]
fn test_every_subscriber_sees_same_event() {
    let exchange = Exchange::new();
    let inboxes: Vec<_> = ["a", "b", "c", "d"].iter().map(|n| Inbox::new(*n)).collect();
    for inbox in &inboxes {
        exchange.subscribe("MSFT", inbox, None).unwrap();
    }

    exchange.update_price("MSFT", dec(420), "earnings").unwrap();

    let first = inboxes[0].events.lock()[0].clone();
    assert_eq!(first.topic.as_str(), "MSFT");
    assert_eq!(first.reason, "earnings");
    for inbox in &inboxes[1..] {
        assert_eq!(inbox.events.lock()[0], first);
    }
}

#[test]
fn test_previous_price_carried_in_event() {
    let exchange = Exchange::new();
    let a = Inbox::new("A");
    exchange.subscribe("AAPL", &a, None).unwrap();

    exchange.update_price("AAPL", dec(175), "r1").unwrap();
    exchange.update_price("AAPL", dec(168), "r2").unwrap();

    let events = a.events.lock();
    assert_eq!(events[0].previous_price, None);
    assert_eq!(events[1].previous_price, Some(dec(175)));
    assert!(events[1].timestamp >= events[0].timestamp);
}

#[test]
fn test_update_without_subscribers() {
    let exchange = Exchange::new();

    let report = exchange.update_price("NVDA", dec(900), "quiet").unwrap();

    assert_eq!(report.notified(), 0);
    assert!(report.is_complete());
    assert_eq!(
        messages(&exchange),
        vec![
            "price updated: NVDA = 900 | reason: quiet",
            "no subscribers to notify for NVDA",
        ]
    );
}

#[test]
fn test_update_with_every_subscriber_filtered_out() {
    let exchange = Exchange::new();
    let b = Inbox::new("B");
    exchange.subscribe("TSLA", &b, Some(dec(200))).unwrap();

    let report = exchange.update_price("TSLA", dec(190), "dip").unwrap();

    assert!(report.delivered.is_empty());
    assert!(report.failed.is_empty());
    assert_eq!(report.skipped, vec!["B"]);
    assert!(b.prices().is_empty());
    assert_eq!(count_for(&exchange, "TSLA", "B"), 0);
    assert_eq!(
        messages(&exchange).last().unwrap(),
        "no subscribers to notify for TSLA"
    );
}

#[test]
fn test_type_erased_subscribers() {
    let exchange = Exchange::new();
    let subscribers: Vec<Arc<dyn Subscriber>> = vec![
        Arc::new(TraderNotifier::new("Amir")),
        Arc::new(MobilePushNotifier::new("Alikhan")),
    ];
    for subscriber in &subscribers {
        exchange.subscribe("AAPL", subscriber, None).unwrap();
    }

    // Identity survives type erasure.
    assert_eq!(
        exchange.subscribe("AAPL", &subscribers[0], None).unwrap(),
        SubscribeOutcome::AlreadySubscribed
    );

    let report = exchange.update_price("AAPL", dec(175), "open").unwrap();
    assert_eq!(report.delivered, vec!["Amir", "Alikhan"]);

    assert!(exchange.unsubscribe("AAPL", &subscribers[1]));
    assert_eq!(exchange.subscriptions_report().len(), 1);
}

#[test]
fn test_dropped_subscriber_is_forgotten() {
    let exchange = Exchange::new();
    let keep = Inbox::new("keep");
    let temporary = Inbox::new("temporary");
    exchange.subscribe("AAPL", &keep, None).unwrap();
    exchange.subscribe("AAPL", &temporary, None).unwrap();

    drop(temporary);
    let report = exchange.update_price("AAPL", dec(1), "tick").unwrap();

    assert_eq!(report.delivered, vec!["keep"]);
    assert_eq!(report.dropped, vec!["temporary"]);
    assert_eq!(exchange.subscriptions_report().len(), 1);
}

#[test]
fn test_log_is_ordered() {
    let exchange = Exchange::new();
    let a = Inbox::new("A");
    exchange.subscribe("AAPL", &a, None).unwrap();
    for i in 1..=20 {
        exchange.update_price("AAPL", dec(i), "tick").unwrap();
    }

    let entries = exchange.event_log_snapshot();
    assert_eq!(entries.len(), 1 + 20 * 2);
    for pair in entries.windows(2) {
        assert_eq!(pair[1].sequence, pair[0].sequence + 1);
        assert!(pair[1].timestamp >= pair[0].timestamp);
    }
}

#[test]
fn test_reports_serialize() {
    let exchange = Exchange::new();
    let a = Inbox::new("A");
    exchange.subscribe("TSLA", &a, Some(Decimal::new(19950, 2))).unwrap();
    exchange.update_price("TSLA", dec(205), "rally").unwrap();

    let report = serde_json::to_value(exchange.subscriptions_report()).unwrap();
    assert_eq!(report[0]["topic"], "TSLA");
    assert_eq!(report[0]["subscriber"], "A");
    assert_eq!(report[0]["delivery_count"], 1);

    let event = serde_json::to_value(&a.events.lock()[0]).unwrap();
    assert_eq!(event["topic"], "TSLA");
    assert_eq!(event["reason"], "rally");

    let log = serde_json::to_value(exchange.event_log_snapshot()).unwrap();
    assert_eq!(log[0]["sequence"], 1);
}
