//! # Price Notification Engine
//!
//! A topic-based publish/subscribe engine that delivers price changes to
//! subscribers concurrently and keeps an ordered audit log of everything it
//! does.
//!
//! ## Core Concepts
//!
//! - **Topics**: Normalized market symbols (`" aapl "` is `AAPL`)
//! - **Subscriptions**: One per (topic, subscriber), with an optional minimum
//!   notify price and a delivery counter
//! - **Dispatch**: Each update fans out to every eligible subscriber on its
//!   own thread and is joined before `update_price` returns
//! - **Event log**: Append-only record of subscriptions, updates and
//!   deliveries
//!
//! ## Example
//!
//! ```ignore
//! use quotecast::{Decimal, Exchange, TraderNotifier};
//! use std::sync::Arc;
//!
//! let exchange = Exchange::new();
//! let trader = Arc::new(TraderNotifier::new("amir"));
//!
//! exchange.subscribe("TSLA", &trader, Some(Decimal::from(200)))?;
//!
//! // Below the filter: nobody is notified.
//! exchange.update_price("TSLA", Decimal::from(190), "news")?;
//!
//! // At or above: the trader is notified before this returns.
//! let report = exchange.update_price("TSLA", Decimal::from(205), "rally")?;
//! assert_eq!(report.delivered, vec!["amir"]);
//!
//! for entry in exchange.event_log_snapshot() {
//!     println!("{}", entry);
//! }
//! ```

pub mod audit;
pub mod dispatch;
pub mod error;
pub mod exchange;
pub mod prices;
pub mod subscribers;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use audit::{EventLog, LogEntry};
pub use dispatch::{DispatchReport, NotificationDispatcher};
pub use error::{DeliveryError, ExchangeError, Result};
pub use exchange::{Exchange, ExchangeConfig};
pub use prices::PriceStore;
pub use rust_decimal::Decimal;
pub use subscribers::{
    Decision, MobilePushNotifier, Subscriber, SubscriberHandle, TraderNotifier, TradingRobot,
};
pub use subscriptions::{SubscribeOutcome, Subscription, SubscriptionRegistry, SubscriptionReport};
pub use types::{NotificationEvent, Price, PriceRecord, Timestamp, Topic};
