//! Topic subscriptions.
//!
//! A subscription ties one subscriber to one topic, with an optional
//! minimum price below which the subscriber is not notified:
//! - At most one subscription per (topic, subscriber) pair
//! - Insertion order is preserved per topic
//! - The registry holds subscribers by weak handle only
//!
//! # Example
//!
//! ```ignore
//! let registry = SubscriptionRegistry::new(Arc::new(EventLog::new()));
//! let trader = Arc::new(TraderNotifier::new("amir"));
//!
//! registry.subscribe("AAPL", &trader, None)?;
//! registry.subscribe("TSLA", &trader, Some(Decimal::from(200)))?;
//!
//! for sub in registry.matching_subscriptions(&Topic::parse("aapl")?) {
//!     println!("{} ({} deliveries)", sub.subscriber_name(), sub.delivery_count());
//! }
//! ```

mod registry;
mod types;

pub use registry::SubscriptionRegistry;
pub use types::{SubscribeOutcome, Subscription, SubscriptionReport};
