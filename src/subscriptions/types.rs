//! Subscription types.

use crate::subscribers::SubscriberHandle;
use crate::types::{Price, Topic};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Relationship between one topic and one subscriber.
///
/// Created by `subscribe`, removed by `unsubscribe`. In between only the
/// dispatcher changes it: it bumps the delivery counter and marks the
/// subscription busy while a notification runs.
pub struct Subscription {
    topic: Topic,
    subscriber: SubscriberHandle,
    /// Captured at subscribe time so reports work after the owner drops it.
    subscriber_name: String,
    min_notify_price: Option<Price>,
    delivered: AtomicU64,
    /// Set while a notification thread for this subscription is running.
    in_flight: AtomicBool,
}

impl Subscription {
    pub(crate) fn new(
        topic: Topic,
        subscriber: SubscriberHandle,
        subscriber_name: String,
        min_notify_price: Option<Price>,
    ) -> Self {
        Self {
            topic,
            subscriber,
            subscriber_name,
            min_notify_price,
            delivered: AtomicU64::new(0),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn subscriber(&self) -> &SubscriberHandle {
        &self.subscriber
    }

    pub fn subscriber_name(&self) -> &str {
        &self.subscriber_name
    }

    pub fn min_notify_price(&self) -> Option<Price> {
        self.min_notify_price
    }

    /// Filter rule: skip when a minimum is set and the price is below it.
    pub fn accepts(&self, price: Price) -> bool {
        match self.min_notify_price {
            Some(minimum) => price >= minimum,
            None => true,
        }
    }

    pub fn delivery_count(&self) -> u64 {
        self.delivered.load(Ordering::Acquire)
    }

    /// Count one successful delivery; returns the new total.
    pub(crate) fn record_delivery(&self) -> u64 {
        self.delivered.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// True while an earlier notification has not returned yet, including
    /// one the dispatcher stopped waiting for.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Claim the subscription for one notification. Fails while another
    /// notification is still running.
    pub(crate) fn begin_delivery(&self) -> bool {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn end_delivery(&self) {
        self.in_flight.store(false, Ordering::Release);
    }

    pub fn report(&self) -> SubscriptionReport {
        SubscriptionReport {
            topic: self.topic.clone(),
            subscriber: self.subscriber_name.clone(),
            min_notify_price: self.min_notify_price,
            delivery_count: self.delivery_count(),
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("subscriber", &self.subscriber_name)
            .field("min_notify_price", &self.min_notify_price)
            .field("delivered", &self.delivery_count())
            .field("in_flight", &self.is_in_flight())
            .finish()
    }
}

/// Result of a subscribe call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// A new subscription was appended.
    Added,
    /// The pair already existed; nothing changed.
    AlreadySubscribed,
}

/// Read-only view of one subscription for observability.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionReport {
    pub topic: Topic,
    pub subscriber: String,
    pub min_notify_price: Option<Price>,
    pub delivery_count: u64,
}

impl SubscriptionReport {
    /// Human readable filter, e.g. `"filter >= 200"` or `"no filter"`.
    pub fn filter_description(&self) -> String {
        match self.min_notify_price {
            Some(minimum) => format!("filter >= {}", minimum),
            None => "no filter".to_string(),
        }
    }
}

impl fmt::Display for SubscriptionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | notifications: {}",
            self.topic,
            self.subscriber,
            self.filter_description(),
            self.delivery_count
        )
    }
}
