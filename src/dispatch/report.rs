//! Outcome of one dispatch.

use crate::error::DeliveryError;
use crate::types::{NotificationEvent, Price, Topic};

/// What happened to each subscription of a topic during one update.
///
/// Name lists keep subscription order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchReport {
    pub topic: Topic,
    pub price: Price,
    /// Subscribers that were notified successfully.
    pub delivered: Vec<String>,
    /// Subscribers filtered out by their minimum notify price.
    pub skipped: Vec<String>,
    /// Subscribers whose notification failed, timed out or panicked.
    pub failed: Vec<(String, DeliveryError)>,
    /// Subscribers found dropped by their owner and removed.
    pub dropped: Vec<String>,
}

impl DispatchReport {
    pub(crate) fn new(event: &NotificationEvent) -> Self {
        Self {
            topic: event.topic.clone(),
            price: event.price,
            delivered: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
            dropped: Vec::new(),
        }
    }

    /// Number of successful deliveries.
    pub fn notified(&self) -> usize {
        self.delivered.len()
    }

    /// True when no eligible subscriber failed.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
