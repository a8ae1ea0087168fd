//! Subscription registry keyed by topic.

use crate::audit::EventLog;
use crate::error::{ExchangeError, Result};
use crate::subscribers::SubscriberHandle;
use crate::types::{ensure_positive, Price, Topic};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::types::{SubscribeOutcome, Subscription, SubscriptionReport};

/// Subscriptions of one topic, in insertion order.
type TopicSubscriptions = RwLock<Vec<Arc<Subscription>>>;

/// Maps topics to their ordered, deduplicated subscriptions.
///
/// The outer map lock is only held long enough to find or create a topic's
/// list. Each list has its own lock, so subscribing to one topic never waits
/// on a dispatch snapshot of another.
pub struct SubscriptionRegistry {
    topics: RwLock<BTreeMap<Topic, Arc<TopicSubscriptions>>>,
    log: Arc<EventLog>,
}

impl SubscriptionRegistry {
    /// Create a registry that records its operations in `log`.
    pub fn new(log: Arc<EventLog>) -> Self {
        Self {
            topics: RwLock::new(BTreeMap::new()),
            log,
        }
    }

    /// Subscribe `subscriber` to `topic`.
    ///
    /// Subscribing an existing (topic, subscriber) pair again is a logged
    /// no-op: the original filter and delivery count are kept.
    pub fn subscribe(
        &self,
        topic: &str,
        subscriber: impl Into<SubscriberHandle>,
        min_notify_price: Option<Price>,
    ) -> Result<SubscribeOutcome> {
        let topic = Topic::parse(topic)?;
        let handle = subscriber.into();
        if !handle.is_set() {
            return Err(ExchangeError::InvalidArgument(
                "subscriber is not set".to_string(),
            ));
        }
        let name = match handle.upgrade() {
            Some(subscriber) => subscriber.name().to_string(),
            None => {
                return Err(ExchangeError::InvalidArgument(
                    "subscriber has already been dropped".to_string(),
                ))
            }
        };
        if let Some(minimum) = min_notify_price {
            ensure_positive(minimum, "minimum notify price")?;
        }

        let list = self.topic_entry(&topic);
        let mut subs = list.write();

        if subs.iter().any(|sub| sub.subscriber().same_as(&handle)) {
            self.log.append(format!(
                "duplicate subscription skipped: {} -> {}",
                name, topic
            ));
            return Ok(SubscribeOutcome::AlreadySubscribed);
        }

        let message = match min_notify_price {
            Some(minimum) => format!(
                "subscription added: {} -> {} (filter >= {})",
                name, topic, minimum
            ),
            None => format!("subscription added: {} -> {}", name, topic),
        };
        subs.push(Arc::new(Subscription::new(
            topic.clone(),
            handle,
            name,
            min_notify_price,
        )));
        self.log.append(message);

        tracing::debug!(
            target: "quotecast::registry",
            topic = %topic,
            subscribers = subs.len(),
            "subscription added"
        );

        Ok(SubscribeOutcome::Added)
    }

    /// Remove `subscriber` from `topic`.
    ///
    /// Silently does nothing for a blank topic, an unset handle or an
    /// unknown pair. Returns whether a subscription was removed.
    pub fn unsubscribe(&self, topic: &str, subscriber: impl Into<SubscriberHandle>) -> bool {
        let handle = subscriber.into();
        if !handle.is_set() {
            return false;
        }
        let topic = match Topic::parse(topic) {
            Ok(topic) => topic,
            Err(_) => return false,
        };
        let list = match self.topics.read().get(&topic) {
            Some(list) => Arc::clone(list),
            None => return false,
        };

        let mut subs = list.write();
        let position = match subs.iter().position(|sub| sub.subscriber().same_as(&handle)) {
            Some(position) => position,
            None => return false,
        };
        let removed = subs.remove(position);
        self.log.append(format!(
            "subscription removed: {} -> {}",
            removed.subscriber_name(),
            topic
        ));
        true
    }

    /// Snapshot of the topic's subscriptions at call time, insertion order.
    pub fn matching_subscriptions(&self, topic: &Topic) -> Vec<Arc<Subscription>> {
        let list = match self.topics.read().get(topic) {
            Some(list) => Arc::clone(list),
            None => return Vec::new(),
        };
        let subs = list.read();
        subs.clone()
    }

    /// Drop subscriptions whose subscriber no longer exists.
    ///
    /// Returns the removed subscriptions, in their former order.
    pub fn prune(&self, topic: &Topic) -> Vec<Arc<Subscription>> {
        let list = match self.topics.read().get(topic) {
            Some(list) => Arc::clone(list),
            None => return Vec::new(),
        };

        let mut subs = list.write();
        let (alive, dead): (Vec<_>, Vec<_>) = subs
            .drain(..)
            .partition(|sub| sub.subscriber().is_alive());
        *subs = alive;

        for sub in &dead {
            self.log.append(format!(
                "subscriber dropped, subscription removed: {} -> {}",
                sub.subscriber_name(),
                topic
            ));
        }
        dead
    }

    /// Every subscription, topics in lexical order.
    pub fn report(&self) -> Vec<SubscriptionReport> {
        let lists: Vec<_> = self.topics.read().values().cloned().collect();
        lists
            .iter()
            .flat_map(|list| {
                list.read()
                    .iter()
                    .map(|sub| sub.report())
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Topics with at least one subscription.
    pub fn topics(&self) -> Vec<Topic> {
        self.topics
            .read()
            .iter()
            .filter(|(_, list)| !list.read().is_empty())
            .map(|(topic, _)| topic.clone())
            .collect()
    }

    /// Total number of subscriptions.
    pub fn len(&self) -> usize {
        self.topics.read().values().map(|list| list.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get or create the list for `topic`.
    fn topic_entry(&self, topic: &Topic) -> Arc<TopicSubscriptions> {
        if let Some(list) = self.topics.read().get(topic) {
            return Arc::clone(list);
        }
        let mut topics = self.topics.write();
        Arc::clone(topics.entry(topic.clone()).or_default())
    }
}
