//! Main Exchange struct tying all components together.

use crate::audit::{EventLog, LogEntry};
use crate::dispatch::{DispatchReport, NotificationDispatcher};
use crate::error::{ExchangeError, Result};
use crate::prices::PriceStore;
use crate::subscribers::SubscriberHandle;
use crate::subscriptions::{SubscribeOutcome, SubscriptionRegistry, SubscriptionReport};
use crate::types::{ensure_positive, NotificationEvent, Price, PriceRecord, Topic};
use parking_lot::{FairMutex, Mutex};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Exchange configuration.
#[derive(Clone, Debug)]
pub struct ExchangeConfig {
    /// How long one update waits for its notifications before reporting the
    /// stragglers as timed out (None = wait indefinitely).
    /// Default: 5s
    pub delivery_timeout: Option<Duration>,

    /// Simulated latency applied to every notification.
    /// Default: zero
    pub delivery_delay: Duration,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            delivery_timeout: Some(Duration::from_secs(5)),
            delivery_delay: Duration::ZERO,
        }
    }
}

impl ExchangeConfig {
    /// Check the configuration for values that cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.delivery_timeout == Some(Duration::ZERO) {
            return Err(ExchangeError::Config(
                "delivery_timeout must be greater than zero".to_string(),
            ));
        }
        if let Some(timeout) = self.delivery_timeout {
            if self.delivery_delay >= timeout {
                return Err(ExchangeError::Config(format!(
                    "delivery_delay ({:?}) must be shorter than delivery_timeout ({:?})",
                    self.delivery_delay, timeout
                )));
            }
        }
        Ok(())
    }
}

/// The price notification engine.
///
/// Provides a unified interface for:
/// - Subscribing and unsubscribing subscribers per topic
/// - Publishing price updates and fanning them out
/// - Querying prices, subscriptions and the audit log
///
/// Updates of different topics run independently. Updates of the same topic
/// pass through a fair per-topic gate, so they are applied and delivered
/// one at a time in the order they arrived.
pub struct Exchange {
    config: ExchangeConfig,

    /// Audit trail shared with the registry and dispatcher.
    log: Arc<EventLog>,

    registry: Arc<SubscriptionRegistry>,

    prices: PriceStore,

    dispatcher: NotificationDispatcher,

    /// One gate per topic ever updated.
    gates: Mutex<HashMap<Topic, Arc<FairMutex<()>>>>,
}

impl Exchange {
    /// Create an exchange with the default configuration.
    pub fn new() -> Self {
        Self::build(ExchangeConfig::default())
    }

    /// Create an exchange with a custom configuration.
    pub fn with_config(config: ExchangeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: ExchangeConfig) -> Self {
        let log = Arc::new(EventLog::new());
        let registry = Arc::new(SubscriptionRegistry::new(Arc::clone(&log)));
        let dispatcher = NotificationDispatcher::new(
            Arc::clone(&registry),
            Arc::clone(&log),
            config.delivery_timeout,
            config.delivery_delay,
        );

        tracing::debug!(
            target: "quotecast::exchange",
            delivery_timeout = ?config.delivery_timeout,
            delivery_delay = ?config.delivery_delay,
            "exchange created"
        );

        Self {
            config,
            log,
            registry,
            prices: PriceStore::new(),
            dispatcher,
            gates: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    // --- Subscriptions ---

    /// Subscribe to `topic`, optionally only for prices at or above
    /// `min_notify_price`.
    ///
    /// The exchange keeps a weak handle: the caller stays responsible for
    /// keeping the subscriber alive.
    pub fn subscribe(
        &self,
        topic: &str,
        subscriber: impl Into<SubscriberHandle>,
        min_notify_price: Option<Price>,
    ) -> Result<SubscribeOutcome> {
        self.registry.subscribe(topic, subscriber, min_notify_price)
    }

    /// Unsubscribe from `topic`. Unknown pairs are ignored.
    pub fn unsubscribe(&self, topic: &str, subscriber: impl Into<SubscriberHandle>) -> bool {
        self.registry.unsubscribe(topic, subscriber)
    }

    // --- Prices ---

    /// Publish a new price and notify the topic's subscribers.
    ///
    /// Validation happens first: a blank topic or a non-positive price is
    /// rejected with `InvalidArgument` before anything is stored or logged.
    /// Returns after every eligible subscriber has been notified, has failed,
    /// or has run past the delivery timeout.
    pub fn update_price(
        &self,
        topic: &str,
        price: Price,
        reason: impl Into<String>,
    ) -> Result<DispatchReport> {
        let topic = Topic::parse(topic)?;
        ensure_positive(price, "price")?;
        let reason = reason.into();

        let gate = self.gate(&topic);
        let _turn = gate.lock();

        let record = self.prices.set_price(&topic, price)?;
        self.log.append(format!(
            "price updated: {} = {} | reason: {}",
            topic, price, reason
        ));

        let event = NotificationEvent::from_record(&record, reason);
        Ok(self.dispatcher.dispatch(&event))
    }

    /// Last known price of `topic`.
    pub fn price(&self, topic: &str) -> Result<PriceRecord> {
        let topic = Topic::parse(topic)?;
        self.prices.get_price(&topic)
    }

    /// Every known price, ordered by topic.
    pub fn prices(&self) -> Vec<PriceRecord> {
        self.prices.snapshot()
    }

    // --- Observability ---

    /// Snapshot of every subscription with its filter and delivery count.
    pub fn subscriptions_report(&self) -> Vec<SubscriptionReport> {
        self.registry.report()
    }

    /// Copy of the audit log in append order.
    pub fn event_log_snapshot(&self) -> Vec<LogEntry> {
        self.log.snapshot()
    }

    /// Shared handle to the audit log.
    pub fn event_log(&self) -> Arc<EventLog> {
        Arc::clone(&self.log)
    }

    /// Gate serializing updates of `topic`.
    fn gate(&self, topic: &Topic) -> Arc<FairMutex<()>> {
        let mut gates = self.gates.lock();
        Arc::clone(
            gates
                .entry(topic.clone())
                .or_insert_with(|| Arc::new(FairMutex::new(()))),
        )
    }
}

impl Default for Exchange {
    fn default() -> Self {
        Self::new()
    }
}
