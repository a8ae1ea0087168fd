//! Concurrent fan-out of one price update.

use crate::audit::EventLog;
use crate::error::DeliveryError;
use crate::subscribers::Subscriber;
use crate::subscriptions::{Subscription, SubscriptionRegistry};
use crate::types::NotificationEvent;
use crossbeam_channel::unbounded;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::report::DispatchReport;

/// A subscription that passed the filter, with its subscriber borrowed for
/// the duration of the update.
type Eligible = (Arc<Subscription>, Arc<dyn Subscriber>);

type Outcome = Result<(), DeliveryError>;

/// Delivers price updates to the subscriptions of a topic.
///
/// ```text
///   dispatch(event)
///       │  snapshot registry, apply min-notify filter
///       ├──► notify-S1 ─► S1.on_price_changed(copy of event) ─┐
///       ├──► notify-S2 ─► S2.on_price_changed(copy of event) ─┤ results
///       └──► notify-SN ─► SN.on_price_changed(copy of event) ─┘ channel
///       ▼
///   join (until all answered or the delivery deadline passes)
///       │  count successes, log every outcome in subscription order
///       ▼
///   DispatchReport
/// ```
pub struct NotificationDispatcher {
    registry: Arc<SubscriptionRegistry>,
    log: Arc<EventLog>,
    /// Upper bound on waiting for one update's notifications. `None` waits
    /// for every subscriber however long it takes.
    delivery_timeout: Option<Duration>,
    /// Simulated latency before each subscriber is invoked.
    delivery_delay: Duration,
}

impl NotificationDispatcher {
    pub fn new(
        registry: Arc<SubscriptionRegistry>,
        log: Arc<EventLog>,
        delivery_timeout: Option<Duration>,
        delivery_delay: Duration,
    ) -> Self {
        Self {
            registry,
            log,
            delivery_timeout,
            delivery_delay,
        }
    }

    /// Notify every eligible subscriber of `event` and wait for them.
    ///
    /// Returns once every notification has completed, failed, or outlived
    /// the delivery timeout. Failures are logged and reported; they never
    /// stop the other subscribers from being notified.
    pub fn dispatch(&self, event: &NotificationEvent) -> DispatchReport {
        let topic = &event.topic;
        let mut report = DispatchReport::new(event);

        let mut eligible: Vec<Eligible> = Vec::new();
        let mut saw_dropped = false;
        for sub in self.registry.matching_subscriptions(topic) {
            let subscriber = match sub.subscriber().upgrade() {
                Some(subscriber) => subscriber,
                None => {
                    saw_dropped = true;
                    continue;
                }
            };
            if !sub.accepts(event.price) {
                report.skipped.push(sub.subscriber_name().to_string());
                continue;
            }
            eligible.push((sub, subscriber));
        }

        if saw_dropped {
            report.dropped = self
                .registry
                .prune(topic)
                .iter()
                .map(|sub| sub.subscriber_name().to_string())
                .collect();
        }

        if eligible.is_empty() {
            self.log
                .append(format!("no subscribers to notify for {}", topic));
            tracing::debug!(
                target: "quotecast::dispatch",
                topic = %topic,
                skipped = report.skipped.len(),
                "no eligible subscribers"
            );
            return report;
        }

        tracing::debug!(
            target: "quotecast::dispatch",
            topic = %topic,
            price = %event.price,
            subscribers = eligible.len(),
            "dispatching update"
        );

        let outcomes = self.fan_out(event, &eligible);

        for ((sub, _), outcome) in eligible.iter().zip(outcomes) {
            let name = sub.subscriber_name();
            match outcome {
                Ok(()) => {
                    sub.record_delivery();
                    self.log.append(format!("notified {} for {}", name, topic));
                    report.delivered.push(name.to_string());
                }
                Err(err) => {
                    tracing::warn!(
                        target: "quotecast::dispatch",
                        topic = %topic,
                        subscriber = name,
                        error = %err,
                        "delivery failed"
                    );
                    self.log.append(format!(
                        "delivery to {} for {} failed: {}",
                        name, topic, err
                    ));
                    report.failed.push((name.to_string(), err));
                }
            }
        }

        tracing::info!(
            target: "quotecast::dispatch",
            topic = %topic,
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "update dispatched"
        );

        report
    }

    /// Run every notification on its own thread and collect the outcomes,
    /// indexed like `eligible`.
    fn fan_out(&self, event: &NotificationEvent, eligible: &[Eligible]) -> Vec<Outcome> {
        let (tx, rx) = unbounded::<(usize, Outcome)>();
        let mut outcomes: Vec<Option<Outcome>> = vec![None; eligible.len()];
        let mut pending = 0usize;

        for (index, (sub, subscriber)) in eligible.iter().enumerate() {
            // At most one notification per subscription at a time. A call
            // the dispatcher gave up on keeps its claim until it returns, so
            // later updates are never delivered around it.
            if !sub.begin_delivery() {
                outcomes[index] = Some(Err(DeliveryError::Busy));
                continue;
            }

            let claim = Arc::clone(sub);
            let subscriber = Arc::clone(subscriber);
            let event = event.clone();
            let tx = tx.clone();
            let delay = self.delivery_delay;

            let spawned = thread::Builder::new()
                .name(format!("notify-{}", subscriber.name().replace('\0', "")))
                .spawn(move || {
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    let outcome =
                        panic::catch_unwind(AssertUnwindSafe(|| subscriber.on_price_changed(&event)))
                            .unwrap_or_else(|payload| {
                                Err(DeliveryError::Panicked(panic_message(payload.as_ref())))
                            });
                    // Released before reporting, so the next update of the
                    // topic finds the subscription free.
                    claim.end_delivery();
                    // The receiver is gone if the dispatcher stopped waiting.
                    let _ = tx.send((index, outcome));
                });

            match spawned {
                Ok(_) => pending += 1,
                Err(err) => {
                    sub.end_delivery();
                    outcomes[index] = Some(Err(DeliveryError::Spawn(err.to_string())));
                }
            }
        }
        drop(tx);

        let deadline = self.delivery_timeout.map(|timeout| Instant::now() + timeout);
        while pending > 0 {
            let received = match deadline {
                Some(deadline) => rx.recv_deadline(deadline).ok(),
                None => rx.recv().ok(),
            };
            match received {
                Some((index, outcome)) => {
                    outcomes[index] = Some(outcome);
                    pending -= 1;
                }
                None => break,
            }
        }

        outcomes
            .into_iter()
            .map(|outcome| outcome.unwrap_or_else(|| Err(self.missing_outcome())))
            .collect()
    }

    /// Error for a notification that never reported back.
    fn missing_outcome(&self) -> DeliveryError {
        match self.delivery_timeout {
            Some(timeout) => DeliveryError::TimedOut(timeout),
            None => DeliveryError::Panicked("notification ended without reporting".to_string()),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
