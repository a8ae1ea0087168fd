//! The subscriber capability and the non-owning handle the registry keeps.

use crate::error::DeliveryError;
use crate::types::NotificationEvent;
use std::fmt;
use std::sync::{Arc, Weak};

/// Anything that wants to hear about price changes.
///
/// `on_price_changed` runs on a dedicated notification thread, concurrently
/// with the other subscribers of the same update. It may block (simulated
/// network latency, I/O); the dispatcher bounds the wait with its delivery
/// timeout. Returning `Err` marks this delivery as failed without affecting
/// anyone else.
pub trait Subscriber: Send + Sync + 'static {
    /// Stable display name used in the event log and reports.
    fn name(&self) -> &str;

    /// React to one price change.
    fn on_price_changed(&self, event: &NotificationEvent) -> Result<(), DeliveryError>;
}

/// Non-owning reference to a subscriber.
///
/// The registry stores handles, never the subscriber itself: once every
/// `Arc` owned by the caller is dropped the subscriber is gone, and its
/// subscriptions are pruned on the next dispatch for the topic. Two handles
/// are the same subscriber when they point at the same allocation.
#[derive(Clone, Default)]
pub struct SubscriberHandle {
    inner: Option<Weak<dyn Subscriber>>,
}

impl SubscriberHandle {
    /// Handle to a concrete subscriber.
    pub fn new<S: Subscriber>(subscriber: &Arc<S>) -> Self {
        let weak: Weak<S> = Arc::downgrade(subscriber);
        let weak: Weak<dyn Subscriber> = weak;
        Self { inner: Some(weak) }
    }

    /// Handle to an already type-erased subscriber.
    pub fn from_dyn(subscriber: &Arc<dyn Subscriber>) -> Self {
        Self {
            inner: Some(Arc::downgrade(subscriber)),
        }
    }

    /// A handle that refers to no subscriber.
    pub fn unset() -> Self {
        Self { inner: None }
    }

    pub fn is_set(&self) -> bool {
        self.inner.is_some()
    }

    /// True while the owner still holds the subscriber.
    pub fn is_alive(&self) -> bool {
        self.inner
            .as_ref()
            .map(|weak| weak.strong_count() > 0)
            .unwrap_or(false)
    }

    /// Borrow the subscriber for the duration of one call.
    pub fn upgrade(&self) -> Option<Arc<dyn Subscriber>> {
        self.inner.as_ref().and_then(Weak::upgrade)
    }

    /// Identity comparison. Unset handles never match anything.
    pub fn same_as(&self, other: &SubscriberHandle) -> bool {
        match (&self.inner, &other.inner) {
            (Some(a), Some(b)) => {
                // Compare data addresses only; vtable pointers for the same
                // type may differ across codegen units.
                std::ptr::eq(
                    Weak::as_ptr(a) as *const (),
                    Weak::as_ptr(b) as *const (),
                )
            }
            _ => false,
        }
    }
}

impl<S: Subscriber> From<&Arc<S>> for SubscriberHandle {
    fn from(subscriber: &Arc<S>) -> Self {
        SubscriberHandle::new(subscriber)
    }
}

impl From<&Arc<dyn Subscriber>> for SubscriberHandle {
    fn from(subscriber: &Arc<dyn Subscriber>) -> Self {
        SubscriberHandle::from_dyn(subscriber)
    }
}

impl From<&SubscriberHandle> for SubscriberHandle {
    fn from(handle: &SubscriberHandle) -> Self {
        handle.clone()
    }
}

impl fmt::Debug for SubscriberHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(subscriber) => write!(f, "SubscriberHandle({})", subscriber.name()),
            None if self.is_set() => write!(f, "SubscriberHandle(<dropped>)"),
            None => write!(f, "SubscriberHandle(<unset>)"),
        }
    }
}
