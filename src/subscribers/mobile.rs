//! Simulated mobile push notifier.

use crate::error::DeliveryError;
use crate::types::NotificationEvent;
use parking_lot::Mutex;

use super::Subscriber;

/// Converts each update into a push message and always succeeds.
///
/// Pushes are kept in an outbox instead of being sent anywhere, so callers
/// can inspect what a device would have received.
#[derive(Debug)]
pub struct MobilePushNotifier {
    name: String,
    outbox: Mutex<Vec<String>>,
}

impl MobilePushNotifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outbox: Mutex::new(Vec::new()),
        }
    }

    /// Push messages in the order they were produced.
    pub fn sent(&self) -> Vec<String> {
        self.outbox.lock().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.outbox.lock().len()
    }
}

impl Subscriber for MobilePushNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_price_changed(&self, event: &NotificationEvent) -> Result<(), DeliveryError> {
        let message = format!("Push: {} = {}", event.topic, event.price);
        tracing::info!(
            target: "quotecast::subscribers::mobile",
            device = %self.name,
            "{}",
            message
        );
        self.outbox.lock().push(message);
        Ok(())
    }
}
