//! Pass-through notifier.

use crate::error::DeliveryError;
use crate::types::NotificationEvent;

use super::Subscriber;

/// Displays every update it receives and always succeeds.
#[derive(Debug, Clone)]
pub struct TraderNotifier {
    name: String,
}

impl TraderNotifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The line shown for an update.
    pub fn render(&self, event: &NotificationEvent) -> String {
        format!(
            "[Trader {}] {} -> {} | {}",
            self.name, event.topic, event.price, event.reason
        )
    }
}

impl Subscriber for TraderNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_price_changed(&self, event: &NotificationEvent) -> Result<(), DeliveryError> {
        tracing::info!(
            target: "quotecast::subscribers::trader",
            topic = %event.topic,
            price = %event.price,
            "{}",
            self.render(event)
        );
        Ok(())
    }
}
