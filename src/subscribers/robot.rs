//! Threshold-driven trading robot.

use crate::error::DeliveryError;
use crate::types::{NotificationEvent, Price, Topic};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::Subscriber;

/// What the robot does with a price.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Buy => f.write_str("BUY"),
            Decision::Sell => f.write_str("SELL"),
            Decision::Hold => f.write_str("HOLD"),
        }
    }
}

/// Decides per update from private buy/sell levels.
///
/// Buy when the price is at or below the topic's buy level, otherwise sell
/// when it is at or above the sell level, otherwise hold. Topics without a
/// level on one side never trigger that side. Thresholds are fixed at
/// construction; the decision journal is the only thing that changes.
#[derive(Debug)]
pub struct TradingRobot {
    name: String,
    buy_levels: HashMap<Topic, Price>,
    sell_levels: HashMap<Topic, Price>,
    journal: Mutex<Vec<(Topic, Price, Decision)>>,
}

impl TradingRobot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            buy_levels: HashMap::new(),
            sell_levels: HashMap::new(),
            journal: Mutex::new(Vec::new()),
        }
    }

    /// Buy `topic` at or below `level`.
    pub fn with_buy_level(mut self, topic: Topic, level: Price) -> Self {
        self.buy_levels.insert(topic, level);
        self
    }

    /// Sell `topic` at or above `level`.
    pub fn with_sell_level(mut self, topic: Topic, level: Price) -> Self {
        self.sell_levels.insert(topic, level);
        self
    }

    /// Pure decision for one event.
    pub fn decide(&self, event: &NotificationEvent) -> Decision {
        if let Some(buy) = self.buy_levels.get(&event.topic) {
            if event.price <= *buy {
                return Decision::Buy;
            }
        }
        if let Some(sell) = self.sell_levels.get(&event.topic) {
            if event.price >= *sell {
                return Decision::Sell;
            }
        }
        Decision::Hold
    }

    /// Decisions taken so far, in delivery order.
    pub fn decisions(&self) -> Vec<(Topic, Price, Decision)> {
        self.journal.lock().clone()
    }
}

impl Subscriber for TradingRobot {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_price_changed(&self, event: &NotificationEvent) -> Result<(), DeliveryError> {
        let decision = self.decide(event);
        tracing::info!(
            target: "quotecast::subscribers::robot",
            robot = %self.name,
            topic = %event.topic,
            price = %event.price,
            %decision,
            "robot decision"
        );
        self.journal
            .lock()
            .push((event.topic.clone(), event.price, decision));
        Ok(())
    }
}
