//! In-memory price store.

use crate::error::{ExchangeError, Result};
use crate::types::{ensure_positive, Price, PriceRecord, Timestamp, Topic};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Holds one [`PriceRecord`] per topic.
///
/// Records are created on the first update of a topic and overwritten on
/// every later one; they are never removed.
pub struct PriceStore {
    prices: RwLock<HashMap<Topic, PriceRecord>>,
}

impl PriceStore {
    pub fn new() -> Self {
        Self {
            prices: RwLock::new(HashMap::new()),
        }
    }

    /// Set the price of `topic`, returning the stored record.
    pub fn set_price(&self, topic: &Topic, price: Price) -> Result<PriceRecord> {
        ensure_positive(price, "price")?;

        let mut prices = self.prices.write();
        let (previous, updates) = match prices.get(topic) {
            Some(existing) => (Some(existing.price), existing.updates + 1),
            None => (None, 1),
        };

        let record = PriceRecord {
            topic: topic.clone(),
            price,
            timestamp: Timestamp::now(),
            previous,
            updates,
        };
        prices.insert(topic.clone(), record.clone());

        Ok(record)
    }

    /// Last known price of `topic`.
    pub fn get_price(&self, topic: &Topic) -> Result<PriceRecord> {
        self.prices
            .read()
            .get(topic)
            .cloned()
            .ok_or_else(|| ExchangeError::NotFound(format!("no price for {}", topic)))
    }

    /// All known prices, ordered by topic.
    pub fn snapshot(&self) -> Vec<PriceRecord> {
        let mut records: Vec<_> = self.prices.read().values().cloned().collect();
        records.sort_by(|a, b| a.topic.cmp(&b.topic));
        records
    }

    pub fn len(&self) -> usize {
        self.prices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.read().is_empty()
    }
}

impl Default for PriceStore {
    fn default() -> Self {
        Self::new()
    }
}
