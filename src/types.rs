//! Core types for the exchange.

use crate::error::{ExchangeError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Prices are exact decimals; binary floats would make `price < minimum`
/// comparisons depend on rounding.
pub type Price = Decimal;

/// Normalized market symbol.
///
/// Topics are trimmed and upper-cased on construction, so `" aapl "` and
/// `"AAPL"` name the same topic. A topic is never empty.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Topic(String);

impl Topic {
    /// Parse and normalize a raw symbol.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ExchangeError::InvalidArgument(
                "topic must not be empty".to_string(),
            ));
        }
        Ok(Topic(trimmed.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Topic {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self> {
        Topic::parse(s)
    }
}

impl TryFrom<String> for Topic {
    type Error = ExchangeError;

    fn try_from(s: String) -> Result<Self> {
        Topic::parse(&s)
    }
}

impl From<Topic> for String {
    fn from(topic: Topic) -> Self {
        topic.0
    }
}

impl AsRef<str> for Topic {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Topic({})", self.0)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Microseconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time. A clock set before the epoch reads as zero.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp(duration.as_micros() as i64)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.0.div_euclid(1_000_000), self.0.rem_euclid(1_000_000))
    }
}

/// Last known price of a topic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub topic: Topic,

    pub price: Price,

    /// When the price was set.
    pub timestamp: Timestamp,

    /// The price this record replaced, if any.
    pub previous: Option<Price>,

    /// How many times the topic has been priced, this update included.
    pub updates: u64,
}

/// A price change as seen by one subscriber.
///
/// Each matching subscriber receives its own copy; the fields are public
/// for reading but the dispatcher never hands out a shared mutable value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub topic: Topic,
    pub price: Price,
    pub previous_price: Option<Price>,
    pub timestamp: Timestamp,
    pub reason: String,
}

impl NotificationEvent {
    /// Build the event announcing `record`.
    pub fn from_record(record: &PriceRecord, reason: impl Into<String>) -> Self {
        Self {
            topic: record.topic.clone(),
            price: record.price,
            previous_price: record.previous,
            timestamp: record.timestamp,
            reason: reason.into(),
        }
    }
}

/// Reject zero and negative prices.
pub(crate) fn ensure_positive(price: Price, what: &str) -> Result<()> {
    if price <= Decimal::ZERO {
        return Err(ExchangeError::InvalidArgument(format!(
            "{} must be greater than 0, got {}",
            what, price
        )));
    }
    Ok(())
}
