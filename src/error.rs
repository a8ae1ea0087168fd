//! Error types for the exchange.

use std::time::Duration;
use thiserror::Error;

/// Main error type for exchange operations.
///
/// Every variant is raised before any state is touched, so a rejected call
/// leaves prices, subscriptions and the event log unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Why a single notification did not complete.
///
/// Delivery failures never fail the price update that caused them; they are
/// recorded in the event log and the dispatch report instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("subscriber rejected the update: {0}")]
    Rejected(String),

    #[error("no answer within {0:?}")]
    TimedOut(Duration),

    #[error("previous notification still running")]
    Busy,

    #[error("subscriber panicked: {0}")]
    Panicked(String),

    #[error("could not start notification: {0}")]
    Spawn(String),
}

impl DeliveryError {
    /// Convenience constructor for subscriber implementations.
    pub fn rejected(reason: impl Into<String>) -> Self {
        DeliveryError::Rejected(reason.into())
    }
}

/// Result type for exchange operations.
pub type Result<T> = std::result::Result<T, ExchangeError>;
