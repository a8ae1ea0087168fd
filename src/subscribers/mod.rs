//! Subscriber capability and reference subscribers.
//!
//! The engine only depends on [`Subscriber`]; the three concrete types here
//! are ready-made reactions that compose with it:
//! - [`TraderNotifier`]: displays every update.
//! - [`MobilePushNotifier`]: turns updates into push messages.
//! - [`TradingRobot`]: decides BUY / SELL / HOLD from per-topic thresholds.

mod mobile;
mod robot;
mod subscriber;
mod trader;

pub use mobile::MobilePushNotifier;
pub use robot::{Decision, TradingRobot};
pub use subscriber::{Subscriber, SubscriberHandle};
pub use trader::TraderNotifier;
