//! Notification fan-out.
//!
//! One price update becomes one notification per eligible subscription,
//! each running as its own unit of work. The dispatcher joins them all
//! before returning, so "price updated" and "subscribers notified" are a
//! single step from the caller's point of view.

mod dispatcher;
mod report;

pub use dispatcher::NotificationDispatcher;
pub use report::DispatchReport;
