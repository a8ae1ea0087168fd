//! Audit trail of registry and dispatch operations.
//!
//! Entries are appended in the order operations happen and are never
//! reordered or edited afterwards.

mod log;

pub use log::{EventLog, LogEntry};
