//! Append-only event log.

use crate::types::Timestamp;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One line of the audit trail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Position in the log, starting at 1.
    pub sequence: u64,

    /// When the entry was appended. Never smaller than the previous entry's.
    pub timestamp: Timestamp,

    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp, self.message)
    }
}

/// Append-only, timestamp-ordered log shared by the registry and dispatcher.
pub struct EventLog {
    entries: RwLock<Vec<LogEntry>>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Append an entry and return a copy of it.
    ///
    /// Sequence assignment and the push happen under one write lock, so
    /// concurrent appenders get distinct, gap-free sequence numbers. The
    /// timestamp is clamped to the previous entry's so the log stays ordered
    /// even if the wall clock steps back.
    pub fn append(&self, message: impl Into<String>) -> LogEntry {
        let message = message.into();
        let mut entries = self.entries.write();

        let now = Timestamp::now();
        let timestamp = match entries.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };

        let entry = LogEntry {
            sequence: entries.len() as u64 + 1,
            timestamp,
            message,
        };
        entries.push(entry.clone());

        tracing::debug!(
            target: "quotecast::audit",
            sequence = entry.sequence,
            "{}",
            entry.message
        );

        entry
    }

    /// Copy of every entry in append order.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.read().clone()
    }

    /// Entries appended after `sequence` (exclusive).
    pub fn entries_since(&self, sequence: u64) -> Vec<LogEntry> {
        let entries = self.entries.read();
        let start = (sequence as usize).min(entries.len());
        entries[start..].to_vec()
    }

    /// Sequence number of the newest entry, 0 when empty.
    pub fn last_sequence(&self) -> u64 {
        self.entries.read().len() as u64
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}
