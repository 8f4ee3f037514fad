//! Bounded per-app log history
//!
//! Each registry record owns one [`LogHistory`]: a fixed-capacity sequence of
//! captured lines, oldest evicted first. Concurrent access (two capture tasks
//! plus the supervisor's announcement lines plus `clear` from the dashboard)
//! is serialized by the owning record's lock, so pushes are atomic with
//! respect to each other and the structure can never exceed its bound.

use schema::LogStream;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default retained-line capacity per app
pub const DEFAULT_LOG_CAPACITY: usize = 1000;

/// A single log line captured from an app's stdout/stderr
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LogLine {
    /// Monotonic sequence number, assigned on push
    pub seq: u64,
    /// Stream the line arrived on
    pub stream: LogStream,
    /// Line content without trailing newline
    pub content: String,
    /// Wall-clock time the line completed, RFC3339
    pub timestamp: String,
}

impl LogLine {
    /// Build a line stamped with the current wall-clock time
    pub fn now(stream: LogStream, content: impl Into<String>) -> Self {
        Self {
            seq: 0, // assigned by the history on push
            stream,
            content: content.into(),
            timestamp: schema::AppEvent::current_timestamp(),
        }
    }
}

/// Fixed-capacity, oldest-evicted-first sequence of captured lines
#[derive(Debug)]
pub struct LogHistory {
    capacity: usize,
    total_dropped: u64,
    next_seq: u64,
    lines: VecDeque<LogLine>,
}

impl LogHistory {
    /// Create a history with the given capacity (must be > 0)
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "LogHistory capacity must be > 0");
        Self {
            capacity,
            total_dropped: 0,
            next_seq: 0,
            lines: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a line, assigning the next sequence number. O(1) amortized.
    /// When full, the oldest line is evicted and the drop counter bumped.
    pub fn push(&mut self, mut line: LogLine) {
        line.seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);

        if self.lines.len() == self.capacity {
            self.lines.pop_front();
            self.total_dropped = self.total_dropped.saturating_add(1);
        }
        self.lines.push_back(line);
    }

    /// Last `max` lines in arrival order
    pub fn snapshot(&self, max: usize) -> Vec<LogLine> {
        let skip = self.lines.len().saturating_sub(max);
        self.lines.iter().skip(skip).cloned().collect()
    }

    /// Drop every retained line. Sequence numbers keep counting so a reader
    /// holding an old snapshot can tell cleared history from fresh lines.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Current number of retained lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the history is empty
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total lines ever evicted due to capacity
    pub fn total_dropped(&self) -> u64 {
        self.total_dropped
    }
}

impl Default for LogHistory {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}
