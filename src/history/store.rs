//! Bounded, append-only log of sent and received chat lines.

use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::fmt;

use crate::config::DEFAULT_HISTORY_CAPACITY;

/// Timestamp layout used in history lines and export headers.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Whether a history line was written by this node or received from a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Sent => write!(f, "SENT"),
            Direction::Received => write!(f, "RECV"),
        }
    }
}

/// One immutable history record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    timestamp: DateTime<Local>,
    direction: Direction,
    text: String,
}

impl HistoryEntry {
    pub fn new(direction: Direction, text: impl Into<String>) -> Self {
        Self::at(Local::now(), direction, text)
    }

    pub fn at(timestamp: DateTime<Local>, direction: Direction, text: impl Into<String>) -> Self {
        Self {
            timestamp,
            direction,
            text: text.into(),
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Formats as `[yyyy-mm-dd HH:MM:SS] [SENT|RECV] text`.
impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] [{}] {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.direction,
            self.text
        )
    }
}

/// Ordered history with FIFO eviction once `capacity` is exceeded.
///
/// Not synchronized itself; the node shares it as `Arc<Mutex<HistoryLog>>`.
#[derive(Debug)]
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryLog {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
            capacity,
        }
    }

    /// Appends `entry`, dropping the oldest entries while over capacity.
    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Shorthand for `append(HistoryEntry::new(direction, text))`.
    pub fn record(&mut self, direction: Direction, text: impl Into<String>) {
        self.append(HistoryEntry::new(direction, text));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The most recent `k` entries, oldest first.
    pub fn tail(&self, k: usize) -> Vec<HistoryEntry> {
        let start = self.entries.len().saturating_sub(k);
        self.entries.iter().skip(start).cloned().collect()
    }

    /// Every entry formatted for export, oldest first.
    pub fn export_lines(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
