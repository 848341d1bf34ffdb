//! In-memory chat backlog per class.
//!
//! Each class keeps only its most recent [`BACKLOG_CAPACITY`] messages,
//! newest first. Nothing is persisted: a restart starts every class empty.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

pub const BACKLOG_CAPACITY: usize = 20;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub username: String,
    pub message: String,
    /// Milliseconds since epoch, as sent by the client.
    pub date: i64,
}

#[derive(Debug, Default)]
pub struct ChatStore {
    classes: RwLock<HashMap<String, VecDeque<ChatMessage>>>,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a message to the class backlog, creating it if needed, and
    /// drop whatever falls past the capacity.
    pub fn append(&self, class_id: &str, message: ChatMessage) {
        let mut classes = self.classes.write();
        let backlog = classes
            .entry(class_id.to_string())
            .or_insert_with(|| VecDeque::with_capacity(BACKLOG_CAPACITY + 1));

        backlog.push_front(message);
        backlog.truncate(BACKLOG_CAPACITY);

        debug!("Class {} backlog now {} messages", class_id, backlog.len());
    }

    /// Messages newer than `since`, newest first. Unknown classes yield an
    /// empty list.
    pub fn messages_since(&self, class_id: &str, since: i64) -> Vec<ChatMessage> {
        let classes = self.classes.read();
        classes
            .get(class_id)
            .map(|backlog| backlog.iter().filter(|m| m.date > since).cloned().collect())
            .unwrap_or_default()
    }

    pub fn class_count(&self) -> usize {
        self.classes.read().len()
    }
}

/// Parse a `since` watermark. Missing or non-numeric input reads as 0,
/// which returns every stored message.
pub fn parse_since(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok()).unwrap_or(0)
}
