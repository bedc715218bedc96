//! Conversation history handed to the response generator

use crate::types::{Message, Role};
use crate::{PawpalError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;

/// One completed exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// What the user said
    pub user_input: String,
    /// What the companion answered
    pub pet_response: String,
}

impl HistoryEntry {
    /// Create an entry
    pub fn new(user_input: impl Into<String>, pet_response: impl Into<String>) -> Self {
        Self {
            user_input: user_input.into(),
            pet_response: pet_response.into(),
        }
    }
}

/// Source of past exchanges for a companion
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Up to `limit` most recent entries, oldest first
    async fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>>;

    /// Append a completed exchange
    async fn record(&self, entry: HistoryEntry) -> Result<()>;
}

/// Bounded in-memory history
#[derive(Debug)]
pub struct InMemoryHistoryStore {
    capacity: usize,
    entries: Mutex<VecDeque<HistoryEntry>>,
}

impl InMemoryHistoryStore {
    /// Keep at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::new()),
        }
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryHistoryStore {
    fn default() -> Self {
        Self::new(100)
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| PawpalError::poisoned("history"))?;
        let skip = entries.len().saturating_sub(limit);
        Ok(entries.iter().skip(skip).cloned().collect())
    }

    async fn record(&self, entry: HistoryEntry) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| PawpalError::poisoned("history"))?;
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
        Ok(())
    }
}

/// Pair each user message with the assistant reply that follows it.
///
/// System messages are skipped; a user message with no reply is dropped.
/// Returns the last `limit` pairs, oldest first.
pub fn pairs_from_messages(messages: &[Message], limit: usize) -> Vec<HistoryEntry> {
    let mut pairs = Vec::new();
    let mut pending: Option<&str> = None;

    for message in messages {
        match message.role {
            Role::User => pending = Some(message.content.as_str()),
            Role::Assistant => {
                if let Some(user_input) = pending.take() {
                    pairs.push(HistoryEntry::new(user_input, message.content.as_str()));
                }
            }
            Role::System => {}
        }
    }

    let skip = pairs.len().saturating_sub(limit);
    pairs.split_off(skip)
}
