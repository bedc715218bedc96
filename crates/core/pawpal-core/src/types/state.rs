//! Companion state record carried through a turn

use super::message::Message;
use super::personality::{Mood, Personality};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Lower bound of the energy counter
pub const MIN_ENERGY: i32 = 0;
/// Upper bound of the energy counter
pub const MAX_ENERGY: i32 = 100;

/// Mood, energy and conversation of one companion
///
/// Created per turn or carried forward by the caller. Only the turn workflow
/// mutates it, one node at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanionState {
    /// Conversation so far, oldest first
    #[serde(default)]
    pub messages: Vec<Message>,

    /// Temperament
    pub personality: Personality,

    /// Mood after the last update
    #[serde(default)]
    pub mood: Mood,

    /// Vitality in `[MIN_ENERGY, MAX_ENERGY]`
    pub energy: i32,

    /// Timestamp of the last reply, as written by the workflow (RFC 3339)
    ///
    /// Kept as text so values arriving from outside can be malformed; a
    /// value that does not parse imposes no idle constraint.
    #[serde(default)]
    pub last_interaction: Option<String>,

    /// Transient per-turn values (intent, tool outputs, route)
    #[serde(default)]
    pub context: HashMap<String, Value>,
}

impl CompanionState {
    /// Fresh state: no messages, neutral mood, full energy
    pub fn new(personality: Personality) -> Self {
        Self {
            messages: Vec::new(),
            personality,
            mood: Mood::Neutral,
            energy: MAX_ENERGY,
            last_interaction: None,
            context: HashMap::new(),
        }
    }

    /// Set the starting energy (clamped)
    pub fn with_energy(mut self, energy: i32) -> Self {
        self.set_energy(energy);
        self
    }

    /// Set the last interaction timestamp
    pub fn with_last_interaction(mut self, at: impl Into<String>) -> Self {
        self.last_interaction = Some(at.into());
        self
    }

    /// Append messages
    pub fn with_messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    /// Store energy clamped into range
    pub fn set_energy(&mut self, energy: i32) {
        self.energy = energy.clamp(MIN_ENERGY, MAX_ENERGY);
    }

    /// Most recent user message anywhere in the conversation
    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.is_user())
    }

    /// Drop the oldest messages so at most `max` remain
    pub fn retain_recent(&mut self, max: usize) {
        let excess = self.messages.len().saturating_sub(max);
        if excess > 0 {
            self.messages.drain(..excess);
        }
    }

    /// Parsed `last_interaction`, `None` when absent or malformed
    pub fn last_interaction_at(&self) -> Option<DateTime<Local>> {
        self.last_interaction.as_deref().and_then(parse_timestamp)
    }

    /// Record `now` as the last interaction
    pub fn touch(&mut self, now: DateTime<Local>) {
        self.last_interaction = Some(now.to_rfc3339());
    }

    /// Write a context value
    pub fn set_context(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.context.insert(key.into(), value.into());
    }

    /// Read a context value as text
    pub fn context_str(&self, key: &str) -> Option<&str> {
        self.context.get(key).and_then(Value::as_str)
    }

    /// Snapshot for status queries
    pub fn status(&self) -> CompanionStatus {
        CompanionStatus {
            personality: self.personality,
            mood: self.mood,
            energy: self.energy,
            last_interaction: self.last_interaction.clone(),
        }
    }
}

/// Externally visible summary of a companion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanionStatus {
    /// Temperament
    pub personality: Personality,
    /// Current mood
    pub mood: Mood,
    /// Current energy
    pub energy: i32,
    /// Last interaction timestamp as stored
    pub last_interaction: Option<String>,
}

/// Parse an interaction timestamp.
///
/// Accepts RFC 3339 and zone-less ISO 8601 (read as local time).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Local));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
}
