//! Output channel for proactive messages

use super::events::ProactiveEventType;
use crate::{PawpalError, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// An unsolicited message produced by the scheduler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProactiveMessage {
    /// Event that produced it
    pub event_type: ProactiveEventType,
    /// What the companion says
    pub text: String,
    /// Tick time it was produced at
    pub at: DateTime<Local>,
}

/// Receives proactive messages
///
/// Ordering and delivery guarantees beyond a single call belong to the
/// implementation.
pub trait MessageSink: Send + Sync {
    /// Hand over one message
    fn deliver(&self, message: ProactiveMessage) -> Result<()>;
}

impl MessageSink for mpsc::UnboundedSender<ProactiveMessage> {
    fn deliver(&self, message: ProactiveMessage) -> Result<()> {
        self.send(message)
            .map_err(|_| PawpalError::scheduler("message receiver dropped"))
    }
}

/// Sink backed by a closure
pub struct FnSink<F>(pub F);

impl<F> MessageSink for FnSink<F>
where
    F: Fn(ProactiveMessage) + Send + Sync,
{
    fn deliver(&self, message: ProactiveMessage) -> Result<()> {
        (self.0)(message);
        Ok(())
    }
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl MessageSink for NullSink {
    fn deliver(&self, _message: ProactiveMessage) -> Result<()> {
        Ok(())
    }
}

/// Sink that keeps every message in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    messages: Mutex<Vec<ProactiveMessage>>,
}

impl CollectingSink {
    /// Empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything delivered so far
    pub fn messages(&self) -> Vec<ProactiveMessage> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Delivered messages for one event type
    pub fn messages_for(&self, event_type: ProactiveEventType) -> Vec<ProactiveMessage> {
        self.messages()
            .into_iter()
            .filter(|m| m.event_type == event_type)
            .collect()
    }

    /// Drop everything collected
    pub fn clear(&self) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.clear();
        }
    }
}

impl MessageSink for CollectingSink {
    fn deliver(&self, message: ProactiveMessage) -> Result<()> {
        self.messages
            .lock()
            .map_err(|_| PawpalError::poisoned("collecting sink"))?
            .push(message);
        Ok(())
    }
}
