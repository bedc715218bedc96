//! Per-event cooldown bookkeeping

use super::events::ProactiveEventType;
use crate::{PawpalError, Result};
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Last firing time of each event type
///
/// Timestamps only move forward; recording an earlier time is ignored.
#[derive(Debug, Default)]
pub struct CooldownTracker {
    last_fired: Mutex<HashMap<ProactiveEventType, DateTime<Local>>>,
}

impl CooldownTracker {
    /// Nothing fired yet
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> Result<MutexGuard<'_, HashMap<ProactiveEventType, DateTime<Local>>>> {
        self.last_fired
            .lock()
            .map_err(|_| PawpalError::poisoned("cooldowns"))
    }

    /// Whether `event` fired less than `cooldown` before `now`
    pub fn is_cooling(
        &self,
        event: ProactiveEventType,
        now: DateTime<Local>,
        cooldown: Duration,
    ) -> Result<bool> {
        let last_fired = self.guard()?;
        Ok(match last_fired.get(&event) {
            Some(last) => match now.signed_duration_since(*last).to_std() {
                Ok(elapsed) => elapsed < cooldown,
                // clock went backwards; stay cool until it catches up
                Err(_) => true,
            },
            None => false,
        })
    }

    /// Record a firing at `at`
    pub fn record(&self, event: ProactiveEventType, at: DateTime<Local>) -> Result<()> {
        let mut last_fired = self.guard()?;
        let entry = last_fired.entry(event).or_insert(at);
        if at > *entry {
            *entry = at;
        }
        Ok(())
    }

    /// Last firing of `event`
    pub fn last_fired(&self, event: ProactiveEventType) -> Result<Option<DateTime<Local>>> {
        Ok(self.guard()?.get(&event).copied())
    }
}
