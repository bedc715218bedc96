//! Proactive event types and their trigger rules

use crate::random::RandomSource;
use crate::types::Personality;
use crate::PawpalError;
use chrono::{DateTime, Local, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Kinds of unsolicited message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProactiveEventType {
    /// Good morning / afternoon / evening
    TimeGreeting,
    /// Complain when hungry or unhappy
    HealthCheck,
    /// Remark on the weather
    WeatherComment,
    /// Mention pending reminders
    ReminderCheck,
    /// Miss the owner
    LonelyCheck,
    /// Complain when tired
    EnergyCheck,
}

impl ProactiveEventType {
    /// Every event type, in evaluation order
    pub const ALL: [ProactiveEventType; 6] = [
        ProactiveEventType::TimeGreeting,
        ProactiveEventType::HealthCheck,
        ProactiveEventType::WeatherComment,
        ProactiveEventType::ReminderCheck,
        ProactiveEventType::LonelyCheck,
        ProactiveEventType::EnergyCheck,
    ];

    /// Stable snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            ProactiveEventType::TimeGreeting => "time_greeting",
            ProactiveEventType::HealthCheck => "health_check",
            ProactiveEventType::WeatherComment => "weather_comment",
            ProactiveEventType::ReminderCheck => "reminder_check",
            ProactiveEventType::LonelyCheck => "lonely_check",
            ProactiveEventType::EnergyCheck => "energy_check",
        }
    }

    /// Trigger rule for this event
    pub fn spec(&self) -> EventSpec {
        match self {
            ProactiveEventType::TimeGreeting => EventSpec {
                priority: 3,
                cooldown: Duration::from_secs(3600),
                readiness: Readiness::AtHours(&[8, 12, 18, 22]),
            },
            ProactiveEventType::HealthCheck => EventSpec {
                priority: 4,
                cooldown: Duration::from_secs(1800),
                readiness: Readiness::Always,
            },
            ProactiveEventType::WeatherComment => EventSpec {
                priority: 2,
                cooldown: Duration::from_secs(7200),
                readiness: Readiness::AtHours(&[7, 19]),
            },
            ProactiveEventType::ReminderCheck => EventSpec {
                priority: 5,
                cooldown: Duration::from_secs(900),
                readiness: Readiness::Always,
            },
            ProactiveEventType::LonelyCheck => EventSpec {
                priority: 4,
                cooldown: Duration::from_secs(1800),
                readiness: Readiness::PersonalityChance,
            },
            ProactiveEventType::EnergyCheck => EventSpec {
                priority: 3,
                cooldown: Duration::from_secs(1200),
                readiness: Readiness::Always,
            },
        }
    }
}

impl fmt::Display for ProactiveEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProactiveEventType {
    type Err = PawpalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == wanted)
            .ok_or_else(|| PawpalError::UnknownEvent(s.to_string()))
    }
}

/// When an event is ready, ignoring its cooldown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Every tick
    Always,
    /// Only during the listed local hours
    AtHours(&'static [u32]),
    /// Random draw against the personality's lonely probability
    PersonalityChance,
}

/// Static trigger rule of an event type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSpec {
    /// 1 (low) to 5 (high); informational, does not affect firing order
    pub priority: u8,
    /// Minimum time between two firings
    pub cooldown: Duration,
    /// Readiness condition
    pub readiness: Readiness,
}

impl EventSpec {
    /// Whether the condition holds at `now`; draws from `random` only for
    /// chance-based rules
    pub fn is_ready(
        &self,
        now: DateTime<Local>,
        personality: Personality,
        random: &dyn RandomSource,
    ) -> bool {
        match self.readiness {
            Readiness::Always => true,
            Readiness::AtHours(hours) => hours.contains(&now.hour()),
            Readiness::PersonalityChance => random.chance(personality.lonely_probability()),
        }
    }
}

/// A ready event, built during a tick and consumed immediately
#[derive(Debug, Clone, PartialEq)]
pub struct ProactiveEvent {
    /// Which event
    pub event_type: ProactiveEventType,
    /// Informational priority
    pub priority: u8,
    /// Conditions it was evaluated under
    pub conditions: EventConditions,
    /// Cooldown that applies after it fires
    pub cooldown: Duration,
}

impl ProactiveEvent {
    /// Build from the event's static rule
    pub fn new(event_type: ProactiveEventType, conditions: EventConditions) -> Self {
        let spec = event_type.spec();
        Self {
            event_type,
            priority: spec.priority,
            conditions,
            cooldown: spec.cooldown,
        }
    }
}

/// Snapshot of what an event was evaluated against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventConditions {
    /// Tick time
    pub at: DateTime<Local>,
    /// Companion personality
    pub personality: Personality,
}
