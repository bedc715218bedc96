//! Event handlers
//!
//! Each handler reads the capability registry and picks text from the phrase
//! tables for the companion's personality. A handler may decide there is
//! nothing to say and return `None`.

use super::events::ProactiveEventType;
use crate::clock::Clock;
use crate::phrases::{
    time_of_day_greeting, PersonalityPhrases, HUNGRY_MESSAGES, LONELY_MESSAGES,
    LOW_ENERGY_MESSAGES, PLAIN_WEATHER_COMMENTS, RAINY_COMMENTS, REMINDER_TEMPLATES,
    SUNNY_COMMENTS, TIME_GREETING_TEMPLATES, UNHAPPY_MESSAGES,
};
use crate::random::RandomSource;
use crate::tools::CapabilityRegistry;
use crate::types::Personality;
use crate::{PawpalError, Result};
use chrono::Timelike;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Hunger above this triggers a complaint
const HUNGER_ALERT: f64 = 80.0;
/// Happiness below this triggers a complaint
const HAPPINESS_ALERT: f64 = 50.0;
/// Health energy below this triggers a complaint
const ENERGY_ALERT: f64 = 30.0;

/// Produces the text for proactive events
pub struct ProactiveResponder {
    registry: Arc<CapabilityRegistry>,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
}

impl ProactiveResponder {
    /// Create over shared collaborators
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            registry,
            clock,
            random,
        }
    }

    /// Text for `event`, or `None` when there is nothing to say
    pub fn respond(&self, event: ProactiveEventType, personality: Personality) -> Result<Option<String>> {
        match event {
            ProactiveEventType::TimeGreeting => self.time_greeting(personality).map(Some),
            ProactiveEventType::HealthCheck => self.health_check(personality),
            ProactiveEventType::WeatherComment => self.weather_comment(personality),
            ProactiveEventType::ReminderCheck => self.reminder_check(personality),
            ProactiveEventType::LonelyCheck => self.phrase(&LONELY_MESSAGES, personality).map(Some),
            ProactiveEventType::EnergyCheck => self.energy_check(personality),
        }
    }

    fn phrase(&self, table: &PersonalityPhrases, personality: Personality) -> Result<String> {
        table
            .pick(personality, self.random.as_ref())
            .map(str::to_string)
            .ok_or_else(|| PawpalError::scheduler(format!("no phrases for {}", personality)))
    }

    fn time_greeting(&self, personality: Personality) -> Result<String> {
        let time = self.registry.execute_simple("get_time");
        let hour = time
            .number("hour")
            .map(|h| h as u32)
            .unwrap_or_else(|| self.clock.now().hour());
        let template = self.phrase(&TIME_GREETING_TEMPLATES, personality)?;
        Ok(template.replace("{greeting}", time_of_day_greeting(hour)))
    }

    fn health_check(&self, personality: Personality) -> Result<Option<String>> {
        let health = self.registry.execute_simple("get_health");
        if !health.success {
            debug!(message = %health.message, "Health unavailable");
            return Ok(None);
        }

        let hunger = health.number("hunger").unwrap_or(100.0);
        let happiness = health.number("happiness").unwrap_or(100.0);

        if hunger > HUNGER_ALERT {
            return self.phrase(&HUNGRY_MESSAGES, personality).map(Some);
        }
        if happiness < HAPPINESS_ALERT {
            return self.phrase(&UNHAPPY_MESSAGES, personality).map(Some);
        }
        Ok(None)
    }

    fn weather_comment(&self, personality: Personality) -> Result<Option<String>> {
        let weather = self.registry.execute_simple("get_weather");
        if !weather.success {
            return Ok(None);
        }

        let table = match weather.text("condition").unwrap_or("晴天") {
            "晴天" => &SUNNY_COMMENTS,
            "小雨" => &RAINY_COMMENTS,
            _ => &PLAIN_WEATHER_COMMENTS,
        };
        self.phrase(table, personality).map(Some)
    }

    fn reminder_check(&self, personality: Personality) -> Result<Option<String>> {
        let reminders = self.registry.execute_simple("get_reminders");
        if !reminders.success {
            return Ok(None);
        }

        let count = reminders
            .data
            .get("reminders")
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0);
        if count == 0 {
            return Ok(None);
        }

        let template = self.phrase(&REMINDER_TEMPLATES, personality)?;
        Ok(Some(template.replace("{count}", &count.to_string())))
    }

    fn energy_check(&self, personality: Personality) -> Result<Option<String>> {
        let health = self.registry.execute_simple("get_health");
        if !health.success {
            return Ok(None);
        }

        let energy = health.number("energy").unwrap_or(100.0);
        if energy < ENERGY_ALERT {
            return self.phrase(&LOW_ENERGY_MESSAGES, personality).map(Some);
        }
        Ok(None)
    }
}
