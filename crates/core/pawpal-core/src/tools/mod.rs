//! Capability registry
//!
//! Named operations shared by the turn workflow and the proactive scheduler.
//! Every call returns a [`ToolResult`]; lookup misses, argument errors and
//! internal failures are folded into `success = false` at the registry
//! boundary and never reach the caller as an `Err` or a panic.

pub mod health;
pub mod reminders;
pub mod time;
pub mod weather;

pub use health::{FeedPetCapability, GetHealthCapability, HealthMonitor, HealthStatus, PlayCapability};
pub use reminders::{
    AddReminderCapability, CompleteReminderCapability, GetRemindersCapability, Reminder,
    ReminderBook,
};
pub use time::TimeCapability;
pub use weather::{lookup_weather, WeatherCapability, WeatherReport};

use crate::clock::Clock;
use crate::types::{ToolArgs, ToolResult};
use crate::{PawpalError, Result};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::debug;

/// A named operation callable through the registry
pub trait Capability: Send + Sync {
    /// Stable name used for lookup
    fn name(&self) -> &str;

    /// One-line description
    fn description(&self) -> &str;

    /// Run with named arguments
    fn execute(&self, args: &ToolArgs) -> Result<ToolResult>;

    /// Health counters this capability reports on, if any
    fn health_monitor(&self) -> Option<Arc<HealthMonitor>> {
        None
    }
}

/// Name-keyed set of capabilities plus the state they share
pub struct CapabilityRegistry {
    capabilities: BTreeMap<String, Arc<dyn Capability>>,
    health: Arc<HealthMonitor>,
    reminders: Arc<ReminderBook>,
}

impl CapabilityRegistry {
    /// Registry with nothing registered
    pub fn empty() -> Self {
        Self {
            capabilities: BTreeMap::new(),
            health: Arc::new(HealthMonitor::new()),
            reminders: Arc::new(ReminderBook::new()),
        }
    }

    /// Registry with the built-in capabilities
    ///
    /// `default_location` is used by `get_weather` when no location is given.
    pub fn with_defaults(clock: Arc<dyn Clock>, default_location: impl Into<String>) -> Self {
        let mut registry = Self::empty();
        let health = registry.health.clone();
        let reminders = registry.reminders.clone();

        registry.register(Arc::new(TimeCapability::new(clock.clone())));
        registry.register(Arc::new(WeatherCapability::new(default_location)));
        registry.register(Arc::new(AddReminderCapability::new(
            reminders.clone(),
            clock.clone(),
        )));
        registry.register(Arc::new(GetRemindersCapability::new(reminders.clone())));
        registry.register(Arc::new(CompleteReminderCapability::new(reminders)));
        registry.register(Arc::new(GetHealthCapability::new(health.clone())));
        registry.register(Arc::new(FeedPetCapability::new(health.clone(), clock.clone())));
        registry.register(Arc::new(PlayCapability::new(health, clock)));
        registry
    }

    /// Add or replace a capability
    pub fn register(&mut self, capability: Arc<dyn Capability>) {
        let name = capability.name().to_string();
        if self.capabilities.insert(name.clone(), capability).is_some() {
            debug!(tool = %name, "Replaced capability");
        }
    }

    /// Call `name` with `args`
    pub fn execute(&self, name: &str, args: &ToolArgs) -> ToolResult {
        let Some(capability) = self.capabilities.get(name) else {
            debug!(tool = name, "Unknown capability");
            return ToolResult::failure(PawpalError::UnknownCapability(name.to_string()).to_string());
        };

        match catch_unwind(AssertUnwindSafe(|| capability.execute(args))) {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                debug!(tool = name, error = %e, "Capability failed");
                ToolResult::failure(e.to_string())
            }
            Err(_) => {
                debug!(tool = name, "Capability panicked");
                ToolResult::failure(PawpalError::capability(format!("{} panicked", name)).to_string())
            }
        }
    }

    /// Call `name` without arguments
    pub fn execute_simple(&self, name: &str) -> ToolResult {
        self.execute(name, &ToolArgs::new())
    }

    /// Registered names, sorted
    pub fn names(&self) -> BTreeSet<String> {
        self.capabilities.keys().cloned().collect()
    }

    /// `(name, description)` for every capability, sorted by name
    pub fn describe(&self) -> Vec<(String, String)> {
        self.capabilities
            .values()
            .map(|c| (c.name().to_string(), c.description().to_string()))
            .collect()
    }

    /// Whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.capabilities.contains_key(name)
    }

    /// Apply one step of decay to the counters `get_health` reports
    pub fn decay_health(&self) -> Result<()> {
        self.health().decay()
    }

    /// Counters behind the registered `get_health`, else the registry's own
    pub fn health(&self) -> Arc<HealthMonitor> {
        self.capabilities
            .get("get_health")
            .and_then(|c| c.health_monitor())
            .unwrap_or_else(|| self.health.clone())
    }

    /// Shared reminder list
    pub fn reminders(&self) -> &Arc<ReminderBook> {
        &self.reminders
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("capabilities", &self.names())
            .finish()
    }
}

/// Required string argument
pub fn required_str<'a>(args: &'a ToolArgs, field: &str) -> Result<&'a str> {
    match args.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.as_str()),
        Some(Value::String(_)) => Err(PawpalError::invalid_argument(field, "must not be empty")),
        Some(_) => Err(PawpalError::invalid_argument(field, "expected a string")),
        None => Err(PawpalError::invalid_argument(field, "missing")),
    }
}

/// Optional string argument
pub fn optional_str<'a>(args: &'a ToolArgs, field: &str) -> Result<Option<&'a str>> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(PawpalError::invalid_argument(field, "expected a string")),
    }
}

/// Required non-negative integer argument; numeric strings are accepted
pub fn required_u64(args: &ToolArgs, field: &str) -> Result<u64> {
    match args.get(field) {
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| PawpalError::invalid_argument(field, "expected a non-negative integer")),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| PawpalError::invalid_argument(field, "expected a non-negative integer")),
        Some(_) => Err(PawpalError::invalid_argument(field, "expected a non-negative integer")),
        None => Err(PawpalError::invalid_argument(field, "missing")),
    }
}
