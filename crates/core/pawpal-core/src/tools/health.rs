//! Pet health counters and the capabilities that read or change them
//!
//! Counters live in `[0, 100]`. They are touched from both the turn workflow
//! and the scheduler, so every read-modify-write happens under one lock.

use super::Capability;
use crate::clock::Clock;
use crate::types::{payload, ToolArgs, ToolResult};
use crate::{PawpalError, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

const MIN_LEVEL: f64 = 0.0;
const MAX_LEVEL: f64 = 100.0;

/// Snapshot of the health counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Satiety; rises when fed and drifts up over time
    pub hunger: f64,
    /// Hydration
    pub thirst: f64,
    /// Happiness; rises with food and play, falls over time
    pub happiness: f64,
    /// Energy; spent by play, recovered over time
    pub energy: f64,
    /// Last feeding (RFC 3339)
    pub last_feed: Option<String>,
    /// Last play session (RFC 3339)
    pub last_play: Option<String>,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            hunger: MAX_LEVEL,
            thirst: MAX_LEVEL,
            happiness: MAX_LEVEL,
            energy: MAX_LEVEL,
            last_feed: None,
            last_play: None,
        }
    }
}

impl HealthStatus {
    fn clamp(&mut self) {
        self.hunger = self.hunger.clamp(MIN_LEVEL, MAX_LEVEL);
        self.thirst = self.thirst.clamp(MIN_LEVEL, MAX_LEVEL);
        self.happiness = self.happiness.clamp(MIN_LEVEL, MAX_LEVEL);
        self.energy = self.energy.clamp(MIN_LEVEL, MAX_LEVEL);
    }

    fn summary(&self) -> String {
        format!(
            "健康状态：饥饿{}%，口渴{}%，快乐{}%，精力{}%",
            self.hunger, self.thirst, self.happiness, self.energy
        )
    }

    fn to_result(&self, message: impl Into<String>) -> Result<ToolResult> {
        Ok(ToolResult::ok(payload(serde_json::to_value(self)?), message))
    }
}

/// Owner of the health counters
#[derive(Debug, Default)]
pub struct HealthMonitor {
    status: Mutex<HealthStatus>,
}

impl HealthMonitor {
    /// All counters full
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from explicit counters (clamped)
    pub fn with_status(mut status: HealthStatus) -> Self {
        status.clamp();
        Self {
            status: Mutex::new(status),
        }
    }

    fn guard(&self) -> Result<MutexGuard<'_, HealthStatus>> {
        self.status.lock().map_err(|_| PawpalError::poisoned("health"))
    }

    /// Current counters
    pub fn snapshot(&self) -> Result<HealthStatus> {
        Ok(self.guard()?.clone())
    }

    /// Feed: hunger +30, happiness +10
    pub fn feed(&self, now: DateTime<Local>) -> Result<HealthStatus> {
        let mut status = self.guard()?;
        status.hunger += 30.0;
        status.happiness += 10.0;
        status.last_feed = Some(now.to_rfc3339());
        status.clamp();
        Ok(status.clone())
    }

    /// Play: happiness +20, energy -10
    pub fn play(&self, now: DateTime<Local>) -> Result<HealthStatus> {
        let mut status = self.guard()?;
        status.happiness += 20.0;
        status.energy -= 10.0;
        status.last_play = Some(now.to_rfc3339());
        status.clamp();
        Ok(status.clone())
    }

    /// One step of drift over time
    pub fn decay(&self) -> Result<()> {
        let mut status = self.guard()?;
        status.hunger += 1.0;
        status.thirst += 1.0;
        status.happiness -= 0.5;
        status.energy += 0.5;
        status.clamp();
        Ok(())
    }
}

/// `get_health`
pub struct GetHealthCapability {
    monitor: Arc<HealthMonitor>,
}

impl GetHealthCapability {
    /// Create over shared counters
    pub fn new(monitor: Arc<HealthMonitor>) -> Self {
        Self { monitor }
    }
}

impl Capability for GetHealthCapability {
    fn name(&self) -> &str {
        "get_health"
    }

    fn description(&self) -> &str {
        "Current hunger, thirst, happiness and energy"
    }

    fn execute(&self, _args: &ToolArgs) -> Result<ToolResult> {
        let status = self.monitor.snapshot()?;
        status.to_result(status.summary())
    }

    fn health_monitor(&self) -> Option<Arc<HealthMonitor>> {
        Some(self.monitor.clone())
    }
}

/// `feed_pet`
pub struct FeedPetCapability {
    monitor: Arc<HealthMonitor>,
    clock: Arc<dyn Clock>,
}

impl FeedPetCapability {
    /// Create over shared counters
    pub fn new(monitor: Arc<HealthMonitor>, clock: Arc<dyn Clock>) -> Self {
        Self { monitor, clock }
    }
}

impl Capability for FeedPetCapability {
    fn name(&self) -> &str {
        "feed_pet"
    }

    fn description(&self) -> &str {
        "Feed the pet"
    }

    fn execute(&self, _args: &ToolArgs) -> Result<ToolResult> {
        self.monitor
            .feed(self.clock.now())?
            .to_result("宠物吃饱了，很开心！")
    }
}

/// `play_with_pet`
pub struct PlayCapability {
    monitor: Arc<HealthMonitor>,
    clock: Arc<dyn Clock>,
}

impl PlayCapability {
    /// Create over shared counters
    pub fn new(monitor: Arc<HealthMonitor>, clock: Arc<dyn Clock>) -> Self {
        Self { monitor, clock }
    }
}

impl Capability for PlayCapability {
    fn name(&self) -> &str {
        "play_with_pet"
    }

    fn description(&self) -> &str {
        "Play with the pet"
    }

    fn execute(&self, _args: &ToolArgs) -> Result<ToolResult> {
        self.monitor
            .play(self.clock.now())?
            .to_result("和宠物玩耍很开心！")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;

    #[test]
    fn test_play_and_feed_stay_in_range() {
        let monitor = HealthMonitor::new();
        for _ in 0..15 {
            monitor.play(Local::now()).unwrap();
        }
        let status = monitor.snapshot().unwrap();
        assert_eq!(status.energy, 0.0);
        assert_eq!(status.happiness, 100.0);
        assert!(status.last_play.is_some());

        let status = monitor.feed(Local::now()).unwrap();
        assert_eq!(status.hunger, 100.0);
        assert!(status.last_feed.is_some());
    }

    #[test]
    fn test_decay_step() {
        let monitor = HealthMonitor::with_status(HealthStatus {
            hunger: 50.0,
            thirst: 99.5,
            happiness: 0.2,
            energy: 10.0,
            ..HealthStatus::default()
        });
        monitor.decay().unwrap();
        let status = monitor.snapshot().unwrap();
        assert_eq!(status.hunger, 51.0);
        assert_eq!(status.thirst, 100.0);
        assert_eq!(status.happiness, 0.0);
        assert_eq!(status.energy, 10.5);
    }

    #[test]
    fn test_with_status_clamps() {
        let monitor = HealthMonitor::with_status(HealthStatus {
            energy: 250.0,
            hunger: -4.0,
            ..HealthStatus::default()
        });
        let status = monitor.snapshot().unwrap();
        assert_eq!(status.energy, 100.0);
        assert_eq!(status.hunger, 0.0);
    }

    #[test]
    fn test_capabilities_share_counters() {
        let monitor = Arc::new(HealthMonitor::new());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        PlayCapability::new(monitor.clone(), clock.clone())
            .execute(&ToolArgs::new())
            .unwrap();

        let result = GetHealthCapability::new(monitor)
            .execute(&ToolArgs::new())
            .unwrap();
        assert_eq!(result.number("energy"), Some(90.0));
        assert_eq!(result.message, "健康状态：饥饿100%，口渴100%，快乐100%，精力90%");
    }
}
