//! `get_time`

use super::Capability;
use crate::clock::Clock;
use crate::types::{payload, ToolArgs, ToolResult};
use crate::Result;
use chrono::Timelike;
use serde_json::json;
use std::sync::Arc;

/// Reports the local time and which part of the day it is
pub struct TimeCapability {
    clock: Arc<dyn Clock>,
}

impl TimeCapability {
    /// Create over a clock
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl Capability for TimeCapability {
    fn name(&self) -> &str {
        "get_time"
    }

    fn description(&self) -> &str {
        "Current local time, weekday and part of day"
    }

    fn execute(&self, _args: &ToolArgs) -> Result<ToolResult> {
        let now = self.clock.now();
        let hour = now.hour();
        let time = now.format("%H:%M").to_string();
        let weekday = now.format("%A").to_string();
        let is_night = hour >= 22 || hour < 6;

        let data = payload(json!({
            "hour": hour,
            "minute": now.minute(),
            "weekday": &weekday,
            "date": now.format("%Y-%m-%d").to_string(),
            "time": &time,
            "is_morning": (6..12).contains(&hour),
            "is_afternoon": (12..18).contains(&hour),
            "is_evening": (18..22).contains(&hour),
            "is_night": is_night,
        }));

        Ok(ToolResult::ok(data, format!("现在是{}，{}", time, weekday)))
    }
}
