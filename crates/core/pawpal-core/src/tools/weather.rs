//! `get_weather`, simulated from a fixed city table

use super::{optional_str, Capability};
use crate::types::{ToolArgs, ToolResult};
use crate::Result;
use serde::{Deserialize, Serialize};

/// Simulated conditions for a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    /// Degrees Celsius
    pub temp: i32,
    /// Short condition text (晴天, 多云, 小雨, ...)
    pub condition: String,
    /// Relative humidity percent
    pub humidity: u8,
}

/// Conditions for `location`; unknown places get a mild sunny default
pub fn lookup_weather(location: &str) -> WeatherReport {
    let (temp, condition, humidity) = match location {
        "北京" => (22, "晴天", 45),
        "上海" => (25, "多云", 60),
        "深圳" => (28, "小雨", 75),
        "杭州" => (24, "晴天", 50),
        _ => (20, "晴天", 50),
    };
    WeatherReport {
        temp,
        condition: condition.to_string(),
        humidity,
    }
}

/// Weather lookup with an optional `location` argument
pub struct WeatherCapability {
    default_location: String,
}

impl WeatherCapability {
    /// Create with the location used when none is given
    pub fn new(default_location: impl Into<String>) -> Self {
        Self {
            default_location: default_location.into(),
        }
    }
}

impl Capability for WeatherCapability {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Simulated weather for a city"
    }

    fn execute(&self, args: &ToolArgs) -> Result<ToolResult> {
        let location = optional_str(args, "location")?
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(self.default_location.as_str());
        let report = lookup_weather(location);
        let message = format!(
            "{}今天{}，温度{}°C，湿度{}%",
            location, report.condition, report.temp, report.humidity
        );

        let mut data = crate::types::payload(serde_json::to_value(&report)?);
        data.insert("location".to_string(), location.into());
        Ok(ToolResult::ok(data, message))
    }
}
