//! Capability call envelope

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Named arguments passed to a capability
pub type ToolArgs = Map<String, Value>;

/// Uniform result of a capability call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the call did what was asked
    pub success: bool,

    /// Structured payload
    pub data: Map<String, Value>,

    /// Human-readable summary or diagnostic
    pub message: String,
}

impl ToolResult {
    /// Successful result
    pub fn ok(data: Map<String, Value>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
        }
    }

    /// Failed result with an empty payload
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Map::new(),
            message: message.into(),
        }
    }

    /// Look up a numeric field of the payload
    pub fn number(&self, key: &str) -> Option<f64> {
        self.data.get(key).and_then(Value::as_f64)
    }

    /// Look up a string field of the payload
    pub fn text(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

/// Build a payload from a `json!` object, dropping anything that is not an object
pub fn payload(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accessors() {
        let result = ToolResult::ok(payload(json!({"temp": 22, "condition": "晴天"})), "ok");
        assert!(result.success);
        assert_eq!(result.number("temp"), Some(22.0));
        assert_eq!(result.text("condition"), Some("晴天"));
        assert_eq!(result.text("missing"), None);
    }

    #[test]
    fn test_failure_is_empty() {
        let result = ToolResult::failure("nope");
        assert!(!result.success);
        assert!(result.data.is_empty());
        assert_eq!(result.message, "nope");
    }
}
