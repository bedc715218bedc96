//! Core data model

pub mod message;
pub mod personality;
pub mod state;
pub mod tool;

pub use message::{Message, Role};
pub use personality::{Mood, Personality};
pub use state::{parse_timestamp, CompanionState, CompanionStatus, MAX_ENERGY, MIN_ENERGY};
pub use tool::{payload, ToolArgs, ToolResult};
