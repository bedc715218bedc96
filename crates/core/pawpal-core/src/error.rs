//! Error types for PawPal core

use thiserror::Error;

/// Main error type for PawPal operations
#[derive(Debug, Error)]
pub enum PawpalError {
    /// Response generator failed or returned nothing usable
    #[error("Generator error: {0}")]
    Generator(String),

    /// A capability ran but could not complete
    #[error("Capability error: {0}")]
    Capability(String),

    /// Capability lookup miss
    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    /// Proactive event lookup miss
    #[error("Unknown proactive event: {0}")]
    UnknownEvent(String),

    /// Personality tag outside the closed set
    #[error("Invalid personality: {0}")]
    InvalidPersonality(String),

    /// Missing or malformed capability argument
    #[error("Invalid argument '{field}': {message}")]
    InvalidArgument {
        /// Argument name
        field: String,
        /// What was wrong with it
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Timeout error
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Scheduler tick or lifecycle error
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// A guarded piece of shared state was poisoned by a panicking holder
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenient Result type using PawpalError
pub type Result<T> = std::result::Result<T, PawpalError>;

impl PawpalError {
    /// Create a generator error
    pub fn generator(msg: impl Into<String>) -> Self {
        PawpalError::Generator(msg.into())
    }

    /// Create a capability error
    pub fn capability(msg: impl Into<String>) -> Self {
        PawpalError::Capability(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        PawpalError::Config(msg.into())
    }

    /// Create a scheduler error
    pub fn scheduler(msg: impl Into<String>) -> Self {
        PawpalError::Scheduler(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        PawpalError::Timeout(msg.into())
    }

    /// Create an invalid-argument error
    pub fn invalid_argument(field: impl Into<String>, message: impl Into<String>) -> Self {
        PawpalError::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a lock-poisoned error for the named resource
    pub fn poisoned(resource: impl Into<String>) -> Self {
        PawpalError::LockPoisoned(resource.into())
    }

    /// Whether the error came from the response generator path
    pub fn is_generator_failure(&self) -> bool {
        matches!(self, PawpalError::Generator(_) | PawpalError::Timeout(_))
    }
}
