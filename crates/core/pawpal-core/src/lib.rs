//! # PawPal Core
//!
//! Behaviour engine for a desktop companion pet.
//!
//! Two pieces share one companion's state:
//!
//! - the [turn workflow](workflow) turns a user message into a reply while
//!   tracking mood and energy;
//! - the [proactive scheduler](proactive) wakes on a timer and sends
//!   unsolicited, personality-flavoured messages to a sink.
//!
//! Both reach the outside world through the [capability registry](tools).
//! Text generation is pluggable through [`ResponseGenerator`]; when it fails,
//! canned phrases are used instead, so a turn never fails.
//!
//! ```no_run
//! use pawpal_core::{Companion, Personality};
//!
//! # async fn demo() -> pawpal_core::Result<()> {
//! let companion = Companion::builder(Personality::Clingy).build()?;
//! let state = companion.invoke("你好").await;
//! println!("{:?} {}", state.mood, state.energy);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod companion;
pub mod config;
pub mod error;
pub mod generator;
pub mod history;
pub mod lexicon;
pub mod phrases;
pub mod proactive;
pub mod random;
pub mod tools;
pub mod types;
pub mod workflow;

pub use clock::{Clock, ManualClock, SystemClock};
pub use companion::{Companion, CompanionBuilder};
pub use config::{
    get_env_bool, get_env_float, get_env_int, get_env_or, load_env, load_env_from_path,
    PawpalConfig, SchedulerConfig, WorkflowConfig,
};
pub use error::{PawpalError, Result};
pub use generator::{fallback_greeting, fallback_reply, ResponseGenerator, TemplateGenerator};
pub use history::{HistoryEntry, HistoryStore, InMemoryHistoryStore};
pub use lexicon::{IntentCategory, Lexicon, ToolTrigger};
pub use proactive::{
    CollectingSink, FnSink, MessageSink, NullSink, ProactiveEventType, ProactiveMessage,
    ProactiveScheduler, TickReport,
};
pub use random::{FixedRandom, RandomSource, SeededRandom, ThreadRandom};
pub use tools::{Capability, CapabilityRegistry};
pub use types::{
    parse_timestamp, payload, CompanionState, CompanionStatus, Message, Mood, Personality, Role,
    ToolArgs, ToolResult, MAX_ENERGY, MIN_ENERGY,
};
pub use workflow::{TurnWorkflow, WorkflowNode};
