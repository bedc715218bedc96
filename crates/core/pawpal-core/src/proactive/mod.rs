//! Proactive behaviour: events, cooldowns, handlers and the background loop

pub mod cooldown;
pub mod events;
pub mod responder;
pub mod scheduler;
pub mod sink;

pub use cooldown::CooldownTracker;
pub use events::{EventConditions, EventSpec, ProactiveEvent, ProactiveEventType, Readiness};
pub use responder::ProactiveResponder;
pub use scheduler::{ProactiveScheduler, ProactiveSchedulerBuilder, TickReport};
pub use sink::{CollectingSink, FnSink, MessageSink, NullSink, ProactiveMessage};
