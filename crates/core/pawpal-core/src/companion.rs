//! Companion facade
//!
//! Owns one companion's carried-forward state, its capability registry, its
//! turn workflow and its proactive scheduler, and exposes the operations a
//! transport layer needs. Turns are serialized through an async mutex over the
//! state, so concurrent callers never interleave inside a turn.

use crate::clock::{Clock, SystemClock};
use crate::config::PawpalConfig;
use crate::generator::{ResponseGenerator, TemplateGenerator};
use crate::history::{HistoryEntry, HistoryStore, InMemoryHistoryStore};
use crate::lexicon::Lexicon;
use crate::proactive::{MessageSink, NullSink, ProactiveEventType, ProactiveScheduler};
use crate::random::{RandomSource, ThreadRandom};
use crate::tools::CapabilityRegistry;
use crate::types::{CompanionState, CompanionStatus, Message, Personality, ToolArgs, ToolResult};
use crate::workflow::{TurnWorkflow, CONTEXT_ROUTE};
use crate::Result;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Capacity of the default in-memory history
const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// A single companion instance
pub struct Companion {
    id: Uuid,
    personality: Personality,
    state: Mutex<CompanionState>,
    workflow: TurnWorkflow,
    scheduler: ProactiveScheduler,
    registry: Arc<CapabilityRegistry>,
    history: Arc<dyn HistoryStore>,
    max_carried_messages: usize,
}

impl Companion {
    /// Start building a companion with `personality`
    pub fn builder(personality: Personality) -> CompanionBuilder {
        CompanionBuilder::new(personality)
    }

    /// Instance id
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Temperament
    pub fn personality(&self) -> Personality {
        self.personality
    }

    /// Run one turn against the carried state and return the new state.
    ///
    /// A reply to user input is recorded in the history store. Only the most
    /// recent `max_carried_messages` messages are carried into the next turn.
    pub async fn invoke(&self, input: &str) -> CompanionState {
        let mut state = self.state.lock().await;
        self.run_turn(&mut state, input).await;
        state.clone()
    }

    /// Run one turn and return only the messages it appended
    pub async fn chat(&self, input: &str) -> Vec<Message> {
        let mut state = self.state.lock().await;
        let added = self.run_turn(&mut state, input).await;
        let start = state.messages.len().saturating_sub(added);
        state.messages[start..].to_vec()
    }

    /// Advance `state` by one turn; returns how many messages the turn appended
    async fn run_turn(&self, state: &mut CompanionState, input: &str) -> usize {
        let before = state.messages.len();
        self.workflow.run(input, self.personality, state).await;
        let added = state.messages.len().saturating_sub(before);

        if state.context_str(CONTEXT_ROUTE) == Some("generate_response") {
            if let Some(entry) = exchange_since(&state.messages, before) {
                if let Err(e) = self.history.record(entry).await {
                    warn!(companion = %self.id, error = %e, "Failed to record history");
                }
            }
        }

        state.retain_recent(self.max_carried_messages);
        added
    }

    /// Mood, energy and last interaction
    pub async fn status(&self) -> CompanionStatus {
        self.state.lock().await.status()
    }

    /// Copy of the carried state
    pub async fn state(&self) -> CompanionState {
        self.state.lock().await.clone()
    }

    /// Replace the carried state; its personality is forced to this companion's
    pub async fn restore(&self, mut state: CompanionState) {
        state.personality = self.personality;
        state.retain_recent(self.max_carried_messages);
        *self.state.lock().await = state;
    }

    /// Start the proactive loop
    pub fn start_scheduler(&self) -> Result<()> {
        info!(companion = %self.id, personality = %self.personality, "Starting scheduler");
        self.scheduler.start()
    }

    /// Stop the proactive loop and wait for it
    pub async fn stop_scheduler(&self) -> Result<()> {
        info!(companion = %self.id, "Stopping scheduler");
        self.scheduler.stop().await
    }

    /// Whether the proactive loop is running
    pub fn scheduler_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// The scheduler itself, for ticking by hand
    pub fn scheduler(&self) -> &ProactiveScheduler {
        &self.scheduler
    }

    /// Run an event handler by name right now, ignoring cooldowns.
    ///
    /// Unknown names and handler failures yield `None`.
    pub fn trigger_proactive_event(&self, event: &str) -> Option<String> {
        let event_type = match event.parse::<ProactiveEventType>() {
            Ok(event_type) => event_type,
            Err(e) => {
                debug!(error = %e, "Ignoring manual trigger");
                return None;
            }
        };
        match self.scheduler.trigger_manual_event(event_type) {
            Ok(text) => text,
            Err(e) => {
                warn!(event = %event_type, error = %e, "Manual trigger failed");
                None
            }
        }
    }

    /// Call a capability by name
    pub fn execute_capability(&self, name: &str, args: &ToolArgs) -> ToolResult {
        self.registry.execute(name, args)
    }

    /// Names of every capability
    pub fn list_capabilities(&self) -> BTreeSet<String> {
        self.registry.names()
    }

    /// Shared capability registry
    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }
}

/// The user message appended after `start` and the first reply to it
fn exchange_since(messages: &[Message], start: usize) -> Option<HistoryEntry> {
    let new = messages.get(start..)?;
    let user_at = new.iter().position(Message::is_user)?;
    let reply = new[user_at + 1..].iter().find(|m| m.is_assistant())?;
    Some(HistoryEntry::new(
        new[user_at].content.as_str(),
        reply.content.as_str(),
    ))
}

/// Builder for [`Companion`]
pub struct CompanionBuilder {
    personality: Personality,
    config: PawpalConfig,
    lexicon: Option<Arc<Lexicon>>,
    generator: Option<Arc<dyn ResponseGenerator>>,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
    sink: Arc<dyn MessageSink>,
    history: Option<Arc<dyn HistoryStore>>,
    initial_state: Option<CompanionState>,
}

impl CompanionBuilder {
    /// Defaults: env-independent config, template generator, system clock,
    /// thread RNG, no sink
    pub fn new(personality: Personality) -> Self {
        Self {
            personality,
            config: PawpalConfig::default(),
            lexicon: None,
            generator: None,
            clock: Arc::new(SystemClock),
            random: Arc::new(ThreadRandom),
            sink: Arc::new(NullSink),
            history: None,
            initial_state: None,
        }
    }

    /// Set the configuration
    pub fn with_config(mut self, config: PawpalConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the keyword lexicon
    pub fn with_lexicon(mut self, lexicon: Lexicon) -> Self {
        self.lexicon = Some(Arc::new(lexicon));
        self
    }

    /// Set the response generator
    pub fn with_generator(mut self, generator: Arc<dyn ResponseGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Set the clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the random source
    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Set where proactive messages go
    pub fn with_sink(mut self, sink: Arc<dyn MessageSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Set the history store
    pub fn with_history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    /// Start from an existing state instead of a fresh one
    pub fn with_state(mut self, state: CompanionState) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Validate settings and assemble the companion
    pub fn build(self) -> Result<Companion> {
        self.config.validate()?;
        let lexicon = self.lexicon.unwrap_or_else(|| Arc::new(Lexicon::default()));
        lexicon.validate()?;

        let registry = Arc::new(CapabilityRegistry::with_defaults(
            self.clock.clone(),
            self.config.workflow.default_weather_location.clone(),
        ));
        let history = self
            .history
            .unwrap_or_else(|| Arc::new(InMemoryHistoryStore::new(DEFAULT_HISTORY_CAPACITY)));
        let generator = self.generator.unwrap_or_else(|| {
            Arc::new(TemplateGenerator::new(lexicon.clone(), self.random.clone()))
        });

        let workflow = TurnWorkflow::new(registry.clone())
            .with_config(self.config.workflow.clone())
            .with_lexicon(lexicon)
            .with_generator(generator)
            .with_clock(self.clock.clone())
            .with_random(self.random.clone())
            .with_history(history.clone());

        let scheduler = ProactiveScheduler::builder(self.personality, registry.clone(), self.sink)
            .with_config(self.config.scheduler.clone())
            .with_clock(self.clock)
            .with_random(self.random)
            .build();

        let max_carried_messages = self.config.workflow.max_carried_messages;
        let mut state = self
            .initial_state
            .unwrap_or_else(|| CompanionState::new(self.personality));
        state.personality = self.personality;
        state.retain_recent(max_carried_messages);

        let id = Uuid::new_v4();
        debug!(companion = %id, personality = %self.personality, "Companion built");

        Ok(Companion {
            id,
            personality: self.personality,
            state: Mutex::new(state),
            workflow,
            scheduler,
            registry,
            history,
            max_carried_messages,
        })
    }
}
