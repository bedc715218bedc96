//! Turn workflow
//!
//! One call to [`TurnWorkflow::invoke`] walks the graph in [`graph`] from
//! `AnalyzeInput` to the terminal node, running each node's step over a single
//! [`CompanionState`]. The time of the call is read once and shared by every
//! node of the turn.

pub mod graph;
mod nodes;

pub use graph::{next, should_greet, transition, Transition, TurnContext, WorkflowNode};
pub use nodes::MOOD_WINDOW;

use crate::clock::{Clock, SystemClock};
use crate::config::WorkflowConfig;
use crate::generator::{ResponseGenerator, TemplateGenerator};
use crate::history::HistoryStore;
use crate::lexicon::Lexicon;
use crate::random::{RandomSource, ThreadRandom};
use crate::tools::CapabilityRegistry;
use crate::types::{CompanionState, Message, Personality};
use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, warn};

/// Context key holding the coarse intent category
pub const CONTEXT_INTENT: &str = "intent";
/// Context key holding the fine-grained intent tag
pub const CONTEXT_USER_INTENT: &str = "user_intent";
/// Context key holding the branch taken (`proactive_greeting` or `generate_response`)
pub const CONTEXT_ROUTE: &str = "route";
/// Context key holding successful capability results, keyed by capability name
pub const CONTEXT_TOOL_RESULTS: &str = "tool_results";

/// Processes one user turn end to end
pub struct TurnWorkflow {
    config: WorkflowConfig,
    lexicon: Arc<Lexicon>,
    generator: Arc<dyn ResponseGenerator>,
    registry: Arc<CapabilityRegistry>,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
    history: Option<Arc<dyn HistoryStore>>,
}

impl TurnWorkflow {
    /// Workflow over `registry` with default config, lexicon, clock and the
    /// offline template generator
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        let lexicon = Arc::new(Lexicon::default());
        let random: Arc<dyn RandomSource> = Arc::new(ThreadRandom);
        Self {
            config: WorkflowConfig::default(),
            generator: Arc::new(TemplateGenerator::new(lexicon.clone(), random.clone())),
            lexicon,
            registry,
            clock: Arc::new(SystemClock),
            random,
            history: None,
        }
    }

    /// Set the configuration
    pub fn with_config(mut self, config: WorkflowConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the keyword lexicon
    pub fn with_lexicon(mut self, lexicon: Arc<Lexicon>) -> Self {
        self.lexicon = lexicon;
        self
    }

    /// Set the response generator
    pub fn with_generator(mut self, generator: Arc<dyn ResponseGenerator>) -> Self {
        self.generator = generator;
        self
    }

    /// Set the clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the random source used for fallback phrases
    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Read history from `store` when the state carries none
    pub fn with_history(mut self, store: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(store);
        self
    }

    /// Current configuration
    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Run one turn.
    ///
    /// When `prior` is given it is carried forward; otherwise the turn starts
    /// from a fresh state. See [`TurnWorkflow::run`].
    pub async fn invoke(
        &self,
        input: &str,
        personality: Personality,
        prior: Option<CompanionState>,
    ) -> CompanionState {
        let mut state = prior.unwrap_or_else(|| CompanionState::new(personality));
        self.run(input, personality, &mut state).await;
        state
    }

    /// Run one turn in place.
    ///
    /// A blank `input` appends nothing, so a fresh state takes the greeting
    /// branch. The state's personality is replaced by `personality` if they
    /// differ. The per-turn context is cleared before the walk starts.
    pub async fn run(&self, input: &str, personality: Personality, state: &mut CompanionState) {
        if state.personality != personality {
            warn!(
                from = %state.personality,
                to = %personality,
                "Carried state has a different personality; overriding"
            );
            state.personality = personality;
        }
        state.context.clear();

        if !input.trim().is_empty() {
            state.messages.push(Message::user(input));
        }

        let ctx = TurnContext {
            now: self.clock.now(),
            idle_window: Duration::minutes(self.config.idle_greeting_minutes),
        };

        let mut node = WorkflowNode::START;
        loop {
            debug!(node = %node, personality = %personality, "Running workflow node");
            self.run_node(node, state, &ctx).await;
            match graph::next(node, state, &ctx) {
                Some(target) => node = target,
                None => break,
            }
        }

        debug!(
            mood = %state.mood,
            energy = state.energy,
            messages = state.messages.len(),
            "Turn complete"
        );
    }

    async fn run_node(&self, node: WorkflowNode, state: &mut CompanionState, ctx: &TurnContext) {
        match node {
            WorkflowNode::AnalyzeInput => self.analyze_input(state),
            WorkflowNode::ProactiveGreeting => self.proactive_greeting(state, ctx).await,
            WorkflowNode::GenerateResponse => self.generate_response(state, ctx).await,
            WorkflowNode::ToolExecution => self.execute_tools(state),
            WorkflowNode::UpdateMood => self.update_mood(state),
            WorkflowNode::CheckEnergy => self.check_energy(state),
        }
    }
}
