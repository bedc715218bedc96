//! Response generator seam
//!
//! The workflow asks a [`ResponseGenerator`] for reply text. Implementations
//! may fail or be unavailable; the workflow then falls back to
//! [`fallback_reply`] / [`fallback_greeting`], so a turn never fails because
//! of the generator.

use crate::history::HistoryEntry;
use crate::lexicon::{IntentCategory, Lexicon};
use crate::phrases::{
    EMOTION_REPLIES, FALLBACK_REPLIES, GREETING_REPLIES, INTERACTION_REPLIES, PROACTIVE_GREETINGS,
};
use crate::random::{RandomSource, ThreadRandom};
use crate::types::Personality;
use crate::{PawpalError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Produces reply and greeting text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// Reply to `input`; `history` is oldest first
    async fn generate_response(
        &self,
        input: &str,
        personality: Personality,
        history: &[HistoryEntry],
    ) -> Result<String>;

    /// Unprompted greeting
    async fn generate_greeting(&self, personality: Personality) -> Result<String>;

    /// Whether calls are worth attempting
    fn is_available(&self) -> bool;
}

/// Canned reply used when the generator cannot answer
pub fn fallback_reply(personality: Personality, random: &dyn RandomSource) -> String {
    FALLBACK_REPLIES
        .pick(personality, random)
        .unwrap_or("嗯")
        .to_string()
}

/// Canned greeting used when the generator cannot answer
pub fn fallback_greeting(personality: Personality, random: &dyn RandomSource) -> String {
    PROACTIVE_GREETINGS
        .pick(personality, random)
        .unwrap_or("你好")
        .to_string()
}

/// Offline generator drawing from the phrase tables
pub struct TemplateGenerator {
    lexicon: Arc<Lexicon>,
    random: Arc<dyn RandomSource>,
}

impl TemplateGenerator {
    /// Create over a lexicon and a random source
    pub fn new(lexicon: Arc<Lexicon>, random: Arc<dyn RandomSource>) -> Self {
        Self { lexicon, random }
    }
}

impl Default for TemplateGenerator {
    fn default() -> Self {
        Self::new(Arc::new(Lexicon::default()), Arc::new(ThreadRandom))
    }
}

#[async_trait]
impl ResponseGenerator for TemplateGenerator {
    async fn generate_response(
        &self,
        input: &str,
        personality: Personality,
        _history: &[HistoryEntry],
    ) -> Result<String> {
        let table = match self.lexicon.classify_intent(input) {
            IntentCategory::Greeting => GREETING_REPLIES,
            IntentCategory::PhysicalInteraction => INTERACTION_REPLIES,
            IntentCategory::Emotional => EMOTION_REPLIES,
            IntentCategory::Farewell | IntentCategory::General => FALLBACK_REPLIES,
        };
        table
            .pick(personality, self.random.as_ref())
            .map(str::to_string)
            .ok_or_else(|| PawpalError::generator(format!("no replies for {}", personality)))
    }

    async fn generate_greeting(&self, personality: Personality) -> Result<String> {
        PROACTIVE_GREETINGS
            .pick(personality, self.random.as_ref())
            .map(str::to_string)
            .ok_or_else(|| PawpalError::generator(format!("no greetings for {}", personality)))
    }

    fn is_available(&self) -> bool {
        true
    }
}
