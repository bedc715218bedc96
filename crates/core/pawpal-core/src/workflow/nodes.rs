//! Node steps of the turn workflow

use super::{
    TurnContext, TurnWorkflow, WorkflowNode, CONTEXT_INTENT, CONTEXT_ROUTE, CONTEXT_TOOL_RESULTS,
    CONTEXT_USER_INTENT,
};
use crate::generator::{fallback_greeting, fallback_reply};
use crate::history::{pairs_from_messages, HistoryEntry};
use crate::lexicon::ToolTrigger;
use crate::phrases::{greeting_marker, TIRED_MESSAGES};
use crate::types::{CompanionState, Message, Mood, Personality, ToolArgs, MAX_ENERGY, MIN_ENERGY};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

/// Messages examined by the mood update
pub const MOOD_WINDOW: usize = 4;

impl TurnWorkflow {
    pub(super) fn analyze_input(&self, state: &mut CompanionState) {
        let Some(content) = state.last_user_message().map(|m| m.content.clone()) else {
            debug!("No user message to classify");
            return;
        };

        let intent = self.lexicon.classify_intent(&content);
        let user_intent = self.lexicon.classify_user_intent(&content).to_string();
        debug!(intent = %intent, user_intent = %user_intent, "Classified input");

        state.set_context(CONTEXT_INTENT, intent.as_str());
        state.set_context(CONTEXT_USER_INTENT, user_intent);
    }

    pub(super) async fn generate_response(&self, state: &mut CompanionState, ctx: &TurnContext) {
        state.set_context(CONTEXT_ROUTE, WorkflowNode::GenerateResponse.as_str());

        let Some(input) = state.last_user_message().map(|m| m.content.clone()) else {
            return;
        };

        let history = self.history_for(state).await;
        let reply = self.reply(&input, state.personality, &history).await;
        state.messages.push(Message::assistant(reply));
        state.touch(ctx.now);
    }

    pub(super) async fn proactive_greeting(&self, state: &mut CompanionState, ctx: &TurnContext) {
        state.set_context(CONTEXT_ROUTE, WorkflowNode::ProactiveGreeting.as_str());

        let greeting = self.greeting(state.personality).await;
        state
            .messages
            .push(Message::system(greeting_marker(state.personality)));
        state.messages.push(Message::assistant(greeting));
        state.touch(ctx.now);
    }

    pub(super) fn execute_tools(&self, state: &mut CompanionState) {
        let Some(content) = state.last_user_message().map(|m| m.content.clone()) else {
            return;
        };

        let mut results = Map::new();
        for trigger in self.lexicon.matching_tools(&content) {
            let name = trigger.capability();
            let args = self.tool_args(trigger, &content);
            let result = self.registry.execute(name, &args);
            if result.success {
                debug!(tool = name, "Capability succeeded");
                results.insert(
                    name.to_string(),
                    json!({ "data": result.data, "message": result.message }),
                );
            } else {
                debug!(tool = name, message = %result.message, "Capability failed; omitted");
            }
        }

        state.set_context(CONTEXT_TOOL_RESULTS, Value::Object(results));
    }

    pub(super) fn update_mood(&self, state: &mut CompanionState) {
        let start = state.messages.len().saturating_sub(MOOD_WINDOW);
        let positive = state.messages[start..]
            .iter()
            .filter(|m| m.is_user() && self.lexicon.is_positive(&m.content))
            .count();

        let (mood, delta) = mood_for(positive, state.personality);
        state.mood = mood;
        state.energy = (state.energy + delta).clamp(MIN_ENERGY, MAX_ENERGY);
        debug!(positive, mood = %mood, energy = state.energy, "Updated mood");
    }

    pub(super) fn check_energy(&self, state: &mut CompanionState) {
        if state.energy >= self.config.low_energy_threshold {
            return;
        }
        if let Some(tired) = TIRED_MESSAGES.first(state.personality) {
            debug!(energy = state.energy, "Energy low; appending tired message");
            state.messages.push(Message::assistant(tired));
        }
    }

    fn tool_args(&self, trigger: ToolTrigger, content: &str) -> ToolArgs {
        let mut args = ToolArgs::new();
        if trigger == ToolTrigger::Weather {
            let location = self
                .lexicon
                .find_city(content)
                .unwrap_or(self.config.default_weather_location.as_str());
            args.insert("location".to_string(), Value::from(location));
        }
        args
    }

    /// Pairs from the carried conversation, else from the history store
    async fn history_for(&self, state: &CompanionState) -> Vec<HistoryEntry> {
        let limit = self.config.history_turns;
        let pairs = pairs_from_messages(&state.messages, limit);
        if !pairs.is_empty() {
            return pairs;
        }
        match &self.history {
            Some(store) => store.recent(limit).await.unwrap_or_else(|e| {
                warn!(error = %e, "History unavailable");
                Vec::new()
            }),
            None => pairs,
        }
    }

    async fn reply(&self, input: &str, personality: Personality, history: &[HistoryEntry]) -> String {
        if !self.generator.is_available() {
            debug!("Generator unavailable; using fallback reply");
            return fallback_reply(personality, self.random.as_ref());
        }

        let timeout = self.config.generator_timeout();
        match tokio::time::timeout(
            timeout,
            self.generator.generate_response(input, personality, history),
        )
        .await
        {
            Ok(Ok(text)) if !text.trim().is_empty() => text,
            Ok(Ok(_)) => {
                warn!("Generator returned empty text; using fallback reply");
                fallback_reply(personality, self.random.as_ref())
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Generator failed; using fallback reply");
                fallback_reply(personality, self.random.as_ref())
            }
            Err(_) => {
                warn!(timeout_secs = timeout.as_secs(), "Generator timed out; using fallback reply");
                fallback_reply(personality, self.random.as_ref())
            }
        }
    }

    async fn greeting(&self, personality: Personality) -> String {
        if !self.generator.is_available() {
            debug!("Generator unavailable; using fallback greeting");
            return fallback_greeting(personality, self.random.as_ref());
        }

        let timeout = self.config.generator_timeout();
        match tokio::time::timeout(timeout, self.generator.generate_greeting(personality)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => text,
            Ok(Ok(_)) | Ok(Err(_)) | Err(_) => {
                warn!("Greeting generation failed; using fallback greeting");
                fallback_greeting(personality, self.random.as_ref())
            }
        }
    }
}

/// Mood and energy change for a positive-message count
fn mood_for(positive: usize, personality: Personality) -> (Mood, i32) {
    match positive {
        0 => (personality.idle_mood(), -personality.idle_energy_decay()),
        1 => (Mood::Content, 5),
        _ => (Mood::Happy, 10),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::generator::MockResponseGenerator;
    use crate::history::{HistoryStore, InMemoryHistoryStore};
    use crate::random::FixedRandom;
    use crate::tools::CapabilityRegistry;
    use crate::PawpalError;
    use chrono::{Local, TimeZone};
    use std::sync::Arc;

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Local.with_ymd_and_hms(2024, 5, 4, 10, 0, 0).unwrap(),
        ))
    }

    fn workflow(generator: MockResponseGenerator) -> TurnWorkflow {
        let clock = clock();
        let registry = Arc::new(CapabilityRegistry::with_defaults(clock.clone(), "北京"));
        TurnWorkflow::new(registry)
            .with_generator(Arc::new(generator))
            .with_clock(clock)
            .with_random(Arc::new(FixedRandom(0.0)))
    }

    fn echo_generator() -> MockResponseGenerator {
        let mut mock = MockResponseGenerator::new();
        mock.expect_is_available().return_const(true);
        mock.expect_generate_response()
            .returning(|input, _, _| Ok(format!("echo:{}", input)));
        mock.expect_generate_greeting()
            .returning(|p| Ok(format!("hello from {}", p)));
        mock
    }

    #[test]
    fn test_mood_table() {
        assert_eq!(mood_for(0, Personality::Clingy), (Mood::Lonely, -5));
        assert_eq!(mood_for(0, Personality::Cold), (Mood::Neutral, -2));
        assert_eq!(mood_for(0, Personality::Playful), (Mood::Neutral, -1));
        assert_eq!(mood_for(0, Personality::Quiet), (Mood::Neutral, -1));
        assert_eq!(mood_for(1, Personality::Cold), (Mood::Content, 5));
        assert_eq!(mood_for(3, Personality::Cold), (Mood::Happy, 10));
    }

    #[tokio::test]
    async fn test_reply_path() {
        let state = workflow(echo_generator())
            .invoke("今天下雨", Personality::Quiet, None)
            .await;

        assert_eq!(state.context_str(CONTEXT_ROUTE), Some("generate_response"));
        assert_eq!(state.context_str(CONTEXT_INTENT), Some("general"));
        assert_eq!(state.context_str(CONTEXT_USER_INTENT), Some("general_chat"));
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[1], Message::assistant("echo:今天下雨"));
        assert!(state.last_interaction_at().is_some());
        assert_eq!(state.mood, Mood::Neutral);
        assert_eq!(state.energy, 99);
    }

    #[tokio::test]
    async fn test_greeting_path_writes_marker() {
        let state = workflow(echo_generator())
            .invoke("", Personality::Playful, None)
            .await;

        assert_eq!(state.context_str(CONTEXT_ROUTE), Some("proactive_greeting"));
        assert!(state.context.get(CONTEXT_INTENT).is_none());
        assert_eq!(
            state.messages,
            vec![
                Message::system("现在是主动问候时间，宠物性格：playful"),
                Message::assistant("hello from playful"),
            ]
        );
    }

    #[tokio::test]
    async fn test_generator_error_falls_back() {
        let mut mock = MockResponseGenerator::new();
        mock.expect_is_available().return_const(true);
        mock.expect_generate_response()
            .returning(|_, _, _| Err(PawpalError::generator("boom")));

        let state = workflow(mock).invoke("嗨", Personality::Cold, None).await;
        assert_eq!(state.messages.last(), Some(&Message::assistant("嗯")));
    }

    #[tokio::test]
    async fn test_unavailable_generator_is_not_called() {
        let mut mock = MockResponseGenerator::new();
        mock.expect_is_available().return_const(false);
        mock.expect_generate_response().never();
        mock.expect_generate_greeting().never();

        let state = workflow(mock).invoke("", Personality::Clingy, None).await;
        assert_eq!(
            state.messages.last(),
            Some(&Message::assistant("主人！你终于来了！"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_generator_timeout_falls_back() {
        struct Hanging;

        #[async_trait::async_trait]
        impl crate::generator::ResponseGenerator for Hanging {
            async fn generate_response(
                &self,
                _input: &str,
                _personality: Personality,
                _history: &[HistoryEntry],
            ) -> crate::Result<String> {
                std::future::pending().await
            }

            async fn generate_greeting(&self, _personality: Personality) -> crate::Result<String> {
                std::future::pending().await
            }

            fn is_available(&self) -> bool {
                true
            }
        }

        let clock = clock();
        let registry = Arc::new(CapabilityRegistry::with_defaults(clock.clone(), "北京"));
        let workflow = TurnWorkflow::new(registry)
            .with_generator(Arc::new(Hanging))
            .with_clock(clock)
            .with_random(Arc::new(FixedRandom(0.0)));

        let state = workflow.invoke("你好", Personality::Quiet, None).await;
        assert_eq!(state.messages.last(), Some(&Message::assistant("嗯")));
    }

    #[tokio::test]
    async fn test_history_pairs_passed_to_generator() {
        let mut mock = MockResponseGenerator::new();
        mock.expect_is_available().return_const(true);
        mock.expect_generate_response()
            .withf(|input, _, history| {
                input == "第二句" && history == [HistoryEntry::new("第一句", "嗯")].as_slice()
            })
            .times(1)
            .returning(|_, _, _| Ok("好".to_string()));

        let prior = CompanionState::new(Personality::Quiet)
            .with_messages([Message::user("第一句"), Message::assistant("嗯")]);
        let state = workflow(mock)
            .invoke("第二句", Personality::Quiet, Some(prior))
            .await;
        assert_eq!(state.messages.len(), 4);
    }

    #[tokio::test]
    async fn test_history_store_used_when_state_has_none() {
        let store = Arc::new(InMemoryHistoryStore::new(10));
        store
            .record(HistoryEntry::new("昨天", "记得"))
            .await
            .unwrap();

        let mut mock = MockResponseGenerator::new();
        mock.expect_is_available().return_const(true);
        mock.expect_generate_response()
            .withf(|_, _, history| history.len() == 1 && history[0].user_input == "昨天")
            .times(1)
            .returning(|_, _, _| Ok("嗯".to_string()));

        let workflow = workflow(mock).with_history(store);
        workflow.invoke("还记得吗", Personality::Quiet, None).await;
    }

    #[tokio::test]
    async fn test_tools_collected_into_context() {
        let state = workflow(echo_generator())
            .invoke("上海天气怎么样？我饿了", Personality::Playful, None)
            .await;

        let results = state.context[CONTEXT_TOOL_RESULTS].as_object().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results["get_weather"]["data"]["location"], json!("上海"));
        assert!(results.contains_key("feed_pet"));
        // tool output stays out of the reply
        assert_eq!(
            state.messages.last(),
            Some(&Message::assistant("echo:上海天气怎么样？我饿了"))
        );
    }

    #[tokio::test]
    async fn test_failed_tool_is_omitted() {
        let clock = clock();
        // registry without the built-ins
        let registry = Arc::new(CapabilityRegistry::empty());
        let workflow = TurnWorkflow::new(registry)
            .with_generator(Arc::new(echo_generator()))
            .with_clock(clock);

        let state = workflow.invoke("现在几点", Personality::Cold, None).await;
        let results = state.context[CONTEXT_TOOL_RESULTS].as_object().unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_low_energy_appends_tired_message() {
        let prior = CompanionState::new(Personality::Cold).with_energy(20);
        let state = workflow(echo_generator())
            .invoke("今天下雨", Personality::Cold, Some(prior))
            .await;

        assert_eq!(state.energy, 18);
        assert_eq!(state.messages.last(), Some(&Message::assistant("哼，有点累了。")));
        assert_eq!(state.messages[state.messages.len() - 2], Message::assistant("echo:今天下雨"));
    }

    #[tokio::test]
    async fn test_personality_override() {
        let prior = CompanionState::new(Personality::Cold);
        let state = workflow(echo_generator())
            .invoke("你好", Personality::Clingy, Some(prior))
            .await;
        assert_eq!(state.personality, Personality::Clingy);
    }
}
