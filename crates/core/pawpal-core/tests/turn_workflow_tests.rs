//! Turn workflow behaviour through the public API

mod common;

use chrono::Duration;
use common::*;
use pawpal_core::workflow::{CONTEXT_INTENT, CONTEXT_ROUTE, CONTEXT_TOOL_RESULTS};
use pawpal_core::*;
use std::sync::Arc;

#[tokio::test]
async fn test_empty_input_takes_greeting_branch_for_every_personality() {
    let (workflow, _) = workflow_at(at(10, 0), Arc::new(TemplateGenerator::default()));

    for personality in Personality::ALL {
        let state = workflow.invoke("", personality, None).await;
        assert_eq!(state.context_str(CONTEXT_ROUTE), Some("proactive_greeting"));
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[0].role, Role::System);
        assert!(state.messages[1].is_assistant());
    }
}

#[tokio::test]
async fn test_whitespace_input_counts_as_empty() {
    let (workflow, _) = workflow_at(at(10, 0), Arc::new(TemplateGenerator::default()));
    let state = workflow.invoke("   ", Personality::Quiet, None).await;
    assert_eq!(state.context_str(CONTEXT_ROUTE), Some("proactive_greeting"));
    assert!(state.messages.iter().all(|m| !m.is_user()));
}

#[tokio::test]
async fn test_blank_input_on_recent_conversation_replies() {
    let now = at(10, 0);
    let generator = Arc::new(StubGenerator::new("reply", "greeting"));
    let (workflow, _) = workflow_at(now, generator.clone());

    let prior = CompanionState::new(Personality::Quiet)
        .with_messages([Message::user("hi"), Message::assistant("嗯")])
        .with_last_interaction(now.to_rfc3339());
    let state = workflow.invoke("", Personality::Quiet, Some(prior)).await;

    assert_eq!(state.context_str(CONTEXT_ROUTE), Some("generate_response"));
    assert_eq!(state.messages.len(), 3);
    assert_eq!(state.messages.last(), Some(&Message::assistant("reply")));
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn test_stale_interaction_greets_regardless_of_input() {
    let now = at(10, 0);
    let (workflow, _) = workflow_at(now, Arc::new(StubGenerator::new("reply", "greeting")));

    for input in ["你好", "现在几点", "随便说说"] {
        let prior = CompanionState::new(Personality::Cold)
            .with_last_interaction((now - Duration::minutes(6)).to_rfc3339());
        let state = workflow.invoke(input, Personality::Cold, Some(prior)).await;
        assert_eq!(state.context_str(CONTEXT_ROUTE), Some("proactive_greeting"));
        assert_eq!(
            state.messages.last().map(|m| m.content.as_str()),
            Some("greeting")
        );
        assert_eq!(state.last_interaction_at(), Some(now));
    }
}

#[tokio::test]
async fn test_malformed_interaction_falls_through_to_reply() {
    let (workflow, _) = workflow_at(at(10, 0), Arc::new(StubGenerator::new("reply", "greeting")));
    let prior = CompanionState::new(Personality::Quiet).with_last_interaction("last tuesday");
    let state = workflow.invoke("在吗", Personality::Quiet, Some(prior)).await;
    assert_eq!(state.context_str(CONTEXT_ROUTE), Some("generate_response"));
}

#[tokio::test]
async fn test_hello_resolves_to_greeting_intent_and_reply_set() {
    let (workflow, _) = workflow_at(at(10, 0), Arc::new(TemplateGenerator::default()));

    for personality in Personality::ALL {
        let state = workflow.invoke("你好", personality, None).await;
        assert_eq!(state.context_str(CONTEXT_INTENT), Some("greeting"));
        let reply = &state.messages[1].content;
        assert!(
            phrases::GREETING_REPLIES
                .for_personality(personality)
                .contains(&reply.as_str()),
            "{} replied {}",
            personality,
            reply
        );
    }
}

#[tokio::test]
async fn test_positive_turns_saturate_energy() {
    let (workflow, _) = workflow_at(at(10, 0), Arc::new(StubGenerator::new("嗯", "hi")));
    let mut state = CompanionState::new(Personality::Playful);

    for input in ["我喜欢你", "摸摸", "抱抱", "爱你"] {
        state = workflow
            .invoke(input, Personality::Playful, Some(state))
            .await;
        assert!((MIN_ENERGY..=MAX_ENERGY).contains(&state.energy));
    }

    assert_eq!(state.mood, Mood::Happy);
    assert_eq!(state.energy, 100);
}

#[tokio::test]
async fn test_energy_stays_in_range_under_decay() {
    let (workflow, _) = workflow_at(at(10, 0), Arc::new(StubGenerator::new("嗯", "hi")));
    let mut state = CompanionState::new(Personality::Clingy).with_energy(7);

    for _ in 0..5 {
        state = workflow
            .invoke("下雨了", Personality::Clingy, Some(state))
            .await;
        assert!((MIN_ENERGY..=MAX_ENERGY).contains(&state.energy));
    }
    assert_eq!(state.energy, 0);
    assert_eq!(state.mood, Mood::Lonely);
}

#[tokio::test]
async fn test_low_energy_appends_tired_message() {
    let (workflow, _) = workflow_at(at(10, 0), Arc::new(StubGenerator::new("嗯", "hi")));

    for personality in Personality::ALL {
        let prior = CompanionState::new(personality).with_energy(20);
        let state = workflow
            .invoke("下雨了", personality, Some(prior))
            .await;
        let expected = phrases::TIRED_MESSAGES.first(personality).unwrap();
        assert_eq!(state.messages.last().unwrap().content, expected);
        // the generated reply is still there, before it
        assert_eq!(state.messages[state.messages.len() - 2].content, "嗯");
    }
}

#[tokio::test]
async fn test_generator_failure_never_fails_the_turn() {
    let (workflow, _) = workflow_at(at(10, 0), Arc::new(BrokenGenerator));

    let state = workflow.invoke("你好", Personality::Clingy, None).await;
    let reply = &state.messages[1].content;
    assert!(phrases::FALLBACK_REPLIES
        .for_personality(Personality::Clingy)
        .contains(&reply.as_str()));

    let state = workflow.invoke("", Personality::Clingy, None).await;
    let greeting = &state.messages[1].content;
    assert!(phrases::PROACTIVE_GREETINGS
        .for_personality(Personality::Clingy)
        .contains(&greeting.as_str()));
}

#[tokio::test]
async fn test_tool_results_stay_in_context() {
    let (workflow, _) = workflow_at(at(19, 5), Arc::new(StubGenerator::new("好的", "hi")));
    let state = workflow
        .invoke("现在几点？陪我玩", Personality::Quiet, None)
        .await;

    let results = state.context[CONTEXT_TOOL_RESULTS].as_object().unwrap();
    assert_eq!(results["get_time"]["data"]["time"], "19:05");
    assert!(results.contains_key("play_with_pet"));
    assert_eq!(state.messages[1].content, "好的");
}

#[tokio::test]
async fn test_idle_window_is_configurable() {
    let now = at(10, 0);
    let (workflow, _) = workflow_at(now, Arc::new(StubGenerator::new("reply", "greeting")));
    let workflow = workflow.with_config(WorkflowConfig {
        idle_greeting_minutes: 60,
        ..WorkflowConfig::default()
    });

    let prior = CompanionState::new(Personality::Quiet)
        .with_last_interaction((now - Duration::minutes(30)).to_rfc3339());
    let state = workflow.invoke("hi", Personality::Quiet, Some(prior)).await;
    assert_eq!(state.context_str(CONTEXT_ROUTE), Some("generate_response"));
}
