//! Shared fixtures for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use pawpal_core::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A fixed local time on a Saturday
pub fn at(hour: u32, minute: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 6, 1, hour, minute, 0).unwrap()
}

/// Generator that always answers with the same text
pub struct StubGenerator {
    pub reply: String,
    pub greeting: String,
    pub calls: AtomicUsize,
}

impl StubGenerator {
    pub fn new(reply: &str, greeting: &str) -> Self {
        Self {
            reply: reply.to_string(),
            greeting: greeting.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResponseGenerator for StubGenerator {
    async fn generate_response(
        &self,
        _input: &str,
        _personality: Personality,
        _history: &[HistoryEntry],
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }

    async fn generate_greeting(&self, _personality: Personality) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.greeting.clone())
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Generator that always fails
pub struct BrokenGenerator;

#[async_trait]
impl ResponseGenerator for BrokenGenerator {
    async fn generate_response(
        &self,
        _input: &str,
        _personality: Personality,
        _history: &[HistoryEntry],
    ) -> Result<String> {
        Err(PawpalError::generator("connection refused"))
    }

    async fn generate_greeting(&self, _personality: Personality) -> Result<String> {
        Err(PawpalError::generator("connection refused"))
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Workflow over a manual clock and the default registry
pub fn workflow_at(
    now: DateTime<Local>,
    generator: Arc<dyn ResponseGenerator>,
) -> (TurnWorkflow, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(now));
    let registry = Arc::new(CapabilityRegistry::with_defaults(clock.clone(), "北京"));
    let workflow = TurnWorkflow::new(registry)
        .with_generator(generator)
        .with_clock(clock.clone())
        .with_random(Arc::new(FixedRandom(0.0)));
    (workflow, clock)
}

/// Companion with a manual clock, fixed randomness and a collecting sink
pub fn companion_at(
    personality: Personality,
    now: DateTime<Local>,
) -> (Companion, Arc<ManualClock>, Arc<CollectingSink>) {
    let clock = Arc::new(ManualClock::new(now));
    let sink = Arc::new(CollectingSink::new());
    let mut config = PawpalConfig::default();
    config.scheduler.health_decay = false;

    let companion = Companion::builder(personality)
        .with_config(config)
        .with_clock(clock.clone())
        .with_random(Arc::new(FixedRandom(0.0)))
        .with_sink(sink.clone())
        .build()
        .unwrap();
    (companion, clock, sink)
}
