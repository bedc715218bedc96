//! Proactive scheduler
//!
//! A background task that wakes every tick, evaluates each event type against
//! its cooldown and readiness rule, and delivers whatever the handlers produce
//! to a [`MessageSink`]. A tick never stops the loop; repeated failing ticks
//! only stretch the sleep to the backoff period.

use super::cooldown::CooldownTracker;
use super::events::{EventConditions, ProactiveEvent, ProactiveEventType};
use super::responder::ProactiveResponder;
use super::sink::{MessageSink, ProactiveMessage};
use crate::clock::{Clock, SystemClock};
use crate::config::SchedulerConfig;
use crate::random::{RandomSource, ThreadRandom};
use crate::tools::CapabilityRegistry;
use crate::types::Personality;
use crate::{PawpalError, Result};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Outcome of one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Events whose handler ran and whose firing was recorded
    pub fired: Vec<ProactiveEventType>,
    /// Messages handed to the sink
    pub delivered: Vec<ProactiveMessage>,
    /// Handlers or deliveries that failed, with the error text
    pub failures: Vec<(ProactiveEventType, String)>,
}

impl TickReport {
    /// Whether anything went wrong
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// State shared between the scheduler handle and its loop task
struct SchedulerCore {
    personality: Personality,
    config: SchedulerConfig,
    registry: Arc<CapabilityRegistry>,
    responder: ProactiveResponder,
    cooldowns: CooldownTracker,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
    sink: Arc<dyn MessageSink>,
}

impl SchedulerCore {
    fn run_tick(&self) -> Result<TickReport> {
        if self.config.health_decay {
            self.registry.decay_health()?;
        }

        let now = self.clock.now();
        let mut report = TickReport::default();

        for event_type in ProactiveEventType::ALL {
            let spec = event_type.spec();
            if self.cooldowns.is_cooling(event_type, now, spec.cooldown)? {
                continue;
            }
            if !spec.is_ready(now, self.personality, self.random.as_ref()) {
                continue;
            }

            let event = ProactiveEvent::new(
                event_type,
                EventConditions {
                    at: now,
                    personality: self.personality,
                },
            );
            debug!(event = %event.event_type, priority = event.priority, "Event ready");

            match self.responder.respond(event.event_type, self.personality) {
                Ok(text) => {
                    if let Some(text) = text.filter(|t| !t.trim().is_empty()) {
                        let message = ProactiveMessage {
                            event_type,
                            text,
                            at: now,
                        };
                        match self.sink.deliver(message.clone()) {
                            Ok(()) => {
                                info!(event = %event_type, text = %message.text, "Proactive message");
                                report.delivered.push(message);
                            }
                            Err(e) => {
                                warn!(event = %event_type, error = %e, "Delivery failed");
                                report.failures.push((event_type, e.to_string()));
                            }
                        }
                    }
                    self.cooldowns.record(event_type, now)?;
                    report.fired.push(event_type);
                }
                Err(e) => {
                    warn!(event = %event_type, error = %e, "Handler failed");
                    report.failures.push((event_type, e.to_string()));
                }
            }
        }

        Ok(report)
    }

    async fn run_loop(self: Arc<Self>, mut stop: watch::Receiver<bool>) {
        info!(personality = %self.personality, "Proactive scheduler started");
        let mut consecutive_failures: u32 = 0;

        loop {
            if *stop.borrow() {
                break;
            }

            let failed = match self.run_tick() {
                Ok(report) => report.has_failures(),
                Err(e) => {
                    error!(error = %e, "Scheduler tick failed");
                    true
                }
            };

            if failed {
                consecutive_failures += 1;
            } else {
                consecutive_failures = 0;
            }

            let pause = if consecutive_failures >= self.config.failure_backoff_threshold {
                warn!(
                    consecutive_failures,
                    backoff_secs = self.config.backoff_secs,
                    "Backing off after repeated failures"
                );
                self.config.backoff()
            } else {
                self.config.tick_interval()
            };

            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                changed = stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!(personality = %self.personality, "Proactive scheduler stopped");
    }
}

struct RunningLoop {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Handle to a companion's proactive scheduler
pub struct ProactiveScheduler {
    core: Arc<SchedulerCore>,
    running: Mutex<Option<RunningLoop>>,
}

impl ProactiveScheduler {
    /// Start building a scheduler
    pub fn builder(
        personality: Personality,
        registry: Arc<CapabilityRegistry>,
        sink: Arc<dyn MessageSink>,
    ) -> ProactiveSchedulerBuilder {
        ProactiveSchedulerBuilder {
            personality,
            registry,
            sink,
            config: SchedulerConfig::default(),
            clock: Arc::new(SystemClock),
            random: Arc::new(ThreadRandom),
        }
    }

    /// Personality the handlers speak with
    pub fn personality(&self) -> Personality {
        self.core.personality
    }

    /// Evaluate every event once, now
    pub fn run_tick(&self) -> Result<TickReport> {
        self.core.run_tick()
    }

    /// Run the handler for `event_type` immediately.
    ///
    /// Cooldowns are neither checked nor recorded, and the result is returned
    /// instead of delivered.
    pub fn trigger_manual_event(&self, event_type: ProactiveEventType) -> Result<Option<String>> {
        debug!(event = %event_type, "Manual trigger");
        self.core.responder.respond(event_type, self.core.personality)
    }

    /// Last recorded firing of `event_type`
    pub fn last_fired(
        &self,
        event_type: ProactiveEventType,
    ) -> Result<Option<chrono::DateTime<chrono::Local>>> {
        self.core.cooldowns.last_fired(event_type)
    }

    /// Spawn the loop on the current tokio runtime; a no-op when already running
    pub fn start(&self) -> Result<()> {
        let mut running = self
            .running
            .lock()
            .map_err(|_| PawpalError::poisoned("scheduler"))?;

        if let Some(existing) = running.as_ref() {
            if !existing.handle.is_finished() {
                debug!("Scheduler already running");
                return Ok(());
            }
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| PawpalError::scheduler("no tokio runtime to run the scheduler on"))?;
        let (stop, stop_rx) = watch::channel(false);
        let handle = runtime.spawn(self.core.clone().run_loop(stop_rx));
        *running = Some(RunningLoop { stop, handle });
        Ok(())
    }

    /// Signal the loop to stop and wait for it; an in-flight tick finishes first
    pub async fn stop(&self) -> Result<()> {
        let running = self
            .running
            .lock()
            .map_err(|_| PawpalError::poisoned("scheduler"))?
            .take();

        let Some(RunningLoop { stop, handle }) = running else {
            debug!("Scheduler not running");
            return Ok(());
        };

        // the loop may already have exited
        let _ = stop.send(true);
        handle
            .await
            .map_err(|e| PawpalError::scheduler(format!("scheduler task failed: {}", e)))
    }

    /// Whether the loop task is alive
    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .map(|r| r.as_ref().map(|l| !l.handle.is_finished()).unwrap_or(false))
            .unwrap_or(false)
    }
}

/// Builder for [`ProactiveScheduler`]
pub struct ProactiveSchedulerBuilder {
    personality: Personality,
    registry: Arc<CapabilityRegistry>,
    sink: Arc<dyn MessageSink>,
    config: SchedulerConfig,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
}

impl ProactiveSchedulerBuilder {
    /// Set tick, backoff and decay settings
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the clock used for hours and cooldowns
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the random source for chance-based events and phrase picks
    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Finish
    pub fn build(self) -> ProactiveScheduler {
        let responder =
            ProactiveResponder::new(self.registry.clone(), self.clock.clone(), self.random.clone());
        ProactiveScheduler {
            core: Arc::new(SchedulerCore {
                personality: self.personality,
                config: self.config,
                registry: self.registry,
                responder,
                cooldowns: CooldownTracker::new(),
                clock: self.clock,
                random: self.random,
                sink: self.sink,
            }),
            running: Mutex::new(None),
        }
    }
}
