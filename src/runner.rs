//! Pattern runner.
//!
//! Repeatedly reads the runtime, switches patterns when the selection
//! changed and otherwise advances the active pattern by one step. Pattern
//! failures (including panics) stay inside the iteration that caused them.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use embassy_time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::cancel::CancelToken;
use crate::catalog::{PatternCatalog, PatternKey};
use crate::config::GlobalChannels;
use crate::error::PatternError;
use crate::pattern::{Pattern, PatternRng, Speed, StepContext};
use crate::runtime::{PatternRuntime, RuntimeSnapshot, Selection};
use crate::universe::FrameBuffer;

/// Upper bound on an idle wait, so a bare cancel is noticed.
const IDLE_RECHECK: Duration = Duration::from_millis(250);

/// Where the runner is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerPhase {
    /// No pattern selected; buffer holds globals only.
    Idle,
    /// A pattern is being stepped.
    Active,
    /// Buffer reset and a fresh pattern loaded; it has not stepped yet.
    Switching,
}

/// What one runner iteration did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Nothing selected and nothing changed.
    Idle,
    /// A new selection was loaded; it is stepped on the next iteration.
    Switched(PatternKey),
    /// The selection was cleared and the buffer blanked.
    Blanked,
    /// The active pattern stepped and asked for this delay.
    Advanced(Duration),
    /// The active pattern failed; the iteration was skipped.
    Failed(PatternError),
}

/// Counters collected by a runner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunnerStats {
    pub steps: u64,
    pub switches: u64,
    pub failures: u64,
}

struct ActivePattern {
    selection: Selection,
    name: &'static str,
    pattern: Box<dyn Pattern>,
}

/// Drives the selected pattern against the frame buffer.
pub struct PatternRunner {
    runtime: Arc<PatternRuntime>,
    frame: Arc<FrameBuffer>,
    catalog: Arc<PatternCatalog>,
    globals: GlobalChannels,
    rng: PatternRng,
    cancel: CancelToken,
    failure_backoff: Duration,
    active: Option<ActivePattern>,
    applied_generation: u64,
    phase: RunnerPhase,
    stats: RunnerStats,
}

impl PatternRunner {
    pub fn new(
        runtime: Arc<PatternRuntime>,
        frame: Arc<FrameBuffer>,
        catalog: Arc<PatternCatalog>,
        globals: GlobalChannels,
        rng: PatternRng,
        cancel: CancelToken,
    ) -> Self {
        Self {
            runtime,
            frame,
            catalog,
            globals,
            rng,
            cancel,
            failure_backoff: Duration::from_millis(100),
            active: None,
            applied_generation: 0,
            phase: RunnerPhase::Idle,
            stats: RunnerStats::default(),
        }
    }

    /// Pause inserted after a failed step.
    #[must_use]
    pub fn with_failure_backoff(mut self, backoff: Duration) -> Self {
        self.failure_backoff = backoff;
        self
    }

    pub fn phase(&self) -> RunnerPhase {
        self.phase
    }

    pub fn stats(&self) -> RunnerStats {
        self.stats
    }

    /// Name of the pattern currently loaded.
    pub fn active_pattern(&self) -> Option<&'static str> {
        self.active.as_ref().map(|active| active.name)
    }

    /// Perform one iteration: read the runtime once, then either switch or
    /// advance the active pattern.
    pub fn step(&mut self) -> StepOutcome {
        let snapshot = self.runtime.snapshot();
        if snapshot.generation != self.applied_generation {
            return self.apply(snapshot);
        }
        match self.active.as_mut() {
            Some(active) => {
                self.phase = RunnerPhase::Active;
                let outcome = Self::advance(
                    active,
                    &self.frame,
                    &mut self.rng,
                    &self.cancel,
                );
                match outcome {
                    Ok(delay) => {
                        self.stats.steps += 1;
                        StepOutcome::Advanced(delay)
                    }
                    Err(err) => {
                        self.stats.failures += 1;
                        warn!(error = %err, "pattern step failed, skipping iteration");
                        StepOutcome::Failed(err)
                    }
                }
            }
            None => StepOutcome::Idle,
        }
    }

    fn apply(&mut self, snapshot: RuntimeSnapshot) -> StepOutcome {
        self.applied_generation = snapshot.generation;
        self.phase = RunnerPhase::Switching;
        self.frame.reset_with_globals(&self.globals);
        self.active = None;

        let Some(selection) = snapshot.selection else {
            self.phase = RunnerPhase::Idle;
            debug!(generation = snapshot.generation, "pattern cleared, buffer blanked");
            return StepOutcome::Blanked;
        };

        let Some(descriptor) = self.catalog.get(selection.key) else {
            self.phase = RunnerPhase::Idle;
            error!(key = ?selection.key, "selected pattern is not in the catalog");
            return StepOutcome::Blanked;
        };

        self.active = Some(ActivePattern {
            selection,
            name: descriptor.name,
            pattern: descriptor.instantiate(),
        });
        self.stats.switches += 1;
        debug!(
            pattern = descriptor.name,
            category = descriptor.category.as_str(),
            speed = selection.speed.get(),
            "switched pattern"
        );
        StepOutcome::Switched(selection.key)
    }

    fn advance(
        active: &mut ActivePattern,
        frame: &FrameBuffer,
        rng: &mut PatternRng,
        cancel: &CancelToken,
    ) -> Result<Duration, PatternError> {
        let name = active.name;
        let speed: Speed = active.selection.speed;
        let pattern = &mut active.pattern;
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut ctx = StepContext {
                frame,
                speed,
                rng,
                cancel,
                now: Instant::now(),
            };
            pattern.advance(&mut ctx)
        }));
        result.unwrap_or_else(|payload| {
            Err(PatternError::Panicked {
                pattern: name,
                message: panic_message(payload.as_ref()),
            })
        })
    }

    /// Run until cancelled. Returns the collected counters.
    ///
    /// Between steps the runner waits for the delay the pattern asked for,
    /// waking early when a new selection is published or the runtime stops.
    pub fn run(mut self) -> RunnerStats {
        info!("pattern runner started");
        while !self.cancel.is_cancelled() {
            let wait = match self.step() {
                StepOutcome::Advanced(delay) => delay,
                StepOutcome::Failed(_) => self.failure_backoff,
                StepOutcome::Switched(_) | StepOutcome::Blanked => continue,
                StepOutcome::Idle => IDLE_RECHECK,
            };
            let snapshot = self
                .runtime
                .wait_for_change(self.applied_generation, Some(wait));
            if snapshot.stopped {
                break;
            }
        }
        info!(
            steps = self.stats.steps,
            switches = self.stats.switches,
            failures = self.stats.failures,
            "pattern runner stopped"
        );
        self.stats
    }

    /// Run on a dedicated thread.
    pub fn spawn(self) -> std::io::Result<JoinHandle<RunnerStats>> {
        thread::Builder::new()
            .name("pattern-runner".to_string())
            .spawn(move || self.run())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
