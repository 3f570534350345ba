//! Label-driven scheduler.
//!
//! Walks the label timeline at its tick rate and turns label changes into
//! runtime decisions. Identical consecutive labels never reselect, so a
//! pattern keeps its progression for as long as its label holds.

use std::sync::Arc;
use std::thread;

use embassy_time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::catalog::{Category, PatternCatalog, PatternKey};
use crate::frame_scheduler::FramePacer;
use crate::labels::{Label, LabelTimeline};
use crate::pattern::{PatternRng, Speed};
use crate::runtime::PatternRuntime;

/// A change the scheduler wants the runtime to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Run `pattern` (drawn from `category`) at `speed`.
    Select {
        tick: usize,
        category: Category,
        speed: Speed,
        pattern: PatternKey,
    },
    /// Lights off.
    Off { tick: usize },
}

impl Decision {
    pub const fn tick(&self) -> usize {
        match *self {
            Self::Select { tick, .. } | Self::Off { tick } => tick,
        }
    }

    /// Hand the decision to the runtime.
    pub fn apply(&self, runtime: &PatternRuntime) -> bool {
        match *self {
            Self::Select { pattern, speed, .. } => runtime.publish(pattern, speed),
            Self::Off { .. } => runtime.clear(),
        }
    }
}

/// Summary of one timeline playback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleReport {
    /// Ticks whose label was evaluated.
    pub ticks: u64,
    /// Decisions published to the runtime.
    pub decisions: u64,
    /// Ticks skipped because the scheduler fell behind.
    pub late_ticks: u64,
    /// Whether the timeline ran to its end.
    pub completed: bool,
}

/// Where playback continues after one evaluated tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TickAdvance {
    next: usize,
    skipped: usize,
    sleep: Duration,
}

/// Pace one tick. After a stall the ticks whose slot already passed are
/// dropped and the one due now is evaluated without sleeping.
fn advance_tick(
    pacer: &mut FramePacer,
    started: Instant,
    tick: usize,
    now: Instant,
) -> TickAdvance {
    let result = pacer.tick(now);
    if !result.resynced {
        return TickAdvance {
            next: tick + 1,
            skipped: 0,
            sleep: result.sleep_duration,
        };
    }

    let period = pacer.frame_duration().as_ticks().max(1);
    let elapsed = now.saturating_duration_since(started).as_ticks();
    let due = usize::try_from(elapsed / period).unwrap_or(usize::MAX);
    let next = due.max(tick + 1);
    pacer.reset();
    TickAdvance {
        next,
        skipped: next - (tick + 1),
        sleep: Duration::from_ticks(0),
    }
}

/// Stateful label interpreter.
pub struct LabelScheduler {
    catalog: Arc<PatternCatalog>,
    rng: PatternRng,
    last: Option<(Category, Speed)>,
}

impl LabelScheduler {
    pub fn new(catalog: Arc<PatternCatalog>, rng: PatternRng) -> Self {
        Self {
            catalog,
            rng,
            last: None,
        }
    }

    /// Category and speed last published, if a pattern is active.
    pub fn last_published(&self) -> Option<(Category, Speed)> {
        self.last
    }

    /// Interpret the label of one tick.
    ///
    /// Returns `None` when nothing changes.
    pub fn decide(&mut self, tick: usize, label: Label) -> Option<Decision> {
        let (Some(category), Some(speed)) = (
            Category::from_raw(label.category),
            Speed::new(label.speed),
        ) else {
            if label.category != 0 && label.speed != 0 {
                warn!(tick, category = label.category, "unknown category label ignored");
                return None;
            }
            return self.last.take().map(|_| Decision::Off { tick });
        };

        if self.last == Some((category, speed)) {
            return None;
        }

        let Some(pattern) = self.catalog.choose(category, &mut self.rng) else {
            warn!(tick, category = category.as_str(), "no pattern in category");
            return None;
        };
        self.last = Some((category, speed));
        Some(Decision::Select {
            tick,
            category,
            speed,
            pattern,
        })
    }

    /// Play the timeline in real time, publishing every decision.
    ///
    /// Stops early when `cancel` fires. Falling more than two ticks behind
    /// skips ahead to the label that is due now instead of replaying the
    /// backlog.
    pub fn run(
        &mut self,
        timeline: &LabelTimeline,
        runtime: &PatternRuntime,
        cancel: &CancelToken,
    ) -> ScheduleReport {
        let mut pacer = FramePacer::new(timeline.tick_period());
        let mut report = ScheduleReport::default();
        let started = Instant::now();

        info!(
            ticks = timeline.len(),
            tick_rate = timeline.tick_rate(),
            "label playback started"
        );

        let mut tick = 0;
        while let Some(label) = timeline.get(tick) {
            if cancel.is_cancelled() {
                break;
            }

            if let Some(decision) = self.decide(tick, label) {
                debug!(tick = decision.tick(), ?decision, "label decision");
                decision.apply(runtime);
                report.decisions += 1;
            }
            report.ticks += 1;

            let step = advance_tick(&mut pacer, started, tick, Instant::now());
            if step.skipped > 0 {
                report.late_ticks += step.skipped as u64;
                warn!(skipped = step.skipped, "label scheduler fell behind, dropping ticks");
            }
            tick = step.next;
            if step.sleep > Duration::from_ticks(0) {
                thread::sleep(step.sleep.into());
            }
        }

        report.completed = tick >= timeline.len();
        info!(
            ticks = report.ticks,
            decisions = report.decisions,
            late_ticks = report.late_ticks,
            completed = report.completed,
            "label playback finished"
        );
        report
    }
}
