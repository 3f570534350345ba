//! Engine wiring: transmitter, runner and scheduler threads.
//!
//! The engine owns the shared frame buffer and runtime and enforces the
//! shutdown order: stop signal, scheduler, runner, full blank, transmitter
//! (which still sends the blank frame), link close.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use rand::SeedableRng;
use tracing::{error, info};

use crate::cancel::CancelToken;
use crate::catalog::PatternCatalog;
use crate::config::PlayerConfig;
use crate::error::Result;
use crate::labels::LabelTimeline;
use crate::link::Link;
use crate::pattern::{PatternRng, Speed};
use crate::runner::{PatternRunner, RunnerStats};
use crate::runtime::PatternRuntime;
use crate::scheduler::{LabelScheduler, ScheduleReport};
use crate::transmitter::{TransmitStats, Transmitter};
use crate::universe::FrameBuffer;

/// Keeps the runner's random stream apart from the scheduler's.
const RUNNER_SEED_MIX: u64 = 0x9e37_79b9_7f4a_7c15;

/// Everything the engine threads reported on shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineReport {
    pub seed: u64,
    pub schedule: Option<ScheduleReport>,
    pub runner: RunnerStats,
    pub transmit: TransmitStats,
}

/// Running engine.
pub struct Engine<L: Link + 'static> {
    seed: u64,
    frame: Arc<FrameBuffer>,
    runtime: Arc<PatternRuntime>,
    catalog: Arc<PatternCatalog>,
    cancel: CancelToken,
    transmit_cancel: CancelToken,
    transmitter: JoinHandle<(L, TransmitStats)>,
    runner: JoinHandle<RunnerStats>,
    scheduler: Option<JoinHandle<ScheduleReport>>,
}

impl<L: Link + 'static> Engine<L> {
    /// Assert globals, then start the transmitter and the runner.
    ///
    /// Nothing is selected until [`Engine::play`] or [`Engine::select`].
    pub fn start(link: L, config: &PlayerConfig, catalog: PatternCatalog) -> Result<Self> {
        Self::start_with_cancel(link, config, catalog, CancelToken::new())
    }

    /// Like [`Engine::start`], but every engine loop observes `cancel`.
    ///
    /// The token may be wired to a signal handler before the device is
    /// opened. If it already fired, the engine comes up and
    /// [`Engine::shutdown`] still blanks the fixture.
    pub fn start_with_cancel(
        link: L,
        config: &PlayerConfig,
        catalog: PatternCatalog,
        cancel: CancelToken,
    ) -> Result<Self> {
        let seed = config.seed.unwrap_or_else(rand::random);
        info!(seed, "engine starting");

        let frame = Arc::new(FrameBuffer::new());
        frame.reset_with_globals(&config.globals);

        let runtime = Arc::new(PatternRuntime::new());
        let catalog = Arc::new(catalog);
        let transmit_cancel = CancelToken::new();

        let transmitter = Transmitter::new(link, Arc::clone(&frame), config.timings())
            .spawn(transmit_cancel.clone())?;

        let runner = PatternRunner::new(
            Arc::clone(&runtime),
            Arc::clone(&frame),
            Arc::clone(&catalog),
            config.globals,
            PatternRng::seed_from_u64(seed ^ RUNNER_SEED_MIX),
            cancel.clone(),
        )
        .with_failure_backoff(config.failure_backoff());
        let runner = match runner.spawn() {
            Ok(handle) => handle,
            Err(err) => {
                transmit_cancel.cancel();
                if let Ok((mut link, _)) = transmitter.join() {
                    link.close();
                }
                return Err(err.into());
            }
        };

        Ok(Self {
            seed,
            frame,
            runtime,
            catalog,
            cancel,
            transmit_cancel,
            transmitter,
            runner,
            scheduler: None,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn frame(&self) -> &Arc<FrameBuffer> {
        &self.frame
    }

    pub fn runtime(&self) -> &Arc<PatternRuntime> {
        &self.runtime
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    /// Stop signal shared by every engine loop.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Start playing a label timeline on the scheduler thread.
    pub fn play(&mut self, timeline: LabelTimeline) -> Result<()> {
        let mut scheduler = LabelScheduler::new(
            Arc::clone(&self.catalog),
            PatternRng::seed_from_u64(self.seed),
        );
        let runtime = Arc::clone(&self.runtime);
        let cancel = self.cancel.clone();
        let handle = thread::Builder::new()
            .name("label-scheduler".to_string())
            .spawn(move || scheduler.run(&timeline, &runtime, &cancel))?;
        self.scheduler = Some(handle);
        Ok(())
    }

    /// Whether a started timeline has been played to the end.
    pub fn is_show_finished(&self) -> bool {
        self.scheduler
            .as_ref()
            .is_none_or(JoinHandle::is_finished)
    }

    /// Run one pattern by name, bypassing the scheduler.
    ///
    /// Returns `false` for an unknown name.
    pub fn select(&self, name: &str, speed: Speed) -> bool {
        match self.catalog.by_name(name) {
            Some(key) => {
                self.runtime.publish(key, speed);
                true
            }
            None => false,
        }
    }

    /// Stop every thread in order and blank the fixture.
    pub fn shutdown(self) -> EngineReport {
        info!("engine shutting down");
        self.cancel.cancel();
        self.runtime.shutdown();

        let schedule = self.scheduler.and_then(|handle| {
            handle
                .join()
                .inspect_err(|_| error!("label scheduler thread panicked"))
                .ok()
        });

        let runner = self.runner.join().unwrap_or_else(|_| {
            error!("pattern runner thread panicked");
            RunnerStats::default()
        });

        // Full blank: the globals go dark too.
        self.frame.reset_all();

        self.transmit_cancel.cancel();
        let transmit = match self.transmitter.join() {
            Ok((mut link, stats)) => {
                link.close();
                stats
            }
            Err(_) => {
                error!("transmitter thread panicked, link was not closed");
                TransmitStats::default()
            }
        };

        info!(
            frames = transmit.frames_sent,
            switches = runner.switches,
            "engine stopped"
        );
        EngineReport {
            seed: self.seed,
            schedule,
            runner,
            transmit,
        }
    }
}
