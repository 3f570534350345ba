//! Continuous DMX transmitter.
//!
//! Serialises whatever is in the frame buffer at a fixed cadence. It never
//! decides what to send and never waits on pattern logic.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use embassy_time::{Duration, Instant, block_for};
use tracing::{debug, error, warn};

use crate::cancel::CancelToken;
use crate::config::TransmitTimings;
use crate::error::TimingViolation;
use crate::frame_scheduler::FramePacer;
use crate::link::Link;
use crate::universe::FrameBuffer;

/// Log every Nth timing violation after the first one.
const VIOLATION_LOG_EVERY: u64 = 400;

/// Counters collected by a transmitter run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransmitStats {
    pub frames_sent: u64,
    pub write_errors: u64,
    pub timing_violations: u64,
}

/// Dedicated DMX frame loop.
pub struct Transmitter<L: Link> {
    link: L,
    frame: Arc<FrameBuffer>,
    timings: TransmitTimings,
    pacer: FramePacer,
    stats: TransmitStats,
}

impl<L: Link> Transmitter<L> {
    pub fn new(link: L, frame: Arc<FrameBuffer>, timings: TransmitTimings) -> Self {
        Self {
            link,
            frame,
            pacer: FramePacer::new(timings.frame_period),
            timings,
            stats: TransmitStats::default(),
        }
    }

    pub fn stats(&self) -> TransmitStats {
        self.stats
    }

    /// Send one complete frame: break, mark-after-break, data.
    ///
    /// Returns the first timing floor that was missed, if any. The data is
    /// written regardless.
    pub fn send_frame(&mut self) -> io::Result<Option<TimingViolation>> {
        let break_held = self.hold_line(true, self.timings.break_time);
        let mark_held = self.hold_line(false, self.timings.mark_after_break);

        let violation = TimingViolation::check("break", break_held, self.timings.break_time)
            .or_else(|| {
                TimingViolation::check(
                    "mark-after-break",
                    mark_held,
                    self.timings.mark_after_break,
                )
            });

        let data = self.frame.snapshot();
        self.link.write_frame(&data)?;
        self.stats.frames_sent += 1;
        Ok(violation)
    }

    /// Drive the line into a state and hold it for at least `floor`.
    ///
    /// Returns how long the state was actually held. A link that cannot
    /// change the line state reports zero.
    fn hold_line(&mut self, asserted: bool, floor: Duration) -> Duration {
        if let Err(err) = self.link.set_break(asserted) {
            debug!(asserted, error = %err, "link rejected break state change");
            return Duration::from_ticks(0);
        }
        let start = Instant::now();
        block_for(floor);
        Instant::now() - start
    }

    /// Run until `cancel` fires, then send one last frame and hand back the link.
    ///
    /// The final frame carries whatever the buffer holds at stop time, so a
    /// buffer blanked before cancelling reaches the fixture.
    pub fn run(mut self, cancel: &CancelToken) -> (L, TransmitStats) {
        debug!(
            period_us = self.timings.frame_period.as_micros(),
            "transmitter started"
        );
        while !cancel.is_cancelled() {
            self.transmit_once();
            let result = self.pacer.tick(Instant::now());
            thread::sleep(result.sleep_duration.into());
        }
        self.transmit_once();
        debug!(frames = self.stats.frames_sent, "transmitter stopped");
        (self.link, self.stats)
    }

    fn transmit_once(&mut self) {
        match self.send_frame() {
            Ok(None) => {}
            Ok(Some(violation)) => {
                self.stats.timing_violations += 1;
                let count = self.stats.timing_violations;
                if count == 1 || count.is_multiple_of(VIOLATION_LOG_EVERY) {
                    warn!(%violation, count, "DMX timing violation, receivers may drop frames");
                }
            }
            Err(err) => {
                self.stats.write_errors += 1;
                error!(error = %err, "failed to write DMX frame");
            }
        }
    }
}

impl<L: Link + 'static> Transmitter<L> {
    /// Run the transmitter on its own thread.
    pub fn spawn(self, cancel: CancelToken) -> io::Result<JoinHandle<(L, TransmitStats)>> {
        thread::Builder::new()
            .name("dmx-transmitter".to_string())
            .spawn(move || self.run(&cancel))
    }
}
