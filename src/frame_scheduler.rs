//! Frame pacing utilities.
//!
//! Provides portable fixed-cadence pacing without platform-specific timers.
//! The caller is responsible for sleeping between ticks. Used by the
//! transmitter (frame cadence) and the label scheduler (tick cadence).

use embassy_time::{Duration, Instant};

/// Result of a pacing tick.
#[derive(Debug, Clone, Copy)]
pub struct FrameResult {
    /// The deadline for the next tick.
    pub next_deadline: Instant,
    /// How long to wait until the next tick (zero if behind schedule).
    pub sleep_duration: Duration,
    /// Whether the backlog was dropped on this tick.
    pub resynced: bool,
}

/// Fixed-cadence pacer with drift correction.
///
/// If a tick arrives more than two periods late, the backlog is skipped
/// instead of caught up, so a stall never produces a burst of ticks.
///
/// # Usage
///
/// ```ignore
/// let mut pacer = FramePacer::new(Duration::from_millis(25));
///
/// loop {
///     do_work();
///     let result = pacer.tick(Instant::now());
///     std::thread::sleep(result.sleep_duration.into());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FramePacer {
    next_frame: Option<Instant>,
    frame_duration: Duration,
}

impl FramePacer {
    /// Create a pacer with the given period.
    pub const fn new(frame_duration: Duration) -> Self {
        Self {
            next_frame: None,
            frame_duration,
        }
    }

    pub const fn frame_duration(&self) -> Duration {
        self.frame_duration
    }

    /// Mark one tick as done at `now` and compute the wait for the next one.
    ///
    /// The first call anchors the schedule at `now`.
    pub fn tick(&mut self, now: Instant) -> FrameResult {
        let mut next_frame = self.next_frame.unwrap_or(now);

        // If we've fallen too far behind, reset to now
        let max_drift = self.frame_duration * 2;
        let resynced = now > next_frame + max_drift;
        if resynced {
            next_frame = now;
        }

        next_frame += self.frame_duration;
        self.next_frame = Some(next_frame);

        let sleep_duration = if next_frame > now {
            next_frame - now
        } else {
            Duration::from_ticks(0)
        };

        FrameResult {
            next_deadline: next_frame,
            sleep_duration,
            resynced,
        }
    }

    /// Forget the schedule; the next tick anchors a fresh one.
    pub fn reset(&mut self) {
        self.next_frame = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pacer_keeps_cadence() {
        let mut pacer = FramePacer::new(Duration::from_millis(25));
        let first = pacer.tick(Instant::from_millis(1000));
        assert_eq!(first.next_deadline, Instant::from_millis(1025));
        assert_eq!(first.sleep_duration, Duration::from_millis(25));

        // Work took 5ms, so only 20ms are left.
        let second = pacer.tick(Instant::from_millis(1030));
        assert_eq!(second.next_deadline, Instant::from_millis(1050));
        assert_eq!(second.sleep_duration, Duration::from_millis(20));
        assert!(!second.resynced);
    }

    #[test]
    fn test_pacer_drops_backlog() {
        let mut pacer = FramePacer::new(Duration::from_millis(100));
        pacer.tick(Instant::from_millis(0));
        // Deadline was 100ms, we are 400ms late.
        let late = pacer.tick(Instant::from_millis(500));
        assert!(late.resynced);
        assert_eq!(late.next_deadline, Instant::from_millis(600));
        assert_eq!(late.sleep_duration, Duration::from_millis(100));
    }

    #[test]
    fn test_pacer_small_lateness_is_absorbed() {
        let mut pacer = FramePacer::new(Duration::from_millis(100));
        pacer.tick(Instant::from_millis(0));
        let late = pacer.tick(Instant::from_millis(150));
        assert!(!late.resynced);
        assert_eq!(late.next_deadline, Instant::from_millis(200));
        assert_eq!(late.sleep_duration, Duration::from_millis(50));
    }

    #[test]
    fn test_reset_anchors_fresh_schedule() {
        let mut pacer = FramePacer::new(Duration::from_millis(100));
        pacer.tick(Instant::from_millis(0));
        pacer.reset();
        let next = pacer.tick(Instant::from_millis(130));
        assert!(!next.resynced);
        assert_eq!(next.next_deadline, Instant::from_millis(230));
    }
}
