//! Stepping laser patterns.
//!
//! Every pattern owns its progression state and implements [`Pattern`]:
//! one call to `advance` performs one bounded unit of work on the frame
//! buffer and returns how long the runner should wait before the next call.
//! Looping is owned entirely by the runner.

mod auto_motion;
mod drift;
mod line_dots;
mod oscillate;
mod scatter;
mod sweep;

use core::num::NonZeroU8;

use embassy_time::{Duration, Instant};

pub use auto_motion::AutoMotion;
pub use drift::{DriftingDot, Spotlight};
pub use line_dots::LineWithDots;
pub use oscillate::Oscillator;
pub use scatter::{CrazyDots, RandomDot, SpazzCircle, StillBeam};
pub use sweep::{Sweep, SweepMotion};

use crate::cancel::CancelToken;
use crate::error::PatternError;
use crate::universe::FrameBuffer;

/// Random source handed to patterns and the label scheduler.
pub type PatternRng = rand_pcg::Pcg32;

pub const PATTERN_NAME_STILL_BEAM: &str = "still_beam";
pub const PATTERN_NAME_DOT_LR: &str = "dot_lr";
pub const PATTERN_NAME_DOT_RL: &str = "dot_rl";
pub const PATTERN_NAME_SIDE_TO_SIDE_DOT: &str = "side_to_side_dot";
pub const PATTERN_NAME_RANDOM_SINGLE_DOT: &str = "random_single_dot";
pub const PATTERN_NAME_HORIZONTAL_LINE_RL: &str = "horizontal_line_rl";
pub const PATTERN_NAME_HORIZONTAL_LINE_LR: &str = "horizontal_line_lr";
pub const PATTERN_NAME_HORIZONTAL_LINE_SIDE_TO_SIDE: &str = "horizontal_line_side_to_side";
pub const PATTERN_NAME_CIRCLE_ZOOM_IN: &str = "circle_zoom_in";
pub const PATTERN_NAME_CRAZY_DOTS: &str = "crazy_dots";
pub const PATTERN_NAME_CRAZY_DOTS_AUTO: &str = "crazy_dots_auto";
pub const PATTERN_NAME_LINE_WITH_DOTS_RL: &str = "line_with_dots_rl";
pub const PATTERN_NAME_SPAZZ_CIRCLE: &str = "spazz_circle";
pub const PATTERN_NAME_WIGGLE_LINE: &str = "wiggle_line";
pub const PATTERN_NAME_SPOTLIGHT: &str = "spotlight";
pub const PATTERN_NAME_DRIFTING_DOT: &str = "drifting_dot";
pub const PATTERN_NAME_VOICE_WAVE: &str = "voice_wave";
pub const PATTERN_NAME_TWO_CIRCLE_SPIN: &str = "two_circle_spin";

// Fixture channel map (laser 1 unless noted)
pub(crate) const CH_SHAPE: usize = 4;
pub(crate) const CH_ZOOM: usize = 5;
pub(crate) const CH_ROTATION: usize = 6;
pub(crate) const CH_PAN_X: usize = 7;
pub(crate) const CH_PAN_Y: usize = 8;
pub(crate) const CH_AUTO_X: usize = 9;
pub(crate) const CH_AUTO_Y: usize = 10;
pub(crate) const CH_LASER2_MODE: usize = 18;
pub(crate) const CH_LASER2_SIZE: usize = 19;
pub(crate) const CH_LASER2_SHAPE: usize = 21;
pub(crate) const CH_LASER2_ROTATION: usize = 23;
pub(crate) const CH_LASER2_PAN: usize = 24;
pub(crate) const CH_LASER2_DOTS: usize = 25;

// Shape selector values for `CH_SHAPE`
pub(crate) const SHAPE_CIRCLE: u8 = 5;
pub(crate) const SHAPE_DOT: u8 = 16;
pub(crate) const SHAPE_LINE: u8 = 45;
pub(crate) const SHAPE_WAVE: u8 = 51;
pub(crate) const SHAPE_SCATTER: u8 = 78;
pub(crate) const SHAPE_TWIN_CIRCLE: u8 = 83;

/// Highest speed level produced by the labeling tools.
pub const MAX_SPEED_LEVEL: u8 = 10;

/// Speed level of a pattern, never zero.
///
/// Zero is the "lights off" sentinel in label data and is handled by the
/// scheduler before a pattern ever sees a speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Speed(NonZeroU8);

impl Speed {
    pub const fn new(level: u8) -> Option<Self> {
        match NonZeroU8::new(level) {
            Some(level) => Some(Self(level)),
            None => None,
        }
    }

    pub const fn get(self) -> u8 {
        self.0.get()
    }

    /// `unit_us / speed` microseconds: the usual "faster means shorter" delay.
    pub fn period(self, unit_us: u64) -> Duration {
        Duration::from_micros(unit_us / u64::from(self.get()))
    }

    /// Map the speed level linearly onto a fixture value range.
    ///
    /// Level 0 maps to `start`, level 10 maps to `stop`. Levels above 10
    /// extrapolate past `stop`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn in_range(self, start: i32, stop: i32) -> i32 {
        let difference = f64::from(stop - start);
        let value = f64::from(start)
            + f64::from(self.get()) * (difference / f64::from(MAX_SPEED_LEVEL));
        libm::floor(value) as i32
    }
}

/// Everything a pattern may touch during one step.
pub struct StepContext<'a> {
    pub frame: &'a FrameBuffer,
    pub speed: Speed,
    pub rng: &'a mut PatternRng,
    pub cancel: &'a CancelToken,
    pub now: Instant,
}

impl StepContext<'_> {
    /// Shorthand for writing one channel.
    pub fn set(&self, channel: usize, value: i32) {
        self.frame.set_channel(channel, value);
    }

    /// Whether the engine is shutting down.
    ///
    /// Patterns whose step has several phases check this between phases.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// A stepping animation.
pub trait Pattern: Send {
    /// Perform one step and return the wait before the next one.
    fn advance(&mut self, ctx: &mut StepContext<'_>) -> Result<Duration, PatternError>;
}
