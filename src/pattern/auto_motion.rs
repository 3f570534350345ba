//! Patterns that hand motion over to the fixture's built-in auto movement.
//!
//! The step only selects a shape once and keeps the auto-movement channels
//! at a rate derived from the speed level.

use embassy_time::Duration;

use super::{
    CH_AUTO_X, CH_AUTO_Y, CH_ROTATION, CH_SHAPE, Pattern, SHAPE_CIRCLE, SHAPE_SCATTER,
    SHAPE_TWIN_CIRCLE, StepContext,
};
use crate::error::PatternError;

const AUTO_MOVE_LOW: i32 = 128;
const AUTO_MOVE_HIGH: i32 = 159;
const AUTO_SPIN_LOW: i32 = 192;
const AUTO_SPIN_HIGH: i32 = 223;
const REFRESH_DELAY: Duration = Duration::from_millis(50);

/// Fixture-driven motion at a speed-dependent rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoMotion {
    shape: u8,
    channels: &'static [usize],
    low: i32,
    high: i32,
    /// Never exceed `high`, even for speed levels above 10.
    saturate: bool,
    initialized: bool,
}

impl AutoMotion {
    const fn new(shape: u8, channels: &'static [usize], low: i32, high: i32, saturate: bool) -> Self {
        Self {
            shape,
            channels,
            low,
            high,
            saturate,
            initialized: false,
        }
    }

    /// Scattered dots wandering on both auto axes.
    pub const fn crazy_dots() -> Self {
        Self::new(
            SHAPE_SCATTER,
            &[CH_AUTO_X, CH_AUTO_Y],
            AUTO_MOVE_LOW,
            AUTO_MOVE_HIGH,
            true,
        )
    }

    /// Two circles spinning around each other.
    pub const fn two_circle_spin() -> Self {
        Self::new(
            SHAPE_TWIN_CIRCLE,
            &[CH_ROTATION],
            AUTO_SPIN_LOW,
            AUTO_SPIN_HIGH,
            false,
        )
    }

    /// Circle swaying on the horizontal auto axis.
    pub const fn voice_wave() -> Self {
        Self::new(
            SHAPE_CIRCLE,
            &[CH_AUTO_X],
            AUTO_MOVE_LOW,
            AUTO_MOVE_HIGH,
            false,
        )
    }
}

impl Pattern for AutoMotion {
    fn advance(&mut self, ctx: &mut StepContext<'_>) -> Result<Duration, PatternError> {
        if !self.initialized {
            ctx.set(CH_SHAPE, i32::from(self.shape));
            self.initialized = true;
        }

        let mut rate = ctx.speed.in_range(self.low, self.high);
        if self.saturate {
            rate = rate.min(self.high);
        }
        for &channel in self.channels {
            ctx.set(channel, rate);
        }

        Ok(REFRESH_DELAY)
    }
}
