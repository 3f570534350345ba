//! Single-channel oscillators bouncing between two limits.

use embassy_time::Duration;

use super::{
    CH_AUTO_Y, CH_ROTATION, CH_SHAPE, CH_ZOOM, Pattern, SHAPE_CIRCLE, SHAPE_WAVE, StepContext,
};
use crate::error::PatternError;

const ZOOM_LOW: i32 = 0;
const ZOOM_HIGH: i32 = 127;
const ZOOM_STRIDE: i32 = 4;
/// 1 / (100 * speed) seconds.
const ZOOM_UNIT_US: u64 = 10_000;

const WIGGLE_LOW: i32 = 40;
const WIGGLE_HIGH: i32 = 100;
const WIGGLE_ROTATION: i32 = 33;
/// 1 / (50 * speed) seconds.
const WIGGLE_UNIT_US: u64 = 20_000;

/// Moves one channel back and forth between `low` and `high`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Oscillator {
    shape: u8,
    channel: usize,
    /// Extra channel held at a fixed value while oscillating.
    fixed: Option<(usize, i32)>,
    low: i32,
    high: i32,
    stride: i32,
    unit_us: u64,
    value: i32,
    direction: i32,
}

impl Oscillator {
    /// Circle zooming in and out on the zoom channel.
    pub fn circle_zoom() -> Self {
        Self {
            shape: SHAPE_CIRCLE,
            channel: CH_ZOOM,
            fixed: None,
            low: ZOOM_LOW,
            high: ZOOM_HIGH,
            stride: ZOOM_STRIDE,
            unit_us: ZOOM_UNIT_US,
            value: ZOOM_LOW,
            direction: 1,
        }
    }

    /// Rotated wave whose amplitude swings on the auto-Y channel.
    pub fn wiggle_line() -> Self {
        Self {
            shape: SHAPE_WAVE,
            channel: CH_AUTO_Y,
            fixed: Some((CH_ROTATION, WIGGLE_ROTATION)),
            low: WIGGLE_LOW,
            high: WIGGLE_HIGH,
            stride: 1,
            unit_us: WIGGLE_UNIT_US,
            value: WIGGLE_LOW,
            direction: 1,
        }
    }

    /// Value written by the next step.
    pub fn value(&self) -> i32 {
        self.value
    }
}

impl Pattern for Oscillator {
    fn advance(&mut self, ctx: &mut StepContext<'_>) -> Result<Duration, PatternError> {
        ctx.set(CH_SHAPE, i32::from(self.shape));
        if let Some((channel, value)) = self.fixed {
            ctx.set(channel, value);
        }
        ctx.set(self.channel, self.value);

        self.value += self.stride * self.direction;
        if self.value >= self.high {
            self.direction = -1;
            self.value = self.high;
        } else if self.value <= self.low {
            self.direction = 1;
            self.value = self.low;
        }

        Ok(ctx.speed.period(self.unit_us))
    }
}
