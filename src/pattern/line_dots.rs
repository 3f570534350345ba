//! Two-laser pattern: a rotated line panning slowly while a row of dots
//! races along it on the second laser.

use embassy_time::Duration;

use super::{
    CH_LASER2_DOTS, CH_LASER2_MODE, CH_LASER2_PAN, CH_LASER2_ROTATION, CH_LASER2_SHAPE,
    CH_LASER2_SIZE, CH_PAN_X, CH_ROTATION, CH_SHAPE, Pattern, SHAPE_LINE, StepContext,
};
use crate::error::PatternError;

const ROTATE_QUARTER: i32 = 32;
const LASER2_ON: i32 = 23;
const LASER2_FULL_SIZE: i32 = 0;
const LASER2_SPACED_DOTS: i32 = 57;

const PAN_LOW: i32 = 33;
const PAN_HIGH: i32 = 95;
const DOTS_HIGH: i32 = 127;
const DOTS_STRIDE: i32 = 3;
/// 0.2 / speed seconds.
const LINE_DOTS_UNIT_US: u64 = 200_000;

/// Line with dots moving inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineWithDots {
    pan: i32,
    pan_direction: i32,
    dots: i32,
}

impl Default for LineWithDots {
    fn default() -> Self {
        Self {
            pan: PAN_LOW,
            pan_direction: 1,
            dots: 0,
        }
    }
}

impl LineWithDots {
    /// Current (pan, dots) positions.
    pub fn positions(&self) -> (i32, i32) {
        (self.pan, self.dots)
    }
}

impl Pattern for LineWithDots {
    fn advance(&mut self, ctx: &mut StepContext<'_>) -> Result<Duration, PatternError> {
        let delay = ctx.speed.period(LINE_DOTS_UNIT_US);

        ctx.set(CH_SHAPE, i32::from(SHAPE_LINE));
        ctx.set(CH_ROTATION, ROTATE_QUARTER);
        ctx.set(CH_LASER2_MODE, LASER2_ON);
        ctx.set(CH_LASER2_SIZE, LASER2_FULL_SIZE);
        ctx.set(CH_LASER2_SHAPE, LASER2_SPACED_DOTS);
        ctx.set(CH_LASER2_ROTATION, ROTATE_QUARTER);

        // Setup is done; leave the motion untouched if we are shutting down.
        if ctx.is_cancelled() {
            return Ok(delay);
        }

        self.pan += self.pan_direction;
        if self.pan >= PAN_HIGH {
            self.pan = PAN_HIGH;
            self.pan_direction = -1;
        } else if self.pan <= PAN_LOW {
            self.pan = PAN_LOW;
            self.pan_direction = 1;
        }

        self.dots += DOTS_STRIDE;
        if self.dots >= DOTS_HIGH {
            self.dots = 0;
        }

        ctx.set(CH_PAN_X, self.pan);
        ctx.set(CH_LASER2_PAN, self.pan);
        ctx.set(CH_LASER2_DOTS, self.dots);

        Ok(delay)
    }
}
