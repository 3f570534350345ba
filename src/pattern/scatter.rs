//! Randomly placed dots and circles.

use embassy_time::Duration;
use rand::Rng;

use super::{CH_PAN_X, CH_PAN_Y, CH_SHAPE, Pattern, SHAPE_CIRCLE, SHAPE_DOT, StepContext};
use crate::error::PatternError;

const POSITION_MAX: i32 = 127;
const CRAZY_DOTS_CYCLE: u32 = 20;
/// 1 / speed seconds.
const CRAZY_DOTS_UNIT_US: u64 = 1_000_000;
/// 1 / (50 * speed) seconds.
const SPAZZ_UNIT_US: u64 = 20_000;
const HOLD_DELAY: Duration = Duration::from_millis(100);

fn random_position(ctx: &mut StepContext<'_>) -> (i32, i32) {
    (
        ctx.rng.random_range(0..=POSITION_MAX),
        ctx.rng.random_range(0..=POSITION_MAX),
    )
}

/// A dot flashed at a new random spot every step, slowing with low speed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrazyDots {
    flashes: u32,
}

impl CrazyDots {
    /// Flashes since the counter last wrapped.
    pub fn flashes(&self) -> u32 {
        self.flashes
    }
}

impl Pattern for CrazyDots {
    fn advance(&mut self, ctx: &mut StepContext<'_>) -> Result<Duration, PatternError> {
        ctx.set(CH_SHAPE, i32::from(SHAPE_DOT));
        let (x, y) = random_position(ctx);
        ctx.set(CH_PAN_X, x);
        ctx.set(CH_PAN_Y, y);

        self.flashes += 1;
        if self.flashes > CRAZY_DOTS_CYCLE {
            self.flashes = 0;
        }

        Ok(ctx.speed.period(CRAZY_DOTS_UNIT_US))
    }
}

/// One random dot position per step at a fixed pace, ignoring speed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RandomDot;

impl Pattern for RandomDot {
    fn advance(&mut self, ctx: &mut StepContext<'_>) -> Result<Duration, PatternError> {
        ctx.set(CH_SHAPE, i32::from(SHAPE_DOT));
        let (x, y) = random_position(ctx);
        ctx.set(CH_PAN_X, x);
        ctx.set(CH_PAN_Y, y);
        Ok(HOLD_DELAY)
    }
}

/// Circle jumping to random positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpazzCircle {
    initialized: bool,
}

impl Pattern for SpazzCircle {
    fn advance(&mut self, ctx: &mut StepContext<'_>) -> Result<Duration, PatternError> {
        if !self.initialized {
            ctx.set(CH_SHAPE, i32::from(SHAPE_CIRCLE));
            self.initialized = true;
        }
        let (x, y) = random_position(ctx);
        ctx.set(CH_PAN_X, x);
        ctx.set(CH_PAN_Y, y);
        Ok(ctx.speed.period(SPAZZ_UNIT_US))
    }
}

/// Beam parked at a random position chosen on the first step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StillBeam {
    position: Option<(i32, i32)>,
}

impl StillBeam {
    pub fn position(&self) -> Option<(i32, i32)> {
        self.position
    }
}

impl Pattern for StillBeam {
    fn advance(&mut self, ctx: &mut StepContext<'_>) -> Result<Duration, PatternError> {
        let (x, y) = match self.position {
            Some(position) => position,
            None => {
                ctx.set(CH_SHAPE, i32::from(SHAPE_DOT));
                let position = random_position(ctx);
                self.position = Some(position);
                position
            }
        };
        ctx.set(CH_PAN_X, x);
        ctx.set(CH_PAN_Y, y);
        Ok(HOLD_DELAY)
    }
}
