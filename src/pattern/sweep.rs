//! Positional sweeps of a dot or a line across the vertical pan range.

use embassy_time::Duration;

use super::{CH_PAN_Y, CH_SHAPE, Pattern, SHAPE_DOT, SHAPE_LINE, StepContext};
use crate::error::PatternError;

const SWEEP_LOW: i32 = 33;
const SWEEP_HIGH: i32 = 95;
/// Descending sweeps start one step above the range and wrap back here.
const SWEEP_DESCENDING_START: i32 = SWEEP_HIGH + 1;

/// 1 / (50 * speed) seconds.
const DOT_UNIT_US: u64 = 20_000;
/// 1 / (100 * speed) seconds.
const LINE_UNIT_US: u64 = 10_000;

/// How a sweep moves through the pan range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepMotion {
    /// 33 up to 95, then wrap to 33.
    Ascending,
    /// 96 down to 33, then wrap to 96.
    Descending,
    /// Back and forth, starting upwards from 33.
    BounceUp,
    /// Back and forth, starting downwards from 96.
    BounceDown,
}

/// Dot or line stepping one pan position per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sweep {
    shape: u8,
    unit_us: u64,
    motion: SweepMotion,
    position: i32,
    rising: bool,
}

impl Sweep {
    fn new(shape: u8, unit_us: u64, motion: SweepMotion) -> Self {
        let (position, rising) = match motion {
            SweepMotion::Ascending | SweepMotion::BounceUp => (SWEEP_LOW, true),
            SweepMotion::Descending | SweepMotion::BounceDown => {
                (SWEEP_DESCENDING_START, false)
            }
        };
        Self {
            shape,
            unit_us,
            motion,
            position,
            rising,
        }
    }

    pub fn dot(motion: SweepMotion) -> Self {
        Self::new(SHAPE_DOT, DOT_UNIT_US, motion)
    }

    pub fn line(motion: SweepMotion) -> Self {
        Self::new(SHAPE_LINE, LINE_UNIT_US, motion)
    }

    /// Pan position written by the next step.
    pub fn position(&self) -> i32 {
        self.position
    }

    fn step(&mut self) {
        match self.motion {
            SweepMotion::Ascending => {
                self.position += 1;
                if self.position > SWEEP_HIGH {
                    self.position = SWEEP_LOW;
                }
            }
            SweepMotion::Descending => {
                self.position -= 1;
                if self.position < SWEEP_LOW {
                    self.position = SWEEP_DESCENDING_START;
                }
            }
            SweepMotion::BounceUp | SweepMotion::BounceDown => {
                if self.rising {
                    self.position += 1;
                    if self.position > SWEEP_HIGH {
                        self.rising = false;
                        self.position = SWEEP_HIGH;
                    }
                } else {
                    self.position -= 1;
                    if self.position < SWEEP_LOW {
                        self.rising = true;
                        self.position = SWEEP_LOW;
                    }
                }
            }
        }
    }
}

impl Pattern for Sweep {
    fn advance(&mut self, ctx: &mut StepContext<'_>) -> Result<Duration, PatternError> {
        ctx.set(CH_SHAPE, i32::from(self.shape));
        ctx.set(CH_PAN_Y, self.position);
        self.step();
        Ok(ctx.speed.period(self.unit_us))
    }
}
