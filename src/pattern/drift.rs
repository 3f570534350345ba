//! Organic free-moving beams.

use core::f32::consts::{PI, TAU};

use embassy_time::{Duration, Instant};
use rand::Rng;

use super::{CH_PAN_X, CH_PAN_Y, CH_SHAPE, Pattern, SHAPE_CIRCLE, SHAPE_DOT, StepContext};
use crate::config::GLOBAL_GROUP_CHANNEL;
use crate::error::PatternError;

const SPOTLIGHT_LOW: f32 = 47.0;
const SPOTLIGHT_HIGH: f32 = 80.0;
/// Smaller pattern size while the spotlight runs.
const SPOTLIGHT_GROUP: i32 = 29;
const SPOTLIGHT_LEG_MIN_MS: u64 = 1_000;
const SPOTLIGHT_LEG_MAX_MS: u64 = 3_000;
/// 0.1 / speed seconds.
const SPOTLIGHT_UNIT_US: u64 = 100_000;

const DRIFT_LOW: f32 = 33.0;
const DRIFT_HIGH: f32 = 96.0;
const DRIFT_MAX_SPEED: f32 = 3.0;
const DRIFT_DELAY: Duration = Duration::from_millis(50);

#[allow(clippy::cast_possible_truncation)]
fn to_channel(value: f32) -> i32 {
    libm::floorf(value) as i32
}

#[derive(Debug, Clone, PartialEq)]
struct SpotlightState {
    x: f32,
    y: f32,
    dx: f32,
    dy: f32,
    leg_started: Instant,
    leg_length: Duration,
}

impl SpotlightState {
    fn start(ctx: &mut StepContext<'_>) -> Self {
        let mut state = Self {
            x: ctx.rng.random_range(SPOTLIGHT_LOW..SPOTLIGHT_HIGH),
            y: ctx.rng.random_range(SPOTLIGHT_LOW..SPOTLIGHT_HIGH),
            dx: 0.0,
            dy: 0.0,
            leg_started: ctx.now,
            leg_length: Duration::from_ticks(0),
        };
        ctx.set(GLOBAL_GROUP_CHANNEL, SPOTLIGHT_GROUP);
        ctx.set(CH_SHAPE, i32::from(SHAPE_CIRCLE));
        state.new_heading(ctx);
        state
    }

    fn new_heading(&mut self, ctx: &mut StepContext<'_>) {
        let angle: f32 = ctx.rng.random_range(0.0..TAU);
        self.dx = libm::cosf(angle);
        self.dy = libm::sinf(angle);
        self.leg_started = ctx.now;
        self.leg_length = Duration::from_millis(
            ctx.rng
                .random_range(SPOTLIGHT_LEG_MIN_MS..=SPOTLIGHT_LEG_MAX_MS),
        );
    }
}

/// Circle bouncing inside a small box, changing heading every 1-3 seconds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Spotlight {
    state: Option<SpotlightState>,
}

impl Spotlight {
    pub fn position(&self) -> Option<(f32, f32)> {
        self.state.as_ref().map(|state| (state.x, state.y))
    }

    /// When the current heading was picked.
    pub fn heading_changed_at(&self) -> Option<Instant> {
        self.state.as_ref().map(|state| state.leg_started)
    }
}

/// Reflect a coordinate and its velocity off the `low..=high` walls.
fn bounce(position: &mut f32, velocity: &mut f32, low: f32, high: f32) {
    if *position <= low {
        *velocity = -*velocity;
        *position = low;
    } else if *position >= high {
        *velocity = -*velocity;
        *position = high;
    }
}

impl Pattern for Spotlight {
    fn advance(&mut self, ctx: &mut StepContext<'_>) -> Result<Duration, PatternError> {
        let started = self.state.is_some();
        let state = self.state.get_or_insert_with(|| SpotlightState::start(ctx));
        if started && ctx.now.duration_since(state.leg_started) > state.leg_length {
            state.new_heading(ctx);
        }

        let speed = f32::from(ctx.speed.get());
        state.x += state.dx * speed;
        state.y += state.dy * speed;
        bounce(&mut state.x, &mut state.dx, SPOTLIGHT_LOW, SPOTLIGHT_HIGH);
        bounce(&mut state.y, &mut state.dy, SPOTLIGHT_LOW, SPOTLIGHT_HIGH);

        ctx.set(CH_PAN_X, to_channel(state.x));
        ctx.set(CH_PAN_Y, to_channel(state.y));

        Ok(ctx.speed.period(SPOTLIGHT_UNIT_US))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct DriftState {
    x: f32,
    y: f32,
    angle: f32,
}

/// Dot wandering with a slowly drifting heading, reflecting off the edges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriftingDot {
    state: Option<DriftState>,
}

impl DriftingDot {
    pub fn position(&self) -> Option<(f32, f32)> {
        self.state.as_ref().map(|state| (state.x, state.y))
    }
}

impl Pattern for DriftingDot {
    fn advance(&mut self, ctx: &mut StepContext<'_>) -> Result<Duration, PatternError> {
        let state = self.state.get_or_insert_with(|| {
            let center = (DRIFT_LOW + DRIFT_HIGH) / 2.0;
            ctx.set(CH_SHAPE, i32::from(SHAPE_DOT));
            DriftState {
                x: center,
                y: center,
                angle: ctx.rng.random_range(0.0..TAU),
            }
        });

        let speed = f32::from(ctx.speed.get()).min(DRIFT_MAX_SPEED);
        let drift_strength = 0.1 * speed;
        let movement = 2.0 * speed;

        state.angle += ctx.rng.random_range(-drift_strength..drift_strength);

        let mut new_x = state.x + libm::cosf(state.angle) * movement;
        let mut new_y = state.y + libm::sinf(state.angle) * movement;

        if !(DRIFT_LOW..=DRIFT_HIGH).contains(&new_x) {
            state.angle = PI - state.angle;
            new_x = state.x;
        }
        if !(DRIFT_LOW..=DRIFT_HIGH).contains(&new_y) {
            state.angle = -state.angle;
            new_y = state.y;
        }

        state.x = new_x;
        state.y = new_y;

        ctx.set(CH_PAN_X, to_channel(state.x));
        ctx.set(CH_PAN_Y, to_channel(state.y));

        Ok(DRIFT_DELAY)
    }
}
