//! Error types.

use embassy_time::Duration;
use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Fatal errors raised while setting up a show.
#[derive(Error, Debug)]
pub enum Error {
    /// The serial port is missing or already claimed.
    #[error("DMX device unavailable on {port}: {reason}")]
    DeviceUnavailable { port: String, reason: String },

    /// Label sequences are inconsistent or reference an unknown category.
    #[error("label data mismatch: {0}")]
    LabelDataMismatch(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serial link error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("label file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of a single pattern step.
///
/// Never fatal: the runner logs it and skips the iteration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern '{pattern}' failed: {reason}")]
    Failed { pattern: &'static str, reason: String },

    #[error("pattern '{pattern}' panicked: {message}")]
    Panicked { pattern: &'static str, message: String },
}

/// The host could not hold a break or mark-after-break for its minimum time.
///
/// The frame is still sent; receivers may drop it.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{phase} held for {held_us}us, protocol minimum is {floor_us}us")]
pub struct TimingViolation {
    pub phase: &'static str,
    pub held_us: u64,
    pub floor_us: u64,
}

impl TimingViolation {
    pub(crate) fn check(phase: &'static str, held: Duration, floor: Duration) -> Option<Self> {
        (held < floor).then(|| Self {
            phase,
            held_us: held.as_micros(),
            floor_us: floor.as_micros(),
        })
    }
}
