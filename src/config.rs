//! Player configuration.
//!
//! Loaded from an optional TOML file; every field has a default so an empty
//! file (or no file at all) yields a working setup.

use std::path::Path;

use embassy_time::Duration;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::universe::FrameBuffer;

pub const GLOBAL_MODE_CHANNEL: usize = 1;
pub const GLOBAL_GROUP_CHANNEL: usize = 2;
pub const GLOBAL_SIZE_CHANNEL: usize = 3;

const DEFAULT_MODE: u8 = 23;
const DEFAULT_GROUP: u8 = 0;
const DEFAULT_SIZE: u8 = 255;

const DEFAULT_FRAME_PERIOD_MS: u64 = 25;
const DEFAULT_BREAK_US: u64 = 176;
const DEFAULT_MARK_AFTER_BREAK_US: u64 = 12;
const DEFAULT_COUNTDOWN_SECS: u64 = 3;
const DEFAULT_FAILURE_BACKOFF_MS: u64 = 100;

#[cfg(windows)]
const DEFAULT_PORT: &str = "COM3";
#[cfg(not(windows))]
const DEFAULT_PORT: &str = "/dev/ttyUSB0";

/// Fixture-level channels reasserted after every buffer reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GlobalChannels {
    /// Channel 1: on / auto mode.
    pub mode: u8,
    /// Channel 2: pattern group selector.
    pub group: u8,
    /// Channel 3: pattern size / intensity.
    pub size: u8,
}

impl Default for GlobalChannels {
    fn default() -> Self {
        Self {
            mode: DEFAULT_MODE,
            group: DEFAULT_GROUP,
            size: DEFAULT_SIZE,
        }
    }
}

impl GlobalChannels {
    /// Write the global channels into the frame.
    pub fn apply(&self, frame: &FrameBuffer) {
        frame.set_channel(GLOBAL_MODE_CHANNEL, i32::from(self.mode));
        frame.set_channel(GLOBAL_GROUP_CHANNEL, i32::from(self.group));
        frame.set_channel(GLOBAL_SIZE_CHANNEL, i32::from(self.size));
    }

    /// Whether a channel index is one of the global channels.
    pub const fn is_global(channel: usize) -> bool {
        matches!(
            channel,
            GLOBAL_MODE_CHANNEL | GLOBAL_GROUP_CHANNEL | GLOBAL_SIZE_CHANNEL
        )
    }
}

/// Wire timing for the transmitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmitTimings {
    /// Target time between frame starts.
    pub frame_period: Duration,
    /// Minimum break hold.
    pub break_time: Duration,
    /// Minimum mark-after-break hold.
    pub mark_after_break: Duration,
}

impl Default for TransmitTimings {
    fn default() -> Self {
        Self {
            frame_period: Duration::from_millis(DEFAULT_FRAME_PERIOD_MS),
            break_time: Duration::from_micros(DEFAULT_BREAK_US),
            mark_after_break: Duration::from_micros(DEFAULT_MARK_AFTER_BREAK_US),
        }
    }
}

/// Top-level configuration of the player.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Serial port the DMX interface is attached to.
    pub port: String,
    pub frame_period_ms: u64,
    pub break_us: u64,
    pub mark_after_break_us: u64,
    pub globals: GlobalChannels,
    /// Seconds to wait after asserting globals before playback starts.
    pub countdown_secs: u64,
    /// Seed for pattern selection and randomised patterns.
    pub seed: Option<u64>,
    /// Pause after a pattern step fails.
    pub failure_backoff_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            frame_period_ms: DEFAULT_FRAME_PERIOD_MS,
            break_us: DEFAULT_BREAK_US,
            mark_after_break_us: DEFAULT_MARK_AFTER_BREAK_US,
            globals: GlobalChannels::default(),
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            seed: None,
            failure_backoff_ms: DEFAULT_FAILURE_BACKOFF_MS,
        }
    }
}

impl PlayerConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|err| Error::Config(err.to_string()))
    }

    pub fn timings(&self) -> TransmitTimings {
        TransmitTimings {
            frame_period: Duration::from_millis(self.frame_period_ms.max(1)),
            break_time: Duration::from_micros(self.break_us),
            mark_after_break: Duration::from_micros(self.mark_after_break_us),
        }
    }

    pub fn failure_backoff(&self) -> Duration {
        Duration::from_millis(self.failure_backoff_ms)
    }

    pub fn countdown(&self) -> Duration {
        Duration::from_secs(self.countdown_secs)
    }
}
