//! Label timeline produced by the offline labeling tools.
//!
//! Two equal-length sequences sampled at a fixed rate from audio start:
//! the pattern category per tick and the speed level per tick. Zero in
//! either sequence means "lights off".

use std::path::Path;

use embassy_time::Duration;
use serde::Deserialize;

use crate::catalog::Category;
use crate::error::{Error, Result};

/// Ticks per second used by the labeling tools.
pub const DEFAULT_TICK_RATE: u32 = 10;

/// One tick of the timeline, as raw label values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label {
    pub category: u8,
    pub speed: u8,
}

impl Label {
    pub const OFF: Self = Self {
        category: 0,
        speed: 0,
    };

    pub const fn new(category: u8, speed: u8) -> Self {
        Self { category, speed }
    }

    /// Either value is the "off" sentinel.
    pub const fn is_off(self) -> bool {
        self.category == 0 || self.speed == 0
    }
}

#[derive(Debug, Deserialize)]
struct LabelFile {
    #[serde(default = "default_tick_rate")]
    tick_rate: u32,
    pattern_labels: Vec<i64>,
    speed_labels: Vec<i64>,
}

fn default_tick_rate() -> u32 {
    DEFAULT_TICK_RATE
}

/// Validated label sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTimeline {
    labels: Vec<Label>,
    tick_rate: u32,
}

impl LabelTimeline {
    /// Validate raw label sequences.
    ///
    /// Fails with [`Error::LabelDataMismatch`] when the lengths differ, a
    /// category id is neither 0 nor a known category, a speed does not fit a
    /// level, or the tick rate is zero.
    pub fn new(categories: &[i64], speeds: &[i64], tick_rate: u32) -> Result<Self> {
        if categories.len() != speeds.len() {
            return Err(Error::LabelDataMismatch(format!(
                "{} pattern labels but {} speed labels",
                categories.len(),
                speeds.len()
            )));
        }
        if tick_rate == 0 {
            return Err(Error::LabelDataMismatch(
                "tick rate must be positive".to_string(),
            ));
        }

        let labels = categories
            .iter()
            .zip(speeds)
            .enumerate()
            .map(|(tick, (&category, &speed))| {
                let category = u8::try_from(category)
                    .ok()
                    .filter(|&id| id == 0 || Category::from_raw(id).is_some())
                    .ok_or_else(|| {
                        Error::LabelDataMismatch(format!(
                            "unknown category {category} at tick {tick}"
                        ))
                    })?;
                let speed = u8::try_from(speed).map_err(|_| {
                    Error::LabelDataMismatch(format!("speed {speed} out of range at tick {tick}"))
                })?;
                Ok(Label { category, speed })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { labels, tick_rate })
    }

    /// Build a timeline from already-typed labels.
    pub fn from_labels(labels: Vec<Label>, tick_rate: u32) -> Result<Self> {
        let categories: Vec<i64> = labels.iter().map(|l| i64::from(l.category)).collect();
        let speeds: Vec<i64> = labels.iter().map(|l| i64::from(l.speed)).collect();
        Self::new(&categories, &speeds, tick_rate)
    }

    /// Parse the JSON artifact written by the labeling tools.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let file: LabelFile = serde_json::from_str(text)?;
        Self::new(&file.pattern_labels, &file.speed_labels, file.tick_rate)
    }

    /// Load a JSON label file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    /// Time between two ticks.
    pub fn tick_period(&self) -> Duration {
        Duration::from_hz(u64::from(self.tick_rate))
    }

    /// Audio time covered by the whole timeline.
    pub fn duration(&self) -> Duration {
        self.tick_period() * u32::try_from(self.labels.len()).unwrap_or(u32::MAX)
    }

    pub fn get(&self, tick: usize) -> Option<Label> {
        self.labels.get(tick).copied()
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn iter(&self) -> impl Iterator<Item = Label> + '_ {
        self.labels.iter().copied()
    }
}
