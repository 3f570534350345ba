pub mod cancel;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod frame_scheduler;
pub mod labels;
pub mod link;
pub mod pattern;
pub mod runner;
pub mod runtime;
pub mod scheduler;
pub mod transmitter;
pub mod universe;

pub use cancel::CancelToken;
pub use catalog::{Category, PatternCatalog, PatternDescriptor, PatternKey};
pub use config::{GlobalChannels, PlayerConfig, TransmitTimings};
pub use engine::{Engine, EngineReport};
pub use error::{Error, PatternError, Result, TimingViolation};
pub use frame_scheduler::FramePacer;
pub use labels::{Label, LabelTimeline};
pub use link::{Link, LinkEvent, NullLink, PortSummary, RecordingLink, SerialLink};
pub use pattern::{Pattern, PatternRng, Speed, StepContext};
pub use runner::{PatternRunner, RunnerPhase, RunnerStats, StepOutcome};
pub use runtime::{PatternRuntime, RuntimeSnapshot, Selection};
pub use scheduler::{Decision, LabelScheduler, ScheduleReport};
pub use transmitter::{TransmitStats, Transmitter};
pub use universe::{CHANNEL_COUNT, FRAME_LEN, FrameBuffer};

pub use embassy_time::{Duration, Instant};
