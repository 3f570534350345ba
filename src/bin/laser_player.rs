//! laser-player - label-driven DMX laser show player.
//!
//! Plays a label file against a laser fixture, lists serial ports, or runs a
//! single pattern for fixture testing.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration as StdDuration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use dmx_laser_composer::link::{self, Link, NullLink, SerialLink};
use dmx_laser_composer::{
    CancelToken, Category, Engine, EngineReport, LabelTimeline, PatternCatalog, PlayerConfig, Speed,
};
use tracing::{info, warn};

/// How often the main thread checks for the end of the show.
const POLL_INTERVAL: StdDuration = StdDuration::from_millis(50);

#[derive(Parser)]
#[command(name = "laser-player")]
#[command(about = "Label-driven DMX laser show player")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct OutputArgs {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port of the DMX interface (overrides config).
    #[arg(short, long)]
    port: Option<String>,

    /// Seed for pattern selection (overrides config).
    #[arg(long)]
    seed: Option<u64>,

    /// Discard frames instead of opening a serial port.
    #[arg(long)]
    simulate: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a label file.
    Play {
        /// JSON label file.
        labels: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List serial ports.
    Ports,

    /// List every pattern by category.
    Patterns,

    /// Run a single pattern.
    TestPattern {
        /// Pattern name, see `patterns`.
        name: String,

        /// Speed level.
        #[arg(short, long, default_value_t = 5)]
        speed: u8,

        /// How long to run it.
        #[arg(long, default_value_t = 10)]
        seconds: u64,

        #[command(flatten)]
        output: OutputArgs,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play { labels, output } => play(&labels, &output),
        Commands::Ports => list_ports(),
        Commands::Patterns => {
            list_patterns();
            Ok(())
        }
        Commands::TestPattern {
            name,
            speed,
            seconds,
            output,
        } => test_pattern(&name, speed, seconds, &output),
    }
}

fn load_config(args: &OutputArgs) -> Result<PlayerConfig> {
    let mut config = match &args.config {
        Some(path) => PlayerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PlayerConfig::default(),
    };
    if let Some(port) = &args.port {
        config.port.clone_from(port);
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    Ok(config)
}

/// Probe and open the configured port, or a null link in simulation mode.
fn open_link(config: &PlayerConfig, simulate: bool) -> Result<Box<dyn Link>> {
    if simulate {
        info!("simulation mode, frames are discarded");
        return Ok(Box::new(NullLink::new()));
    }
    link::probe_port(&config.port)?;
    let link = SerialLink::open(&config.port)
        .with_context(|| format!("failed to open {}", config.port))?;
    Ok(Box::new(link))
}

/// Cancel token that fires on Ctrl-C.
///
/// Installed before the device is opened, so an interrupt during startup is
/// still seen by the engine and ends in a blanked fixture.
fn interrupt_token() -> Result<CancelToken> {
    let cancel = CancelToken::new();
    let handler_cancel = cancel.clone();
    ctrlc::set_handler(move || {
        warn!("interrupted, blanking fixture");
        handler_cancel.cancel();
    })
    .context("failed to install Ctrl-C handler")?;
    Ok(cancel)
}

/// Sleep for `duration` or until cancelled. Returns whether it was cancelled.
fn sleep_unless_cancelled(cancel: &CancelToken, duration: StdDuration) -> bool {
    let mut remaining = duration;
    while !remaining.is_zero() {
        if cancel.is_cancelled() {
            return true;
        }
        let nap = remaining.min(POLL_INTERVAL);
        thread::sleep(nap);
        remaining -= nap;
    }
    cancel.is_cancelled()
}

fn countdown(cancel: &CancelToken, seconds: u64) -> bool {
    for remaining in (1..=seconds).rev() {
        info!(remaining, "starting in");
        if sleep_unless_cancelled(cancel, StdDuration::from_secs(1)) {
            return true;
        }
    }
    false
}

fn play(labels: &Path, args: &OutputArgs) -> Result<()> {
    let cancel = interrupt_token()?;
    let config = load_config(args)?;
    let timeline = LabelTimeline::load(labels)
        .with_context(|| format!("failed to load labels {}", labels.display()))?;
    info!(
        ticks = timeline.len(),
        seconds = timeline.duration().as_secs(),
        "labels loaded"
    );

    let link = open_link(&config, args.simulate)?;
    let mut engine =
        Engine::start_with_cancel(link, &config, PatternCatalog::builtin(), cancel.clone())?;

    if !countdown(&cancel, config.countdown_secs) {
        engine.play(timeline)?;
        while !cancel.is_cancelled() && !engine.is_show_finished() {
            thread::sleep(POLL_INTERVAL);
        }
    }

    log_report(&engine.shutdown());
    Ok(())
}

fn test_pattern(name: &str, speed: u8, seconds: u64, args: &OutputArgs) -> Result<()> {
    let Some(speed) = Speed::new(speed) else {
        bail!("speed must be at least 1");
    };
    let catalog = PatternCatalog::builtin();
    if catalog.by_name(name).is_none() {
        bail!("unknown pattern '{name}', run `laser-player patterns` for the list");
    }

    let cancel = interrupt_token()?;
    let config = load_config(args)?;
    let link = open_link(&config, args.simulate)?;
    let engine = Engine::start_with_cancel(link, &config, catalog, cancel.clone())?;

    info!(pattern = name, speed = speed.get(), seconds, "testing pattern");
    engine.select(name, speed);
    sleep_unless_cancelled(&cancel, StdDuration::from_secs(seconds));

    log_report(&engine.shutdown());
    Ok(())
}

fn log_report(report: &EngineReport) {
    if let Some(schedule) = report.schedule {
        info!(
            ticks = schedule.ticks,
            decisions = schedule.decisions,
            late_ticks = schedule.late_ticks,
            completed = schedule.completed,
            "show summary"
        );
    }
    info!(
        seed = report.seed,
        frames = report.transmit.frames_sent,
        write_errors = report.transmit.write_errors,
        timing_violations = report.transmit.timing_violations,
        pattern_failures = report.runner.failures,
        "output summary"
    );
}

#[allow(clippy::print_stdout)]
fn list_ports() -> Result<()> {
    let ports = link::list_ports().context("failed to enumerate serial ports")?;
    if ports.is_empty() {
        println!("No serial ports found.");
        return Ok(());
    }
    for port in ports {
        println!("{:<24} {}", port.name, port.description);
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn list_patterns() {
    let catalog = PatternCatalog::builtin();
    for category in Category::ALL {
        println!("{} ({}):", category.as_str(), category.id());
        for (_, descriptor) in catalog.in_category(category) {
            println!("  {}", descriptor.name);
        }
    }
}
