//! foodscan CLI - replay recorded scans through the segmentation pipeline
//!
//! Feeds a recorded event log (camera distances, start/stop, countdown
//! ticks, mesh anchors) into a scan session and prints the segments it
//! produces.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use foodscan_segment::SegmentResult;
use foodscan_session::{ScanSession, SessionConfig, SessionSnapshot};
use serde::Serialize;
use tracing::warn;

mod recording;

use recording::{RecordedEvent, Recording};

#[derive(Parser)]
#[command(name = "foodscan")]
#[command(about = "Estimate object volumes from recorded mesh scans", long_about = None)]
struct Cli {
    /// Log verbosity (overrides RUST_LOG)
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded scan and report the segments found
    Replay {
        /// Recording file (.json)
        recording: PathBuf,
        /// Session settings (.toml); defaults apply to missing keys
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print the default session settings as TOML
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Serialize)]
struct Report {
    session: SessionSnapshot,
    segments: Vec<SegmentResult>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    match cli.command {
        Commands::Replay {
            recording,
            config,
            format,
        } => {
            let config = load_config(config.as_deref())?;
            let report = replay(&recording, config)?;
            print_report(&report, format)?;
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&SessionConfig::default())?);
        }
    }

    Ok(())
}

fn init_logging(level: Option<LogLevel>) {
    let mut builder = env_logger::Builder::new();
    builder.target(env_logger::Target::Stderr);
    builder.filter_level(log::LevelFilter::Warn);
    match level {
        Some(level) => {
            builder.parse_filters(level.as_str());
        }
        None => {
            if let Ok(filters) = std::env::var("RUST_LOG") {
                builder.parse_filters(&filters);
            }
        }
    }

    if let Err(err) = builder.try_init() {
        eprintln!("Failed to initialize logger: {}", err);
    }
}

fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: SessionConfig =
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}

fn replay(path: &Path, config: SessionConfig) -> Result<Report> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading recording {}", path.display()))?;
    let recording = Recording::from_json(&json)?;
    replay_recording(&recording, config)
}

fn replay_recording(recording: &Recording, config: SessionConfig) -> Result<Report> {
    let mut session = ScanSession::new(config)?;

    for (index, event) in recording.events.iter().enumerate() {
        match event {
            RecordedEvent::Pose { distance } => {
                session.on_pose_update(*distance);
            }
            RecordedEvent::Start => {
                if let Err(e) = session.start_scan() {
                    warn!(event = index, error = %e, "start ignored");
                }
            }
            RecordedEvent::Stop => {
                session.stop_scan();
            }
            RecordedEvent::Tick => {
                session.tick();
            }
            RecordedEvent::Anchor(recorded) => {
                let anchor = recorded.to_raw();
                if let Err(e) = session.on_anchor_added(&anchor) {
                    warn!(event = index, anchor = %anchor.id, error = %e, "skipping anchor");
                }
            }
        }
    }

    Ok(Report {
        session: session.snapshot(),
        segments: session.results().to_vec(),
    })
}

fn print_report(report: &Report, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Text => {
            for segment in &report.segments {
                println!("Mesh Segment {}", segment.id);
                println!("  Vertices: {}", segment.vertex_count);
                println!("  Faces: {}", segment.face_count);
                println!("  Volume: {:.4} m³", segment.volume);
            }
            let total: f64 = report.segments.iter().map(|s| s.volume).sum();
            println!(
                "{} segment(s), total volume {:.4} m³ (session {}, {}s left)",
                report.segments.len(),
                total,
                report.session.state,
                report.session.remaining_seconds
            );
        }
    }
    Ok(())
}
