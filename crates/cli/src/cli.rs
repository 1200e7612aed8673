//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// TUIO Gesture - multi-touch session tracking and gesture signal pipeline
#[derive(Parser, Debug)]
#[command(
    name = "tuio-gesture",
    author,
    version,
    about = "Multi-touch gesture signal pipeline",
    long_about = "Tracks touch and object sessions from a TUIO-style event stream.\n\n\
                  Keeps each contact in a fixed slot, computes aggregate centroid, \n\
                  translation, growth and rotation per frame, and dispatches one \n\
                  atomic signal batch per frame to the configured sinks."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TUIO_GESTURE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "TUIO_GESTURE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the gesture pipeline
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration and the signal catalogue
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "gesture.toml",
        env = "TUIO_GESTURE_CONFIG"
    )]
    pub config: PathBuf,

    /// Replay this JSON-lines recording instead of the configured input
    #[arg(long, env = "TUIO_GESTURE_REPLAY")]
    pub replay: Option<PathBuf>,

    /// Override replay speed multiplier
    #[arg(long)]
    pub speed: Option<f64>,

    /// Restart the recording when it ends
    #[arg(long = "loop")]
    pub loop_playback: bool,

    /// Maximum number of frames to process (0 = unlimited)
    #[arg(long, default_value = "0", env = "TUIO_GESTURE_MAX_FRAMES")]
    pub max_frames: u64,

    /// Pipeline timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "TUIO_GESTURE_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running pipeline
    #[arg(long)]
    pub dry_run: bool,

    /// Channel buffer size between the processor and the dispatcher
    #[arg(long, default_value = "256", env = "TUIO_GESTURE_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "TUIO_GESTURE_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "gesture.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "gesture.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show sink parameters
    #[arg(long)]
    pub sinks: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args_parse() {
        let cli = Cli::try_parse_from([
            "tuio-gesture",
            "-v",
            "run",
            "--config",
            "pinch.toml",
            "--replay",
            "session.jsonl",
            "--speed",
            "2.5",
            "--max-frames",
            "10",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.config, PathBuf::from("pinch.toml"));
                assert_eq!(args.replay, Some(PathBuf::from("session.jsonl")));
                assert_eq!(args.speed, Some(2.5));
                assert_eq!(args.max_frames, 10);
                assert!(!args.loop_playback);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["tuio-gesture", "-q", "-v", "validate"]);
        assert!(result.is_err());
    }
}
