//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use contracts::{GestureBlueprint, InputSource};

use super::load_blueprint;
use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    let mut blueprint = load_blueprint(&args.config)?;
    apply_overrides(&mut blueprint, args)?;

    info!(
        source = ?blueprint.input.source,
        path = ?blueprint.input.path,
        speed = blueprint.input.speed,
        touch_capacity = blueprint.tracker.touch_capacity,
        object_capacity = blueprint.tracker.object_capacity,
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline_config = PipelineConfig {
        blueprint,
        max_frames: (args.max_frames > 0).then_some(args.max_frames),
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        buffer_size: args.buffer_size,
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
    };

    info!("Starting pipeline...");

    let stats = Pipeline::new(pipeline_config)
        .run_until(shutdown_signal())
        .await
        .context("Pipeline execution failed")?;

    info!(
        frames = stats.frames_processed,
        events = stats.events_processed,
        batches_dropped = stats.batches_dropped(),
        stop_reason = %stats.stop_reason,
        duration_secs = stats.duration.as_secs_f64(),
        fps = format!("{:.2}", stats.fps()),
        "Pipeline completed"
    );
    stats.print_summary();

    info!("TUIO Gesture finished");
    Ok(())
}

/// Apply command-line overrides, then re-validate
fn apply_overrides(blueprint: &mut GestureBlueprint, args: &RunArgs) -> Result<(), CliError> {
    if let Some(ref path) = args.replay {
        info!(path = %path.display(), "Overriding input with replay from CLI");
        blueprint.input.source = InputSource::Replay;
        blueprint.input.path = Some(path.clone());
    }

    if let Some(speed) = args.speed {
        if !(speed.is_finite() && speed > 0.0) {
            return Err(CliError::invalid_override(
                "speed",
                format!("must be a positive number, got {speed}"),
            ));
        }
        info!(speed, "Overriding replay speed from CLI");
        blueprint.input.speed = speed;
    }

    if args.loop_playback {
        blueprint.input.loop_playback = true;
    }

    config_loader::ConfigLoader::validate(blueprint)
        .map_err(|e| CliError::config_validation(e.to_string()))
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &GestureBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Tracker:");
    println!("  Touch slots: {}", blueprint.tracker.touch_capacity);
    if blueprint.tracker.track_objects {
        println!("  Object slots: {}", blueprint.tracker.object_capacity);
    } else {
        println!("  Objects: not tracked");
    }

    let input = &blueprint.input;
    println!("\nInput:");
    match input.source {
        InputSource::Replay => {
            if let Some(ref path) = input.path {
                println!("  Replay: {}", path.display());
            }
            println!("  Speed: {}x", input.speed);
            println!("  Loop: {}", input.loop_playback);
        }
        InputSource::Mock => {
            let mock = blueprint.mock_config();
            println!(
                "  Mock: {:?} with {} contacts at {} Hz",
                mock.gesture, mock.contacts, mock.frame_rate_hz
            );
        }
    }
    println!("  Guard: {:?}", input.guard);

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }

    println!();
}
