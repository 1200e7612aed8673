//! `info` command implementation.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::{signal_catalogue, ContactKind, GestureBlueprint, InputSource, SignalSpec};

use super::load_blueprint;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    tracker: TrackerInfo,
    input: InputInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
    signals: Vec<SignalSpec>,
}

#[derive(Serialize)]
struct TrackerInfo {
    touch_capacity: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    object_capacity: Option<usize>,
}

#[derive(Serialize)]
struct InputInfo {
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    speed: f64,
    loop_playback: bool,
    guard: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    gesture: Option<String>,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    queue_capacity: usize,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    params: HashMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let blueprint = load_blueprint(&args.config)?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

/// Signals this configuration can emit
fn active_signals(blueprint: &GestureBlueprint) -> Vec<SignalSpec> {
    signal_catalogue(
        blueprint.tracker.touch_capacity,
        blueprint.tracker.object_capacity,
    )
    .into_iter()
    .filter(|spec| blueprint.tracker.track_objects || spec.signal.kind() == ContactKind::Touch)
    .collect()
}

fn build_config_info(blueprint: &GestureBlueprint, args: &InfoArgs) -> ConfigInfo {
    let input = &blueprint.input;

    let sinks = blueprint
        .sinks
        .iter()
        .map(|s| SinkInfo {
            name: s.name.clone(),
            sink_type: format!("{:?}", s.sink_type),
            queue_capacity: s.queue_capacity,
            params: if args.sinks {
                s.params.clone()
            } else {
                HashMap::new()
            },
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        tracker: TrackerInfo {
            touch_capacity: blueprint.tracker.touch_capacity,
            object_capacity: blueprint
                .tracker
                .track_objects
                .then_some(blueprint.tracker.object_capacity),
        },
        input: InputInfo {
            source: format!("{:?}", input.source),
            path: input.path.as_ref().map(|p| p.display().to_string()),
            speed: input.speed,
            loop_playback: input.loop_playback,
            guard: format!("{:?}", input.guard),
            gesture: (input.source == InputSource::Mock)
                .then(|| format!("{:?}", blueprint.mock_config().gesture)),
        },
        sinks,
        signals: active_signals(blueprint),
    }
}

fn format_range(spec: &SignalSpec) -> String {
    match spec.range {
        Some((min, max)) => format!("[{min:.4}, {max:.4}]"),
        None => "-".to_string(),
    }
}

fn print_config_info(blueprint: &GestureBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               TUIO Gesture Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("Tracker");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Touch slots: {}", blueprint.tracker.touch_capacity);
    if blueprint.tracker.track_objects {
        println!("   └─ Object slots: {}", blueprint.tracker.object_capacity);
    } else {
        println!("   └─ Object slots: disabled");
    }

    let input = &blueprint.input;
    println!("\nInput");
    println!("   ├─ Source: {:?}", input.source);
    match input.source {
        InputSource::Replay => {
            let path = input
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            println!("   ├─ Recording: {}", path);
            println!(
                "   ├─ Speed: {}x{}",
                input.speed,
                if input.loop_playback { ", looping" } else { "" }
            );
        }
        InputSource::Mock => {
            let mock = blueprint.mock_config();
            println!(
                "   ├─ Gesture: {:?} ({} contacts, {} Hz, {} frames per cycle)",
                mock.gesture, mock.contacts, mock.frame_rate_hz, mock.frames
            );
        }
    }
    println!("   └─ Guard: {:?}", input.guard);

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({})", blueprint.sinks.len());
        for (i, sink) in blueprint.sinks.iter().enumerate() {
            let is_last = i == blueprint.sinks.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            println!(
                "   {} {} ({:?}, queue {})",
                prefix, sink.name, sink.sink_type, sink.queue_capacity
            );
            if args.sinks {
                let child_prefix = if is_last { "   " } else { "│  " };
                let mut params: Vec<_> = sink.params.iter().collect();
                params.sort();
                for (key, value) in params {
                    println!("   {}     {} = {}", child_prefix, key, value);
                }
            }
        }
    }

    let signals = active_signals(blueprint);
    println!("\nSignals ({})", signals.len());
    for (i, spec) in signals.iter().enumerate() {
        let prefix = if i == signals.len() - 1 { "└─" } else { "├─" };
        println!(
            "   {} {:<28} {:?} x{}  instances={}  unit={}  range={}",
            prefix,
            spec.signal.name(),
            spec.value_type,
            spec.length,
            spec.instances,
            spec.unit.unwrap_or("-"),
            format_range(spec)
        );
    }

    println!();
}
