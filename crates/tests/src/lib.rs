//! # Integration Tests
//!
//! Cross-crate tests.
//!
//! Covers:
//! - Wire format snapshots for inbound events and outbound signals
//! - End-to-end runs: source -> ingestion -> frame processor -> dispatcher
//! - Configuration driven sink creation

#[cfg(test)]
mod contract_tests {
    use contracts::{Signal, SignalUpdate, SignalValue, TouchEvent};

    #[test]
    fn test_touch_event_lines() {
        let lines = [
            (TouchEvent::begin(0.0), r#"{"event":"begin_frame","timetag":0.0}"#),
            (
                TouchEvent::alive_touches(vec![1]),
                r#"{"event":"alive","kind":"touch","ids":[1]}"#,
            ),
            (
                TouchEvent::set_touch(1, 0.2, 0.2),
                r#"{"event":"set","kind":"touch","session_id":1,"x":0.2,"y":0.2}"#,
            ),
            (TouchEvent::EndFrame, r#"{"event":"end_frame"}"#),
        ];

        for (event, expected) in lines {
            assert_eq!(serde_json::to_string(&event).unwrap(), expected);
            let decoded: TouchEvent = serde_json::from_str(expected).unwrap();
            assert_eq!(decoded, event);
        }
    }

    #[test]
    fn test_recorded_lines_default_to_touch() {
        let alive: TouchEvent = serde_json::from_str(r#"{"event":"alive","ids":[4,5]}"#).unwrap();
        assert_eq!(alive, TouchEvent::alive_touches(vec![4, 5]));

        let begin: TouchEvent = serde_json::from_str(r#"{"event":"begin_frame"}"#).unwrap();
        assert_eq!(begin, TouchEvent::BeginFrame { timetag: None });
    }

    #[test]
    fn test_signal_names_are_stable() {
        let names: Vec<_> = Signal::ALL.iter().map(Signal::name).collect();
        assert_eq!(
            names,
            [
                "touch.count",
                "touch.position",
                "touch.aggregate.centroid",
                "touch.aggregate.translation",
                "touch.aggregate.growth",
                "touch.aggregate.rotation",
                "object.count",
                "object.position",
                "object.type",
                "object.orientation",
            ]
        );
    }

    #[test]
    fn test_publish_wire_shape() {
        let update = SignalUpdate::Publish {
            signal: Signal::TouchPosition,
            instance: Some(3),
            value: SignalValue::Vec2([0.5, 0.25]),
        };
        assert_eq!(
            serde_json::to_string(&update).unwrap(),
            r#"{"op":"publish","signal":"touch.position","instance":3,"value":[0.5,0.25]}"#
        );

        let count = SignalUpdate::Publish {
            signal: Signal::TouchCount,
            instance: None,
            value: SignalValue::Int(2),
        };
        assert_eq!(
            serde_json::to_string(&count).unwrap(),
            r#"{"op":"publish","signal":"touch.count","value":2}"#
        );
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::io::Write;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_channel::Receiver;
    use contracts::{
        InputConfig, InputGuard, InputSource, Point2, SessionId, Signal, SignalBatch, SinkConfig,
        SinkType, TouchEvent, TrackerConfig,
    };
    use dispatcher::create_dispatcher;
    use ingestion::{EventSender, EventSource, IngestionPipeline, MockGestureSource};
    use observability::GestureMetricsAggregator;
    use tokio::sync::mpsc;
    use tracker::FrameProcessor;

    const EPS: f32 = 1e-5;

    /// Feed events through a fresh processor until `frames` batches are out
    async fn collect_batches(
        events: Receiver<TouchEvent>,
        config: &TrackerConfig,
        frames: usize,
    ) -> Vec<SignalBatch> {
        let mut processor = FrameProcessor::new(config);
        let mut batches = Vec::with_capacity(frames);

        let run = async {
            while batches.len() < frames {
                let Ok(event) = events.recv().await else {
                    break;
                };
                if let Some(batch) = processor.handle(event) {
                    batches.push(batch);
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("pipeline stalled");
        batches
    }

    fn point(batch: &SignalBatch, signal: Signal) -> Point2 {
        batch
            .value_of(signal)
            .and_then(|v| v.as_point())
            .unwrap_or_else(|| panic!("{signal} missing from frame {}", batch.frame_id))
    }

    fn scalar(batch: &SignalBatch, signal: Signal) -> f32 {
        batch
            .value_of(signal)
            .and_then(|v| v.as_f32())
            .unwrap_or_else(|| panic!("{signal} missing from frame {}", batch.frame_id))
    }

    fn write_recording(frames: &[Vec<TouchEvent>]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".jsonl")
            .tempfile()
            .unwrap();
        for event in frames.iter().flatten() {
            writeln!(file, "{}", serde_json::to_string(event).unwrap()).unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn replay_input(path: &std::path::Path) -> InputConfig {
        InputConfig {
            source: InputSource::Replay,
            path: Some(path.to_path_buf()),
            speed: 10.0,
            loop_playback: false,
            guard: InputGuard::Permissive,
            mock: None,
            channel_capacity: 64,
        }
    }

    fn file_sink(name: &str, dir: &std::path::Path) -> SinkConfig {
        SinkConfig {
            name: name.to_string(),
            sink_type: SinkType::File,
            queue_capacity: 16,
            params: HashMap::from([
                ("base_path".to_string(), dir.display().to_string()),
                ("file_name".to_string(), format!("{name}.jsonl")),
            ]),
        }
    }

    fn log_sink(name: &str) -> SinkConfig {
        SinkConfig {
            name: name.to_string(),
            sink_type: SinkType::Log,
            queue_capacity: 50,
            params: HashMap::new(),
        }
    }

    /// One touch appears, moves right, then lifts
    fn drag_and_lift() -> Vec<Vec<TouchEvent>> {
        vec![
            vec![
                TouchEvent::begin(0.0),
                TouchEvent::alive_touches(vec![3]),
                TouchEvent::set_touch(3, 0.5, 0.5),
                TouchEvent::EndFrame,
            ],
            vec![
                TouchEvent::begin(0.01),
                TouchEvent::alive_touches(vec![3]),
                TouchEvent::set_touch(3, 0.6, 0.5),
                TouchEvent::EndFrame,
            ],
            vec![
                TouchEvent::begin(0.02),
                TouchEvent::alive_touches(Vec::<SessionId>::new()),
                TouchEvent::EndFrame,
            ],
        ]
    }

    /// Replays a fixed event list, then stops
    struct ScriptedSource {
        events: Vec<TouchEvent>,
        running: Arc<AtomicBool>,
    }

    impl ScriptedSource {
        fn new(events: Vec<TouchEvent>) -> Self {
            Self {
                events,
                running: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    impl EventSource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        fn start(&self, sender: EventSender) {
            self.running.store(true, Ordering::SeqCst);
            let events = self.events.clone();
            let running = self.running.clone();
            tokio::spawn(async move {
                for event in events {
                    if sender.send(event).await.is_err() {
                        break;
                    }
                }
                running.store(false, Ordering::SeqCst);
            });
        }

        fn stop(&self) {
            self.running.store(false, Ordering::SeqCst);
        }

        fn is_running(&self) -> bool {
            self.running.load(Ordering::SeqCst)
        }
    }

    /// Two touches, the second one carrying a NaN coordinate
    fn frame_with_nan() -> Vec<TouchEvent> {
        vec![
            TouchEvent::begin(0.0),
            TouchEvent::alive_touches(vec![1, 2]),
            TouchEvent::set_touch(1, 0.2, 0.2),
            TouchEvent::set_touch(2, f32::NAN, 0.5),
            TouchEvent::EndFrame,
        ]
    }

    async fn run_scripted(guard: InputGuard) -> (SignalBatch, u64) {
        let mut pipeline = IngestionPipeline::with_guard(16, guard);
        pipeline.register_source(Box::new(ScriptedSource::new(frame_with_nan())));
        let rx = pipeline.take_receiver().unwrap();
        pipeline.start_all();

        let mut batches = collect_batches(rx, &TrackerConfig::default(), 1).await;
        pipeline.stop_all();
        let rejected = pipeline.metrics().snapshot().events_rejected;
        (batches.remove(0), rejected)
    }

    /// Replay -> processor -> dispatcher -> file, read back
    #[tokio::test]
    async fn test_e2e_replay_to_file_sink() {
        let recording = write_recording(&drag_and_lift());
        let out_dir = tempfile::tempdir().unwrap();

        let mut pipeline = IngestionPipeline::new(64);
        pipeline.register_source(
            ingestion::source_from_config(&replay_input(recording.path())).unwrap(),
        );
        let rx = pipeline.take_receiver().unwrap();

        let (batch_tx, batch_rx) = mpsc::channel::<SignalBatch>(16);
        let dispatcher = create_dispatcher(vec![file_sink("frames", out_dir.path())], batch_rx)
            .await
            .unwrap();
        let dispatcher_handle = dispatcher.spawn();

        pipeline.start_all();
        let batches = collect_batches(rx, &TrackerConfig::default(), 3).await;
        pipeline.stop_all();
        assert_eq!(batches.len(), 3);

        for batch in &batches {
            batch_tx.send(batch.clone()).await.unwrap();
        }
        drop(batch_tx);

        let sink_metrics = tokio::time::timeout(Duration::from_secs(5), dispatcher_handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sink_metrics[0].0, "frames");
        assert_eq!(sink_metrics[0].1.write_count, 3);
        assert_eq!(sink_metrics[0].1.last_frame_id, 3);

        let text = std::fs::read_to_string(out_dir.path().join("frames.jsonl")).unwrap();
        let written: Vec<SignalBatch> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(written, batches);

        // Frame 1: contact allocated, previous == current
        let first = &written[0];
        assert_eq!(first.stats.touch_count, 1);
        assert_eq!(point(first, Signal::TouchTranslation), Point2::new(0.0, 0.0));
        assert_eq!(scalar(first, Signal::TouchGrowth), 0.0);
        assert_eq!(scalar(first, Signal::TouchRotation), 0.0);

        // Frame 2: one contact moved right by 0.1
        let second = &written[1];
        let translation = point(second, Signal::TouchTranslation);
        assert!((translation.x - 0.1).abs() < EPS, "got {translation:?}");
        assert!(translation.y.abs() < EPS);
        assert_eq!(scalar(second, Signal::TouchGrowth), 0.0);
        assert_eq!(scalar(second, Signal::TouchRotation), 0.0);
        let centroid = point(second, Signal::TouchCentroid);
        assert!((centroid.x - 0.6).abs() < EPS);

        // Frame 3: contact lifted, released once, no aggregates
        let third = &written[2];
        assert_eq!(third.releases_of(Signal::TouchPosition), vec![3]);
        assert_eq!(third.stats.released, 1);
        assert_eq!(third.stats.touch_count, 0);
        assert_eq!(scalar(third, Signal::TouchCount), 0.0);
        assert!(third.value_of(Signal::TouchCentroid).is_none());
    }

    #[tokio::test]
    async fn test_e2e_mock_pinch_grows() {
        let mut pipeline = IngestionPipeline::new(256);
        pipeline.register_source(Box::new(MockGestureSource::pinch(2, 500.0)));
        let rx = pipeline.take_receiver().unwrap();
        pipeline.start_all();

        let batches = collect_batches(rx, &TrackerConfig::default(), 10).await;
        pipeline.stop_all();
        assert_eq!(batches.len(), 10);

        let mut aggregator = GestureMetricsAggregator::new();
        for batch in &batches {
            assert_eq!(scalar(batch, Signal::TouchCount), 2.0);
            aggregator.update(batch);
        }

        assert_eq!(aggregator.total_frames, 10);
        assert_eq!(aggregator.peak_touches, 2);
        assert_eq!(aggregator.total_released, 0);
        assert!(aggregator.cumulative_growth > 0.0);
        assert!(aggregator.cumulative_rotation.abs() < 1e-4);

        // Frame ids are consecutive
        let ids: Vec<u64> = batches.iter().map(|b| b.frame_id).collect();
        assert_eq!(ids, (1..=10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_guard_drops_non_finite_record() {
        let (batch, rejected) = run_scripted(InputGuard::RejectNonFinite).await;

        assert_eq!(rejected, 1);
        assert_eq!(batch.stats.touch_count, 1);
        let centroid = point(&batch, Signal::TouchCentroid);
        assert!((centroid.x - 0.2).abs() < EPS);
        assert!((centroid.y - 0.2).abs() < EPS);
    }

    #[tokio::test]
    async fn test_permissive_input_propagates_nan() {
        let (batch, rejected) = run_scripted(InputGuard::Permissive).await;

        assert_eq!(rejected, 0);
        assert_eq!(batch.stats.touch_count, 2);
        assert!(!point(&batch, Signal::TouchCentroid).is_finite());
    }

    #[tokio::test]
    async fn test_config_drives_sinks() {
        let out_dir = tempfile::tempdir().unwrap();
        let content = format!(
            r#"
[tracker]
touch_capacity = 4
track_objects = false

[input]
source = "mock"

[input.mock]
gesture = "drag"
contacts = 3
frame_rate_hz = 500.0
frames = 20

[[sinks]]
name = "console"
sink_type = "log"

[[sinks]]
name = "archive"
sink_type = "file"
params = {{ base_path = "{}", file_name = "archive.jsonl" }}
"#,
            out_dir.path().display().to_string().replace('\\', "/")
        );
        let blueprint =
            config_loader::ConfigLoader::load_from_str(&content, config_loader::ConfigFormat::Toml)
                .unwrap();
        assert_eq!(blueprint.sinks.len(), 2);

        let mut pipeline =
            IngestionPipeline::with_guard(blueprint.input.channel_capacity, blueprint.input.guard);
        pipeline.register_source(ingestion::source_from_config(&blueprint.input).unwrap());
        let rx = pipeline.take_receiver().unwrap();

        let (batch_tx, batch_rx) = mpsc::channel::<SignalBatch>(16);
        let dispatcher = create_dispatcher(blueprint.sinks.clone(), batch_rx)
            .await
            .unwrap();
        assert_eq!(dispatcher.sink_count(), 2);
        let dispatcher_handle = dispatcher.spawn();

        pipeline.start_all();
        let batches = collect_batches(rx, &blueprint.tracker, 5).await;
        pipeline.stop_all();

        for batch in batches {
            assert_eq!(batch.stats.touch_count, 3);
            assert!(batch.value_of(Signal::ObjectCount).is_none());
            batch_tx.send(batch).await.unwrap();
        }
        drop(batch_tx);

        let sink_metrics = dispatcher_handle.await.unwrap();
        let names: Vec<&str> = sink_metrics.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["console", "archive"]);
        for (_, snapshot) in &sink_metrics {
            assert_eq!(snapshot.write_count, 5);
            assert_eq!(snapshot.dropped_count, 0);
        }

        let text = std::fs::read_to_string(out_dir.path().join("archive.jsonl")).unwrap();
        assert_eq!(text.lines().count(), 5);
    }

    /// Test dispatcher with multiple sink types
    #[tokio::test]
    async fn test_dispatcher_multiple_sinks() {
        let out_dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel::<SignalBatch>(10);

        let sink_configs = vec![
            log_sink("log1"),
            log_sink("log2"),
            file_sink("file", out_dir.path()),
        ];

        let dispatcher = create_dispatcher(sink_configs, rx).await.unwrap();

        // Metrics exist before the first batch
        let metrics = dispatcher.metrics();
        assert_eq!(metrics.len(), 3);
        assert!(metrics.iter().all(|(_, m)| m.write_count == 0));

        let handle = dispatcher.spawn();

        let mut processor = FrameProcessor::new(&TrackerConfig::default());
        for frame in drag_and_lift() {
            for event in frame {
                if let Some(batch) = processor.handle(event) {
                    tx.send(batch).await.unwrap();
                }
            }
        }
        drop(tx);

        let metrics = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
        for (name, snapshot) in metrics {
            assert_eq!(snapshot.write_count, 3, "sink {name}");
            assert_eq!(snapshot.last_frame_id, 3, "sink {name}");
        }
    }
}
