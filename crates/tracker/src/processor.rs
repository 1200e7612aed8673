//! Frame processor: frame-boundary coordination between the slot tables,
//! the aggregate pass and the outbound signal queue.
//!
//! Within a frame, updates are applied in arrival order, which for a
//! well-formed upstream is releases, then upserts, then aggregates.

use std::time::Instant;

use contracts::{
    ContactKind, ContactRecord, FrameQueue, FrameStats, SessionId, Signal, SignalBatch,
    TouchEvent, TrackerConfig,
};
use tracing::{debug, instrument, trace, warn};

use crate::aggregate::compute_frame;
use crate::slots::SlotTable;

/// Frame processor
///
/// Owns the touch table, the optional object table and the currently open
/// frame queue. Strictly synchronous; one frame at a time.
#[derive(Debug)]
pub struct FrameProcessor {
    touches: SlotTable,
    objects: Option<SlotTable>,
    /// Open frame, if any
    queue: Option<FrameQueue>,
    /// Frame counter
    frame_counter: u64,
    /// Releases in the open frame
    released: u32,
    /// Dropped updates in the open frame
    dropped: u32,
    /// Base for timetags of frames without one
    clock: Instant,
}

impl FrameProcessor {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            touches: SlotTable::new(config.touch_capacity),
            objects: config
                .track_objects
                .then(|| SlotTable::new(config.object_capacity)),
            queue: None,
            frame_counter: 0,
            released: 0,
            dropped: 0,
            clock: Instant::now(),
        }
    }

    /// Feed one inbound event
    ///
    /// Returns `Some(SignalBatch)` when the event closed a frame.
    #[instrument(
        level = "trace",
        name = "frame_processor_handle",
        skip(self, event),
        fields(event = event.label())
    )]
    pub fn handle(&mut self, event: TouchEvent) -> Option<SignalBatch> {
        match event {
            TouchEvent::BeginFrame { timetag } => {
                self.begin_frame(timetag);
                None
            }
            TouchEvent::Alive { kind, ids } => {
                self.liveness(kind, &ids);
                None
            }
            TouchEvent::Set(record) => {
                self.set_contact(&record);
                None
            }
            TouchEvent::EndFrame => Some(self.end_frame()),
        }
    }

    /// Open a frame stamped with `timetag` (processor clock when absent).
    ///
    /// A begin while a frame is already open keeps the open frame.
    pub fn begin_frame(&mut self, timetag: Option<f64>) {
        if let Some(open) = &self.queue {
            warn!(
                frame_id = open.frame_id(),
                "begin_frame while a frame is open, keeping the open frame"
            );
            return;
        }

        self.frame_counter += 1;
        let timetag = timetag.unwrap_or_else(|| self.clock_now());
        self.queue = Some(FrameQueue::start(self.frame_counter, timetag));
    }

    /// Apply a liveness list for `kind`.
    ///
    /// Publishes the count of distinct alive ids, frees every slot whose id
    /// is missing and releases its instances on every per-contact signal.
    ///
    /// The count is taken after dedup, so a list repeating an id reports it
    /// once rather than the raw list length.
    pub fn liveness(&mut self, kind: ContactKind, ids: &[SessionId]) {
        let Some(table) = self.table_mut(kind) else {
            trace!(kind = kind.as_str(), "object tracking disabled, liveness ignored");
            return;
        };
        let released = table.reconcile(ids);

        let mut distinct = ids.to_vec();
        distinct.sort_unstable();
        distinct.dedup();
        let alive = i32::try_from(distinct.len()).unwrap_or(i32::MAX);

        let queue = self.queue_mut();
        queue.publish_int(Signal::count_for(kind), None, alive);
        for &session_id in &released {
            for &signal in Signal::per_instance(kind) {
                queue.release_instance(signal, session_id);
            }
            debug!(session_id, kind = kind.as_str(), "contact released");
        }

        if !released.is_empty() {
            self.released += released.len() as u32;
            metrics::counter!("tuio_gesture_releases_total", "kind" => kind.as_str())
                .increment(released.len() as u64);
        }
    }

    /// Apply one contact reading.
    ///
    /// A new id that finds the table full is dropped with a warning; the
    /// rest of the frame continues.
    pub fn set_contact(&mut self, record: &ContactRecord) {
        let kind = record.kind;
        let session_id = record.session_id;
        let position = record.position();

        let Some(table) = self.table_mut(kind) else {
            trace!(session_id, "object tracking disabled, contact ignored");
            return;
        };

        match table.upsert(session_id, position, record.pose()) {
            Ok(outcome) => {
                trace!(
                    session_id,
                    slot = outcome.slot(),
                    allocated = outcome.is_new(),
                    kind = kind.as_str(),
                    "contact upserted"
                );

                let queue = self.queue_mut();
                match kind {
                    ContactKind::Touch => {
                        queue.publish_vector(Signal::TouchPosition, Some(session_id), position);
                    }
                    ContactKind::Object => {
                        queue.publish_vector(Signal::ObjectPosition, Some(session_id), position);
                        if let Some(type_id) = record.type_id {
                            queue.publish_int(Signal::ObjectType, Some(session_id), type_id);
                        }
                        if let Some(angle) = record.angle {
                            queue.publish_scalar(
                                Signal::ObjectOrientation,
                                Some(session_id),
                                angle,
                            );
                        }
                    }
                }
            }
            Err(err) => {
                warn!(
                    session_id,
                    kind = kind.as_str(),
                    error = %err,
                    "contact update dropped"
                );
                self.queue_mut();
                self.dropped += 1;
                metrics::counter!("tuio_gesture_contacts_dropped_total", "kind" => kind.as_str())
                    .increment(1);
            }
        }
    }

    /// Close the open frame (or an implicit one).
    ///
    /// Runs the aggregate pass over live touches and publishes centroid,
    /// translation, growth and rotation, in that order. With no live touch
    /// nothing is published and the previous values stay at the sink.
    #[instrument(level = "trace", name = "frame_processor_end_frame", skip(self))]
    pub fn end_frame(&mut self) -> SignalBatch {
        let aggregate = compute_frame(self.touches.live());

        let mut queue = match self.queue.take() {
            Some(queue) => queue,
            None => self.implicit_queue(),
        };

        match aggregate {
            Some(frame) => {
                queue.publish_vector(Signal::TouchCentroid, None, frame.centroid);
                queue.publish_vector(Signal::TouchTranslation, None, frame.translation);
                queue.publish_scalar(Signal::TouchGrowth, None, frame.growth);
                queue.publish_scalar(Signal::TouchRotation, None, frame.rotation);
            }
            None => trace!(frame_id = queue.frame_id(), "no live touches, aggregates skipped"),
        }

        let stats = FrameStats {
            touch_count: self.touches.len(),
            object_count: self.objects.as_ref().map_or(0, SlotTable::len),
            released: std::mem::take(&mut self.released),
            dropped_updates: std::mem::take(&mut self.dropped),
            implicit: false,
        };

        self.log_contacts(queue.frame_id());
        queue.send(stats)
    }

    /// Frames opened so far, explicit and implicit
    pub fn frame_count(&self) -> u64 {
        self.frame_counter
    }

    pub fn is_frame_open(&self) -> bool {
        self.queue.is_some()
    }

    pub fn touches(&self) -> &SlotTable {
        &self.touches
    }

    /// `None` when object tracking is disabled
    pub fn objects(&self) -> Option<&SlotTable> {
        self.objects.as_ref()
    }

    fn table_mut(&mut self, kind: ContactKind) -> Option<&mut SlotTable> {
        match kind {
            ContactKind::Touch => Some(&mut self.touches),
            ContactKind::Object => self.objects.as_mut(),
        }
    }

    fn queue_mut(&mut self) -> &mut FrameQueue {
        let queue = match self.queue.take() {
            Some(queue) => queue,
            None => self.implicit_queue(),
        };
        self.queue.insert(queue)
    }

    fn implicit_queue(&mut self) -> FrameQueue {
        self.frame_counter += 1;
        debug!(
            frame_id = self.frame_counter,
            "event outside a frame, opening implicit frame"
        );
        FrameQueue::start_implicit(self.frame_counter, self.clock_now())
    }

    fn clock_now(&self) -> f64 {
        self.clock.elapsed().as_secs_f64()
    }

    fn log_contacts(&self, frame_id: u64) {
        if !tracing::enabled!(tracing::Level::DEBUG) {
            return;
        }
        for contact in self.touches.live() {
            debug!(
                frame_id,
                session_id = contact.session_id,
                x = contact.current.x,
                y = contact.current.y,
                "touch"
            );
        }
        if let Some(objects) = &self.objects {
            for contact in objects.live() {
                debug!(
                    frame_id,
                    session_id = contact.session_id,
                    x = contact.current.x,
                    y = contact.current.y,
                    type_id = contact.pose.and_then(|p| p.type_id),
                    angle = contact.pose.and_then(|p| p.angle),
                    "object"
                );
            }
        }
        debug!(
            frame_id,
            touches = %self.touches,
            "frame closed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ObjectPose, SignalUpdate, SignalValue};

    const EPS: f32 = 1e-5;

    fn processor() -> FrameProcessor {
        FrameProcessor::new(&TrackerConfig::default())
    }

    fn run_frame(processor: &mut FrameProcessor, events: Vec<TouchEvent>) -> SignalBatch {
        let mut out = None;
        for event in events {
            if let Some(batch) = processor.handle(event) {
                out = Some(batch);
            }
        }
        out.expect("frame must close")
    }

    fn vec2(batch: &SignalBatch, signal: Signal) -> [f32; 2] {
        match batch.value_of(signal) {
            Some(SignalValue::Vec2(v)) => v,
            other => panic!("{signal} not a vector: {other:?}"),
        }
    }

    fn scalar(batch: &SignalBatch, signal: Signal) -> f32 {
        match batch.value_of(signal) {
            Some(SignalValue::Float(v)) => v,
            other => panic!("{signal} not a scalar: {other:?}"),
        }
    }

    #[test]
    fn test_two_frame_single_contact() {
        let mut processor = processor();

        let frame1 = run_frame(
            &mut processor,
            vec![
                TouchEvent::begin(1.0),
                TouchEvent::alive_touches(vec![3]),
                TouchEvent::set_touch(3, 0.5, 0.5),
                TouchEvent::EndFrame,
            ],
        );
        assert_eq!(frame1.frame_id, 1);
        assert_eq!(frame1.timetag, 1.0);
        assert_eq!(processor.touches().len(), 1);
        assert_eq!(frame1.value_of(Signal::TouchCount), Some(SignalValue::Int(1)));
        assert_eq!(
            frame1.value_of_instance(Signal::TouchPosition, Some(3)),
            Some(SignalValue::Vec2([0.5, 0.5]))
        );
        assert_eq!(vec2(&frame1, Signal::TouchTranslation), [0.0, 0.0]);
        assert_eq!(scalar(&frame1, Signal::TouchGrowth), 0.0);
        assert_eq!(scalar(&frame1, Signal::TouchRotation), 0.0);

        let frame2 = run_frame(
            &mut processor,
            vec![
                TouchEvent::begin(1.1),
                TouchEvent::alive_touches(vec![3]),
                TouchEvent::set_touch(3, 0.6, 0.5),
                TouchEvent::EndFrame,
            ],
        );
        let translation = vec2(&frame2, Signal::TouchTranslation);
        assert!((translation[0] - 0.1).abs() < EPS);
        assert!(translation[1].abs() < EPS);
        assert_eq!(scalar(&frame2, Signal::TouchGrowth), 0.0);
        assert_eq!(scalar(&frame2, Signal::TouchRotation), 0.0);
        assert_eq!(frame2.stats.touch_count, 1);
    }

    #[test]
    fn test_batch_order_is_count_releases_upserts_aggregates() {
        let mut processor = processor();
        run_frame(
            &mut processor,
            vec![
                TouchEvent::begin(0.0),
                TouchEvent::alive_touches(vec![5, 7]),
                TouchEvent::set_touch(5, 0.1, 0.1),
                TouchEvent::set_touch(7, 0.2, 0.2),
                TouchEvent::EndFrame,
            ],
        );

        let batch = run_frame(
            &mut processor,
            vec![
                TouchEvent::begin(0.1),
                TouchEvent::alive_touches(vec![7]),
                TouchEvent::set_touch(7, 0.25, 0.2),
                TouchEvent::EndFrame,
            ],
        );

        let signals: Vec<Signal> = batch.updates.iter().map(SignalUpdate::signal).collect();
        assert_eq!(
            signals,
            vec![
                Signal::TouchCount,
                Signal::TouchPosition,
                Signal::TouchPosition,
                Signal::TouchCentroid,
                Signal::TouchTranslation,
                Signal::TouchGrowth,
                Signal::TouchRotation,
            ]
        );
        assert!(batch.updates[1].is_release());
        assert_eq!(batch.releases_of(Signal::TouchPosition), vec![5]);
        assert_eq!(batch.stats.released, 1);
        assert_eq!(processor.touches().slot_of(7), Some(1));
        assert!(processor.touches().get(5).is_none());
    }

    #[test]
    fn test_capacity_overflow_drops_and_continues() {
        let config = TrackerConfig {
            touch_capacity: 2,
            ..TrackerConfig::default()
        };
        let mut processor = FrameProcessor::new(&config);

        let batch = run_frame(
            &mut processor,
            vec![
                TouchEvent::begin(0.0),
                TouchEvent::alive_touches(vec![1, 2, 3]),
                TouchEvent::set_touch(1, 0.1, 0.1),
                TouchEvent::set_touch(2, 0.2, 0.2),
                TouchEvent::set_touch(3, 0.3, 0.3),
                TouchEvent::set_touch(1, 0.15, 0.1),
                TouchEvent::EndFrame,
            ],
        );

        assert_eq!(batch.stats.dropped_updates, 1);
        assert_eq!(batch.stats.touch_count, 2);
        assert_eq!(batch.value_of_instance(Signal::TouchPosition, Some(3)), None);
        assert_eq!(
            batch.value_of_instance(Signal::TouchPosition, Some(1)),
            Some(SignalValue::Vec2([0.15, 0.1]))
        );
        // count reflects the liveness list, not the table
        assert_eq!(batch.value_of(Signal::TouchCount), Some(SignalValue::Int(3)));
    }

    #[test]
    fn test_empty_frame_publishes_only_count() {
        let mut processor = processor();
        run_frame(
            &mut processor,
            vec![
                TouchEvent::begin(0.0),
                TouchEvent::alive_touches(vec![1]),
                TouchEvent::set_touch(1, 0.1, 0.1),
                TouchEvent::EndFrame,
            ],
        );

        let batch = run_frame(
            &mut processor,
            vec![
                TouchEvent::begin(0.1),
                TouchEvent::alive_touches(Vec::new()),
                TouchEvent::EndFrame,
            ],
        );
        assert_eq!(batch.value_of(Signal::TouchCount), Some(SignalValue::Int(0)));
        assert_eq!(batch.releases_of(Signal::TouchPosition), vec![1]);
        assert_eq!(batch.value_of(Signal::TouchTranslation), None);
        assert_eq!(batch.value_of(Signal::TouchRotation), None);
        assert!(processor.touches().is_empty());
    }

    #[test]
    fn test_count_uses_distinct_ids() {
        let mut processor = processor();
        let batch = run_frame(
            &mut processor,
            vec![
                TouchEvent::begin(0.0),
                TouchEvent::alive_touches(vec![4, 4, 9]),
                TouchEvent::EndFrame,
            ],
        );
        assert_eq!(batch.value_of(Signal::TouchCount), Some(SignalValue::Int(2)));
    }

    #[test]
    fn test_events_outside_frame_open_implicit_frame() {
        let mut processor = processor();
        assert!(processor.handle(TouchEvent::set_touch(1, 0.2, 0.2)).is_none());
        assert!(processor.is_frame_open());

        let batch = processor.handle(TouchEvent::EndFrame).unwrap();
        assert!(batch.stats.implicit);
        assert_eq!(batch.frame_id, 1);
        assert!(!processor.is_frame_open());

        // bare end_frame still runs the aggregate pass
        let batch = processor.end_frame();
        assert!(batch.stats.implicit);
        assert_eq!(batch.frame_id, 2);
        assert!(batch.value_of(Signal::TouchCentroid).is_some());
        assert_eq!(processor.frame_count(), 2);
    }

    #[test]
    fn test_second_begin_keeps_open_frame() {
        let mut processor = processor();
        processor.begin_frame(Some(5.0));
        processor.handle(TouchEvent::set_touch(1, 0.3, 0.3));
        processor.begin_frame(Some(6.0));

        let batch = processor.end_frame();
        assert_eq!(batch.timetag, 5.0);
        assert_eq!(batch.frame_id, 1);
        assert!(!batch.stats.implicit);
        assert!(batch
            .value_of_instance(Signal::TouchPosition, Some(1))
            .is_some());
    }

    #[test]
    fn test_object_contacts_publish_pose() {
        let mut processor = processor();
        let batch = run_frame(
            &mut processor,
            vec![
                TouchEvent::begin(0.0),
                TouchEvent::alive_objects(vec![20]),
                TouchEvent::Set(ContactRecord::object(20, 4, 0.4, 0.6, 1.25)),
                TouchEvent::EndFrame,
            ],
        );

        assert_eq!(batch.value_of(Signal::ObjectCount), Some(SignalValue::Int(1)));
        assert_eq!(
            batch.value_of_instance(Signal::ObjectType, Some(20)),
            Some(SignalValue::Int(4))
        );
        assert_eq!(
            batch.value_of_instance(Signal::ObjectOrientation, Some(20)),
            Some(SignalValue::Float(1.25))
        );
        assert_eq!(batch.stats.object_count, 1);
        // objects do not feed the touch aggregates
        assert_eq!(batch.value_of(Signal::TouchCentroid), None);

        let batch = run_frame(
            &mut processor,
            vec![
                TouchEvent::begin(0.1),
                TouchEvent::alive_objects(Vec::new()),
                TouchEvent::EndFrame,
            ],
        );
        assert_eq!(
            batch.releases_of(Signal::ObjectPosition),
            vec![20],
            "object release must cover every per-instance signal"
        );
        assert_eq!(batch.releases_of(Signal::ObjectType), vec![20]);
        assert_eq!(batch.releases_of(Signal::ObjectOrientation), vec![20]);
    }

    #[test]
    fn test_partial_object_update_matches_stored_pose() {
        let mut processor = processor();
        run_frame(
            &mut processor,
            vec![
                TouchEvent::begin(0.0),
                TouchEvent::alive_objects(vec![20]),
                TouchEvent::Set(ContactRecord::object(20, 4, 0.4, 0.6, 1.0)),
                TouchEvent::EndFrame,
            ],
        );

        let mut turned = ContactRecord::object(20, 4, 0.4, 0.6, 2.0);
        turned.type_id = None;
        let mut fresh = ContactRecord::object(21, 0, 0.5, 0.5, 0.5);
        fresh.type_id = None;

        let batch = run_frame(
            &mut processor,
            vec![
                TouchEvent::begin(0.1),
                TouchEvent::alive_objects(vec![20, 21]),
                TouchEvent::Set(turned),
                TouchEvent::Set(fresh),
                TouchEvent::EndFrame,
            ],
        );
        assert_eq!(
            batch.value_of_instance(Signal::ObjectOrientation, Some(20)),
            Some(SignalValue::Float(2.0))
        );
        assert_eq!(batch.value_of_instance(Signal::ObjectType, Some(20)), None);

        let objects = processor.objects().unwrap();
        assert_eq!(objects.get(20).unwrap().pose, Some(ObjectPose::new(4, 2.0)));
        assert_eq!(
            objects.get(21).unwrap().pose,
            Some(ObjectPose {
                type_id: None,
                angle: Some(0.5)
            })
        );

        let mut retyped = ContactRecord::object(20, 9, 0.4, 0.6, 0.0);
        retyped.angle = None;
        let batch = run_frame(
            &mut processor,
            vec![
                TouchEvent::begin(0.2),
                TouchEvent::alive_objects(vec![20, 21]),
                TouchEvent::Set(retyped),
                TouchEvent::EndFrame,
            ],
        );
        assert_eq!(
            batch.value_of_instance(Signal::ObjectType, Some(20)),
            Some(SignalValue::Int(9))
        );
        assert_eq!(
            processor.objects().unwrap().get(20).unwrap().pose,
            Some(ObjectPose::new(9, 2.0))
        );
    }

    #[test]
    fn test_object_tracking_disabled() {
        let config = TrackerConfig {
            track_objects: false,
            ..TrackerConfig::default()
        };
        let mut processor = FrameProcessor::new(&config);
        let batch = run_frame(
            &mut processor,
            vec![
                TouchEvent::begin(0.0),
                TouchEvent::alive_objects(vec![20]),
                TouchEvent::Set(ContactRecord::object(20, 4, 0.4, 0.6, 1.25)),
                TouchEvent::EndFrame,
            ],
        );
        assert!(processor.objects().is_none());
        assert!(batch.is_empty());
    }

    #[test]
    fn test_same_frame_slot_reuse() {
        let config = TrackerConfig {
            touch_capacity: 1,
            ..TrackerConfig::default()
        };
        let mut processor = FrameProcessor::new(&config);
        run_frame(
            &mut processor,
            vec![
                TouchEvent::begin(0.0),
                TouchEvent::alive_touches(vec![1]),
                TouchEvent::set_touch(1, 0.1, 0.1),
                TouchEvent::EndFrame,
            ],
        );

        let batch = run_frame(
            &mut processor,
            vec![
                TouchEvent::begin(0.1),
                TouchEvent::alive_touches(vec![2]),
                TouchEvent::set_touch(2, 0.9, 0.9),
                TouchEvent::EndFrame,
            ],
        );
        assert_eq!(batch.releases_of(Signal::TouchPosition), vec![1]);
        assert_eq!(batch.stats.dropped_updates, 0);
        assert_eq!(processor.touches().slot_of(2), Some(0));
        // the new contact starts with zero velocity
        assert_eq!(vec2(&batch, Signal::TouchTranslation), [0.0, 0.0]);
    }
}
