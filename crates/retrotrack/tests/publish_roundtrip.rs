//! End-to-end check of the consumer side: the published record must carry
//! heading, age and distance together in wire order, and a no-target frame
//! must publish nothing numeric while still re-streaming video.

use std::time::Instant;

use approx::assert_relative_eq;
use retrotrack::frame::{Frame, VideoSink};
use retrotrack::pipeline::{FrameConsumer, SharedTarget, TargetInformation};
use retrotrack::publish::{keys, LoopbackTransport, LoopbackValue, Publisher};
use retrotrack_core::resolve;

#[derive(Default)]
struct CountingSink {
    frames: usize,
}

impl VideoSink for CountingSink {
    fn write_frame(&mut self, _frame: &Frame) {
        self.frames += 1;
    }
}

#[test]
fn publishes_coherent_triple_in_wire_order() {
    let fov = 60.0;
    let shared = SharedTarget::new();
    shared.store(TargetInformation {
        normalized_center: 0.5,
        distance_ratio: 16.0,
        frame_start: Instant::now(),
    });

    let mut publisher = Publisher::new(LoopbackTransport::default(), CountingSink::default(), fov);
    publisher.on_frame(&shared, &Frame::new(320, 240));

    let transport = publisher.transport();
    assert_eq!(transport.flushes, 1, "publish must force a flush");

    let expected_heading = 15.0;
    let expected_distance = resolve::distance_to_target(16.0, fov);

    match transport.values.get(keys::TARGET_ERROR) {
        Some(LoopbackValue::F64(heading)) => assert_relative_eq!(*heading, expected_heading),
        other => panic!("unexpected {} value: {other:?}", keys::TARGET_ERROR),
    }

    let Some(LoopbackValue::I64(age_ms)) = transport.values.get(keys::TARGET_PROCESSING_TIME)
    else {
        panic!("missing {}", keys::TARGET_PROCESSING_TIME);
    };
    assert!(*age_ms >= 0);

    match transport.values.get(keys::TARGET_INFORMATION) {
        Some(LoopbackValue::F64Array(triple)) => {
            assert_eq!(triple.len(), 3);
            assert_relative_eq!(triple[0], expected_heading);
            assert_relative_eq!(triple[1], *age_ms as f64);
            assert_relative_eq!(triple[2], expected_distance);
        }
        other => panic!("unexpected {} value: {other:?}", keys::TARGET_INFORMATION),
    }

    assert_eq!(publisher.video().frames, 1);
}

#[test]
fn no_target_frame_publishes_nothing_numeric() {
    let shared = SharedTarget::new();
    shared.store(TargetInformation::none_at(Instant::now()));

    let mut publisher = Publisher::new(LoopbackTransport::default(), CountingSink::default(), 150.0);
    publisher.on_frame(&shared, &Frame::new(320, 240));

    let transport = publisher.transport();
    assert!(transport.values.is_empty(), "NaN must never cross the wire");
    assert_eq!(transport.flushes, 0);

    // The annotated stream still gets its frame.
    assert_eq!(publisher.video().frames, 1);
}

#[test]
fn consumer_before_first_frame_only_streams_video() {
    let shared = SharedTarget::new();
    let mut publisher = Publisher::new(LoopbackTransport::default(), CountingSink::default(), 150.0);
    publisher.on_frame(&shared, &Frame::new(320, 240));

    assert!(publisher.transport().values.is_empty());
    assert_eq!(publisher.video().frames, 1);
}
