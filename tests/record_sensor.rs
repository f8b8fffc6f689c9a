//! End-to-end tests for the recording sensor decorator.
//!
//! These tests drive a `RecordSensor` over a `MockSensor`, standing in for
//! the hardware delivery thread, and verify the central invariant: the live
//! path is failure-isolated from the record path. A recording fault stops
//! recording and raises one user notification; the live caller keeps
//! receiving every frame, in order, no matter what the recording side does.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use sensor_tap::callback::{FrameCallbackAdapter, NotificationCallbackAdapter};
use sensor_tap::error::TapError;
use sensor_tap::options::SensorOption;
use sensor_tap::record::{ErrorSink, RecordSensor};
use sensor_tap::sensor::mock::MockSensor;
use sensor_tap::sensor::types::{
    ExtensionKind, Frame, NotificationCategory, OptionId, StreamFormat, StreamKind, StreamProfile,
};
use sensor_tap::sensor::SensorInterface;

fn depth_profile() -> StreamProfile {
    StreamProfile {
        stream: StreamKind::Depth,
        format: StreamFormat::Z16,
        index: 0,
        width: 640,
        height: 480,
        fps: 30,
    }
}

fn frame(number: u64) -> Frame {
    Frame::new(depth_profile(), number, (number as f64) * 33.3, vec![0; 16])
}

/// Test rig: a decorated mock sensor with shared logs for everything
/// observable.
struct Rig {
    mock: Arc<MockSensor>,
    record: RecordSensor,
    live_frames: Arc<Mutex<Vec<u64>>>,
    recorded_frames: Arc<Mutex<Vec<u64>>>,
    notifications: Arc<Mutex<Vec<String>>>,
}

impl Rig {
    /// Build a rig whose recording sink fails (reports through the error
    /// sink) when it sees a frame number contained in `fail_on`.
    fn new(fail_on: &[u64]) -> Self {
        let mock = Arc::new(MockSensor::depth());
        let recorded_frames = Arc::new(Mutex::new(Vec::new()));
        let snapshot_count = Arc::new(AtomicUsize::new(0));

        let sink_log = Arc::clone(&recorded_frames);
        let fail_on = fail_on.to_vec();
        let record = RecordSensor::new(
            Arc::clone(&mock) as Arc<dyn SensorInterface>,
            move |frame: Frame, sink: &ErrorSink| {
                sink_log.lock().unwrap().push(frame.number());
                if fail_on.contains(&frame.number()) {
                    sink(format!("archive write failed at frame {}", frame.number()));
                }
            },
            {
                let snapshot_count = Arc::clone(&snapshot_count);
                move |_, _, _| {
                    snapshot_count.fetch_add(1, Ordering::SeqCst);
                }
            },
        );

        let notifications = Arc::new(Mutex::new(Vec::new()));
        let notification_log = Arc::clone(&notifications);
        record
            .register_notifications_callback(Arc::new(NotificationCallbackAdapter::new(
                move |note| {
                    if note.category == NotificationCategory::RecordingError {
                        notification_log.lock().unwrap().push(note.description.clone());
                    }
                },
            )))
            .unwrap();

        record.open(&[depth_profile()]).unwrap();

        let live_frames = Arc::new(Mutex::new(Vec::new()));
        let live_log = Arc::clone(&live_frames);
        record
            .start(Arc::new(FrameCallbackAdapter::new(move |frame: Frame| {
                live_log.lock().unwrap().push(frame.number());
            })))
            .unwrap();

        Self {
            mock,
            record,
            live_frames,
            recorded_frames,
            notifications,
        }
    }

    fn live(&self) -> Vec<u64> {
        self.live_frames.lock().unwrap().clone()
    }

    fn recorded(&self) -> Vec<u64> {
        self.recorded_frames.lock().unwrap().clone()
    }

    fn notification_count(&self) -> usize {
        self.notifications.lock().unwrap().len()
    }
}

#[test]
fn live_callback_receives_every_frame_in_order_while_recording() {
    let rig = Rig::new(&[]);
    rig.record.start_recording().unwrap();

    for n in 1..=5 {
        rig.mock.emit_frame(frame(n));
    }

    assert_eq!(rig.live(), vec![1, 2, 3, 4, 5]);
    assert_eq!(rig.recorded(), vec![1, 2, 3, 4, 5]);
    assert_eq!(rig.notification_count(), 0);
    assert!(rig.record.is_recording());
}

#[test]
fn sink_failure_stops_recording_but_not_the_live_stream() {
    // Spec scenario: recording active for f1..f3, sink fails on f3.
    let rig = Rig::new(&[3]);
    rig.record.start_recording().unwrap();

    for n in 1..=5 {
        rig.mock.emit_frame(frame(n));
    }

    // The live caller saw everything, in arrival order.
    assert_eq!(rig.live(), vec![1, 2, 3, 4, 5]);
    // The sink saw f1..f3 and nothing after the fault.
    assert_eq!(rig.recorded(), vec![1, 2, 3]);
    // Exactly one notification, and recording is off for f4, f5.
    assert_eq!(rig.notification_count(), 1);
    assert!(!rig.record.is_recording());
}

#[test]
fn recording_stops_strictly_before_next_frame_is_evaluated() {
    let rig = Rig::new(&[1]);
    rig.record.start_recording().unwrap();

    rig.mock.emit_frame(frame(1));
    // The failure is reported synchronously from inside the sink, so the
    // flag must already be down before the next frame arrives.
    assert!(!rig.record.is_recording());

    rig.mock.emit_frame(frame(2));
    assert_eq!(rig.recorded(), vec![1]);
    assert_eq!(rig.live(), vec![1, 2]);
}

#[test]
fn frames_are_not_recorded_before_recording_starts() {
    let rig = Rig::new(&[]);

    rig.mock.emit_frame(frame(1));
    rig.record.start_recording().unwrap();
    rig.mock.emit_frame(frame(2));

    assert_eq!(rig.live(), vec![1, 2]);
    assert_eq!(rig.recorded(), vec![2]);
}

#[test]
fn pause_suppresses_recording_but_not_delivery() {
    let rig = Rig::new(&[]);
    rig.record.start_recording().unwrap();

    rig.mock.emit_frame(frame(1));
    rig.record.pause_recording();
    rig.mock.emit_frame(frame(2));
    rig.mock.emit_frame(frame(3));
    rig.record.resume_recording();
    rig.mock.emit_frame(frame(4));

    assert_eq!(rig.live(), vec![1, 2, 3, 4]);
    assert_eq!(rig.recorded(), vec![1, 4]);
    assert!(rig.record.is_recording());
}

#[test]
fn frame_delivery_from_a_separate_thread() {
    let rig = Rig::new(&[3]);
    rig.record.start_recording().unwrap();

    let mock = Arc::clone(&rig.mock);
    thread::spawn(move || {
        for n in 1..=5 {
            mock.emit_frame(frame(n));
        }
    })
    .join()
    .unwrap();

    assert_eq!(rig.live(), vec![1, 2, 3, 4, 5]);
    assert_eq!(rig.recorded(), vec![1, 2, 3]);
    assert_eq!(rig.notification_count(), 1);
}

#[test]
fn stop_with_error_is_idempotent_on_the_flag_but_always_notifies() {
    let rig = Rig::new(&[]);
    rig.record.start_recording().unwrap();

    rig.record.stop_with_error("disk full");
    assert!(!rig.record.is_recording());
    assert_eq!(rig.notification_count(), 1);

    // Already inactive: still raises a notification, state unchanged.
    rig.record.stop_with_error("disk full");
    assert!(!rig.record.is_recording());
    assert_eq!(rig.notification_count(), 2);
}

#[test]
fn stop_does_not_stop_recording() {
    let rig = Rig::new(&[]);
    rig.record.start_recording().unwrap();

    rig.record.stop().unwrap();
    assert!(!rig.record.is_streaming());
    // Recording lifecycle belongs to the owning session.
    assert!(rig.record.is_recording());

    // No further frames reach either path after stop.
    rig.mock.emit_frame(frame(9));
    assert!(!rig.live().contains(&9));
    assert!(!rig.recorded().contains(&9));
}

#[test]
fn option_wrappers_are_identical_across_threads() {
    let mock = Arc::new(MockSensor::depth());
    let record = Arc::new(RecordSensor::new(
        Arc::clone(&mock) as Arc<dyn SensorInterface>,
        |_, _| {},
        |_, _, _| {},
    ));

    let a = Arc::clone(&record);
    let b = Arc::clone(&record);
    let t1 = thread::spawn(move || a.get_option(OptionId::Exposure).unwrap());
    let t2 = thread::spawn(move || b.get_option(OptionId::Gain).unwrap());

    let exposure = t1.join().unwrap();
    let gain = t2.join().unwrap();
    assert!(!Arc::ptr_eq(&exposure, &gain));

    // A later single-threaded call returns the identical wrapper.
    let again = record.get_option(OptionId::Exposure).unwrap();
    assert!(Arc::ptr_eq(&exposure, &again));
}

#[test]
fn unsupported_option_surfaces_live_failure_uncached() {
    let mock = Arc::new(MockSensor::depth());
    let record = RecordSensor::new(
        Arc::clone(&mock) as Arc<dyn SensorInterface>,
        |_, _| {},
        |_, _, _| {},
    );

    for _ in 0..2 {
        let result = record.get_option(OptionId::WhiteBalance);
        assert!(matches!(
            result,
            Err(TapError::UnsupportedOption {
                id: OptionId::WhiteBalance
            })
        ));
    }
    // Not supported through the decorator either, same as the live sensor.
    assert!(!record.supports_option(OptionId::WhiteBalance));
}

#[test]
fn option_writes_are_recorded_while_active() {
    let mock = Arc::new(MockSensor::depth());
    let snapshots = Arc::new(Mutex::new(Vec::new()));
    let snapshot_log = Arc::clone(&snapshots);
    let record = RecordSensor::new(
        Arc::clone(&mock) as Arc<dyn SensorInterface>,
        |_, _| {},
        move |kind, snapshot, _| {
            assert_eq!(kind, ExtensionKind::Options);
            snapshot_log.lock().unwrap().push(snapshot.state.clone());
        },
    );

    let exposure = record.get_option(OptionId::Exposure).unwrap();

    // Not recording: the write goes through but is not archived.
    exposure.set(150.0).unwrap();
    assert!(snapshots.lock().unwrap().is_empty());

    record.open(&[depth_profile()]).unwrap();
    record.start_recording().unwrap();
    exposure.set(250.0).unwrap();

    let archived = snapshots.lock().unwrap();
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0]["option"], "Exposure");
    assert_eq!(archived[0]["value"], 250.0);

    // The live option saw both writes regardless.
    let live = mock.get_option(OptionId::Exposure).unwrap();
    assert!((live.get().unwrap() - 250.0).abs() < f32::EPSILON);
}

#[test]
fn snapshot_sink_failure_is_isolated_like_frames() {
    let mock = Arc::new(MockSensor::depth());
    let notifications = Arc::new(AtomicUsize::new(0));
    let record = RecordSensor::new(
        Arc::clone(&mock) as Arc<dyn SensorInterface>,
        |_, _| {},
        |_, _, sink: &ErrorSink| {
            sink("snapshot serialization failed".to_string());
        },
    );

    let counter = Arc::clone(&notifications);
    record
        .register_notifications_callback(Arc::new(NotificationCallbackAdapter::new(move |note| {
            if note.category == NotificationCategory::RecordingError {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        })))
        .unwrap();

    record.open(&[depth_profile()]).unwrap();
    record.start_recording().unwrap();

    let extension = record.extend_to(ExtensionKind::DepthSensor).unwrap();
    record.record_snapshot(ExtensionKind::DepthSensor, extension.snapshot().unwrap());

    assert!(!record.is_recording());
    assert_eq!(notifications.load(Ordering::SeqCst), 1);
}

#[test]
fn decorated_sensor_is_indistinguishable_through_the_trait() {
    // A consumer written against the trait must behave identically with
    // either sensor.
    fn exercise(sensor: &dyn SensorInterface) -> (usize, String, bool) {
        let profiles = sensor.stream_profiles();
        sensor.open(&profiles[..1]).unwrap();
        let name = sensor
            .get_info(sensor_tap::sensor::types::InfoId::Name)
            .unwrap();
        let streaming = sensor.is_streaming();
        sensor.close().unwrap();
        (profiles.len(), name, streaming)
    }

    let plain = MockSensor::depth();
    let plain_result = exercise(&plain);

    let mock = Arc::new(MockSensor::depth());
    let record = RecordSensor::new(
        Arc::clone(&mock) as Arc<dyn SensorInterface>,
        |_, _| {},
        |_, _, _| {},
    );
    let decorated_result = exercise(&record);

    assert_eq!(plain_result, decorated_result);
}

#[test]
fn live_notifications_are_forwarded_to_the_caller() {
    use sensor_tap::sensor::types::{Notification, NotificationSeverity};

    let rig = Rig::new(&[]);
    // Rig registered a callback counting RecordingError notifications only;
    // register a fresh one counting everything.
    let all = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&all);
    rig.record
        .register_notifications_callback(Arc::new(NotificationCallbackAdapter::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })))
        .unwrap();

    rig.mock.emit_notification(&Notification::new(
        NotificationSeverity::Warn,
        NotificationCategory::FramesTimeout,
        "no frames for 500ms",
    ));

    assert_eq!(all.load(Ordering::SeqCst), 1);
}

#[test]
fn control_plane_error_propagates_without_recording_side_effects() {
    let mock = Arc::new(MockSensor::depth());
    let record = RecordSensor::new(
        Arc::clone(&mock) as Arc<dyn SensorInterface>,
        |_, _| {},
        |_, _, _| {},
    );

    record.open(&[depth_profile()]).unwrap();
    mock.inject_error(TapError::SensorCommunication("usb reset".to_string()));

    let result = record.start(Arc::new(FrameCallbackAdapter::new(|_| {})));
    assert!(matches!(result, Err(TapError::SensorCommunication(_))));
    assert!(!record.is_recording());
    assert!(!record.is_streaming());
}
