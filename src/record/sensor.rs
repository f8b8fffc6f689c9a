//! The recording sensor decorator.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::{debug, trace, warn};

use crate::callback::{
    FrameCallback, FrameCallbackAdapter, NotificationCallback, NotificationCallbackAdapter,
};
use crate::error::{Result, TapError};
use crate::options::{OptionWriteHook, RecordableOptionCache, SensorOption};
use crate::sensor::SensorInterface;
use crate::sensor::types::{
    DeviceDescriptor, Extension, ExtensionKind, ExtensionSnapshot, Frame, InfoId, NativeProfile,
    Notification, NotificationCategory, NotificationSeverity, OptionId, StreamProfile,
};

/// Shared callable handed to recording handlers for reporting failures.
///
/// Calling it with a human-readable reason forces recording off and raises
/// one user notification. Handlers may invoke it synchronously or keep a
/// clone and report after queuing.
pub type ErrorSink = Arc<dyn Fn(String) + Send + Sync>;

/// Handler receiving a copy of every frame captured while recording is
/// active and unpaused.
pub type FrameRecordHandler = Box<dyn Fn(Frame, &ErrorSink) + Send + Sync>;

/// Handler receiving extension-state snapshots to be archived.
pub type SnapshotRecordHandler = Box<dyn Fn(ExtensionKind, ExtensionSnapshot, &ErrorSink) + Send + Sync>;

/// Control-plane state guarded by one mutex.
struct ControlState {
    /// Advisory pause flag; meaningless unless recording is active.
    paused: bool,
    /// The caller's notification callback, retained so recording faults can
    /// be surfaced to the user.
    user_notifications: Option<Arc<dyn NotificationCallback>>,
}

/// State shared between the decorator and the callback it installs into the
/// live sensor. Lives behind an `Arc` so the frame-delivery closure and the
/// error sinks can outlive individual control calls.
struct RecordCore {
    /// Weak self-reference handed out inside error sinks, so a handler may
    /// keep a sink past the decorator's lifetime without leaking the core.
    me: Weak<RecordCore>,
    /// Read with acquire on the frame thread, written with release from
    /// control threads, so a stop is promptly visible and never torn.
    is_recording: AtomicBool,
    control: Mutex<ControlState>,
    on_frame: FrameRecordHandler,
    on_snapshot: SnapshotRecordHandler,
}

impl RecordCore {
    fn error_sink(&self) -> ErrorSink {
        let me = self.me.clone();
        Arc::new(move |reason: String| {
            if let Some(core) = me.upgrade() {
                core.stop_with_error(&reason);
            } else {
                trace!(%reason, "Recording fault reported after decorator teardown");
            }
        })
    }

    /// Force recording off and notify the user. Idempotent on the flag; the
    /// notification is raised regardless so a late-reported fault is never
    /// silent.
    fn stop_with_error(&self, reason: &str) {
        let was_recording = self.is_recording.swap(false, Ordering::AcqRel);
        if was_recording {
            debug!(reason, "Recording stopped due to recording-path fault");
        } else {
            trace!(reason, "Recording fault reported while not recording");
        }
        self.raise_user_notification(&format!("Recording stopped: {reason}"));
    }

    /// Synthesize an informational recording-error notification and deliver
    /// it through the user's callback, if one is installed. The callback is
    /// invoked outside the control lock.
    fn raise_user_notification(&self, message: &str) {
        let notification = Notification::new(
            NotificationSeverity::Info,
            NotificationCategory::RecordingError,
            message,
        );
        let callback = self
            .control
            .lock()
            .expect("record control lock poisoned")
            .user_notifications
            .clone();
        match callback {
            Some(callback) => callback.on_notification(&notification),
            None => warn!(
                description = %notification.description,
                "No notifications callback installed; dropping user notification"
            ),
        }
    }

    /// Record a frame if recording is active and unpaused. Called on the
    /// frame-delivery thread after the live callback has been invoked.
    fn maybe_record_frame(&self, frame: &Frame) {
        if !self.is_recording.load(Ordering::Acquire) {
            return;
        }
        if self.control.lock().expect("record control lock poisoned").paused {
            return;
        }
        let sink = self.error_sink();
        (self.on_frame)(frame.clone(), &sink);
    }

    /// Forward a snapshot to the recording handler with a failure sink.
    fn record_snapshot(&self, kind: ExtensionKind, snapshot: ExtensionSnapshot) {
        trace!(?kind, "Recording extension snapshot");
        let sink = self.error_sink();
        (self.on_snapshot)(kind, snapshot, &sink);
    }

    /// Observe a committed option write. Archived through the snapshot path
    /// under the same gating as frames.
    fn record_option_write(&self, id: OptionId, value: f32) {
        if !self.is_recording.load(Ordering::Acquire) {
            return;
        }
        if self.control.lock().expect("record control lock poisoned").paused {
            return;
        }
        let snapshot = ExtensionSnapshot::capture(
            ExtensionKind::Options,
            serde_json::json!({ "option": id, "value": value }),
        );
        self.record_snapshot(ExtensionKind::Options, snapshot);
    }
}

/// Non-invasive recording decorator around a live sensor.
///
/// Implements [`SensorInterface`] by forwarding every operation to the
/// wrapped sensor; a caller holding the trait object cannot distinguish the
/// decorated sensor from a plain one. While recording is active, arriving
/// frames and captured extension snapshots are additionally copied to the
/// handlers supplied at construction.
///
/// Recording is controlled through
/// [`start_recording`](Self::start_recording) /
/// [`stop_recording`](Self::stop_recording) /
/// [`pause_recording`](Self::pause_recording) /
/// [`resume_recording`](Self::resume_recording); the owning session decides
/// when to flip these.
pub struct RecordSensor {
    live: Arc<dyn SensorInterface>,
    core: Arc<RecordCore>,
    options: RecordableOptionCache,
    /// Stream configuration accepted by the last successful open, in the
    /// platform representation recorded into the session header.
    configured: Mutex<Vec<NativeProfile>>,
    /// The caller's frame callback for the current streaming session.
    frame_callback: Mutex<Option<Arc<dyn FrameCallback>>>,
}

impl RecordSensor {
    /// Decorate `live`, copying frames to `on_frame` and extension
    /// snapshots to `on_snapshot` while recording is active.
    pub fn new<F, S>(live: Arc<dyn SensorInterface>, on_frame: F, on_snapshot: S) -> Self
    where
        F: Fn(Frame, &ErrorSink) + Send + Sync + 'static,
        S: Fn(ExtensionKind, ExtensionSnapshot, &ErrorSink) + Send + Sync + 'static,
    {
        let core = Arc::new_cyclic(|me| RecordCore {
            me: me.clone(),
            is_recording: AtomicBool::new(false),
            control: Mutex::new(ControlState {
                paused: false,
                user_notifications: None,
            }),
            on_frame: Box::new(on_frame),
            on_snapshot: Box::new(on_snapshot),
        });

        let hook_core = Arc::clone(&core);
        let on_write: OptionWriteHook =
            Arc::new(move |id, value| hook_core.record_option_write(id, value));

        Self {
            options: RecordableOptionCache::new(Arc::clone(&live), on_write),
            live,
            core,
            configured: Mutex::new(Vec::new()),
            frame_callback: Mutex::new(None),
        }
    }

    // === Recording control surface ===

    /// Begin copying frames and snapshots to the recording handlers.
    ///
    /// # Errors
    ///
    /// Returns [`TapError::SensorNotOpen`] if no stream configuration has
    /// been accepted; recording may only be active while the sensor is
    /// open.
    pub fn start_recording(&self) -> Result<()> {
        if self
            .configured
            .lock()
            .expect("configuration lock poisoned")
            .is_empty()
        {
            return Err(TapError::SensorNotOpen);
        }
        debug!("Recording started");
        self.core.is_recording.store(true, Ordering::Release);
        Ok(())
    }

    /// Stop copying to the recording handlers. The live stream is
    /// unaffected.
    pub fn stop_recording(&self) {
        debug!("Recording stopped");
        self.core.is_recording.store(false, Ordering::Release);
    }

    /// Pause recording. Advisory: a frame already in flight may still be
    /// recorded.
    pub fn pause_recording(&self) {
        debug!("Recording paused");
        self.core
            .control
            .lock()
            .expect("record control lock poisoned")
            .paused = true;
    }

    /// Resume recording after a pause.
    pub fn resume_recording(&self) {
        debug!("Recording resumed");
        self.core
            .control
            .lock()
            .expect("record control lock poisoned")
            .paused = false;
    }

    /// Whether recording is currently active.
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.core.is_recording.load(Ordering::Acquire)
    }

    /// Whether recording is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.core
            .control
            .lock()
            .expect("record control lock poisoned")
            .paused
    }

    /// Force recording off because of a recording-path fault and raise one
    /// user notification carrying `reason`. Idempotent aside from the
    /// notification.
    pub fn stop_with_error(&self, reason: &str) {
        self.core.stop_with_error(reason);
    }

    /// Forward a recordable point-in-time capture of an extension's state
    /// to the snapshot handler, together with a failure sink.
    pub fn record_snapshot(&self, kind: ExtensionKind, snapshot: ExtensionSnapshot) {
        self.core.record_snapshot(kind, snapshot);
    }

    /// The stream configuration accepted by the last successful open, for
    /// inclusion in a recorded session header.
    #[must_use]
    pub fn current_configuration(&self) -> Vec<NativeProfile> {
        self.configured
            .lock()
            .expect("configuration lock poisoned")
            .clone()
    }
}

impl SensorInterface for RecordSensor {
    fn stream_profiles(&self) -> Vec<StreamProfile> {
        // Pure pass-through; ordering is replayed verbatim from an archive,
        // so it must match the live sensor's exactly.
        self.live.stream_profiles()
    }

    fn open(&self, requests: &[StreamProfile]) -> Result<()> {
        let native: Vec<NativeProfile> = requests.iter().map(NativeProfile::from).collect();
        self.live.open(requests)?;
        // Retain the accepted configuration only once the live open
        // succeeded; a failed open leaves no recording state behind.
        debug!(streams = native.len(), "Sensor opened; configuration retained");
        *self
            .configured
            .lock()
            .expect("configuration lock poisoned") = native;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.live.close()?;
        // Recording may only be active while open.
        self.core.is_recording.store(false, Ordering::Release);
        self.configured
            .lock()
            .expect("configuration lock poisoned")
            .clear();
        Ok(())
    }

    fn get_option(&self, id: OptionId) -> Result<Arc<dyn SensorOption>> {
        let wrapper = self.options.get_option(id)?;
        Ok(wrapper as Arc<dyn SensorOption>)
    }

    fn supports_option(&self, id: OptionId) -> bool {
        self.live.supports_option(id)
    }

    fn get_info(&self, id: InfoId) -> Result<String> {
        self.live.get_info(id)
    }

    fn supports_info(&self, id: InfoId) -> bool {
        self.live.supports_info(id)
    }

    fn register_notifications_callback(
        &self,
        callback: Arc<dyn NotificationCallback>,
    ) -> Result<()> {
        let forward = Arc::clone(&callback);
        self.live
            .register_notifications_callback(Arc::new(NotificationCallbackAdapter::new(
                move |notification| forward.on_notification(notification),
            )))?;
        // Retained so recording faults can reach the user through the same
        // channel as live sensor notifications.
        self.core
            .control
            .lock()
            .expect("record control lock poisoned")
            .user_notifications = Some(callback);
        Ok(())
    }

    fn start(&self, callback: Arc<dyn FrameCallback>) -> Result<()> {
        let core = Arc::clone(&self.core);
        let user = Arc::clone(&callback);
        // The live callback always fires first; the record path runs after
        // it and reports its own failures through the error sink, never
        // into the live caller.
        let adapter = FrameCallbackAdapter::new(move |frame: Frame| {
            user.on_frame(frame.clone());
            core.maybe_record_frame(&frame);
        });
        self.live.start(Arc::new(adapter))?;
        *self
            .frame_callback
            .lock()
            .expect("frame callback lock poisoned") = Some(callback);
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        // Pass-through only: stopping the stream does not stop recording,
        // whose lifecycle belongs to the owning session.
        self.live.stop()?;
        *self
            .frame_callback
            .lock()
            .expect("frame callback lock poisoned") = None;
        Ok(())
    }

    fn is_streaming(&self) -> bool {
        self.live.is_streaming()
    }

    fn extend_to(&self, kind: ExtensionKind) -> Result<Arc<dyn Extension>> {
        self.live.extend_to(kind)
    }

    fn device(&self) -> DeviceDescriptor {
        self.live.device()
    }
}

impl Drop for RecordSensor {
    fn drop(&mut self) {
        // Streaming must have stopped before the decorator goes away.
        if self.live.is_streaming() {
            if let Err(e) = self.live.stop() {
                warn!(error = %e, "Failed to stop streaming while dropping record sensor");
            }
        }
    }
}
