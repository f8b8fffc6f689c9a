//! Mock sensor implementation for unit testing.
//!
//! This module provides a mock live sensor that records all control
//! operations, supports error injection, and lets tests drive the frame and
//! notification channels as if a hardware thread were delivering them.
//!
//! # Example
//!
//! ```rust,ignore
//! use sensor_tap::sensor::mock::{MockSensor, Operation};
//! use sensor_tap::sensor::SensorInterface;
//!
//! let mock = MockSensor::depth();
//! let profiles = mock.stream_profiles();
//! mock.open(&profiles[..1]).unwrap();
//!
//! mock.assert_operations(&[
//!     Operation::StreamProfiles,
//!     Operation::Open { profiles: 1 },
//! ]);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, trace};

use super::SensorInterface;
use super::types::{
    DeviceDescriptor, Extension, ExtensionKind, ExtensionSnapshot, Frame, InfoId, Notification,
    OptionId, OptionRange, StreamFormat, StreamKind, StreamProfile,
};
use crate::callback::{FrameCallback, NotificationCallback};
use crate::error::{Result, TapError};
use crate::options::SensorOption;

/// Recorded operation for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    StreamProfiles,
    Open { profiles: usize },
    Close,
    GetOption { id: OptionId },
    SupportsOption { id: OptionId },
    GetInfo { id: InfoId },
    SupportsInfo { id: InfoId },
    RegisterNotifications,
    Start,
    Stop,
    ExtendTo { kind: ExtensionKind },
}

/// In-memory option backing a [`MockSensor`].
pub struct MockOption {
    id: OptionId,
    value: Mutex<f32>,
    range: OptionRange,
    read_only: bool,
    description: String,
}

impl MockOption {
    /// Create an option with the given range, initialized to its default.
    #[must_use]
    pub fn new(id: OptionId, range: OptionRange) -> Self {
        Self {
            id,
            value: Mutex::new(range.default),
            range,
            read_only: false,
            description: format!("{id:?}"),
        }
    }

    /// Mark the option read-only.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

impl SensorOption for MockOption {
    fn get(&self) -> Result<f32> {
        Ok(*self.value.lock().unwrap())
    }

    fn set(&self, value: f32) -> Result<()> {
        if self.read_only {
            return Err(TapError::ReadOnlyOption { id: self.id });
        }
        if value < self.range.min || value > self.range.max {
            return Err(TapError::OptionOutOfRange {
                id: self.id,
                value,
                min: self.range.min,
                max: self.range.max,
            });
        }
        *self.value.lock().unwrap() = value;
        Ok(())
    }

    fn range(&self) -> OptionRange {
        self.range
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Fixed-state extension backing a [`MockSensor`].
pub struct MockExtension {
    kind: ExtensionKind,
    state: Mutex<serde_json::Value>,
}

impl MockExtension {
    /// Create an extension of `kind` holding `state`.
    #[must_use]
    pub fn new(kind: ExtensionKind, state: serde_json::Value) -> Self {
        Self {
            kind,
            state: Mutex::new(state),
        }
    }
}

impl Extension for MockExtension {
    fn kind(&self) -> ExtensionKind {
        self.kind
    }

    fn snapshot(&self) -> Result<ExtensionSnapshot> {
        Ok(ExtensionSnapshot::capture(
            self.kind,
            self.state.lock().unwrap().clone(),
        ))
    }
}

/// Mock sensor for testing without real hardware.
///
/// Records all control operations for later assertion, supports error
/// injection, and exposes [`emit_frame`](Self::emit_frame) /
/// [`emit_notification`](Self::emit_notification) so tests can stand in for
/// the hardware delivery thread.
pub struct MockSensor {
    profiles: Vec<StreamProfile>,
    options: HashMap<OptionId, Arc<MockOption>>,
    infos: HashMap<InfoId, String>,
    extensions: HashMap<ExtensionKind, Arc<dyn Extension>>,
    device: DeviceDescriptor,
    is_open: AtomicBool,
    streaming: AtomicBool,
    opened_with: Mutex<Vec<StreamProfile>>,
    frame_callback: Mutex<Option<Arc<dyn FrameCallback>>>,
    notification_callback: Mutex<Option<Arc<dyn NotificationCallback>>>,
    operation_log: Mutex<Vec<Operation>>,
    error_injection: Mutex<Option<TapError>>,
}

impl MockSensor {
    /// Create an empty mock sensor with no profiles, options, or infos.
    #[must_use]
    pub fn new() -> Self {
        Self {
            profiles: Vec::new(),
            options: HashMap::new(),
            infos: HashMap::new(),
            extensions: HashMap::new(),
            device: DeviceDescriptor {
                name: "Mock Acquisition Device".to_string(),
                serial: "MOCK-0001".to_string(),
                firmware_version: "1.0.0-mock".to_string(),
                sensor_count: 1,
            },
            is_open: AtomicBool::new(false),
            streaming: AtomicBool::new(false),
            opened_with: Mutex::new(Vec::new()),
            frame_callback: Mutex::new(None),
            notification_callback: Mutex::new(None),
            operation_log: Mutex::new(Vec::new()),
            error_injection: Mutex::new(None),
        }
    }

    /// Create a depth-like mock sensor (most common for testing): two depth
    /// profiles, exposure/gain/laser-power options, standard info fields,
    /// and a depth extension.
    #[must_use]
    pub fn depth() -> Self {
        debug!("Creating mock depth sensor");
        Self::new()
            .with_profile(StreamProfile {
                stream: StreamKind::Depth,
                format: StreamFormat::Z16,
                index: 0,
                width: 640,
                height: 480,
                fps: 30,
            })
            .with_profile(StreamProfile {
                stream: StreamKind::Depth,
                format: StreamFormat::Z16,
                index: 0,
                width: 320,
                height: 240,
                fps: 60,
            })
            .with_option(MockOption::new(
                OptionId::Exposure,
                OptionRange {
                    min: 1.0,
                    max: 10_000.0,
                    step: 1.0,
                    default: 100.0,
                },
            ))
            .with_option(MockOption::new(
                OptionId::Gain,
                OptionRange {
                    min: 0.0,
                    max: 128.0,
                    step: 1.0,
                    default: 64.0,
                },
            ))
            .with_option(MockOption::new(
                OptionId::LaserPower,
                OptionRange {
                    min: 0.0,
                    max: 360.0,
                    step: 30.0,
                    default: 150.0,
                },
            ))
            .with_info(InfoId::Name, "Mock Depth Sensor")
            .with_info(InfoId::SerialNumber, "MOCK-0001")
            .with_info(InfoId::FirmwareVersion, "1.0.0-mock")
            .with_extension(MockExtension::new(
                ExtensionKind::DepthSensor,
                serde_json::json!({ "depth_units": 0.001, "stereo_baseline_mm": 50.0 }),
            ))
    }

    /// Add a stream profile.
    #[must_use]
    pub fn with_profile(mut self, profile: StreamProfile) -> Self {
        self.profiles.push(profile);
        self
    }

    /// Add an option.
    #[must_use]
    pub fn with_option(mut self, option: MockOption) -> Self {
        self.options.insert(option.id, Arc::new(option));
        self
    }

    /// Add an info field.
    #[must_use]
    pub fn with_info(mut self, id: InfoId, value: impl Into<String>) -> Self {
        self.infos.insert(id, value.into());
        self
    }

    /// Add an extension.
    #[must_use]
    pub fn with_extension(mut self, extension: MockExtension) -> Self {
        self.extensions.insert(extension.kind, Arc::new(extension));
        self
    }

    // === Error Injection ===

    /// Inject an error for the next failable operation.
    pub fn inject_error(&self, error: TapError) {
        *self.error_injection.lock().unwrap() = Some(error);
    }

    /// Clear any injected error.
    pub fn clear_error(&self) {
        *self.error_injection.lock().unwrap() = None;
    }

    // === Delivery Simulation ===

    /// Deliver a frame through the registered frame callback, as the
    /// hardware delivery thread would. Silently drops the frame when the
    /// sensor is not streaming, matching real hardware behavior around a
    /// stop edge.
    pub fn emit_frame(&self, frame: Frame) {
        if !self.streaming.load(Ordering::SeqCst) {
            trace!("Dropping emitted frame: sensor not streaming");
            return;
        }
        let callback = self.frame_callback.lock().unwrap().clone();
        if let Some(callback) = callback {
            callback.on_frame(frame);
        }
    }

    /// Deliver a notification through the registered notifications callback.
    pub fn emit_notification(&self, notification: &Notification) {
        let callback = self.notification_callback.lock().unwrap().clone();
        if let Some(callback) = callback {
            callback.on_notification(notification);
        }
    }

    /// The stream configuration accepted by the last successful `open`.
    #[must_use]
    pub fn opened_with(&self) -> Vec<StreamProfile> {
        self.opened_with.lock().unwrap().clone()
    }

    /// Whether a frame callback is currently registered.
    #[must_use]
    pub fn has_frame_callback(&self) -> bool {
        self.frame_callback.lock().unwrap().is_some()
    }

    // === Assertions ===

    /// Get all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        self.operation_log.lock().unwrap().clone()
    }

    /// Get the number of operations performed.
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.operation_log.lock().unwrap().len()
    }

    /// Assert specific operations were performed.
    ///
    /// # Panics
    ///
    /// Panics if the operations don't match.
    pub fn assert_operations(&self, expected: &[Operation]) {
        let actual = self.operations();
        assert_eq!(
            actual, expected,
            "Operation mismatch.\nExpected: {expected:#?}\nActual: {actual:#?}",
        );
    }

    /// Assert a specific operation was performed at least once.
    ///
    /// # Panics
    ///
    /// Panics if the operation was not found.
    pub fn assert_contains(&self, expected: &Operation) {
        let ops = self.operations();
        assert!(
            ops.contains(expected),
            "Expected operation {expected:?} not found in: {ops:#?}",
        );
    }

    /// Clear the operation log for fresh assertions.
    pub fn clear_operations(&self) {
        self.operation_log.lock().unwrap().clear();
    }

    // === Internal Helpers ===

    fn record_op(&self, op: Operation) {
        trace!(?op, "Recording operation");
        self.operation_log.lock().unwrap().push(op);
    }

    fn check_error(&self) -> Result<()> {
        if let Some(error) = self.error_injection.lock().unwrap().take() {
            return Err(error);
        }
        Ok(())
    }
}

impl Default for MockSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorInterface for MockSensor {
    fn stream_profiles(&self) -> Vec<StreamProfile> {
        self.record_op(Operation::StreamProfiles);
        self.profiles.clone()
    }

    fn open(&self, requests: &[StreamProfile]) -> Result<()> {
        self.record_op(Operation::Open {
            profiles: requests.len(),
        });
        self.check_error()?;

        if requests.is_empty() {
            return Err(TapError::InvalidStreamRequest {
                reason: "empty stream request".to_string(),
            });
        }
        for request in requests {
            if !self.profiles.contains(request) {
                return Err(TapError::InvalidStreamRequest {
                    reason: format!("unsupported profile: {request:?}"),
                });
            }
        }

        self.is_open.store(true, Ordering::SeqCst);
        *self.opened_with.lock().unwrap() = requests.to_vec();
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.record_op(Operation::Close);
        self.check_error()?;

        if self.streaming.load(Ordering::SeqCst) {
            return Err(TapError::AlreadyStreaming);
        }
        self.is_open.store(false, Ordering::SeqCst);
        self.opened_with.lock().unwrap().clear();
        Ok(())
    }

    fn get_option(&self, id: OptionId) -> Result<Arc<dyn SensorOption>> {
        self.record_op(Operation::GetOption { id });
        self.check_error()?;

        self.options
            .get(&id)
            .map(|option| Arc::clone(option) as Arc<dyn SensorOption>)
            .ok_or(TapError::UnsupportedOption { id })
    }

    fn supports_option(&self, id: OptionId) -> bool {
        self.record_op(Operation::SupportsOption { id });
        self.options.contains_key(&id)
    }

    fn get_info(&self, id: InfoId) -> Result<String> {
        self.record_op(Operation::GetInfo { id });
        self.infos
            .get(&id)
            .cloned()
            .ok_or(TapError::UnsupportedInfo { id })
    }

    fn supports_info(&self, id: InfoId) -> bool {
        self.record_op(Operation::SupportsInfo { id });
        self.infos.contains_key(&id)
    }

    fn register_notifications_callback(
        &self,
        callback: Arc<dyn NotificationCallback>,
    ) -> Result<()> {
        self.record_op(Operation::RegisterNotifications);
        self.check_error()?;
        *self.notification_callback.lock().unwrap() = Some(callback);
        Ok(())
    }

    fn start(&self, callback: Arc<dyn FrameCallback>) -> Result<()> {
        self.record_op(Operation::Start);
        self.check_error()?;

        if !self.is_open.load(Ordering::SeqCst) {
            return Err(TapError::SensorNotOpen);
        }
        if self.streaming.swap(true, Ordering::SeqCst) {
            return Err(TapError::AlreadyStreaming);
        }
        *self.frame_callback.lock().unwrap() = Some(callback);
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        self.record_op(Operation::Stop);
        self.check_error()?;

        if !self.streaming.swap(false, Ordering::SeqCst) {
            return Err(TapError::NotStreaming);
        }
        // Dropping the registration releases the callback object.
        *self.frame_callback.lock().unwrap() = None;
        Ok(())
    }

    fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::SeqCst)
    }

    fn extend_to(&self, kind: ExtensionKind) -> Result<Arc<dyn Extension>> {
        self.record_op(Operation::ExtendTo { kind });
        self.extensions
            .get(&kind)
            .map(Arc::clone)
            .ok_or_else(|| TapError::UnsupportedExtension {
                kind: format!("{kind:?}"),
            })
    }

    fn device(&self) -> DeviceDescriptor {
        self.device.clone()
    }
}
