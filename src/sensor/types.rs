//! Data model for sensor streams, options, notifications, and extensions.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Information about the device that owns a sensor.
///
/// The decorator only references the owning device; it never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceDescriptor {
    /// Human-readable product name
    pub name: String,
    /// Device serial number
    pub serial: String,
    /// Firmware version string
    pub firmware_version: String,
    /// Number of sensors the device aggregates
    pub sensor_count: usize,
}

/// The kind of data a stream carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StreamKind {
    /// Depth imagery
    Depth,
    /// Color imagery
    Color,
    /// Infrared imagery
    Infrared,
    /// Inertial samples (gyro)
    Gyro,
    /// Inertial samples (accelerometer)
    Accel,
}

/// Pixel/sample format of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StreamFormat {
    /// 16-bit depth values
    Z16,
    /// 8-bit grayscale
    Y8,
    /// Packed YUV 4:2:2
    Yuyv,
    /// 24-bit RGB
    Rgb8,
    /// Raw motion vector (3x f32)
    MotionXyz32F,
}

impl StreamFormat {
    /// Wire-format code as carried in archive headers.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::Z16 => 1,
            Self::Y8 => 2,
            Self::Yuyv => 3,
            Self::Rgb8 => 4,
            Self::MotionXyz32F => 5,
        }
    }
}

/// A stream profile as exposed by a sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamProfile {
    /// What the stream carries
    pub stream: StreamKind,
    /// Sample format
    pub format: StreamFormat,
    /// Stream index, for sensors exposing several streams of one kind
    pub index: u8,
    /// Width in pixels (0 for non-imaging streams)
    pub width: u32,
    /// Height in pixels (0 for non-imaging streams)
    pub height: u32,
    /// Frames per second
    pub fps: u32,
}

/// Platform-level stream configuration, the subset of a [`StreamProfile`]
/// the transport layer understands. Retained by the decorator as the
/// accepted configuration after a successful open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NativeProfile {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Format code, see [`StreamFormat::code`]
    pub format: u32,
}

impl From<&StreamProfile> for NativeProfile {
    fn from(profile: &StreamProfile) -> Self {
        Self {
            width: profile.width,
            height: profile.height,
            fps: profile.fps,
            format: profile.format.code(),
        }
    }
}

/// Sensor options addressable through the option interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OptionId {
    /// Exposure time
    Exposure,
    /// Sensor gain
    Gain,
    /// Laser emitter power
    LaserPower,
    /// Automatic exposure toggle
    EnableAutoExposure,
    /// White balance temperature
    WhiteBalance,
    /// Frames-queue depth inside the driver
    FramesQueueSize,
}

/// Inclusive value range and stepping of an option.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OptionRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
    pub default: f32,
}

/// Static sensor information fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum InfoId {
    /// Sensor display name
    Name,
    /// Serial number of the owning device
    SerialNumber,
    /// Firmware version
    FirmwareVersion,
    /// Physical port the sensor is attached to
    PhysicalPort,
}

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum NotificationSeverity {
    Debug,
    Info,
    Warn,
    Error,
}

/// Category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotificationCategory {
    /// Frames stopped arriving
    FramesTimeout,
    /// A frame was dropped or corrupted
    FrameCorrupted,
    /// Hardware reported an error
    HardwareError,
    /// A fault on the recording side-channel
    RecordingError,
    /// Anything else
    UnknownError,
}

/// A notification delivered through the notifications callback.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub severity: NotificationSeverity,
    pub category: NotificationCategory,
    /// Human-readable description
    pub description: String,
    /// When the notification was raised
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// Create a notification stamped with the current time.
    #[must_use]
    pub fn new(
        severity: NotificationSeverity,
        category: NotificationCategory,
        description: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            description: description.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Extension kinds a sensor or device may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ExtensionKind {
    /// Depth-specific controls (units, scale)
    DepthSensor,
    /// Auto-exposure region of interest
    Roi,
    /// Calibration tables
    Calibration,
    /// The option set itself, snapshotted on option writes
    Options,
}

/// An immutable point-in-time capture of an extension's state.
///
/// Produced on demand by [`Extension::snapshot`] and consumed once by the
/// recording sink; the state payload is an opaque JSON document so the
/// archive layer can persist it without knowing the extension.
#[derive(Debug, Clone, Serialize)]
pub struct ExtensionSnapshot {
    pub kind: ExtensionKind,
    /// Capture instant
    pub taken_at: DateTime<Utc>,
    /// Extension state at the capture instant
    pub state: serde_json::Value,
}

impl ExtensionSnapshot {
    /// Capture a snapshot of `state` now.
    #[must_use]
    pub fn capture(kind: ExtensionKind, state: serde_json::Value) -> Self {
        Self {
            kind,
            taken_at: Utc::now(),
            state,
        }
    }
}

/// A differently-typed view of a sensor, resolved through
/// [`SensorInterface::extend_to`](super::SensorInterface::extend_to).
pub trait Extension: Send + Sync {
    /// The kind of this extension.
    fn kind(&self) -> ExtensionKind;

    /// Capture the extension's current state.
    fn snapshot(&self) -> crate::error::Result<ExtensionSnapshot>;
}

/// Payload of a single capture unit.
#[derive(Debug)]
struct FrameData {
    profile: StreamProfile,
    number: u64,
    timestamp_ms: f64,
    payload: Vec<u8>,
}

/// An opaque, reference-counted capture unit.
///
/// Cloning a frame bumps a reference count; the pixel payload is shared.
/// This is what lets the decorator hand the same frame to the live callback
/// and to the recording sink without copying sample data.
#[derive(Debug, Clone)]
pub struct Frame {
    inner: Arc<FrameData>,
}

impl Frame {
    /// Create a frame for `profile` with the given sequence number,
    /// capture timestamp (milliseconds), and payload.
    #[must_use]
    pub fn new(profile: StreamProfile, number: u64, timestamp_ms: f64, payload: Vec<u8>) -> Self {
        Self {
            inner: Arc::new(FrameData {
                profile,
                number,
                timestamp_ms,
                payload,
            }),
        }
    }

    /// The profile this frame was captured under.
    #[must_use]
    pub fn profile(&self) -> &StreamProfile {
        &self.inner.profile
    }

    /// Monotonic per-stream sequence number.
    #[must_use]
    pub fn number(&self) -> u64 {
        self.inner.number
    }

    /// Capture timestamp in milliseconds.
    #[must_use]
    pub fn timestamp_ms(&self) -> f64 {
        self.inner.timestamp_ms
    }

    /// Raw sample payload.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.inner.payload
    }

    /// Number of live references to this frame's payload.
    #[must_use]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}
