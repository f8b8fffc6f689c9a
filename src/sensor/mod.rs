//! Sensor abstraction layer.
//!
//! This module defines the capability contract any live sensor implements,
//! the associated data model, and a mock sensor for testing without
//! hardware.

pub mod mock;
pub mod types;

pub use types::{
    DeviceDescriptor, Extension, ExtensionKind, ExtensionSnapshot, Frame, InfoId, NativeProfile,
    Notification, NotificationCategory, NotificationSeverity, OptionId, OptionRange, StreamFormat,
    StreamKind, StreamProfile,
};

use std::sync::Arc;

use crate::callback::{FrameCallback, NotificationCallback};
use crate::error::Result;
use crate::options::SensorOption;

/// The full capability contract of a live sensor.
///
/// This trait abstracts over concrete acquisition hardware and mock
/// implementations, and it is the surface the recording decorator both
/// consumes and re-exposes: a caller holding a `dyn SensorInterface` cannot
/// tell a decorated sensor from a plain one.
///
/// # Implementation Notes
///
/// - Frames are delivered on a thread owned by the sensor; control
///   operations may arrive on arbitrary caller threads.
/// - `stop()` must return only once no further frame callbacks will fire
///   with the previously registered callback, after which the callback
///   object may be dropped safely.
/// - Callback registration transfers ownership of the callback object to
///   the sensor for the duration of the registration.
pub trait SensorInterface: Send + Sync {
    /// Enumerate the stream profiles this sensor can produce.
    ///
    /// Ordering is part of the contract: callers (including the recording
    /// pipeline) rely on it being stable.
    fn stream_profiles(&self) -> Vec<StreamProfile>;

    /// Open the sensor with the requested stream configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a request is unsatisfiable or the sensor cannot
    /// be configured.
    fn open(&self, requests: &[StreamProfile]) -> Result<()>;

    /// Close the sensor, releasing the stream configuration.
    ///
    /// # Errors
    ///
    /// Returns an error on a communication failure.
    fn close(&self) -> Result<()>;

    /// Get a handle to the option identified by `id`.
    ///
    /// # Errors
    ///
    /// Returns [`TapError::UnsupportedOption`](crate::error::TapError) if
    /// the sensor does not expose `id`.
    fn get_option(&self, id: OptionId) -> Result<Arc<dyn SensorOption>>;

    /// Check whether the sensor exposes the option `id`.
    fn supports_option(&self, id: OptionId) -> bool;

    /// Get the static info field identified by `id`.
    ///
    /// # Errors
    ///
    /// Returns [`TapError::UnsupportedInfo`](crate::error::TapError) if the
    /// sensor does not carry `id`.
    fn get_info(&self, id: InfoId) -> Result<String>;

    /// Check whether the sensor carries the info field `id`.
    fn supports_info(&self, id: InfoId) -> bool;

    /// Install the notifications callback, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error on a communication failure.
    fn register_notifications_callback(
        &self,
        callback: Arc<dyn NotificationCallback>,
    ) -> Result<()>;

    /// Start streaming, delivering frames to `callback`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor is not open or already streaming.
    fn start(&self, callback: Arc<dyn FrameCallback>) -> Result<()>;

    /// Stop streaming.
    ///
    /// Synchronous: on return the sensor guarantees no further invocations
    /// of the callback passed to [`start`](Self::start).
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor is not streaming.
    fn stop(&self) -> Result<()>;

    /// Whether the sensor is currently streaming.
    fn is_streaming(&self) -> bool;

    /// Resolve a differently-typed view of this sensor.
    ///
    /// # Errors
    ///
    /// Returns [`TapError::UnsupportedExtension`](crate::error::TapError)
    /// if the sensor does not implement `kind`.
    fn extend_to(&self, kind: ExtensionKind) -> Result<Arc<dyn Extension>>;

    /// Look up the device that owns this sensor.
    fn device(&self) -> DeviceDescriptor;
}

/// Type alias for a shared sensor handle.
pub type SharedSensor = Arc<dyn SensorInterface>;
