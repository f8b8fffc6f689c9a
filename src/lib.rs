//! sensor_tap - Transparent recording decorator for acquisition sensors.
//!
//! Wrap any live sensor implementing [`sensor::SensorInterface`] in a
//! [`record::RecordSensor`] and the consumer sees the identical capability
//! surface, while every frame and extension-state snapshot is additionally
//! copied to externally supplied recording handlers. A failure on the
//! recording side stops recording and raises a user notification; it never
//! degrades the live stream.
//!
//! # Modules
//!
//! - `sensor`: Capability contract for live sensors, data model, mock sensor
//! - `record`: The recording decorator itself
//! - `callback`: Adapters bridging functional handlers to callback objects
//! - `options`: Recording-aware option proxies and their cache
//! - `error`: Error types with user-recoverable hints
#![forbid(unsafe_code)]

pub mod callback;
pub mod error;
pub mod logging;
pub mod options;
pub mod record;
pub mod sensor;
