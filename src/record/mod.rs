//! Recording decorator over a live sensor.
//!
//! [`RecordSensor`] presents the exact capability surface of the sensor it
//! wraps while copying frames and extension-state snapshots to externally
//! supplied recording handlers. The record path is failure-isolated: a
//! fault while recording stops recording and raises a user notification,
//! and is never observable on the live stream.

mod sensor;

pub use sensor::{ErrorSink, FrameRecordHandler, RecordSensor, SnapshotRecordHandler};
