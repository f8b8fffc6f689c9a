//! Error types for sensor tap operations.

use thiserror::Error;

use crate::sensor::types::{InfoId, OptionId};

/// Primary error type for sensor tap operations.
#[derive(Error, Debug)]
pub enum TapError {
    // Capability errors
    #[error("Option not supported by this sensor: {id:?}")]
    UnsupportedOption { id: OptionId },

    #[error("Info field not supported by this sensor: {id:?}")]
    UnsupportedInfo { id: InfoId },

    #[error("Extension not supported by this sensor: {kind}")]
    UnsupportedExtension { kind: String },

    // Lifecycle errors
    #[error("Sensor is not open: no stream configuration has been accepted")]
    SensorNotOpen,

    #[error("Sensor is already streaming")]
    AlreadyStreaming,

    #[error("Sensor is not streaming")]
    NotStreaming,

    #[error("Invalid stream request: {reason}")]
    InvalidStreamRequest { reason: String },

    #[error("Option {id:?} is read-only")]
    ReadOnlyOption { id: OptionId },

    #[error("Option {id:?} value {value} outside range {min}..={max}")]
    OptionOutOfRange {
        id: OptionId,
        value: f32,
        min: f32,
        max: f32,
    },

    // Transport errors
    #[error("Sensor communication error: {0}")]
    SensorCommunication(String),

    // Recording-path errors (never surfaced on the live path)
    #[error("Recording error: {0}")]
    Recording(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl TapError {
    /// Returns true if the error is recoverable by the user.
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedOption { .. }
                | Self::UnsupportedInfo { .. }
                | Self::UnsupportedExtension { .. }
                | Self::SensorNotOpen
                | Self::InvalidStreamRequest { .. }
                | Self::OptionOutOfRange { .. }
        )
    }

    /// Returns a suggestion for how to fix the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::UnsupportedOption { .. } => {
                Some("Check supports_option() before requesting an option")
            }
            Self::SensorNotOpen => Some("Call open() with a stream configuration first"),
            Self::AlreadyStreaming => Some("Call stop() before starting again"),
            Self::OptionOutOfRange { .. } => Some("Query the option range and clamp the value"),
            _ => None,
        }
    }
}

/// Convenience type alias for Results using TapError.
pub type Result<T> = std::result::Result<T, TapError>;

/// Extension trait for adding context to errors.
pub trait ResultExt<T> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| TapError::Other(format!("{}: {e}", f().into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_recoverable_classification() {
        assert!(
            TapError::UnsupportedOption {
                id: OptionId::Exposure
            }
            .is_user_recoverable()
        );
        assert!(TapError::SensorNotOpen.is_user_recoverable());
        assert!(!TapError::SensorCommunication("usb reset".into()).is_user_recoverable());
        assert!(!TapError::Recording("disk full".into()).is_user_recoverable());
    }

    #[test]
    fn test_suggestions() {
        assert!(TapError::SensorNotOpen.suggestion().is_some());
        assert!(
            TapError::Recording("disk full".into())
                .suggestion()
                .is_none()
        );
    }

    #[test]
    fn test_with_context() {
        let err: std::result::Result<(), std::io::Error> = Err(std::io::Error::other("boom"));
        let out = err.with_context(|| "opening sensor").unwrap_err();
        assert!(out.to_string().contains("opening sensor"));
        assert!(out.to_string().contains("boom"));
    }
}
