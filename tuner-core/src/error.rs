//! # Error Types
//!
//! Errors raised by the tuning engine. Precondition violations are rejected
//! before any sampling or transform work begins; an acquisition stall is a
//! recoverable error surfaced to the controller.
//!
//! "No pitch detected" is deliberately *not* an error. It is a normal outcome
//! represented by [`crate::analysis::AnalysisOutcome::NoPitch`].

use thiserror::Error;

/// Main error type for the tuning engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TunerError {
    /// Buffer length is zero or not a power of two, or the real and
    /// imaginary halves differ in length.
    #[error("Invalid buffer length: {0}")]
    InvalidLength(String),

    /// Search band bounds are not finite, out of order, or above Nyquist.
    #[error("Invalid frequency band: {lo_hz} Hz to {hi_hz} Hz")]
    InvalidBand { lo_hz: f32, hi_hz: f32 },

    /// A configuration value is out of range.
    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    /// The sample source did not deliver a full block in time.
    #[error("Acquisition timed out after {collected} of {required} samples")]
    AcquisitionTimeout { collected: usize, required: usize },

    /// The event source has been closed and will deliver no more events.
    #[error("Event source closed")]
    EventSourceClosed,

    /// Config file I/O or (de)serialization failure.
    #[error("Config file error: {0}")]
    ConfigFile(String),
}

/// Convenience alias used throughout the engine.
pub type Result<T> = std::result::Result<T, TunerError>;

impl From<std::io::Error> for TunerError {
    fn from(err: std::io::Error) -> Self {
        TunerError::ConfigFile(err.to_string())
    }
}

impl From<serde_json::Error> for TunerError {
    fn from(err: serde_json::Error) -> Self {
        TunerError::ConfigFile(err.to_string())
    }
}
