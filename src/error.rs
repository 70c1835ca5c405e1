//! Error types for the force sensor and the stand configuration.

use core::fmt;

/// Failures while talking to, or interpreting, the load cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The ADC did not become ready within the timeout, or a pin failed.
    HardwareUnavailable,
    /// The calibration factor is zero or not finite.
    InvalidCalibration,
    /// No initialized sensor has been installed.
    NotInitialized,
    /// The shared sensor is being read by another caller.
    Busy,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HardwareUnavailable => write!(f, "load cell ADC unavailable"),
            Self::InvalidCalibration => write!(f, "invalid calibration factor"),
            Self::NotInitialized => write!(f, "force sensor not initialized"),
            Self::Busy => write!(f, "force sensor busy"),
        }
    }
}

/// Rejected stand configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The calibration factor is zero or not finite.
    InvalidCalibration,
    /// Tare or per-reading sample count is zero.
    InvalidSampleCount,
    /// The ADC ready timeout is zero.
    InvalidTimeout,
    /// The same GPIO is assigned to more than one function.
    PinConflict(u8),
    /// A file path does not fit the bounded path buffer.
    PathTooLong,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCalibration => write!(f, "calibration factor must be finite and non-zero"),
            Self::InvalidSampleCount => write!(f, "sample counts must be at least one"),
            Self::InvalidTimeout => write!(f, "ADC ready timeout must be positive"),
            Self::PinConflict(pin) => write!(f, "GPIO {pin} assigned more than once"),
            Self::PathTooLong => write!(f, "file path too long"),
        }
    }
}

