//! Crate-level error types.

use std::fmt;

use crate::device::DeviceError;

/// Errors produced by the haptic bridge.
#[derive(Debug)]
pub enum BridgeError {
    /// The device driver or scheduler reported an error.
    Device(DeviceError),
    /// `init` was called while the servo loop is already running.
    AlreadyRunning,
    /// The coordinate scale factor must be finite and positive.
    InvalidScale(f64),
    /// An atom record was rejected at the entry point.
    InvalidAtom(String),
    /// A gradient update was rejected at the entry point.
    InvalidGradient(String),
    /// A transform pair was rejected at the entry point.
    InvalidTransform(String),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device(e) => write!(f, "device error: {e}"),
            Self::AlreadyRunning => {
                write!(f, "haptic servo loop is already running")
            }
            Self::InvalidScale(scale) => {
                write!(f, "scale factor must be finite and positive, got {scale}")
            }
            Self::InvalidAtom(msg) => write!(f, "invalid atom: {msg}"),
            Self::InvalidGradient(msg) => {
                write!(f, "invalid gradient: {msg}")
            }
            Self::InvalidTransform(msg) => {
                write!(f, "invalid transform: {msg}")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
        }
    }
}

impl std::error::Error for BridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Device(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DeviceError> for BridgeError {
    fn from(e: DeviceError) -> Self {
        Self::Device(e)
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
