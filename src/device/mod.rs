//! Boundary with the vendor device SDK.
//!
//! [`HapticDriver`] covers sampling and force output, [`ServoScheduler`]
//! covers the vendor's servo-rate callback scheduling. A real SDK binding
//! implements both; [`sim`] provides software stand-ins and
//! [`ThreadScheduler`] serves drivers that have no scheduler of their own.

pub mod sim;
mod thread_scheduler;

use std::fmt;

use glam::DVec3;
pub use thread_scheduler::ThreadScheduler;

use crate::input::ButtonMask;

/// Broad classification of driver errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceErrorKind {
    /// No device could be opened.
    NotFound,
    /// The servo scheduler could not be started.
    Scheduler,
    /// A one-off communication hiccup; the next tick may succeed.
    Transient,
    /// The hardware is in a state the loop must not continue from
    /// (overheating, lost calibration, disconnected).
    Fault,
}

impl fmt::Display for DeviceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotFound => "device not found",
            Self::Scheduler => "scheduler failure",
            Self::Transient => "transient error",
            Self::Fault => "device fault",
        };
        f.write_str(name)
    }
}

/// Error reported by a [`HapticDriver`] or [`ServoScheduler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceError {
    /// Classification used by the servo loop's fault policy.
    pub kind: DeviceErrorKind,
    /// Driver-specific error code (0 if none).
    pub code: i32,
    /// Human-readable detail.
    pub message: String,
}

impl DeviceError {
    /// Build an error of any kind.
    #[must_use]
    pub fn new(kind: DeviceErrorKind, code: i32, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
        }
    }

    /// Shorthand for [`DeviceErrorKind::NotFound`].
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(DeviceErrorKind::NotFound, 0, message)
    }

    /// Shorthand for [`DeviceErrorKind::Scheduler`].
    #[must_use]
    pub fn scheduler(message: impl Into<String>) -> Self {
        Self::new(DeviceErrorKind::Scheduler, 0, message)
    }

    /// Shorthand for [`DeviceErrorKind::Transient`].
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(DeviceErrorKind::Transient, 0, message)
    }

    /// Shorthand for [`DeviceErrorKind::Fault`].
    #[must_use]
    pub fn fault(message: impl Into<String>) -> Self {
        Self::new(DeviceErrorKind::Fault, 0, message)
    }

    /// Whether the servo loop may retry on the next tick.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.kind == DeviceErrorKind::Transient
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.code == 0 {
            write!(f, "{}: {}", self.kind, self.message)
        } else {
            write!(f, "{} (code {}): {}", self.kind, self.code, self.message)
        }
    }
}

impl std::error::Error for DeviceError {}

/// Sampling and force output of one force-feedback device.
///
/// Frame calls bracket each servo tick; drivers that have no notion of
/// frames can rely on the default no-ops.
pub trait HapticDriver: Send + 'static {
    /// Open the device.
    ///
    /// # Errors
    ///
    /// Returns a [`DeviceErrorKind::NotFound`] error if no device answers.
    fn init_device(&mut self) -> Result<(), DeviceError>;

    /// Allow the device to render forces.
    ///
    /// # Errors
    ///
    /// Returns the driver's error if force output cannot be enabled.
    fn enable_force_output(&mut self) -> Result<(), DeviceError>;

    /// Release the device. Must be safe to call on an unopened device.
    fn disable_device(&mut self);

    /// Start a servo frame.
    ///
    /// # Errors
    ///
    /// Returns the driver's error for this frame.
    fn begin_frame(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    /// Commit a servo frame.
    ///
    /// # Errors
    ///
    /// Returns the driver's error for this frame.
    fn end_frame(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    /// Current stylus position in device space.
    ///
    /// # Errors
    ///
    /// Returns the driver's error for this sample.
    fn position(&mut self) -> Result<DVec3, DeviceError>;

    /// Current button bitmask.
    ///
    /// # Errors
    ///
    /// Returns the driver's error for this sample.
    fn buttons(&mut self) -> Result<ButtonMask, DeviceError>;

    /// Nominal maximum continuous force the device can render.
    ///
    /// # Errors
    ///
    /// Returns the driver's error for this query.
    fn max_continuous_force(&mut self) -> Result<f64, DeviceError>;

    /// Output `force` (device space) for the current frame.
    ///
    /// # Errors
    ///
    /// Returns the driver's error for this write.
    fn set_force(&mut self, force: DVec3) -> Result<(), DeviceError>;
}

/// Whether the scheduler should keep invoking the routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServoControl {
    /// Invoke again on the next servo tick.
    Continue,
    /// Unschedule; the routine will not be invoked again.
    Stop,
}

/// The per-tick routine handed to a scheduler.
pub type ServoRoutine = Box<dyn FnMut() -> ServoControl + Send>;

/// Invokes a routine repeatedly at the device's servo rate on a dedicated
/// thread, until stopped.
///
/// Methods take `&self` so a stop request never waits behind a caller that
/// is itself waiting for the servo thread.
pub trait ServoScheduler: Send + Sync + 'static {
    /// Schedule `routine` and start ticking.
    ///
    /// # Errors
    ///
    /// Returns a [`DeviceErrorKind::Scheduler`] error if ticking cannot
    /// start. The routine is dropped in that case.
    fn start(&self, routine: ServoRoutine) -> Result<(), DeviceError>;

    /// Stop ticking, wait for any in-flight tick, and drop the routine.
    /// Idempotent. Called from inside the routine it only requests the
    /// stop; the loop ends once the current tick returns.
    fn stop(&self);

    /// Whether the routine is currently scheduled.
    fn is_running(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code_when_present() {
        let e = DeviceError::new(DeviceErrorKind::Fault, 0x0302, "motor overheat");
        assert_eq!(e.to_string(), "device fault (code 770): motor overheat");
        assert_eq!(
            DeviceError::transient("timeout").to_string(),
            "transient error: timeout"
        );
    }

    #[test]
    fn only_transient_is_retryable() {
        assert!(DeviceError::transient("x").is_transient());
        assert!(!DeviceError::fault("x").is_transient());
        assert!(!DeviceError::not_found("x").is_transient());
        assert!(!DeviceError::scheduler("x").is_transient());
    }
}
