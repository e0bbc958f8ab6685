//! Input handling: event types, button edge detection, and move-event
//! throttling for the haptic stylus.

/// Observer-facing events and raw button masks.
pub mod event;
/// Per-button edge detection with latched down flags.
pub mod buttons;
/// Rate-limited pointer motion sampling.
pub mod motion;

pub use buttons::{ButtonTracker, ButtonTransitions};
pub use event::{ButtonEdge, ButtonMask, DeviceButton, HapticEvent};
pub use motion::{MotionSample, MotionThrottle};
