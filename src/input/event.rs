use glam::DVec3;

/// Raw button bitmask as sampled from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ButtonMask(pub u32);

impl ButtonMask {
    /// No buttons held.
    pub const NONE: Self = Self(0);
    /// Primary (front) stylus button.
    pub const PRIMARY: Self = Self(1 << 0);
    /// Secondary (rear) stylus button.
    pub const SECONDARY: Self = Self(1 << 1);

    /// Whether `button`'s bit is set.
    #[must_use]
    pub fn is_down(self, button: DeviceButton) -> bool {
        self.0 & button.mask().0 != 0
    }

    /// Combine two masks.
    #[must_use]
    pub fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Stylus button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceButton {
    /// Primary (front) button.
    Primary,
    /// Secondary (rear) button; grabs the selected atom.
    Secondary,
}

impl DeviceButton {
    /// The bit this button occupies in a [`ButtonMask`].
    #[must_use]
    pub fn mask(self) -> ButtonMask {
        match self {
            Self::Primary => ButtonMask::PRIMARY,
            Self::Secondary => ButtonMask::SECONDARY,
        }
    }
}

/// A button state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEdge {
    /// Up → down.
    Pressed,
    /// Down → up.
    Released,
}

/// Events delivered to observers.
///
/// The synchronous observer interface receives these as individual method
/// calls; queued observers receive the values themselves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HapticEvent {
    /// Pointer moved in application space.
    Move {
        /// Pointer position in application space.
        position: DVec3,
        /// Raw device x delta since the last evaluated sample.
        azimuth: f64,
        /// Raw device y delta since the last evaluated sample.
        elevation: f64,
        /// Zoom multiplier: 0.90 out, 1.10 in, 1.0 unchanged.
        zoom: f64,
    },
    /// Primary button pressed.
    FirstButtonDown,
    /// Primary button released.
    FirstButtonUp,
    /// Secondary button pressed, with the selected atom if any.
    SecondButtonDown {
        /// Id of the atom under the pointer, `None` if nothing is selected.
        atom: Option<usize>,
    },
    /// Secondary button released.
    SecondButtonUp,
}

impl HapticEvent {
    /// Whether this is a button transition (as opposed to motion).
    #[must_use]
    pub fn is_button(&self) -> bool {
        !matches!(self, Self::Move { .. })
    }
}
