use super::event::{ButtonEdge, ButtonMask, DeviceButton, HapticEvent};

/// Edges detected in one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonTransitions {
    /// Primary button edge, if it changed.
    pub primary: Option<ButtonEdge>,
    /// Secondary button edge, if it changed.
    pub secondary: Option<ButtonEdge>,
}

impl ButtonTransitions {
    /// Whether neither button changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.secondary.is_none()
    }

    /// Observer events for these edges, primary first.
    ///
    /// `selected_atom` is attached to a secondary press.
    pub fn events(
        self,
        selected_atom: Option<usize>,
    ) -> impl Iterator<Item = HapticEvent> {
        let primary = self.primary.map(|edge| match edge {
            ButtonEdge::Pressed => HapticEvent::FirstButtonDown,
            ButtonEdge::Released => HapticEvent::FirstButtonUp,
        });
        let secondary = self.secondary.map(|edge| match edge {
            ButtonEdge::Pressed => HapticEvent::SecondButtonDown {
                atom: selected_atom,
            },
            ButtonEdge::Released => HapticEvent::SecondButtonUp,
        });
        [primary, secondary].into_iter().flatten()
    }
}

/// Two independent up/down state machines fed by raw bitmasks.
///
/// The latched flags persist across ticks; the force model reads
/// [`secondary_down`](Self::secondary_down) to decide whether to push.
#[derive(Debug, Clone, Default)]
pub struct ButtonTracker {
    previous: ButtonMask,
    primary_down: bool,
    secondary_down: bool,
}

impl ButtonTracker {
    /// Tracker with both buttons up.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed this tick's mask and return the edges relative to the last one.
    pub fn update(&mut self, current: ButtonMask) -> ButtonTransitions {
        let transitions = ButtonTransitions {
            primary: edge(self.previous, current, DeviceButton::Primary),
            secondary: edge(self.previous, current, DeviceButton::Secondary),
        };
        if let Some(e) = transitions.primary {
            self.primary_down = e == ButtonEdge::Pressed;
        }
        if let Some(e) = transitions.secondary {
            self.secondary_down = e == ButtonEdge::Pressed;
        }
        self.previous = current;
        transitions
    }

    /// Latched primary state.
    #[must_use]
    pub fn primary_down(&self) -> bool {
        self.primary_down
    }

    /// Latched secondary state.
    #[must_use]
    pub fn secondary_down(&self) -> bool {
        self.secondary_down
    }
}

fn edge(
    previous: ButtonMask,
    current: ButtonMask,
    button: DeviceButton,
) -> Option<ButtonEdge> {
    match (previous.is_down(button), current.is_down(button)) {
        (false, true) => Some(ButtonEdge::Pressed),
        (true, false) => Some(ButtonEdge::Released),
        _ => None,
    }
}
