//! Observer interface for haptic events, the handle-based registry, and
//! the optional queued delivery mode.
//!
//! Observers run synchronously on the servo thread, inside the tick that
//! produced the event. Handlers must return promptly and must not block:
//! every microsecond spent in a handler is taken from the haptic loop. An
//! observer that needs to do real work should use [`queued`] delivery and
//! consume events on its own thread.

pub mod queued;
pub mod registry;

use glam::DVec3;
pub use queued::{queued, EventReceiver, QueuedObserver};
pub use registry::{ObserverId, ObserverRegistry, ObserverSet};

use crate::input::HapticEvent;

/// Receiver of stylus motion and button transitions.
///
/// All methods default to doing nothing so adapters only implement what
/// they consume.
pub trait HapticObserver: Send + Sync {
    /// Pointer moved. `position` is in application space; `azimuth` and
    /// `elevation` are raw device x/y deltas; `zoom` is 0.90, 1.10 or 1.0.
    fn on_move(&self, position: DVec3, azimuth: f64, elevation: f64, zoom: f64) {
        let _ = (position, azimuth, elevation, zoom);
    }

    /// Primary button pressed.
    fn on_first_button_down(&self) {}

    /// Primary button released.
    fn on_first_button_up(&self) {}

    /// Secondary button pressed. `atom` is the selected atom id, if any.
    fn on_second_button_down(&self, atom: Option<usize>) {
        let _ = atom;
    }

    /// Secondary button released.
    fn on_second_button_up(&self) {}
}

/// Deliver `event` to every observer in registration order.
pub fn dispatch(observers: &ObserverSet, event: &HapticEvent) {
    for observer in observers.iter() {
        deliver(observer.as_ref(), event);
    }
}

/// Deliver `event` to a single observer.
pub fn deliver(observer: &dyn HapticObserver, event: &HapticEvent) {
    match *event {
        HapticEvent::Move {
            position,
            azimuth,
            elevation,
            zoom,
        } => observer.on_move(position, azimuth, elevation, zoom),
        HapticEvent::FirstButtonDown => observer.on_first_button_down(),
        HapticEvent::FirstButtonUp => observer.on_first_button_up(),
        HapticEvent::SecondButtonDown { atom } => {
            observer.on_second_button_down(atom);
        }
        HapticEvent::SecondButtonUp => observer.on_second_button_up(),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording observer shared by tests across the crate.

    use std::sync::Mutex;

    use glam::DVec3;

    use super::HapticObserver;
    use crate::input::HapticEvent;

    /// Records every call as a [`HapticEvent`].
    #[derive(Default)]
    pub(crate) struct Recorder {
        pub(crate) events: Mutex<Vec<HapticEvent>>,
    }

    impl Recorder {
        pub(crate) fn take(&self) -> Vec<HapticEvent> {
            std::mem::take(&mut *self.events.lock().unwrap())
        }

        pub(crate) fn moves(&self) -> usize {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter(|e| !e.is_button())
                .count()
        }

        fn push(&self, event: HapticEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl HapticObserver for Recorder {
        fn on_move(&self, position: DVec3, azimuth: f64, elevation: f64, zoom: f64) {
            self.push(HapticEvent::Move {
                position,
                azimuth,
                elevation,
                zoom,
            });
        }

        fn on_first_button_down(&self) {
            self.push(HapticEvent::FirstButtonDown);
        }

        fn on_first_button_up(&self) {
            self.push(HapticEvent::FirstButtonUp);
        }

        fn on_second_button_down(&self, atom: Option<usize>) {
            self.push(HapticEvent::SecondButtonDown { atom });
        }

        fn on_second_button_up(&self) {
            self.push(HapticEvent::SecondButtonUp);
        }
    }
}
