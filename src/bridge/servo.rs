//! The per-tick servo routine.
//!
//! One tick: sample the device, snapshot shared state, map into
//! application space, pick the nearest atom, write the force,
//! publish the pointer state, then dispatch button edges and (throttled)
//! motion once the driver is released. Ticks never block on anything but
//! the three short snapshot locks and the observer-registry lock.

use std::sync::{Arc, Mutex};

use glam::DVec3;
use web_time::Instant;

use super::shared::{lock, SharedState};
use super::PointerState;
use crate::device::{DeviceError, HapticDriver, ServoControl};
use crate::force::{compute_force, ForceInputs};
use crate::geometry::{
    to_application_space, to_device_direction, to_device_space, TransformPair,
};
use crate::input::{
    ButtonTracker, ButtonTransitions, HapticEvent, MotionThrottle,
};
use crate::molecule::{select, AtomRecord, GradientTable};
use crate::observer::dispatch;

/// Observer work produced by one frame, dispatched after the driver lock
/// is released.
struct FrameEvents {
    transitions: ButtonTransitions,
    selected_atom: Option<usize>,
    motion: Option<HapticEvent>,
}

pub(crate) struct ServoLoop<D: HapticDriver> {
    driver: Arc<Mutex<D>>,
    shared: Arc<SharedState>,
    scale: f64,
    max_transient_errors: u32,
    transient_streak: u32,
    tick: u64,
    buttons: ButtonTracker,
    motion: MotionThrottle,
    // Scratch snapshots, reused across ticks to avoid allocating.
    atoms: Vec<AtomRecord>,
    gradients: GradientTable,
    pointer: triple_buffer::Input<Option<PointerState>>,
}

impl<D: HapticDriver> ServoLoop<D> {
    pub(crate) fn new(
        driver: Arc<Mutex<D>>,
        shared: Arc<SharedState>,
        scale: f64,
        max_transient_errors: u32,
        pointer: triple_buffer::Input<Option<PointerState>>,
    ) -> Self {
        Self {
            driver,
            shared,
            scale,
            max_transient_errors,
            transient_streak: 0,
            tick: 0,
            buttons: ButtonTracker::new(),
            motion: MotionThrottle::new(),
            atoms: Vec::new(),
            gradients: GradientTable::new(),
            pointer,
        }
    }

    /// Entry point for the scheduler.
    pub(crate) fn tick(&mut self) -> ServoControl {
        self.tick_at(Instant::now())
    }

    pub(crate) fn tick_at(&mut self, now: Instant) -> ServoControl {
        // The driver lock covers the device frame only; observers run after
        // it is released so they may call back into the bridge.
        let events = {
            let driver = Arc::clone(&self.driver);
            let mut driver = lock(&driver);
            self.tick += 1;
            match self.run_frame(&mut *driver, now) {
                Ok(events) => events,
                Err(error) => return self.handle_error(&mut *driver, error),
            }
        };

        if self.transient_streak > 0 {
            log::debug!(
                "device recovered after {} transient errors",
                self.transient_streak
            );
        }
        self.transient_streak = 0;
        self.notify(events);
        ServoControl::Continue
    }

    fn run_frame(
        &mut self,
        driver: &mut D,
        now: Instant,
    ) -> Result<FrameEvents, DeviceError> {
        driver.begin_frame()?;
        let device_pos = driver.position()?;
        let mask = driver.buttons()?;

        lock(&self.shared.atoms).snapshot_into(&mut self.atoms);
        let transform: TransformPair = *lock(&self.shared.transform);
        lock(&self.shared.gradients).snapshot_into(&mut self.gradients);
        let gradient_enabled = self.shared.gradient_enabled();

        let app_pos =
            to_application_space(device_pos, &transform.forward, self.scale);

        let (selected_atom, force) = if self.atoms.is_empty() {
            (None, None)
        } else {
            self.write_force(driver, app_pos, &transform, gradient_enabled)?
        };

        let transitions = self.buttons.update(mask);
        driver.end_frame()?;

        self.pointer.write(Some(PointerState {
            tick: self.tick,
            device_position: device_pos,
            position: app_pos,
            selected_atom,
            force,
            primary_down: self.buttons.primary_down(),
            secondary_down: self.buttons.secondary_down(),
        }));

        let motion = self.motion.evaluate(now, device_pos).and_then(|sample| {
            let last_app = to_application_space(
                sample.previous,
                &transform.forward,
                self.scale,
            );
            (app_pos != last_app).then_some(HapticEvent::Move {
                position: app_pos,
                azimuth: sample.azimuth,
                elevation: sample.elevation,
                zoom: sample.zoom,
            })
        });

        Ok(FrameEvents {
            transitions,
            selected_atom,
            motion,
        })
    }

    /// Button edges first, then the move.
    fn notify(&self, events: FrameEvents) {
        if events.transitions.is_empty() && events.motion.is_none() {
            return;
        }
        let observers = lock(&self.shared.observers).snapshot();
        for event in events
            .transitions
            .events(events.selected_atom)
            .chain(events.motion)
        {
            dispatch(&observers, &event);
        }
    }

    /// Select the nearest atom and write this tick's force. Returns the
    /// contained atom id, if any, and the force written.
    fn write_force(
        &self,
        driver: &mut D,
        app_pos: DVec3,
        transform: &TransformPair,
        gradient_enabled: bool,
    ) -> Result<(Option<usize>, Option<DVec3>), DeviceError> {
        let Some(sel) = select(&self.atoms, app_pos) else {
            return Ok((None, None));
        };
        let (selected_atom, gradient) = if sel.contained {
            (Some(sel.atom_id), self.gradients.lookup(sel.atom_id))
        } else {
            (None, DVec3::ZERO)
        };
        let atom_device = to_device_space(
            self.atoms[sel.index].position,
            &transform.inverse,
            self.scale,
        );
        let gradient_device =
            to_device_direction(gradient, &transform.inverse, self.scale);

        let secondary_held = self.buttons.secondary_down();
        let max_force = if gradient_enabled && secondary_held {
            driver.max_continuous_force()?
        } else {
            0.0
        };
        let force = compute_force(&ForceInputs {
            gradient_enabled,
            secondary_held,
            atom: atom_device,
            gradient: gradient_device,
            max_force,
        });
        driver.set_force(force)?;
        Ok((selected_atom, Some(force)))
    }

    fn handle_error(&mut self, driver: &mut D, error: DeviceError) -> ServoControl {
        // Never leave a stale force on the device.
        if let Err(e) = driver.set_force(DVec3::ZERO) {
            log::error!("zero-force write after device error failed: {e}");
        }
        if let Err(e) = driver.end_frame() {
            log::debug!("end_frame after device error failed: {e}");
        }

        if error.is_transient() {
            self.transient_streak += 1;
            if self.transient_streak <= self.max_transient_errors {
                if self.transient_streak == 1 {
                    log::warn!("skipping servo tick {}: {error}", self.tick);
                }
                return ServoControl::Continue;
            }
            log::error!(
                "{} consecutive transient device errors, stopping servo loop",
                self.transient_streak
            );
        }

        log::error!("haptic device failed on tick {}: {error}", self.tick);
        // The loop is about to stop; drop force output so nothing written
        // earlier stays applied.
        driver.disable_device();
        self.shared.report_fault(error);
        ServoControl::Stop
    }
}
