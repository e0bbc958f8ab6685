//! The device bridge: owns the shared molecule/gradient/transform state,
//! the observer registry, the driver and the scheduler, and exposes the
//! lifecycle and mutation entry points used by the application.
//!
//! Every entry point takes `&self`; share the bridge between the GUI
//! thread and the physics thread with an `Arc`. Each entry point touches
//! exactly one independently locked region, so a producer never stalls
//! anything but the servo thread's snapshot of that same region.

mod servo;
mod shared;

use std::sync::{Arc, Mutex};

use glam::DVec3;

use self::servo::ServoLoop;
use self::shared::{lock, SharedState};
use crate::device::{DeviceError, HapticDriver, ServoRoutine, ServoScheduler};
use crate::error::BridgeError;
use crate::geometry::TransformPair;
use crate::molecule::{AtomRecord, GradientTable};
use crate::observer::{self, EventReceiver, HapticObserver, ObserverId};
use crate::options::Options;

/// Latest per-tick pointer snapshot, published by the servo thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerState {
    /// Servo tick counter since `init`.
    pub tick: u64,
    /// Raw device position.
    pub device_position: DVec3,
    /// Pointer position in application space.
    pub position: DVec3,
    /// Atom within containment reach, if any.
    pub selected_atom: Option<usize>,
    /// Force written this tick; `None` when the molecule was empty and no
    /// write happened.
    pub force: Option<DVec3>,
    /// Latched primary button state.
    pub primary_down: bool,
    /// Latched secondary button state.
    pub secondary_down: bool,
}

struct Lifecycle {
    device_acquired: bool,
}

/// Real-time bridge between a force-feedback device and a live molecule.
///
/// # Usage
///
/// ```ignore
/// let bridge = Arc::new(HapticBridge::new(driver, scheduler, &options)?);
/// let _id = bridge.register_observer(Arc::new(my_observer));
/// bridge.init()?;
///
/// // physics thread
/// bridge.set_gradients(&flat_gradient)?;
/// // GUI thread
/// bridge.set_transform(TransformPair::from_forward(camera_matrix))?;
///
/// bridge.shutdown();
/// ```
pub struct HapticBridge<D: HapticDriver, S: ServoScheduler> {
    shared: Arc<SharedState>,
    driver: Arc<Mutex<D>>,
    scheduler: S,
    // Serialises init/shutdown. Never held while the servo thread is
    // joined, and never taken by the servo thread itself.
    lifecycle: Mutex<Lifecycle>,
    pointer: Mutex<Option<triple_buffer::Output<Option<PointerState>>>>,
    options: Options,
}

impl<D: HapticDriver, S: ServoScheduler> HapticBridge<D, S> {
    /// Build a bridge around `driver` and `scheduler`. Nothing is acquired
    /// until [`init`](Self::init).
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidScale`] if `options.servo.scale_factor`
    /// is not finite and positive.
    pub fn new(
        driver: D,
        scheduler: S,
        options: &Options,
    ) -> Result<Self, BridgeError> {
        let scale = options.servo.scale_factor;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(BridgeError::InvalidScale(scale));
        }
        Ok(Self {
            shared: Arc::new(SharedState::default()),
            driver: Arc::new(Mutex::new(driver)),
            scheduler,
            lifecycle: Mutex::new(Lifecycle {
                device_acquired: false,
            }),
            pointer: Mutex::new(None),
            options: options.clone(),
        })
    }

    // ── Lifecycle ────────────────────────────────────────────────────────

    /// Acquire the device, enable force output, and start the servo loop.
    ///
    /// On failure nothing stays acquired; calling
    /// [`shutdown`](Self::shutdown) afterwards is harmless but not needed.
    /// A bridge whose loop stopped on a device fault can be re-initialised.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::AlreadyRunning`] if the loop is running, or
    /// [`BridgeError::Device`] if the device cannot be opened, force output
    /// cannot be enabled, or the scheduler cannot start.
    pub fn init(&self) -> Result<(), BridgeError> {
        if self.shared.running() {
            return Err(BridgeError::AlreadyRunning);
        }
        // Reap a loop that stopped itself on a fault, before taking the
        // lifecycle lock: this may join the servo thread.
        self.scheduler.stop();

        let mut life = lock(&self.lifecycle);
        if self.shared.running() || self.scheduler.is_running() {
            return Err(BridgeError::AlreadyRunning);
        }
        if life.device_acquired {
            self.release_device(&mut life);
        }
        *lock(&self.shared.fault) = None;

        self.acquire_device(&mut life)?;

        let (input, output) = triple_buffer::triple_buffer(&None);
        let mut servo = ServoLoop::new(
            Arc::clone(&self.driver),
            Arc::clone(&self.shared),
            self.options.servo.scale_factor,
            self.options.servo.max_consecutive_transient_errors,
            input,
        );
        let routine: ServoRoutine = Box::new(move || servo.tick());

        self.shared.set_running(true);
        if let Err(e) = self.scheduler.start(routine) {
            log::error!("failed to start haptic scheduler: {e}");
            self.shared.set_running(false);
            self.release_device(&mut life);
            return Err(e.into());
        }
        *lock(&self.pointer) = Some(output);
        log::info!(
            "haptic servo loop started (scale factor {})",
            self.options.servo.scale_factor
        );
        Ok(())
    }

    /// Stop the servo loop and release the device. Idempotent, and safe to
    /// call on a bridge that was never initialised.
    ///
    /// May be called from an observer: the stop then takes effect once the
    /// current tick returns.
    pub fn shutdown(&self) {
        let was_running = self.shared.running();
        // Joins the servo thread, so no bridge lock may be held here.
        self.scheduler.stop();

        let mut life = lock(&self.lifecycle);
        if self.scheduler.is_running() {
            // A concurrent init started a fresh loop; it owns the device.
            return;
        }
        self.shared.set_running(false);
        if life.device_acquired {
            self.release_device(&mut life);
        }
        if was_running {
            log::info!("haptic servo loop stopped");
        }
    }

    /// Whether the servo loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared.running()
    }

    /// The device fault that stopped the servo loop, if any.
    #[must_use]
    pub fn fault(&self) -> Option<DeviceError> {
        lock(&self.shared.fault).clone()
    }

    fn acquire_device(&self, life: &mut Lifecycle) -> Result<(), BridgeError> {
        let mut driver = lock(&self.driver);
        if let Err(e) = driver.init_device() {
            log::error!("failed to initialize haptic device: {e}");
            return Err(e.into());
        }
        if let Err(e) = driver.enable_force_output() {
            log::error!("failed to enable force output: {e}");
            driver.disable_device();
            return Err(e.into());
        }
        life.device_acquired = true;
        log::debug!("haptic device acquired");
        Ok(())
    }

    fn release_device(&self, life: &mut Lifecycle) {
        let mut driver = lock(&self.driver);
        if let Err(e) = driver.set_force(DVec3::ZERO) {
            log::debug!("zero-force write during release failed: {e}");
        }
        driver.disable_device();
        life.device_acquired = false;
        log::debug!("haptic device released");
    }

    // ── Observers ────────────────────────────────────────────────────────

    /// Register an observer. It receives events from the next tick on.
    pub fn register_observer(
        &self,
        observer: Arc<dyn HapticObserver>,
    ) -> ObserverId {
        lock(&self.shared.observers).register(observer)
    }

    /// Detach an observer. Returns `false` for an unknown handle.
    pub fn unregister_observer(&self, id: ObserverId) -> bool {
        lock(&self.shared.observers).unregister(id)
    }

    /// Register a queued observer sized by `options.events.queue_capacity`
    /// and return the receiving end.
    pub fn register_queued(&self) -> (ObserverId, EventReceiver) {
        let (observer, receiver) =
            observer::queued(self.options.events.queue_capacity);
        (self.register_observer(Arc::new(observer)), receiver)
    }

    // ── Molecule ─────────────────────────────────────────────────────────

    /// Remove every atom.
    pub fn reset_molecule(&self) {
        lock(&self.shared.atoms).clear();
    }

    /// Append an atom. Its id must equal the current atom count.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidAtom`] for a non-positional id or a
    /// non-finite record; the registry is left unchanged.
    pub fn add_atom(&self, atom: AtomRecord) -> Result<(), BridgeError> {
        atom.validate()?;
        let mut atoms = lock(&self.shared.atoms);
        if atom.id != atoms.len() {
            return Err(BridgeError::InvalidAtom(format!(
                "atom id {} does not match next index {}",
                atom.id,
                atoms.len()
            )));
        }
        atoms.push(atom);
        Ok(())
    }

    /// Replace the atom with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidAtom`] if no atom has that id or the
    /// record is not finite.
    pub fn update_atom(&self, atom: AtomRecord) -> Result<(), BridgeError> {
        atom.validate()?;
        let mut atoms = lock(&self.shared.atoms);
        if atoms.replace(atom) {
            Ok(())
        } else {
            Err(BridgeError::InvalidAtom(format!(
                "no atom with id {} (molecule has {})",
                atom.id,
                atoms.len()
            )))
        }
    }

    /// Replace the whole molecule in one step. The servo thread sees
    /// either the old molecule or the new one, never a partial list.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidAtom`] if any record is invalid or
    /// out of order; the registry is left unchanged.
    pub fn set_molecule(&self, atoms: &[AtomRecord]) -> Result<(), BridgeError> {
        for (index, atom) in atoms.iter().enumerate() {
            atom.validate()?;
            if atom.id != index {
                return Err(BridgeError::InvalidAtom(format!(
                    "atom id {} at index {index}",
                    atom.id
                )));
            }
        }
        let mut registry = lock(&self.shared.atoms);
        registry.clear();
        for atom in atoms {
            registry.push(*atom);
        }
        Ok(())
    }

    /// Number of atoms currently mirrored.
    #[must_use]
    pub fn atom_count(&self) -> usize {
        lock(&self.shared.atoms).len()
    }

    // ── Gradients ────────────────────────────────────────────────────────

    /// Update gradients from a flat `[gx, gy, gz, ...]` list in atom-id
    /// order. Grows the table as needed; entries beyond the list are kept.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidGradient`] for a partial triple or a
    /// non-finite value; the table is left unchanged.
    pub fn set_gradients(&self, flat: &[f64]) -> Result<(), BridgeError> {
        GradientTable::validate_flat(flat)?;
        lock(&self.shared.gradients).apply_flat(flat);
        Ok(())
    }

    /// Drop all stored gradients.
    pub fn clear_gradients(&self) {
        lock(&self.shared.gradients).clear();
    }

    /// Turn gradient-driven force feedback on or off.
    pub fn set_gradient_computation_enabled(&self, enabled: bool) {
        self.shared.set_gradient_enabled(enabled);
        log::debug!("gradient computation in loop: {enabled}");
    }

    /// Whether gradient-driven force feedback is on.
    #[must_use]
    pub fn gradient_computation_enabled(&self) -> bool {
        self.shared.gradient_enabled()
    }

    // ── Transform ────────────────────────────────────────────────────────

    /// Replace the forward/inverse transform pair.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidTransform`] if the matrices are not
    /// finite or not mutual inverses within
    /// `options.servo.transform_tolerance`; the previous pair stays.
    pub fn set_transform(&self, pair: TransformPair) -> Result<(), BridgeError> {
        pair.validate(self.options.servo.transform_tolerance)?;
        *lock(&self.shared.transform) = pair;
        Ok(())
    }

    /// [`set_transform`](Self::set_transform) from two flat row-major 4×4
    /// matrices.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidTransform`] for malformed or
    /// inconsistent matrices.
    pub fn set_transform_row_major(
        &self,
        forward: &[f64],
        inverse: &[f64],
    ) -> Result<(), BridgeError> {
        self.set_transform(TransformPair::from_row_major(forward, inverse)?)
    }

    /// Current transform pair.
    #[must_use]
    pub fn transform(&self) -> TransformPair {
        *lock(&self.shared.transform)
    }

    // ── Pointer ──────────────────────────────────────────────────────────

    /// Most recent pointer state published by the servo loop, or `None`
    /// before the first tick.
    #[must_use]
    pub fn latest_pointer(&self) -> Option<PointerState> {
        let mut pointer = lock(&self.pointer);
        let output = pointer.as_mut()?;
        let _ = output.update();
        *output.output_buffer_mut()
    }

    /// Device units per application unit.
    #[must_use]
    pub fn scale_factor(&self) -> f64 {
        self.options.servo.scale_factor
    }
}

impl<D: HapticDriver, S: ServoScheduler> Drop for HapticBridge<D, S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
