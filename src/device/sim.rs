//! Software stand-ins for the vendor SDK.
//!
//! [`SimulatedDevice`] is a scriptable [`HapticDriver`] whose state is
//! shared with a [`SimulatorHandle`], so a test or a demo can move the
//! stylus, press buttons, inject errors and inspect the forces written
//! while the bridge owns the driver. [`ManualScheduler`] hands the servo
//! routine to a [`ManualTicker`] so ticks happen exactly when the caller
//! asks.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glam::DVec3;

use super::{
    DeviceError, HapticDriver, ServoControl, ServoRoutine, ServoScheduler,
};
use crate::input::ButtonMask;

/// Scripted stylus motion: frame number → (position, buttons).
pub type MotionScript = Box<dyn FnMut(u64) -> (DVec3, ButtonMask) + Send>;

struct SimState {
    present: bool,
    initialized: bool,
    force_enabled: bool,
    position: DVec3,
    buttons: ButtonMask,
    max_force: f64,
    last_force: DVec3,
    force_writes: u64,
    frames: u64,
    script: Option<MotionScript>,
    init_error: Option<DeviceError>,
    enable_error: Option<DeviceError>,
    sample_errors: VecDeque<DeviceError>,
}

fn lock(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A force-feedback device that exists only in memory.
pub struct SimulatedDevice {
    state: Arc<Mutex<SimState>>,
}

/// Controls and inspects a [`SimulatedDevice`] from another thread.
#[derive(Clone)]
pub struct SimulatorHandle {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedDevice {
    /// A connected device reporting `max_force` as its continuous limit.
    #[must_use]
    pub fn new(max_force: f64) -> (Self, SimulatorHandle) {
        let state = Arc::new(Mutex::new(SimState {
            present: true,
            initialized: false,
            force_enabled: false,
            position: DVec3::ZERO,
            buttons: ButtonMask::NONE,
            max_force,
            last_force: DVec3::ZERO,
            force_writes: 0,
            frames: 0,
            script: None,
            init_error: None,
            enable_error: None,
            sample_errors: VecDeque::new(),
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            SimulatorHandle { state },
        )
    }

    /// A device that is not plugged in; `init_device` fails.
    #[must_use]
    pub fn absent() -> (Self, SimulatorHandle) {
        let (device, handle) = Self::new(0.0);
        lock(&handle.state).present = false;
        (device, handle)
    }
}

impl SimulatorHandle {
    /// Place the stylus.
    pub fn set_position(&self, position: DVec3) {
        lock(&self.state).position = position;
    }

    /// Set the raw button mask.
    pub fn set_buttons(&self, buttons: ButtonMask) {
        lock(&self.state).buttons = buttons;
    }

    /// Drive position and buttons from a script evaluated at each frame
    /// start. Replaces manual positioning until cleared with `None`.
    pub fn set_script(&self, script: Option<MotionScript>) {
        lock(&self.state).script = script;
    }

    /// Make the next `init_device` fail with `error`.
    pub fn fail_init(&self, error: DeviceError) {
        lock(&self.state).init_error = Some(error);
    }

    /// Make the next `enable_force_output` fail with `error`.
    pub fn fail_enable(&self, error: DeviceError) {
        lock(&self.state).enable_error = Some(error);
    }

    /// Queue `error` to be returned by the next position sample.
    pub fn fail_next_sample(&self, error: DeviceError) {
        lock(&self.state).sample_errors.push_back(error);
    }

    /// Last force written by the bridge.
    #[must_use]
    pub fn last_force(&self) -> DVec3 {
        lock(&self.state).last_force
    }

    /// Number of force writes so far.
    #[must_use]
    pub fn force_writes(&self) -> u64 {
        lock(&self.state).force_writes
    }

    /// Number of frames begun so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        lock(&self.state).frames
    }

    /// Whether the device is open.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        lock(&self.state).initialized
    }

    /// Whether force output is enabled.
    #[must_use]
    pub fn force_enabled(&self) -> bool {
        lock(&self.state).force_enabled
    }
}

impl HapticDriver for SimulatedDevice {
    fn init_device(&mut self) -> Result<(), DeviceError> {
        let mut state = lock(&self.state);
        if let Some(error) = state.init_error.take() {
            return Err(error);
        }
        if !state.present {
            return Err(DeviceError::not_found("no simulated device attached"));
        }
        state.initialized = true;
        Ok(())
    }

    fn enable_force_output(&mut self) -> Result<(), DeviceError> {
        let mut state = lock(&self.state);
        if let Some(error) = state.enable_error.take() {
            return Err(error);
        }
        state.force_enabled = true;
        Ok(())
    }

    fn disable_device(&mut self) {
        let mut state = lock(&self.state);
        state.force_enabled = false;
        state.initialized = false;
    }

    fn begin_frame(&mut self) -> Result<(), DeviceError> {
        let mut state = lock(&self.state);
        let frame = state.frames;
        state.frames += 1;
        if let Some(script) = state.script.as_mut() {
            let (position, buttons) = script(frame);
            state.position = position;
            state.buttons = buttons;
        }
        Ok(())
    }

    fn position(&mut self) -> Result<DVec3, DeviceError> {
        let mut state = lock(&self.state);
        match state.sample_errors.pop_front() {
            Some(error) => Err(error),
            None => Ok(state.position),
        }
    }

    fn buttons(&mut self) -> Result<ButtonMask, DeviceError> {
        Ok(lock(&self.state).buttons)
    }

    fn max_continuous_force(&mut self) -> Result<f64, DeviceError> {
        Ok(lock(&self.state).max_force)
    }

    fn set_force(&mut self, force: DVec3) -> Result<(), DeviceError> {
        let mut state = lock(&self.state);
        state.last_force = if state.force_enabled { force } else { DVec3::ZERO };
        state.force_writes += 1;
        Ok(())
    }
}

#[derive(Default)]
struct ManualSlot {
    routine: Option<ServoRoutine>,
    scheduled: bool,
    // Bumped by every start/stop so a tick in flight knows its routine
    // was replaced or cancelled.
    generation: u64,
}

/// Scheduler that ticks only when its [`ManualTicker`] says so.
pub struct ManualScheduler {
    slot: Arc<Mutex<ManualSlot>>,
    start_error: Option<DeviceError>,
}

/// Drives a [`ManualScheduler`] from the caller's thread.
#[derive(Clone)]
pub struct ManualTicker {
    slot: Arc<Mutex<ManualSlot>>,
}

fn lock_slot(slot: &Mutex<ManualSlot>) -> MutexGuard<'_, ManualSlot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ManualScheduler {
    /// Create a scheduler and the ticker that drives it.
    #[must_use]
    pub fn new() -> (Self, ManualTicker) {
        let slot = Arc::new(Mutex::new(ManualSlot::default()));
        (
            Self {
                slot: Arc::clone(&slot),
                start_error: None,
            },
            ManualTicker { slot },
        )
    }

    /// A scheduler whose `start` always fails.
    #[must_use]
    pub fn failing(error: DeviceError) -> (Self, ManualTicker) {
        let (mut scheduler, ticker) = Self::new();
        scheduler.start_error = Some(error);
        (scheduler, ticker)
    }
}

impl ServoScheduler for ManualScheduler {
    fn start(&self, routine: ServoRoutine) -> Result<(), DeviceError> {
        if let Some(error) = self.start_error.clone() {
            return Err(error);
        }
        let mut slot = lock_slot(&self.slot);
        slot.generation += 1;
        slot.scheduled = true;
        slot.routine = Some(routine);
        Ok(())
    }

    fn stop(&self) {
        let previous = {
            let mut slot = lock_slot(&self.slot);
            slot.generation += 1;
            slot.scheduled = false;
            slot.routine.take()
        };
        drop(previous);
    }

    fn is_running(&self) -> bool {
        lock_slot(&self.slot).scheduled
    }
}

impl ManualTicker {
    /// Run one servo tick. Returns `None` if nothing is scheduled.
    ///
    /// A routine that answers [`ServoControl::Stop`] is unscheduled. The
    /// routine runs with no lock held, so it may stop or restart the
    /// scheduler itself.
    pub fn tick(&self) -> Option<ServoControl> {
        let (mut routine, generation) = {
            let mut slot = lock_slot(&self.slot);
            if !slot.scheduled {
                return None;
            }
            (slot.routine.take()?, slot.generation)
        };
        let control = routine();

        let mut slot = lock_slot(&self.slot);
        if slot.generation == generation {
            if control == ServoControl::Stop {
                slot.scheduled = false;
            } else {
                slot.routine = Some(routine);
            }
        }
        Some(control)
    }

    /// Run up to `n` ticks, stopping early if the routine unschedules.
    /// Returns the number of ticks run.
    pub fn tick_n(&self, n: usize) -> usize {
        let mut ran = 0;
        while ran < n {
            match self.tick() {
                Some(ServoControl::Continue) => ran += 1,
                Some(ServoControl::Stop) => return ran + 1,
                None => break,
            }
        }
        ran
    }

    /// Whether a routine is scheduled.
    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        lock_slot(&self.slot).scheduled
    }
}
