//! State shared between producer threads and the servo thread.
//!
//! Each region has its own lock and no caller ever holds two of them, so
//! there is no lock ordering to get wrong. The servo thread copies each
//! region out and releases the lock before doing any math.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::device::DeviceError;
use crate::geometry::TransformPair;
use crate::molecule::{AtomRegistry, GradientTable};
use crate::observer::ObserverRegistry;

/// Lock, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
pub(crate) struct SharedState {
    pub(crate) atoms: Mutex<AtomRegistry>,
    pub(crate) gradients: Mutex<GradientTable>,
    pub(crate) transform: Mutex<TransformPair>,
    pub(crate) observers: Mutex<ObserverRegistry>,
    pub(crate) fault: Mutex<Option<DeviceError>>,
    gradient_enabled: AtomicBool,
    running: AtomicBool,
}

impl SharedState {
    pub(crate) fn gradient_enabled(&self) -> bool {
        self.gradient_enabled.load(Ordering::Acquire)
    }

    pub(crate) fn set_gradient_enabled(&self, enabled: bool) {
        self.gradient_enabled.store(enabled, Ordering::Release);
    }

    pub(crate) fn running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    /// Record the fault that stopped the servo loop.
    pub(crate) fn report_fault(&self, error: DeviceError) {
        *lock(&self.fault) = Some(error);
        self.set_running(false);
    }
}
