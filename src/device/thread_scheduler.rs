//! Fixed-rate servo scheduler on a plain std thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use web_time::{Duration, Instant};

use super::{DeviceError, ServoControl, ServoRoutine, ServoScheduler};

/// One started servo thread and its private flags.
///
/// Flags are per thread so a loop that was asked to stop from inside its
/// own tick can never be revived by a later `start`.
struct Worker {
    handle: JoinHandle<()>,
    stop: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
}

/// Fixed-rate scheduler on a dedicated `haptic-servo` thread.
///
/// Ticks are paced against absolute deadlines; a tick that overruns its
/// slot pushes the next deadline out rather than bursting to catch up.
pub struct ThreadScheduler {
    period: Duration,
    worker: Mutex<Option<Worker>>,
}

fn lock_worker(worker: &Mutex<Option<Worker>>) -> MutexGuard<'_, Option<Worker>> {
    worker.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ThreadScheduler {
    /// Scheduler ticking `rate_hz` times per second (at least once).
    #[must_use]
    pub fn new(rate_hz: u32) -> Self {
        Self {
            period: Duration::from_secs_f64(1.0 / f64::from(rate_hz.max(1))),
            worker: Mutex::new(None),
        }
    }

    /// Interval between tick deadlines.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    #[allow(clippy::needless_pass_by_value)]
    fn thread_loop(
        mut routine: ServoRoutine,
        period: Duration,
        stop: Arc<AtomicBool>,
        running: Arc<AtomicBool>,
    ) {
        let mut deadline = Instant::now();
        while !stop.load(Ordering::Acquire) {
            if routine() == ServoControl::Stop {
                log::debug!("servo routine requested stop");
                break;
            }
            deadline += period;
            let now = Instant::now();
            if deadline > now {
                std::thread::sleep(deadline - now);
            } else {
                deadline = now;
            }
        }
        running.store(false, Ordering::Release);
    }
}

impl ServoScheduler for ThreadScheduler {
    fn start(&self, routine: ServoRoutine) -> Result<(), DeviceError> {
        self.stop();

        let period = self.period;
        let stop = Arc::new(AtomicBool::new(false));
        let running = Arc::new(AtomicBool::new(true));
        let spawned = {
            let stop = Arc::clone(&stop);
            let running = Arc::clone(&running);
            std::thread::Builder::new()
                .name("haptic-servo".into())
                .spawn(move || Self::thread_loop(routine, period, stop, running))
        };

        match spawned {
            Ok(handle) => {
                *lock_worker(&self.worker) = Some(Worker {
                    handle,
                    stop,
                    running,
                });
                Ok(())
            }
            Err(e) => Err(DeviceError::scheduler(format!(
                "failed to spawn servo thread: {e}"
            ))),
        }
    }

    fn stop(&self) {
        // Take the worker out first so the join happens with no lock held.
        let Some(worker) = lock_worker(&self.worker).take() else {
            return;
        };
        worker.stop.store(true, Ordering::Release);
        if worker.handle.thread().id() == std::thread::current().id() {
            // Called from inside a tick: the loop sees the flag and exits.
            return;
        }
        if worker.handle.join().is_err() {
            log::error!("servo thread panicked");
        }
    }

    fn is_running(&self) -> bool {
        lock_worker(&self.worker)
            .as_ref()
            .is_some_and(|worker| worker.running.load(Ordering::Acquire))
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn wait_until(mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !done() {
            if Instant::now() > deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        true
    }

    #[test]
    fn runs_until_stopped() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let scheduler = ThreadScheduler::new(1000);
        scheduler
            .start(Box::new(move || {
                let _ = counter.fetch_add(1, Ordering::Relaxed);
                ServoControl::Continue
            }))
            .unwrap();
        assert!(scheduler.is_running());

        std::thread::sleep(Duration::from_millis(50));
        scheduler.stop();
        assert!(!scheduler.is_running());

        let seen = ticks.load(Ordering::Relaxed);
        assert!(seen > 0);
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(ticks.load(Ordering::Relaxed), seen);

        // Idempotent
        scheduler.stop();
    }

    #[test]
    fn routine_can_stop_itself() {
        let scheduler = ThreadScheduler::new(2000);
        let mut remaining = 3;
        scheduler
            .start(Box::new(move || {
                remaining -= 1;
                if remaining == 0 {
                    ServoControl::Stop
                } else {
                    ServoControl::Continue
                }
            }))
            .unwrap();

        assert!(wait_until(|| !scheduler.is_running()));
        scheduler.stop();
    }

    #[test]
    fn stop_from_inside_a_tick_returns() {
        let scheduler = Arc::new(ThreadScheduler::new(1000));
        let ticks = Arc::new(AtomicUsize::new(0));
        let (inner, counter) = (Arc::clone(&scheduler), Arc::clone(&ticks));
        scheduler
            .start(Box::new(move || {
                // Before `start` stores the worker this is a no-op.
                if counter.fetch_add(1, Ordering::Relaxed) >= 2 {
                    inner.stop();
                }
                ServoControl::Continue
            }))
            .unwrap();

        assert!(wait_until(|| ticks.load(Ordering::Relaxed) >= 3
            && !scheduler.is_running()));
        std::thread::sleep(Duration::from_millis(20));
        let seen = ticks.load(Ordering::Relaxed);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(ticks.load(Ordering::Relaxed), seen);
    }

    #[test]
    fn restart_replaces_the_previous_thread() {
        let scheduler = ThreadScheduler::new(1000);
        let first = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&first);
        scheduler
            .start(Box::new(move || {
                let _ = counter.fetch_add(1, Ordering::Relaxed);
                ServoControl::Continue
            }))
            .unwrap();
        scheduler
            .start(Box::new(|| ServoControl::Continue))
            .unwrap();

        let seen = first.load(Ordering::Relaxed);
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(first.load(Ordering::Relaxed), seen);
        assert!(scheduler.is_running());
        scheduler.stop();
    }

    #[test]
    fn period_follows_rate() {
        assert_eq!(ThreadScheduler::new(1000).period(), Duration::from_millis(1));
        assert_eq!(ThreadScheduler::new(0).period(), Duration::from_secs(1));
    }
}
