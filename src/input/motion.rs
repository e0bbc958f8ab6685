//! Move-event throttling.
//!
//! The servo loop runs far faster than any consumer wants pointer updates,
//! so motion is sampled at a fixed cadence. Each evaluation compares the
//! current raw device position against the previous *evaluated* one.

use glam::DVec3;
use web_time::{Duration, Instant};

/// Upper bound on move evaluations per second.
pub const MOVE_EVENTS_PER_SECOND: u32 = 60;
/// Device z travel that counts as a zoom gesture.
pub const ZOOM_THRESHOLD: f64 = 1.2;
/// Zoom multiplier when the stylus moves toward the user.
pub const ZOOM_OUT: f64 = 0.90;
/// Zoom multiplier when the stylus moves away from the user.
pub const ZOOM_IN: f64 = 1.10;

/// Camera deltas derived from one evaluated motion sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    /// Raw device position at the previous evaluation.
    pub previous: DVec3,
    /// `previous.x - current.x`.
    pub azimuth: f64,
    /// `previous.y - current.y`.
    pub elevation: f64,
    /// Tri-state zoom multiplier.
    pub zoom: f64,
}

/// Rate limiter and last-sample memory for move events.
#[derive(Debug, Clone)]
pub struct MotionThrottle {
    min_interval: Duration,
    last_evaluated: Option<Instant>,
    last_sample: Option<DVec3>,
}

impl Default for MotionThrottle {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionThrottle {
    /// Throttle at [`MOVE_EVENTS_PER_SECOND`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_interval: Duration::from_micros(
                1_000_000 / u64::from(MOVE_EVENTS_PER_SECOND),
            ),
            last_evaluated: None,
            last_sample: None,
        }
    }

    /// Evaluate motion at `now` for raw device position `device`.
    ///
    /// Returns `None` while the cadence interval has not elapsed. Otherwise
    /// the deltas against the previous evaluated sample are returned and
    /// `device` becomes the new previous sample. The very first evaluation
    /// compares against itself.
    pub fn evaluate(
        &mut self,
        now: Instant,
        device: DVec3,
    ) -> Option<MotionSample> {
        if let Some(last) = self.last_evaluated {
            if now.duration_since(last) < self.min_interval {
                return None;
            }
        }
        self.last_evaluated = Some(now);

        let previous = *self.last_sample.get_or_insert(device);
        self.last_sample = Some(device);

        Some(MotionSample {
            previous,
            azimuth: previous.x - device.x,
            elevation: previous.y - device.y,
            zoom: zoom_factor(previous.z - device.z),
        })
    }
}

/// Zoom multiplier for a device z delta (`previous - current`).
#[must_use]
pub fn zoom_factor(dz: f64) -> f64 {
    if dz <= -ZOOM_THRESHOLD {
        ZOOM_OUT
    } else if dz >= ZOOM_THRESHOLD {
        ZOOM_IN
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_evaluation_compares_against_itself() {
        let mut throttle = MotionThrottle::new();
        let p = DVec3::new(5.0, -3.0, 1.0);
        let s = throttle.evaluate(Instant::now(), p).unwrap();
        assert_eq!(s.previous, p);
        assert_eq!(s.azimuth, 0.0);
        assert_eq!(s.elevation, 0.0);
        assert_eq!(s.zoom, 1.0);
    }

    #[test]
    fn deltas_are_previous_minus_current() {
        let mut throttle = MotionThrottle::new();
        let t0 = Instant::now();
        let _ = throttle.evaluate(t0, DVec3::new(10.0, 10.0, 10.0));
        let s = throttle
            .evaluate(t0 + Duration::from_millis(20), DVec3::new(7.0, 12.0, 12.0))
            .unwrap();
        assert_eq!(s.azimuth, 3.0);
        assert_eq!(s.elevation, -2.0);
        assert_eq!(s.zoom, ZOOM_OUT);
    }

    #[test]
    fn zoom_thresholds_are_inclusive() {
        assert_eq!(zoom_factor(-1.2), ZOOM_OUT);
        assert_eq!(zoom_factor(1.2), ZOOM_IN);
        assert_eq!(zoom_factor(1.19), 1.0);
        assert_eq!(zoom_factor(-1.19), 1.0);
        assert_eq!(zoom_factor(0.0), 1.0);
    }

    #[test]
    fn suppressed_ticks_do_not_advance_last_sample() {
        let mut throttle = MotionThrottle::new();
        let t0 = Instant::now();
        let _ = throttle.evaluate(t0, DVec3::ZERO);
        assert!(throttle
            .evaluate(t0 + Duration::from_millis(5), DVec3::X)
            .is_none());
        let s = throttle
            .evaluate(t0 + Duration::from_millis(17), DVec3::new(2.0, 0.0, 0.0))
            .unwrap();
        assert_eq!(s.previous, DVec3::ZERO);
        assert_eq!(s.azimuth, -2.0);
    }

    #[test]
    fn at_most_sixty_evaluations_per_second() {
        let mut throttle = MotionThrottle::new();
        let t0 = Instant::now();
        let fired = (0..1000u64)
            .filter(|&ms| {
                let p = DVec3::new(ms as f64, 0.0, 0.0);
                throttle.evaluate(t0 + Duration::from_millis(ms), p).is_some()
            })
            .count();
        assert!(fired <= 60, "fired {fired}");
        assert!(fired >= 55, "fired {fired}");
    }
}
