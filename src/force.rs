//! Gradient-driven restoring force with safety clamping.
//!
//! The force is nonzero only while the application has gradient computation
//! enabled **and** the secondary button is held. Dropping either condition
//! zeroes the output on the very next tick; there is no decay.

use glam::DVec3;

/// Spring constant applied to the gradient offset.
pub const STIFFNESS: f64 = 0.8;

/// Everything the force model needs for one tick, in device space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceInputs {
    /// Application has gradient computation switched on.
    pub gradient_enabled: bool,
    /// Secondary button is latched down.
    pub secondary_held: bool,
    /// Selected atom center.
    pub atom: DVec3,
    /// Selected atom gradient (zero if unselected or absent).
    pub gradient: DVec3,
    /// Device-reported maximum continuous force.
    pub max_force: f64,
}

/// Compute the force to write to the device this tick.
///
/// Returns [`DVec3::ZERO`] whenever the force is not active, and also when
/// the inputs would produce a non-finite force.
#[must_use]
pub fn compute_force(inputs: &ForceInputs) -> DVec3 {
    if !(inputs.gradient_enabled && inputs.secondary_held) {
        return DVec3::ZERO;
    }

    let target = inputs.atom - inputs.gradient;
    let force = (target - inputs.atom) * STIFFNESS;
    let clamped = clamp_magnitude(force, inputs.max_force);

    if clamped.is_finite() {
        clamped
    } else {
        DVec3::ZERO
    }
}

/// Rescale `force` to `max` if its length exceeds it.
#[must_use]
pub fn clamp_magnitude(force: DVec3, max: f64) -> DVec3 {
    if !max.is_finite() || max <= 0.0 {
        return DVec3::ZERO;
    }
    if force.length() > max {
        force.normalize_or_zero() * max
    } else {
        force
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(enabled: bool, held: bool, gradient: DVec3) -> ForceInputs {
        ForceInputs {
            gradient_enabled: enabled,
            secondary_held: held,
            atom: DVec3::new(3.0, -1.0, 2.0),
            gradient,
            max_force: 3.3,
        }
    }

    #[test]
    fn inactive_force_is_exactly_zero() {
        for g in [DVec3::ZERO, DVec3::splat(1.0), DVec3::splat(1e12)] {
            assert_eq!(compute_force(&inputs(false, false, g)), DVec3::ZERO);
            assert_eq!(compute_force(&inputs(true, false, g)), DVec3::ZERO);
            assert_eq!(compute_force(&inputs(false, true, g)), DVec3::ZERO);
        }
    }

    #[test]
    fn active_force_opposes_gradient() {
        let f = compute_force(&inputs(true, true, DVec3::new(1.0, 0.0, -0.5)));
        assert!((f - DVec3::new(-0.8, 0.0, 0.4)).length() < 1e-12);
    }

    #[test]
    fn zero_gradient_gives_zero_force() {
        assert_eq!(compute_force(&inputs(true, true, DVec3::ZERO)), DVec3::ZERO);
    }

    #[test]
    fn clamp_never_exceeds_max() {
        for scale in [1.0, 10.0, 1e3, 1e9, 1e150] {
            let g = DVec3::new(0.3, -2.0, 1.1) * scale;
            let f = compute_force(&inputs(true, true, g));
            assert!(f.length() <= 3.3 + 1e-9, "{scale}: {}", f.length());
        }
    }

    #[test]
    fn clamp_keeps_direction() {
        let f = clamp_magnitude(DVec3::new(0.0, 30.0, 40.0), 5.0);
        assert!((f - DVec3::new(0.0, 3.0, 4.0)).length() < 1e-12);
    }

    #[test]
    fn non_finite_inputs_yield_zero() {
        let g = DVec3::new(f64::NAN, 0.0, 0.0);
        assert_eq!(compute_force(&inputs(true, true, g)), DVec3::ZERO);
        assert_eq!(clamp_magnitude(DVec3::X, f64::NAN), DVec3::ZERO);
    }
}
