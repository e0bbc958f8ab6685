//! Affine conversion between the haptic device frame and the application
//! frame.
//!
//! The device reports positions in its own native frame. The camera layer
//! supplies a forward matrix (device → application) and its inverse, and the
//! bridge applies a fixed scale factor on top: application coordinates are
//! `forward · device / scale`, device coordinates are
//! `inverse · (application · scale)`.
//!
//! Only the upper 3×4 block of each matrix is used; the bottom row is
//! assumed to be `[0, 0, 0, 1]`.

use glam::{DMat4, DVec3};

use crate::error::BridgeError;

/// Forward and inverse camera transforms, replaced together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformPair {
    /// Device space → application space.
    pub forward: DMat4,
    /// Application space → device space.
    pub inverse: DMat4,
}

impl Default for TransformPair {
    fn default() -> Self {
        Self {
            forward: DMat4::IDENTITY,
            inverse: DMat4::IDENTITY,
        }
    }
}

impl TransformPair {
    /// Pair two matrices without checking them.
    #[must_use]
    pub fn new(forward: DMat4, inverse: DMat4) -> Self {
        Self { forward, inverse }
    }

    /// Build a pair from a forward matrix, computing the inverse.
    #[must_use]
    pub fn from_forward(forward: DMat4) -> Self {
        Self {
            forward,
            inverse: forward.inverse(),
        }
    }

    /// Build a pair from two flat row-major 4×4 matrices (16 values each),
    /// the layout camera toolkits usually hand out.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidTransform`] if either slice does not
    /// hold exactly 16 values.
    pub fn from_row_major(
        forward: &[f64],
        inverse: &[f64],
    ) -> Result<Self, BridgeError> {
        Ok(Self {
            forward: row_major_to_mat4("forward", forward)?,
            inverse: row_major_to_mat4("inverse", inverse)?,
        })
    }

    /// Check that both matrices are finite and mutually inverse within
    /// `tolerance` (max absolute element deviation of `forward · inverse`
    /// from identity).
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidTransform`] describing the first
    /// violated condition.
    pub fn validate(&self, tolerance: f64) -> Result<(), BridgeError> {
        if !self.forward.is_finite() || !self.inverse.is_finite() {
            return Err(BridgeError::InvalidTransform(
                "matrix contains non-finite values".to_owned(),
            ));
        }
        let product = self.forward * self.inverse;
        if !product.abs_diff_eq(DMat4::IDENTITY, tolerance) {
            return Err(BridgeError::InvalidTransform(format!(
                "forward and inverse are not mutual inverses \
                 (tolerance {tolerance})"
            )));
        }
        Ok(())
    }
}

fn row_major_to_mat4(
    which: &str,
    values: &[f64],
) -> Result<DMat4, BridgeError> {
    let array: [f64; 16] = values.try_into().map_err(|_| {
        BridgeError::InvalidTransform(format!(
            "{which} matrix needs 16 values, got {}",
            values.len()
        ))
    })?;
    // glam is column-major: reading rows as columns yields the transpose.
    Ok(DMat4::from_cols_array(&array).transpose())
}

/// Map a raw device position into application space.
#[must_use]
pub fn to_application_space(
    device: DVec3,
    forward: &DMat4,
    scale: f64,
) -> DVec3 {
    forward.transform_point3(device) / scale
}

/// Map an application-space position into device space.
#[must_use]
pub fn to_device_space(app: DVec3, inverse: &DMat4, scale: f64) -> DVec3 {
    inverse.transform_point3(app * scale)
}

/// Map an application-space free vector (no translation) into device
/// space.
#[must_use]
pub fn to_device_direction(
    app_vector: DVec3,
    inverse: &DMat4,
    scale: f64,
) -> DVec3 {
    inverse.transform_vector3(app_vector * scale)
}

#[cfg(test)]
mod tests {
    use glam::DQuat;

    use super::*;

    fn rigid_pair() -> TransformPair {
        let forward = DMat4::from_rotation_translation(
            DQuat::from_rotation_y(0.7) * DQuat::from_rotation_x(-0.3),
            DVec3::new(4.0, -2.0, 9.5),
        );
        TransformPair::from_forward(forward)
    }

    #[test]
    fn identity_round_trip_is_exact() {
        let pair = TransformPair::default();
        for p in [
            DVec3::ZERO,
            DVec3::new(1.5, -2.25, 3.0),
            DVec3::new(-120.0, 45.5, 0.001),
        ] {
            let app = to_application_space(p, &pair.forward, 1.0);
            let back = to_device_space(app, &pair.inverse, 1.0);
            assert!((back - p).length() < 1e-12);
        }
    }

    #[test]
    fn scale_divides_on_the_way_in() {
        let pair = TransformPair::default();
        let app =
            to_application_space(DVec3::new(10.0, 20.0, -30.0), &pair.forward, 10.0);
        assert!((app - DVec3::new(1.0, 2.0, -3.0)).length() < 1e-12);
        let device = to_device_space(app, &pair.inverse, 10.0);
        assert!((device - DVec3::new(10.0, 20.0, -30.0)).length() < 1e-12);
    }

    #[test]
    fn rigid_transform_round_trip() {
        let pair = rigid_pair();
        let p = DVec3::new(-33.0, 12.0, 70.0);
        let app = to_application_space(p, &pair.forward, 10.0);
        let back = to_device_space(app, &pair.inverse, 10.0);
        assert!((back - p).length() < 1e-9);
    }

    #[test]
    fn direction_ignores_translation() {
        let pair = TransformPair::from_forward(DMat4::from_translation(
            DVec3::new(100.0, 100.0, 100.0),
        ));
        let v = to_device_direction(DVec3::X, &pair.inverse, 2.0);
        assert!((v - DVec3::new(2.0, 0.0, 0.0)).length() < 1e-12);
        assert_eq!(
            to_device_direction(DVec3::ZERO, &pair.inverse, 10.0),
            DVec3::ZERO
        );
    }

    #[test]
    fn row_major_layout_puts_translation_in_last_column() {
        let forward = [
            1.0, 0.0, 0.0, 5.0, //
            0.0, 1.0, 0.0, 6.0, //
            0.0, 0.0, 1.0, 7.0, //
            0.0, 0.0, 0.0, 1.0,
        ];
        let inverse = [
            1.0, 0.0, 0.0, -5.0, //
            0.0, 1.0, 0.0, -6.0, //
            0.0, 0.0, 1.0, -7.0, //
            0.0, 0.0, 0.0, 1.0,
        ];
        let pair = TransformPair::from_row_major(&forward, &inverse).unwrap();
        let app = to_application_space(DVec3::ZERO, &pair.forward, 1.0);
        assert_eq!(app, DVec3::new(5.0, 6.0, 7.0));
        pair.validate(1e-9).unwrap();
    }

    #[test]
    fn row_major_rejects_wrong_length() {
        let err = TransformPair::from_row_major(&[1.0; 15], &[1.0; 16])
            .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidTransform(_)));
    }

    #[test]
    fn validate_rejects_non_inverse_pair() {
        let pair = TransformPair::new(
            DMat4::from_scale(DVec3::splat(2.0)),
            DMat4::IDENTITY,
        );
        assert!(pair.validate(1e-6).is_err());
        assert!(rigid_pair().validate(1e-9).is_ok());
    }

    #[test]
    fn validate_rejects_nan() {
        let mut pair = TransformPair::default();
        pair.forward.x_axis.x = f64::NAN;
        assert!(pair.validate(1e-6).is_err());
    }
}
