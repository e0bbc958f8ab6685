use glam::DVec3;

use crate::error::BridgeError;

/// Per-atom gradient vectors in application space, indexed by atom id.
///
/// The table may be shorter than the atom registry; missing entries read as
/// zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GradientTable {
    vectors: Vec<DVec3>,
}

impl GradientTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gradient for `atom_id`, or zero past the end of the table.
    #[must_use]
    pub fn lookup(&self, atom_id: usize) -> DVec3 {
        self.vectors.get(atom_id).copied().unwrap_or(DVec3::ZERO)
    }

    /// Check a flat `[gx, gy, gz, gx, gy, gz, ...]` list before applying it.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidGradient`] if the length is not a
    /// multiple of three or a value is not finite.
    pub fn validate_flat(values: &[f64]) -> Result<(), BridgeError> {
        if values.len() % 3 != 0 {
            return Err(BridgeError::InvalidGradient(format!(
                "expected a multiple of 3 values, got {}",
                values.len()
            )));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(BridgeError::InvalidGradient(format!(
                "non-finite component for atom {}",
                pos / 3
            )));
        }
        Ok(())
    }

    /// Overwrite the leading entries from a flat triple list, growing the
    /// table when the list is longer. Entries past the list are kept.
    pub fn apply_flat(&mut self, values: &[f64]) {
        let count = values.len() / 3;
        if self.vectors.len() < count {
            self.vectors.resize(count, DVec3::ZERO);
        }
        for (slot, chunk) in self.vectors.iter_mut().zip(values.chunks_exact(3)) {
            *slot = DVec3::new(chunk[0], chunk[1], chunk[2]);
        }
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.vectors.clear();
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Copy the table into `out`, reusing its allocation.
    pub fn snapshot_into(&self, out: &mut Self) {
        out.vectors.clone_from(&self.vectors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_past_end_is_zero() {
        let mut table = GradientTable::new();
        assert_eq!(table.lookup(0), DVec3::ZERO);
        table.apply_flat(&[1.0, 2.0, 3.0]);
        assert_eq!(table.lookup(0), DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(table.lookup(1), DVec3::ZERO);
        assert_eq!(table.lookup(usize::MAX), DVec3::ZERO);
    }

    #[test]
    fn apply_grows_and_keeps_tail() {
        let mut table = GradientTable::new();
        table.apply_flat(&[1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 3.0, 3.0]);
        assert_eq!(table.len(), 3);

        table.apply_flat(&[9.0, 9.0, 9.0]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.lookup(0), DVec3::splat(9.0));
        assert_eq!(table.lookup(2), DVec3::splat(3.0));
    }

    #[test]
    fn validate_flat_checks_shape_and_values() {
        assert!(GradientTable::validate_flat(&[]).is_ok());
        assert!(GradientTable::validate_flat(&[0.0; 6]).is_ok());
        assert!(GradientTable::validate_flat(&[0.0; 4]).is_err());
        assert!(
            GradientTable::validate_flat(&[0.0, 0.0, 0.0, f64::NAN, 0.0, 0.0])
                .is_err()
        );
    }
}
