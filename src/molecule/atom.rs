use glam::DVec3;

use crate::error::BridgeError;

/// One atom as the haptic loop sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtomRecord {
    /// Atom id. Equal to the record's index in the registry.
    pub id: usize,
    /// Center in application space.
    pub position: DVec3,
    /// Distance from the center to the atom's edge; the pointer counts as
    /// inside the atom's reach within a multiple of this.
    pub containment_radius: f64,
}

impl AtomRecord {
    /// Create a record.
    #[must_use]
    pub fn new(id: usize, position: DVec3, containment_radius: f64) -> Self {
        Self {
            id,
            position,
            containment_radius,
        }
    }

    /// Reject non-finite coordinates and negative or non-finite radii.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidAtom`] naming the offending field.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if !self.position.is_finite() {
            return Err(BridgeError::InvalidAtom(format!(
                "atom {} has a non-finite position",
                self.id
            )));
        }
        if !self.containment_radius.is_finite() || self.containment_radius < 0.0
        {
            return Err(BridgeError::InvalidAtom(format!(
                "atom {} has invalid containment radius {}",
                self.id, self.containment_radius
            )));
        }
        Ok(())
    }
}

/// Ordered atom collection. Ids are positional and are not checked here;
/// the bridge validates them at its entry points.
#[derive(Debug, Clone, Default)]
pub struct AtomRegistry {
    atoms: Vec<AtomRecord>,
}

impl AtomRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every atom.
    pub fn clear(&mut self) {
        self.atoms.clear();
    }

    /// Append a record.
    pub fn push(&mut self, atom: AtomRecord) {
        self.atoms.push(atom);
    }

    /// Replace the record at `atom.id`. Returns `false` if no record has
    /// that index.
    pub fn replace(&mut self, atom: AtomRecord) -> bool {
        match self.atoms.get_mut(atom.id) {
            Some(slot) => {
                *slot = atom;
                true
            }
            None => false,
        }
    }

    /// Number of atoms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    /// Whether the registry holds no atoms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Borrow the records in registry order.
    #[must_use]
    pub fn as_slice(&self) -> &[AtomRecord] {
        &self.atoms
    }

    /// Copy the records into `out`, reusing its allocation.
    pub fn snapshot_into(&self, out: &mut Vec<AtomRecord>) {
        out.clone_from(&self.atoms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_by_id() {
        let mut reg = AtomRegistry::new();
        reg.push(AtomRecord::new(0, DVec3::ZERO, 1.0));
        reg.push(AtomRecord::new(1, DVec3::X, 1.0));

        assert!(reg.replace(AtomRecord::new(1, DVec3::Y, 0.5)));
        assert_eq!(reg.as_slice()[1].position, DVec3::Y);
        assert_eq!(reg.as_slice()[1].containment_radius, 0.5);
        assert!(!reg.replace(AtomRecord::new(2, DVec3::Z, 1.0)));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn snapshot_reuses_buffer() {
        let mut reg = AtomRegistry::new();
        for i in 0..4 {
            reg.push(AtomRecord::new(i, DVec3::splat(i as f64), 1.0));
        }
        let mut out = Vec::with_capacity(16);
        reg.snapshot_into(&mut out);
        assert_eq!(out.as_slice(), reg.as_slice());
        assert!(out.capacity() >= 16);

        reg.clear();
        reg.snapshot_into(&mut out);
        assert!(out.is_empty());
        assert!(reg.is_empty());
    }

    #[test]
    fn validate_rejects_bad_records() {
        assert!(AtomRecord::new(0, DVec3::ZERO, 1.0).validate().is_ok());
        assert!(AtomRecord::new(0, DVec3::ZERO, 0.0).validate().is_ok());
        assert!(AtomRecord::new(0, DVec3::ZERO, -1.0).validate().is_err());
        assert!(AtomRecord::new(0, DVec3::ZERO, f64::NAN).validate().is_err());
        assert!(AtomRecord::new(0, DVec3::new(f64::INFINITY, 0.0, 0.0), 1.0)
            .validate()
            .is_err());
    }
}
