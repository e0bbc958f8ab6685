//! Nearest-atom search and the containment rule that decides whether the
//! pointer has "grabbed" an atom.

use glam::DVec3;

use super::atom::AtomRecord;

/// The pointer selects its nearest atom when it is within this many
/// containment radii of the atom's center (inclusive).
pub const CONTAINMENT_MULTIPLIER: f64 = 3.0;

/// Result of a nearest-atom query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    /// Index of the nearest atom in the registry.
    pub index: usize,
    /// Id carried by that atom's record.
    pub atom_id: usize,
    /// Euclidean distance from the pointer to the atom's center.
    pub distance: f64,
    /// Whether the pointer lies within the containment threshold.
    pub contained: bool,
}

fn distance(atom: &AtomRecord, pointer: DVec3) -> f64 {
    let d = atom.position - pointer;
    (d.x * d.x + d.y * d.y + d.z * d.z).sqrt()
}

/// Index of the atom closest to `pointer`. Ties resolve to the lowest
/// index. `None` for an empty slice.
#[must_use]
pub fn find_nearest(atoms: &[AtomRecord], pointer: DVec3) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, atom) in atoms.iter().enumerate() {
        let d = distance(atom, pointer);
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((i, d));
        }
    }
    best.map(|(i, _)| i)
}

/// Nearest atom plus the containment decision.
#[must_use]
pub fn select(atoms: &[AtomRecord], pointer: DVec3) -> Option<Selection> {
    let index = find_nearest(atoms, pointer)?;
    let atom = &atoms[index];
    let distance = distance(atom, pointer);
    Some(Selection {
        index,
        atom_id: atom.id,
        distance,
        contained: distance <= CONTAINMENT_MULTIPLIER * atom.containment_radius,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atoms(points: &[DVec3]) -> Vec<AtomRecord> {
        points
            .iter()
            .enumerate()
            .map(|(i, p)| AtomRecord::new(i, *p, 1.0))
            .collect()
    }

    #[test]
    fn empty_registry_has_no_nearest() {
        assert_eq!(find_nearest(&[], DVec3::ZERO), None);
        assert_eq!(select(&[], DVec3::ZERO), None);
    }

    #[test]
    fn picks_minimum_distance() {
        let reg = atoms(&[
            DVec3::new(10.0, 0.0, 0.0),
            DVec3::new(0.0, 2.0, 0.0),
            DVec3::new(-5.0, -5.0, 0.0),
        ]);
        assert_eq!(find_nearest(&reg, DVec3::ZERO), Some(1));
        assert_eq!(find_nearest(&reg, DVec3::new(9.0, 0.0, 0.0)), Some(0));
        assert_eq!(find_nearest(&reg, DVec3::new(-4.0, -6.0, 1.0)), Some(2));
    }

    #[test]
    fn ties_resolve_to_lowest_index() {
        let reg = atoms(&[
            DVec3::new(0.0, 0.0, 3.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(-1.0, 0.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
        ]);
        assert_eq!(find_nearest(&reg, DVec3::ZERO), Some(1));
    }

    #[test]
    fn containment_boundary_is_inclusive() {
        let reg = atoms(&[DVec3::ZERO]);
        let on_edge = select(&reg, DVec3::new(3.0, 0.0, 0.0)).unwrap();
        assert!(on_edge.contained);
        assert_eq!(on_edge.atom_id, 0);

        let outside = select(&reg, DVec3::new(3.0001, 0.0, 0.0)).unwrap();
        assert!(!outside.contained);
        assert_eq!(outside.index, 0);
    }

    #[test]
    fn selection_reports_record_id() {
        let reg = vec![
            AtomRecord::new(0, DVec3::splat(50.0), 1.0),
            AtomRecord::new(1, DVec3::new(0.5, 0.0, 0.0), 0.2),
        ];
        let sel = select(&reg, DVec3::ZERO).unwrap();
        assert_eq!(sel.index, 1);
        assert_eq!(sel.atom_id, 1);
        assert!((sel.distance - 0.5).abs() < 1e-12);
        assert!(sel.contained);
    }
}
