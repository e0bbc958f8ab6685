//! Live molecule state mirrored from the application: atom records, the
//! per-atom gradient field, and nearest-atom selection.

/// Atom records and the ordered registry.
pub mod atom;
/// Per-atom gradient vectors.
pub mod gradient;
pub mod selection;

pub use atom::{AtomRecord, AtomRegistry};
pub use gradient::GradientTable;
pub use selection::{find_nearest, select, Selection, CONTAINMENT_MULTIPLIER};
