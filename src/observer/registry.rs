//! Handle-based observer registration.

use std::sync::Arc;

use super::HapticObserver;

/// Opaque handle returned by registration, used to detach an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

/// Immutable, cheaply clonable view of the registered observers.
pub type ObserverSet = Arc<[Arc<dyn HapticObserver>]>;

/// Insertion-ordered observer collection with copy-on-write snapshots.
///
/// The servo thread only ever takes a [`snapshot`](Self::snapshot), which is
/// a reference-count bump; registration and removal rebuild the snapshot on
/// the caller's thread.
pub struct ObserverRegistry {
    next_id: u64,
    entries: Vec<(ObserverId, Arc<dyn HapticObserver>)>,
    snapshot: ObserverSet,
}

impl Default for ObserverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ObserverRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
            snapshot: Arc::new([]),
        }
    }

    /// Append an observer and return its handle.
    pub fn register(&mut self, observer: Arc<dyn HapticObserver>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, observer));
        self.rebuild();
        id
    }

    /// Remove the observer registered under `id`. Returns `false` if the
    /// handle is unknown or was already removed.
    pub fn unregister(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        let removed = self.entries.len() != before;
        if removed {
            self.rebuild();
        }
        removed
    }

    /// Number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no observers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current observers in registration order.
    #[must_use]
    pub fn snapshot(&self) -> ObserverSet {
        Arc::clone(&self.snapshot)
    }

    fn rebuild(&mut self) {
        self.snapshot = self
            .entries
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::testing::Recorder;

    #[test]
    fn register_preserves_order_and_unique_ids() {
        let mut registry = ObserverRegistry::new();
        let a: Arc<dyn HapticObserver> = Arc::new(Recorder::default());
        let b: Arc<dyn HapticObserver> = Arc::new(Recorder::default());
        let id_a = registry.register(Arc::clone(&a));
        let id_b = registry.register(Arc::clone(&b));

        assert_ne!(id_a, id_b);
        let snap = registry.snapshot();
        assert_eq!(snap.len(), 2);
        assert!(Arc::ptr_eq(&snap[0], &a));
        assert!(Arc::ptr_eq(&snap[1], &b));
    }

    #[test]
    fn unregister_removes_once() {
        let mut registry = ObserverRegistry::new();
        let id = registry.register(Arc::new(Recorder::default()));
        let keep = registry.register(Arc::new(Recorder::default()));

        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.snapshot().len(), 1);

        assert!(registry.unregister(keep));
        assert!(registry.is_empty());
        assert!(registry.snapshot().is_empty());
    }

    #[test]
    fn old_snapshots_are_unaffected_by_changes() {
        let mut registry = ObserverRegistry::new();
        let id = registry.register(Arc::new(Recorder::default()));
        let before = registry.snapshot();
        assert!(registry.unregister(id));
        assert_eq!(before.len(), 1);
        assert!(registry.snapshot().is_empty());
    }
}
