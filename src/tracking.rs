//! Runtime half of the change-tracking capability for Rust types processed
//! by `#[dirty_tracked]`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Names of the properties changed since tracking (re)started.
///
/// `None` means tracking is not active and every property counts as changed,
/// which is the state of a freshly constructed value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirtySet {
    changed: Option<BTreeSet<String>>,
}

impl DirtySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty set with tracking active.
    pub fn tracking() -> Self {
        Self {
            changed: Some(BTreeSet::new()),
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.changed.is_some()
    }

    pub fn mark(&mut self, property: &str) {
        if let Some(changed) = self.changed.as_mut() {
            changed.insert(property.to_string());
        }
    }

    pub fn mark_all(&mut self) {
        self.changed = None;
    }

    pub fn reset(&mut self) {
        self.changed = Some(BTreeSet::new());
    }

    pub fn contains(&self, property: &str) -> bool {
        match &self.changed {
            Some(changed) => changed.contains(property),
            None => true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changed.as_ref().is_some_and(BTreeSet::is_empty)
    }

    pub fn names(&self) -> Vec<String> {
        self.changed
            .as_ref()
            .map(|changed| changed.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// Change-tracking capability. Implementors only expose their `DirtySet`;
/// everything else is provided.
pub trait DirtyTracking {
    fn dirty_state(&self) -> &DirtySet;

    fn dirty_state_mut(&mut self) -> &mut DirtySet;

    /// Records that `property` is about to take `new_value`.
    fn mark_dirty<V: ?Sized>(&mut self, property: &str, _new_value: &V) {
        self.dirty_state_mut().mark(property);
    }

    fn mark_all_dirty(&mut self) {
        self.dirty_state_mut().mark_all();
    }

    /// Starts (or restarts) tracking with a clean set.
    fn track_changes(&mut self) {
        self.dirty_state_mut().reset();
    }

    fn has_changed(&self) -> bool {
        !self.dirty_state().is_empty()
    }

    fn has_property_changed(&self, property: &str) -> bool {
        self.dirty_state().contains(property)
    }

    fn dirty_property_names(&self) -> Vec<String> {
        self.dirty_state().names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Wallet {
        dirty: DirtySet,
    }

    impl DirtyTracking for Wallet {
        fn dirty_state(&self) -> &DirtySet {
            &self.dirty
        }

        fn dirty_state_mut(&mut self) -> &mut DirtySet {
            &mut self.dirty
        }
    }

    #[test]
    fn untracked_value_counts_as_changed() {
        let wallet = Wallet::default();
        assert!(wallet.has_changed());
        assert!(wallet.has_property_changed("anything"));
        assert!(wallet.dirty_property_names().is_empty());
    }

    #[test]
    fn tracking_records_marked_properties_only() {
        let mut wallet = Wallet::default();
        wallet.track_changes();
        assert!(!wallet.has_changed());

        wallet.mark_dirty("balance", &10_u32);
        wallet.mark_dirty("balance", &11_u32);
        wallet.mark_dirty("owner", "alice");

        assert!(wallet.has_property_changed("balance"));
        assert!(!wallet.has_property_changed("status"));
        assert_eq!(wallet.dirty_property_names(), vec!["balance", "owner"]);

        wallet.mark_all_dirty();
        assert!(wallet.has_property_changed("status"));
    }
}
