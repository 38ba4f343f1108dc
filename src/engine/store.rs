//! Change Store - last-sent property snapshot of one node.
//!
//! The render pipeline compares each live property against the preserved
//! value and only sends what differs. A missing entry compares unequal to
//! every live value, so the first cycle treats every property as changed.

use crate::types::{PropValue, PropertyMap};

/// Per-node map from property name to the value last sent to the client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeStore {
    preserved: PropertyMap,
}

impl ChangeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `name`, replacing any earlier entry.
    pub fn preserve(&mut self, name: &str, value: PropValue) {
        self.preserved.insert(name.to_string(), value);
    }

    /// Preserved value, or `None` when nothing was stored under `name`.
    pub fn get_preserved(&self, name: &str) -> Option<&PropValue> {
        self.preserved.get(name)
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.preserved.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.preserved.is_empty()
    }

    pub fn len(&self) -> usize {
        self.preserved.len()
    }

    /// True when `live` differs from the preserved value (absent counts as different).
    pub fn has_changed(&self, name: &str, live: &PropValue) -> bool {
        self.get_preserved(name) != Some(live)
    }

    /// Live properties whose value differs from the snapshot, in name order.
    pub fn changed(&self, live: &PropertyMap) -> PropertyMap {
        live.iter()
            .filter(|(name, value)| self.has_changed(name, value))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Advance the snapshot to `values`.
    pub fn preserve_all(&mut self, values: &PropertyMap) {
        for (name, value) in values {
            self.preserve(name, value.clone());
        }
    }
}
