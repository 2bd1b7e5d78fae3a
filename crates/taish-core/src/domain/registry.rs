//! Location registry: which module lives in which physical slot.

use std::collections::HashMap;

use crate::api::ObjectId;

/// Bidirectional `location <-> module id` map that remembers insertion order.
///
/// `module_list` prints entries in the order modules were discovered, so the
/// entries are kept in a `Vec`; the two `HashMap`s index into it for O(1)
/// lookup in both directions.  A location maps to at most one module.
#[derive(Debug, Default)]
pub struct LocationRegistry {
    entries: Vec<(String, ObjectId)>,
    by_location: HashMap<String, usize>,
    by_module: HashMap<ObjectId, usize>,
}

impl LocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `module` sits at `location`.
    ///
    /// Returns `false` and leaves the registry untouched if either the
    /// location or the module id is already registered.
    pub fn insert(&mut self, location: &str, module: ObjectId) -> bool {
        if self.by_location.contains_key(location) || self.by_module.contains_key(&module) {
            return false;
        }
        let slot = self.entries.len();
        self.entries.push((location.to_string(), module));
        self.by_location.insert(location.to_string(), slot);
        self.by_module.insert(module, slot);
        true
    }

    pub fn module_at(&self, location: &str) -> Option<ObjectId> {
        self.by_location.get(location).map(|&i| self.entries[i].1)
    }

    pub fn location_of(&self, module: ObjectId) -> Option<&str> {
        self.by_module.get(&module).map(|&i| self.entries[i].0.as_str())
    }

    pub fn contains_location(&self, location: &str) -> bool {
        self.by_location.contains_key(location)
    }

    /// Entries in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ObjectId)> {
        self.entries.iter().map(|(loc, id)| (loc.as_str(), *id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
