// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Canonical mapping of field name → current value, with merge-based mutation.

use std::collections::HashMap;

/// Values are heterogeneous (strings, numbers, booleans, nested structures), so the
/// canonical representation is [`serde_json::Value`].
pub type FieldValue = serde_json::Value;

/// A full or partial snapshot of the value map. Keys simply absent mean "no recorded
/// value".
pub type Stores = HashMap<String, FieldValue>;

/// A batch of slot writes: `Some(value)` writes the slot, `None` resets it to absent.
/// This is the shape every mutation funnels through, so value-resets (registration,
/// deregistration, reset) ride the same path as ordinary writes.
pub type SlotWrites = HashMap<String, Option<FieldValue>>;

/// The canonical value store. Writes are merges: new writes never delete existing
/// unrelated keys. Keys are pruned only by an explicit absent-valued write.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValueStore {
    map: Stores,
}

impl ValueStore {
    /// Merge a batch of slot writes into the store. Absent-valued entries reset the
    /// slot. The merge is observable immediately and synchronously.
    pub fn merge(&mut self, writes: &SlotWrites) {
        for (name, maybe_value) in writes {
            match maybe_value {
                Some(value) => {
                    self.map.insert(name.clone(), value.clone());
                }
                None => {
                    self.map.remove(name);
                }
            }
        }
    }

    /// Scalar read. `None` for unknown keys, never an error.
    pub fn get(&self, name: &str) -> Option<&FieldValue> { self.map.get(name) }

    /// The full snapshot.
    pub fn snapshot(&self) -> Stores { self.map.clone() }

    /// Restricted sub-map keyed by only the given names; names with no recorded
    /// value are simply absent from the result.
    pub fn subset(&self, names: &[String]) -> Stores {
        names
            .iter()
            .filter_map(|name| {
                self.map
                    .get(name)
                    .map(|value| (name.clone(), value.clone()))
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool { self.map.is_empty() }

    pub fn len(&self) -> usize { self.map.len() }
}
