// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Canonical mapping of field name → last validation result.

use std::collections::HashMap;

use crate::{Errors, FieldError};

/// A batch of error-slot writes: `Some(error)` overwrites the slot, `None` clears it.
pub type ErrorWrites = HashMap<String, Option<FieldError>>;

/// The canonical error store. Writes are direct per-slot overwrites, never merges of
/// the payload. An absent slot means "no recorded error" — indistinguishable from
/// "not yet validated", which is a deliberate simplification.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ErrorStore {
    map: Errors,
}

impl ErrorStore {
    /// Overwrite one slot. `None` clears it.
    pub fn set(&mut self, name: &str, error: Option<FieldError>) {
        match error {
            Some(error) => {
                self.map.insert(name.to_string(), error);
            }
            None => {
                self.map.remove(name);
            }
        }
    }

    /// Apply a batch of per-slot overwrites.
    pub fn apply(&mut self, writes: ErrorWrites) {
        for (name, error) in writes {
            self.set(&name, error);
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldError> { self.map.get(name) }

    pub fn snapshot(&self) -> Errors { self.map.clone() }

    pub fn subset(&self, names: &[String]) -> Errors {
        names
            .iter()
            .filter_map(|name| {
                self.map
                    .get(name)
                    .map(|error| (name.clone(), error.clone()))
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool { self.map.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValidationError;

    fn field_error(field: &str) -> FieldError {
        FieldError {
            errors: vec![ValidationError {
                message: "message".to_string(),
                field: field.to_string(),
                field_value: None,
            }],
            rules: vec![],
        }
    }

    #[test]
    fn test_set_overwrites_instead_of_merging() {
        let mut store = ErrorStore::default();
        store.set("a", Some(field_error("a")));
        store.set("a", Some(field_error("a2")));

        let recorded = store.get("a").unwrap();
        assert_eq!(recorded.errors[0].field, "a2");
    }

    #[test]
    fn test_clearing_a_slot_makes_it_absent() {
        let mut store = ErrorStore::default();
        store.set("a", Some(field_error("a")));
        store.set("a", None);

        assert_eq!(store.get("a"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_subset_contains_only_recorded_errors() {
        let mut store = ErrorStore::default();
        store.set("a", Some(field_error("a")));

        let sub = store.subset(&["a".to_string(), "b".to_string()]);
        assert_eq!(sub.len(), 1);
        assert!(sub.contains_key("a"));
    }
}
