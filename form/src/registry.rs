// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The field registry: live registration records, uniqueness by name,
//! first-registration-wins.

use crate::FieldEntity;

/// Holds the live [`FieldEntity`] records in registration order.
///
/// Uniqueness is by name: a second registration under an existing name is rejected
/// (the new entity is discarded) — **first registration wins**. This means a
/// remounted field with updated rules will not take effect while the older entity is
/// still registered; callers that need a descriptor change must deregister first.
#[derive(Debug, Default)]
pub struct FieldRegistry {
    entities: Vec<FieldEntity>,
}

impl FieldRegistry {
    /// Add an entity. Returns `false` (and drops the entity) when it is unnamed or a
    /// field with the same name is already registered.
    pub fn register(&mut self, entity: FieldEntity) -> bool {
        let Some(name) = entity.name() else {
            return false;
        };
        if self.contains(name) {
            tracing::debug!(
                message = "field registry: duplicate registration dropped",
                name
            );
            return false;
        }
        tracing::debug!(message = "field registry: field registered", name);
        self.entities.push(entity);
        true
    }

    /// Remove the entity registered under `name`. Returns `false` when nothing was
    /// registered under that name (benign no-op; double-deregistration included).
    pub fn deregister(&mut self, name: &str) -> bool {
        let before = self.entities.len();
        self.entities.retain(|entity| entity.name() != Some(name));
        let removed = self.entities.len() != before;
        if removed {
            tracing::debug!(message = "field registry: field deregistered", name);
        }
        removed
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entities.iter().any(|entity| entity.name() == Some(name))
    }

    pub fn get(&self, name: &str) -> Option<&FieldEntity> {
        self.entities.iter().find(|entity| entity.name() == Some(name))
    }

    /// Set exactly one field's touched bit. No-op on unknown names.
    pub fn set_touched(&mut self, name: &str, touched: bool) {
        if let Some(entity) = self
            .entities
            .iter_mut()
            .find(|entity| entity.name() == Some(name))
        {
            entity.touched = touched;
        }
    }

    /// Registered field names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.entities
            .iter()
            .filter_map(|entity| entity.name().map(str::to_string))
            .collect()
    }

    /// The live entities, in registration order.
    pub fn entities(&self) -> &[FieldEntity] { &self.entities }

    pub fn len(&self) -> usize { self.entities.len() }

    pub fn is_empty(&self) -> bool { self.entities.is_empty() }
}
