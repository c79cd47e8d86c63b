// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Field descriptors (declarative identity, owned by the view layer) and field
//! entities (the live registration records, owned by the registry).

use std::{fmt::{Debug, Formatter},
          sync::Arc};

use crate::{CommonResult, FieldError, FieldValue, RuleSpec, RuleValidator,
            ValidateRequest};

/// Per-field notification hook: the engine calls this with the field's name whenever
/// that field's value slot changes, signaling the view layer to re-render it.
pub type OnStoreChangeFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Declarative identity of a field, handed to the engine at registration time and
/// treated as immutable per registration. Changing a descriptor requires signing the
/// field out and back in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldDescriptor {
    /// Registration identity. Descriptors without a name are benign no-ops at
    /// sign-in: the engine never stores them.
    pub name: Option<String>,

    /// Rule list passed through to the external validator.
    pub rules: Vec<RuleSpec>,

    /// Stop at the first failing rule for this field (validator-side short circuit).
    pub validate_first: bool,

    /// Receive [`OnStoreChangeFn`] notifications even when this field is not the one
    /// whose value changed. Such notifications carry no touched/validate side effects.
    pub should_update: bool,
}

impl FieldDescriptor {
    pub fn named(name: impl Into<String>) -> FieldDescriptor {
        FieldDescriptor {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_rules(mut self, rules: Vec<RuleSpec>) -> FieldDescriptor {
        self.rules = rules;
        self
    }

    pub fn with_validate_first(mut self, validate_first: bool) -> FieldDescriptor {
        self.validate_first = validate_first;
        self
    }

    pub fn with_should_update(mut self, should_update: bool) -> FieldDescriptor {
        self.should_update = should_update;
        self
    }
}

/// The live registration record for one field.
///
/// Created on mount, owned exclusively by the registry, destroyed on unmount. The
/// only mutation after registration is the `touched` bit.
#[derive(Clone)]
pub struct FieldEntity {
    pub descriptor: FieldDescriptor,

    /// Whether this field's value has been written to at least once since
    /// registration (initial-value injection excluded).
    pub touched: bool,

    pub on_store_change: OnStoreChangeFn,
}

impl FieldEntity {
    pub fn new(
        descriptor: FieldDescriptor,
        on_store_change: impl Fn(&str) + Send + Sync + 'static,
    ) -> FieldEntity {
        FieldEntity {
            descriptor,
            touched: false,
            on_store_change: Arc::new(on_store_change),
        }
    }

    /// An entity with a no-op change hook, for callers that poll instead of listening.
    pub fn silent(descriptor: FieldDescriptor) -> FieldEntity {
        FieldEntity::new(descriptor, |_| {})
    }

    pub fn name(&self) -> Option<&str> { self.descriptor.name.as_deref() }

    /// Compose the external-validator request for this field given a value snapshot.
    /// `None` when the entity is unnamed (there is nothing addressable to validate).
    pub fn validate_request(&self, value: Option<FieldValue>) -> Option<ValidateRequest> {
        let name = self.name()?;
        Some(ValidateRequest {
            name: name.to_string(),
            value,
            rules: self.descriptor.rules.clone(),
            validate_first: self.descriptor.validate_first,
        })
    }

    /// Validate this field against the given validator. Unnamed entities trivially
    /// pass. Structured failures come back as `Ok(Some(_))`; only a validator failure
    /// that is not shaped like a validation failure produces `Err`.
    pub async fn validate(
        &self,
        value: Option<FieldValue>,
        validator: &dyn RuleValidator,
    ) -> CommonResult<Option<FieldError>> {
        match self.validate_request(value) {
            Some(request) => validator.validate(request).await,
            None => Ok(None),
        }
    }
}

mod debug_helpers {
    use super::*;

    impl Debug for FieldEntity {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("FieldEntity")
                .field("descriptor", &self.descriptor)
                .field("touched", &self.touched)
                .finish_non_exhaustive()
        }
    }
}
