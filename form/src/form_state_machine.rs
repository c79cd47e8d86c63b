// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The synchronous half of the engine: all mutable state lives here, behind the
//! shared lock owned by [`Form`](crate::Form).
//!
//! Methods on [`FormStateMachine`] never await. Each one runs to completion under
//! the caller's lock, so every store mutation is atomic from the caller's
//! perspective; the async half (validator calls, change-hook invocation) happens in
//! [`Form`](crate::Form) after the lock is released.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::{ErrorStore, Errors, FieldRegistry, OnStoreChangeFn, SlotWrites, Stores,
            ValidateRequest, ValueStore};

/// Called when the form is completed: receives the value snapshot.
pub type OnFinishFn = Arc<dyn Fn(Stores) + Send + Sync>;

/// Called when the form fails to complete: receives the aggregated error map.
pub type OnFinishFailedFn = Arc<dyn Fn(Errors) + Send + Sync>;

/// Called once per value write: receives the changed slots and the merged snapshot.
pub type OnValuesChangeFn = Arc<dyn Fn(&SlotWrites, &Stores) + Send + Sync>;

/// Form-level callbacks. Each slot is single-occupancy: setting a callback replaces
/// the previous one (latest registration wins), this is an override slot and not a
/// subscriber list.
#[derive(Clone, Default)]
pub struct FormCallbacks {
    pub on_finish: Option<OnFinishFn>,
    pub on_finish_failed: Option<OnFinishFailedFn>,
    pub on_values_change: Option<OnValuesChangeFn>,
}

impl FormCallbacks {
    pub fn with_on_finish(
        mut self,
        on_finish: impl Fn(Stores) + Send + Sync + 'static,
    ) -> FormCallbacks {
        self.on_finish = Some(Arc::new(on_finish));
        self
    }

    pub fn with_on_finish_failed(
        mut self,
        on_finish_failed: impl Fn(Errors) + Send + Sync + 'static,
    ) -> FormCallbacks {
        self.on_finish_failed = Some(Arc::new(on_finish_failed));
        self
    }

    pub fn with_on_values_change(
        mut self,
        on_values_change: impl Fn(&SlotWrites, &Stores) + Send + Sync + 'static,
    ) -> FormCallbacks {
        self.on_values_change = Some(Arc::new(on_values_change));
        self
    }

    /// Per-slot override: occupied slots in `other` replace the current ones, empty
    /// slots leave the current ones in place.
    pub fn merge(&mut self, other: FormCallbacks) {
        if other.on_finish.is_some() {
            self.on_finish = other.on_finish;
        }
        if other.on_finish_failed.is_some() {
            self.on_finish_failed = other.on_finish_failed;
        }
        if other.on_values_change.is_some() {
            self.on_values_change = other.on_values_change;
        }
    }
}

/// Options for the set-values protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetValuesOptions {
    /// Trigger fire-and-forget validation for every affected registered field.
    pub validate: bool,
    /// Mark affected registered fields touched and notify them via their change
    /// hooks. A `false` here makes the call a silent merge (plus the unconditional
    /// values-change callback).
    pub notify: bool,
}

impl Default for SetValuesOptions {
    fn default() -> SetValuesOptions {
        SetValuesOptions {
            validate: true,
            notify: true,
        }
    }
}

/// What [`Form`](crate::Form) must do *after* releasing the lock, produced by
/// [`FormStateMachine::apply_slot_writes`]. Change hooks and callbacks run outside
/// the lock so they may call back into the form without deadlocking.
pub(crate) struct SlotWritesOutcome {
    /// Affected registered fields (touched already marked): invoke their change hooks.
    pub notify: Vec<(String, OnStoreChangeFn)>,
    /// `should_update` bystanders: invoke their change hooks with the names of the
    /// slots that actually changed, no touched/validate side effects.
    pub refresh: Vec<(String, OnStoreChangeFn)>,
    /// Affected registered fields to validate fire-and-forget.
    pub validate: Vec<String>,
    /// The values-change callback, fired once per call regardless of options.
    pub on_values_change: Option<OnValuesChangeFn>,
    pub changed: SlotWrites,
    pub snapshot: Stores,
}

/// The composed engine state: registry + value store + error store + the write-once
/// initial-values record + callbacks. Exclusively owned by one
/// [`Form`](crate::Form); there is no access path that bypasses its public
/// operations.
#[derive(Default)]
pub struct FormStateMachine {
    pub registry: FieldRegistry,
    pub values: ValueStore,
    pub errors: ErrorStore,
    pub initial_values: Stores,
    pub callbacks: FormCallbacks,
}

impl FormStateMachine {
    /// The locked phase of the set-values protocol:
    ///
    /// 1. Merge the writes unconditionally — reads observe the merge immediately.
    /// 2. If notifying, mark every affected registered field touched and collect its
    ///    change hook; collect it for validation too when requested. Registered
    ///    `should_update` fields that were not directly affected are collected as
    ///    refresh-only notifications.
    /// 3. Hand back everything that must run outside the lock.
    pub(crate) fn apply_slot_writes(
        &mut self,
        writes: SlotWrites,
        options: SetValuesOptions,
    ) -> SlotWritesOutcome {
        self.values.merge(&writes);
        tracing::debug!(
            message = "form state machine: slot writes merged",
            slots = writes.len(),
            notify = options.notify,
            validate = options.validate
        );

        let mut notify = vec![];
        let mut refresh = vec![];
        let mut validate = vec![];

        if options.notify {
            for name in writes.keys() {
                self.registry.set_touched(name, true);
                if let Some(entity) = self.registry.get(name) {
                    notify.push((name.clone(), entity.on_store_change.clone()));
                    if options.validate {
                        validate.push(name.clone());
                    }
                }
            }

            for entity in self.registry.entities() {
                let Some(name) = entity.name() else { continue };
                if entity.descriptor.should_update && !writes.contains_key(name) {
                    refresh.push((name.to_string(), entity.on_store_change.clone()));
                }
            }
        }

        SlotWritesOutcome {
            notify,
            refresh,
            validate,
            on_values_change: self.callbacks.on_values_change.clone(),
            changed: writes,
            snapshot: self.values.snapshot(),
        }
    }

    /// Compose the validator request for one field: `None` when no entity is
    /// registered under `name` (validating it is then a benign no-op).
    pub(crate) fn validate_request_for(&self, name: &str) -> Option<ValidateRequest> {
        let entity = self.registry.get(name)?;
        entity.validate_request(self.values.get(name).cloned())
    }
}

mod debug_helpers {
    use super::*;

    impl Debug for FormCallbacks {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("FormCallbacks")
                .field("on_finish", &self.on_finish.is_some())
                .field("on_finish_failed", &self.on_finish_failed.is_some())
                .field("on_values_change", &self.on_values_change.is_some())
                .finish()
        }
    }

    impl Debug for FormStateMachine {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("FormStateMachine")
                .field("registry", &self.registry)
                .field("values", &self.values)
                .field("errors", &self.errors)
                .field("initial_values", &self.initial_values)
                .field("callbacks", &self.callbacks)
                .finish()
        }
    }
}
