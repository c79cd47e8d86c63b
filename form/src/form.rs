// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The public form instance: composes the registry, the value and error stores, and
//! the validation orchestration behind one cloneable handle.
//!
//! ## Ownership & concurrency model
//!
//! All mutable state lives in one [`FormStateMachine`] behind
//! [`Arc<tokio::sync::RwLock<_>>`]; a [`Form`] is a cheap clone of that handle plus
//! the two injected collaborators (the external [`RuleValidator`] and the view
//! layer's render-request hook). Store mutations are synchronous and atomic under the
//! write lock; the lock is never held across a validator await. There is no
//! preemptive concurrency to guard against beyond the engine's own asynchronous
//! fan-out: `validate_field` launches one validator call per field and joins on all
//! of them, and `set_fields_value` spawns fire-and-forget validations.
//!
//! ## Ordering guarantees
//!
//! A read issued after [`Form::set_fields_value`] returns always observes the merged
//! value, independent of whether validation triggered by that same call has
//! completed. There is **no cancellation**: if a field's value changes again while a
//! prior validation for that field is still in flight, the late result overwrites
//! the error store when it resolves, which can stamp a stale verdict over a newer
//! value.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{CommonResult, ErrorWrites, Errors, FieldEntity, FieldError, FieldValue,
            FormCallbacks, FormStateMachine, NamePath, SetValuesOptions,
            SharedRuleValidator, SlotWrites, Stores};

pub type SharedFormStateMachine = Arc<RwLock<FormStateMachine>>;

/// The view layer's "please re-render" hook, invoked after a failed submit.
pub type RenderRequestFn = Arc<dyn Fn() + Send + Sync>;

/// The form instance. Construct one per form with [`Form::new`] and pass it by
/// reference (or clone) to every consumer — there is no ambient/global lookup.
///
/// Fire-and-forget validation uses [`tokio::spawn`], so a `Form` must live inside a
/// tokio runtime.
#[derive(Clone)]
pub struct Form {
    state_machine: SharedFormStateMachine,
    validator: SharedRuleValidator,
    render_request: RenderRequestFn,
}

/// Deregistration handle returned by [`Form::sign_in_field`]. Deregistration is
/// addressed by name, so the handle returned for a duplicate registration signs out
/// the surviving (first) entity; the handle for an unnamed entity is inert.
#[derive(Clone)]
pub struct SignOutHandle {
    form: Form,
    name: Option<String>,
}

impl SignOutHandle {
    pub async fn sign_out(&self) {
        if let Some(name) = &self.name {
            self.form
                .sign_out_field(&NamePath::Single(name.clone()))
                .await;
        }
    }
}

// Construction & wiring.
impl Form {
    pub fn new(
        validator: SharedRuleValidator,
        render_request: impl Fn() + Send + Sync + 'static,
    ) -> Form {
        Form {
            state_machine: Arc::new(RwLock::new(FormStateMachine::default())),
            validator,
            render_request: Arc::new(render_request),
        }
    }

    /// Replace form-level callbacks. Per-slot override: occupied slots replace the
    /// current registration (latest wins), empty slots keep it. Never a subscriber
    /// list.
    pub async fn set_callbacks(&self, callbacks: FormCallbacks) {
        self.state_machine.write().await.callbacks.merge(callbacks);
    }
}

// Registration lifecycle.
impl Form {
    /// Register a field entity. Idempotent by name — **first registration wins**: a
    /// duplicate mount under an existing name is silently dropped rather than
    /// replacing the existing entity, so a remounted field with updated rules will
    /// not take effect until the older entity signs out. (Kept as documented
    /// behavior, pending product-level confirmation.)
    ///
    /// A fresh registration resets the field's value and error slots. Never fails:
    /// unnamed entities are benign no-ops that receive an inert handle.
    pub async fn sign_in_field(&self, entity: FieldEntity) -> SignOutHandle {
        let name = entity.name().map(str::to_string);

        let added = self.state_machine.write().await.registry.register(entity);

        if added {
            if let Some(name) = &name {
                tracing::debug!(message = "form: field signed in", name);
                self.set_value_slots(
                    SlotWrites::from([(name.clone(), None)]),
                    SetValuesOptions {
                        validate: false,
                        notify: false,
                    },
                )
                .await;
                self.state_machine.write().await.errors.set(name, None);
            }
        }

        SignOutHandle {
            form: self.clone(),
            name,
        }
    }

    /// Deregister every field the path resolves to, purging its value and error
    /// slots via a value-reset (not a silent removal) so stale data cannot leak to a
    /// same-named field registered later. No-op when nothing resolves.
    pub async fn sign_out_field(&self, path: &NamePath) {
        let names = {
            let sm = self.state_machine.read().await;
            path.resolve(&sm.registry.names())
        };

        for name in names {
            let removed = self.state_machine.write().await.registry.deregister(&name);
            if removed {
                tracing::debug!(message = "form: field signed out", name);
                self.set_value_slots(
                    SlotWrites::from([(name.clone(), None)]),
                    SetValuesOptions {
                        validate: false,
                        notify: true,
                    },
                )
                .await;
                self.state_machine.write().await.errors.set(&name, None);
            }
        }
    }

    /// Registered field names, in registration order.
    pub async fn registered_names(&self) -> Vec<String> {
        self.state_machine.read().await.registry.names()
    }
}

// Values.
impl Form {
    /// Merge `values` into the canonical store and run the set-values protocol with
    /// the given options (see [`SetValuesOptions`]). The merge is observable
    /// immediately; validation triggered by this call lands in the error store
    /// asynchronously.
    pub async fn set_fields_value(&self, values: Stores, options: SetValuesOptions) {
        let writes = values
            .into_iter()
            .map(|(name, value)| (name, Some(value)))
            .collect();
        self.set_value_slots(writes, options).await;
    }

    /// Scalar read; `None` for unknown keys, never an error.
    pub async fn get_field_value(&self, name: &str) -> Option<FieldValue> {
        self.state_machine.read().await.values.get(name).cloned()
    }

    /// Path-shaped read: [`NamePath::All`] returns the full snapshot, anything else
    /// a restricted sub-map keyed by only the names that resolved (and have a
    /// recorded value).
    pub async fn get_field_values(&self, path: &NamePath) -> Stores {
        let sm = self.state_machine.read().await;
        match path {
            NamePath::All => sm.values.snapshot(),
            _ => sm.values.subset(&path.resolve(&sm.registry.names())),
        }
    }

    /// The full set-values protocol. Everything that touches the shared state
    /// happens under one write lock; change hooks, spawned validations, and the
    /// values-change callback run after it is released (they may re-enter the form).
    pub(crate) async fn set_value_slots(
        &self,
        writes: SlotWrites,
        options: SetValuesOptions,
    ) {
        let outcome = self
            .state_machine
            .write()
            .await
            .apply_slot_writes(writes, options);

        for (name, on_store_change) in &outcome.notify {
            on_store_change(name);
        }

        for name in outcome.validate {
            let form = self.clone();
            tokio::spawn(async move {
                if let Err(report) = form.validate_one(&name).await {
                    tracing::warn!(
                        message = "form: fire-and-forget validation failed fatally",
                        name,
                        %report
                    );
                }
            });
        }

        for (watcher, on_store_change) in &outcome.refresh {
            tracing::debug!(message = "form: refreshing should_update field", watcher);
            for changed_name in outcome.changed.keys() {
                on_store_change(changed_name);
            }
        }

        if let Some(on_values_change) = &outcome.on_values_change {
            on_values_change(&outcome.changed, &outcome.snapshot);
        }
    }
}

// Errors.
impl Form {
    /// Per-slot overwrite (never a merge of the payload); `None` entries clear the
    /// slot.
    pub async fn set_field_error(&self, errors: ErrorWrites) {
        self.state_machine.write().await.errors.apply(errors);
    }

    /// Scalar read; `None` means "no recorded error" (indistinguishable from "not
    /// yet validated").
    pub async fn get_field_error(&self, name: &str) -> Option<FieldError> {
        self.state_machine.read().await.errors.get(name).cloned()
    }

    /// Path-shaped read mirroring [`Form::get_field_values`].
    pub async fn get_field_errors(&self, path: &NamePath) -> Errors {
        let sm = self.state_machine.read().await;
        match path {
            NamePath::All => sm.errors.snapshot(),
            _ => sm.errors.subset(&path.resolve(&sm.registry.names())),
        }
    }
}

// Initial values.
impl Form {
    /// Snapshot `values` into the initial-values record and push the subset whose
    /// keys match *currently* registered fields into the value store, as a pure
    /// merge — no touched marking, no change-hook notification, no validation.
    /// Fields that register later receive no retroactive push.
    ///
    /// `already_initialized` is the caller-owned one-shot flag: when `true` the call
    /// is skipped entirely.
    pub async fn set_initial_values(&self, values: Stores, already_initialized: bool) {
        if already_initialized {
            return;
        }

        let writes: SlotWrites = {
            let mut sm = self.state_machine.write().await;
            sm.initial_values.extend(values);
            let registered = sm.registry.names();
            sm.initial_values
                .iter()
                .filter(|(name, _)| registered.contains(name))
                .map(|(name, value)| (name.clone(), Some(value.clone())))
                .collect()
        };

        self.set_value_slots(
            writes,
            SetValuesOptions {
                validate: false,
                notify: false,
            },
        )
        .await;
    }

    pub async fn get_initial_values(&self) -> Stores {
        self.state_machine.read().await.initial_values.clone()
    }
}

// Touched.
impl Form {
    /// Set exactly one field's touched bit. No-op on unknown names.
    pub async fn set_field_touched(&self, name: &str, touched: bool) {
        self.state_machine
            .write()
            .await
            .registry
            .set_touched(name, touched);
    }

    /// AND across all fields the path resolves to. Vacuously `true` for an empty
    /// resolution set (absent path on an empty registry included) — documented edge
    /// case, not corrected.
    pub async fn is_field_touched(&self, path: &NamePath) -> bool {
        let sm = self.state_machine.read().await;
        path.resolve(&sm.registry.names())
            .iter()
            .filter_map(|name| sm.registry.get(name))
            .all(|entity| entity.touched)
    }
}

// Validation & submit.
impl Form {
    /// Validate every field the path resolves to, concurrently, waiting for all of
    /// them to settle (no early cancellation if one fails). Each settled outcome
    /// replaces that field's error-store slot — a pass makes the slot absent.
    ///
    /// The returned map aggregates only produced failures, **keyed by the field name
    /// reported inside each error result** (`errors[0].field`), not necessarily the
    /// requested key; the validator contract is to echo back the requested name.
    ///
    /// # Errors
    ///
    /// A validator failure that is not shaped like a validation failure is fatal and
    /// propagates here once all launched validations have settled.
    pub async fn validate_field(&self, path: &NamePath) -> CommonResult<Errors> {
        let names = {
            let sm = self.state_machine.read().await;
            path.resolve(&sm.registry.names())
        };

        let results =
            futures::future::join_all(names.iter().map(|name| self.validate_one(name)))
                .await;

        let mut errors = Errors::new();
        let mut fatal = None;
        for result in results {
            match result {
                Ok(Some(field_error)) => {
                    // Aggregation key comes from the validator's own report.
                    if let Some(first) = field_error.errors.first() {
                        errors.insert(first.field.clone(), field_error);
                    }
                }
                Ok(None) => {}
                Err(report) => {
                    fatal.get_or_insert(report);
                }
            }
        }

        match fatal {
            Some(report) => Err(report),
            None => Ok(errors),
        }
    }

    /// Validate one field by name. Benign no-op (clean result) when no entity is
    /// registered under the name. The lock is released before the validator runs and
    /// re-acquired to record the outcome, so a late result can overwrite a newer
    /// value's verdict (see the module docs).
    pub(crate) async fn validate_one(
        &self,
        name: &str,
    ) -> CommonResult<Option<FieldError>> {
        let request = {
            let sm = self.state_machine.read().await;
            sm.validate_request_for(name)
        };

        let Some(request) = request else {
            return Ok(None);
        };

        let outcome = self.validator.validate(request).await?;
        tracing::debug!(
            message = "form: validation settled",
            name,
            failed = outcome.is_some()
        );

        self.state_machine
            .write()
            .await
            .errors
            .set(name, outcome.clone());

        Ok(outcome)
    }

    /// Reset every field the path resolves to: the value slot becomes absent (no
    /// validation triggered) and the error slot is cleared.
    pub async fn reset_field(&self, path: &NamePath) {
        let names = {
            let sm = self.state_machine.read().await;
            path.resolve(&sm.registry.names())
        };
        if names.is_empty() {
            return;
        }

        let writes: SlotWrites = names.iter().map(|name| (name.clone(), None)).collect();
        self.set_value_slots(
            writes,
            SetValuesOptions {
                validate: false,
                notify: true,
            },
        )
        .await;

        let mut sm = self.state_machine.write().await;
        for name in &names {
            sm.errors.set(name, None);
        }
    }

    /// Two-phase submit.
    ///
    /// With `skip_validate` the success callback fires immediately with the current
    /// value snapshot, even when a required field is empty. Otherwise every
    /// registered field is validated first; the success callback fires only when the
    /// aggregated error map is empty, else the failure callback receives that map and
    /// the view layer is asked to re-render. Values already written are never rolled
    /// back: a validation failure does not undo prior [`Form::set_fields_value`]
    /// calls. Submission failures are surfaced exactly once and never retried
    /// automatically.
    ///
    /// # Errors
    ///
    /// Propagates fatal validator failures from [`Form::validate_field`].
    pub async fn submit(&self, skip_validate: bool) -> CommonResult<()> {
        let callbacks = self.state_machine.read().await.callbacks.clone();

        if skip_validate {
            let snapshot = self.state_machine.read().await.values.snapshot();
            tracing::debug!(message = "form: submit without validation");
            if let Some(on_finish) = &callbacks.on_finish {
                on_finish(snapshot);
            }
            return Ok(());
        }

        let errors = self.validate_field(&NamePath::All).await?;

        if errors.is_empty() {
            let snapshot = self.state_machine.read().await.values.snapshot();
            tracing::debug!(message = "form: submit succeeded");
            if let Some(on_finish) = &callbacks.on_finish {
                on_finish(snapshot);
            }
        } else {
            tracing::debug!(message = "form: submit failed", fields = errors.len());
            if let Some(on_finish_failed) = &callbacks.on_finish_failed {
                on_finish_failed(errors);
            }
            (self.render_request)();
        }

        Ok(())
    }
}

mod debug_helpers {
    use std::fmt::{Debug, Formatter};

    use super::*;

    impl Debug for Form {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Form")
                .field("state_machine", &self.state_machine)
                .finish_non_exhaustive()
        }
    }

    impl Debug for SignOutHandle {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("SignOutHandle")
                .field("name", &self.name)
                .finish_non_exhaustive()
        }
    }
}
