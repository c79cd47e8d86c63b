// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The seam between the engine and the external rule validator.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{CommonResult, FieldError, FieldValue, RuleSpec};

/// Everything the external validator needs to validate one field.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidateRequest {
    /// The field being validated. The validator must echo this back in
    /// [`ValidationError::field`](crate::ValidationError::field) on failure.
    pub name: String,

    /// The current value slot; `None` when the field has no recorded value.
    pub value: Option<FieldValue>,

    /// The rule list from the field descriptor, passed through untouched.
    pub rules: Vec<RuleSpec>,

    /// When `true`, the validator must stop at the first failing rule for this field
    /// (short-circuit within one field; the engine never implements this itself).
    pub validate_first: bool,
}

/// The external rule validator contract.
///
/// Given a field name, value, and rule list, decide pass/fail:
/// - `Ok(None)` — the field passes every rule.
/// - `Ok(Some(FieldError))` — structured validation failure; this is data, the engine
///   records it in the error store and never raises it.
/// - `Err(_)` — anything not shaped like a validation failure. The engine does not
///   swallow these: they propagate uncaught and are fatal to the caller.
///
/// The engine never holds its internal state lock across this await, so an
/// implementation is free to call back into the [`Form`](crate::Form) that invoked it
/// (eg: to read sibling field values for cross-field rules) without deadlocking.
/// Implementations should be prepared to run concurrently with themselves:
/// [`Form::validate_field`](crate::Form::validate_field) fans out one call per field
/// and joins on all of them.
#[async_trait]
pub trait RuleValidator {
    async fn validate(
        &self,
        request: ValidateRequest,
    ) -> CommonResult<Option<FieldError>>;
}

/// How validator implementations are handed to [`Form::new`](crate::Form::new) and
/// shared with spawned validation tasks.
pub type SharedRuleValidator = Arc<dyn RuleValidator + Send + Sync>;
