// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Scriptable [`RuleValidator`] for tests. Outcomes are keyed by field name and can
//! be re-scripted mid-test; every call is recorded so tests can assert on exactly
//! which validations ran.

use std::{collections::HashMap,
          sync::{Arc, Mutex},
          time::Duration};

use async_trait::async_trait;

use crate::{CommonResult, FieldError, FormError, FormErrorType, RuleValidator,
            ValidateRequest, ValidationError};

/// What the mock should do when asked to validate a given field. Unscripted fields
/// pass.
#[derive(Clone, Debug, Default)]
pub enum MockOutcome {
    #[default]
    Pass,
    Fail(FieldError),
    /// Fatal, non-validation failure (e.g. the rule engine itself broke).
    Fatal(String),
    /// Sleep first, then fail. Used to pin down in-flight overlap.
    FailAfter(Duration, FieldError),
    /// Sleep first, then pass.
    PassAfter(Duration),
}

#[derive(Clone, Debug, Default)]
pub struct MockRuleValidator {
    outcomes: Arc<Mutex<HashMap<String, MockOutcome>>>,
    calls: Arc<Mutex<Vec<ValidateRequest>>>,
}

impl MockRuleValidator {
    pub fn new() -> MockRuleValidator { MockRuleValidator::default() }

    /// Script (or re-script) the outcome for one field.
    pub fn script(&self, name: &str, outcome: MockOutcome) {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.insert(name.to_string(), outcome);
        }
    }

    /// Shorthand: a single-message failure that echoes the field name back, the way
    /// a real rule engine reports.
    pub fn script_failure(&self, name: &str, message: &str) {
        self.script(
            name,
            MockOutcome::Fail(MockRuleValidator::failure(name, message)),
        );
    }

    pub fn failure(name: &str, message: &str) -> FieldError {
        FieldError {
            errors: vec![ValidationError {
                message: message.to_string(),
                field: name.to_string(),
                field_value: None,
            }],
            rules: vec![],
        }
    }

    /// Every request received so far, in arrival order.
    pub fn calls(&self) -> Vec<ValidateRequest> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn calls_for(&self, name: &str) -> usize {
        self.calls()
            .iter()
            .filter(|request| request.name == name)
            .count()
    }
}

#[async_trait]
impl RuleValidator for MockRuleValidator {
    async fn validate(
        &self,
        request: ValidateRequest,
    ) -> CommonResult<Option<FieldError>> {
        let outcome = self
            .outcomes
            .lock()
            .map(|outcomes| outcomes.get(&request.name).cloned().unwrap_or_default())
            .unwrap_or_default();

        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request);
        }

        match outcome {
            MockOutcome::Pass => Ok(None),
            MockOutcome::Fail(field_error) => Ok(Some(field_error)),
            MockOutcome::Fatal(message) => {
                FormError::new_error_result(FormErrorType::ValidatorFailure, &message)
            }
            MockOutcome::FailAfter(delay, field_error) => {
                tokio::time::sleep(delay).await;
                Ok(Some(field_error))
            }
            MockOutcome::PassAfter(delay) => {
                tokio::time::sleep(delay).await;
                Ok(None)
            }
        }
    }
}
