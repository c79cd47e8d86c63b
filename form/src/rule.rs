// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Rule descriptors and structured validation failure payloads.
//!
//! The engine treats rules as opaque declarations: it collects them from the field
//! descriptor and hands them to the external [`RuleValidator`](crate::RuleValidator)
//! untouched. Matching semantics (required, type coercion, pattern, ranges, ...) are
//! entirely the validator's business.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One declarative validation rule, passed through to the external validator.
///
/// The named fields cover the common rule vocabulary; anything else a validator
/// understands rides along in `extra` via serde flattening.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuleSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub rule_type: Option<String>,

    /// Message reported when this rule fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    /// Validator-specific rule fields the engine does not model.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl RuleSpec {
    /// Shorthand for the ubiquitous `{ required: true, message }` rule.
    pub fn required(message: impl Into<String>) -> RuleSpec {
        RuleSpec {
            required: Some(true),
            message: Some(message.into()),
            ..Default::default()
        }
    }
}

/// One rule failure as reported by the external validator.
///
/// Validator contract: `field` must echo back the name the engine asked it to
/// validate. [`Form::validate_field`](crate::Form::validate_field) aggregates by this
/// reported name, so a validator that reports a different field than requested will
/// misfile the error.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub message: String,
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_value: Option<Value>,
}

/// The structured validation failure payload for one field: the individual rule
/// failures plus the rule list that produced them. Absence of a `FieldError` for a
/// field means "no recorded error" — deliberately indistinguishable from "not yet
/// validated".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub errors: Vec<ValidationError>,
    pub rules: Vec<RuleSpec>,
}

/// Aggregated validation outcome, keyed by field name. Contains only entries where a
/// [`FieldError`] was produced; an empty map means the validated set is clean.
pub type Errors = HashMap<String, FieldError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_rule_spec_serde_round_trip_with_extra_fields() {
        let json = json!({
            "required": true,
            "type": "string",
            "message": "Please enter the field values",
            "len": 8
        });
        let rule: RuleSpec = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(rule.required, Some(true));
        assert_eq!(rule.rule_type.as_deref(), Some("string"));
        assert_eq!(rule.extra.get("len"), Some(&json!(8)));
        assert_eq!(serde_json::to_value(&rule).unwrap(), json);
    }

    #[test]
    fn test_validation_error_uses_camel_case_field_value() {
        let error = ValidationError {
            message: "message".to_string(),
            field: "field".to_string(),
            field_value: Some(json!("fieldValue")),
        };
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(
            json,
            json!({
                "message": "message",
                "field": "field",
                "fieldValue": "fieldValue"
            })
        );
    }
}
