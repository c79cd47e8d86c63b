// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! # r3bl_form
//!
//! Headless, framework-agnostic form-state engine: a field registry, canonical value
//! and error stores, an async validation orchestrator, and a two-phase submit
//! pipeline, all behind one cloneable [`Form`] handle.
//!
//! The engine owns state and sequencing only. Rule evaluation is delegated to an
//! injected [`RuleValidator`]; re-rendering is delegated to an injected render-request
//! hook and per-field change hooks. There is no global/ambient lookup: every consumer
//! receives the [`Form`] explicitly.
//!
//! ```
//! use std::sync::Arc;
//! use r3bl_form::{FieldDescriptor, FieldEntity, Form, MockRuleValidator, NamePath,
//!                 SetValuesOptions, Stores};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let validator = Arc::new(MockRuleValidator::new());
//! let form = Form::new(validator, || {});
//!
//! form.sign_in_field(FieldEntity::silent(FieldDescriptor::named("username")))
//!     .await;
//! form.set_fields_value(
//!     Stores::from([("username".to_string(), "alice".into())]),
//!     SetValuesOptions::default(),
//! )
//! .await;
//!
//! assert_eq!(form.get_field_value("username").await, Some("alice".into()));
//! assert!(form.is_field_touched(&NamePath::from("username")).await);
//! # }
//! ```

// Attach sources.
pub mod common;
pub mod error_store;
pub mod field;
pub mod form;
pub mod form_state_machine;
pub mod name_path;
pub mod registry;
pub mod rule;
pub mod test_fixtures;
pub mod validate;
pub mod value_store;

// Re-export.
pub use common::*;
pub use error_store::*;
pub use field::*;
pub use form::*;
pub use form_state_machine::*;
pub use name_path::*;
pub use registry::*;
pub use rule::*;
pub use test_fixtures::*;
pub use validate::*;
pub use value_store::*;
