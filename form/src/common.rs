// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! For more information on error types, see:
//!
//! 1. [Article](https://developerlife.com/2024/06/10/rust-miette-error-handling/)
//! 2. [Video](https://youtu.be/TmLF7vI8lKk)

use std::{error::Error,
          fmt::{Debug, Display, Formatter, Result}};

/// Type alias to make it easy to work with:
/// 1. [`core::result::Result`]
/// 2. [`miette::Result`] and [`miette::Report`], which are [`std::error::Error`]
///    wrappers.
///
/// The only fallible surface in this crate is the external
/// [`RuleValidator`](crate::RuleValidator): a structured validation failure is *data*
/// ([`FieldError`](crate::FieldError)), never an error. Anything a validator returns
/// through the `Err` channel is considered fatal to the caller and propagates uncaught.
pub type CommonResult<T> = miette::Result<T>;

/// Common error struct for the form engine. Everything else in the public contract is
/// a benign no-op (unknown names, empty resolutions, double-deregistration) and never
/// surfaces as an error.
#[derive(Debug, Clone)]
pub struct FormError {
    pub error_type: FormErrorType,
    pub error_message: Option<String>,
}

/// The ways in which the engine (or a validator implementation) can fail fatally.
#[non_exhaustive]
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormErrorType {
    #[default]
    General,
    /// The external validator failed in a way that is not shaped like a validation
    /// failure (eg: it panicked internally, lost a connection, etc.).
    ValidatorFailure,
    InvalidState,
    NotFound,
}

/// Implement [`Error`] trait.
impl Error for FormError {}

/// Implement [`Display`] trait (needed by [`Error`] trait). This is the same as the
/// [`Debug`] implementation (which is derived above).
impl Display for FormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result { Debug::fmt(self, f) }
}

impl FormError {
    /// Both [`FormError::error_type`] and [`FormError::error_message`] available.
    pub fn new_error_result<T>(err_type: FormErrorType, msg: &str) -> CommonResult<T> {
        Err(miette::miette!(FormError {
            error_type: err_type,
            error_message: Some(msg.to_string()),
        }))
    }

    /// Only [`FormError::error_type`] available, and no
    /// [`FormError::error_message`].
    pub fn new_error_result_with_only_type<T>(
        err_type: FormErrorType,
    ) -> CommonResult<T> {
        Err(miette::miette!(FormError {
            error_type: err_type,
            error_message: None,
        }))
    }

    /// Only [`FormError::error_message`] available, and no
    /// [`FormError::error_type`].
    pub fn new_error_result_with_only_msg<T>(msg: &str) -> CommonResult<T> {
        Err(miette::miette!(FormError {
            error_type: FormErrorType::default(),
            error_message: Some(msg.to_string()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_error_result_carries_type_and_message() {
        let result: CommonResult<()> = FormError::new_error_result(
            FormErrorType::ValidatorFailure,
            "validator blew up",
        );
        let report = result.unwrap_err();
        let form_error = report.downcast_ref::<FormError>().unwrap();
        assert_eq!(form_error.error_type, FormErrorType::ValidatorFailure);
        assert_eq!(
            form_error.error_message.as_deref(),
            Some("validator blew up")
        );
    }

    #[test]
    fn test_new_error_result_with_only_type() {
        let result: CommonResult<()> =
            FormError::new_error_result_with_only_type(FormErrorType::NotFound);
        let report = result.unwrap_err();
        let form_error = report.downcast_ref::<FormError>().unwrap();
        assert_eq!(form_error.error_type, FormErrorType::NotFound);
        assert!(form_error.error_message.is_none());
    }
}
