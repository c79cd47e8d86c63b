// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The addressing scheme used throughout the public contract of
//! [`Form`](crate::Form).
//!
//! Every operation that targets "some fields" accepts a [`NamePath`]: absent (all
//! registered fields), a single field name, or a list of field names. Instead of
//! dynamic argument-shape checks at each call site, the three shapes are modeled as
//! one tagged union with a single resolver function.

/// Field addressing for the form engine public API.
///
/// Resolution always happens against the *currently registered* field set, so names
/// that have already been deregistered silently disappear from results.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum NamePath {
    /// Address every currently-registered field, in registration order.
    #[default]
    All,
    /// Address one field by name. The name is passed through as-is, whether or not a
    /// field by that name is registered (best effort; callers must tolerate resolving
    /// to a name with no backing entity).
    Single(String),
    /// Address a list of fields by name. Resolution filters the list down to
    /// registered names, preserving *input* order. The first occurrence wins when the
    /// list contains duplicates.
    List(Vec<String>),
}

impl NamePath {
    /// Normalize this path into a concrete list of field names, given the names
    /// currently held by the registry (in registration order).
    pub fn resolve(&self, registered_names: &[String]) -> Vec<String> {
        match self {
            NamePath::All => registered_names.to_vec(),
            NamePath::Single(name) => vec![name.clone()],
            NamePath::List(names) => {
                let mut resolved = Vec::with_capacity(names.len());
                for name in names {
                    if registered_names.contains(name) && !resolved.contains(name) {
                        resolved.push(name.clone());
                    }
                }
                resolved
            }
        }
    }

    pub fn single(name: impl Into<String>) -> NamePath { NamePath::Single(name.into()) }

    pub fn list<I, S>(names: I) -> NamePath
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NamePath::List(names.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for NamePath {
    fn from(name: &str) -> NamePath { NamePath::Single(name.to_string()) }
}

impl From<String> for NamePath {
    fn from(name: String) -> NamePath { NamePath::Single(name) }
}

impl From<Vec<String>> for NamePath {
    fn from(names: Vec<String>) -> NamePath { NamePath::List(names) }
}

impl From<Vec<&str>> for NamePath {
    fn from(names: Vec<&str>) -> NamePath {
        NamePath::List(names.into_iter().map(str::to_string).collect())
    }
}
