// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;

/// Field-level validation messages, keyed by input field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `Ok(())` when nothing was recorded, otherwise a validation error.
    pub fn into_result(self) -> Result<(), BlogError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(BlogError::Validation(self))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Category,
    Post,
    Tag,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Category => "Category",
            Resource::Post => "Post",
            Resource::Tag => "Tag",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone)]
pub enum BlogError {
    Validation(FieldErrors),
    Unauthenticated,
    Forbidden,
    Conflict(String),
    NotFound(Resource),
    Storage(String),
}

impl BlogError {
    pub fn conflict(message: impl Into<String>) -> Self {
        BlogError::Conflict(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        BlogError::Storage(message.into())
    }

    pub fn field(field: &str, message: impl Into<String>) -> Self {
        BlogError::Validation(FieldErrors::single(field, message))
    }
}

impl fmt::Display for BlogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlogError::Validation(_) => write!(f, "Validation errors"),
            BlogError::Unauthenticated => write!(f, "Authentication required"),
            BlogError::Forbidden => write!(f, "This action is unauthorized."),
            BlogError::Conflict(message) => write!(f, "{}", message),
            BlogError::NotFound(resource) => write!(f, "{} not found", resource),
            BlogError::Storage(message) => write!(f, "Storage error: {}", message),
        }
    }
}

impl Error for BlogError {}

pub type BlogResult<T> = Result<T, BlogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_collect_per_field() {
        let mut errors = FieldErrors::new();
        errors.add("name", "The name field is required.");
        errors.add("name", "The name may not be greater than 255 characters.");
        errors.add("color", "The color may not be greater than 7 characters.");

        assert_eq!(errors.messages("name").len(), 2);
        assert!(errors.contains("color"));
        assert!(errors.messages("slug").is_empty());
        assert!(matches!(errors.into_result(), Err(BlogError::Validation(_))));
    }

    #[test]
    fn empty_field_errors_are_ok() {
        assert!(FieldErrors::new().into_result().is_ok());
    }

    #[test]
    fn field_errors_serialize_as_plain_map() {
        let errors = FieldErrors::single("title", "The title field is required.");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["title"][0], "The title field is required.");
    }
}
