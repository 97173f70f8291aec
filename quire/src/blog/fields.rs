// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Input rules shared by the category, post and tag write paths.

use super::error::FieldErrors;
use serde::{Deserialize, Deserializer};

pub const MAX_NAME_CHARS: usize = 255;
pub const MAX_COLOR_CHARS: usize = 7;

/// Deserialize a field that distinguishes "absent" from "explicitly null".
///
/// Use with `#[serde(default, deserialize_with = "nullable")]` on an
/// `Option<Option<T>>`: absent → `None`, `null` → `Some(None)`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn label(field: &str) -> String {
    field.replace('_', " ")
}

pub fn required_message(field: &str) -> String {
    format!("The {} field is required.", label(field))
}

pub fn invalid_selection_message(field: &str) -> String {
    format!("The selected {} is invalid.", label(field))
}

pub fn taken_message(field: &str) -> String {
    format!("The {} has already been taken.", label(field))
}

/// A value that must be present and non-blank (create paths).
pub fn require_text(errors: &mut FieldErrors, field: &str, value: Option<&str>, max: Option<usize>) {
    match value {
        Some(text) if !text.trim().is_empty() => check_max(errors, field, Some(text), max),
        _ => errors.add(field, required_message(field)),
    }
}

/// A value that may be absent but, when sent, must be non-blank (update paths).
pub fn sometimes_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    max: Option<usize>,
) {
    if let Some(text) = value {
        require_text(errors, field, Some(text), max);
    }
}

pub fn check_max(errors: &mut FieldErrors, field: &str, value: Option<&str>, max: Option<usize>) {
    if let (Some(text), Some(max)) = (value, max)
        && text.chars().count() > max
    {
        errors.add(
            field,
            format!(
                "The {} may not be greater than {} characters.",
                label(field),
                max
            ),
        );
    }
}

pub fn check_min(errors: &mut FieldErrors, field: &str, value: Option<i64>, min: i64) {
    if let Some(value) = value
        && value < min
    {
        errors.add(
            field,
            format!("The {} must be at least {}.", label(field), min),
        );
    }
}

/// Blank strings count as "not provided" for optional text columns.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}
