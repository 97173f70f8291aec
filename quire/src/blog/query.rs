// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::error::{BlogError, BlogResult};
use super::fields::invalid_selection_message;
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Case-insensitive "asc"/"desc"; anything else keeps `default`.
    pub fn parse_or(value: Option<&str>, default: SortDirection) -> SortDirection {
        match value.map(|raw| raw.trim().to_ascii_lowercase()) {
            Some(raw) if raw == "asc" => SortDirection::Asc,
            Some(raw) if raw == "desc" => SortDirection::Desc,
            _ => default,
        }
    }

    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Resolve a requested `order_by` column against an allow-list.
pub fn sort_key<'a>(requested: Option<&str>, allowed: &[&'a str], default: &'a str) -> BlogResult<&'a str> {
    match requested.map(str::trim).filter(|raw| !raw.is_empty()) {
        None => Ok(default),
        Some(raw) => allowed
            .iter()
            .copied()
            .find(|column| *column == raw)
            .ok_or_else(|| BlogError::field("order_by", invalid_selection_message("order_by"))),
    }
}

/// Lenient boolean query flag: "1", "true", "on" and "yes" are true.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}

/// Case-insensitive substring match used by every `search` filter.
pub fn contains_text(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub fn contains_opt(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|text| contains_text(text, needle))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub per_page: usize,
}

impl PageRequest {
    pub fn new(page: Option<usize>, per_page: Option<usize>, default_per_page: usize, max_per_page: usize) -> Self {
        let max = max_per_page.max(1);
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(default_per_page).clamp(1, max),
        }
    }
}

/// One page of a listing, in the envelope shape clients page through.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub current_page: usize,
    pub data: Vec<T>,
    pub per_page: usize,
    pub total: usize,
    pub last_page: usize,
    pub from: Option<usize>,
    pub to: Option<usize>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            current_page: self.current_page,
            data: self.data.into_iter().map(f).collect(),
            per_page: self.per_page,
            total: self.total,
            last_page: self.last_page,
            from: self.from,
            to: self.to,
        }
    }
}

pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let total = items.len();
    let per_page = request.per_page.max(1);
    let last_page = total.div_ceil(per_page).max(1);
    let offset = (request.page - 1).saturating_mul(per_page);
    let data: Vec<T> = items.into_iter().skip(offset).take(per_page).collect();
    let (from, to) = if data.is_empty() {
        (None, None)
    } else {
        (Some(offset + 1), Some(offset + data.len()))
    };

    Page {
        current_page: request.page,
        data,
        per_page,
        total,
        last_page,
        from,
        to,
    }
}
