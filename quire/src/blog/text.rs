// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use once_cell::sync::Lazy;
use regex::Regex;

pub const WORDS_PER_MINUTE: usize = 200;
pub const EXCERPT_CHARS: usize = 200;
const ELLIPSIS: &str = "...";

static TAG_REGEX: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>"));

/// Remove markup tags, keeping the text between them.
pub fn strip_tags(content: &str) -> String {
    match TAG_REGEX.as_ref() {
        Ok(regex) => regex.replace_all(content, "").into_owned(),
        Err(err) => {
            log::error!("Tag stripping regex failed to compile: {}", err);
            content.to_string()
        }
    }
}

/// Count words the way a reader would: runs of letters, apostrophes and
/// hyphens that contain at least one letter.
pub fn word_count(text: &str) -> usize {
    text.split(|c: char| !(c.is_alphabetic() || c == '\'' || c == '-'))
        .filter(|word| word.chars().any(char::is_alphabetic))
        .count()
}

/// Minutes needed to read `content`, never less than one.
pub fn reading_time(content: &str) -> u32 {
    let words = word_count(&strip_tags(content));
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

/// Plain-text preview of `content`, cut at [`EXCERPT_CHARS`] characters.
pub fn excerpt_from(content: &str) -> String {
    limit_chars(strip_tags(content).trim(), EXCERPT_CHARS)
}

pub fn limit_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit).collect();
    format!("{}{}", cut.trim_end(), ELLIPSIS)
}
