// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

const SEPARATOR: char = '-';

/// ASCII spelling of a Latin letter with diacritics, if it has one.
fn fold_latin(ch: char) -> Option<&'static str> {
    let folded = match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'ĉ' | 'č' => "c",
        'ď' | 'đ' | 'ð' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'ğ' | 'ģ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' | 'ı' => "i",
        'ķ' => "k",
        'ł' | 'ľ' | 'ļ' => "l",
        'ñ' | 'ń' | 'ň' | 'ņ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'œ' => "oe",
        'ř' | 'ŕ' => "r",
        'ś' | 'š' | 'ş' | 'ș' => "s",
        'ß' => "ss",
        'ť' | 'ţ' | 'ț' => "t",
        'þ' => "th",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' | 'ų' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(folded)
}

/// Turn a human-readable name into a URL-safe slug.
///
/// Output is lowercase ASCII letters, digits and single hyphens. Accented
/// Latin letters fold to their plain spelling; any other non-ASCII letter
/// is dropped. Every run of whitespace or punctuation collapses into one
/// hyphen, and edge separators are trimmed. Uniqueness is the caller's
/// concern.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;

    for ch in text.chars().flat_map(char::to_lowercase) {
        let folded = fold_latin(ch);
        if !ch.is_ascii_alphanumeric() && folded.is_none() {
            if !ch.is_alphanumeric() {
                pending_separator = true;
            }
            continue;
        }
        if pending_separator && !slug.is_empty() {
            slug.push(SEPARATOR);
        }
        pending_separator = false;
        match folded {
            Some(folded) => slug.push_str(folded),
            None => slug.push(ch),
        }
    }

    slug
}
