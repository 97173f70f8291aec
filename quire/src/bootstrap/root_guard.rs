// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Checks that a runtime root holds only Quire's own layout before any
//! default file is written into it.

use super::{BootstrapError, log_action};
use crate::config::CONFIG_FILE_NAME;
use crate::runtime_paths::{STATE_DIR_NAME, USERS_FILE_NAME};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    fn describe(self) -> &'static str {
        match self {
            EntryKind::File => "a file",
            EntryKind::Directory => "a directory",
        }
    }
}

const LAYOUT: [(&str, EntryKind); 3] = [
    (CONFIG_FILE_NAME, EntryKind::File),
    (USERS_FILE_NAME, EntryKind::File),
    (STATE_DIR_NAME, EntryKind::Directory),
];

/// Resolve the runtime root, creating it when absent, and reject roots that
/// hold anything besides the blog layout. Hidden entries are ignored; they
/// include interrupted snapshot temp files.
pub fn ensure_root_is_clean(root: &Path) -> Result<PathBuf, BootstrapError> {
    let root = if root.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        root.to_path_buf()
    };

    if !root.exists() {
        fs::create_dir_all(&root)?;
        log_action(format!("created runtime root directory {}", root.display()));
        return Ok(root);
    }
    if !root.is_dir() {
        return Err(BootstrapError::RootLayout {
            root,
            problems: vec!["the path is not a directory".to_string()],
        });
    }

    let problems = layout_problems(&root)?;
    if problems.is_empty() {
        Ok(root)
    } else {
        Err(BootstrapError::RootLayout { root, problems })
    }
}

fn layout_problems(root: &Path) -> Result<Vec<String>, BootstrapError> {
    let mut problems = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let kind = if entry.file_type()?.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        match LAYOUT.iter().find(|(expected, _)| *expected == name) {
            Some((_, expected)) if *expected == kind => {}
            Some((_, expected)) => problems.push(format!("{} should be {}", name, expected.describe())),
            None => problems.push(format!("unexpected entry {}", name)),
        }
    }
    problems.sort();
    Ok(problems)
}
