// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::{BootstrapError, log_action, log_warning};
use crate::runtime_paths::USERS_FILE_NAME;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

const EMPTY_USERS_YAML: &str = "{}\n";

/// Write an empty `users.yaml` unless one already exists.
pub fn ensure_users(root: &Path) -> Result<bool, BootstrapError> {
    let users_path = root.join(USERS_FILE_NAME);
    if users_path.exists() {
        return Ok(false);
    }

    let mut file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&users_path)
    {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(err) => return Err(BootstrapError::Io(err)),
    };

    file.write_all(EMPTY_USERS_YAML.as_bytes())?;
    file.sync_all()?;

    log_action(format!("created empty {}", USERS_FILE_NAME));
    log_warning("no API users yet; run `quire user-add <name> <email>` to create one");
    Ok(true)
}
