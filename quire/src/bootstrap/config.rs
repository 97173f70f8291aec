// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::{BootstrapError, log_action};
use crate::config::CONFIG_FILE_NAME;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_WORKERS: u16 = 4;

/// Write a default `config.yaml` unless one already exists.
pub fn ensure_config(root: &Path) -> Result<bool, BootstrapError> {
    let config_path = root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        return Ok(false);
    }

    let mut file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&config_path)
    {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(err) => return Err(BootstrapError::Io(err)),
    };

    file.write_all(default_config_yaml().as_bytes())?;
    file.sync_all()?;

    log_action(format!(
        "created {} listening on port {}",
        CONFIG_FILE_NAME, DEFAULT_PORT
    ));
    Ok(true)
}

fn default_config_yaml() -> String {
    format!(
        "server:\n  host: \"127.0.0.1\"\n  port: {port}\n  workers: {workers}\n\nlogging:\n  level: \"info\"\n\napp:\n  name: \"Quire\"\n  storage_url: \"/storage\"\n\npagination:\n  default_per_page: 15\n  max_per_page: 100\n",
        port = DEFAULT_PORT,
        workers = DEFAULT_WORKERS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn default_config_parses_and_validates() {
        let config: Config = serde_yaml::from_str(&default_config_yaml()).unwrap();
        let validated = config.validate().unwrap();
        assert_eq!(validated.server.port, DEFAULT_PORT);
        assert_eq!(validated.pagination.max_per_page, 100);
    }
}
