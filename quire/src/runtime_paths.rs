// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::config::{CONFIG_FILE_NAME, ConfigError};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const USERS_FILE_NAME: &str = "users.yaml";
pub const STATE_DIR_NAME: &str = "state";
pub const DATA_FILE_NAME: &str = "blog.yaml";

#[derive(Debug, Clone)]
pub struct RuntimePaths {
    pub root: PathBuf,
    pub config_file: PathBuf,
    pub users_file: PathBuf,
    pub state_dir: PathBuf,
    pub data_file: PathBuf,
}

impl RuntimePaths {
    pub fn from_root(root: &Path) -> Result<Self, ConfigError> {
        let root_path = if root.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            root.to_path_buf()
        };

        if !root_path.exists() {
            fs::create_dir_all(&root_path).map_err(|e| {
                ConfigError::ValidationError(format!(
                    "Failed to create runtime root '{}': {}",
                    root_path.display(),
                    e
                ))
            })?;
        }

        let root_canonical = root_path.canonicalize().map_err(|e| {
            ConfigError::ValidationError(format!(
                "Failed to canonicalize runtime root '{}': {}",
                root_path.display(),
                e
            ))
        })?;

        let config_file = root_canonical.join(CONFIG_FILE_NAME);
        ensure_file_writable(&config_file, "Config file must be writable")?;

        let users_file = root_canonical.join(USERS_FILE_NAME);
        ensure_file_writable(&users_file, "Users file must be writable")?;

        let state_dir = root_canonical.join(STATE_DIR_NAME);
        ensure_dir_exists(&state_dir)?;
        let state_dir = state_dir.canonicalize().map_err(|e| {
            ConfigError::ValidationError(format!(
                "Failed to canonicalize state directory '{}': {}",
                state_dir.display(),
                e
            ))
        })?;
        let data_file = state_dir.join(DATA_FILE_NAME);

        Ok(Self {
            root: root_canonical,
            config_file,
            users_file,
            state_dir,
            data_file,
        })
    }
}

fn ensure_dir_exists(path: &Path) -> Result<(), ConfigError> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| {
            ConfigError::ValidationError(format!(
                "Failed to create directory '{}': {}",
                path.display(),
                e
            ))
        })?;
    }

    ensure_dir_writable(path, "Directory must be writable")?;
    Ok(())
}

fn ensure_dir_writable(path: &Path, context: &str) -> Result<(), ConfigError> {
    if !path.is_dir() {
        return Err(ConfigError::ValidationError(format!(
            "{} (not a directory): {}",
            context,
            path.display()
        )));
    }

    let probe_name = format!(".quire-write-check-{}", Uuid::new_v4());
    let probe_path = path.join(probe_name);

    let probe_result = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&probe_path);

    match probe_result {
        Ok(_) => {
            if let Err(err) = fs::remove_file(&probe_path) {
                return Err(ConfigError::ValidationError(format!(
                    "{} (unable to clean probe file {}): {}",
                    context,
                    probe_path.display(),
                    err
                )));
            }
            Ok(())
        }
        Err(err) => Err(ConfigError::ValidationError(format!(
            "{} ({}): {}",
            context,
            path.display(),
            err
        ))),
    }
}

fn ensure_file_writable(path: &Path, context: &str) -> Result<(), ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::ValidationError(format!(
            "{} (not a file): {}",
            context,
            path.display()
        )));
    }

    fs::OpenOptions::new()
        .append(true)
        .open(path)
        .map(|_| ())
        .map_err(|err| {
            ConfigError::ValidationError(format!("{} ({}): {}", context, path.display(), err))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_fixtures::TestFixtureRoot;

    #[test]
    fn requires_config_and_users_files() {
        let fixture = TestFixtureRoot::new_unique("paths-missing").unwrap();
        let err = RuntimePaths::from_root(fixture.path()).unwrap_err();
        assert!(err.to_string().contains("Config file must be writable"));
    }

    #[test]
    fn creates_state_dir() {
        let fixture = TestFixtureRoot::new_unique("paths-state").unwrap();
        fs::write(fixture.path().join(CONFIG_FILE_NAME), "").unwrap();
        fs::write(fixture.path().join(USERS_FILE_NAME), "").unwrap();

        let paths = RuntimePaths::from_root(fixture.path()).unwrap();
        assert!(paths.state_dir.is_dir());
        assert_eq!(paths.data_file, paths.state_dir.join(DATA_FILE_NAME));
    }
}
