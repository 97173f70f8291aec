// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::error::Error;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const MAX_TEMP_ATTEMPTS: u32 = 100;

#[derive(Debug)]
pub struct SnapshotError {
    message: String,
}

impl SnapshotError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for SnapshotError {}

/// Load a YAML snapshot. A missing or blank file reads as `None`.
pub fn read_snapshot<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, SnapshotError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|err| {
        SnapshotError::new(format!("Failed to read {}: {}", path.display(), err))
    })?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    serde_yaml::from_str(&content)
        .map(Some)
        .map_err(|err| SnapshotError::new(format!("Failed to parse {}: {}", path.display(), err)))
}

/// Replace the snapshot at `path` atomically: write a sibling temp file,
/// fsync it, then rename it over the target.
pub fn write_snapshot<T: Serialize>(path: &Path, value: &T) -> Result<(), SnapshotError> {
    let content = serde_yaml::to_string(value)
        .map_err(|err| SnapshotError::new(format!("Failed to serialize snapshot: {}", err)))?;
    let parent = path
        .parent()
        .ok_or_else(|| SnapshotError::new("Snapshot path has no parent directory"))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| SnapshotError::new("Snapshot path has no valid file name"))?;

    let (mut file, temp_path) = create_temp_file(parent, file_name)?;
    let discard = |message: String| {
        let _ = fs::remove_file(&temp_path);
        SnapshotError::new(message)
    };

    file.write_all(content.as_bytes())
        .map_err(|err| discard(format!("Failed to write snapshot temp file: {}", err)))?;
    file.sync_all()
        .map_err(|err| discard(format!("Failed to sync snapshot temp file: {}", err)))?;
    fs::rename(&temp_path, path)
        .map_err(|err| discard(format!("Failed to replace {}: {}", path.display(), err)))?;

    #[cfg(unix)]
    {
        if let Err(err) = fs::File::open(parent).and_then(|dir| dir.sync_all()) {
            log::warn!("Snapshot directory sync failed: {}", err);
        }
    }

    Ok(())
}

fn create_temp_file(parent: &Path, file_name: &str) -> Result<(fs::File, PathBuf), SnapshotError> {
    for attempt in 0..MAX_TEMP_ATTEMPTS {
        let temp_path = parent.join(format!(".{}.tmp.{}.{}", file_name, std::process::id(), attempt));
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
        {
            Ok(file) => return Ok((file, temp_path)),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(err) => {
                return Err(SnapshotError::new(format!(
                    "Failed to create snapshot temp file: {}",
                    err
                )));
            }
        }
    }
    Err(SnapshotError::new(
        "Failed to create snapshot temp file after multiple attempts",
    ))
}
