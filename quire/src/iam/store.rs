// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::types::{IamError, UsersData};
use crate::blog::yaml_store::{read_snapshot, write_snapshot};
use std::path::PathBuf;
use std::sync::RwLock;

pub trait UserStore: Send + Sync {
    fn load(&self) -> Result<UsersData, IamError>;
    fn save(&self, users: &UsersData) -> Result<(), IamError>;
}

pub struct FileUserStore {
    users_file: PathBuf,
}

impl FileUserStore {
    pub fn new(users_file: PathBuf) -> Result<Self, IamError> {
        if users_file.as_os_str().is_empty() {
            return Err(IamError::FileError("Users file path is empty".to_string()));
        }

        Ok(Self { users_file })
    }
}

impl UserStore for FileUserStore {
    fn load(&self) -> Result<UsersData, IamError> {
        read_snapshot::<UsersData>(&self.users_file)
            .map(Option::unwrap_or_default)
            .map_err(|e| IamError::ParseError(format!("Failed to load users file: {}", e)))
    }

    fn save(&self, users: &UsersData) -> Result<(), IamError> {
        write_snapshot(&self.users_file, users)
            .map_err(|e| IamError::FileError(format!("Failed to save users file: {}", e)))
    }
}

/// Users held only in memory; tests and throwaway servers.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<UsersData>,
}

impl MemoryUserStore {
    pub fn new(initial: UsersData) -> Self {
        Self {
            users: RwLock::new(initial),
        }
    }
}

impl UserStore for MemoryUserStore {
    fn load(&self) -> Result<UsersData, IamError> {
        match self.users.read() {
            Ok(guard) => Ok(guard.clone()),
            Err(poisoned) => {
                log::error!("MemoryUserStore lock poisoned on read; recovering");
                Ok(poisoned.into_inner().clone())
            }
        }
    }

    fn save(&self, users: &UsersData) -> Result<(), IamError> {
        match self.users.write() {
            Ok(mut guard) => {
                *guard = users.clone();
                Ok(())
            }
            Err(poisoned) => {
                log::error!("MemoryUserStore lock poisoned on write; recovering");
                let mut guard = poisoned.into_inner();
                *guard = users.clone();
                Ok(())
            }
        }
    }
}
