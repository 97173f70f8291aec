// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An authenticated API user, as attached to request extensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
}

// Structure matching the YAML file format
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct YamlUser {
    pub name: String,
    pub email: String,
    pub token_sha256: String,
}

impl YamlUser {
    pub fn into_user(self, id: u64) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
        }
    }
}

#[derive(Debug, Clone)]
pub enum IamError {
    InvalidInput(String),
    DuplicateEmail(String),
    FileError(String),
    ParseError(String),
}

impl std::fmt::Display for IamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IamError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            IamError::DuplicateEmail(email) => write!(f, "User already exists: {}", email),
            IamError::FileError(msg) => write!(f, "File error: {}", msg),
            IamError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for IamError {}

// The users.yaml file structure: user id -> yaml user data
pub type UsersData = BTreeMap<u64, YamlUser>;
