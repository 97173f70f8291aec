// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::store::{MemoryUserStore, UserStore};
use super::types::{IamError, User, UsersData, YamlUser};
use crate::blog::post::{Author, AuthorDirectory};
use crate::util::sha256_hex;
use std::sync::{Arc, RwLock};
use uuid::Uuid;
use validator::ValidateEmail;

pub const MAX_EMAIL_CHARS: usize = 128;
pub const MAX_NAME_CHARS: usize = 256;

/// Registered API users, cached in memory and persisted through a [`UserStore`].
#[derive(Clone)]
pub struct UserDirectory {
    users_data: Arc<RwLock<UsersData>>,
    store: Arc<dyn UserStore>,
}

impl UserDirectory {
    /// Load users from the store.
    pub fn new(store: Arc<dyn UserStore>) -> Result<Self, IamError> {
        let users = store.load()?;
        Ok(Self {
            users_data: Arc::new(RwLock::new(users)),
            store,
        })
    }

    pub fn in_memory(users: UsersData) -> Self {
        let store: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new(users.clone()));
        Self {
            users_data: Arc::new(RwLock::new(users)),
            store,
        }
    }

    fn with_users_read<T>(&self, f: impl FnOnce(&UsersData) -> T) -> T {
        match self.users_data.read() {
            Ok(guard) => f(&guard),
            Err(poisoned) => {
                log::error!("Users lock poisoned on read; recovering");
                f(&poisoned.into_inner())
            }
        }
    }

    pub fn get(&self, id: u64) -> Option<User> {
        self.with_users_read(|users| users.get(&id).cloned().map(|user| user.into_user(id)))
    }

    /// Resolve a bearer token. Only the token's digest is ever compared.
    pub fn find_by_token(&self, token: &str) -> Option<User> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        let digest = sha256_hex(token);
        self.with_users_read(|users| {
            users
                .iter()
                .find(|(_, user)| user.token_sha256 == digest)
                .map(|(id, user)| user.clone().into_user(*id))
        })
    }

    pub fn list(&self) -> Vec<User> {
        self.with_users_read(|users| {
            users
                .iter()
                .map(|(id, user)| user.clone().into_user(*id))
                .collect()
        })
    }

    /// Register a user under the next free id and return it with its
    /// freshly generated plaintext token.
    pub fn add_user(&self, name: &str, email: &str) -> Result<(User, String), IamError> {
        let name = validate_name_field(name)?;
        let email = validate_email_field(email)?;
        let token = Uuid::new_v4().simple().to_string();

        let mut guard = match self.users_data.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::error!("Users lock poisoned on write; reloading from store");
                let mut guard = poisoned.into_inner();
                *guard = self.store.load()?;
                self.users_data.clear_poison();
                guard
            }
        };

        if guard
            .values()
            .any(|user| user.email.eq_ignore_ascii_case(&email))
        {
            return Err(IamError::DuplicateEmail(email));
        }

        let id = guard.keys().next_back().map_or(1, |last| last + 1);
        let mut next = guard.clone();
        let record = YamlUser {
            name,
            email,
            token_sha256: sha256_hex(&token),
        };
        next.insert(id, record.clone());
        self.store.save(&next)?;
        *guard = next;

        log::info!("Added API user {} ({})", id, record.email);
        Ok((record.into_user(id), token))
    }
}

impl AuthorDirectory for UserDirectory {
    fn author(&self, id: u64) -> Option<Author> {
        self.get(id).map(|user| Author {
            id: user.id,
            name: user.name,
        })
    }
}

fn validate_name_field(name: &str) -> Result<String, IamError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(IamError::InvalidInput("Name is required".to_string()));
    }
    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(IamError::InvalidInput(format!(
            "Name must be at most {} characters",
            MAX_NAME_CHARS
        )));
    }
    Ok(trimmed.to_string())
}

fn validate_email_field(email: &str) -> Result<String, IamError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(IamError::InvalidInput("Email is required".to_string()));
    }
    if trimmed.chars().count() > MAX_EMAIL_CHARS {
        return Err(IamError::InvalidInput(format!(
            "Email must be at most {} characters",
            MAX_EMAIL_CHARS
        )));
    }
    if !trimmed.validate_email() {
        return Err(IamError::InvalidInput("Email format is invalid".to_string()));
    }
    Ok(trimmed.to_string())
}
