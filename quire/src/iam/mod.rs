// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod middleware;
mod service;
mod store;
pub(crate) mod types;

pub use middleware::{AuthRequest, TokenAuthMiddlewareFactory};
pub use service::UserDirectory;
pub use store::{FileUserStore, MemoryUserStore, UserStore};
pub use types::{IamError, User, UsersData, YamlUser};
