// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Blog domain: categories, posts and tags over a single locked snapshot.
//!
//! Every mutating operation takes `&mut BlogData` plus an explicit `now`
//! and is meant to run inside [`store::BlogStore::write`].

pub mod category;
pub mod clock;
pub mod error;
pub mod fields;
pub mod post;
pub mod query;
pub mod slug;
pub mod store;
pub mod tag;
pub mod text;
pub mod yaml_store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{BlogError, BlogResult, FieldErrors, Resource};
pub use store::{BlogData, BlogStore};
