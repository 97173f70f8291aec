// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::category::Category;
use super::error::{BlogError, BlogResult};
use super::post::Post;
use super::tag::{self, Tag};
use super::yaml_store;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sequences {
    pub category: u64,
    pub post: u64,
    pub tag: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PostTag {
    pub post_id: u64,
    pub tag_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PostLike {
    pub post_id: u64,
    pub user_id: u64,
}

/// Everything the blog persists: entity tables plus the two join sets.
///
/// Rows are never physically removed; soft-deleted rows keep their id and
/// slug so sequences and slug uniqueness stay stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogData {
    pub sequences: Sequences,
    pub categories: BTreeMap<u64, Category>,
    pub posts: BTreeMap<u64, Post>,
    pub tags: BTreeMap<u64, Tag>,
    pub post_tags: BTreeSet<PostTag>,
    pub post_likes: BTreeSet<PostLike>,
}

impl BlogData {
    pub fn next_category_id(&mut self) -> u64 {
        self.sequences.category = self.sequences.category.max(max_key(&self.categories)) + 1;
        self.sequences.category
    }

    pub fn next_post_id(&mut self) -> u64 {
        self.sequences.post = self.sequences.post.max(max_key(&self.posts)) + 1;
        self.sequences.post
    }

    pub fn next_tag_id(&mut self) -> u64 {
        self.sequences.tag = self.sequences.tag.max(max_key(&self.tags)) + 1;
        self.sequences.tag
    }

    /// Post-mutation hook run by every write transaction.
    ///
    /// Writes derived counters straight onto the working copy; it never goes
    /// back through [`BlogStore::write`].
    pub fn after_write(&mut self) {
        let corrected = tag::reconcile_post_counts(self);
        if corrected > 0 {
            log::debug!("Reconciled post_count on {} tag(s)", corrected);
        }
    }
}

fn max_key<V>(map: &BTreeMap<u64, V>) -> u64 {
    map.keys().next_back().copied().unwrap_or(0)
}

/// Lock-guarded blog state with optional YAML persistence.
///
/// Reads share the lock. Writes run against a clone under the exclusive
/// lock, so a failing closure or a failed persist leaves the live state
/// untouched.
pub struct BlogStore {
    data_file: Option<PathBuf>,
    data: RwLock<BlogData>,
}

impl BlogStore {
    pub fn open(data_file: PathBuf) -> BlogResult<Self> {
        let mut data = Self::load_from_disk(&data_file)?;
        data.after_write();
        log::info!(
            "Loaded blog data from {} ({} categories, {} posts, {} tags)",
            data_file.display(),
            data.categories.len(),
            data.posts.len(),
            data.tags.len()
        );
        Ok(Self {
            data_file: Some(data_file),
            data: RwLock::new(data),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            data_file: None,
            data: RwLock::new(BlogData::default()),
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&BlogData) -> BlogResult<R>) -> BlogResult<R> {
        let guard = self
            .data
            .read()
            .map_err(|_| BlogError::storage("Blog store lock poisoned"))?;
        f(&guard)
    }

    /// Apply `f` to a copy and swap it in once persisted. Disk I/O happens
    /// on the calling thread with the exclusive lock held.
    pub fn write<R>(&self, f: impl FnOnce(&mut BlogData) -> BlogResult<R>) -> BlogResult<R> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| BlogError::storage("Blog store lock poisoned"))?;
        let mut working = guard.clone();
        let outcome = f(&mut working)?;
        working.after_write();
        if let Some(data_file) = &self.data_file {
            yaml_store::write_snapshot(data_file, &working).map_err(|err| {
                log::error!("Failed to persist blog data: {}", err);
                BlogError::storage(err.to_string())
            })?;
        }
        *guard = working;
        Ok(outcome)
    }

    fn load_from_disk(data_file: &Path) -> BlogResult<BlogData> {
        yaml_store::read_snapshot::<BlogData>(data_file)
            .map(Option::unwrap_or_default)
            .map_err(|err| BlogError::storage(err.to_string()))
    }
}
