// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::category;
use super::error::{BlogError, BlogResult, FieldErrors, Resource};
use super::fields::{self, MAX_NAME_CHARS, nullable};
use super::query::{self, SortDirection};
use super::slug::slugify;
use super::store::{BlogData, PostLike, PostTag};
use super::tag::{self, Tag};
use super::text;
use crate::util::sha256_hex;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

pub const DEFAULT_RELATED_LIMIT: usize = 5;
pub const DEFAULT_POPULAR_DAYS: i64 = 30;

pub const ORDER_COLUMNS: &[&str] = &[
    "id",
    "title",
    "slug",
    "published_at",
    "created_at",
    "updated_at",
    "view_count",
    "like_count",
    "comment_count",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
    Archived,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Archived => "archived",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(PostStatus::Draft),
            "published" => Some(PostStatus::Published),
            "archived" => Some(PostStatus::Archived),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
    PasswordProtected,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::PasswordProtected => "password_protected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "public" => Some(Visibility::Public),
            "private" => Some(Visibility::Private),
            "password_protected" => Some(Visibility::PasswordProtected),
            _ => None,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    pub content: String,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub meta_keywords: Option<Vec<String>>,
    pub status: PostStatus,
    pub visibility: Visibility,
    /// SHA-256 hex digest; only set while the post is password protected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default = "default_true")]
    pub allow_comments: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_sticky: bool,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    pub author_id: u64,
    #[serde(default)]
    pub category_id: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Status published with a publication time that has already passed.
    pub fn is_published(&self, now: DateTime<Utc>) -> bool {
        self.status == PostStatus::Published && self.published_at.is_some_and(|at| at <= now)
    }

    pub fn is_draft(&self) -> bool {
        self.status == PostStatus::Draft
    }

    pub fn is_archived(&self) -> bool {
        self.status == PostStatus::Archived
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }

    pub fn is_password_protected(&self) -> bool {
        self.visibility == Visibility::PasswordProtected
    }

    pub fn publish(&mut self, now: DateTime<Utc>) {
        self.status = PostStatus::Published;
        self.published_at = Some(self.published_at.unwrap_or(now));
        self.updated_at = now;
    }

    pub fn unpublish(&mut self, now: DateTime<Utc>) {
        self.status = PostStatus::Draft;
        self.published_at = None;
        self.updated_at = now;
    }

    pub fn archive(&mut self, now: DateTime<Utc>) {
        self.status = PostStatus::Archived;
        self.updated_at = now;
    }

    pub fn reading_time(&self) -> u32 {
        text::reading_time(&self.content)
    }

    /// Stored excerpt, or one cut from the plain-text content.
    pub fn excerpt_text(&self) -> String {
        match self.excerpt.as_deref().filter(|value| !value.is_empty()) {
            Some(excerpt) => excerpt.to_string(),
            None => text::excerpt_from(&self.content),
        }
    }

    pub fn meta_title_text(&self) -> String {
        self.meta_title
            .clone()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| self.title.clone())
    }

    pub fn meta_description_text(&self) -> String {
        self.meta_description
            .clone()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| self.excerpt_text())
    }

    pub fn meta_keywords_string(&self) -> String {
        self.meta_keywords
            .as_deref()
            .map(|keywords| keywords.join(", "))
            .unwrap_or_default()
    }

    /// e.g. "October 18, 2026".
    pub fn formatted_published_date(&self) -> String {
        match self.published_at {
            Some(at) => at.format("%B %-d, %Y").to_string(),
            None => "Not published".to_string(),
        }
    }

    fn sequence_key(&self) -> Option<(DateTime<Utc>, u64)> {
        self.published_at.map(|at| (at, self.id))
    }
}

/// A user who can author posts, as far as the blog needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub id: u64,
    pub name: String,
}

pub trait AuthorDirectory: Send + Sync {
    fn author(&self, id: u64) -> Option<Author>;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub excerpt: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub featured_image: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub meta_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub meta_description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub meta_keywords: Option<Option<Vec<String>>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub allow_comments: Option<bool>,
    #[serde(default)]
    pub is_featured: Option<bool>,
    #[serde(default)]
    pub is_sticky: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub published_at: Option<Option<String>>,
    #[serde(default)]
    pub author_id: Option<u64>,
    #[serde(default, deserialize_with = "nullable")]
    pub category_id: Option<Option<u64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Option<Option<Vec<u64>>>,
}

/// Listing filters. `status` and `visibility` hold raw query values; when
/// absent the listing falls back to the published scope and public posts.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub status: Option<String>,
    pub visibility: Option<String>,
    pub category_id: Option<u64>,
    pub author_id: Option<u64>,
    pub tag_id: Option<u64>,
    pub title: Option<String>,
    pub search: Option<String>,
    pub featured: bool,
    pub sticky: bool,
    pub popular_days: Option<i64>,
    pub recent: bool,
    pub order_by: Option<String>,
    pub order_direction: Option<String>,
}

pub fn find(data: &BlogData, id: u64) -> BlogResult<&Post> {
    data.posts
        .get(&id)
        .filter(|post| post.is_live())
        .ok_or(BlogError::NotFound(Resource::Post))
}

fn find_mut(data: &mut BlogData, id: u64) -> BlogResult<&mut Post> {
    data.posts
        .get_mut(&id)
        .filter(|post| post.is_live())
        .ok_or(BlogError::NotFound(Resource::Post))
}

/// Only the author may change a post.
pub fn ensure_can_manage(post: &Post, actor: Option<u64>) -> BlogResult<()> {
    match actor {
        None => Err(BlogError::Unauthenticated),
        Some(user_id) if user_id == post.author_id => Ok(()),
        Some(user_id) => {
            log::warn!("User {} may not manage post {}", user_id, post.id);
            Err(BlogError::Forbidden)
        }
    }
}

/// Live posts that are published as of `now`.
pub fn published(data: &BlogData, now: DateTime<Utc>) -> impl Iterator<Item = &Post> {
    data.posts
        .values()
        .filter(move |post| post.is_live() && post.is_published(now))
}

pub fn tag_ids(data: &BlogData, post_id: u64) -> BTreeSet<u64> {
    data.post_tags
        .range(PostTag { post_id, tag_id: 0 }..=PostTag { post_id, tag_id: u64::MAX })
        .map(|link| link.tag_id)
        .collect()
}

pub fn tags(data: &BlogData, post_id: u64) -> Vec<&Tag> {
    tag_ids(data, post_id)
        .into_iter()
        .filter_map(|id| tag::find(data, id).ok())
        .collect()
}

fn newest_first(a: &&Post, b: &&Post) -> Ordering {
    b.published_at
        .cmp(&a.published_at)
        .then_with(|| b.id.cmp(&a.id))
}

/// Published posts sharing the category or any tag, newest first.
pub fn related<'a>(data: &'a BlogData, id: u64, limit: usize, now: DateTime<Utc>) -> BlogResult<Vec<&'a Post>> {
    let post = find(data, id)?;
    let own_tags = tag_ids(data, id);
    let mut rows: Vec<&Post> = published(data, now)
        .filter(|other| other.id != post.id)
        .filter(|other| {
            let same_category = post.category_id.is_some() && other.category_id == post.category_id;
            same_category || tag_ids(data, other.id).iter().any(|tag_id| own_tags.contains(tag_id))
        })
        .collect();
    rows.sort_by(newest_first);
    rows.truncate(limit);
    Ok(rows)
}

/// The published post immediately after this one in `(published_at, id)` order.
pub fn next(data: &BlogData, id: u64, now: DateTime<Utc>) -> BlogResult<Option<&Post>> {
    let post = find(data, id)?;
    let Some(key) = post.sequence_key() else {
        return Ok(None);
    };
    Ok(published(data, now)
        .filter(|other| other.sequence_key().is_some_and(|other_key| other_key > key))
        .min_by_key(|other| other.sequence_key()))
}

pub fn previous(data: &BlogData, id: u64, now: DateTime<Utc>) -> BlogResult<Option<&Post>> {
    let post = find(data, id)?;
    let Some(key) = post.sequence_key() else {
        return Ok(None);
    };
    Ok(published(data, now)
        .filter(|other| other.sequence_key().is_some_and(|other_key| other_key < key))
        .max_by_key(|other| other.sequence_key()))
}

/// Start of a trailing popularity window of `days` ending at `now`.
///
/// Negative or out-of-range spans are rejected as a `days` field error.
pub fn popular_since(days: i64, now: DateTime<Utc>) -> BlogResult<DateTime<Utc>> {
    if days < 0 {
        return Err(BlogError::field("days", "The days must be at least 0."));
    }
    TimeDelta::try_days(days)
        .and_then(|span| now.checked_sub_signed(span))
        .ok_or_else(|| BlogError::field("days", "The days is out of range."))
}

fn within_window(post: &Post, since: DateTime<Utc>) -> bool {
    post.published_at.is_some_and(|at| at >= since)
}

fn most_viewed(a: &&Post, b: &&Post) -> Ordering {
    b.view_count.cmp(&a.view_count)
}

/// Published in the trailing `days`, most viewed first.
pub fn popular(data: &BlogData, days: i64, now: DateTime<Utc>) -> BlogResult<Vec<&Post>> {
    let since = popular_since(days, now)?;
    let mut rows: Vec<&Post> = published(data, now).filter(|post| within_window(post, since)).collect();
    rows.sort_by(|a, b| most_viewed(a, b).then_with(|| a.id.cmp(&b.id)));
    Ok(rows)
}

/// Count a view and return the post as it now stands.
pub fn record_view(data: &mut BlogData, id: u64) -> BlogResult<Post> {
    let post = find_mut(data, id)?;
    post.view_count = post.view_count.saturating_add(1);
    Ok(post.clone())
}

pub fn like(data: &mut BlogData, post_id: u64, user_id: u64) -> BlogResult<u64> {
    find(data, post_id)?;
    if !data.post_likes.insert(PostLike { post_id, user_id }) {
        log::debug!("User {} already liked post {}", user_id, post_id);
        return Err(BlogError::conflict("Post already liked"));
    }
    let post = find_mut(data, post_id)?;
    post.like_count = post.like_count.saturating_add(1);
    Ok(post.like_count)
}

pub fn unlike(data: &mut BlogData, post_id: u64, user_id: u64) -> BlogResult<u64> {
    find(data, post_id)?;
    if !data.post_likes.remove(&PostLike { post_id, user_id }) {
        log::debug!("User {} has not liked post {}", user_id, post_id);
        return Err(BlogError::conflict("Post not liked"));
    }
    let post = find_mut(data, post_id)?;
    post.like_count = post.like_count.saturating_sub(1);
    Ok(post.like_count)
}

pub fn publish(data: &mut BlogData, id: u64, actor: Option<u64>, now: DateTime<Utc>) -> BlogResult<Post> {
    transition(data, id, actor, |post| post.publish(now))
}

pub fn unpublish(data: &mut BlogData, id: u64, actor: Option<u64>, now: DateTime<Utc>) -> BlogResult<Post> {
    transition(data, id, actor, |post| post.unpublish(now))
}

pub fn archive(data: &mut BlogData, id: u64, actor: Option<u64>, now: DateTime<Utc>) -> BlogResult<Post> {
    transition(data, id, actor, |post| post.archive(now))
}

fn transition(
    data: &mut BlogData,
    id: u64,
    actor: Option<u64>,
    apply: impl FnOnce(&mut Post),
) -> BlogResult<Post> {
    let post = find_mut(data, id)?;
    ensure_can_manage(post, actor)?;
    apply(post);
    log::info!("Post {} is now {}", id, post.status.as_str());
    Ok(post.clone())
}

fn parse_published_at(errors: &mut FieldErrors, raw: Option<&Option<String>>) -> Option<DateTime<Utc>> {
    let raw = raw?.as_deref()?.trim();
    if raw.is_empty() {
        return None;
    }
    match DateTime::parse_from_rfc3339(raw) {
        Ok(at) => Some(at.with_timezone(&Utc)),
        Err(_) => {
            errors.add("published_at", "The published at is not a valid date.");
            None
        }
    }
}

fn check_choice<T>(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    required: bool,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    match value {
        None if required => {
            errors.add(field, fields::required_message(field));
            None
        }
        None => None,
        Some(raw) => {
            let parsed = parse(raw);
            if parsed.is_none() {
                errors.add(field, fields::invalid_selection_message(field));
            }
            parsed
        }
    }
}

fn check_references(data: &BlogData, errors: &mut FieldErrors, input: &PostInput) {
    if let Some(Some(category_id)) = input.category_id
        && category::find(data, category_id).is_err()
    {
        errors.add("category_id", fields::invalid_selection_message("category_id"));
    }
    if let Some(Some(tag_ids)) = &input.tags {
        for (index, tag_id) in tag_ids.iter().enumerate() {
            if tag::find(data, *tag_id).is_err() {
                let field = format!("tags.{}", index);
                errors.add(&field, fields::invalid_selection_message(&field));
            }
        }
    }
}

fn check_password(errors: &mut FieldErrors, visibility: Option<Visibility>, password: Option<&str>, stored: bool) {
    let provided = password.is_some_and(|value| !value.is_empty());
    if visibility == Some(Visibility::PasswordProtected) && !provided && !stored {
        errors.add(
            "password",
            "The password field is required when visibility is password protected.",
        );
    }
}

fn slug_taken(data: &BlogData, slug: &str, except: Option<u64>) -> bool {
    data.posts
        .values()
        .any(|post| post.slug == slug && Some(post.id) != except)
}

fn resolve_slug(data: &BlogData, requested: Option<&str>, title: &str, except: Option<u64>) -> BlogResult<String> {
    let slug = match requested.filter(|raw| !raw.trim().is_empty()) {
        Some(raw) => slugify(raw),
        None => slugify(title),
    };
    if slug.is_empty() {
        return Err(BlogError::field("slug", fields::required_message("slug")));
    }
    if slug_taken(data, &slug, except) {
        return Err(BlogError::field("slug", fields::taken_message("slug")));
    }
    Ok(slug)
}

fn attach_tags(data: &mut BlogData, post_id: u64, tag_ids: &[u64]) {
    for tag_id in tag_ids {
        data.post_tags.insert(PostTag {
            post_id,
            tag_id: *tag_id,
        });
    }
}

fn detach_all_tags(data: &mut BlogData, post_id: u64) {
    data.post_tags.retain(|link| link.post_id != post_id);
}

pub fn create(
    data: &mut BlogData,
    input: PostInput,
    actor: Option<u64>,
    authors: &dyn AuthorDirectory,
    now: DateTime<Utc>,
) -> BlogResult<u64> {
    let mut errors = FieldErrors::new();
    fields::require_text(&mut errors, "title", input.title.as_deref(), Some(MAX_NAME_CHARS));
    fields::require_text(&mut errors, "content", input.content.as_deref(), None);
    fields::check_max(&mut errors, "slug", input.slug.as_deref(), Some(MAX_NAME_CHARS));
    fields::check_max(&mut errors, "meta_title", input.meta_title.clone().flatten().as_deref(), Some(MAX_NAME_CHARS));
    let status = check_choice(&mut errors, "status", input.status.as_deref(), true, PostStatus::parse);
    let visibility = check_choice(&mut errors, "visibility", input.visibility.as_deref(), true, Visibility::parse);
    check_password(&mut errors, visibility, input.password.as_deref(), false);
    let explicit_published_at = parse_published_at(&mut errors, input.published_at.as_ref());

    let author_id = input.author_id.or(actor);
    match author_id {
        None => errors.add("author_id", fields::required_message("author_id")),
        Some(id) if authors.author(id).is_none() => {
            errors.add("author_id", fields::invalid_selection_message("author_id"))
        }
        Some(_) => {}
    }
    check_references(data, &mut errors, &input);
    errors.into_result()?;

    let (Some(status), Some(visibility), Some(author_id)) = (status, visibility, author_id) else {
        return Err(BlogError::storage("Validated post input is incomplete"));
    };
    let title = input.title.unwrap_or_default().trim().to_string();
    let slug = resolve_slug(data, input.slug.as_deref(), &title, None)?;
    let published_at = match status {
        PostStatus::Published => Some(explicit_published_at.unwrap_or(now)),
        _ => None,
    };
    let password_hash = match visibility {
        Visibility::PasswordProtected => input.password.as_deref().map(sha256_hex),
        _ => None,
    };

    let id = data.next_post_id();
    let post = Post {
        id,
        title,
        slug,
        excerpt: fields::non_blank(input.excerpt.flatten()),
        content: input.content.unwrap_or_default(),
        featured_image: fields::non_blank(input.featured_image.flatten()),
        meta_title: fields::non_blank(input.meta_title.flatten()),
        meta_description: fields::non_blank(input.meta_description.flatten()),
        meta_keywords: input.meta_keywords.flatten(),
        status,
        visibility,
        password_hash,
        allow_comments: input.allow_comments.unwrap_or(true),
        is_featured: input.is_featured.unwrap_or(false),
        is_sticky: input.is_sticky.unwrap_or(false),
        view_count: 0,
        like_count: 0,
        comment_count: 0,
        published_at,
        author_id,
        category_id: input.category_id.flatten(),
        created_at: now,
        updated_at: now,
        deleted_at: None,
    };
    data.posts.insert(id, post);
    if let Some(Some(tag_ids)) = &input.tags {
        attach_tags(data, id, tag_ids);
    }
    log::info!("Created post {} by author {}", id, author_id);
    Ok(id)
}

pub fn update(
    data: &mut BlogData,
    id: u64,
    input: PostInput,
    actor: Option<u64>,
    authors: &dyn AuthorDirectory,
    now: DateTime<Utc>,
) -> BlogResult<()> {
    let current = find(data, id)?.clone();
    ensure_can_manage(&current, actor)?;

    let mut errors = FieldErrors::new();
    fields::sometimes_text(&mut errors, "title", input.title.as_deref(), Some(MAX_NAME_CHARS));
    fields::sometimes_text(&mut errors, "content", input.content.as_deref(), None);
    fields::check_max(&mut errors, "slug", input.slug.as_deref(), Some(MAX_NAME_CHARS));
    fields::check_max(&mut errors, "meta_title", input.meta_title.clone().flatten().as_deref(), Some(MAX_NAME_CHARS));
    let status = check_choice(&mut errors, "status", input.status.as_deref(), false, PostStatus::parse);
    let visibility = check_choice(&mut errors, "visibility", input.visibility.as_deref(), false, Visibility::parse);
    let stays_protected = current.password_hash.is_some() && visibility.is_none_or(|v| v == current.visibility);
    check_password(&mut errors, visibility, input.password.as_deref(), stays_protected);
    let explicit_published_at = parse_published_at(&mut errors, input.published_at.as_ref());
    if let Some(author_id) = input.author_id
        && authors.author(author_id).is_none()
    {
        errors.add("author_id", fields::invalid_selection_message("author_id"));
    }
    check_references(data, &mut errors, &input);
    errors.into_result()?;

    let slug = match input.slug.as_deref().filter(|raw| !raw.trim().is_empty()) {
        Some(raw) => resolve_slug(data, Some(raw), &current.title, Some(id))?,
        None => current.slug.clone(),
    };

    let mut post = current;
    post.slug = slug;
    if let Some(title) = input.title {
        post.title = title.trim().to_string();
    }
    if let Some(content) = input.content {
        post.content = content;
    }
    if let Some(excerpt) = input.excerpt {
        post.excerpt = fields::non_blank(excerpt);
    }
    if let Some(featured_image) = input.featured_image {
        post.featured_image = fields::non_blank(featured_image);
    }
    if let Some(meta_title) = input.meta_title {
        post.meta_title = fields::non_blank(meta_title);
    }
    if let Some(meta_description) = input.meta_description {
        post.meta_description = fields::non_blank(meta_description);
    }
    if let Some(meta_keywords) = input.meta_keywords {
        post.meta_keywords = meta_keywords;
    }
    if let Some(status) = status {
        post.status = status;
    }
    if let Some(visibility) = visibility {
        post.visibility = visibility;
    }
    if post.visibility == Visibility::PasswordProtected {
        if let Some(password) = input.password.as_deref().filter(|value| !value.is_empty()) {
            post.password_hash = Some(sha256_hex(password));
        }
    } else {
        post.password_hash = None;
    }
    if let Some(allow_comments) = input.allow_comments {
        post.allow_comments = allow_comments;
    }
    if let Some(is_featured) = input.is_featured {
        post.is_featured = is_featured;
    }
    if let Some(is_sticky) = input.is_sticky {
        post.is_sticky = is_sticky;
    }
    if post.status == PostStatus::Published {
        if let Some(at) = explicit_published_at {
            post.published_at = Some(at);
        } else if post.published_at.is_none() {
            post.published_at = Some(now);
        }
    }
    if let Some(author_id) = input.author_id {
        post.author_id = author_id;
    }
    if let Some(category_id) = input.category_id {
        post.category_id = category_id;
    }
    post.updated_at = now;
    data.posts.insert(id, post);

    if let Some(tag_ids) = input.tags {
        detach_all_tags(data, id);
        attach_tags(data, id, &tag_ids.unwrap_or_default());
    }
    log::info!("Updated post {}", id);
    Ok(())
}

/// Soft-delete a post and drop its tag and like links.
pub fn delete(data: &mut BlogData, id: u64, actor: Option<u64>, now: DateTime<Utc>) -> BlogResult<()> {
    let post = find_mut(data, id)?;
    ensure_can_manage(post, actor)?;
    post.deleted_at = Some(now);
    post.updated_at = now;
    detach_all_tags(data, id);
    data.post_likes.retain(|like| like.post_id != id);
    log::info!("Deleted post {}", id);
    Ok(())
}

pub fn list<'a>(data: &'a BlogData, filter: &PostFilter, now: DateTime<Utc>) -> BlogResult<Vec<&'a Post>> {
    let order_by = query::sort_key(filter.order_by.as_deref(), ORDER_COLUMNS, "published_at")?;
    let direction = SortDirection::parse_or(filter.order_direction.as_deref(), SortDirection::Desc);
    let title = filter.title.as_deref().filter(|term| !term.is_empty());
    let search = filter.search.as_deref().filter(|term| !term.is_empty());
    let popular_since = filter.popular_days.map(|days| popular_since(days, now)).transpose()?;

    let mut rows: Vec<&Post> = data
        .posts
        .values()
        .filter(|post| post.is_live())
        .filter(|post| match filter.status.as_deref() {
            Some(status) => post.status.as_str() == status,
            None => post.is_published(now),
        })
        .filter(|post| match filter.visibility.as_deref() {
            Some(visibility) => post.visibility.as_str() == visibility,
            None => post.is_public(),
        })
        .filter(|post| filter.category_id.is_none_or(|id| post.category_id == Some(id)))
        .filter(|post| filter.author_id.is_none_or(|id| post.author_id == id))
        .filter(|post| {
            filter
                .tag_id
                .is_none_or(|tag_id| data.post_tags.contains(&PostTag { post_id: post.id, tag_id }))
        })
        .filter(|post| title.is_none_or(|term| query::contains_text(&post.title, term)))
        .filter(|post| search.is_none_or(|term| matches_search(post, term)))
        .filter(|post| !filter.featured || post.is_featured)
        .filter(|post| !filter.sticky || post.is_sticky)
        .filter(|post| popular_since.is_none_or(|since| within_window(post, since)))
        .collect();

    rows.sort_by(|a, b| {
        let popular = if popular_since.is_some() {
            most_viewed(a, b)
        } else {
            Ordering::Equal
        };
        let recent = if filter.recent {
            b.published_at.cmp(&a.published_at)
        } else {
            Ordering::Equal
        };
        popular
            .then(recent)
            .then_with(|| direction.apply(compare_by(a, b, order_by)))
            .then_with(|| a.id.cmp(&b.id))
    });
    Ok(rows)
}

/// Title, content or excerpt contains the term.
pub fn matches_search(post: &Post, term: &str) -> bool {
    query::contains_text(&post.title, term)
        || query::contains_text(&post.content, term)
        || query::contains_opt(post.excerpt.as_deref(), term)
}

fn compare_by(a: &Post, b: &Post, column: &str) -> Ordering {
    match column {
        "id" => a.id.cmp(&b.id),
        "title" => a.title.cmp(&b.title),
        "slug" => a.slug.cmp(&b.slug),
        "created_at" => a.created_at.cmp(&b.created_at),
        "updated_at" => a.updated_at.cmp(&b.updated_at),
        "view_count" => a.view_count.cmp(&b.view_count),
        "like_count" => a.like_count.cmp(&b.like_count),
        "comment_count" => a.comment_count.cmp(&b.comment_count),
        _ => a.published_at.cmp(&b.published_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blog::category::CategoryInput;
    use chrono::{Duration, TimeZone};

    struct Authors;

    impl AuthorDirectory for Authors {
        fn author(&self, id: u64) -> Option<Author> {
            (id == 1 || id == 2).then(|| Author {
                id,
                name: format!("User {}", id),
            })
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap()
    }

    fn draft(title: &str, category_id: Option<u64>) -> PostInput {
        PostInput {
            title: Some(title.to_string()),
            content: Some("Some words here".to_string()),
            status: Some("draft".to_string()),
            visibility: Some("public".to_string()),
            author_id: Some(1),
            category_id: Some(category_id),
            ..PostInput::default()
        }
    }

    fn news(data: &mut BlogData) -> u64 {
        category::create(
            data,
            CategoryInput {
                name: Some("News".into()),
                ..Default::default()
            },
            t0(),
        )
        .unwrap()
    }

    #[test]
    fn publish_then_next_post_scenario() {
        let mut data = BlogData::default();
        let news = news(&mut data);
        let first = create(&mut data, draft("Hello World", Some(news)), None, &Authors, t0()).unwrap();

        let published = publish(&mut data, first, Some(1), t0()).unwrap();
        assert_eq!(published.status, PostStatus::Published);
        assert_eq!(published.published_at, Some(t0()));
        assert!(published.is_published(t0()));
        assert!(next(&data, first, t0()).unwrap().is_none());

        let later = t0() + Duration::hours(1);
        let second = create(&mut data, draft("Second", Some(news)), None, &Authors, later).unwrap();
        publish(&mut data, second, Some(1), later).unwrap();

        let next_post = next(&data, first, later).unwrap().map(|post| post.id);
        assert_eq!(next_post, Some(second));
        let previous_post = previous(&data, second, later).unwrap().map(|post| post.id);
        assert_eq!(previous_post, Some(first));
    }

    #[test]
    fn unpublish_clears_and_republish_takes_new_time() {
        let mut data = BlogData::default();
        let id = create(&mut data, draft("Cycle", None), None, &Authors, t0()).unwrap();
        publish(&mut data, id, Some(1), t0()).unwrap();
        let cleared = unpublish(&mut data, id, Some(1), t0()).unwrap();
        assert_eq!(cleared.published_at, None);
        assert!(cleared.is_draft());

        let later = t0() + Duration::minutes(5);
        let again = publish(&mut data, id, Some(1), later).unwrap();
        assert_eq!(again.published_at, Some(later));
    }

    #[test]
    fn archive_keeps_published_at_and_can_be_republished() {
        let mut data = BlogData::default();
        let id = create(&mut data, draft("Old", None), None, &Authors, t0()).unwrap();
        publish(&mut data, id, Some(1), t0()).unwrap();
        let archived = archive(&mut data, id, Some(1), t0() + Duration::days(1)).unwrap();
        assert_eq!(archived.published_at, Some(t0()));
        let back = publish(&mut data, id, Some(1), t0() + Duration::days(2)).unwrap();
        assert_eq!(back.published_at, Some(t0()));
    }

    #[test]
    fn scheduled_post_is_not_yet_published() {
        let mut data = BlogData::default();
        let mut input = draft("Future", None);
        input.status = Some("published".into());
        input.published_at = Some(Some("2026-10-19T09:00:00Z".into()));
        let id = create(&mut data, input, None, &Authors, t0()).unwrap();
        let post = find(&data, id).unwrap();
        assert_eq!(post.status, PostStatus::Published);
        assert!(!post.is_published(t0()));
        assert!(post.is_published(t0() + Duration::days(1)));
    }

    #[test]
    fn only_the_author_manages_a_post() {
        let mut data = BlogData::default();
        let id = create(&mut data, draft("Mine", None), None, &Authors, t0()).unwrap();
        assert!(matches!(publish(&mut data, id, None, t0()), Err(BlogError::Unauthenticated)));
        assert!(matches!(publish(&mut data, id, Some(2), t0()), Err(BlogError::Forbidden)));
        assert!(matches!(delete(&mut data, id, Some(2), t0()), Err(BlogError::Forbidden)));
        assert!(find(&data, id).unwrap().is_draft());
    }

    #[test]
    fn likes_reject_duplicates_and_redundant_unlikes() {
        let mut data = BlogData::default();
        let id = create(&mut data, draft("Likeable", None), None, &Authors, t0()).unwrap();

        assert_eq!(like(&mut data, id, 2).unwrap(), 1);
        assert!(matches!(like(&mut data, id, 2), Err(BlogError::Conflict(_))));
        assert_eq!(find(&data, id).unwrap().like_count, 1);

        assert!(matches!(unlike(&mut data, id, 1), Err(BlogError::Conflict(_))));
        assert_eq!(find(&data, id).unwrap().like_count, 1);
        assert_eq!(unlike(&mut data, id, 2).unwrap(), 0);
        assert!(!data.post_likes.contains(&PostLike { post_id: id, user_id: 2 }));
    }

    #[test]
    fn related_matches_category_or_tag() {
        let mut data = BlogData::default();
        let news = news(&mut data);
        let rust = tag::find_or_create(&mut data, "Rust", t0()).unwrap();

        let mut base = draft("Base", None);
        base.tags = Some(Some(vec![rust]));
        let base = create(&mut data, base, None, &Authors, t0()).unwrap();

        let mut tagged = draft("Tagged", None);
        tagged.tags = Some(Some(vec![rust]));
        let tagged = create(&mut data, tagged, None, &Authors, t0()).unwrap();
        let unrelated = create(&mut data, draft("Unrelated", Some(news)), None, &Authors, t0()).unwrap();
        for id in [base, tagged, unrelated] {
            publish(&mut data, id, Some(1), t0()).unwrap();
        }

        let ids: Vec<u64> = related(&data, base, 5, t0()).unwrap().iter().map(|post| post.id).collect();
        assert_eq!(ids, vec![tagged]);
    }

    #[test]
    fn equal_timestamps_use_id_as_tie_break() {
        let mut data = BlogData::default();
        let ids: Vec<u64> = (0..3)
            .map(|n| {
                let id = create(&mut data, draft(&format!("Same {}", n), None), None, &Authors, t0()).unwrap();
                publish(&mut data, id, Some(1), t0()).unwrap();
                id
            })
            .collect();
        assert_eq!(next(&data, ids[0], t0()).unwrap().map(|p| p.id), Some(ids[1]));
        assert_eq!(previous(&data, ids[2], t0()).unwrap().map(|p| p.id), Some(ids[1]));
        assert!(previous(&data, ids[0], t0()).unwrap().is_none());
    }

    #[test]
    fn validation_reports_every_field() {
        let mut data = BlogData::default();
        let input = PostInput {
            status: Some("live".into()),
            visibility: Some("password_protected".into()),
            author_id: Some(99),
            tags: Some(Some(vec![42])),
            ..PostInput::default()
        };
        let Err(BlogError::Validation(errors)) = create(&mut data, input, None, &Authors, t0()) else {
            panic!("expected validation failure");
        };
        for field in ["title", "content", "status", "password", "author_id", "tags.0"] {
            assert!(errors.contains(field), "missing {field}");
        }
        assert!(data.posts.is_empty());
    }

    #[test]
    fn password_is_hashed_and_cleared_when_made_public() {
        let mut data = BlogData::default();
        let mut input = draft("Secret", None);
        input.visibility = Some("password_protected".into());
        input.password = Some("hunter2".into());
        let id = create(&mut data, input, None, &Authors, t0()).unwrap();
        assert_eq!(find(&data, id).unwrap().password_hash.as_deref(), Some(sha256_hex("hunter2").as_str()));

        let public = PostInput {
            visibility: Some("public".into()),
            ..PostInput::default()
        };
        update(&mut data, id, public, Some(1), &Authors, t0()).unwrap();
        assert_eq!(find(&data, id).unwrap().password_hash, None);
    }

    #[test]
    fn delete_drops_links() {
        let mut data = BlogData::default();
        let rust = tag::find_or_create(&mut data, "Rust", t0()).unwrap();
        let mut input = draft("Doomed", None);
        input.tags = Some(Some(vec![rust]));
        let id = create(&mut data, input, None, &Authors, t0()).unwrap();
        like(&mut data, id, 2).unwrap();

        delete(&mut data, id, Some(1), t0()).unwrap();
        assert!(find(&data, id).is_err());
        assert!(data.post_tags.is_empty());
        assert!(data.post_likes.is_empty());
    }

    #[test]
    fn listing_defaults_to_published_public() {
        let mut data = BlogData::default();
        let visible = create(&mut data, draft("Visible", None), None, &Authors, t0()).unwrap();
        publish(&mut data, visible, Some(1), t0()).unwrap();
        create(&mut data, draft("Hidden draft", None), None, &Authors, t0()).unwrap();
        let mut private = draft("Private", None);
        private.visibility = Some("private".into());
        private.status = Some("published".into());
        create(&mut data, private, None, &Authors, t0()).unwrap();

        let rows = list(&data, &PostFilter::default(), t0()).unwrap();
        assert_eq!(rows.iter().map(|post| post.id).collect::<Vec<_>>(), vec![visible]);

        let drafts = list(
            &data,
            &PostFilter {
                status: Some("draft".into()),
                ..Default::default()
            },
            t0(),
        )
        .unwrap();
        assert_eq!(drafts.len(), 1);
    }

    #[test]
    fn popular_listing_sorts_by_views() {
        let mut data = BlogData::default();
        let quiet = create(&mut data, draft("Quiet", None), None, &Authors, t0()).unwrap();
        let loud = create(&mut data, draft("Loud", None), None, &Authors, t0()).unwrap();
        for id in [quiet, loud] {
            publish(&mut data, id, Some(1), t0()).unwrap();
        }
        record_view(&mut data, loud).unwrap();
        record_view(&mut data, loud).unwrap();
        record_view(&mut data, quiet).unwrap();

        let filter = PostFilter {
            popular_days: Some(DEFAULT_POPULAR_DAYS),
            ..Default::default()
        };
        let rows = list(&data, &filter, t0()).unwrap();
        assert_eq!(rows[0].id, loud);
        assert_eq!(popular(&data, 30, t0()).unwrap()[0].id, loud);
        assert!(popular(&data, 30, t0() + Duration::days(31)).unwrap().is_empty());
    }

    #[test]
    fn popular_window_rejects_unrepresentable_spans() {
        let mut data = BlogData::default();
        let id = create(&mut data, draft("Old news", None), None, &Authors, t0()).unwrap();
        publish(&mut data, id, Some(1), t0()).unwrap();

        for days in [-1, 1_000_000_000, i64::MAX] {
            let err = popular(&data, days, t0()).unwrap_err();
            assert!(matches!(&err, BlogError::Validation(errors) if errors.contains("days")), "{days}");
        }
        let filter = PostFilter {
            popular_days: Some(1_000_000_000),
            ..Default::default()
        };
        assert!(matches!(list(&data, &filter, t0()), Err(BlogError::Validation(_))));
        assert_eq!(popular(&data, 0, t0()).unwrap().len(), 1);
    }

    #[test]
    fn derived_text_fields() {
        let mut data = BlogData::default();
        let mut input = draft("Meta", None);
        input.content = Some("<p>Hello <b>world</b></p>".into());
        input.meta_keywords = Some(Some(vec!["rust".into(), "blog".into()]));
        let id = create(&mut data, input, None, &Authors, t0()).unwrap();
        let post = find(&data, id).unwrap();

        assert_eq!(post.excerpt_text(), "Hello world");
        assert_eq!(post.meta_title_text(), "Meta");
        assert_eq!(post.meta_description_text(), "Hello world");
        assert_eq!(post.meta_keywords_string(), "rust, blog");
        assert_eq!(post.reading_time(), 1);
        assert_eq!(post.formatted_published_date(), "Not published");
        let published = publish(&mut data, id, Some(1), t0()).unwrap();
        assert_eq!(published.formatted_published_date(), "October 18, 2026");
    }
}
