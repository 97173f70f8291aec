// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::error::{BlogError, BlogResult, FieldErrors, Resource};
use super::fields::{self, MAX_COLOR_CHARS, MAX_NAME_CHARS, nullable};
use super::post::{self, Post, PostStatus};
use super::query::{self, SortDirection};
use super::slug::slugify;
use super::store::BlogData;
use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_COLOR: &str = "#6B7280";
pub const DEFAULT_POST_LIMIT: usize = 5;
pub const DEFAULT_POPULAR_LIMIT: usize = 10;
pub const STATS_YEARS_BACK: i32 = 5;

pub const ORDER_COLUMNS: &[&str] = &["id", "name", "slug", "post_count", "created_at", "updated_at"];

const PALETTE: &[(&str, &str)] = &[
    ("#3B82F6", "blue"),
    ("#10B981", "green"),
    ("#F59E0B", "yellow"),
    ("#EF4444", "red"),
    ("#8B5CF6", "purple"),
    ("#F97316", "orange"),
    ("#06B6D4", "cyan"),
    ("#EC4899", "pink"),
    ("#6B7280", "gray"),
    ("#84CC16", "lime"),
];

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub name_ar: Option<String>,
    pub slug: String,
    #[serde(default)]
    pub slug_en: Option<String>,
    #[serde(default)]
    pub slug_ar: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub description_en: Option<String>,
    #[serde(default)]
    pub description_ar: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Mirror of the live association count; rewritten after every write.
    #[serde(default)]
    pub post_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Tag {
    pub fn new(id: u64, name: &str, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.to_string(),
            name_en: None,
            name_ar: None,
            slug: slugify(name),
            slug_en: None,
            slug_ar: None,
            description: None,
            description_en: None,
            description_ar: None,
            color: default_color(),
            is_active: true,
            post_count: 0,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    fn palette_name(&self) -> &'static str {
        PALETTE
            .iter()
            .find(|(hex, _)| hex.eq_ignore_ascii_case(&self.color))
            .map(|(_, name)| *name)
            .unwrap_or("gray")
    }

    pub fn color_class(&self) -> String {
        format!("bg-{}-500", self.palette_name())
    }

    pub fn text_color_class(&self) -> String {
        format!("text-{}-500", self.palette_name())
    }

    pub fn border_color_class(&self) -> String {
        format!("border-{}-500", self.palette_name())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub name_en: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub name_ar: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub slug_en: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub slug_ar: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description_en: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description_ar: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub color: Option<Option<String>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct TagFilter {
    pub active: Option<bool>,
    pub search: Option<String>,
    pub popular_limit: Option<usize>,
    pub order_by: Option<String>,
    pub order_direction: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagStatistics {
    pub post_count: u64,
    pub published_posts_count: usize,
    pub monthly_stats: BTreeMap<u32, usize>,
    pub yearly_stats: BTreeMap<i32, usize>,
}

pub fn find(data: &BlogData, id: u64) -> BlogResult<&Tag> {
    data.tags
        .get(&id)
        .filter(|tag| tag.is_live())
        .ok_or(BlogError::NotFound(Resource::Tag))
}

/// Recompute every tag's `post_count` from the live associations.
///
/// Returns how many tags were corrected.
pub fn reconcile_post_counts(data: &mut BlogData) -> usize {
    let mut counts: BTreeMap<u64, u64> = BTreeMap::new();
    for link in &data.post_tags {
        if data.posts.get(&link.post_id).is_some_and(Post::is_live) {
            *counts.entry(link.tag_id).or_default() += 1;
        }
    }
    let mut corrected = 0;
    for tag in data.tags.values_mut() {
        let actual = counts.get(&tag.id).copied().unwrap_or(0);
        if tag.post_count != actual {
            tag.post_count = actual;
            corrected += 1;
        }
    }
    corrected
}

/// Live posts linked to the tag, in id order.
pub fn posts(data: &BlogData, tag_id: u64) -> Vec<&Post> {
    let ids: BTreeSet<u64> = data
        .post_tags
        .iter()
        .filter(|link| link.tag_id == tag_id)
        .map(|link| link.post_id)
        .collect();
    ids.into_iter()
        .filter_map(|id| post::find(data, id).ok())
        .collect()
}

pub fn published_posts(data: &BlogData, tag_id: u64, now: DateTime<Utc>) -> Vec<&Post> {
    posts(data, tag_id)
        .into_iter()
        .filter(|post| post.is_published(now))
        .collect()
}

pub fn published_posts_count(data: &BlogData, tag_id: u64, now: DateTime<Utc>) -> usize {
    published_posts(data, tag_id, now).len()
}

/// Live association count, computed rather than read from `post_count`.
pub fn live_posts_count(data: &BlogData, tag_id: u64) -> usize {
    posts(data, tag_id).len()
}

/// Posts of a tag for the `/tags/{id}/posts` listing.
pub fn filtered_posts<'a>(
    data: &'a BlogData,
    tag_id: u64,
    status: Option<&str>,
    search: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<&'a Post> {
    let search = search.filter(|term| !term.is_empty());
    posts(data, tag_id)
        .into_iter()
        .filter(|post| match status {
            Some(status) => post.status.as_str() == status,
            None => post.is_published(now),
        })
        .filter(|post| {
            search.is_none_or(|term| {
                query::contains_text(&post.title, term) || query::contains_text(&post.content, term)
            })
        })
        .collect()
}

pub fn popular_posts(data: &BlogData, tag_id: u64, limit: usize, now: DateTime<Utc>) -> Vec<&Post> {
    let mut rows = published_posts(data, tag_id, now);
    rows.sort_by(|a, b| b.view_count.cmp(&a.view_count).then_with(|| a.id.cmp(&b.id)));
    rows.truncate(limit);
    rows
}

pub fn recent_posts(data: &BlogData, tag_id: u64, limit: usize, now: DateTime<Utc>) -> Vec<&Post> {
    let mut rows = published_posts(data, tag_id, now);
    rows.sort_by(|a, b| b.published_at.cmp(&a.published_at).then_with(|| b.id.cmp(&a.id)));
    rows.truncate(limit);
    rows
}

pub fn random_posts<'a, R: Rng + ?Sized>(
    data: &'a BlogData,
    tag_id: u64,
    limit: usize,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<&'a Post> {
    let mut rows = published_posts(data, tag_id, now);
    rows.shuffle(rng);
    rows.truncate(limit);
    rows
}

/// Other tags that share at least one post with this one, most used first.
pub fn related_tags(data: &BlogData, tag_id: u64, limit: usize) -> Vec<&Tag> {
    let post_ids: BTreeSet<u64> = posts(data, tag_id).iter().map(|post| post.id).collect();
    let related_ids: BTreeSet<u64> = data
        .post_tags
        .iter()
        .filter(|link| link.tag_id != tag_id && post_ids.contains(&link.post_id))
        .map(|link| link.tag_id)
        .collect();
    let mut rows: Vec<&Tag> = related_ids
        .into_iter()
        .filter_map(|id| find(data, id).ok())
        .collect();
    rows.sort_by(by_post_count_desc);
    rows.truncate(limit);
    rows
}

fn by_post_count_desc(a: &&Tag, b: &&Tag) -> Ordering {
    b.post_count.cmp(&a.post_count).then_with(|| a.id.cmp(&b.id))
}

fn published_in(post: &Post, year: i32, month: Option<u32>) -> bool {
    post.status == PostStatus::Published
        && post
            .published_at
            .is_some_and(|at| at.year() == year && month.is_none_or(|month| at.month() == month))
}

/// Published-post counts per month of `year` and per year over the trailing window.
pub fn statistics(data: &BlogData, tag_id: u64, year: i32, now: DateTime<Utc>) -> BlogResult<TagStatistics> {
    let tag = find(data, tag_id)?;
    let posts = posts(data, tag_id);
    let monthly_stats = (1..=12)
        .map(|month| {
            let count = posts.iter().filter(|post| published_in(post, year, Some(month))).count();
            (month, count)
        })
        .collect();
    let current_year = now.year();
    let yearly_stats = (current_year - STATS_YEARS_BACK..=current_year)
        .map(|year| {
            let count = posts.iter().filter(|post| published_in(post, year, None)).count();
            (year, count)
        })
        .collect();

    Ok(TagStatistics {
        post_count: tag.post_count,
        published_posts_count: published_posts_count(data, tag_id, now),
        monthly_stats,
        yearly_stats,
    })
}

/// Active tags, most used first.
pub fn popular_tags(data: &BlogData, limit: usize) -> Vec<&Tag> {
    let mut rows: Vec<&Tag> = data
        .tags
        .values()
        .filter(|tag| tag.is_live() && tag.is_active)
        .collect();
    rows.sort_by(by_post_count_desc);
    rows.truncate(limit);
    rows
}

/// Active tags paired with their live association count.
pub fn tags_with_post_count(data: &BlogData, limit: Option<usize>) -> Vec<(&Tag, usize)> {
    let mut rows = popular_tags(data, usize::MAX);
    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    rows.into_iter()
        .map(|tag| (tag, live_posts_count(data, tag.id)))
        .collect()
}

pub fn list<'a>(data: &'a BlogData, filter: &TagFilter) -> BlogResult<Vec<&'a Tag>> {
    let order_by = query::sort_key(filter.order_by.as_deref(), ORDER_COLUMNS, "post_count")?;
    let direction = SortDirection::parse_or(filter.order_direction.as_deref(), SortDirection::Desc);
    let search = filter.search.as_deref().filter(|term| !term.is_empty());

    let mut rows: Vec<&Tag> = data
        .tags
        .values()
        .filter(|tag| tag.is_live())
        .filter(|tag| filter.active.is_none_or(|active| tag.is_active == active))
        .filter(|tag| {
            search.is_none_or(|term| {
                query::contains_text(&tag.name, term) || query::contains_opt(tag.description.as_deref(), term)
            })
        })
        .collect();

    if let Some(limit) = filter.popular_limit {
        rows.sort_by(by_post_count_desc);
        rows.truncate(limit);
    }
    rows.sort_by(|a, b| {
        direction
            .apply(compare_by(a, b, order_by))
            .then_with(|| a.id.cmp(&b.id))
    });
    Ok(rows)
}

fn compare_by(a: &Tag, b: &Tag, column: &str) -> Ordering {
    match column {
        "id" => a.id.cmp(&b.id),
        "name" => a.name.cmp(&b.name),
        "slug" => a.slug.cmp(&b.slug),
        "created_at" => a.created_at.cmp(&b.created_at),
        "updated_at" => a.updated_at.cmp(&b.updated_at),
        _ => a.post_count.cmp(&b.post_count),
    }
}

fn name_taken(data: &BlogData, name: &str, except: Option<u64>) -> bool {
    data.tags
        .values()
        .any(|tag| tag.name == name && Some(tag.id) != except)
}

fn slug_taken(data: &BlogData, slug: &str, except: Option<u64>) -> bool {
    data.tags
        .values()
        .any(|tag| tag.slug == slug && Some(tag.id) != except)
}

fn resolve_slug(data: &BlogData, requested: Option<&str>, name: &str, except: Option<u64>) -> BlogResult<String> {
    let slug = match requested.filter(|raw| !raw.trim().is_empty()) {
        Some(raw) => slugify(raw),
        None => slugify(name),
    };
    if slug.is_empty() {
        return Err(BlogError::field("slug", fields::required_message("slug")));
    }
    if slug_taken(data, &slug, except) {
        return Err(BlogError::field("slug", fields::taken_message("slug")));
    }
    Ok(slug)
}

fn validate(data: &BlogData, input: &TagInput, id: Option<u64>) -> BlogResult<()> {
    let mut errors = FieldErrors::new();
    let name = input.name.as_deref().map(str::trim);
    if id.is_some() {
        fields::sometimes_text(&mut errors, "name", name, Some(MAX_NAME_CHARS));
    } else {
        fields::require_text(&mut errors, "name", name, Some(MAX_NAME_CHARS));
    }
    if let Some(name) = name
        && !name.is_empty()
        && name_taken(data, name, id)
    {
        errors.add("name", fields::taken_message("name"));
    }
    fields::check_max(&mut errors, "slug", input.slug.as_deref(), Some(MAX_NAME_CHARS));
    for (field, value) in [("name_en", &input.name_en), ("name_ar", &input.name_ar)] {
        fields::check_max(&mut errors, field, value.clone().flatten().as_deref(), Some(MAX_NAME_CHARS));
    }
    fields::check_max(&mut errors, "color", input.color.clone().flatten().as_deref(), Some(MAX_COLOR_CHARS));
    errors.into_result()
}

fn apply_optional(target: &mut Option<String>, value: Option<Option<String>>) {
    if let Some(value) = value {
        *target = fields::non_blank(value);
    }
}

pub fn create(data: &mut BlogData, input: TagInput, now: DateTime<Utc>) -> BlogResult<u64> {
    validate(data, &input, None)?;
    let name = input.name.clone().unwrap_or_default().trim().to_string();
    let slug = resolve_slug(data, input.slug.as_deref(), &name, None)?;

    let id = data.next_tag_id();
    let mut tag = Tag::new(id, &name, now);
    tag.slug = slug;
    apply_fields(&mut tag, input);
    log::info!("Created tag {} ({})", id, tag.slug);
    data.tags.insert(id, tag);
    Ok(id)
}

fn apply_fields(tag: &mut Tag, input: TagInput) {
    apply_optional(&mut tag.name_en, input.name_en);
    apply_optional(&mut tag.name_ar, input.name_ar);
    apply_optional(&mut tag.slug_en, input.slug_en);
    apply_optional(&mut tag.slug_ar, input.slug_ar);
    apply_optional(&mut tag.description, input.description);
    apply_optional(&mut tag.description_en, input.description_en);
    apply_optional(&mut tag.description_ar, input.description_ar);
    if let Some(color) = input.color {
        tag.color = fields::non_blank(color).unwrap_or_else(default_color);
    }
    if let Some(is_active) = input.is_active {
        tag.is_active = is_active;
    }
}

pub fn update(data: &mut BlogData, id: u64, input: TagInput, now: DateTime<Utc>) -> BlogResult<()> {
    let mut tag = find(data, id)?.clone();
    validate(data, &input, Some(id))?;
    if let Some(raw) = input.slug.as_deref().filter(|raw| !raw.trim().is_empty()) {
        tag.slug = resolve_slug(data, Some(raw), &tag.name, Some(id))?;
    }
    if let Some(name) = input.name.as_deref() {
        tag.name = name.trim().to_string();
    }
    apply_fields(&mut tag, input);
    tag.updated_at = now;
    log::info!("Updated tag {}", id);
    data.tags.insert(id, tag);
    Ok(())
}

/// Soft-delete a tag and detach it from every post.
pub fn delete(data: &mut BlogData, id: u64, now: DateTime<Utc>) -> BlogResult<()> {
    find(data, id)?;
    data.post_tags.retain(|link| link.tag_id != id);
    if let Some(tag) = data.tags.get_mut(&id) {
        tag.deleted_at = Some(now);
        tag.updated_at = now;
    }
    log::info!("Deleted tag {}", id);
    Ok(())
}

/// Return the tag named exactly `name`, creating it when missing.
///
/// A soft-deleted tag with that name is restored instead of duplicated.
pub fn find_or_create(data: &mut BlogData, name: &str, now: DateTime<Utc>) -> BlogResult<u64> {
    let mut errors = FieldErrors::new();
    fields::require_text(&mut errors, "name", Some(name), Some(MAX_NAME_CHARS));
    errors.into_result()?;

    let existing = data
        .tags
        .values()
        .filter(|tag| tag.name == name)
        .min_by_key(|tag| (tag.deleted_at.is_some(), tag.id))
        .map(|tag| tag.id);
    if let Some(id) = existing {
        if let Some(tag) = data.tags.get_mut(&id)
            && tag.deleted_at.is_some()
        {
            tag.deleted_at = None;
            tag.updated_at = now;
            log::info!("Restored tag {} ({})", id, tag.slug);
        }
        return Ok(id);
    }

    let slug = resolve_slug(data, None, name, None)?;
    let id = data.next_tag_id();
    let mut tag = Tag::new(id, name, now);
    tag.slug = slug;
    log::info!("Created tag {} ({}) on demand", id, tag.slug);
    data.tags.insert(id, tag);
    Ok(id)
}

/// [`find_or_create`] per name, in input order; repeats map to the same id.
pub fn find_or_create_many(data: &mut BlogData, names: &[String], now: DateTime<Utc>) -> BlogResult<Vec<u64>> {
    let mut errors = FieldErrors::new();
    for (index, name) in names.iter().enumerate() {
        let field = format!("names.{}", index);
        fields::check_max(&mut errors, &field, Some(name), Some(MAX_NAME_CHARS));
    }
    errors.into_result()?;
    names
        .iter()
        .map(|name| find_or_create(data, name, now))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blog::post::{Author, AuthorDirectory, PostInput};
    use crate::blog::store::BlogStore;
    use chrono::{Duration, TimeZone};

    struct OneAuthor;

    impl AuthorDirectory for OneAuthor {
        fn author(&self, id: u64) -> Option<Author> {
            (id == 1).then(|| Author {
                id,
                name: "Ada".into(),
            })
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap()
    }

    fn published_input(title: &str, at: DateTime<Utc>, tags: &[u64]) -> PostInput {
        PostInput {
            title: Some(title.into()),
            content: Some("Body".into()),
            status: Some("published".into()),
            visibility: Some("public".into()),
            author_id: Some(1),
            published_at: Some(Some(at.to_rfc3339())),
            tags: Some(Some(tags.to_vec())),
            ..PostInput::default()
        }
    }

    fn published_post(data: &mut BlogData, title: &str, at: DateTime<Utc>, tags: &[u64]) -> u64 {
        post::create(data, published_input(title, at, tags), None, &OneAuthor, at).unwrap()
    }

    #[test]
    fn find_or_create_is_idempotent_and_case_sensitive() {
        let mut data = BlogData::default();
        let first = find_or_create(&mut data, "Tech", t0()).unwrap();
        let second = find_or_create(&mut data, "Tech", t0()).unwrap();
        assert_eq!(first, second);
        assert_eq!(data.tags.len(), 1);

        let tag = find(&data, first).unwrap();
        assert_eq!(tag.slug, "tech");
        assert_eq!(tag.color, DEFAULT_COLOR);
        assert!(tag.is_active);

        let lower = find_or_create(&mut data, "tech", t0());
        assert!(matches!(lower, Err(BlogError::Validation(_))));
    }

    #[test]
    fn find_or_create_many_keeps_order_and_repeats() {
        let mut data = BlogData::default();
        let names = vec!["Rust".to_string(), "Go".to_string(), "Rust".to_string()];
        let ids = find_or_create_many(&mut data, &names, t0()).unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[0], ids[2]);
        assert_ne!(ids[0], ids[1]);
        assert_eq!(data.tags.len(), 2);
    }

    #[test]
    fn deleted_tag_is_restored_by_find_or_create() {
        let mut data = BlogData::default();
        let id = find_or_create(&mut data, "Retro", t0()).unwrap();
        delete(&mut data, id, t0()).unwrap();
        assert!(find(&data, id).is_err());
        assert_eq!(find_or_create(&mut data, "Retro", t0()).unwrap(), id);
        assert!(find(&data, id).is_ok());
    }

    #[test]
    fn post_count_follows_writes_through_the_store() {
        let store = BlogStore::in_memory();
        let tag = store.write(|data| find_or_create(data, "Rust", t0())).unwrap();
        let posts: Vec<u64> = (0..4)
            .map(|n| {
                store
                    .write(|data| Ok(published_post(data, &format!("Post {}", n), t0(), &[tag])))
                    .unwrap()
            })
            .collect();
        let count = || store.read(|data| Ok(find(data, tag)?.post_count)).unwrap();
        assert_eq!(count(), 4);

        let untag = PostInput {
            tags: Some(None),
            ..PostInput::default()
        };
        store
            .write(|data| post::update(data, posts[0], untag, Some(1), &OneAuthor, t0()))
            .unwrap();
        assert_eq!(count(), 3);

        store
            .write(|data| post::delete(data, posts[1], Some(1), t0()))
            .unwrap();
        assert_eq!(count(), 2);
    }

    #[test]
    fn per_tag_queries() {
        let mut data = BlogData::default();
        let rust = find_or_create(&mut data, "Rust", t0()).unwrap();
        let go = find_or_create(&mut data, "Go", t0()).unwrap();
        let old = published_post(&mut data, "Old", t0() - Duration::days(2), &[rust, go]);
        let new = published_post(&mut data, "New", t0(), &[rust]);
        post::record_view(&mut data, old).unwrap();
        reconcile_post_counts(&mut data);

        let popular: Vec<u64> = popular_posts(&data, rust, 5, t0()).iter().map(|p| p.id).collect();
        assert_eq!(popular, vec![old, new]);
        let recent: Vec<u64> = recent_posts(&data, rust, 1, t0()).iter().map(|p| p.id).collect();
        assert_eq!(recent, vec![new]);

        let mut rng = rand::rng();
        assert_eq!(random_posts(&data, rust, 5, t0(), &mut rng).len(), 2);
        assert_eq!(random_posts(&data, rust, 1, t0(), &mut rng).len(), 1);

        let related: Vec<u64> = related_tags(&data, rust, 5).iter().map(|t| t.id).collect();
        assert_eq!(related, vec![go]);
        assert!(related_tags(&data, go, 5).iter().all(|t| t.id != go));
    }

    #[test]
    fn statistics_bucket_by_month_and_year() {
        let mut data = BlogData::default();
        let tag = find_or_create(&mut data, "Stats", t0()).unwrap();
        let march = Utc.with_ymd_and_hms(2026, 3, 4, 12, 0, 0).unwrap();
        let last_year = Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap();
        for (title, at) in [("A", march), ("B", march), ("C", last_year)] {
            published_post(&mut data, title, at, &[tag]);
        }
        reconcile_post_counts(&mut data);

        let stats = statistics(&data, tag, 2026, t0()).unwrap();
        assert_eq!(stats.post_count, 3);
        assert_eq!(stats.published_posts_count, 3);
        assert_eq!(stats.monthly_stats.len(), 12);
        assert_eq!(stats.monthly_stats[&3], 2);
        assert_eq!(stats.monthly_stats[&7], 0);
        assert_eq!(stats.yearly_stats.keys().copied().collect::<Vec<_>>(), (2021..=2026).collect::<Vec<_>>());
        assert_eq!(stats.yearly_stats[&2025], 1);
        assert_eq!(stats.yearly_stats[&2026], 2);
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut data = BlogData::default();
        let input = TagInput {
            name: Some("Rust".into()),
            ..TagInput::default()
        };
        create(&mut data, input.clone(), t0()).unwrap();
        let Err(BlogError::Validation(errors)) = create(&mut data, input, t0()) else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.messages("name"), ["The name has already been taken."]);
    }

    #[test]
    fn color_classes_fall_back_to_gray() {
        let mut tag = Tag::new(1, "Blue", t0());
        tag.color = "#3B82F6".into();
        assert_eq!(tag.color_class(), "bg-blue-500");
        assert_eq!(tag.text_color_class(), "text-blue-500");
        tag.color = "#123456".into();
        assert_eq!(tag.border_color_class(), "border-gray-500");
    }

    #[test]
    fn popular_and_with_post_count_skip_inactive() {
        let mut data = BlogData::default();
        let active = find_or_create(&mut data, "Active", t0()).unwrap();
        let input = TagInput {
            name: Some("Dormant".into()),
            is_active: Some(false),
            ..TagInput::default()
        };
        create(&mut data, input, t0()).unwrap();
        let ids: Vec<u64> = popular_tags(&data, 10).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![active]);
        assert_eq!(tags_with_post_count(&data, None), vec![(find(&data, active).unwrap(), 0)]);
    }
}
