// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::error::{BlogError, BlogResult, FieldErrors, Resource};
use super::fields::{self, MAX_COLOR_CHARS, MAX_NAME_CHARS, nullable};
use super::post::{Post, PostStatus};
use super::query::{self, SortDirection};
use super::slug::slugify;
use super::store::BlogData;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

pub const ORDER_COLUMNS: &[&str] = &["id", "name", "slug", "sort_order", "created_at", "updated_at"];

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default)]
    pub parent_id: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Category {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_child(&self) -> bool {
        !self.is_root()
    }

    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Create/update payload. Nullable columns use `Option<Option<_>>` so an
/// explicit `null` clears the value while an absent key leaves it alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub image: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub color: Option<Option<String>>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_featured: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub sort_order: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub parent_id: Option<Option<u64>>,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    pub active: Option<bool>,
    pub featured: Option<bool>,
    pub root: bool,
    pub parent_id: Option<u64>,
    pub search: Option<String>,
    pub order_by: Option<String>,
    pub order_direction: Option<String>,
}

/// A category with its nested live children.
#[derive(Debug, Clone)]
pub struct CategoryTree<'a> {
    pub category: &'a Category,
    pub children: Vec<CategoryTree<'a>>,
}

pub fn find(data: &BlogData, id: u64) -> BlogResult<&Category> {
    data.categories
        .get(&id)
        .filter(|category| category.is_live())
        .ok_or(BlogError::NotFound(Resource::Category))
}

pub fn parent<'a>(data: &'a BlogData, category: &Category) -> Option<&'a Category> {
    category.parent_id.and_then(|id| find(data, id).ok())
}

/// Live direct children in display order (sort_order, then name).
pub fn children(data: &BlogData, id: u64) -> Vec<&Category> {
    let mut children: Vec<&Category> = data
        .categories
        .values()
        .filter(|category| category.is_live() && category.parent_id == Some(id))
        .collect();
    children.sort_by(|a, b| {
        a.sort_order
            .cmp(&b.sort_order)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    });
    children
}

pub fn has_children(data: &BlogData, id: u64) -> bool {
    data.categories
        .values()
        .any(|category| category.is_live() && category.parent_id == Some(id))
}

pub fn posts(data: &BlogData, id: u64) -> impl Iterator<Item = &Post> {
    data.posts
        .values()
        .filter(move |post| post.is_live() && post.category_id == Some(id))
}

pub fn has_posts(data: &BlogData, id: u64) -> bool {
    posts(data, id).next().is_some()
}

pub fn posts_count(data: &BlogData, id: u64) -> usize {
    posts(data, id).count()
}

pub fn children_count(data: &BlogData, id: u64) -> usize {
    data.categories
        .values()
        .filter(|category| category.is_live() && category.parent_id == Some(id))
        .count()
}

pub fn published_posts_count(data: &BlogData, id: u64) -> usize {
    posts(data, id)
        .filter(|post| post.status == PostStatus::Published)
        .count()
}

/// Posts of a category for the `/categories/{id}/posts` listing; no status
/// filter means every live post.
pub fn filtered_posts<'a>(
    data: &'a BlogData,
    id: u64,
    status: Option<&str>,
    search: Option<&str>,
) -> Vec<&'a Post> {
    let search = search.filter(|term| !term.is_empty());
    posts(data, id)
        .filter(|post| status.is_none_or(|status| post.status.as_str() == status))
        .filter(|post| {
            search.is_none_or(|term| {
                query::contains_text(&post.title, term) || query::contains_text(&post.content, term)
            })
        })
        .collect()
}

/// "Parent > Name" when the category has a live parent.
pub fn full_name(data: &BlogData, category: &Category) -> String {
    match parent(data, category) {
        Some(parent) => format!("{} > {}", parent.name, category.name),
        None => category.name.clone(),
    }
}

/// Ancestor chain from the root down to `id`, inclusive.
///
/// A revisited id ends the walk, so corrupt parent links cannot loop.
pub fn breadcrumb(data: &BlogData, id: u64) -> BlogResult<Vec<&Category>> {
    let start = find(data, id)?;
    let mut chain = vec![start];
    let mut seen = BTreeSet::from([start.id]);
    let mut current = start;
    while let Some(parent) = parent(data, current) {
        if !seen.insert(parent.id) {
            log::warn!("Category {} has a cyclic parent chain", id);
            break;
        }
        chain.push(parent);
        current = parent;
    }
    chain.reverse();
    Ok(chain)
}

/// Every descendant in depth-first pre-order.
pub fn descendants(data: &BlogData, id: u64) -> Vec<&Category> {
    let mut out = Vec::new();
    let mut seen = BTreeSet::from([id]);
    collect_descendants(data, id, &mut seen, &mut out);
    out
}

fn collect_descendants<'a>(
    data: &'a BlogData,
    id: u64,
    seen: &mut BTreeSet<u64>,
    out: &mut Vec<&'a Category>,
) {
    for child in children(data, id) {
        if !seen.insert(child.id) {
            continue;
        }
        out.push(child);
        collect_descendants(data, child.id, seen, out);
    }
}

/// Nested children of `id`, all the way down.
pub fn subtree(data: &BlogData, id: u64) -> Vec<CategoryTree<'_>> {
    let mut seen = BTreeSet::from([id]);
    build_subtree(data, id, &mut seen)
}

fn build_subtree<'a>(data: &'a BlogData, id: u64, seen: &mut BTreeSet<u64>) -> Vec<CategoryTree<'a>> {
    let mut nodes = Vec::new();
    for child in children(data, id) {
        if !seen.insert(child.id) {
            continue;
        }
        let grandchildren = build_subtree(data, child.id, seen);
        nodes.push(CategoryTree {
            category: child,
            children: grandchildren,
        });
    }
    nodes
}

/// True when making `candidate` the parent of `id` would close a loop.
pub fn would_create_cycle(data: &BlogData, id: u64, candidate: u64) -> bool {
    let mut seen = BTreeSet::new();
    let mut cursor = Some(candidate);
    while let Some(current) = cursor {
        if current == id {
            return true;
        }
        if !seen.insert(current) {
            return true;
        }
        cursor = data.categories.get(&current).and_then(|c| c.parent_id);
    }
    false
}

pub fn list<'a>(data: &'a BlogData, filter: &CategoryFilter) -> BlogResult<Vec<&'a Category>> {
    let order_by = query::sort_key(filter.order_by.as_deref(), ORDER_COLUMNS, "sort_order")?;
    let direction = SortDirection::parse_or(filter.order_direction.as_deref(), SortDirection::Asc);
    let search = filter.search.as_deref().filter(|term| !term.is_empty());

    let mut rows: Vec<&Category> = data
        .categories
        .values()
        .filter(|category| category.is_live())
        .filter(|category| filter.active.is_none_or(|active| category.is_active == active))
        .filter(|category| filter.featured.is_none_or(|featured| category.is_featured == featured))
        .filter(|category| !filter.root || category.is_root())
        .filter(|category| filter.parent_id.is_none_or(|parent| category.parent_id == Some(parent)))
        .filter(|category| {
            search.is_none_or(|term| {
                query::contains_text(&category.name, term)
                    || query::contains_opt(category.description.as_deref(), term)
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        direction
            .apply(compare_by(a, b, order_by))
            .then_with(|| a.id.cmp(&b.id))
    });
    Ok(rows)
}

fn compare_by(a: &Category, b: &Category, column: &str) -> Ordering {
    match column {
        "id" => a.id.cmp(&b.id),
        "name" => a.name.cmp(&b.name),
        "slug" => a.slug.cmp(&b.slug),
        "created_at" => a.created_at.cmp(&b.created_at),
        "updated_at" => a.updated_at.cmp(&b.updated_at),
        _ => a.sort_order.cmp(&b.sort_order),
    }
}

fn slug_taken(data: &BlogData, slug: &str, except: Option<u64>) -> bool {
    data.categories
        .values()
        .any(|category| category.slug == slug && Some(category.id) != except)
}

fn validate(data: &BlogData, input: &CategoryInput, id: Option<u64>) -> BlogResult<()> {
    let mut errors = FieldErrors::new();
    if id.is_some() {
        fields::sometimes_text(&mut errors, "name", input.name.as_deref(), Some(MAX_NAME_CHARS));
    } else {
        fields::require_text(&mut errors, "name", input.name.as_deref(), Some(MAX_NAME_CHARS));
    }
    fields::check_max(&mut errors, "slug", input.slug.as_deref(), Some(MAX_NAME_CHARS));
    fields::check_max(&mut errors, "color", input.color.clone().flatten().as_deref(), Some(MAX_COLOR_CHARS));
    fields::check_min(&mut errors, "sort_order", input.sort_order.flatten(), 0);

    if let Some(Some(parent_id)) = input.parent_id {
        let parent_missing = find(data, parent_id).is_err();
        let cyclic = id.is_some_and(|id| would_create_cycle(data, id, parent_id));
        if parent_missing || cyclic {
            errors.add("parent_id", fields::invalid_selection_message("parent_id"));
        }
    }
    errors.into_result()
}

fn resolve_slug(
    data: &BlogData,
    requested: Option<&str>,
    name: &str,
    except: Option<u64>,
) -> BlogResult<String> {
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

pub fn create(data: &mut BlogData, input: CategoryInput, now: DateTime<Utc>) -> BlogResult<u64> {
    validate(data, &input, None)?;
    let name = input.name.unwrap_or_default().trim().to_string();
    let slug = resolve_slug(data, input.slug.as_deref(), &name, None)?;

    let id = data.next_category_id();
    let category = Category {
        id,
        name,
        slug,
        description: fields::non_blank(input.description.flatten()),
        image: fields::non_blank(input.image.flatten()),
        color: fields::non_blank(input.color.flatten()),
        is_active: input.is_active.unwrap_or(true),
        is_featured: input.is_featured.unwrap_or(false),
        sort_order: input.sort_order.flatten().unwrap_or(0),
        parent_id: input.parent_id.flatten(),
        created_at: now,
        updated_at: now,
        deleted_at: None,
    };
    log::info!("Created category {} ({})", category.id, category.slug);
    data.categories.insert(id, category);
    Ok(id)
}

/// Apply a partial update. The slug only changes when one is sent.
pub fn update(data: &mut BlogData, id: u64, input: CategoryInput, now: DateTime<Utc>) -> BlogResult<()> {
    let current = find(data, id)?.clone();
    validate(data, &input, Some(id))?;

    let name = input
        .name
        .map(|name| name.trim().to_string())
        .unwrap_or_else(|| current.name.clone());
    let slug = match input.slug.as_deref().filter(|raw| !raw.trim().is_empty()) {
        Some(raw) => resolve_slug(data, Some(raw), &name, Some(id))?,
        None => current.slug.clone(),
    };

    let mut category = current;
    category.name = name;
    category.slug = slug;
    if let Some(description) = input.description {
        category.description = fields::non_blank(description);
    }
    if let Some(image) = input.image {
        category.image = fields::non_blank(image);
    }
    if let Some(color) = input.color {
        category.color = fields::non_blank(color);
    }
    if let Some(is_active) = input.is_active {
        category.is_active = is_active;
    }
    if let Some(is_featured) = input.is_featured {
        category.is_featured = is_featured;
    }
    if let Some(sort_order) = input.sort_order {
        category.sort_order = sort_order.unwrap_or(0);
    }
    if let Some(parent_id) = input.parent_id {
        category.parent_id = parent_id;
    }
    category.updated_at = now;

    log::info!("Updated category {}", id);
    data.categories.insert(id, category);
    Ok(())
}

/// Soft-delete a leaf category that no live post references.
pub fn delete(data: &mut BlogData, id: u64, now: DateTime<Utc>) -> BlogResult<()> {
    find(data, id)?;
    if has_children(data, id) {
        log::debug!("Refusing to delete category {}: has children", id);
        return Err(BlogError::conflict("Cannot delete category with children"));
    }
    if has_posts(data, id) {
        log::debug!("Refusing to delete category {}: has posts", id);
        return Err(BlogError::conflict("Cannot delete category with posts"));
    }
    if let Some(category) = data.categories.get_mut(&id) {
        category.deleted_at = Some(now);
        category.updated_at = now;
    }
    log::info!("Deleted category {}", id);
    Ok(())
}
