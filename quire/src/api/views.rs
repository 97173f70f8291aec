// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! JSON shapes returned by the API. Stored rows are flattened in and the
//! derived attributes are computed against the snapshot being read.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::blog::BlogData;
use crate::blog::category::{self, Category, CategoryTree};
use crate::blog::post::{self, Author, AuthorDirectory, Post, PostStatus, Visibility};
use crate::blog::tag::{self, Tag};
use crate::config::AppConfig;

/// Everything a view needs besides the row itself.
#[derive(Clone, Copy)]
pub struct ViewContext<'a> {
    pub data: &'a BlogData,
    pub app: &'a AppConfig,
    pub authors: &'a dyn AuthorDirectory,
    pub now: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct CategoryView<'a> {
    #[serde(flatten)]
    category: &'a Category,
    posts_count: usize,
    children_count: usize,
    full_name: String,
    image_url: Option<String>,
    is_root: bool,
    is_child: bool,
}

impl<'a> CategoryView<'a> {
    pub fn new(ctx: ViewContext<'a>, category: &'a Category) -> Self {
        Self {
            category,
            posts_count: category::posts_count(ctx.data, category.id),
            children_count: category::children_count(ctx.data, category.id),
            full_name: category::full_name(ctx.data, category),
            image_url: category.image.as_deref().map(|path| ctx.app.storage_url_for(path)),
            is_root: category.is_root(),
            is_child: category.is_child(),
        }
    }
}

#[derive(Serialize)]
pub struct CategoryNode<'a> {
    #[serde(flatten)]
    category: CategoryView<'a>,
    all_children: Vec<CategoryNode<'a>>,
}

impl<'a> CategoryNode<'a> {
    fn from_tree(ctx: ViewContext<'a>, tree: CategoryTree<'a>) -> Self {
        Self {
            category: CategoryView::new(ctx, tree.category),
            all_children: tree
                .children
                .into_iter()
                .map(|child| Self::from_tree(ctx, child))
                .collect(),
        }
    }
}

/// `GET /categories/{id}`.
#[derive(Serialize)]
pub struct CategoryDetail<'a> {
    #[serde(flatten)]
    category: CategoryView<'a>,
    parent: Option<CategoryView<'a>>,
    children: Vec<CategoryView<'a>>,
    posts: Vec<PostView<'a>>,
    all_children: Vec<CategoryNode<'a>>,
    descendants: Vec<CategoryView<'a>>,
}

impl<'a> CategoryDetail<'a> {
    pub fn new(ctx: ViewContext<'a>, category: &'a Category) -> Self {
        Self {
            category: CategoryView::new(ctx, category),
            parent: category::parent(ctx.data, category).map(|parent| CategoryView::new(ctx, parent)),
            children: category::children(ctx.data, category.id)
                .into_iter()
                .map(|child| CategoryView::new(ctx, child))
                .collect(),
            posts: category::posts(ctx.data, category.id)
                .map(|post| PostView::new(ctx, post))
                .collect(),
            all_children: category::subtree(ctx.data, category.id)
                .into_iter()
                .map(|tree| CategoryNode::from_tree(ctx, tree))
                .collect(),
            descendants: category::descendants(ctx.data, category.id)
                .into_iter()
                .map(|child| CategoryView::new(ctx, child))
                .collect(),
        }
    }
}

/// Category as returned after create/update: with parent and children.
#[derive(Serialize)]
pub struct CategoryWithRelations<'a> {
    #[serde(flatten)]
    category: CategoryView<'a>,
    parent: Option<CategoryView<'a>>,
    children: Vec<CategoryView<'a>>,
}

impl<'a> CategoryWithRelations<'a> {
    pub fn new(ctx: ViewContext<'a>, category: &'a Category) -> Self {
        Self {
            category: CategoryView::new(ctx, category),
            parent: category::parent(ctx.data, category).map(|parent| CategoryView::new(ctx, parent)),
            children: category::children(ctx.data, category.id)
                .into_iter()
                .map(|child| CategoryView::new(ctx, child))
                .collect(),
        }
    }
}

/// Entry of `GET /categories/{id}/children`.
#[derive(Serialize)]
pub struct ChildCategory<'a> {
    #[serde(flatten)]
    category: CategoryView<'a>,
    children: Vec<CategoryView<'a>>,
    posts: Vec<PostView<'a>>,
}

impl<'a> ChildCategory<'a> {
    pub fn new(ctx: ViewContext<'a>, category: &'a Category) -> Self {
        Self {
            category: CategoryView::new(ctx, category),
            children: category::children(ctx.data, category.id)
                .into_iter()
                .map(|child| CategoryView::new(ctx, child))
                .collect(),
            posts: category::posts(ctx.data, category.id)
                .map(|post| PostView::new(ctx, post))
                .collect(),
        }
    }
}

/// A post with every derived attribute. The password digest never leaves
/// the store, so the row is copied field by field instead of flattened.
#[derive(Serialize)]
pub struct PostView<'a> {
    id: u64,
    title: &'a str,
    slug: &'a str,
    excerpt: String,
    content: &'a str,
    featured_image: Option<&'a str>,
    featured_image_url: Option<String>,
    meta_title: String,
    meta_description: String,
    meta_keywords: Option<&'a [String]>,
    meta_keywords_string: String,
    status: PostStatus,
    visibility: Visibility,
    allow_comments: bool,
    is_featured: bool,
    is_sticky: bool,
    view_count: u64,
    like_count: u64,
    comment_count: u64,
    published_at: Option<DateTime<Utc>>,
    formatted_published_date: String,
    reading_time: u32,
    is_published: bool,
    is_draft: bool,
    is_archived: bool,
    is_public: bool,
    is_private: bool,
    is_password_protected: bool,
    author_id: u64,
    author: Option<Author>,
    category_id: Option<u64>,
    category: Option<&'a Category>,
    tags: Vec<&'a Tag>,
    tag_names: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'a> PostView<'a> {
    pub fn new(ctx: ViewContext<'a>, post: &'a Post) -> Self {
        let tags = post::tags(ctx.data, post.id);
        let tag_names = tags.iter().map(|tag| tag.name.clone()).collect();
        Self {
            id: post.id,
            title: &post.title,
            slug: &post.slug,
            excerpt: post.excerpt_text(),
            content: &post.content,
            featured_image: post.featured_image.as_deref(),
            featured_image_url: post
                .featured_image
                .as_deref()
                .map(|path| ctx.app.storage_url_for(path)),
            meta_title: post.meta_title_text(),
            meta_description: post.meta_description_text(),
            meta_keywords: post.meta_keywords.as_deref(),
            meta_keywords_string: post.meta_keywords_string(),
            status: post.status,
            visibility: post.visibility,
            allow_comments: post.allow_comments,
            is_featured: post.is_featured,
            is_sticky: post.is_sticky,
            view_count: post.view_count,
            like_count: post.like_count,
            comment_count: post.comment_count,
            published_at: post.published_at,
            formatted_published_date: post.formatted_published_date(),
            reading_time: post.reading_time(),
            is_published: post.is_published(ctx.now),
            is_draft: post.is_draft(),
            is_archived: post.is_archived(),
            is_public: post.is_public(),
            is_private: post.is_private(),
            is_password_protected: post.is_password_protected(),
            author_id: post.author_id,
            author: ctx.authors.author(post.author_id),
            category_id: post.category_id,
            category: post
                .category_id
                .and_then(|id| category::find(ctx.data, id).ok()),
            tags,
            tag_names,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct TagView<'a> {
    #[serde(flatten)]
    tag: &'a Tag,
    published_posts_count: usize,
    color_class: String,
    text_color_class: String,
    border_color_class: String,
}

impl<'a> TagView<'a> {
    pub fn new(ctx: ViewContext<'a>, tag: &'a Tag) -> Self {
        Self {
            tag,
            published_posts_count: tag::published_posts_count(ctx.data, tag.id, ctx.now),
            color_class: tag.color_class(),
            text_color_class: tag.text_color_class(),
            border_color_class: tag.border_color_class(),
        }
    }
}

/// `GET /tags/{id}`.
#[derive(Serialize)]
pub struct TagDetail<'a> {
    #[serde(flatten)]
    tag: TagView<'a>,
    posts: Vec<PostView<'a>>,
}

impl<'a> TagDetail<'a> {
    pub fn new(ctx: ViewContext<'a>, tag: &'a Tag) -> Self {
        Self {
            tag: TagView::new(ctx, tag),
            posts: tag::posts(ctx.data, tag.id)
                .into_iter()
                .map(|post| PostView::new(ctx, post))
                .collect(),
        }
    }
}

#[derive(Serialize)]
pub struct TagWithCount<'a> {
    #[serde(flatten)]
    tag: TagView<'a>,
    posts_count: usize,
}

impl<'a> TagWithCount<'a> {
    pub fn new(ctx: ViewContext<'a>, tag: &'a Tag, posts_count: usize) -> Self {
        Self {
            tag: TagView::new(ctx, tag),
            posts_count,
        }
    }
}

pub fn posts<'a>(ctx: ViewContext<'a>, rows: Vec<&'a Post>) -> Vec<PostView<'a>> {
    rows.into_iter().map(|post| PostView::new(ctx, post)).collect()
}

pub fn tags<'a>(ctx: ViewContext<'a>, rows: Vec<&'a Tag>) -> Vec<TagView<'a>> {
    rows.into_iter().map(|tag| TagView::new(ctx, tag)).collect()
}

pub fn categories<'a>(ctx: ViewContext<'a>, rows: Vec<&'a Category>) -> Vec<CategoryView<'a>> {
    rows.into_iter()
        .map(|category| CategoryView::new(ctx, category))
        .collect()
}
