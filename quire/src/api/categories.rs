// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{HttpResponse, web};
use serde::Deserialize;

use super::response;
use super::views::{self, CategoryDetail, CategoryWithRelations, ChildCategory};
use super::{page_request, view_context};
use crate::app_state::AppState;
use crate::blog::BlogError;
use crate::blog::category::{self, CategoryFilter, CategoryInput};
use crate::blog::query::{self, paginate};
use crate::config::ValidatedConfig;
use crate::iam::UserDirectory;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/categories")
            .route("", web::get().to(index))
            .route("", web::post().to(store))
            .route("/{id}", web::get().to(show))
            .route("/{id}", web::put().to(update))
            .route("/{id}", web::delete().to(destroy))
            .route("/{id}/posts", web::get().to(posts))
            .route("/{id}/children", web::get().to(children))
            .route("/{id}/breadcrumb", web::get().to(breadcrumb)),
    );
}

#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    active: Option<String>,
    featured: Option<String>,
    root: Option<String>,
    parent_id: Option<u64>,
    search: Option<String>,
    order_by: Option<String>,
    order_direction: Option<String>,
    page: Option<usize>,
    per_page: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PostsQuery {
    status: Option<String>,
    search: Option<String>,
    page: Option<usize>,
    per_page: Option<usize>,
}

type Shared = (web::Data<AppState>, web::Data<ValidatedConfig>, web::Data<UserDirectory>);

async fn index(
    (state, config, users): Shared,
    params: web::Query<IndexQuery>,
) -> Result<HttpResponse, BlogError> {
    let params = params.into_inner();
    let filter = CategoryFilter {
        active: params.active.as_deref().map(query::parse_flag),
        featured: params.featured.as_deref().map(query::parse_flag),
        root: params.root.is_some(),
        parent_id: params.parent_id,
        search: params.search,
        order_by: params.order_by,
        order_direction: params.order_direction,
    };
    let request = page_request(&config, params.page, params.per_page);
    let now = state.now();
    state.store.read(|data| {
        let ctx = view_context(data, &config, &users, now);
        let page = paginate(category::list(data, &filter)?, request);
        Ok(response::ok(
            page.map(|row| views::CategoryView::new(ctx, row)),
            "Categories retrieved successfully",
        ))
    })
}

async fn store(
    (state, config, users): Shared,
    input: web::Json<CategoryInput>,
) -> Result<HttpResponse, BlogError> {
    let now = state.now();
    let id = state
        .store
        .write(|data| category::create(data, input.into_inner(), now))?;
    state.store.read(|data| {
        let ctx = view_context(data, &config, &users, now);
        let category = category::find(data, id)?;
        Ok(response::created(
            CategoryWithRelations::new(ctx, category),
            "Category created successfully",
        ))
    })
}

async fn show(
    (state, config, users): Shared,
    path: web::Path<u64>,
) -> Result<HttpResponse, BlogError> {
    let id = path.into_inner();
    let now = state.now();
    state.store.read(|data| {
        let ctx = view_context(data, &config, &users, now);
        let category = category::find(data, id)?;
        Ok(response::ok(
            CategoryDetail::new(ctx, category),
            "Category retrieved successfully",
        ))
    })
}

async fn update(
    (state, config, users): Shared,
    path: web::Path<u64>,
    input: web::Json<CategoryInput>,
) -> Result<HttpResponse, BlogError> {
    let id = path.into_inner();
    let now = state.now();
    state
        .store
        .write(|data| category::update(data, id, input.into_inner(), now))?;
    state.store.read(|data| {
        let ctx = view_context(data, &config, &users, now);
        let category = category::find(data, id)?;
        Ok(response::ok(
            CategoryWithRelations::new(ctx, category),
            "Category updated successfully",
        ))
    })
}

async fn destroy(state: web::Data<AppState>, path: web::Path<u64>) -> Result<HttpResponse, BlogError> {
    let id = path.into_inner();
    let now = state.now();
    state.store.write(|data| category::delete(data, id, now))?;
    Ok(response::done("Category deleted successfully"))
}

async fn posts(
    (state, config, users): Shared,
    path: web::Path<u64>,
    params: web::Query<PostsQuery>,
) -> Result<HttpResponse, BlogError> {
    let id = path.into_inner();
    let params = params.into_inner();
    let request = page_request(&config, params.page, params.per_page);
    let now = state.now();
    state.store.read(|data| {
        category::find(data, id)?;
        let ctx = view_context(data, &config, &users, now);
        let rows = category::filtered_posts(data, id, params.status.as_deref(), params.search.as_deref());
        Ok(response::ok(
            paginate(rows, request).map(|post| views::PostView::new(ctx, post)),
            "Category posts retrieved successfully",
        ))
    })
}

async fn children((state, config, users): Shared, path: web::Path<u64>) -> Result<HttpResponse, BlogError> {
    let id = path.into_inner();
    let now = state.now();
    state.store.read(|data| {
        category::find(data, id)?;
        let ctx = view_context(data, &config, &users, now);
        let rows: Vec<ChildCategory<'_>> = category::children(data, id)
            .into_iter()
            .map(|child| ChildCategory::new(ctx, child))
            .collect();
        Ok(response::ok(rows, "Category children retrieved successfully"))
    })
}

async fn breadcrumb((state, config, users): Shared, path: web::Path<u64>) -> Result<HttpResponse, BlogError> {
    let id = path.into_inner();
    let now = state.now();
    state.store.read(|data| {
        let ctx = view_context(data, &config, &users, now);
        let chain = category::breadcrumb(data, id)?;
        Ok(response::ok(
            views::categories(ctx, chain),
            "Category breadcrumb retrieved successfully",
        ))
    })
}
