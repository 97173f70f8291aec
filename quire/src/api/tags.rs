// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{HttpResponse, web};
use chrono::Datelike;
use serde::Deserialize;

use super::response;
use super::views::{self, TagDetail, TagView, TagWithCount};
use super::{page_request, view_context};
use crate::app_state::AppState;
use crate::blog::BlogError;
use crate::blog::fields;
use crate::blog::query::{self, paginate};
use crate::blog::tag::{self, DEFAULT_POPULAR_LIMIT, DEFAULT_POST_LIMIT, TagFilter, TagInput};
use crate::config::ValidatedConfig;
use crate::iam::UserDirectory;

pub fn configure(cfg: &mut web::ServiceConfig) {
    // Literal paths go first so they are not captured by `/{id}`.
    cfg.service(
        web::scope("/tags")
            .route("", web::get().to(index))
            .route("", web::post().to(store))
            .route("/popular/popular", web::get().to(popular))
            .route("/with-post-count", web::get().to(with_post_count))
            .route("/with-post-count/with-post-count", web::get().to(with_post_count))
            .route("/find-or-create", web::post().to(find_or_create))
            .route("/find-or-create-multiple", web::post().to(find_or_create_multiple))
            .route("/{id}", web::get().to(show))
            .route("/{id}", web::put().to(update))
            .route("/{id}", web::delete().to(destroy))
            .route("/{id}/posts", web::get().to(posts))
            .route("/{id}/popular-posts", web::get().to(popular_posts))
            .route("/{id}/recent-posts", web::get().to(recent_posts))
            .route("/{id}/random-posts", web::get().to(random_posts))
            .route("/{id}/related", web::get().to(related))
            .route("/{id}/statistics", web::get().to(statistics)),
    );
}

#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    active: Option<String>,
    search: Option<String>,
    popular: Option<String>,
    limit: Option<usize>,
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

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct StatisticsQuery {
    year: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct FindOrCreateBody {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FindOrCreateManyBody {
    #[serde(default)]
    names: Option<Vec<String>>,
}

type Shared = (web::Data<AppState>, web::Data<ValidatedConfig>, web::Data<UserDirectory>);

fn render_tag(
    (state, config, users): &Shared,
    id: u64,
    message: &str,
    created: bool,
) -> Result<HttpResponse, BlogError> {
    let now = state.now();
    state.store.read(|data| {
        let ctx = view_context(data, config, users, now);
        let view = TagView::new(ctx, tag::find(data, id)?);
        Ok(if created {
            response::created(view, message)
        } else {
            response::ok(view, message)
        })
    })
}

fn render_tags(
    (state, config, users): &Shared,
    ids: &[u64],
    message: &str,
) -> Result<HttpResponse, BlogError> {
    let now = state.now();
    state.store.read(|data| {
        let ctx = view_context(data, config, users, now);
        let rows = ids
            .iter()
            .map(|id| tag::find(data, *id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(response::ok(views::tags(ctx, rows), message))
    })
}

async fn index(
    (state, config, users): Shared,
    params: web::Query<IndexQuery>,
) -> Result<HttpResponse, BlogError> {
    let params = params.into_inner();
    let filter = TagFilter {
        active: params.active.as_deref().map(query::parse_flag),
        search: params.search,
        popular_limit: params
            .popular
            .is_some()
            .then(|| params.limit.unwrap_or(DEFAULT_POPULAR_LIMIT)),
        order_by: params.order_by,
        order_direction: params.order_direction,
    };
    let request = page_request(&config, params.page, params.per_page);
    let now = state.now();
    state.store.read(|data| {
        let ctx = view_context(data, &config, &users, now);
        let page = paginate(tag::list(data, &filter)?, request);
        Ok(response::ok(
            page.map(|row| TagView::new(ctx, row)),
            "Tags retrieved successfully",
        ))
    })
}

async fn store(shared: Shared, input: web::Json<TagInput>) -> Result<HttpResponse, BlogError> {
    let state = &shared.0;
    let now = state.now();
    let id = state
        .store
        .write(|data| tag::create(data, input.into_inner(), now))?;
    render_tag(&shared, id, "Tag created successfully", true)
}

async fn show((state, config, users): Shared, path: web::Path<u64>) -> Result<HttpResponse, BlogError> {
    let id = path.into_inner();
    let now = state.now();
    state.store.read(|data| {
        let ctx = view_context(data, &config, &users, now);
        let tag = tag::find(data, id)?;
        Ok(response::ok(TagDetail::new(ctx, tag), "Tag retrieved successfully"))
    })
}

async fn update(
    shared: Shared,
    path: web::Path<u64>,
    input: web::Json<TagInput>,
) -> Result<HttpResponse, BlogError> {
    let id = path.into_inner();
    let state = &shared.0;
    let now = state.now();
    state
        .store
        .write(|data| tag::update(data, id, input.into_inner(), now))?;
    render_tag(&shared, id, "Tag updated successfully", false)
}

async fn destroy(state: web::Data<AppState>, path: web::Path<u64>) -> Result<HttpResponse, BlogError> {
    let id = path.into_inner();
    let now = state.now();
    state.store.write(|data| tag::delete(data, id, now))?;
    Ok(response::done("Tag deleted successfully"))
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
        tag::find(data, id)?;
        let ctx = view_context(data, &config, &users, now);
        let rows = tag::filtered_posts(data, id, params.status.as_deref(), params.search.as_deref(), now);
        Ok(response::ok(
            paginate(rows, request).map(|post| views::PostView::new(ctx, post)),
            "Tag posts retrieved successfully",
        ))
    })
}

async fn popular_posts(
    (state, config, users): Shared,
    path: web::Path<u64>,
    params: web::Query<LimitQuery>,
) -> Result<HttpResponse, BlogError> {
    let id = path.into_inner();
    let limit = params.limit.unwrap_or(DEFAULT_POST_LIMIT);
    let now = state.now();
    state.store.read(|data| {
        tag::find(data, id)?;
        let ctx = view_context(data, &config, &users, now);
        Ok(response::ok(
            views::posts(ctx, tag::popular_posts(data, id, limit, now)),
            "Popular posts for tag retrieved successfully",
        ))
    })
}

async fn recent_posts(
    (state, config, users): Shared,
    path: web::Path<u64>,
    params: web::Query<LimitQuery>,
) -> Result<HttpResponse, BlogError> {
    let id = path.into_inner();
    let limit = params.limit.unwrap_or(DEFAULT_POST_LIMIT);
    let now = state.now();
    state.store.read(|data| {
        tag::find(data, id)?;
        let ctx = view_context(data, &config, &users, now);
        Ok(response::ok(
            views::posts(ctx, tag::recent_posts(data, id, limit, now)),
            "Recent posts for tag retrieved successfully",
        ))
    })
}

async fn random_posts(
    (state, config, users): Shared,
    path: web::Path<u64>,
    params: web::Query<LimitQuery>,
) -> Result<HttpResponse, BlogError> {
    let id = path.into_inner();
    let limit = params.limit.unwrap_or(DEFAULT_POST_LIMIT);
    let now = state.now();
    state.store.read(|data| {
        tag::find(data, id)?;
        let ctx = view_context(data, &config, &users, now);
        let rows = tag::random_posts(data, id, limit, now, &mut rand::rng());
        Ok(response::ok(
            views::posts(ctx, rows),
            "Random posts for tag retrieved successfully",
        ))
    })
}

async fn related(
    (state, config, users): Shared,
    path: web::Path<u64>,
    params: web::Query<LimitQuery>,
) -> Result<HttpResponse, BlogError> {
    let id = path.into_inner();
    let limit = params.limit.unwrap_or(DEFAULT_POST_LIMIT);
    let now = state.now();
    state.store.read(|data| {
        tag::find(data, id)?;
        let ctx = view_context(data, &config, &users, now);
        Ok(response::ok(
            views::tags(ctx, tag::related_tags(data, id, limit)),
            "Related tags retrieved successfully",
        ))
    })
}

async fn statistics(
    state: web::Data<AppState>,
    path: web::Path<u64>,
    params: web::Query<StatisticsQuery>,
) -> Result<HttpResponse, BlogError> {
    let id = path.into_inner();
    let now = state.now();
    let year = params.year.unwrap_or_else(|| now.year());
    state.store.read(|data| {
        Ok(response::ok(
            tag::statistics(data, id, year, now)?,
            "Tag statistics retrieved successfully",
        ))
    })
}

async fn popular(
    (state, config, users): Shared,
    params: web::Query<LimitQuery>,
) -> Result<HttpResponse, BlogError> {
    let limit = params.limit.unwrap_or(DEFAULT_POPULAR_LIMIT);
    let now = state.now();
    state.store.read(|data| {
        let ctx = view_context(data, &config, &users, now);
        Ok(response::ok(
            views::tags(ctx, tag::popular_tags(data, limit)),
            "Popular tags retrieved successfully",
        ))
    })
}

async fn with_post_count(
    (state, config, users): Shared,
    params: web::Query<LimitQuery>,
) -> Result<HttpResponse, BlogError> {
    let limit = params.limit;
    let now = state.now();
    state.store.read(|data| {
        let ctx = view_context(data, &config, &users, now);
        let rows: Vec<TagWithCount<'_>> = tag::tags_with_post_count(data, limit)
            .into_iter()
            .map(|(tag, count)| TagWithCount::new(ctx, tag, count))
            .collect();
        Ok(response::ok(rows, "Tags with post count retrieved successfully"))
    })
}

async fn find_or_create(
    shared: Shared,
    body: web::Json<FindOrCreateBody>,
) -> Result<HttpResponse, BlogError> {
    let name = body.into_inner().name.unwrap_or_default();
    let state = &shared.0;
    let now = state.now();
    let id = state
        .store
        .write(|data| tag::find_or_create(data, &name, now))?;
    render_tag(&shared, id, "Tag found or created successfully", false)
}

async fn find_or_create_multiple(
    shared: Shared,
    body: web::Json<FindOrCreateManyBody>,
) -> Result<HttpResponse, BlogError> {
    let Some(names) = body.into_inner().names else {
        return Err(BlogError::field("names", fields::required_message("names")));
    };
    let state = &shared.0;
    let now = state.now();
    let ids = state
        .store
        .write(|data| tag::find_or_create_many(data, &names, now))?;
    render_tags(&shared, &ids, "Tags found or created successfully")
}
