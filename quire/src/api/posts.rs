// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{HttpRequest, HttpResponse, web};
use serde::{Deserialize, Serialize};

use super::response;
use super::views::{self, PostView};
use super::{page_request, view_context};
use crate::app_state::AppState;
use crate::blog::post::{self, DEFAULT_POPULAR_DAYS, DEFAULT_RELATED_LIMIT, PostFilter, PostInput};
use crate::blog::query::paginate;
use crate::blog::{BlogData, BlogError, BlogResult};
use crate::config::ValidatedConfig;
use crate::iam::{AuthRequest, UserDirectory};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/posts")
            .route("", web::get().to(index))
            .route("", web::post().to(store))
            .route("/{id}", web::get().to(show))
            .route("/{id}", web::put().to(update))
            .route("/{id}", web::delete().to(destroy))
            .route("/{id}/publish", web::post().to(publish))
            .route("/{id}/unpublish", web::post().to(unpublish))
            .route("/{id}/archive", web::post().to(archive))
            .route("/{id}/related", web::get().to(related))
            .route("/{id}/next", web::get().to(next))
            .route("/{id}/previous", web::get().to(previous))
            .route("/{id}/like", web::post().to(like))
            .route("/{id}/unlike", web::post().to(unlike)),
    );
}

#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    status: Option<String>,
    visibility: Option<String>,
    category_id: Option<u64>,
    author_id: Option<u64>,
    tag_id: Option<u64>,
    title: Option<String>,
    search: Option<String>,
    featured: Option<String>,
    sticky: Option<String>,
    popular: Option<String>,
    days: Option<i64>,
    recent: Option<String>,
    order_by: Option<String>,
    order_direction: Option<String>,
    page: Option<usize>,
    per_page: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    limit: Option<usize>,
}

#[derive(Serialize)]
struct LikeCount {
    like_count: u64,
}

type Shared = (web::Data<AppState>, web::Data<ValidatedConfig>, web::Data<UserDirectory>);

/// Render one post from a fresh read of the store.
fn render(
    (state, config, users): &Shared,
    id: u64,
    message: &str,
    created: bool,
) -> Result<HttpResponse, BlogError> {
    let now = state.now();
    state.store.read(|data| {
        let ctx = view_context(data, config, users, now);
        let view = PostView::new(ctx, post::find(data, id)?);
        Ok(if created {
            response::created(view, message)
        } else {
            response::ok(view, message)
        })
    })
}

async fn index(
    (state, config, users): Shared,
    params: web::Query<IndexQuery>,
) -> Result<HttpResponse, BlogError> {
    let params = params.into_inner();
    let filter = PostFilter {
        status: params.status,
        visibility: params.visibility,
        category_id: params.category_id,
        author_id: params.author_id,
        tag_id: params.tag_id,
        title: params.title,
        search: params.search,
        featured: params.featured.is_some(),
        sticky: params.sticky.is_some(),
        popular_days: params
            .popular
            .is_some()
            .then(|| params.days.unwrap_or(DEFAULT_POPULAR_DAYS)),
        recent: params.recent.is_some(),
        order_by: params.order_by,
        order_direction: params.order_direction,
    };
    let request = page_request(&config, params.page, params.per_page);
    let now = state.now();
    state.store.read(|data| {
        let ctx = view_context(data, &config, &users, now);
        let page = paginate(post::list(data, &filter, now)?, request);
        Ok(response::ok(
            page.map(|row| PostView::new(ctx, row)),
            "Posts retrieved successfully",
        ))
    })
}

async fn store(
    req: HttpRequest,
    shared: Shared,
    input: web::Json<PostInput>,
) -> Result<HttpResponse, BlogError> {
    let (state, _, users) = &shared;
    let now = state.now();
    let actor = req.user_id();
    let id = state
        .store
        .write(|data| post::create(data, input.into_inner(), actor, users.get_ref(), now))?;
    render(&shared, id, "Post created successfully", true)
}

async fn show(shared: Shared, path: web::Path<u64>) -> Result<HttpResponse, BlogError> {
    let id = path.into_inner();
    shared.0.store.write(|data| post::record_view(data, id))?;
    render(&shared, id, "Post retrieved successfully", false)
}

async fn update(
    req: HttpRequest,
    shared: Shared,
    path: web::Path<u64>,
    input: web::Json<PostInput>,
) -> Result<HttpResponse, BlogError> {
    let id = path.into_inner();
    let (state, _, users) = &shared;
    let now = state.now();
    let actor = req.user_id();
    state
        .store
        .write(|data| post::update(data, id, input.into_inner(), actor, users.get_ref(), now))?;
    render(&shared, id, "Post updated successfully", false)
}

async fn destroy(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<HttpResponse, BlogError> {
    let id = path.into_inner();
    let now = state.now();
    let actor = req.user_id();
    state.store.write(|data| post::delete(data, id, actor, now))?;
    Ok(response::done("Post deleted successfully"))
}

type Transition = fn(&mut BlogData, u64, Option<u64>, chrono::DateTime<chrono::Utc>) -> BlogResult<post::Post>;

fn apply_transition(
    req: &HttpRequest,
    shared: &Shared,
    id: u64,
    transition: Transition,
    message: &str,
) -> Result<HttpResponse, BlogError> {
    let state = &shared.0;
    let now = state.now();
    let actor = req.user_id();
    state.store.write(|data| transition(data, id, actor, now))?;
    render(shared, id, message, false)
}

async fn publish(req: HttpRequest, shared: Shared, path: web::Path<u64>) -> Result<HttpResponse, BlogError> {
    apply_transition(&req, &shared, path.into_inner(), post::publish, "Post published successfully")
}

async fn unpublish(req: HttpRequest, shared: Shared, path: web::Path<u64>) -> Result<HttpResponse, BlogError> {
    apply_transition(&req, &shared, path.into_inner(), post::unpublish, "Post unpublished successfully")
}

async fn archive(req: HttpRequest, shared: Shared, path: web::Path<u64>) -> Result<HttpResponse, BlogError> {
    apply_transition(&req, &shared, path.into_inner(), post::archive, "Post archived successfully")
}

async fn related(
    req: HttpRequest,
    (state, config, users): Shared,
    path: web::Path<u64>,
    params: web::Query<LimitQuery>,
) -> Result<HttpResponse, BlogError> {
    let id = path.into_inner();
    let limit = params.limit.unwrap_or(DEFAULT_RELATED_LIMIT);
    let actor = req.user_id();
    let now = state.now();
    state.store.read(|data| {
        post::ensure_can_manage(post::find(data, id)?, actor)?;
        let ctx = view_context(data, &config, &users, now);
        let rows = post::related(data, id, limit, now)?;
        Ok(response::ok(
            views::posts(ctx, rows),
            "Related posts retrieved successfully",
        ))
    })
}

async fn next((state, config, users): Shared, path: web::Path<u64>) -> Result<HttpResponse, BlogError> {
    let id = path.into_inner();
    let now = state.now();
    state.store.read(|data| {
        let ctx = view_context(data, &config, &users, now);
        let row = post::next(data, id, now)?;
        Ok(response::ok(
            row.map(|post| PostView::new(ctx, post)),
            "Next post retrieved successfully",
        ))
    })
}

async fn previous((state, config, users): Shared, path: web::Path<u64>) -> Result<HttpResponse, BlogError> {
    let id = path.into_inner();
    let now = state.now();
    state.store.read(|data| {
        let ctx = view_context(data, &config, &users, now);
        let row = post::previous(data, id, now)?;
        Ok(response::ok(
            row.map(|post| PostView::new(ctx, post)),
            "Previous post retrieved successfully",
        ))
    })
}

async fn like(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<HttpResponse, BlogError> {
    let id = path.into_inner();
    let user_id = req.user_id().ok_or(BlogError::Unauthenticated)?;
    let like_count = state.store.write(|data| post::like(data, id, user_id))?;
    Ok(response::ok(LikeCount { like_count }, "Post liked successfully"))
}

async fn unlike(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<HttpResponse, BlogError> {
    let id = path.into_inner();
    let user_id = req.user_id().ok_or(BlogError::Unauthenticated)?;
    let like_count = state.store.write(|data| post::unlike(data, id, user_id))?;
    Ok(response::ok(LikeCount { like_count }, "Post unliked successfully"))
}
