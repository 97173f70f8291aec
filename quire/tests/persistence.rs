// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#[macro_use]
mod common;

use actix_web::{App, http::StatusCode, test, web};
use quire::api;
use quire::app_state::AppState;
use quire::blog::BlogStore;
use quire::iam::{FileUserStore, TokenAuthMiddlewareFactory, UserDirectory};
use quire::util::test_config;
use quire::util::test_fixtures::TestFixtureRoot;
use serde_json::json;
use std::sync::Arc;

#[actix_web::test]
async fn blog_data_and_users_survive_a_restart() {
    let fixture = TestFixtureRoot::new_unique("persistence").expect("fixture root");
    let runtime_paths = fixture.runtime_paths().expect("runtime paths");
    assert!(fixture.state_dir().is_dir());

    let store = FileUserStore::new(runtime_paths.users_file.clone()).expect("user store");
    let users = UserDirectory::new(Arc::new(store)).expect("user directory");
    let (author, token) = users.add_user("Ada Author", "ada@example.com").expect("add user");

    let config = Arc::new(test_config());
    let state = Arc::new(AppState::new(
        BlogStore::open(runtime_paths.data_file.clone()).expect("open store"),
    ));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(config.clone()))
            .app_data(web::Data::from(state))
            .app_data(web::Data::new(users))
            .wrap(TokenAuthMiddlewareFactory)
            .configure(api::configure),
    )
    .await;

    let (status, created) = call_json!(
        &app,
        common::with_token(test::TestRequest::post().uri("/api/posts"), &token).set_json(json!({
            "title": "Durable",
            "content": "Written to disk.",
            "status": "draft",
            "visibility": "public"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["author_id"], json!(author.id));
    let post_id = common::id_of(&created);
    assert!(runtime_paths.data_file.is_file());

    let reopened = BlogStore::open(runtime_paths.data_file.clone()).expect("reopen store");
    let title = reopened
        .read(|data| Ok(data.posts.get(&post_id).map(|post| post.title.clone())))
        .expect("read");
    assert_eq!(title.as_deref(), Some("Durable"));

    let store = FileUserStore::new(runtime_paths.users_file.clone()).expect("user store");
    let users = UserDirectory::new(Arc::new(store)).expect("user directory");
    assert_eq!(users.find_by_token(&token), Some(author));
    let raw = std::fs::read_to_string(&runtime_paths.users_file).expect("users file");
    assert!(!raw.contains(&token));
}
