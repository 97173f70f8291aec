// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#[macro_use]
mod common;

use actix_web::{http::StatusCode, test};
use common::{AUTHOR_TOKEN, TestHarness, build_test_app, with_token};
use quire::util::TestConfigBuilder;
use serde_json::json;

macro_rules! create_category {
    ($app:expr, $body:expr) => {{
        let (status, json) = call_json!(
            $app,
            test::TestRequest::post().uri("/api/categories").set_json($body),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", json);
        common::id_of(&json)
    }};
}

#[actix_web::test]
async fn hierarchy_exposes_children_and_breadcrumb() {
    let harness = TestHarness::new();
    let app = test::init_service(build_test_app(&harness)).await;

    let tech = create_category!(&app, json!({ "name": "Tech", "sort_order": 1 }));
    let rust = create_category!(&app, json!({ "name": "Rust", "parent_id": tech }));
    let async_id = create_category!(&app, json!({ "name": "Async Rust", "parent_id": rust }));
    create_category!(&app, json!({ "name": "Life", "sort_order": 2 }));

    let (status, crumbs) = call_json!(
        &app,
        test::TestRequest::get().uri(&format!("/api/categories/{}/breadcrumb", async_id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(common::ids_of(&crumbs["data"]), vec![tech, rust, async_id]);

    let (_, shown) = call_json!(
        &app,
        test::TestRequest::get().uri(&format!("/api/categories/{}", async_id)),
    )
    .await;
    assert_eq!(shown["data"]["slug"], "async-rust");
    assert_eq!(shown["data"]["full_name"], "Rust > Async Rust");
    assert_eq!(shown["data"]["parent"]["id"], json!(rust));
    assert_eq!(shown["data"]["is_child"], true);
    assert_eq!(shown["data"]["is_root"], false);

    let (_, tech_detail) = call_json!(
        &app,
        test::TestRequest::get().uri(&format!("/api/categories/{}", tech)),
    )
    .await;
    assert_eq!(common::ids_of(&tech_detail["data"]["descendants"]), vec![rust, async_id]);
    assert_eq!(tech_detail["data"]["children_count"], 1);
    assert_eq!(tech_detail["data"]["is_root"], true);
    assert_eq!(tech_detail["data"]["is_child"], false);

    let (_, children) = call_json!(
        &app,
        test::TestRequest::get().uri(&format!("/api/categories/{}/children", tech)),
    )
    .await;
    assert_eq!(common::ids_of(&children["data"]), vec![rust]);
    assert_eq!(common::ids_of(&children["data"][0]["children"]), vec![async_id]);

    let (_, roots) = call_json!(&app, test::TestRequest::get().uri("/api/categories?root=1")).await;
    assert_eq!(roots["data"]["total"], 2);
    assert_eq!(roots["data"]["data"][0]["name"], "Tech");
}

#[actix_web::test]
async fn rejects_duplicate_slug_and_cyclic_parent() {
    let harness = TestHarness::new();
    let app = test::init_service(build_test_app(&harness)).await;

    let news = create_category!(&app, json!({ "name": "News" }));
    let (status, json) = call_json!(
        &app,
        test::TestRequest::post()
            .uri("/api/categories")
            .set_json(json!({ "name": "news" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["errors"]["slug"].is_array());

    let (status, json) = call_json!(
        &app,
        test::TestRequest::post().uri("/api/categories").set_json(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["errors"]["name"][0], "The name field is required.");

    let child = create_category!(&app, json!({ "name": "World", "parent_id": news }));
    let (status, json) = call_json!(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/categories/{}", news))
            .set_json(json!({ "parent_id": child })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["errors"]["parent_id"].is_array());
}

#[actix_web::test]
async fn delete_refuses_categories_in_use() {
    let harness = TestHarness::new();
    let app = test::init_service(build_test_app(&harness)).await;

    let parent = create_category!(&app, json!({ "name": "Parent" }));
    let child = create_category!(&app, json!({ "name": "Child", "parent_id": parent }));

    let (status, json) = call_json!(
        &app,
        test::TestRequest::delete().uri(&format!("/api/categories/{}", parent)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["success"], false);

    let (status, _) = call_json!(
        &app,
        with_token(test::TestRequest::post().uri("/api/posts"), AUTHOR_TOKEN)
            .set_json(common::draft_body("Filed", child)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = call_json!(
        &app,
        test::TestRequest::delete().uri(&format!("/api/categories/{}", child)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, posts) = call_json!(
        &app,
        test::TestRequest::get().uri(&format!("/api/categories/{}/posts?status=draft", child)),
    )
    .await;
    assert_eq!(posts["data"]["total"], 1);
    assert_eq!(posts["data"]["data"][0]["title"], "Filed");
}

#[actix_web::test]
async fn delete_hides_an_unused_category() {
    let harness = TestHarness::new();
    let app = test::init_service(build_test_app(&harness)).await;
    let id = create_category!(&app, json!({ "name": "Ephemeral" }));

    let (status, json) = call_json!(
        &app,
        test::TestRequest::delete().uri(&format!("/api/categories/{}", id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert!(json.get("data").is_none());

    let (status, json) = call_json!(
        &app,
        test::TestRequest::get().uri(&format!("/api/categories/{}", id)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);

    let (status, _) = call_json!(
        &app,
        test::TestRequest::post()
            .uri("/api/categories")
            .set_json(json!({ "name": "Ephemeral" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn listing_paginates_and_rejects_unknown_sort_columns() {
    let harness = TestHarness::new();
    let app = test::init_service(build_test_app(&harness)).await;
    for name in ["One", "Two", "Three"] {
        create_category!(&app, json!({ "name": name }));
    }

    let (status, page) = call_json!(
        &app,
        test::TestRequest::get().uri("/api/categories?per_page=2&page=2&order_by=name"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["message"], "Categories retrieved successfully");
    assert_eq!(page["data"]["current_page"], 2);
    assert_eq!(page["data"]["last_page"], 2);
    assert_eq!(page["data"]["total"], 3);
    assert_eq!(page["data"]["data"][0]["name"], "Two");

    let (status, _) = call_json!(
        &app,
        test::TestRequest::get().uri("/api/categories?order_by=password"),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn configured_pagination_and_storage_prefix_apply() {
    let config = TestConfigBuilder::new()
        .with_storage_url("https://cdn.example.com/media/")
        .with_pagination(2, 3)
        .build();
    let harness = TestHarness::with_config(config);
    let app = test::init_service(build_test_app(&harness)).await;
    for name in ["One", "Two", "Three", "Four"] {
        create_category!(&app, json!({ "name": name, "image": "categories/cover.png" }));
    }

    let (status, page) = call_json!(&app, test::TestRequest::get().uri("/api/categories")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"]["per_page"], 2);
    assert_eq!(page["data"]["last_page"], 2);
    assert_eq!(
        page["data"]["data"][0]["image_url"],
        "https://cdn.example.com/media/categories/cover.png"
    );

    let (_, page) = call_json!(&app, test::TestRequest::get().uri("/api/categories?per_page=50")).await;
    assert_eq!(page["data"]["per_page"], 3);
    assert_eq!(page["data"]["data"].as_array().map(Vec::len), Some(3));
}
