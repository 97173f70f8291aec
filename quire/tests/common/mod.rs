// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, test, web};
use chrono::{DateTime, Duration, TimeZone, Utc};
use quire::api;
use quire::app_state::AppState;
use quire::blog::{BlogStore, ManualClock};
use quire::config::ValidatedConfig;
use quire::iam::{TokenAuthMiddlewareFactory, UserDirectory, UsersData, YamlUser};
use quire::util::{sha256_hex, test_config};
use serde_json::{Value, json};
use std::sync::Arc;

/// Send a request and decode the JSON envelope, yielding `(status, body)`.
macro_rules! call_json {
    ($app:expr, $req:expr $(,)?) => {{
        let req = $req.to_request();
        async {
            let resp = actix_web::test::call_service($app, req).await;
            let status = resp.status();
            let body = actix_web::test::read_body(resp).await;
            let json: serde_json::Value =
                serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
            (status, json)
        }
    }};
}

pub const AUTHOR_ID: u64 = 1;
pub const AUTHOR_TOKEN: &str = "author-token";
pub const READER_ID: u64 = 2;
pub const READER_TOKEN: &str = "reader-token";

pub struct TestHarness {
    pub config: Arc<ValidatedConfig>,
    pub app_state: Arc<AppState>,
    pub users: Arc<UserDirectory>,
    pub clock: Arc<ManualClock>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: ValidatedConfig) -> Self {
        let clock = Arc::new(ManualClock::new(start_time()));
        let app_state = Arc::new(AppState::with_clock(BlogStore::in_memory(), clock.clone()));
        let users = Arc::new(UserDirectory::in_memory(seed_users()));
        Self {
            config: Arc::new(config),
            app_state,
            users,
            clock,
        }
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0)
        .single()
        .expect("valid start time")
}

fn seed_users() -> UsersData {
    let mut users = UsersData::new();
    users.insert(
        AUTHOR_ID,
        YamlUser {
            name: "Ada Author".to_string(),
            email: "ada@example.com".to_string(),
            token_sha256: sha256_hex(AUTHOR_TOKEN),
        },
    );
    users.insert(
        READER_ID,
        YamlUser {
            name: "Rex Reader".to_string(),
            email: "rex@example.com".to_string(),
            token_sha256: sha256_hex(READER_TOKEN),
        },
    );
    users
}

pub fn build_test_app(
    harness: &TestHarness,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    > + use<>,
> {
    App::new()
        .app_data(web::Data::from(harness.config.clone()))
        .app_data(web::Data::from(harness.app_state.clone()))
        .app_data(web::Data::from(harness.users.clone()))
        .wrap(TokenAuthMiddlewareFactory)
        .configure(api::configure)
}

pub fn with_token(req: test::TestRequest, token: &str) -> test::TestRequest {
    req.insert_header((AUTHORIZATION, format!("Bearer {}", token)))
}

pub fn data(json: &Value) -> &Value {
    json.get("data").expect("data field")
}

pub fn id_of(json: &Value) -> u64 {
    data(json)
        .get("id")
        .and_then(Value::as_u64)
        .expect("data.id")
}

pub fn ids_of(rows: &Value) -> Vec<u64> {
    rows.as_array()
        .expect("array")
        .iter()
        .map(|row| row.get("id").and_then(Value::as_u64).expect("row id"))
        .collect()
}

pub fn category_body(name: &str) -> Value {
    json!({ "name": name })
}

pub fn draft_body(title: &str, category_id: u64) -> Value {
    json!({
        "title": title,
        "content": "Lorem ipsum dolor sit amet.",
        "status": "draft",
        "visibility": "public",
        "category_id": category_id,
        "author_id": AUTHOR_ID
    })
}

pub fn published_body(title: &str, published_at: DateTime<Utc>) -> Value {
    json!({
        "title": title,
        "content": "Lorem ipsum dolor sit amet.",
        "status": "published",
        "visibility": "public",
        "published_at": published_at.to_rfc3339(),
        "author_id": AUTHOR_ID
    })
}
