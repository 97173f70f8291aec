// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::error::InternalError;
use actix_web::{ResponseError, web};
use chrono::{DateTime, Utc};

use crate::blog::BlogError;
use crate::blog::query::PageRequest;
use crate::config::ValidatedConfig;
use crate::iam::UserDirectory;
use views::ViewContext;

mod categories;
mod posts;
pub mod response;
mod tags;
pub mod views;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(json_config())
            .app_data(query_config())
            .configure(categories::configure)
            .configure(posts::configure)
            .configure(tags::configure),
    );
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = BlogError::field("body", err.to_string()).error_response();
        InternalError::from_response(err, response).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let response = BlogError::field("query", err.to_string()).error_response();
        InternalError::from_response(err, response).into()
    })
}

fn page_request(
    config: &ValidatedConfig,
    page: Option<usize>,
    per_page: Option<usize>,
) -> PageRequest {
    PageRequest::new(
        page,
        per_page,
        config.pagination.default_per_page,
        config.pagination.max_per_page,
    )
}

fn view_context<'a>(
    data: &'a crate::blog::BlogData,
    config: &'a ValidatedConfig,
    users: &'a UserDirectory,
    now: DateTime<Utc>,
) -> ViewContext<'a> {
    ViewContext {
        data,
        app: &config.app,
        authors: users,
        now,
    }
}
