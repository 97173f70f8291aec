// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

use crate::blog::{BlogError, FieldErrors};

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    message: &'a str,
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    success: bool,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a FieldErrors>,
}

pub fn ok<T: Serialize>(data: T, message: &str) -> HttpResponse {
    HttpResponse::Ok().json(Envelope {
        success: true,
        data: Some(data),
        message,
    })
}

pub fn created<T: Serialize>(data: T, message: &str) -> HttpResponse {
    HttpResponse::Created().json(Envelope {
        success: true,
        data: Some(data),
        message,
    })
}

/// Success without a payload, as used by deletes.
pub fn done(message: &str) -> HttpResponse {
    HttpResponse::Ok().json(Envelope::<()> {
        success: true,
        data: None,
        message,
    })
}

impl ResponseError for BlogError {
    fn status_code(&self) -> StatusCode {
        match self {
            BlogError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            BlogError::Unauthenticated => StatusCode::UNAUTHORIZED,
            BlogError::Forbidden => StatusCode::FORBIDDEN,
            BlogError::Conflict(_) => StatusCode::CONFLICT,
            BlogError::NotFound(_) => StatusCode::NOT_FOUND,
            BlogError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            BlogError::Storage(detail) => {
                log::error!("Request failed on storage: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let errors = match self {
            BlogError::Validation(errors) => Some(errors),
            _ => None,
        };
        HttpResponse::build(self.status_code()).json(ErrorEnvelope {
            success: false,
            message: &message,
            errors,
        })
    }
}
