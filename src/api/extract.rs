// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Extractors that reject with the JSON error envelope instead of axum's
//! plain-text rejections.

use axum::extract::{
    rejection::{JsonRejection, PathRejection},
    FromRequest, FromRequestParts,
};

use crate::error::ApiError;

/// JSON body; any parse or content-type failure is a 422.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameters; a segment that does not parse names no resource, so 404.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::unprocessable(format!(
            "Request body could not be processed: {}",
            rejection.body_text()
        ))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(rejection = %rejection.body_text(), "unmatched path parameter");
        ApiError::not_found("Resource not found")
    }
}
