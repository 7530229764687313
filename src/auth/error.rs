// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization errors.
//!
//! Anything about *who* the caller is maps to 401, anything about *what* the
//! caller may do maps to 403. Messages are generic on purpose: the token and
//! key material never appear in a response body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;

/// Authentication error type.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization` header present
    #[error("Authorization header is required")]
    MissingToken,
    /// Header present but not `Bearer <token>`
    #[error("Authorization header must be of the form 'Bearer <token>'")]
    MalformedHeader,
    /// Token is not a three-segment compact JWS, or a segment does not decode
    #[error("Token is malformed")]
    MalformedToken,
    /// No key for the token's key id, or the signature does not verify
    #[error("Token signature is invalid")]
    InvalidSignature,
    /// Token expiry is in the past
    #[error("Token has expired")]
    ExpiredToken,
    /// Issuer, audience or another registered claim is wrong or absent
    #[error("Token claims are invalid")]
    InvalidClaims,
    /// Token carries no `permissions` claim at all
    #[error("Token does not carry a permissions claim")]
    PermissionsClaimMissing,
    /// Token is valid but lacks the required permission
    #[error("Token lacks the permission required for this operation")]
    PermissionDenied,
    /// Signing keys could not be fetched
    #[error("Signing keys are unavailable")]
    KeySetUnavailable(String),
    /// Internal error
    #[error("Internal authentication error")]
    Internal(String),
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::MalformedHeader => "malformed_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::ExpiredToken => "expired_token",
            AuthError::InvalidClaims => "invalid_claims",
            AuthError::PermissionsClaimMissing => "permissions_claim_missing",
            AuthError::PermissionDenied => "permission_denied",
            AuthError::KeySetUnavailable(_) => "key_set_unavailable",
            AuthError::Internal(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken
            | AuthError::MalformedHeader
            | AuthError::MalformedToken
            | AuthError::InvalidSignature
            | AuthError::ExpiredToken
            | AuthError::InvalidClaims => StatusCode::UNAUTHORIZED,
            AuthError::PermissionsClaimMissing | AuthError::PermissionDenied => {
                StatusCode::FORBIDDEN
            }
            AuthError::KeySetUnavailable(_) | AuthError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Internal detail worth logging but never returned to the client.
    pub fn detail(&self) -> Option<&str> {
        match self {
            AuthError::KeySetUnavailable(msg) | AuthError::Internal(msg) => Some(msg),
            _ => None,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if let Some(detail) = err.detail() {
            tracing::error!(error_code = err.error_code(), detail, "authentication backend failure");
        }
        ApiError::new(err.status_code(), err.to_string()).with_code(err.error_code())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
