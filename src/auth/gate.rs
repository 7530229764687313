// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Permission gate middleware.
//!
//! A gate pairs a required permission with the verifier and is layered onto
//! a single route method:
//!
//! ```rust,ignore
//! post(drinks::create_drink).route_layer(axum::middleware::from_fn_with_state(
//!     PermissionGate::new(state.verifier.clone(), permissions::POST_DRINKS),
//!     require_permission,
//! ))
//! ```
//!
//! The gate runs before the handler's own extractors. On success the decoded
//! [`ClaimSet`] is stored in the request extensions, where the
//! [`Authorized`](super::Authorized) extractor picks it up. On failure the
//! handler is never invoked.

use std::fmt;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{permissions, verifier::bearer_token, AuthError, ClaimSet, TokenVerifier};

/// Progress of a single request through the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Unauthenticated,
    TokenExtracted,
    Verified,
    Authorized,
    Delegated,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Unauthenticated => "unauthenticated",
            Stage::TokenExtracted => "token_extracted",
            Stage::Verified => "verified",
            Stage::Authorized => "authorized",
            Stage::Delegated => "delegated",
        };
        f.write_str(name)
    }
}

/// Terminal failure of the gate: the stage it was reached from and why.
#[derive(Debug)]
pub struct Rejection {
    pub stage: Stage,
    pub error: AuthError,
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        tracing::debug!(
            stage = %self.stage,
            error_code = self.error.error_code(),
            "request rejected by permission gate"
        );
        self.error.into_response()
    }
}

/// Middleware state: who verifies, and what must be granted.
#[derive(Clone)]
pub struct PermissionGate {
    verifier: Arc<TokenVerifier>,
    permission: &'static str,
}

impl PermissionGate {
    pub fn new(verifier: Arc<TokenVerifier>, permission: &'static str) -> Self {
        Self {
            verifier,
            permission,
        }
    }

    pub fn permission(&self) -> &'static str {
        self.permission
    }

    /// Run the verifier then the permission check.
    pub async fn authorize(&self, authorization: Option<&HeaderValue>) -> Result<ClaimSet, Rejection> {
        let reject = |stage: Stage| move |error: AuthError| Rejection { stage, error };

        let raw = authorization
            .map(|value| value.to_str().map_err(|_| AuthError::MalformedHeader))
            .transpose()
            .map_err(reject(Stage::Unauthenticated))?;
        let token = bearer_token(raw).map_err(reject(Stage::Unauthenticated))?;

        let claims = self
            .verifier
            .verify_token(token)
            .await
            .map_err(reject(Stage::TokenExtracted))?;

        permissions::check(&claims, self.permission).map_err(reject(Stage::Verified))?;

        tracing::debug!(
            stage = %Stage::Authorized,
            permission = self.permission,
            sub = %claims.sub,
            expires_at = ?claims.expires_at(),
            "request authorized"
        );
        Ok(claims)
    }
}

/// Authentication and authorization middleware function.
pub async fn require_permission(
    State(gate): State<PermissionGate>,
    mut request: Request,
    next: Next,
) -> Response {
    let authorization = request.headers().get(AUTHORIZATION).cloned();

    match gate.authorize(authorization.as_ref()).await {
        Ok(claims) => {
            tracing::trace!(stage = %Stage::Delegated, permission = gate.permission(), "calling handler");
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(rejection) => rejection.into_response(),
    }
}
