// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for verified claims.
//!
//! Handlers behind a [`PermissionGate`](super::PermissionGate) take the
//! claims the gate already decoded:
//!
//! ```rust,ignore
//! async fn create_drink(Authorized(claims): Authorized, ...) -> impl IntoResponse {
//!     // claims.sub is the caller
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::{AuthError, ClaimSet};
use crate::state::AppState;

/// Extractor for a verified claim set.
///
/// Prefers the claims stored by the permission gate. Without a gate in front
/// of the route it verifies the bearer token itself, with no permission check.
pub struct Authorized(pub ClaimSet);

impl FromRequestParts<AppState> for Authorized {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<ClaimSet>().cloned() {
            return Ok(Authorized(claims));
        }

        let authorization = parts
            .headers
            .get(AUTHORIZATION)
            .map(|value| value.to_str().map_err(|_| AuthError::MalformedHeader))
            .transpose()?;

        let claims = state.verifier.verify(authorization).await?;
        Ok(Authorized(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::Audience;
    use crate::test_support::{bearer, test_claims, test_state};
    use axum::http::Request;

    fn parts(authorization: Option<String>) -> Parts {
        let mut builder = Request::builder().uri("/drinks");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn requires_auth_header_without_gate() {
        let (state, _server, _dir) = test_state().await;
        let mut parts = parts(None);

        let result = Authorized::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingToken)));
    }

    #[tokio::test]
    async fn verifies_token_without_gate() {
        let (state, _server, _dir) = test_state().await;
        let mut parts = parts(Some(bearer(&test_claims(&["get:drinks"]))));

        let Authorized(claims) = Authorized::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(claims.sub, "auth0|barista");
    }

    #[tokio::test]
    async fn prefers_extensions() {
        let (state, server, _dir) = test_state().await;
        let mut parts = parts(None);

        let claims = ClaimSet {
            iss: "gate".to_string(),
            sub: "user_from_gate".to_string(),
            aud: Audience::Single("drinks".to_string()),
            exp: 0,
            iat: None,
            nbf: None,
            azp: None,
            scope: None,
            permissions: Some(vec![]),
            extra: Default::default(),
        };
        parts.extensions.insert(claims);

        let Authorized(claims) = Authorized::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(claims.sub, "user_from_gate");
        assert_eq!(server.hits(), 0);
    }
}
