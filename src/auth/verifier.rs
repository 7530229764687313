// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token verification.
//!
//! Checks run cheapest first: header presence and shape, segment count,
//! token header decode, key lookup, then signature and registered claims.
//! The signature is checked before any claim, so a forged token is always
//! reported as [`AuthError::InvalidSignature`] whatever it claims.

use jsonwebtoken::{decode, decode_header, errors::ErrorKind, Algorithm, Validation};

use super::{AuthError, ClaimSet, JwksManager};

/// Default leeway for `exp` and `nbf`: none, an expired token is expired.
/// Deployments with drifting clocks opt in through `AUTH_CLOCK_SKEW_SECS`.
pub const CLOCK_SKEW_LEEWAY: u64 = 0;

/// Verifies identity-provider access tokens.
#[derive(Clone)]
pub struct TokenVerifier {
    /// Signing keys
    jwks: JwksManager,
    /// Expected `iss`
    issuer: String,
    /// Value `aud` must contain
    audience: String,
    /// The only algorithm tokens may be signed with
    algorithm: Algorithm,
    /// Leeway for `exp` and `nbf`, in seconds
    leeway: u64,
}

impl TokenVerifier {
    pub fn new(
        jwks: JwksManager,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        algorithm: Algorithm,
    ) -> Self {
        Self {
            jwks,
            issuer: issuer.into(),
            audience: audience.into(),
            algorithm,
            leeway: CLOCK_SKEW_LEEWAY,
        }
    }

    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }

    pub fn jwks(&self) -> &JwksManager {
        &self.jwks
    }

    /// Verify the raw `Authorization` header value and return the claims.
    pub async fn verify(&self, authorization: Option<&str>) -> Result<ClaimSet, AuthError> {
        let token = bearer_token(authorization)?;
        self.verify_token(token).await
    }

    /// Verify a compact JWS.
    pub async fn verify_token(&self, token: &str) -> Result<ClaimSet, AuthError> {
        if token.split('.').count() != 3 {
            return Err(AuthError::MalformedToken);
        }

        // Unknown algorithms, including "none", fail to decode here.
        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;
        if header.alg != self.algorithm {
            return Err(AuthError::InvalidSignature);
        }

        let kid = header.kid.as_deref().ok_or(AuthError::InvalidSignature)?;
        let decoding_key = self.jwks.get_decoding_key(kid, self.algorithm).await?;

        let mut validation = Validation::new(self.algorithm);
        validation.leeway = self.leeway;
        validation.validate_nbf = true;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        let token_data = decode::<ClaimSet>(token, &decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName
                | ErrorKind::InvalidRsaKey(_)
                | ErrorKind::InvalidKeyFormat => AuthError::InvalidSignature,
                ErrorKind::InvalidIssuer
                | ErrorKind::InvalidAudience
                | ErrorKind::InvalidSubject
                | ErrorKind::ImmatureSignature
                | ErrorKind::MissingRequiredClaim(_) => AuthError::InvalidClaims,
                _ => AuthError::MalformedToken,
            }
        })?;

        Ok(token_data.claims)
    }
}

/// Extract the token from a `Bearer <token>` header value.
///
/// The scheme is compared case-insensitively; anything other than exactly
/// two space-separated parts is rejected.
pub fn bearer_token(authorization: Option<&str>) -> Result<&str, AuthError> {
    let value = authorization.ok_or(AuthError::MissingToken)?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None)
            if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() =>
        {
            Ok(token)
        }
        _ => Err(AuthError::MalformedHeader),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        foreign_token, forge_token, jwks_document_without_alg, sign_token, sign_token_with,
        test_claims, verifier_for, JwksServer, AUDIENCE, ISSUER,
    };
    use serde_json::json;
    use url::Url;

    fn verifier_with(server: &JwksServer, algorithm: Algorithm) -> TokenVerifier {
        let jwks = JwksManager::new(Url::parse(&server.url).unwrap()).unwrap();
        TokenVerifier::new(jwks, ISSUER, AUDIENCE, algorithm)
    }

    #[test]
    fn bearer_token_shapes() {
        assert!(matches!(bearer_token(None), Err(AuthError::MissingToken)));
        assert_eq!(bearer_token(Some("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
        assert_eq!(bearer_token(Some("bearer abc")).unwrap(), "abc");

        for bad in ["Bearer", "Bearer ", "Basic abc", "Bearer a b", "abc", ""] {
            assert!(
                matches!(bearer_token(Some(bad)), Err(AuthError::MalformedHeader)),
                "{bad:?}"
            );
        }
    }

    #[tokio::test]
    async fn accepts_valid_token() {
        let server = JwksServer::start().await;
        let verifier = verifier_for(&server);
        let token = sign_token(&test_claims(&["get:drinks-detail"]));

        let claims = verifier
            .verify(Some(&format!("Bearer {token}")))
            .await
            .unwrap();
        assert_eq!(claims.iss, ISSUER);
        assert!(claims.aud.contains(AUDIENCE));
        assert_eq!(claims.permissions, Some(vec!["get:drinks-detail".to_string()]));
    }

    #[tokio::test]
    async fn missing_header_never_fetches_keys() {
        let server = JwksServer::start().await;
        let verifier = verifier_for(&server);

        assert!(matches!(verifier.verify(None).await, Err(AuthError::MissingToken)));
        assert_eq!(server.hits(), 0);
    }

    #[tokio::test]
    async fn wrong_segment_count_is_malformed() {
        let server = JwksServer::start().await;
        let verifier = verifier_for(&server);

        for token in ["abc", "a.b", "a.b.c.d"] {
            let result = verifier.verify_token(token).await;
            assert!(matches!(result, Err(AuthError::MalformedToken)), "{token}");
        }
        assert_eq!(server.hits(), 0);
    }

    #[tokio::test]
    async fn garbage_header_segment_is_malformed() {
        let server = JwksServer::start().await;
        let verifier = verifier_for(&server);

        let result = verifier.verify_token("not-base64!.e30.sig").await;
        assert!(matches!(result, Err(AuthError::MalformedToken)));
    }

    #[tokio::test]
    async fn unsigned_token_is_rejected() {
        let server = JwksServer::start().await;
        let verifier = verifier_for(&server);

        let token = forge_token(
            &json!({ "alg": "none", "typ": "JWT" }),
            &test_claims(&["post:drinks"]),
        );
        let result = verifier.verify_token(&token).await;
        assert!(matches!(result, Err(AuthError::MalformedToken)));
    }

    #[tokio::test]
    async fn foreign_key_signature_is_invalid_regardless_of_claims() {
        let server = JwksServer::start().await;
        let verifier = verifier_for(&server);

        // Expired and wrong issuer as well, yet the signature is what fails.
        let mut claims = test_claims(&["post:drinks"]);
        claims["exp"] = json!(1);
        claims["iss"] = json!("https://evil.test/");
        let token = foreign_token(&claims);

        let result = verifier.verify_token(&token).await;
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[tokio::test]
    async fn unknown_kid_or_missing_kid_is_invalid_signature() {
        let server = JwksServer::start().await;
        let verifier = verifier_for(&server);
        let claims = test_claims(&["post:drinks"]);

        let unknown = forge_token(&json!({ "alg": "RS256", "kid": "nope" }), &claims);
        assert!(matches!(
            verifier.verify_token(&unknown).await,
            Err(AuthError::InvalidSignature)
        ));

        let no_kid = forge_token(&json!({ "alg": "RS256" }), &claims);
        assert!(matches!(
            verifier.verify_token(&no_kid).await,
            Err(AuthError::InvalidSignature)
        ));
    }

    #[tokio::test]
    async fn algorithm_mismatch_is_invalid_signature() {
        let server = JwksServer::start().await;
        let verifier = verifier_for(&server);

        let token = forge_token(
            &json!({ "alg": "HS256", "kid": crate::test_support::SIGNING_KID }),
            &test_claims(&["post:drinks"]),
        );
        assert!(matches!(
            verifier.verify_token(&token).await,
            Err(AuthError::InvalidSignature)
        ));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let server = JwksServer::start().await;
        let verifier = verifier_for(&server);

        let mut claims = test_claims(&["get:drinks"]);
        claims["exp"] = json!(chrono::Utc::now().timestamp() - 3600);
        let token = sign_token(&claims);

        assert!(matches!(
            verifier.verify_token(&token).await,
            Err(AuthError::ExpiredToken)
        ));
    }

    #[tokio::test]
    async fn wrong_issuer_or_audience_is_invalid_claims() {
        let server = JwksServer::start().await;
        let verifier = verifier_for(&server);

        let mut claims = test_claims(&["get:drinks"]);
        claims["iss"] = json!("https://someone-else.test/");
        assert!(matches!(
            verifier.verify_token(&sign_token(&claims)).await,
            Err(AuthError::InvalidClaims)
        ));

        let mut claims = test_claims(&["get:drinks"]);
        claims["aud"] = json!(["other-api"]);
        assert!(matches!(
            verifier.verify_token(&sign_token(&claims)).await,
            Err(AuthError::InvalidClaims)
        ));
    }

    #[tokio::test]
    async fn audience_array_containing_expected_value_is_accepted() {
        let server = JwksServer::start().await;
        let verifier = verifier_for(&server);

        let mut claims = test_claims(&["get:drinks"]);
        claims["aud"] = json!([AUDIENCE, "https://cafe.test/userinfo"]);
        assert!(verifier.verify_token(&sign_token(&claims)).await.is_ok());
    }

    #[tokio::test]
    async fn token_without_permissions_still_verifies() {
        let server = JwksServer::start().await;
        let verifier = verifier_for(&server);

        let mut claims = test_claims(&[]);
        claims.as_object_mut().unwrap().remove("permissions");
        let verified = verifier.verify_token(&sign_token(&claims)).await.unwrap();
        assert!(verified.permissions.is_none());
    }

    #[tokio::test]
    async fn token_expired_a_second_ago_is_rejected_by_default() {
        let server = JwksServer::start().await;
        let verifier = verifier_with(&server, Algorithm::RS256);

        let mut claims = test_claims(&["get:drinks"]);
        claims["exp"] = json!(chrono::Utc::now().timestamp() - 1);

        assert!(matches!(
            verifier.verify_token(&sign_token(&claims)).await,
            Err(AuthError::ExpiredToken)
        ));
    }

    #[tokio::test]
    async fn opt_in_leeway_tolerates_small_skew() {
        let server = JwksServer::start().await;
        let verifier = verifier_with(&server, Algorithm::RS256).with_leeway(60);

        let mut claims = test_claims(&["get:drinks"]);
        claims["exp"] = json!(chrono::Utc::now().timestamp() - 30);

        assert!(verifier.verify_token(&sign_token(&claims)).await.is_ok());
    }

    #[tokio::test]
    async fn nbf_in_future_is_invalid_claims() {
        let server = JwksServer::start().await;
        let verifier = verifier_for(&server);

        let mut claims = test_claims(&["get:drinks"]);
        claims["nbf"] = json!(chrono::Utc::now().timestamp() + 3600);

        assert!(matches!(
            verifier.verify_token(&sign_token(&claims)).await,
            Err(AuthError::InvalidClaims)
        ));
    }

    #[tokio::test]
    async fn algless_key_verifies_configured_algorithm() {
        let server = JwksServer::start_with(jwks_document_without_alg()).await;
        let verifier = verifier_with(&server, Algorithm::RS384);
        let claims = test_claims(&["get:drinks"]);

        let verified = verifier
            .verify_token(&sign_token_with(Algorithm::RS384, &claims))
            .await
            .unwrap();
        assert_eq!(verified.sub, "auth0|barista");

        assert!(matches!(
            verifier.verify_token(&sign_token(&claims)).await,
            Err(AuthError::InvalidSignature)
        ));
    }
}
