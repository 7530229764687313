// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Security
//!
//! - The key set URL must be HTTPS (loopback hosts excepted, see `config`)
//! - Keys are cached with a configurable TTL
//! - Stale cache is used on fetch failure (fail-open for availability)
//! - After a failed fetch, refetching waits for the refresh backoff
//! - An unknown `kid` triggers one early refetch, at most once per backoff
//!
//! ## Usage
//!
//! Built from `AUTH_JWKS_URL` at startup and owned by the `TokenVerifier`
//! stored in `AppState`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, EllipticCurve as Curve, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::RwLock;
use url::Url;

use super::error::AuthError;

/// Default JWKS cache TTL (5 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Minimum spacing between fetches that are not due to TTL expiry.
pub const DEFAULT_REFRESH_BACKOFF: Duration = Duration::from_secs(30);

/// Timeout for a single key set request.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// JWKS cache entry.
struct CacheEntry {
    jwks: JwkSet,
    fetched_at: Instant,
    /// Last failed refetch while these keys were stale
    failed_at: Option<Instant>,
}

/// JWKS manager with caching.
///
/// Fetches and caches the identity provider's signing keys.
#[derive(Clone)]
pub struct JwksManager {
    /// JWKS URL
    jwks_url: Url,
    /// Cache TTL
    cache_ttl: Duration,
    /// Spacing for retries after failure and for unknown-`kid` refetches
    refresh_backoff: Duration,
    /// Cached JWKS
    cache: Arc<RwLock<Option<CacheEntry>>>,
    /// HTTP client
    client: reqwest::Client,
}

impl JwksManager {
    /// Create a new JWKS manager.
    ///
    /// # Arguments
    /// - `jwks_url`: The JWKS endpoint URL (e.g., `https://tenant.eu.auth0.com/.well-known/jwks.json`)
    pub fn new(jwks_url: Url) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| AuthError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            jwks_url,
            cache_ttl: DEFAULT_CACHE_TTL,
            refresh_backoff: DEFAULT_REFRESH_BACKOFF,
            cache: Arc::new(RwLock::new(None)),
            client,
        })
    }

    /// Create with custom cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_refresh_backoff(mut self, backoff: Duration) -> Self {
        self.refresh_backoff = backoff;
        self
    }

    /// Get the JWKS URL.
    pub fn jwks_url(&self) -> &Url {
        &self.jwks_url
    }

    /// Fetch JWKS (with caching).
    async fn get_jwks(&self) -> Result<JwkSet, AuthError> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = &*cache {
                if entry.fetched_at.elapsed() < self.cache_ttl {
                    return Ok(entry.jwks.clone());
                }
                if entry
                    .failed_at
                    .is_some_and(|failed| failed.elapsed() < self.refresh_backoff)
                {
                    return Ok(entry.jwks.clone());
                }
            }
        }

        match self.fetch_jwks().await {
            Ok(jwks) => {
                self.store(jwks.clone()).await;
                Ok(jwks)
            }
            Err(err) => {
                let mut cache = self.cache.write().await;
                match cache.as_mut() {
                    Some(entry) => {
                        tracing::warn!(
                            error = %err,
                            detail = err.detail().unwrap_or_default(),
                            retry_in = ?self.refresh_backoff,
                            "JWKS refresh failed, serving stale keys"
                        );
                        entry.failed_at = Some(Instant::now());
                        Ok(entry.jwks.clone())
                    }
                    None => Err(err),
                }
            }
        }
    }

    /// Whether an unknown `kid` may trigger a refetch right now.
    async fn may_refetch_for_rotation(&self) -> bool {
        let cache = self.cache.read().await;
        match &*cache {
            Some(entry) => {
                entry.fetched_at.elapsed() >= self.refresh_backoff
                    && !entry
                        .failed_at
                        .is_some_and(|failed| failed.elapsed() < self.refresh_backoff)
            }
            None => false,
        }
    }

    async fn store(&self, jwks: JwkSet) {
        let mut cache = self.cache.write().await;
        *cache = Some(CacheEntry {
            jwks,
            fetched_at: Instant::now(),
            failed_at: None,
        });
    }

    /// Fetch JWKS from the endpoint.
    async fn fetch_jwks(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .client
            .get(self.jwks_url.clone())
            .send()
            .await
            .map_err(|e| AuthError::KeySetUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::KeySetUnavailable(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::KeySetUnavailable(e.to_string()))?;

        tracing::debug!(keys = jwks.keys.len(), url = %self.jwks_url, "fetched JWKS");
        Ok(jwks)
    }

    /// Get a key for `kid` that can verify `algorithm` signatures.
    ///
    /// An unknown key id, or a key that does not fit the algorithm, is
    /// reported as [`AuthError::InvalidSignature`]: no key we trust could
    /// have produced the signature.
    pub async fn get_decoding_key(
        &self,
        kid: &str,
        algorithm: Algorithm,
    ) -> Result<DecodingKey, AuthError> {
        let mut jwks = self.get_jwks().await?;

        if jwks.find(kid).is_none() && self.may_refetch_for_rotation().await {
            tracing::debug!(kid, "unknown key id, refetching JWKS");
            match self.fetch_jwks().await {
                Ok(fresh) => {
                    self.store(fresh.clone()).await;
                    jwks = fresh;
                }
                Err(err) => {
                    tracing::warn!(error = %err, kid, "JWKS refetch for unknown key id failed");
                    if let Some(entry) = self.cache.write().await.as_mut() {
                        entry.failed_at = Some(Instant::now());
                    }
                }
            }
        }

        let jwk = jwks.find(kid).ok_or(AuthError::InvalidSignature)?;
        if !key_fits(jwk, algorithm) {
            tracing::debug!(kid, ?algorithm, "key does not fit the configured algorithm");
            return Err(AuthError::InvalidSignature);
        }

        DecodingKey::from_jwk(jwk).map_err(|_| AuthError::InvalidSignature)
    }

    /// Force refresh the JWKS cache.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let jwks = self.fetch_jwks().await?;
        self.store(jwks).await;
        Ok(())
    }

    /// Check if JWKS is currently cached and valid.
    pub async fn is_cached(&self) -> bool {
        let cache = self.cache.read().await;
        if let Some(entry) = &*cache {
            entry.fetched_at.elapsed() < self.cache_ttl
        } else {
            false
        }
    }
}

/// The signing algorithm a JWK declares in its optional `alg` member.
fn declared_algorithm(alg: KeyAlgorithm) -> Option<Algorithm> {
    match alg {
        KeyAlgorithm::RS256 => Some(Algorithm::RS256),
        KeyAlgorithm::RS384 => Some(Algorithm::RS384),
        KeyAlgorithm::RS512 => Some(Algorithm::RS512),
        KeyAlgorithm::PS256 => Some(Algorithm::PS256),
        KeyAlgorithm::PS384 => Some(Algorithm::PS384),
        KeyAlgorithm::PS512 => Some(Algorithm::PS512),
        KeyAlgorithm::ES256 => Some(Algorithm::ES256),
        KeyAlgorithm::ES384 => Some(Algorithm::ES384),
        KeyAlgorithm::EdDSA => Some(Algorithm::EdDSA),
        _ => None,
    }
}

/// Whether `jwk` can verify signatures made with `algorithm`.
///
/// A declared `alg` must match exactly. Without one, the key type and curve
/// decide.
fn key_fits(jwk: &Jwk, algorithm: Algorithm) -> bool {
    if let Some(declared) = jwk.common.key_algorithm {
        return declared_algorithm(declared) == Some(algorithm);
    }

    match &jwk.algorithm {
        AlgorithmParameters::RSA(_) => matches!(
            algorithm,
            Algorithm::RS256
                | Algorithm::RS384
                | Algorithm::RS512
                | Algorithm::PS256
                | Algorithm::PS384
                | Algorithm::PS512
        ),
        AlgorithmParameters::EllipticCurve(ec) => matches!(
            (&ec.curve, algorithm),
            (Curve::P256, Algorithm::ES256) | (Curve::P384, Algorithm::ES384)
        ),
        AlgorithmParameters::OctetKeyPair(okp) => {
            matches!(okp.curve, Curve::Ed25519) && algorithm == Algorithm::EdDSA
        }
        // Symmetric and unknown key types can never verify an asymmetric signature.
        _ => false,
    }
}
