// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer-token authentication and permission checks for the drinks API.
//!
//! ## Auth Flow
//!
//! 1. The client obtains an access token from the identity provider
//! 2. The client sends `Authorization: Bearer <JWT>`
//! 3. The permission gate in front of a privileged route:
//!    - Fetches the provider's JWKS via HTTPS (cached)
//!    - Verifies the JWT signature, expiry, issuer, audience
//!    - Checks the `permissions` claim for the route's permission
//!    - Hands the decoded claims to the handler
//!
//! ## Security
//!
//! - Only the configured asymmetric algorithm is accepted
//! - JWKS is cached with TTL for performance
//! - No clock skew tolerance unless `AUTH_CLOCK_SKEW_SECS` opts in
//! - Error responses carry a reason code, never token or key material

pub mod claims;
pub mod error;
pub mod extractor;
pub mod gate;
pub mod jwks;
pub mod permissions;
pub mod verifier;

pub use claims::ClaimSet;
pub use error::AuthError;
pub use extractor::Authorized;
pub use gate::{require_permission, PermissionGate};
pub use jwks::JwksManager;
pub use verifier::TokenVerifier;
