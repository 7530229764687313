// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Permission scopes and the permission check.
//!
//! Matching is exact and case-sensitive. There is no hierarchy:
//! `post:drinks` does not imply `get:drinks`.

use super::{AuthError, ClaimSet};

pub const GET_DRINKS: &str = "get:drinks";
pub const GET_DRINKS_DETAIL: &str = "get:drinks-detail";
pub const POST_DRINKS: &str = "post:drinks";
pub const PATCH_DRINKS: &str = "patch:drinks";
pub const DELETE_DRINKS: &str = "delete:drinks";

/// Decide whether `claims` grant `required`.
///
/// A token without any `permissions` claim means the identity provider is not
/// emitting permissions for this API, which is reported separately from a
/// plain denial.
pub fn check(claims: &ClaimSet, required: &str) -> Result<(), AuthError> {
    let granted = claims
        .permissions
        .as_ref()
        .ok_or(AuthError::PermissionsClaimMissing)?;

    if granted.iter().any(|permission| permission == required) {
        Ok(())
    } else {
        Err(AuthError::PermissionDenied)
    }
}
