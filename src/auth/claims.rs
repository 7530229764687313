// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Decoded JWT claim set.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audience claim. RFC 7519 allows either a single string or an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::Single(aud) => aud == audience,
            Audience::Many(auds) => auds.iter().any(|aud| aud == audience),
        }
    }
}

/// Claims carried by an identity-provider access token.
///
/// Registered claims are typed; anything else the provider emits lands in
/// `extra`. `permissions` stays an `Option` so that a token without the claim
/// can be told apart from a token with an empty list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSet {
    /// Issuer (identity provider tenant URL)
    pub iss: String,

    /// Subject (user or client id)
    pub sub: String,

    /// Audience (API identifier)
    pub aud: Audience,

    /// Expiration timestamp
    pub exp: i64,

    /// Issued at timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Not before timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Authorized party
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,

    /// Space-separated OAuth scopes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Granted permission scopes, e.g. `post:drinks`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,

    /// Claims not recognized above
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ClaimSet {
    /// Token expiry as a timestamp, if it is representable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .as_ref()
            .is_some_and(|granted| granted.iter().any(|p| p == permission))
    }
}
