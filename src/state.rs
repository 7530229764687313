// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{PermissionGate, TokenVerifier};
use crate::storage::DrinkStore;

/// Application context built once at startup and shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DrinkStore>,
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(store: DrinkStore, verifier: TokenVerifier) -> Self {
        Self {
            store: Arc::new(store),
            verifier: Arc::new(verifier),
        }
    }

    /// Gate requiring `permission` for the route it is layered onto.
    pub fn gate(&self, permission: &'static str) -> PermissionGate {
        PermissionGate::new(self.verifier.clone(), permission)
    }
}
