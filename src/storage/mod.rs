// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent storage for the drinks menu in a single embedded redb file
//! (`DATABASE_PATH`). The store enforces the drink invariants: a non-empty,
//! unique title and a non-empty recipe of positive parts.

pub mod drinks;

pub use drinks::{DrinkStore, StoreError, StoreResult};

use crate::error::ApiError;

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::not_found(err.to_string()),
            StoreError::DuplicateTitle(_) | StoreError::Invalid(_) => {
                ApiError::unprocessable(err.to_string())
            }
            other => {
                tracing::error!(error = %other, "drink store failure");
                ApiError::unprocessable("The drink could not be processed")
            }
        }
    }
}
