// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Coffee Shop - Drinks Menu API
//!
//! Serves a café's drinks menu over HTTP. Reading the short menu is public;
//! everything else requires a bearer JWT from the identity provider whose
//! `permissions` claim grants the route's permission.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token verification and permission gating (JWKS-backed JWT)
//! - `storage` - Drinks table (redb)

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
pub mod telemetry;

#[cfg(test)]
mod test_support;
