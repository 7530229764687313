// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Test fixtures: a loopback JWKS endpoint and token minting.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use tempfile::TempDir;
use url::Url;

use crate::auth::{JwksManager, TokenVerifier};
use crate::state::AppState;
use crate::storage::DrinkStore;

pub const ISSUER: &str = "https://cafe.test/";
pub const AUDIENCE: &str = "drinks";
pub const SIGNING_KID: &str = "cafe-test-key";

const SIGNING_KEY_PEM: &[u8] = include_bytes!("../testdata/signing_key.pem");
const FOREIGN_KEY_PEM: &[u8] = include_bytes!("../testdata/foreign_key.pem");

/// Public half of `testdata/signing_key.pem`.
const SIGNING_KEY_N: &str = "odocAiOYFynGWJ6-BAhvE_EPx8A7J_MLehWNJcTJAW909JZiqssVkh1jWad80JOnyZIoRDbzkioCorypj3apkOjuk1cDfgXvlLaDUBlj7Ec250y9ktD-_OBA2LlMjB87DwWMmUlRVrJUHe8ATBGz_LQuToqZzAf6hUkJXsyHxSutLd4wQ5uli8xZrSaQ-xVSovZV1HQ8p95Nz0yuwReWaSngdA-QYo4gpg2FnF1px-BLcrEVA3hEp4DemRs1CiJwfRByi75oVQ5NB8hsssrxtqnzspwt7ppG_c5jIwt0fymE8aVFRk8vvph-9k9of9M6zPvJksONYjRVLlrgRV9jrw";
const SIGNING_KEY_E: &str = "AQAB";

/// Key set publishing the signing key with `alg: RS256`.
pub fn jwks_document() -> Value {
    json!({
        "keys": [{
            "kty": "RSA",
            "use": "sig",
            "alg": "RS256",
            "kid": SIGNING_KID,
            "n": SIGNING_KEY_N,
            "e": SIGNING_KEY_E,
        }]
    })
}

/// Key set publishing the signing key without the optional `alg` member.
pub fn jwks_document_without_alg() -> Value {
    let mut document = jwks_document();
    document["keys"][0].as_object_mut().unwrap().remove("alg");
    document
}

struct Endpoint {
    document: Mutex<Value>,
    unhealthy: AtomicBool,
    hits: AtomicUsize,
}

async fn serve_jwks(State(endpoint): State<Arc<Endpoint>>) -> impl IntoResponse {
    endpoint.hits.fetch_add(1, Ordering::SeqCst);
    if endpoint.unhealthy.load(Ordering::SeqCst) {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    let document = endpoint.document.lock().unwrap().clone();
    Json(document).into_response()
}

/// JWKS endpoint on an ephemeral loopback port.
pub struct JwksServer {
    pub url: String,
    endpoint: Arc<Endpoint>,
}

impl JwksServer {
    pub async fn start() -> Self {
        Self::start_with(jwks_document()).await
    }

    pub async fn start_with(document: Value) -> Self {
        let endpoint = Arc::new(Endpoint {
            document: Mutex::new(document),
            unhealthy: AtomicBool::new(false),
            hits: AtomicUsize::new(0),
        });
        let app = Router::new()
            .route("/.well-known/jwks.json", get(serve_jwks))
            .with_state(endpoint.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{addr}/.well-known/jwks.json"),
            endpoint,
        }
    }

    pub fn hits(&self) -> usize {
        self.endpoint.hits.load(Ordering::SeqCst)
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.endpoint.unhealthy.store(!healthy, Ordering::SeqCst);
    }

    pub fn set_document(&self, document: Value) {
        *self.endpoint.document.lock().unwrap() = document;
    }
}

pub fn verifier_for(server: &JwksServer) -> TokenVerifier {
    let jwks = JwksManager::new(Url::parse(&server.url).unwrap()).unwrap();
    TokenVerifier::new(jwks, ISSUER, AUDIENCE, Algorithm::RS256)
}

/// App state over a scratch database and a loopback JWKS.
pub async fn test_state() -> (AppState, JwksServer, TempDir) {
    let server = JwksServer::start().await;
    let dir = TempDir::new().unwrap();
    let store = DrinkStore::open(&dir.path().join("drinks.redb")).unwrap();
    let state = AppState::new(store, verifier_for(&server));
    (state, server, dir)
}

/// Claims accepted by [`verifier_for`], valid for an hour.
pub fn test_claims(permissions: &[&str]) -> Value {
    let now = chrono::Utc::now().timestamp();
    json!({
        "iss": ISSUER,
        "sub": "auth0|barista",
        "aud": AUDIENCE,
        "iat": now,
        "exp": now + 3600,
        "permissions": permissions,
    })
}

fn header(algorithm: Algorithm) -> Header {
    let mut header = Header::new(algorithm);
    header.kid = Some(SIGNING_KID.to_string());
    header
}

/// Token signed by the key published in the test JWKS.
pub fn sign_token(claims: &Value) -> String {
    sign_token_with(Algorithm::RS256, claims)
}

/// Same key, any RSA-family algorithm.
pub fn sign_token_with(algorithm: Algorithm, claims: &Value) -> String {
    let key = EncodingKey::from_rsa_pem(SIGNING_KEY_PEM).unwrap();
    encode(&header(algorithm), claims, &key).unwrap()
}

/// Token claiming the published key id but signed by a different key.
pub fn foreign_token(claims: &Value) -> String {
    let key = EncodingKey::from_rsa_pem(FOREIGN_KEY_PEM).unwrap();
    encode(&header(Algorithm::RS256), claims, &key).unwrap()
}

/// Hand-assembled token with an arbitrary header and a junk signature.
pub fn forge_token(header: &Value, claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(header).unwrap());
    let claims = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap());
    format!("{header}.{claims}.c2lnbmF0dXJl")
}

pub fn bearer(claims: &Value) -> String {
    format!("Bearer {}", sign_token(claims))
}
