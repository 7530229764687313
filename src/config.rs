// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup into
//! [`Settings`]. Invalid values stop the service before it binds.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATABASE_PATH` | redb file holding the drinks table | `data/drinks.redb` |
//! | `AUTH_ISSUER` | Expected JWT issuer claim | Required |
//! | `AUTH_AUDIENCE` | Expected JWT audience claim | Required |
//! | `AUTH_JWKS_URL` | JWKS endpoint for JWT verification | `{AUTH_ISSUER}/.well-known/jwks.json` |
//! | `AUTH_ALGORITHM` | JWS algorithm tokens must use (asymmetric only) | `RS256` |
//! | `AUTH_CLOCK_SKEW_SECS` | Leeway for `exp`/`nbf` checks | `0` |
//! | `AUTH_JWKS_CACHE_TTL_SECS` | How long fetched keys are trusted | `300` |
//! | `SEED_SAMPLE_DRINK` | Add the sample drink to an empty menu | `false` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use url::Url;

use crate::auth::{jwks::DEFAULT_CACHE_TTL, verifier::CLOCK_SKEW_LEEWAY};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const DATABASE_PATH_ENV: &str = "DATABASE_PATH";
pub const AUTH_ISSUER_ENV: &str = "AUTH_ISSUER";
pub const AUTH_AUDIENCE_ENV: &str = "AUTH_AUDIENCE";
pub const AUTH_JWKS_URL_ENV: &str = "AUTH_JWKS_URL";
pub const AUTH_ALGORITHM_ENV: &str = "AUTH_ALGORITHM";
pub const AUTH_CLOCK_SKEW_ENV: &str = "AUTH_CLOCK_SKEW_SECS";
pub const AUTH_JWKS_CACHE_TTL_ENV: &str = "AUTH_JWKS_CACHE_TTL_SECS";
pub const SEED_SAMPLE_DRINK_ENV: &str = "SEED_SAMPLE_DRINK";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATABASE_PATH: &str = "data/drinks.redb";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(name: &'static str, value: &str, reason: impl ToString) -> Self {
        ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Token verification settings.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub issuer: String,
    pub audience: String,
    pub jwks_url: Url,
    pub algorithm: Algorithm,
    pub clock_skew: u64,
    pub jwks_cache_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    pub auth: AuthSettings,
    pub seed_sample_drink: bool,
    pub log_format: LogFormat,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get(PORT_ENV) {
            Some(value) => value
                .parse::<u16>()
                .map_err(|e| ConfigError::invalid(PORT_ENV, &value, e))?,
            None => DEFAULT_PORT,
        };
        let bind_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e| ConfigError::invalid(HOST_ENV, &host, e))?;

        let issuer = get(AUTH_ISSUER_ENV).ok_or(ConfigError::Missing(AUTH_ISSUER_ENV))?;
        let audience = get(AUTH_AUDIENCE_ENV).ok_or(ConfigError::Missing(AUTH_AUDIENCE_ENV))?;

        let jwks_url = get(AUTH_JWKS_URL_ENV).unwrap_or_else(|| {
            format!("{}/.well-known/jwks.json", issuer.trim_end_matches('/'))
        });
        let jwks_url = parse_jwks_url(&jwks_url)?;

        let algorithm = match get(AUTH_ALGORITHM_ENV) {
            Some(value) => parse_algorithm(&value)?,
            None => Algorithm::RS256,
        };

        let clock_skew = parse_u64(&get, AUTH_CLOCK_SKEW_ENV)?.unwrap_or(CLOCK_SKEW_LEEWAY);
        let jwks_cache_ttl = parse_u64(&get, AUTH_JWKS_CACHE_TTL_ENV)?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CACHE_TTL);

        let seed_sample_drink = match get(SEED_SAMPLE_DRINK_ENV) {
            Some(value) => parse_bool(SEED_SAMPLE_DRINK_ENV, &value)?,
            None => false,
        };

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            None => LogFormat::default(),
            Some(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            Some(value) if value.eq_ignore_ascii_case("pretty") => LogFormat::Pretty,
            Some(value) => {
                return Err(ConfigError::invalid(LOG_FORMAT_ENV, value, "expected 'json' or 'pretty'"))
            }
        };

        Ok(Self {
            bind_addr,
            database_path: get(DATABASE_PATH_ENV)
                .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string())
                .into(),
            auth: AuthSettings {
                issuer,
                audience,
                jwks_url,
                algorithm,
                clock_skew,
                jwks_cache_ttl,
            },
            seed_sample_drink,
            log_format,
        })
    }
}

/// Keys are only trusted over HTTPS; plain HTTP is allowed for loopback.
fn parse_jwks_url(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::invalid(AUTH_JWKS_URL_ENV, value, e))?;

    let loopback = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));
    match url.scheme() {
        "https" => Ok(url),
        "http" if loopback => Ok(url),
        _ => Err(ConfigError::invalid(AUTH_JWKS_URL_ENV, value, "JWKS must be fetched over https")),
    }
}

fn parse_algorithm(value: &str) -> Result<Algorithm, ConfigError> {
    let algorithm = Algorithm::from_str(value)
        .map_err(|_| ConfigError::invalid(AUTH_ALGORITHM_ENV, value, "unknown algorithm"))?;

    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Err(ConfigError::invalid(
            AUTH_ALGORITHM_ENV,
            value,
            "an asymmetric algorithm is required",
        )),
        _ => Ok(algorithm),
    }
}

fn parse_u64(get: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<Option<u64>, ConfigError> {
    get(name)
        .map(|value| value.parse::<u64>().map_err(|e| ConfigError::invalid(name, &value, e)))
        .transpose()
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::invalid(name, value, "expected a boolean")),
    }
}
