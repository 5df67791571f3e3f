// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the [`AppConfig`] loaded once at
//! startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory for `events.redb`; unset keeps data in memory | unset |
//! | `JWT_SECRET` | HS256 signing secret | development default (logged) |
//! | `JWT_EXPIRATION_SECS` | Token lifetime in seconds | `86400` |
//! | `AUTH_HEADER` | Header carrying the bearer token | `Authorization` |
//! | `AUTH_PREFIX` | Prefix before the token in that header | `Bearer ` |
//! | `PAGE_DEFAULT_SIZE` | Event listing page size when none is given | `10` |
//! | `PAGE_MAX_SIZE` | Largest accepted page size | `100` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;

use axum::http::HeaderName;
use chrono::Duration;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the data directory.
///
/// When set, the server opens `<DATA_DIR>/events.redb`. When unset, all data
/// lives in memory and is lost on restart.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// File name of the embedded database inside `DATA_DIR`.
pub const DATABASE_FILE: &str = "events.redb";

pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_EXPIRATION_ENV: &str = "JWT_EXPIRATION_SECS";
pub const AUTH_HEADER_ENV: &str = "AUTH_HEADER";
pub const AUTH_PREFIX_ENV: &str = "AUTH_PREFIX";
pub const PAGE_DEFAULT_SIZE_ENV: &str = "PAGE_DEFAULT_SIZE";
pub const PAGE_MAX_SIZE_ENV: &str = "PAGE_MAX_SIZE";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_JWT_EXPIRATION_SECS: i64 = 86_400;
pub const DEFAULT_AUTH_PREFIX: &str = "Bearer ";
pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const DEFAULT_MAX_PAGE_SIZE: u64 = 100;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Signing secret used when `JWT_SECRET` is unset. Development only.
const DEV_JWT_SECRET: &str = "dev-only-insecure-jwt-secret-change-me";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Settings read from the environment at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: Option<PathBuf>,
    pub jwt_secret: String,
    pub jwt_expiration_secs: i64,
    pub auth_header: HeaderName,
    pub auth_prefix: String,
    pub page_default_size: u64,
    pub page_max_size: u64,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            data_dir: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_expiration_secs: DEFAULT_JWT_EXPIRATION_SECS,
            auth_header: axum::http::header::AUTHORIZATION,
            auth_prefix: DEFAULT_AUTH_PREFIX.to_string(),
            page_default_size: DEFAULT_PAGE_SIZE,
            page_max_size: DEFAULT_MAX_PAGE_SIZE,
            log_format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Unset or empty values use defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let jwt_secret = get(JWT_SECRET_ENV).unwrap_or(defaults.jwt_secret);

        let auth_header = match get(AUTH_HEADER_ENV) {
            Some(name) => HeaderName::try_from(name.as_str()).map_err(|_| ConfigError::Invalid {
                var: AUTH_HEADER_ENV,
                expected: "a valid header name",
                value: name.clone(),
            })?,
            None => defaults.auth_header,
        };

        let jwt_expiration_secs: i64 = parse_or(
            get(JWT_EXPIRATION_ENV),
            JWT_EXPIRATION_ENV,
            defaults.jwt_expiration_secs,
            "a positive integer",
        )?;
        if jwt_expiration_secs <= 0 || Duration::try_seconds(jwt_expiration_secs).is_none() {
            return Err(ConfigError::Invalid {
                var: JWT_EXPIRATION_ENV,
                expected: "a positive integer",
                value: jwt_expiration_secs.to_string(),
            });
        }

        let page_max_size: u64 = parse_or(
            get(PAGE_MAX_SIZE_ENV),
            PAGE_MAX_SIZE_ENV,
            defaults.page_max_size,
            "a positive integer",
        )?
        .max(1);
        let page_default_size: u64 = parse_or(
            get(PAGE_DEFAULT_SIZE_ENV),
            PAGE_DEFAULT_SIZE_ENV,
            defaults.page_default_size,
            "a positive integer",
        )?
        .clamp(1, page_max_size);

        let log_format = match get(LOG_FORMAT_ENV).as_deref().map(str::to_ascii_lowercase) {
            None => LogFormat::Pretty,
            Some(format) if format == "pretty" => LogFormat::Pretty,
            Some(format) if format == "json" => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: LOG_FORMAT_ENV,
                    expected: "`json` or `pretty`",
                    value: other,
                })
            }
        };

        Ok(Self {
            host: get(HOST_ENV).unwrap_or(defaults.host),
            port: parse_or(get(PORT_ENV), PORT_ENV, defaults.port, "a port number")?,
            data_dir: get(DATA_DIR_ENV).map(PathBuf::from),
            jwt_secret,
            jwt_expiration_secs,
            auth_header,
            // The prefix keeps its trailing space, so it is not filtered for emptiness.
            auth_prefix: lookup(AUTH_PREFIX_ENV).unwrap_or(defaults.auth_prefix),
            page_default_size,
            page_max_size,
            log_format,
        })
    }

    /// Path of the redb file, when persistence is enabled.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(DATABASE_FILE))
    }

    /// Token lifetime. Out-of-range values saturate; issuing then fails.
    pub fn token_lifetime(&self) -> Duration {
        Duration::try_seconds(self.jwt_expiration_secs).unwrap_or(Duration::MAX)
    }

    /// True when `JWT_SECRET` was not provided. Logged at startup.
    pub fn uses_development_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    var: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            expected,
            value,
        }),
    }
}
