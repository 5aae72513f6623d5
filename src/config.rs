// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, fixed policy constants,
//! and the [`AppConfig`] snapshot loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory holding the identity database | `./data` |
//! | `JWT_SECRET` | HS256 signing key for session tokens; also keys the HMAC digests of stored one-time codes and reset tokens | Required |
//! | `CLIENT_URL` | Dashboard frontend base URL used in reset links | `http://localhost:5173` |
//! | `MARKET_API_BASE_URL` | Exchange REST API base URL | `https://api.kucoin.com` |
//! | `MAIL_RELAY_URL` | HTTP mail relay endpoint (unset = log-only notifier) | Optional |
//! | `MAIL_RELAY_API_KEY` | Bearer key for the mail relay | Required with `MAIL_RELAY_URL` |
//! | `MAIL_FROM` | Sender address for outbound mail | `no-reply@relational.markets` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;

use thiserror::Error;

/// Environment variable name for the identity database directory.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Environment variable name for the session signing secret.
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";

/// Environment variable name for the frontend base URL (reset links).
pub const CLIENT_URL_ENV: &str = "CLIENT_URL";

/// Environment variable name for the exchange API base URL.
pub const MARKET_API_BASE_URL_ENV: &str = "MARKET_API_BASE_URL";

/// File name of the redb identity database inside `DATA_DIR`.
pub const IDENTITY_DB_FILE: &str = "identities.redb";

/// Minutes a one-time verification code stays valid after registration.
pub const OTP_TTL_MINUTES: i64 = 30;

/// Minutes a password-reset token stays valid after issuance.
pub const RESET_TOKEN_TTL_MINUTES: i64 = 60;

/// Days a session token stays valid after issuance. Expiry is exact; there
/// is no server-side revocation before it.
pub const SESSION_TTL_DAYS: i64 = 7;

/// Minimum accepted password length, checked before any storage access.
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    MissingEnv(String),
    #[error("invalid PORT value: {0}")]
    InvalidPort(String),
}

/// Configuration snapshot loaded once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub jwt_secret: String,
    pub client_url: String,
    pub market_api_base_url: String,
}

impl AppConfig {
    /// Load configuration from the environment.
    ///
    /// Fails when `JWT_SECRET` is unset or `PORT` does not parse; every
    /// other variable has a workable default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_or_default("HOST", "0.0.0.0");
        let port_raw = env_or_default("PORT", "8080");
        let port: u16 = port_raw
            .parse()
            .map_err(|_| ConfigError::InvalidPort(port_raw.clone()))?;

        Ok(Self {
            host,
            port,
            data_dir: PathBuf::from(env_or_default(DATA_DIR_ENV, "./data")),
            jwt_secret: env_required(JWT_SECRET_ENV)?,
            client_url: env_or_default(CLIENT_URL_ENV, "http://localhost:5173"),
            market_api_base_url: env_or_default(MARKET_API_BASE_URL_ENV, "https://api.kucoin.com"),
        })
    }

    /// Path of the redb identity database file.
    pub fn identity_db_path(&self) -> PathBuf {
        self.data_dir.join(IDENTITY_DB_FILE)
    }

    /// `host:port` string for the listener bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub(crate) fn env_required(name: &str) -> Result<String, ConfigError> {
    env_optional(name).ok_or_else(|| ConfigError::MissingEnv(name.to_string()))
}

pub(crate) fn env_optional(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) => {
            let trimmed = value.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }
        Err(_) => None,
    }
}

pub(crate) fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
