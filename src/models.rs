// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API. All types derive `Serialize`, `Deserialize`, and `ToSchema`
//! for automatic JSON handling and OpenAPI documentation.
//!
//! ## Symbol Type
//!
//! The [`Symbol`] newtype wraps exchange trading-pair symbols
//! (e.g. `BTC-USDT`). It provides type safety and clear semantics where
//! plain strings would be ambiguous.
//!
//! ## Model Categories
//!
//! - **Auth**: registration, OTP verification, login, password reset
//! - **Identity**: the public projection returned to clients (no password
//!   hash, no one-time codes, no reset tokens)
//! - **Favorites**: per-user watched symbols

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::StoredIdentity;

// =============================================================================
// Symbol Type
// =============================================================================

/// Exchange trading-pair symbol wrapper.
///
/// Format: base and quote currency joined by a dash, e.g. `BTC-USDT`.
///
/// # Example
///
/// ```rust,ignore
/// let symbol = Symbol::from("BTC-USDT");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(pub String);

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Symbol(value)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Symbol(value.to_string())
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

// =============================================================================
// Auth Models
// =============================================================================

/// Request to register a new account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Display name for the account.
    pub name: String,
    /// Email address; the case-insensitive uniqueness key.
    pub email: String,
    /// Plaintext password; stored only as an irreversible hash.
    pub password: String,
}

/// Request to verify a registration with the emailed one-time code.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VerifyOtpRequest {
    /// Email address the code was sent to.
    pub email: String,
    /// The 6-digit one-time code.
    pub otp: String,
}

/// Request to log in with email and password.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request to start a password reset.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Request to complete a password reset with an emailed token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    /// The opaque reset token from the emailed link.
    pub token: String,
    /// The replacement password.
    pub password: String,
}

/// Public projection of an identity.
///
/// Deliberately excludes the password hash, one-time code, and reset token;
/// those never leave the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct IdentityResponse {
    /// Unique identifier (UUID).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Email address as registered.
    pub email: String,
    /// Whether the email has been verified via OTP.
    pub verified: bool,
    /// Registration timestamp.
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&StoredIdentity> for IdentityResponse {
    fn from(identity: &StoredIdentity) -> Self {
        Self {
            id: identity.id.clone(),
            name: identity.name.clone(),
            email: identity.email.clone(),
            verified: identity.verified,
            created_at: identity.created_at,
        }
    }
}

/// Successful authentication: a session token plus the identity it is bound to.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    /// Signed bearer token, valid for 7 days.
    pub token: String,
    pub identity: IdentityResponse,
}

/// Generic confirmation body for operations with no payload to return.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

// =============================================================================
// Favorites Models
// =============================================================================

/// Request to add a symbol to the caller's favorites.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FavoriteRequest {
    /// The symbol to favorite, e.g. `BTC-USDT`.
    pub symbol: Symbol,
}

/// The caller's full favorites set after a read or mutation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FavoritesResponse {
    pub favorites: Vec<Symbol>,
}
