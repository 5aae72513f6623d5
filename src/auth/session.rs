// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token issuance and validation.
//!
//! Sessions are HS256 JWTs signed with the `JWT_SECRET` key. The claims are
//! minimal: `sub` (identity id), `iat`, and `exp` (issuance + 7 days).
//! Validation is stateless; there is no revocation list, so a token stays
//! valid until its exact expiry.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use super::AuthError;
use crate::config::SESSION_TTL_DAYS;

/// JWT claims embedded in a session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the identity id (UUID).
    pub sub: String,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiry, seconds since epoch.
    pub exp: i64,
}

/// The validated output of a bearer token: who is calling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    /// Identity id the token is bound to.
    pub identity_id: String,
    /// Token expiry, seconds since epoch.
    pub expires_at: i64,
}

/// Issues and validates session tokens.
///
/// Stateless by construction: both directions derive everything from the
/// signing secret and the token itself.
pub struct SessionAuthority {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SessionAuthority {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token for `identity_id`, valid from now for 7 days.
    pub fn issue(&self, identity_id: &str) -> Result<String, AuthError> {
        self.issue_at(identity_id, Utc::now())
    }

    /// Issue a token with an explicit issuance instant.
    ///
    /// The expiry window is always `issued_at` + [`SESSION_TTL_DAYS`];
    /// callers cannot choose a different lifetime.
    pub fn issue_at(
        &self,
        identity_id: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = SessionClaims {
            sub: identity_id.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + Duration::days(SESSION_TTL_DAYS)).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InternalError(e.to_string()))
    }

    /// Verify signature and expiry; return the bound identity.
    ///
    /// Expiry is exact (zero leeway): a token one second past its window is
    /// rejected.
    pub fn validate(&self, token: &str) -> Result<AuthenticatedIdentity, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;

        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
                _ => AuthError::MalformedToken,
            })?;

        Ok(AuthenticatedIdentity {
            identity_id: token_data.claims.sub,
            expires_at: token_data.claims.exp,
        })
    }
}
