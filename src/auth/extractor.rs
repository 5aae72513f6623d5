// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated requests.
//!
//! Use the `Auth` extractor in handlers to require a valid session:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(identity): Auth) -> impl IntoResponse {
//!     // identity.identity_id is the caller's id
//! }
//! ```
//!
//! The token is read from the request's own `Authorization` header every
//! time; there is no process-wide default credential and no ambient auth
//! state.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::{AuthError, AuthenticatedIdentity};
use crate::state::AppState;

/// Extractor for authenticated identities.
///
/// Validates the bearer token against the session authority and yields the
/// identity it is bound to. Rejection is always a 401 body; handlers that
/// additionally need the identity record to exist look it up themselves and
/// answer 404 when it is gone.
///
/// # Example
///
/// ```rust,ignore
/// async fn list_favorites(
///     Auth(identity): Auth,
///     State(state): State<AppState>,
/// ) -> Result<Json<FavoritesResponse>, ApiError> {
///     // identity.identity_id is a validated UUID string
/// }
/// ```
#[derive(Clone)]
pub struct Auth(pub AuthenticatedIdentity);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthHeader)?;

        let identity = state.sessions.validate(token)?;

        Ok(Auth(identity))
    }
}
