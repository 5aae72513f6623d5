// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-identity favorite symbols.
//!
//! All three operations require a valid session and act only on the
//! caller's own set. Symbols are stored uppercase so `btc-usdt` and
//! `BTC-USDT` name the same favorite.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    auth::Auth,
    error::ApiError,
    models::{FavoriteRequest, FavoritesResponse, Symbol},
    state::AppState,
};

use super::store_error;

fn canonical_symbol(raw: &str) -> Result<String, ApiError> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(ApiError::bad_request("A symbol is required"));
    }
    Ok(symbol)
}

fn to_response(favorites: Vec<String>) -> Json<FavoritesResponse> {
    Json(FavoritesResponse {
        favorites: favorites.into_iter().map(Symbol::from).collect(),
    })
}

#[utoipa::path(
    post,
    path = "/api/market/favorites",
    request_body = FavoriteRequest,
    tag = "Favorites",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Updated favorites set", body = FavoritesResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Identity behind the token no longer exists")
    )
)]
pub async fn add_favorite(
    State(state): State<AppState>,
    Auth(session): Auth,
    Json(request): Json<FavoriteRequest>,
) -> Result<Json<FavoritesResponse>, ApiError> {
    let symbol = canonical_symbol(&request.symbol.0)?;
    let favorites = state
        .store
        .add_favorite(&session.identity_id, &symbol)
        .map_err(store_error)?;
    Ok(to_response(favorites))
}

#[utoipa::path(
    delete,
    path = "/api/market/favorites/{symbol}",
    params(
        ("symbol" = String, Path, description = "Symbol to remove, e.g. BTC-USDT")
    ),
    tag = "Favorites",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Updated favorites set", body = FavoritesResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Identity behind the token no longer exists")
    )
)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    Auth(session): Auth,
    Path(symbol): Path<String>,
) -> Result<Json<FavoritesResponse>, ApiError> {
    let symbol = canonical_symbol(&symbol)?;
    let favorites = state
        .store
        .remove_favorite(&session.identity_id, &symbol)
        .map_err(store_error)?;
    Ok(to_response(favorites))
}

#[utoipa::path(
    get,
    path = "/api/market/favorites",
    tag = "Favorites",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current favorites set", body = FavoritesResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Identity behind the token no longer exists")
    )
)]
pub async fn list_favorites(
    State(state): State<AppState>,
    Auth(session): Auth,
) -> Result<Json<FavoritesResponse>, ApiError> {
    let favorites = state
        .store
        .favorites(&session.identity_id)
        .map_err(store_error)?;
    Ok(to_response(favorites))
}
