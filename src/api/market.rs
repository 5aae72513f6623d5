// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Market view endpoints.
//!
//! Every request fetches a fresh snapshot from the configured feed and
//! derives the requested view from it; nothing is cached between requests.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::ApiError,
    market::{derive, MarketError, MarketStats, MarketTicker, Snapshot, ViewKind},
    state::AppState,
};

#[derive(Deserialize, IntoParams)]
pub struct MarketQuery {
    /// Restrict the listing to pairs quoted in this currency, e.g. `USDT`.
    pub quote: Option<String>,
}

async fn fetch(state: &AppState) -> Result<Snapshot, ApiError> {
    state.market.all_tickers().await.map_err(|e| match e {
        MarketError::Unavailable(detail) => {
            tracing::error!(detail = %detail, "market feed unavailable");
            ApiError::internal("Market data source is unavailable")
                .with_code("upstream_unavailable")
        }
        MarketError::DataInvalid(detail) => {
            tracing::error!(detail = %detail, "market feed returned an invalid payload");
            ApiError::internal("Market data source returned invalid data")
                .with_code("upstream_data_invalid")
        }
    })
}

#[utoipa::path(
    get,
    path = "/api/market/currencies",
    params(MarketQuery),
    tag = "Market",
    responses(
        (status = 200, description = "Every listed ticker, normalized", body = [MarketTicker]),
        (status = 500, description = "Upstream feed unavailable or invalid")
    )
)]
pub async fn currencies(
    State(state): State<AppState>,
    Query(params): Query<MarketQuery>,
) -> Result<Json<Vec<MarketTicker>>, ApiError> {
    let snapshot = fetch(&state).await?;
    Ok(Json(derive::currencies(&snapshot, params.quote.as_deref())))
}

#[utoipa::path(
    get,
    path = "/api/market/trending",
    tag = "Market",
    responses(
        (status = 200, description = "Top USDT pairs by 24h volume", body = [MarketTicker]),
        (status = 500, description = "Upstream feed unavailable or invalid")
    )
)]
pub async fn trending(
    State(state): State<AppState>,
) -> Result<Json<Vec<MarketTicker>>, ApiError> {
    let snapshot = fetch(&state).await?;
    Ok(Json(derive::ranked(&snapshot, ViewKind::Trending)))
}

#[utoipa::path(
    get,
    path = "/api/market/top-gainers",
    tag = "Market",
    responses(
        (status = 200, description = "Top USDT pairs by 24h change", body = [MarketTicker]),
        (status = 500, description = "Upstream feed unavailable or invalid")
    )
)]
pub async fn top_gainers(
    State(state): State<AppState>,
) -> Result<Json<Vec<MarketTicker>>, ApiError> {
    let snapshot = fetch(&state).await?;
    Ok(Json(derive::ranked(&snapshot, ViewKind::TopGainers)))
}

#[utoipa::path(
    get,
    path = "/api/market/top-losers",
    tag = "Market",
    responses(
        (status = 200, description = "Bottom USDT pairs by 24h change", body = [MarketTicker]),
        (status = 500, description = "Upstream feed unavailable or invalid")
    )
)]
pub async fn top_losers(
    State(state): State<AppState>,
) -> Result<Json<Vec<MarketTicker>>, ApiError> {
    let snapshot = fetch(&state).await?;
    Ok(Json(derive::ranked(&snapshot, ViewKind::TopLosers)))
}

#[utoipa::path(
    get,
    path = "/api/market/spotdata",
    params(MarketQuery),
    tag = "Market",
    responses(
        (status = 200, description = "Spot pairs only", body = [MarketTicker]),
        (status = 500, description = "Upstream feed unavailable or invalid")
    )
)]
pub async fn spotdata(
    State(state): State<AppState>,
    Query(params): Query<MarketQuery>,
) -> Result<Json<Vec<MarketTicker>>, ApiError> {
    let snapshot = fetch(&state).await?;
    Ok(Json(derive::spot(&snapshot, params.quote.as_deref())))
}

#[utoipa::path(
    get,
    path = "/api/market/stats",
    tag = "Market",
    responses(
        (status = 200, description = "Whole-market aggregate", body = MarketStats),
        (status = 500, description = "Upstream feed unavailable or invalid")
    )
)]
pub async fn stats(State(state): State<AppState>) -> Result<Json<MarketStats>, ApiError> {
    let snapshot = fetch(&state).await?;
    Ok(Json(derive::stats(&snapshot)))
}
