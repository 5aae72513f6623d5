// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Market Data Module
//!
//! Live-market snapshot handling: one upstream fetch produces a
//! [`Snapshot`], and every dashboard view is derived from it by pure
//! functions. No market data is persisted.
//!
//! ## Layout
//!
//! - [`snapshot`] - upstream ticker normalization into [`Snapshot`]
//! - [`derive`] - ranked views, spot filtering, aggregate stats
//!
//! The actual HTTP fetch lives behind the [`MarketFeed`] trait so handlers
//! stay testable against scripted feeds.

pub mod derive;
pub mod snapshot;

use async_trait::async_trait;

pub use derive::{MarketStats, MarketTicker, ViewKind};
pub use snapshot::{RawTicker, Snapshot, Ticker};

/// Errors surfaced by a market feed.
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    /// The upstream exchange could not be reached or answered non-success.
    #[error("market data source unavailable: {0}")]
    Unavailable(String),

    /// The upstream answered, but the payload did not have the expected
    /// shape.
    #[error("market data source returned an invalid payload: {0}")]
    DataInvalid(String),
}

/// Source of full-market ticker snapshots.
///
/// The production implementation talks to the exchange REST API; tests
/// substitute scripted feeds.
#[async_trait]
pub trait MarketFeed: Send + Sync {
    /// Fetch a fresh snapshot of every ticker the exchange lists.
    async fn all_tickers(&self) -> Result<Snapshot, MarketError>;
}
