// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Pure derivation of dashboard views from a [`Snapshot`].
//!
//! Every function here takes the snapshot by reference and returns fresh
//! values, so deriving one view never affects another and repeated calls
//! over the same snapshot give identical results.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::snapshot::{Snapshot, Ticker};

/// Maximum number of entries in a ranked view.
pub const RANKED_VIEW_LEN: usize = 10;

/// One ticker as served to dashboard clients.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MarketTicker {
    /// Trading pair symbol, e.g. `BTC-USDT`.
    pub symbol: String,
    /// Last traded price in the quote currency.
    pub price: f64,
    /// 24h change as a percentage (`5.0` means +5%).
    pub change_24h: f64,
    /// 24h traded volume in the quote currency.
    pub volume_24h: f64,
}

impl MarketTicker {
    /// Project a normalized ticker into the client shape.
    ///
    /// This is the only place the upstream change fraction is scaled to a
    /// percentage; callers must not scale again.
    fn from_ticker(ticker: &Ticker) -> Self {
        Self {
            symbol: ticker.symbol.clone(),
            price: ticker.last_price,
            change_24h: ticker.change_rate * 100.0,
            volume_24h: ticker.quote_volume,
        }
    }
}

/// Ranking applied to the USDT-quoted slice of the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// Highest 24h quote volume first.
    Trending,
    /// Highest 24h change first.
    TopGainers,
    /// Lowest 24h change first.
    TopLosers,
}

/// Rank the USDT-quoted tickers and keep the top [`RANKED_VIEW_LEN`].
///
/// The sort is stable, so tickers with equal keys keep their snapshot
/// order.
pub fn ranked(snapshot: &Snapshot, kind: ViewKind) -> Vec<MarketTicker> {
    let mut view: Vec<MarketTicker> = snapshot
        .tickers
        .iter()
        .filter(|t| t.symbol.ends_with("-USDT"))
        .map(MarketTicker::from_ticker)
        .collect();

    match kind {
        ViewKind::Trending => view.sort_by(|a, b| b.volume_24h.total_cmp(&a.volume_24h)),
        ViewKind::TopGainers => view.sort_by(|a, b| b.change_24h.total_cmp(&a.change_24h)),
        ViewKind::TopLosers => view.sort_by(|a, b| a.change_24h.total_cmp(&b.change_24h)),
    }

    view.truncate(RANKED_VIEW_LEN);
    view
}

/// Whether a symbol names a spot trading pair.
///
/// Spot pairs are dash-separated; perpetual and futures listings carry a
/// `SWAP` segment or an `M` contract suffix.
pub fn is_spot_symbol(symbol: &str) -> bool {
    symbol.contains('-') && !symbol.contains("SWAP") && !symbol.ends_with('M')
}

/// All spot tickers, optionally restricted to one quote currency.
pub fn spot(snapshot: &Snapshot, quote: Option<&str>) -> Vec<MarketTicker> {
    filtered(snapshot, quote, is_spot_symbol)
}

/// The full normalized listing, optionally restricted to one quote
/// currency.
pub fn currencies(snapshot: &Snapshot, quote: Option<&str>) -> Vec<MarketTicker> {
    filtered(snapshot, quote, |_| true)
}

fn filtered(
    snapshot: &Snapshot,
    quote: Option<&str>,
    keep: impl Fn(&str) -> bool,
) -> Vec<MarketTicker> {
    let suffix = quote.map(|q| format!("-{}", q.to_uppercase()));
    snapshot
        .tickers
        .iter()
        .filter(|t| keep(&t.symbol))
        .filter(|t| match &suffix {
            Some(suffix) => t.symbol.ends_with(suffix),
            None => true,
        })
        .map(MarketTicker::from_ticker)
        .collect()
}

/// Whole-market aggregate computed over every normalized ticker.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MarketStats {
    /// Number of tickers in the snapshot.
    pub symbols: usize,
    /// Tickers with a positive 24h change.
    pub advancers: usize,
    /// Tickers with a negative 24h change.
    pub decliners: usize,
    /// Tickers with exactly zero 24h change.
    pub flat: usize,
    /// Sum of 24h quote volume across the snapshot.
    pub total_quote_volume: f64,
    /// Symbol with the highest 24h quote volume, if any.
    pub top_volume_symbol: Option<String>,
    /// Snapshot timestamp the aggregate was computed from.
    pub as_of: DateTime<Utc>,
}

/// Aggregate the full snapshot into [`MarketStats`].
pub fn stats(snapshot: &Snapshot) -> MarketStats {
    let mut advancers = 0;
    let mut decliners = 0;
    let mut flat = 0;
    let mut total_quote_volume = 0.0;

    for ticker in &snapshot.tickers {
        if ticker.change_rate > 0.0 {
            advancers += 1;
        } else if ticker.change_rate < 0.0 {
            decliners += 1;
        } else {
            flat += 1;
        }
        total_quote_volume += ticker.quote_volume;
    }

    let top_volume_symbol = snapshot
        .tickers
        .iter()
        .max_by(|a, b| a.quote_volume.total_cmp(&b.quote_volume))
        .map(|t| t.symbol.clone());

    MarketStats {
        symbols: snapshot.tickers.len(),
        advancers,
        decliners,
        flat,
        total_quote_volume,
        top_volume_symbol,
        as_of: snapshot.as_of,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(symbol: &str, last: f64, rate: f64, volume: f64) -> Ticker {
        Ticker {
            symbol: symbol.to_string(),
            last_price: last,
            change_rate: rate,
            quote_volume: volume,
        }
    }

    /// Two spot pairs plus one futures contract with the largest volume.
    fn fixture() -> Snapshot {
        Snapshot::new(vec![
            t("BTC-USDT", 100.0, 0.05, 1000.0),
            t("ETH-USDT", 50.0, -0.10, 2000.0),
            t("BTC-USDTM", 1.0, 0.0, 99999.0),
        ])
    }

    #[test]
    fn trending_orders_by_quote_volume() {
        let view = ranked(&fixture(), ViewKind::Trending);
        let symbols: Vec<&str> = view.iter().map(|t| t.symbol.as_str()).collect();
        // The futures contract has the largest volume but is not USDT-quoted
        assert_eq!(symbols, vec!["ETH-USDT", "BTC-USDT"]);
    }

    #[test]
    fn gainers_lead_with_highest_change() {
        let view = ranked(&fixture(), ViewKind::TopGainers);
        assert_eq!(view[0].symbol, "BTC-USDT");
        assert_eq!(view[0].change_24h, 5.0);
        assert_eq!(view[0].price, 100.0);
        assert_eq!(view[1].symbol, "ETH-USDT");
        assert_eq!(view[1].change_24h, -10.0);
    }

    #[test]
    fn losers_lead_with_lowest_change() {
        let view = ranked(&fixture(), ViewKind::TopLosers);
        let symbols: Vec<&str> = view.iter().map(|t| t.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["ETH-USDT", "BTC-USDT"]);
    }

    #[test]
    fn ranked_views_cap_at_ten() {
        let tickers = (0..12)
            .map(|i| t(&format!("C{i}-USDT"), 1.0, 0.01, f64::from(i)))
            .collect();
        let view = ranked(&Snapshot::new(tickers), ViewKind::Trending);
        assert_eq!(view.len(), RANKED_VIEW_LEN);
    }

    #[test]
    fn equal_changes_keep_snapshot_order() {
        let snapshot = Snapshot::new(vec![
            t("AAA-USDT", 1.0, 0.01, 10.0),
            t("BBB-USDT", 1.0, 0.01, 20.0),
            t("CCC-USDT", 1.0, 0.01, 30.0),
        ]);
        let view = ranked(&snapshot, ViewKind::TopGainers);
        let symbols: Vec<&str> = view.iter().map(|t| t.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAA-USDT", "BBB-USDT", "CCC-USDT"]);
    }

    #[test]
    fn deriving_twice_gives_identical_views() {
        let snapshot = fixture();
        assert_eq!(
            ranked(&snapshot, ViewKind::Trending),
            ranked(&snapshot, ViewKind::Trending)
        );
        assert_eq!(spot(&snapshot, None), spot(&snapshot, None));
    }

    #[test]
    fn ranked_view_of_empty_snapshot_is_empty() {
        let snapshot = Snapshot::new(Vec::new());
        assert!(ranked(&snapshot, ViewKind::Trending).is_empty());
        assert!(ranked(&snapshot, ViewKind::TopGainers).is_empty());
    }

    #[test]
    fn spot_rule_excludes_derivative_listings() {
        assert!(is_spot_symbol("BTC-USDT"));
        assert!(is_spot_symbol("ETH-BTC"));
        assert!(!is_spot_symbol("BTC-USDT-SWAP"));
        assert!(!is_spot_symbol("BTC-USDTM"));
        assert!(!is_spot_symbol("XBTUSDTM"));
    }

    #[test]
    fn spot_view_applies_quote_filter_case_insensitively() {
        let snapshot = Snapshot::new(vec![
            t("BTC-USDT", 100.0, 0.05, 1000.0),
            t("ETH-BTC", 0.05, 0.01, 500.0),
            t("ETH-USDT", 50.0, -0.10, 2000.0),
            t("BTC-USDTM", 1.0, 0.0, 99999.0),
        ]);

        let view = spot(&snapshot, None);
        let all_spot: Vec<&str> = view.iter().map(|t| t.symbol.as_str()).collect();
        assert_eq!(all_spot, vec!["BTC-USDT", "ETH-BTC", "ETH-USDT"]);

        let btc_quoted = spot(&snapshot, Some("btc"));
        assert_eq!(btc_quoted.len(), 1);
        assert_eq!(btc_quoted[0].symbol, "ETH-BTC");
    }

    #[test]
    fn currency_listing_keeps_non_spot_symbols() {
        let listing = currencies(&fixture(), None);
        assert_eq!(listing.len(), 3);

        let view = currencies(&fixture(), Some("USDT"));
        let usdt_only: Vec<&str> = view.iter().map(|t| t.symbol.as_str()).collect();
        assert_eq!(usdt_only, vec!["BTC-USDT", "ETH-USDT"]);
    }

    #[test]
    fn stats_aggregate_the_whole_snapshot() {
        let summary = stats(&fixture());
        assert_eq!(summary.symbols, 3);
        assert_eq!(summary.advancers, 1);
        assert_eq!(summary.decliners, 1);
        assert_eq!(summary.flat, 1);
        assert_eq!(summary.total_quote_volume, 102_999.0);
        assert_eq!(summary.top_volume_symbol.as_deref(), Some("BTC-USDTM"));
    }

    #[test]
    fn stats_on_empty_snapshot_are_zero() {
        let summary = stats(&Snapshot::new(Vec::new()));
        assert_eq!(summary.symbols, 0);
        assert_eq!(summary.advancers, 0);
        assert!(summary.top_volume_symbol.is_none());
    }
}
