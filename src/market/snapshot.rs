// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Normalization of raw upstream tickers into a clean [`Snapshot`].
//!
//! The exchange reports numeric fields as JSON strings (occasionally as
//! numbers). Normalization accepts both, requires finite values, and drops
//! any ticker with a missing symbol or unparseable field rather than
//! failing the whole snapshot.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// One ticker exactly as the upstream reports it.
///
/// Field names follow the exchange's wire format; everything is optional
/// because upstream rows are not trusted to be complete.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTicker {
    pub symbol: Option<String>,
    /// Last traded price.
    pub last: Option<Value>,
    /// 24h change as a fraction (e.g. `"0.05"` for +5%).
    #[serde(rename = "changeRate")]
    pub change_rate: Option<Value>,
    /// 24h traded volume denominated in the quote currency.
    #[serde(rename = "volValue")]
    pub quote_volume: Option<Value>,
}

impl RawTicker {
    /// Convert to a clean [`Ticker`], or `None` if any field is missing,
    /// unparseable, or non-finite.
    pub fn normalize(self) -> Option<Ticker> {
        let symbol = self.symbol.filter(|s| !s.is_empty())?;
        let last_price = numeric(self.last.as_ref()?)?;
        let change_rate = numeric(self.change_rate.as_ref()?)?;
        let quote_volume = numeric(self.quote_volume.as_ref()?)?;
        Some(Ticker {
            symbol,
            last_price,
            change_rate,
            quote_volume,
        })
    }
}

/// Parse a JSON string or number into a finite f64.
fn numeric(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Number(n) => n.as_f64()?,
        _ => return None,
    };
    parsed.is_finite().then_some(parsed)
}

/// One normalized ticker. All numeric fields are finite.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticker {
    pub symbol: String,
    pub last_price: f64,
    /// 24h change as a fraction, not a percentage.
    pub change_rate: f64,
    pub quote_volume: f64,
}

/// A full-market snapshot at one instant.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub as_of: DateTime<Utc>,
    pub tickers: Vec<Ticker>,
}

impl Snapshot {
    pub fn new(tickers: Vec<Ticker>) -> Self {
        Self {
            as_of: Utc::now(),
            tickers,
        }
    }

    /// Normalize a batch of raw upstream tickers, dropping malformed rows.
    pub fn from_raw(raw: Vec<RawTicker>) -> Self {
        let tickers = raw.into_iter().filter_map(RawTicker::normalize).collect();
        Self::new(tickers)
    }
}
