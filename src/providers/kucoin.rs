// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! KuCoin REST client for full-market ticker snapshots.
//!
//! One endpoint is used: `GET /api/v1/market/allTickers`, which returns
//! every listed symbol in a single response wrapped in the exchange
//! envelope `{"code": "200000", "data": {"time": ..., "ticker": [...]}}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::market::{MarketError, MarketFeed, RawTicker, Snapshot};

const ALL_TICKERS_PATH: &str = "/api/v1/market/allTickers";

/// Envelope code the exchange uses for success.
const OK_CODE: &str = "200000";

/// REST client for the exchange's public market endpoints.
///
/// No credentials are needed; the ticker endpoint is public.
#[derive(Debug, Clone)]
pub struct KuCoinClient {
    base_url: String,
    http: Client,
}

impl KuCoinClient {
    pub fn new(base_url: &str) -> Result<Self, MarketError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| MarketError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[async_trait]
impl MarketFeed for KuCoinClient {
    async fn all_tickers(&self) -> Result<Snapshot, MarketError> {
        let url = format!("{}{ALL_TICKERS_PATH}", self.base_url);
        let response = self.http.get(&url).send().await.map_err(|e| {
            MarketError::Unavailable(format!("GET {ALL_TICKERS_PATH} failed: {e}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MarketError::Unavailable(format!(
                "GET {ALL_TICKERS_PATH} returned {status}: {body}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| MarketError::DataInvalid(format!("invalid JSON body: {e}")))?;

        let raw = parse_all_tickers(&body)?;
        let total = raw.len();
        let snapshot = Snapshot::from_raw(raw);
        tracing::debug!(
            total,
            kept = snapshot.tickers.len(),
            "normalized market snapshot"
        );
        Ok(snapshot)
    }
}

/// Pull the ticker rows out of the exchange envelope.
///
/// A failure code or a payload without a `data.ticker` list fails the whole
/// fetch; individual rows that are not objects are dropped, matching how
/// normalization drops rows with bad fields.
fn parse_all_tickers(body: &Value) -> Result<Vec<RawTicker>, MarketError> {
    if let Some(code) = body.get("code").and_then(Value::as_str) {
        if code != OK_CODE {
            return Err(MarketError::Unavailable(format!(
                "exchange returned code {code}"
            )));
        }
    }

    let rows = body
        .pointer("/data/ticker")
        .and_then(Value::as_array)
        .ok_or_else(|| MarketError::DataInvalid("missing data.ticker list".to_string()))?;

    Ok(rows
        .iter()
        .filter_map(|row| serde_json::from_value::<RawTicker>(row.clone()).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_extracts_ticker_rows() {
        let body = json!({
            "code": "200000",
            "data": {
                "time": 1700000000000u64,
                "ticker": [
                    {"symbol": "BTC-USDT", "last": "100", "changeRate": "0.05", "volValue": "1000"},
                    {"symbol": "ETH-USDT", "last": "50", "changeRate": "-0.10", "volValue": "2000"}
                ]
            }
        });

        let rows = parse_all_tickers(&body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].symbol.as_deref(), Some("BTC-USDT"));
    }

    #[test]
    fn parse_rejects_missing_ticker_list() {
        let body = json!({"code": "200000", "data": {"time": 0}});
        let err = parse_all_tickers(&body).unwrap_err();
        assert!(matches!(err, MarketError::DataInvalid(_)));
    }

    #[test]
    fn parse_rejects_non_list_ticker_field() {
        let body = json!({"code": "200000", "data": {"ticker": "nope"}});
        let err = parse_all_tickers(&body).unwrap_err();
        assert!(matches!(err, MarketError::DataInvalid(_)));
    }

    #[test]
    fn parse_rejects_exchange_failure_code() {
        let body = json!({"code": "400100", "msg": "rate limited"});
        let err = parse_all_tickers(&body).unwrap_err();
        assert!(matches!(err, MarketError::Unavailable(_)));
    }

    #[test]
    fn parse_drops_rows_that_are_not_objects() {
        let body = json!({
            "code": "200000",
            "data": {
                "ticker": [
                    {"symbol": "BTC-USDT", "last": "100", "changeRate": "0.05", "volValue": "1000"},
                    "junk",
                    42
                ]
            }
        });

        let rows = parse_all_tickers(&body).unwrap();
        assert_eq!(rows.len(), 1);
    }
}
