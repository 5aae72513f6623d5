// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for handler-level tests: scripted market feeds, a
//! recording notifier, and an [`AppState`] wired to a temp-dir store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;
use url::Url;

use crate::auth::SessionAuthority;
use crate::config::AppConfig;
use crate::market::{MarketError, MarketFeed, Snapshot, Ticker};
use crate::providers::{Notifier, NotifierError};
use crate::state::AppState;
use crate::storage::IdentityStore;

/// Session signing secret used by every test state.
pub(crate) const TEST_SECRET: &str = "test-secret";

/// What a [`StubFeed`] should answer.
pub(crate) enum FeedScript {
    Ok(Vec<Ticker>),
    Unavailable,
    Invalid,
}

/// Market feed that plays back a script instead of hitting the network.
pub(crate) struct StubFeed(pub(crate) FeedScript);

#[async_trait]
impl MarketFeed for StubFeed {
    async fn all_tickers(&self) -> Result<Snapshot, MarketError> {
        match &self.0 {
            FeedScript::Ok(tickers) => Ok(Snapshot::new(tickers.clone())),
            FeedScript::Unavailable => {
                Err(MarketError::Unavailable("stub feed offline".to_string()))
            }
            FeedScript::Invalid => {
                Err(MarketError::DataInvalid("stub feed payload".to_string()))
            }
        }
    }
}

/// Notifier that records what would have been sent.
///
/// Tests read the captured one-time codes and reset links back out to
/// drive the verification and reset flows end to end.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    pub(crate) sent_codes: Mutex<Vec<(String, String)>>,
    pub(crate) sent_reset_links: Mutex<Vec<(String, String)>>,
    pub(crate) fail: AtomicBool,
}

impl RecordingNotifier {
    /// A notifier whose every send fails.
    pub(crate) fn failing() -> Self {
        let notifier = Self::default();
        notifier.fail.store(true, Ordering::SeqCst);
        notifier
    }

    /// Most recently captured verification code, if any.
    pub(crate) fn last_code(&self) -> Option<String> {
        self.sent_codes
            .lock()
            .unwrap()
            .last()
            .map(|(_, code)| code.clone())
    }

    /// Most recently captured reset link, if any.
    pub(crate) fn last_reset_link(&self) -> Option<String> {
        self.sent_reset_links
            .lock()
            .unwrap()
            .last()
            .map(|(_, link)| link.clone())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_otp(&self, email: &str, _name: &str, code: &str) -> Result<(), NotifierError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifierError::Delivery("stub relay down".to_string()));
        }
        self.sent_codes
            .lock()
            .unwrap()
            .push((email.to_string(), code.to_string()));
        Ok(())
    }

    async fn send_password_reset(
        &self,
        email: &str,
        _name: &str,
        link: &Url,
    ) -> Result<(), NotifierError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifierError::Delivery("stub relay down".to_string()));
        }
        self.sent_reset_links
            .lock()
            .unwrap()
            .push((email.to_string(), link.to_string()));
        Ok(())
    }
}

/// Default state: empty market feed, recording notifier, temp-dir store.
///
/// The returned [`TempDir`] must be kept alive for the store's lifetime.
pub(crate) fn test_state() -> (AppState, TempDir) {
    test_state_with(
        Arc::new(StubFeed(FeedScript::Ok(Vec::new()))),
        Arc::new(RecordingNotifier::default()),
    )
}

/// State with a chosen feed and notifier.
pub(crate) fn test_state_with(
    market: Arc<dyn MarketFeed>,
    notifier: Arc<dyn Notifier>,
) -> (AppState, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        data_dir: dir.path().to_path_buf(),
        jwt_secret: TEST_SECRET.to_string(),
        client_url: "http://localhost:5173".to_string(),
        market_api_base_url: "http://localhost:9".to_string(),
    };
    let store = Arc::new(IdentityStore::open(&config.identity_db_path()).unwrap());
    let sessions = Arc::new(SessionAuthority::new(TEST_SECRET));
    let state = AppState::new(store, sessions, market, notifier, Arc::new(config));
    (state, dir)
}
