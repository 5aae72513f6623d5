// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::SessionAuthority;
use crate::config::AppConfig;
use crate::market::MarketFeed;
use crate::providers::Notifier;
use crate::storage::IdentityStore;

/// Shared application state handed to every handler.
///
/// Everything is behind an `Arc`; cloning the state is cheap and the redb
/// store takes care of its own locking.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<IdentityStore>,
    pub sessions: Arc<SessionAuthority>,
    pub market: Arc<dyn MarketFeed>,
    pub notifier: Arc<dyn Notifier>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        store: Arc<IdentityStore>,
        sessions: Arc<SessionAuthority>,
        market: Arc<dyn MarketFeed>,
        notifier: Arc<dyn Notifier>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            store,
            sessions,
            market,
            notifier,
            config,
        }
    }
}
