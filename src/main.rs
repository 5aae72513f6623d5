// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use relational_market_server::api::router;
use relational_market_server::auth::SessionAuthority;
use relational_market_server::config::AppConfig;
use relational_market_server::market::MarketFeed;
use relational_market_server::providers::{KuCoinClient, LogNotifier, MailRelayClient, Notifier};
use relational_market_server::state::AppState;
use relational_market_server::storage::IdentityStore;

/// Initialize logging. `LOG_FORMAT=json` switches to line-delimited JSON
/// for log shippers; anything else gets the human-readable form.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
        _ => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .pretty()
            .init(),
    }
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %error, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, draining connections");
}

#[tokio::main]
async fn main() {
    init_tracing();

    let config = Arc::new(AppConfig::from_env().expect("Failed to load configuration"));

    let store = Arc::new(
        IdentityStore::open(&config.identity_db_path()).expect("Failed to open identity database"),
    );
    tracing::info!(path = %config.identity_db_path().display(), "Identity database ready");

    let sessions = Arc::new(SessionAuthority::new(&config.jwt_secret));

    let market: Arc<dyn MarketFeed> = Arc::new(
        KuCoinClient::new(&config.market_api_base_url).expect("Failed to build market feed client"),
    );

    let notifier: Arc<dyn Notifier> = if MailRelayClient::is_configured() {
        Arc::new(MailRelayClient::from_env().expect("Failed to configure mail relay"))
    } else {
        tracing::warn!("Mail relay not configured, verification codes and reset links go to the log");
        Arc::new(LogNotifier)
    };

    let state = AppState::new(store, sessions, market, notifier, config.clone());
    let app = router(state);

    let listener = TcpListener::bind(config.bind_addr())
        .await
        .expect("Failed to bind listener");

    tracing::info!(
        addr = %config.bind_addr(),
        "Relational Markets server listening (docs at /docs)"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server failed");
}
