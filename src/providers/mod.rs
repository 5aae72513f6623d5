// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # External Providers
//!
//! Outbound integrations, each behind a small trait or client type:
//!
//! - [`kucoin`] - exchange REST client implementing
//!   [`crate::market::MarketFeed`]
//! - [`mailer`] - outbound email behind the [`Notifier`] trait, with an
//!   HTTP relay client for production and a log-only fallback for
//!   development

pub mod kucoin;
pub mod mailer;

pub use kucoin::KuCoinClient;
pub use mailer::{LogNotifier, MailRelayClient, Notifier, NotifierError};
