// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Markets - Crypto Market Dashboard Backend
//!
//! This crate provides the backend for a cryptocurrency market dashboard:
//! OTP-gated account registration, signed bearer sessions, live market
//! views derived from an upstream exchange feed, and per-account favorite
//! symbols.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Session tokens, credential hashing, one-time codes
//! - `market` - Snapshot model and per-request view derivation
//! - `providers` - Upstream exchange feed and mail delivery clients
//! - `storage` - Durable identity records (redb)

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod market;
pub mod models;
pub mod providers;
pub mod state;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_support;
