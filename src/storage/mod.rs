// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Identity Storage Module
//!
//! Persistent credential store backed by **redb** (pure Rust, ACID). One
//! embedded database file under `DATA_DIR` holds every registered identity
//! plus the two lookup indexes the auth flows need.
//!
//! ## Table Layout
//!
//! ```text
//! identities.redb
//!   identities:  identity_id → serialized StoredIdentity (JSON bytes)
//!   email_index: normalized email key → identity_id
//!   reset_index: reset token digest → identity_id
//! ```
//!
//! ## Consistency Model
//!
//! - Registration is an atomic check-and-insert against `email_index`
//!   inside one write transaction; concurrent registrations for the same
//!   email have at most one winner
//! - One-time code and reset-token consumption are check-then-clear inside
//!   one write transaction (single-use discipline; two concurrent attempts
//!   cannot both succeed)
//! - Password hashes and code/token digests never leave this layer in API
//!   responses; handlers project identities through `IdentityResponse`

pub mod identities;

pub use identities::{IdentityStore, IdentityStoreError, IdentityStoreResult, StoredIdentity};
