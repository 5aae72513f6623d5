// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Account credentials and session tokens for the dashboard API.
//!
//! ## Auth Flow
//!
//! 1. A user registers and proves control of their email with a one-time
//!    code (`tokens` generates the code and its at-rest digest)
//! 2. Successful OTP verification or login issues an HS256 session token
//!    ([`SessionAuthority`]), valid for 7 days
//! 3. Subsequent requests carry `Authorization: Bearer <token>`; the
//!    [`Auth`] extractor validates it per request (no process-wide default
//!    header, no ambient credentials)
//! 4. Validation is stateless: signature and expiry only, no revocation
//!    list; a logged-out token simply ages out
//!
//! ## Security
//!
//! - Passwords are hashed with Argon2id (`password`), never stored in clear
//! - One-time codes and reset tokens are stored as keyed HMAC-SHA256
//!   digests (`tokens`)
//! - Session expiry is exact: no clock-skew leeway on validation
//! - Wrong-code, expired-code, unknown-email and unverified-account
//!   failures collapse to single error kinds (anti-enumeration policy)

pub mod error;
pub mod extractor;
pub mod password;
pub mod session;
pub mod tokens;

pub use error::AuthError;
pub use extractor::Auth;
pub use session::{AuthenticatedIdentity, SessionAuthority};
