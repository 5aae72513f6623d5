// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! One-time codes, reset tokens, and the email uniqueness key.
//!
//! Verification codes and reset tokens are secrets delivered by email. At
//! rest they are stored as keyed HMAC-SHA256 digests so a leaked database
//! does not hand out live credentials; verification recomputes the digest
//! over the presented value and compares.

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use unicode_normalization::UnicodeNormalization;

type HmacSha256 = Hmac<Sha256>;

/// Generate a 6-digit one-time verification code.
///
/// Uniform over 100000..=999999, so the code always renders as six digits.
/// Each code is drawn independently of any prior one.
pub fn generate_otp() -> String {
    let n = uuid::Uuid::new_v4().as_u128() % 900_000;
    format!("{}", 100_000 + n)
}

/// Generate an opaque password-reset token (64 hex characters).
///
/// Two v4 UUIDs concatenated: ~244 bits of entropy, unguessable within the
/// one-hour validity window by a large margin.
pub fn generate_reset_token() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

/// Keyed digest of a code or token for at-rest storage and lookup.
pub fn digest(secret: &str, value: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(value.as_bytes());
    Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes())
}

/// Normalize an email address into the case-insensitive uniqueness key.
///
/// NFKC folds visually-equivalent Unicode forms, then lowercase. Two
/// addresses with the same key are the same account.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().nfkc().collect::<String>().to_lowercase()
}
