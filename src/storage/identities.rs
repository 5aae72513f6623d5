// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded identity store backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `identities`: identity_id → serialized StoredIdentity
//! - `email_index`: normalized email key → identity_id
//! - `reset_index`: reset token digest → identity_id
//!
//! Every mutating operation runs inside a single write transaction, so
//! check-and-insert (registration) and check-then-clear (code and reset
//! token consumption) are atomic. An early error return drops the
//! transaction without committing, which aborts it.

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: identity_id → serialized StoredIdentity (JSON bytes).
const IDENTITIES: TableDefinition<&str, &[u8]> = TableDefinition::new("identities");

/// Index: normalized (NFKC + lowercase) email key → identity_id.
const EMAIL_INDEX: TableDefinition<&str, &str> = TableDefinition::new("email_index");

/// Index: HMAC digest of an outstanding reset token → identity_id.
const RESET_INDEX: TableDefinition<&str, &str> = TableDefinition::new("reset_index");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum IdentityStoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("an account with this email already exists")]
    DuplicateEmail,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("verification code is invalid or has expired")]
    CodeInvalidOrExpired,

    #[error("reset token is invalid or has expired")]
    ResetTokenInvalidOrExpired,
}

pub type IdentityStoreResult<T> = Result<T, IdentityStoreError>;

// =============================================================================
// StoredIdentity
// =============================================================================

/// Persistent record for one registered identity.
///
/// Carries the Argon2 password hash and the HMAC digests of any outstanding
/// verification code or reset token. Plaintext codes and tokens are never
/// stored; handlers digest user input before comparing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredIdentity {
    pub id: String,
    pub name: String,
    /// Email as entered at registration (display form).
    pub email: String,
    /// Normalized email used for uniqueness and lookups.
    pub email_key: String,
    pub password_hash: String,
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_code_digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_token_digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_expires_at: Option<DateTime<Utc>>,
    /// Favorited market symbols, in insertion order.
    #[serde(default)]
    pub favorites: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredIdentity {
    /// Build a fresh unverified identity with an outstanding one-time code.
    pub fn new_pending(
        name: impl Into<String>,
        email: impl Into<String>,
        email_key: impl Into<String>,
        password_hash: impl Into<String>,
        code_digest: impl Into<String>,
        code_expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            email: email.into(),
            email_key: email_key.into(),
            password_hash: password_hash.into(),
            verified: false,
            verification_code_digest: Some(code_digest.into()),
            verification_expires_at: Some(code_expires_at),
            reset_token_digest: None,
            reset_expires_at: None,
            favorites: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// IdentityStore
// =============================================================================

/// Embedded ACID identity database.
pub struct IdentityStore {
    db: Database,
}

impl IdentityStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> IdentityStoreResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(IDENTITIES)?;
            let _ = write_txn.open_table(EMAIL_INDEX)?;
            let _ = write_txn.open_table(RESET_INDEX)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Readiness probe: verify the database answers a read transaction.
    pub fn check(&self) -> IdentityStoreResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(IDENTITIES)?;
        Ok(())
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Insert a new identity, claiming its email key.
    ///
    /// The uniqueness check and the insert happen in one write transaction,
    /// so two concurrent registrations for the same email have at most one
    /// winner; the loser gets [`IdentityStoreError::DuplicateEmail`].
    pub fn create(&self, identity: &StoredIdentity) -> IdentityStoreResult<()> {
        let json = serde_json::to_vec(identity)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut email_table = write_txn.open_table(EMAIL_INDEX)?;
            let taken = email_table.get(identity.email_key.as_str())?.is_some();
            if taken {
                return Err(IdentityStoreError::DuplicateEmail);
            }
            email_table.insert(identity.email_key.as_str(), identity.id.as_str())?;

            let mut id_table = write_txn.open_table(IDENTITIES)?;
            id_table.insert(identity.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Look up a single identity by id.
    pub fn get(&self, id: &str) -> IdentityStoreResult<Option<StoredIdentity>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(IDENTITIES)?;
        match table.get(id)? {
            Some(value) => {
                let identity: StoredIdentity = serde_json::from_slice(value.value())?;
                Ok(Some(identity))
            }
            None => Ok(None),
        }
    }

    /// Look up a single identity by normalized email key.
    pub fn find_by_email(&self, email_key: &str) -> IdentityStoreResult<Option<StoredIdentity>> {
        let read_txn = self.db.begin_read()?;
        let email_table = read_txn.open_table(EMAIL_INDEX)?;
        let id = match email_table.get(email_key)? {
            Some(value) => value.value().to_string(),
            None => return Ok(None),
        };
        let id_table = read_txn.open_table(IDENTITIES)?;
        match id_table.get(id.as_str())? {
            Some(value) => {
                let identity: StoredIdentity = serde_json::from_slice(value.value())?;
                Ok(Some(identity))
            }
            None => Ok(None),
        }
    }

    // =========================================================================
    // Email Verification
    // =========================================================================

    /// Consume a one-time verification code and mark the identity verified.
    ///
    /// `code_digest` is the HMAC digest of the code the caller supplied.
    /// Succeeds only when the identity exists, still carries an outstanding
    /// code, the digests match, and the code has not expired. On success the
    /// code fields are cleared in the same transaction, which makes the code
    /// single-use. Every failure collapses to
    /// [`IdentityStoreError::CodeInvalidOrExpired`] so callers leak nothing
    /// about which emails are registered.
    pub fn verify_code(
        &self,
        email_key: &str,
        code_digest: &str,
        now: DateTime<Utc>,
    ) -> IdentityStoreResult<StoredIdentity> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let email_table = write_txn.open_table(EMAIL_INDEX)?;
            let id = email_table.get(email_key)?.map(|v| v.value().to_string());
            let Some(id) = id else {
                return Err(IdentityStoreError::CodeInvalidOrExpired);
            };

            let mut id_table = write_txn.open_table(IDENTITIES)?;
            let raw = id_table.get(id.as_str())?.map(|v| v.value().to_vec());
            let Some(raw) = raw else {
                return Err(IdentityStoreError::CodeInvalidOrExpired);
            };
            let mut identity: StoredIdentity = serde_json::from_slice(&raw)?;

            let (Some(stored_digest), Some(expires_at)) = (
                identity.verification_code_digest.as_deref(),
                identity.verification_expires_at,
            ) else {
                return Err(IdentityStoreError::CodeInvalidOrExpired);
            };
            if stored_digest != code_digest || now >= expires_at {
                return Err(IdentityStoreError::CodeInvalidOrExpired);
            }

            identity.verified = true;
            identity.verification_code_digest = None;
            identity.verification_expires_at = None;
            identity.updated_at = now;

            let json = serde_json::to_vec(&identity)?;
            id_table.insert(id.as_str(), json.as_slice())?;
            identity
        };
        write_txn.commit()?;
        Ok(updated)
    }

    // =========================================================================
    // Password Reset
    // =========================================================================

    /// Attach a reset token digest to the identity behind `email_key`.
    ///
    /// Returns `Ok(None)` when no identity has that email, leaving the store
    /// untouched; callers respond identically either way. Issuing a new token
    /// drops any previous one, including its `reset_index` entry, so only the
    /// most recent token can be redeemed.
    pub fn begin_reset(
        &self,
        email_key: &str,
        token_digest: &str,
        expires_at: DateTime<Utc>,
    ) -> IdentityStoreResult<Option<StoredIdentity>> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let email_table = write_txn.open_table(EMAIL_INDEX)?;
            let id = email_table.get(email_key)?.map(|v| v.value().to_string());
            let Some(id) = id else {
                return Ok(None);
            };

            let mut id_table = write_txn.open_table(IDENTITIES)?;
            let raw = id_table.get(id.as_str())?.map(|v| v.value().to_vec());
            let Some(raw) = raw else {
                return Ok(None);
            };
            let mut identity: StoredIdentity = serde_json::from_slice(&raw)?;

            let mut reset_table = write_txn.open_table(RESET_INDEX)?;
            if let Some(previous) = identity.reset_token_digest.as_deref() {
                reset_table.remove(previous)?;
            }

            identity.reset_token_digest = Some(token_digest.to_string());
            identity.reset_expires_at = Some(expires_at);
            identity.updated_at = Utc::now();

            let json = serde_json::to_vec(&identity)?;
            id_table.insert(id.as_str(), json.as_slice())?;
            reset_table.insert(token_digest, id.as_str())?;
            identity
        };
        write_txn.commit()?;
        Ok(Some(updated))
    }

    /// Redeem a reset token and replace the password hash.
    ///
    /// `token_digest` is the HMAC digest of the token the caller supplied.
    /// Succeeds only when the digest is indexed, still matches the identity's
    /// outstanding token, and has not expired. The token fields and index
    /// entry are cleared in the same transaction, which makes the token
    /// single-use.
    pub fn consume_reset(
        &self,
        token_digest: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> IdentityStoreResult<StoredIdentity> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut reset_table = write_txn.open_table(RESET_INDEX)?;
            let id = reset_table.get(token_digest)?.map(|v| v.value().to_string());
            let Some(id) = id else {
                return Err(IdentityStoreError::ResetTokenInvalidOrExpired);
            };

            let mut id_table = write_txn.open_table(IDENTITIES)?;
            let raw = id_table.get(id.as_str())?.map(|v| v.value().to_vec());
            let Some(raw) = raw else {
                return Err(IdentityStoreError::ResetTokenInvalidOrExpired);
            };
            let mut identity: StoredIdentity = serde_json::from_slice(&raw)?;

            let (Some(stored_digest), Some(expires_at)) = (
                identity.reset_token_digest.as_deref(),
                identity.reset_expires_at,
            ) else {
                return Err(IdentityStoreError::ResetTokenInvalidOrExpired);
            };
            if stored_digest != token_digest || now >= expires_at {
                return Err(IdentityStoreError::ResetTokenInvalidOrExpired);
            }

            identity.password_hash = new_password_hash.to_string();
            identity.reset_token_digest = None;
            identity.reset_expires_at = None;
            identity.updated_at = now;

            let json = serde_json::to_vec(&identity)?;
            id_table.insert(id.as_str(), json.as_slice())?;
            reset_table.remove(token_digest)?;
            identity
        };
        write_txn.commit()?;
        Ok(updated)
    }

    // =========================================================================
    // Favorites
    // =========================================================================

    /// Add a symbol to the identity's favorites. Idempotent.
    ///
    /// Returns the updated list.
    pub fn add_favorite(&self, id: &str, symbol: &str) -> IdentityStoreResult<Vec<String>> {
        self.update_favorites(id, |favorites| {
            if !favorites.iter().any(|s| s == symbol) {
                favorites.push(symbol.to_string());
                true
            } else {
                false
            }
        })
    }

    /// Remove a symbol from the identity's favorites. Removing a symbol that
    /// is not present is a no-op.
    ///
    /// Returns the updated list.
    pub fn remove_favorite(&self, id: &str, symbol: &str) -> IdentityStoreResult<Vec<String>> {
        self.update_favorites(id, |favorites| {
            let before = favorites.len();
            favorites.retain(|s| s != symbol);
            favorites.len() != before
        })
    }

    /// Current favorites list for an identity.
    pub fn favorites(&self, id: &str) -> IdentityStoreResult<Vec<String>> {
        match self.get(id)? {
            Some(identity) => Ok(identity.favorites),
            None => Err(IdentityStoreError::NotFound(id.to_string())),
        }
    }

    /// Apply `mutate` to the favorites list; persist only when it reports a
    /// change.
    fn update_favorites(
        &self,
        id: &str,
        mutate: impl FnOnce(&mut Vec<String>) -> bool,
    ) -> IdentityStoreResult<Vec<String>> {
        let write_txn = self.db.begin_write()?;
        let favorites = {
            let mut id_table = write_txn.open_table(IDENTITIES)?;
            let raw = id_table.get(id)?.map(|v| v.value().to_vec());
            let Some(raw) = raw else {
                return Err(IdentityStoreError::NotFound(id.to_string()));
            };
            let mut identity: StoredIdentity = serde_json::from_slice(&raw)?;

            if mutate(&mut identity.favorites) {
                identity.updated_at = Utc::now();
                let json = serde_json::to_vec(&identity)?;
                id_table.insert(id, json.as_slice())?;
            }
            identity.favorites
        };
        write_txn.commit()?;
        Ok(favorites)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn temp_store() -> (IdentityStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = IdentityStore::open(&dir.path().join("test.redb")).unwrap();
        (store, dir)
    }

    fn pending(email: &str) -> StoredIdentity {
        StoredIdentity::new_pending(
            "Ada",
            email,
            email,
            "argon2-hash",
            "code-digest-1",
            Utc::now() + Duration::minutes(30),
        )
    }

    #[test]
    fn create_and_get_roundtrip() {
        let (store, _dir) = temp_store();
        let identity = pending("ada@example.com");
        store.create(&identity).unwrap();

        let loaded = store.get(&identity.id).unwrap().unwrap();
        assert_eq!(loaded.id, identity.id);
        assert_eq!(loaded.email, "ada@example.com");
        assert!(!loaded.verified);
        assert!(loaded.favorites.is_empty());
    }

    #[test]
    fn create_rejects_duplicate_email() {
        let (store, _dir) = temp_store();
        let first = pending("ada@example.com");
        store.create(&first).unwrap();

        let mut second = pending("ada@example.com");
        second.name = "Impostor".to_string();
        let err = store.create(&second).unwrap_err();
        assert!(matches!(err, IdentityStoreError::DuplicateEmail));

        // First registration is untouched
        let kept = store.find_by_email("ada@example.com").unwrap().unwrap();
        assert_eq!(kept.id, first.id);
        assert_eq!(kept.name, "Ada");
    }

    #[test]
    fn find_by_email_misses_unknown() {
        let (store, _dir) = temp_store();
        assert!(store.find_by_email("ghost@example.com").unwrap().is_none());
    }

    #[test]
    fn verify_code_marks_verified_and_clears_code() {
        let (store, _dir) = temp_store();
        let identity = pending("ada@example.com");
        store.create(&identity).unwrap();

        let updated = store
            .verify_code("ada@example.com", "code-digest-1", Utc::now())
            .unwrap();
        assert!(updated.verified);
        assert!(updated.verification_code_digest.is_none());
        assert!(updated.verification_expires_at.is_none());

        let loaded = store.get(&identity.id).unwrap().unwrap();
        assert!(loaded.verified);
    }

    #[test]
    fn verify_code_is_single_use() {
        let (store, _dir) = temp_store();
        store.create(&pending("ada@example.com")).unwrap();
        store
            .verify_code("ada@example.com", "code-digest-1", Utc::now())
            .unwrap();

        let err = store
            .verify_code("ada@example.com", "code-digest-1", Utc::now())
            .unwrap_err();
        assert!(matches!(err, IdentityStoreError::CodeInvalidOrExpired));
    }

    #[test]
    fn verify_code_rejects_wrong_digest() {
        let (store, _dir) = temp_store();
        let identity = pending("ada@example.com");
        store.create(&identity).unwrap();

        let err = store
            .verify_code("ada@example.com", "some-other-digest", Utc::now())
            .unwrap_err();
        assert!(matches!(err, IdentityStoreError::CodeInvalidOrExpired));

        // Failed attempt leaves the code outstanding
        let loaded = store.get(&identity.id).unwrap().unwrap();
        assert!(!loaded.verified);
        assert!(loaded.verification_code_digest.is_some());
    }

    #[test]
    fn verify_code_rejects_expired_code() {
        let (store, _dir) = temp_store();
        let mut identity = pending("ada@example.com");
        identity.verification_expires_at = Some(Utc::now() - Duration::seconds(1));
        store.create(&identity).unwrap();

        let err = store
            .verify_code("ada@example.com", "code-digest-1", Utc::now())
            .unwrap_err();
        assert!(matches!(err, IdentityStoreError::CodeInvalidOrExpired));
    }

    #[test]
    fn verify_code_rejects_unknown_email() {
        let (store, _dir) = temp_store();
        let err = store
            .verify_code("ghost@example.com", "code-digest-1", Utc::now())
            .unwrap_err();
        assert!(matches!(err, IdentityStoreError::CodeInvalidOrExpired));
    }

    #[test]
    fn begin_reset_returns_none_for_unknown_email() {
        let (store, _dir) = temp_store();
        let outcome = store
            .begin_reset(
                "ghost@example.com",
                "token-digest",
                Utc::now() + Duration::hours(1),
            )
            .unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn reset_flow_replaces_password() {
        let (store, _dir) = temp_store();
        let identity = pending("ada@example.com");
        store.create(&identity).unwrap();

        let updated = store
            .begin_reset(
                "ada@example.com",
                "token-digest",
                Utc::now() + Duration::hours(1),
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.reset_token_digest.as_deref(), Some("token-digest"));

        let redeemed = store
            .consume_reset("token-digest", "new-argon2-hash", Utc::now())
            .unwrap();
        assert_eq!(redeemed.password_hash, "new-argon2-hash");
        assert!(redeemed.reset_token_digest.is_none());
        assert!(redeemed.reset_expires_at.is_none());

        let loaded = store.get(&identity.id).unwrap().unwrap();
        assert_eq!(loaded.password_hash, "new-argon2-hash");
    }

    #[test]
    fn consume_reset_rejects_unknown_token() {
        let (store, _dir) = temp_store();
        let err = store
            .consume_reset("never-issued", "new-hash", Utc::now())
            .unwrap_err();
        assert!(matches!(err, IdentityStoreError::ResetTokenInvalidOrExpired));
    }

    #[test]
    fn consume_reset_rejects_expired_token() {
        let (store, _dir) = temp_store();
        store.create(&pending("ada@example.com")).unwrap();
        store
            .begin_reset(
                "ada@example.com",
                "token-digest",
                Utc::now() - Duration::seconds(1),
            )
            .unwrap();

        let err = store
            .consume_reset("token-digest", "new-hash", Utc::now())
            .unwrap_err();
        assert!(matches!(err, IdentityStoreError::ResetTokenInvalidOrExpired));
    }

    #[test]
    fn consume_reset_is_single_use() {
        let (store, _dir) = temp_store();
        store.create(&pending("ada@example.com")).unwrap();
        store
            .begin_reset(
                "ada@example.com",
                "token-digest",
                Utc::now() + Duration::hours(1),
            )
            .unwrap();
        store
            .consume_reset("token-digest", "new-hash", Utc::now())
            .unwrap();

        let err = store
            .consume_reset("token-digest", "newer-hash", Utc::now())
            .unwrap_err();
        assert!(matches!(err, IdentityStoreError::ResetTokenInvalidOrExpired));
    }

    #[test]
    fn reissued_token_invalidates_previous_one() {
        let (store, _dir) = temp_store();
        store.create(&pending("ada@example.com")).unwrap();
        let expires = Utc::now() + Duration::hours(1);
        store
            .begin_reset("ada@example.com", "token-digest-1", expires)
            .unwrap();
        store
            .begin_reset("ada@example.com", "token-digest-2", expires)
            .unwrap();

        let err = store
            .consume_reset("token-digest-1", "new-hash", Utc::now())
            .unwrap_err();
        assert!(matches!(err, IdentityStoreError::ResetTokenInvalidOrExpired));

        let redeemed = store
            .consume_reset("token-digest-2", "new-hash", Utc::now())
            .unwrap();
        assert_eq!(redeemed.password_hash, "new-hash");
    }

    #[test]
    fn add_favorite_is_idempotent() {
        let (store, _dir) = temp_store();
        let identity = pending("ada@example.com");
        store.create(&identity).unwrap();

        let first = store.add_favorite(&identity.id, "BTC-USDT").unwrap();
        assert_eq!(first, vec!["BTC-USDT".to_string()]);

        let second = store.add_favorite(&identity.id, "BTC-USDT").unwrap();
        assert_eq!(second, vec!["BTC-USDT".to_string()]);
    }

    #[test]
    fn remove_favorite_missing_symbol_is_noop() {
        let (store, _dir) = temp_store();
        let identity = pending("ada@example.com");
        store.create(&identity).unwrap();
        store.add_favorite(&identity.id, "ETH-USDT").unwrap();

        let after = store.remove_favorite(&identity.id, "DOGE-USDT").unwrap();
        assert_eq!(after, vec!["ETH-USDT".to_string()]);
    }

    #[test]
    fn favorites_keep_insertion_order() {
        let (store, _dir) = temp_store();
        let identity = pending("ada@example.com");
        store.create(&identity).unwrap();

        store.add_favorite(&identity.id, "BTC-USDT").unwrap();
        store.add_favorite(&identity.id, "ETH-USDT").unwrap();
        store.add_favorite(&identity.id, "SOL-USDT").unwrap();
        store.remove_favorite(&identity.id, "ETH-USDT").unwrap();

        let favorites = store.favorites(&identity.id).unwrap();
        assert_eq!(
            favorites,
            vec!["BTC-USDT".to_string(), "SOL-USDT".to_string()]
        );
    }

    #[test]
    fn favorites_require_known_identity() {
        let (store, _dir) = temp_store();
        let err = store.add_favorite("no-such-id", "BTC-USDT").unwrap_err();
        assert!(matches!(err, IdentityStoreError::NotFound(_)));

        let err = store.favorites("no-such-id").unwrap_err();
        assert!(matches!(err, IdentityStoreError::NotFound(_)));
    }
}
