//! Error types for record decoding, lookups and storage access.
//!
//! Only hard failures live here. A romanization table miss or a partially
//! matched multi-character query are degrade paths, not errors: the former
//! passes the syllable through, the latter returns per-character
//! suggestions (see `service::LookupOutcome`).

use std::sync::Arc;
use thiserror::Error;

/// Failure while turning a raw compact record into a canonical entry.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The record is not valid JSON, or does not fit the entry schema.
    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Failure while reading from the key-value store.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Filesystem-backed gateway failed for a reason other than a missing key.
    #[error("storage I/O error for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Any other backend failure (remote object store, proxy, ...).
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Failure while resolving a headword or listing token.
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    /// The caller passed an empty headword; shard derivation is undefined for it.
    #[error("empty headword")]
    EmptyHeadword,

    /// The `/api/` token does not follow the token grammar.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Absent shard/key, or the decoded entry is empty.
    #[error("not found: {0}")]
    NotFound(String),

    /// Stored bytes exist but are not the JSON shape we expect.
    #[error("malformed data at {key}: {reason}")]
    Malformed { key: String, reason: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl LookupError {
    pub fn malformed(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::Malformed {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}

/// A convenience `Result` alias for lookups.
pub type Result<T> = std::result::Result<T, LookupError>;
