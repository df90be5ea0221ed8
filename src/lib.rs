//! Moedict dictionary core.
//!
//! Resolves records of the four Moedict dictionaries (Mandarin, Taiwanese
//! Hokkien, Hakka, cross-strait) out of sharded storage and renders their
//! readings:
//! - `shard`: headword → shard file and storage keys
//! - `record/`: compact record → `CanonicalEntry`, with link markup expanded
//! - `phonetic`: bopomofo and romanized fields → ruby tree
//! - `ruby`: aligns base characters with zhuyin and romanization tiers
//! - `romanization/`: conversion among romanization systems, DT tone sandhi
//!
//! With the `api` feature: storage gateways, the response cache, the lookup
//! service and the axum server.

pub mod error;
pub mod lang;
pub mod phonetic;
pub mod record;
pub mod romanization;
pub mod ruby;
pub mod shard;
pub mod utils;

#[cfg(feature = "api")]
pub mod api_server;
#[cfg(feature = "api")]
pub mod cache;
#[cfg(feature = "api")]
pub mod config;
#[cfg(feature = "api")]
pub mod service;
#[cfg(feature = "api")]
pub mod storage;

// Re-export commonly used types
pub use error::{DecodeError, LookupError, StorageError};
pub use lang::{Lang, Token, TokenKind};
pub use phonetic::{annotate, PhoneticAnnotation};
pub use record::{decode_record, decode_value, CanonicalEntry, Definition, Heteronym};
pub use romanization::{convert, trs_to_bopomofo, ConvertContext, Preference, PreferenceStore, System};
pub use ruby::{render, HRuby, RubyTree};
pub use shard::{shard_id, shard_key};

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
#[cfg(feature = "api")]
pub use config::ServerConfig;
#[cfg(feature = "api")]
pub use service::{DictionaryService, LookupOutcome};
#[cfg(feature = "api")]
pub use storage::{FsStorage, MemoryStorage, StorageGateway};
