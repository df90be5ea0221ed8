//! Record decoding: compact shard records to canonical entries.
//!
//! - `schema`: typed entry with compact → long field names
//! - `markup`: link tokens, note heads, wrap markers
//! - `decoder`: the ordered decode pipeline

pub mod decoder;
pub mod markup;
pub mod schema;

pub use decoder::{decode_record, decode_value};
pub use schema::{split_part_of_speech, CanonicalEntry, CrossReference, Definition, Heteronym, StringList};
