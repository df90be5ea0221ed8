//! Raw record → canonical entry.

use serde_json::Value;

use crate::error::DecodeError;
use crate::lang::Lang;
use crate::record::markup::{collapse_note_chains, expand_links, insert_wrap_markers};
use crate::record::schema::CanonicalEntry;

/// Decode a compact record from its JSON bytes.
pub fn decode_record(raw: &[u8], lang: Lang) -> Result<CanonicalEntry, DecodeError> {
    let entry: CanonicalEntry = serde_json::from_slice(raw)?;
    Ok(finish(entry, lang))
}

/// Decode a compact record already parsed out of a shard map.
pub fn decode_value(raw: Value, lang: Lang) -> Result<CanonicalEntry, DecodeError> {
    let entry: CanonicalEntry = serde_json::from_value(raw)?;
    Ok(finish(entry, lang))
}

fn finish(mut entry: CanonicalEntry, lang: Lang) -> CanonicalEntry {
    // Note heads read the follower's raw text, so they collapse before any
    // link is expanded.
    for heteronym in &mut entry.heteronyms {
        collapse_note_chains(&mut heteronym.definitions);
        heteronym.extra.retain(|key, _| key.chars().count() > 1);
    }

    entry.for_each_text_mut(&mut |text: &mut String| {
        if text.contains('`') || text.contains(')') || text.contains('）') || text.contains("./##") {
            *text = insert_wrap_markers(&expand_links(text, lang));
        }
    });

    entry
}
