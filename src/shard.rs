//! Shard derivation and storage key layout.
//!
//! The headword space of each language is split into fixed buckets. A shard
//! file `{lang}ck/{shard}.txt` holds a JSON object mapping the JavaScript
//! `escape()` form of each headword to its compact record.

use crate::error::LookupError;
use crate::lang::Lang;

/// Marker characters that route a headword to a dedicated collection bucket.
const COLLECTION_MARKERS: [char; 2] = ['@', '='];

/// Compute the shard id for `headword` in `lang`.
///
/// Collection tokens (`@…`, `=…`) get the marker itself as shard id. Any
/// other headword is bucketed by the UTF-16 code unit of its first
/// character; a surrogate pair is resolved to its low-surrogate offset.
pub fn shard_id(headword: &str, lang: Lang) -> Result<String, LookupError> {
    let first = headword.chars().next().ok_or(LookupError::EmptyHeadword)?;

    if COLLECTION_MARKERS.contains(&first) {
        return Ok(first.to_string());
    }

    let mut units = [0u16; 2];
    let encoded = first.encode_utf16(&mut units);
    let code = if encoded.len() == 2 {
        u32::from(encoded[1]) - 0xDC00
    } else {
        u32::from(encoded[0])
    };

    Ok((code % lang.bucket_count()).to_string())
}

/// Key of the shard file holding `headword`.
pub fn shard_key(headword: &str, lang: Lang) -> Result<String, LookupError> {
    Ok(format!("{}ck/{}.txt", lang.code(), shard_id(headword, lang)?))
}

/// Key of a radical (`@…`) or category (`=…`) listing.
pub fn listing_key(lang: Lang, marker: char, name: &str) -> String {
    format!("{}/{}{}.json", lang.code(), marker, name)
}

pub fn xref_key(lang: Lang) -> String {
    format!("{}/xref.json", lang.code())
}

pub fn index_key(lang: Lang) -> String {
    format!("{}/index.json", lang.code())
}

/// JavaScript `escape()`: the form headwords take as shard map keys.
///
/// ASCII alphanumerics and `@*_+-./` pass through, other Latin-1 units
/// become `%XX`, everything else `%uXXXX` per UTF-16 code unit.
pub fn escape_headword(headword: &str) -> String {
    let mut out = String::with_capacity(headword.len() * 3);
    for unit in headword.encode_utf16() {
        match char::from_u32(u32::from(unit)) {
            Some(c) if c.is_ascii_alphanumeric() || "@*_+-./".contains(c) => out.push(c),
            _ if unit < 0x100 => out.push_str(&format!("%{:02X}", unit)),
            _ => out.push_str(&format!("%u{:04X}", unit)),
        }
    }
    out
}
