//! Dictionary lookups over a [`StorageGateway`].
//!
//! A headword resolves through its shard file, gets decoded, and picks up
//! its cross references. Missing headwords are not errors: they come back
//! as per-character suggestions.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::cache::{entry_key, ResponseCache};
use crate::error::{LookupError, Result};
use crate::lang::Lang;
use crate::phonetic::{annotate, format_bopomofo};
use crate::record::{decode_value, CanonicalEntry, CrossReference};
use crate::romanization::{convert, trs_to_bopomofo, ConvertContext, Preference};
use crate::ruby;
use crate::shard::{escape_headword, index_key, listing_key, shard_key, xref_key};
use crate::storage::StorageGateway;

/// Top-level entry fields the API hands to readers.
const PROJECTED_FIELDS: [&str; 9] = [
    "Deutsch",
    "English",
    "francais",
    "heteronyms",
    "radical",
    "stroke_count",
    "non_radical_stroke_count",
    "title",
    "translation",
];

/// Result of a headword lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Entry(Arc<CanonicalEntry>),
    /// Nothing stored under the headword. `terms` are its characters, each
    /// a lookup the reader can try instead; empty when there is nothing to
    /// suggest.
    Suggestions { terms: Vec<String> },
}

/// One heteronym prepared for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedHeteronym {
    /// Flattened ruby markup with per-base annotations.
    pub ruby: String,
    /// Reading in the selected romanization.
    pub reading: String,
    /// Bopomofo with tone spans; Taiwanese falls back to phonetic symbols
    /// derived from the reading.
    pub bopomofo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youyin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bopomofo_alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinyin_alt: Option<String>,
    pub cn_specific: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

pub struct DictionaryService {
    storage: Arc<dyn StorageGateway>,
    entries: ResponseCache<LookupOutcome, LookupError>,
}

impl std::fmt::Debug for DictionaryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DictionaryService").field("entries", &self.entries).finish()
    }
}

impl DictionaryService {
    pub fn new(storage: Arc<dyn StorageGateway>) -> Self {
        Self::with_cache(storage, ResponseCache::<LookupOutcome, LookupError>::builder().build())
    }

    pub fn with_cache(storage: Arc<dyn StorageGateway>, entries: ResponseCache<LookupOutcome, LookupError>) -> Self {
        Self { storage, entries }
    }

    pub fn cache(&self) -> &ResponseCache<LookupOutcome, LookupError> {
        &self.entries
    }

    /// Look up a headword, going through the response cache.
    pub async fn lookup(&self, lang: Lang, headword: &str) -> Result<LookupOutcome> {
        let headword = headword.trim();
        if headword.is_empty() {
            return Err(LookupError::EmptyHeadword);
        }
        if headword.starts_with('@') || headword.starts_with('=') {
            return Err(LookupError::InvalidToken(headword.to_string()));
        }

        let storage = self.storage.clone();
        let owned = headword.to_string();
        self.entries
            .get_or_fetch(&entry_key(lang, headword), move || async move {
                match fetch_entry(storage.as_ref(), lang, &owned).await? {
                    Some(entry) => Ok(LookupOutcome::Entry(Arc::new(entry))),
                    None => Ok(LookupOutcome::Suggestions { terms: fuzzy_terms(&owned) }),
                }
            })
            .await
    }

    /// Radical listing `{lang}/@{radical}.json`, returned as stored.
    pub async fn radical(&self, lang: Lang, radical: &str) -> Result<Value> {
        let key = listing_key(lang, '@', radical);
        self.read_json(&key)
            .await?
            .ok_or_else(|| LookupError::NotFound(format!("找不到部首: @{}", radical)))
    }

    /// Category listing `{lang}/={category}.json`; must be an array.
    pub async fn category(&self, lang: Lang, category: &str) -> Result<Value> {
        let key = listing_key(lang, '=', category);
        let listing = self
            .read_json(&key)
            .await?
            .ok_or_else(|| LookupError::NotFound(format!("找不到分類：{}", category)))?;
        ensure_array(&key, listing)
    }

    /// Search index `{lang}/index.json`; must be an array.
    pub async fn index(&self, lang: Lang) -> Result<Value> {
        let key = index_key(lang);
        let index = self
            .read_json(&key)
            .await?
            .ok_or_else(|| LookupError::NotFound(format!("找不到索引: {}", lang)))?;
        ensure_array(&key, index)
    }

    /// Cross references for `headword` out of `{lang}/xref.json`.
    ///
    /// Any failure reading the xref file degrades to no references.
    pub async fn cross_references(&self, lang: Lang, headword: &str) -> Vec<CrossReference> {
        cross_references(self.storage.as_ref(), lang, headword).await
    }

    /// Look up `headword` and prepare each heteronym for display in the
    /// reader's romanization. `None` when the headword is not stored.
    pub async fn render(
        &self,
        lang: Lang,
        headword: &str,
        preference: Preference,
    ) -> Result<Option<Vec<RenderedHeteronym>>> {
        match self.lookup(lang, headword).await? {
            LookupOutcome::Entry(entry) => Ok(Some(render_entry(lang, &entry, preference))),
            LookupOutcome::Suggestions { .. } => Ok(None),
        }
    }

    async fn read_json(&self, key: &str) -> Result<Option<Value>> {
        let Some(bytes) = self.storage.get(key).await? else {
            tracing::debug!(key, "storage miss");
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| LookupError::malformed(key, e))
    }
}

fn ensure_array(key: &str, value: Value) -> Result<Value> {
    if value.is_array() {
        Ok(value)
    } else {
        Err(LookupError::malformed(key, "expected a JSON array"))
    }
}

/// Fetch and decode `headword` from its shard. `Ok(None)` when the shard or
/// the headword is absent, or the stored record does not decode to anything.
pub async fn fetch_entry(storage: &dyn StorageGateway, lang: Lang, headword: &str) -> Result<Option<CanonicalEntry>> {
    let key = shard_key(headword, lang)?;
    let Some(bytes) = storage.get(&key).await? else {
        tracing::debug!(key = %key, "shard not found");
        return Ok(None);
    };

    let mut shard: serde_json::Map<String, Value> =
        serde_json::from_slice(&bytes).map_err(|e| LookupError::malformed(&key, e))?;
    let Some(raw) = shard.remove(&escape_headword(headword)) else {
        tracing::debug!(key = %key, headword, "headword not in shard");
        return Ok(None);
    };

    let mut entry = match decode_value(raw, lang) {
        Ok(entry) if !entry.is_empty() => entry,
        Ok(_) => return Ok(None),
        Err(e) => {
            tracing::warn!(key = %key, headword, error = %e, "undecodable record");
            return Ok(None);
        }
    };
    entry.xrefs = cross_references(storage, lang, headword).await;
    Ok(Some(entry))
}

async fn cross_references(storage: &dyn StorageGateway, lang: Lang, headword: &str) -> Vec<CrossReference> {
    let key = xref_key(lang);
    let xref: Value = match storage.get(&key).await {
        Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "malformed xref file");
                return Vec::new();
            }
        },
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "xref read failed");
            return Vec::new();
        }
    };

    Lang::ALL
        .iter()
        .filter_map(|&target| {
            let words = match xref.get(target.code())?.get(headword)? {
                Value::String(joined) => joined
                    .split(',')
                    .map(str::trim)
                    .filter(|w| !w.is_empty())
                    .map(str::to_string)
                    .collect(),
                Value::Array(list) => list.iter().filter_map(|w| w.as_str()).map(str::to_string).collect(),
                _ => Vec::new(),
            };
            (!words.is_empty()).then_some(CrossReference { lang: target, words })
        })
        .collect()
}

/// Per-character suggestions for an unresolved query.
pub fn fuzzy_terms(text: &str) -> Vec<String> {
    let clean: String = text.chars().filter(|c| *c != '`' && *c != '~').collect();
    let terms: Vec<String> = clean.chars().filter(|c| !c.is_whitespace()).map(String::from).collect();
    if terms.is_empty() && !clean.is_empty() {
        return vec![clean];
    }
    terms
}

/// The reader-facing JSON of an entry: translations, heteronyms, radical,
/// stroke counts and title (when present and non-empty), plus `xrefs`.
pub fn project(entry: &CanonicalEntry) -> Value {
    let mut out = serde_json::Map::new();
    if let Ok(Value::Object(fields)) = serde_json::to_value(entry) {
        for (key, value) in fields {
            if PROJECTED_FIELDS.contains(&key.as_str()) && is_truthy(&value) {
                out.insert(key, value);
            }
        }
    }
    out.insert("xrefs".to_string(), serde_json::to_value(&entry.xrefs).unwrap_or_default());
    Value::Object(out)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Annotate, align and convert every reading of `entry`.
pub fn render_entry(lang: Lang, entry: &CanonicalEntry, preference: Preference) -> Vec<RenderedHeteronym> {
    let readings: Vec<(&str, &str, Option<String>)> = if entry.heteronyms.is_empty() {
        match (entry.bopomofo.as_deref(), entry.pinyin.as_deref()) {
            (None, None) => Vec::new(),
            (b, p) => vec![(b.unwrap_or(""), p.unwrap_or(""), None)],
        }
    } else {
        entry
            .heteronyms
            .iter()
            .map(|h| (h.bopomofo.as_deref().unwrap_or(""), h.reading(), h.audio_key()))
            .collect()
    };

    readings
        .into_iter()
        .map(|(bopomofo, reading, audio)| {
            let annotation = annotate(lang, &entry.title, bopomofo, reading);
            let tree = annotation.ruby.convert_romanization(
                |syllable| convert(lang, syllable, preference.system, ConvertContext::Ruby),
                preference.parallel,
            );

            let bopomofo = if annotation.bopomofo.is_empty() && lang == Lang::Taiwanese {
                trs_to_bopomofo(lang, &annotation.pinyin).trim().to_string()
            } else {
                format_bopomofo(&annotation.bopomofo)
            };

            RenderedHeteronym {
                ruby: ruby::render(&tree).to_markup(),
                reading: convert(lang, &annotation.pinyin, preference.system, ConvertContext::Body),
                bopomofo,
                youyin: annotation.youyin,
                bopomofo_alt: annotation.bopomofo_alt,
                pinyin_alt: annotation.pinyin_alt,
                cn_specific: annotation.cn_specific,
                audio_url: audio.map(|id| lang.audio_url(&id)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::romanization::System;
    use crate::storage::MemoryStorage;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn storage() -> Arc<MemoryStorage> {
        let storage = Arc::new(MemoryStorage::new());
        let shard = shard_key("萌", Lang::Mandarin).unwrap();
        storage.insert_json(
            shard,
            &json!({
                escape_headword("萌"): {
                    "t": "萌", "r": "艸", "c": 12, "n": 8,
                    "h": [{"b": "ㄇㄥˊ", "p": "méng", "=": "0000", "d": [{"f": "草木初生的芽。", "type": "名"}]}],
                    "E": "to sprout"
                }
            }),
        );
        storage.insert_json(xref_key(Lang::Mandarin), &json!({"t": {"萌": "萌,發穎"}, "h": {"萌": ["萌"]}}));
        storage.insert_json(listing_key(Lang::Mandarin, '=', "成語"), &json!(["一丁不識", "一刀兩斷"]));
        storage.insert_json(listing_key(Lang::Mandarin, '=', "壞的"), &json!({"not": "an array"}));
        storage.insert_json(listing_key(Lang::Mandarin, '@', "艸"), &json!([["艸"], ["艾", "芃"]]));
        storage.insert(index_key(Lang::Taiwanese), "[\"食\"");
        storage
    }

    #[tokio::test]
    async fn test_lookup_entry_with_xrefs() {
        let service = DictionaryService::new(storage());
        let LookupOutcome::Entry(entry) = service.lookup(Lang::Mandarin, "萌").await.unwrap() else {
            panic!("expected an entry");
        };
        assert_eq!(entry.title, "萌");
        assert_eq!(entry.heteronyms[0].pinyin.as_deref(), Some("méng"));
        assert_eq!(
            entry.xrefs,
            vec![
                CrossReference { lang: Lang::Taiwanese, words: vec!["萌".into(), "發穎".into()] },
                CrossReference { lang: Lang::Hakka, words: vec!["萌".into()] },
            ]
        );
        assert_eq!(service.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_headword_suggests_characters() {
        let service = DictionaryService::new(storage());
        let outcome = service.lookup(Lang::Mandarin, "萌 芽").await.unwrap();
        assert_eq!(outcome, LookupOutcome::Suggestions { terms: vec!["萌".into(), "芽".into()] });
    }

    #[tokio::test]
    async fn test_rejects_empty_and_listing_tokens() {
        let service = DictionaryService::new(storage());
        assert!(matches!(service.lookup(Lang::Mandarin, "  ").await, Err(LookupError::EmptyHeadword)));
        assert!(matches!(service.lookup(Lang::Mandarin, "=成語").await, Err(LookupError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn test_listings() {
        let service = DictionaryService::new(storage());
        assert_eq!(service.category(Lang::Mandarin, "成語").await.unwrap(), json!(["一丁不識", "一刀兩斷"]));
        assert!(matches!(service.category(Lang::Mandarin, "壞的").await, Err(LookupError::Malformed { .. })));
        assert!(matches!(service.category(Lang::Mandarin, "無").await, Err(LookupError::NotFound(_))));
        assert!(service.radical(Lang::Mandarin, "艸").await.unwrap().is_array());
        assert!(matches!(service.index(Lang::Taiwanese).await, Err(LookupError::Malformed { .. })));
        assert!(matches!(service.index(Lang::Hakka).await, Err(LookupError::NotFound(_))));
    }

    #[test]
    fn test_fuzzy_terms() {
        assert_eq!(fuzzy_terms("`萌~芽"), vec!["萌", "芽"]);
        assert_eq!(fuzzy_terms("   "), vec!["   "]);
        assert!(fuzzy_terms("~`").is_empty());
    }

    #[tokio::test]
    async fn test_projection_keeps_reader_fields() {
        let service = DictionaryService::new(storage());
        let LookupOutcome::Entry(entry) = service.lookup(Lang::Mandarin, "萌").await.unwrap() else {
            panic!("expected an entry");
        };
        let projected = project(&entry);
        assert_eq!(projected["title"], "萌");
        assert_eq!(projected["English"], "to sprout");
        assert_eq!(projected["stroke_count"], 12);
        assert_eq!(projected["xrefs"][0]["lang"], "t");
        assert!(projected.get("bopomofo").is_none());
    }

    #[tokio::test]
    async fn test_render_with_preference() {
        let service = DictionaryService::new(storage());
        let preference = Preference { system: System::WadeGiles, parallel: false };
        let rendered = service.render(Lang::Mandarin, "萌", preference).await.unwrap().unwrap();
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].reading, "méng");
        assert!(rendered[0].ruby.contains("萌"));
        assert_eq!(
            rendered[0].audio_url.as_deref(),
            Some("https://203146b5091e8f0aafda-15d41c68795720c6e932125f5ace0c70.ssl.cf1.rackcdn.com/0000.ogg")
        );

        assert_eq!(service.render(Lang::Mandarin, "無此詞", preference).await.unwrap(), None);
    }
}
