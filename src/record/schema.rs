//! Typed entry schema.
//!
//! Raw shard records use single-letter keys (`t`, `h`, `b`, `p`, ...). Each
//! field declares its compact key as the deserialize name and its long name
//! as the serialize name, so decoding and key expansion are one step. The
//! long name is also accepted on input, which keeps already-canonical JSON
//! decodable.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A field that is a single string in some records and a list in others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringList {
    One(String),
    Many(Vec<String>),
}

impl StringList {
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        let slice: &[String] = match self {
            StringList::One(s) => std::slice::from_ref(s),
            StringList::Many(v) => v.as_slice(),
        };
        slice.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut String> {
        let slice: &mut [String] = match self {
            StringList::One(s) => std::slice::from_mut(s),
            StringList::Many(v) => v.as_mut_slice(),
        };
        slice.iter_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().all(|s| s.is_empty())
    }
}

/// Resolved cross-reference: headwords in another language for this entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReference {
    pub lang: crate::lang::Lang,
    pub words: Vec<String>,
}

/// A decoded dictionary entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEntry {
    #[serde(rename(deserialize = "t"), alias = "title", default)]
    pub title: String,

    #[serde(rename(deserialize = "r"), alias = "radical", default, skip_serializing_if = "Option::is_none")]
    pub radical: Option<String>,

    #[serde(rename(deserialize = "c"), alias = "stroke_count", default, skip_serializing_if = "Option::is_none")]
    pub stroke_count: Option<u32>,

    #[serde(
        rename(deserialize = "n"),
        alias = "non_radical_stroke_count",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub non_radical_stroke_count: Option<u32>,

    #[serde(rename(deserialize = "h"), alias = "heteronyms", default)]
    pub heteronyms: Vec<Heteronym>,

    /// Entry-level reading, present on flat records without heteronyms.
    #[serde(rename(deserialize = "b"), alias = "bopomofo", default, skip_serializing_if = "Option::is_none")]
    pub bopomofo: Option<String>,

    #[serde(rename(deserialize = "p"), alias = "pinyin", default, skip_serializing_if = "Option::is_none")]
    pub pinyin: Option<String>,

    #[serde(
        rename(deserialize = "E", serialize = "English"),
        alias = "english",
        alias = "English",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub english: Option<StringList>,

    #[serde(rename = "Deutsch", default, skip_serializing_if = "Option::is_none")]
    pub deutsch: Option<StringList>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub francais: Option<StringList>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<BTreeMap<String, StringList>>,

    /// Filled by the lookup service from `{lang}/xref.json`, never by the record.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub xrefs: Vec<CrossReference>,
}

impl CanonicalEntry {
    /// Decoding produced nothing a reader could display.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.heteronyms.is_empty()
    }

    /// Visit every free-text string in the entry.
    pub fn for_each_text_mut(&mut self, f: &mut impl FnMut(&mut String)) {
        f(&mut self.title);
        for field in [&mut self.radical, &mut self.bopomofo, &mut self.pinyin].into_iter().flatten() {
            f(field);
        }
        for list in [&mut self.english, &mut self.deutsch, &mut self.francais].into_iter().flatten() {
            list.iter_mut().for_each(&mut *f);
        }
        if let Some(translation) = self.translation.as_mut() {
            for list in translation.values_mut() {
                list.iter_mut().for_each(&mut *f);
            }
        }
        for heteronym in &mut self.heteronyms {
            heteronym.for_each_text_mut(f);
        }
    }
}

/// One pronunciation of a headword, with its senses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Heteronym {
    #[serde(rename(deserialize = "b"), alias = "bopomofo", default, skip_serializing_if = "Option::is_none")]
    pub bopomofo: Option<String>,

    #[serde(rename(deserialize = "p"), alias = "pinyin", default, skip_serializing_if = "Option::is_none")]
    pub pinyin: Option<String>,

    /// Taiwanese and Hakka romanized reading.
    #[serde(rename(deserialize = "T"), alias = "trs", default, skip_serializing_if = "Option::is_none")]
    pub trs: Option<String>,

    /// Simplified-character variant.
    #[serde(rename(deserialize = "A"), alias = "alt", default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,

    #[serde(rename(deserialize = "="), alias = "audio_id", default, skip_serializing_if = "Option::is_none")]
    pub audio_id: Option<Value>,

    #[serde(rename(deserialize = "_"), alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(rename(deserialize = "d"), alias = "definitions", default)]
    pub definitions: Vec<Definition>,

    #[serde(rename(deserialize = "V"), alias = "vernacular", default, skip_serializing_if = "Option::is_none")]
    pub vernacular: Option<Value>,

    #[serde(rename(deserialize = "C"), alias = "combined", default, skip_serializing_if = "Option::is_none")]
    pub combined: Option<Value>,

    #[serde(rename(deserialize = "D"), alias = "dialects", default, skip_serializing_if = "Option::is_none")]
    pub dialects: Option<Value>,

    #[serde(rename(deserialize = "S"), alias = "specific_to", default, skip_serializing_if = "Option::is_none")]
    pub specific_to: Option<Value>,

    /// Long-named keys with no compact form (`reading`, `synonyms`, ...).
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Heteronym {
    /// The romanized reading: `pinyin` when present and non-empty, else `trs`.
    pub fn reading(&self) -> &str {
        match self.pinyin.as_deref() {
            Some(p) if !p.is_empty() => p,
            _ => self.trs.as_deref().unwrap_or(""),
        }
    }

    /// Audio id as a plain string, whether stored as a string or a number.
    pub fn audio_key(&self) -> Option<String> {
        match self.audio_id.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Definitions grouped by part-of-speech tag, in first-seen order.
    pub fn grouped_definitions(&self) -> Vec<(Option<&str>, Vec<&Definition>)> {
        let mut groups: Vec<(Option<&str>, Vec<&Definition>)> = Vec::new();
        for def in &self.definitions {
            let tag = def.part_of_speech.as_deref().filter(|t| !t.is_empty());
            match groups.iter_mut().find(|(t, _)| *t == tag) {
                Some((_, defs)) => defs.push(def),
                None => groups.push((tag, vec![def])),
            }
        }
        groups
    }

    pub fn for_each_text_mut(&mut self, f: &mut impl FnMut(&mut String)) {
        for field in [&mut self.bopomofo, &mut self.pinyin, &mut self.trs, &mut self.alt]
            .into_iter()
            .flatten()
        {
            f(field);
        }
        for def in &mut self.definitions {
            def.for_each_text_mut(f);
        }
        for value in [&mut self.vernacular, &mut self.combined, &mut self.dialects, &mut self.specific_to]
            .into_iter()
            .flatten()
        {
            for_each_value_text_mut(value, f);
        }
        for value in self.extra.values_mut() {
            for_each_value_text_mut(value, f);
        }
    }
}

/// One sense of a heteronym.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<String>,

    #[serde(rename(deserialize = "f"), alias = "def", default)]
    pub def: String,

    #[serde(rename(deserialize = "e"), alias = "example", default, skip_serializing_if = "Option::is_none")]
    pub example: Option<StringList>,

    #[serde(rename(deserialize = "q"), alias = "quote", default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<StringList>,

    #[serde(rename(deserialize = "l"), alias = "link", default, skip_serializing_if = "Option::is_none")]
    pub link: Option<StringList>,

    #[serde(rename(deserialize = "s"), alias = "synonyms", default, skip_serializing_if = "Option::is_none")]
    pub synonyms: Option<StringList>,

    #[serde(rename(deserialize = "a"), alias = "antonyms", default, skip_serializing_if = "Option::is_none")]
    pub antonyms: Option<StringList>,
}

impl Definition {
    pub fn for_each_text_mut(&mut self, f: &mut impl FnMut(&mut String)) {
        f(&mut self.def);
        if let Some(tag) = self.part_of_speech.as_mut() {
            f(tag);
        }
        for list in [
            &mut self.example,
            &mut self.quote,
            &mut self.link,
            &mut self.synonyms,
            &mut self.antonyms,
        ]
        .into_iter()
        .flatten()
        {
            list.iter_mut().for_each(&mut *f);
        }
    }
}

/// Split a comma-joined part-of-speech tag (`"名,動"`) into its parts.
pub fn split_part_of_speech(tag: &str) -> Vec<&str> {
    tag.split([',', '，', '、'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

fn for_each_value_text_mut(value: &mut Value, f: &mut impl FnMut(&mut String)) {
    match value {
        Value::String(s) => f(s),
        Value::Array(items) => items.iter_mut().for_each(|v| for_each_value_text_mut(v, f)),
        Value::Object(map) => map.values_mut().for_each(|v| for_each_value_text_mut(v, f)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compact_keys_map_to_long_names() {
        let raw = json!({
            "t": "萌",
            "r": "艸",
            "c": 12,
            "n": 8,
            "E": ["to sprout"],
            "h": [{
                "b": "ㄇㄥˊ",
                "p": "méng",
                "=": "0001",
                "d": [{"type": "動", "f": "發芽。", "e": ["例"], "s": "芽", "q": ["引"]}]
            }]
        });
        let entry: CanonicalEntry = serde_json::from_value(raw).unwrap();
        assert_eq!(entry.title, "萌");
        assert_eq!(entry.stroke_count, Some(12));
        assert_eq!(entry.heteronyms[0].bopomofo.as_deref(), Some("ㄇㄥˊ"));
        assert_eq!(entry.heteronyms[0].audio_key().as_deref(), Some("0001"));

        let out = serde_json::to_value(&entry).unwrap();
        assert_eq!(out["English"], json!(["to sprout"]));
        assert_eq!(out["heteronyms"][0]["definitions"][0]["def"], "發芽。");
        assert_eq!(out["heteronyms"][0]["definitions"][0]["synonyms"], "芽");
        assert!(out.get("t").is_none());
        assert!(out["heteronyms"][0].get("b").is_none());
    }

    #[test]
    fn test_long_names_accepted() {
        let canonical = json!({"title": "萌", "heteronyms": [{"pinyin": "méng", "reading": "文"}]});
        let entry: CanonicalEntry = serde_json::from_value(canonical).unwrap();
        assert_eq!(entry.heteronyms[0].reading(), "méng");
        assert_eq!(entry.heteronyms[0].extra["reading"], "文");
    }

    #[test]
    fn test_reading_falls_back_to_trs() {
        let het = Heteronym {
            pinyin: Some(String::new()),
            trs: Some("tsia̍h".into()),
            ..Default::default()
        };
        assert_eq!(het.reading(), "tsia̍h");
    }

    #[test]
    fn test_grouped_definitions_keep_first_seen_order() {
        let def = |t: Option<&str>, f: &str| Definition {
            part_of_speech: t.map(String::from),
            def: f.into(),
            ..Default::default()
        };
        let het = Heteronym {
            definitions: vec![def(Some("動"), "a"), def(Some("名"), "b"), def(Some("動"), "c"), def(None, "d")],
            ..Default::default()
        };
        let groups = het.grouped_definitions();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].0, Some("動"));
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, Some("名"));
        assert_eq!(groups[2].0, None);
    }

    #[test]
    fn test_split_part_of_speech() {
        assert_eq!(split_part_of_speech("名,動"), vec!["名", "動"]);
        assert_eq!(split_part_of_speech(""), Vec::<&str>::new());
    }
}
