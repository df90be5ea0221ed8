//! Dictionary language families and the `/api/` token grammar.
//!
//! Four dictionaries share one storage layout and differ only by a one
//! letter code:
//! - `a`: standard Mandarin (no token prefix)
//! - `t`: Taiwanese Hokkien (`'`, or the legacy `!`)
//! - `h`: Hakka (`:`)
//! - `c`: cross-strait comparative entries (`~`)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LookupError;

/// A dictionary language family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Lang {
    #[serde(rename = "a")]
    Mandarin,
    #[serde(rename = "t")]
    Taiwanese,
    #[serde(rename = "h")]
    Hakka,
    #[serde(rename = "c")]
    CrossStrait,
}

impl Lang {
    pub const ALL: [Lang; 4] = [Lang::Mandarin, Lang::Taiwanese, Lang::Hakka, Lang::CrossStrait];

    /// Single letter code used in storage keys.
    pub fn code(self) -> &'static str {
        match self {
            Lang::Mandarin => "a",
            Lang::Taiwanese => "t",
            Lang::Hakka => "h",
            Lang::CrossStrait => "c",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "a" => Some(Lang::Mandarin),
            "t" => Some(Lang::Taiwanese),
            "h" => Some(Lang::Hakka),
            "c" => Some(Lang::CrossStrait),
            _ => None,
        }
    }

    /// Prefix put in front of a headword in tokens and in `./#` link targets.
    pub fn hash_prefix(self) -> &'static str {
        match self {
            Lang::Mandarin => "",
            Lang::Taiwanese => "'",
            Lang::Hakka => ":",
            Lang::CrossStrait => "~",
        }
    }

    /// Number of shard buckets the headword space is split into.
    pub fn bucket_count(self) -> u32 {
        match self {
            Lang::Mandarin => 1024,
            _ => 128,
        }
    }

    /// Pronunciation recording for a heteronym's `audio_id`.
    ///
    /// Cross-strait entries reuse the Mandarin recordings.
    pub fn audio_url(self, audio_id: &str) -> String {
        let base = match self {
            Lang::Mandarin | Lang::CrossStrait => {
                "https://203146b5091e8f0aafda-15d41c68795720c6e932125f5ace0c70.ssl.cf1.rackcdn.com"
            }
            Lang::Hakka => {
                "https://a7ff62cf9d5b13408e72-351edcddf20c69da65316dd74d25951e.ssl.cf1.rackcdn.com"
            }
            Lang::Taiwanese => {
                "https://1763c5ee9859e0316ed6-db85b55a6a3fbe33f09b9245992383bd.ssl.cf1.rackcdn.com"
            }
        };
        format!("{}/{}.ogg", base, audio_id)
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Lang {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Lang::from_code(s).ok_or_else(|| LookupError::InvalidToken(format!("unknown language '{}'", s)))
    }
}

// ============================================================================
// Token grammar
// ============================================================================

/// What an `/api/{token}` request asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// A headword lookup.
    Entry(String),
    /// Radical listing; holds the radical after `@` (empty = radical index).
    Radical(String),
    /// Grouped listing; holds the category name after `=`.
    Category(String),
    /// The `=*` bookmark pseudo-page. Rendered by the presentation layer only.
    Bookmarks,
}

/// A parsed `/api/` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub lang: Lang,
    pub kind: TokenKind,
}

impl Token {
    /// Parse a decoded token (path segment after `/api/`, `.json` removed).
    ///
    /// Accepts both the prefix form (`'食`, `:=諺語`, `~@水`) and the explicit
    /// `{lang}/{text}` form (`t/食`).
    pub fn parse(raw: &str) -> Result<Self, LookupError> {
        let raw = raw.trim().trim_start_matches('/');

        let explicit = raw
            .split_once('/')
            .filter(|(_, rest)| !rest.is_empty())
            .and_then(|(code, rest)| Lang::from_code(code).map(|lang| (lang, rest)));
        let (lang, text) = explicit.unwrap_or_else(|| split_lang_prefix(raw));

        if text.is_empty() {
            return Err(LookupError::EmptyHeadword);
        }

        let kind = if text.starts_with("=*") {
            TokenKind::Bookmarks
        } else if let Some(category) = text.strip_prefix('=') {
            if category.is_empty() {
                return Err(LookupError::InvalidToken(raw.to_string()));
            }
            TokenKind::Category(category.to_string())
        } else if let Some(radical) = text.strip_prefix('@') {
            TokenKind::Radical(radical.to_string())
        } else {
            TokenKind::Entry(text.to_string())
        };

        Ok(Token { lang, kind })
    }

    /// Rebuild the prefix-form token string.
    pub fn to_token_string(&self) -> String {
        let prefix = self.lang.hash_prefix();
        match &self.kind {
            TokenKind::Entry(text) => format!("{}{}", prefix, text),
            TokenKind::Radical(radical) => format!("{}@{}", prefix, radical),
            TokenKind::Category(category) => format!("{}={}", prefix, category),
            TokenKind::Bookmarks => format!("{}=*", prefix),
        }
    }
}

fn split_lang_prefix(raw: &str) -> (Lang, &str) {
    if let Some(rest) = raw.strip_prefix('\'').or_else(|| raw.strip_prefix('!')) {
        (Lang::Taiwanese, rest)
    } else if let Some(rest) = raw.strip_prefix(':') {
        (Lang::Hakka, rest)
    } else if let Some(rest) = raw.strip_prefix('~') {
        (Lang::CrossStrait, rest)
    } else {
        (Lang::Mandarin, raw)
    }
}
