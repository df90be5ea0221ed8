//! Phonetic annotation: bopomofo and romanized readings → ruby tree.
//!
//! Works on one heteronym at a time. Every step is a fixed rewrite of the
//! previous step's output; the order below is the order the source data was
//! authored against and must not change.

use serde::Serialize;

use crate::lang::Lang;
use crate::ruby::{Base, RubyTree, Syllable, Tier, TierKind};
use crate::utils::{decode_entities, replace_first, static_regex, strip_tags};

static_regex! {
    PAREN_GLOSS_RE = r"（.*）";
    YOUYIN_RE = r"^（([語|讀|又]音)）";
    ALT_MARK_RE = r"[變|/]";
    ALT_TAIL_RE = r".*[(變)\x{200B}|/](.*)";
    YOUYIN_ALT_RE = r".+（又音）.+";
    YOUYIN_ALT_HEAD_RE = r".+（又音）";
    ALT_TONE_SPACE_RE = r"([ˇˊˋ])\x{3000}";

    ER_RE = r"([^ ])(ㄦ)";
    IDEO_SPACE_RE = r"[ ]?\x{3000}[ ]?";
    TONE_SPLIT_RE = r"([ˇˊˋ˪˫])[ ]?";
    CHECKED_SPLIT_RE = r"([ㆴㆵㆶㆷ][\x{030D}\x{0358}]?)";

    BPMF_PUNCT_RE = r"\s?[，、；！。－—,.;]\s?";
    BPMF_YOUYIN_RE = r"（[語|讀|又]音）\x{200B}?";
    BIAN_SLASH_RE = r"\(變\)\x{200B}/.*";
    SLASH_TAIL_RE = r"/.*";
    CN_HEAD_RE = r".*<br>陸.";
    BR_TAIL_RE = r"<br>(.*)";
    STRIKE_RE = r".\x{20DF}";

    PY_BIAN_RE = r"\(變\)\x{200B}.*";
    PY_BR_TAIL_RE = r"<br>.*";
    PY_PUNCT_RE = r"[,.;，、；！。－—]\s?";

    HYPHEN_RUN_RE = r"[-\x{2011}]+";
    RHOTIC_RE = r"^[^eēéěè].*r\d?$";
    RHOTIC_EXCEPTION_RE = r"^(j|ch|sh)r$";
    VOWEL_RUN_RE = r"[aāáǎàeēéěèiīíǐìoōóǒòuūúǔùüǖǘǚǜ]+";
    WHITESPACE_RE = r"\s+";
    FINAL_ER_RE = r"\sㄦ$";

    CN_BR_HEAD_RE = r".*<br>";
    CN_MARK_RE = r"陸.";
    CN_PY_PUNCT_RE = r"\s?([,.;])\s?";
    CN_BPMF_PUNCT_RE = r"\s?([，！。；])\s?";

    BPMF_TONE_RE = r"([ˇˊˋ˪˫])";
    PINYIN_TONE_RE = r"([āáǎàōóǒòēéěèīíǐìūúǔùǖǘǚǜ])";
    HREF_RE = r#"href\s*=\s*(?:"([^"]*)"|'([^']*)')"#;
}

/// Output of [`annotate`] for one heteronym.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhoneticAnnotation {
    pub ruby: RubyTree,
    /// `又音` / `語音` / `讀音` label when the bopomofo leads with one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youyin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bopomofo_alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinyin_alt: Option<String>,
    /// The reading carries a mainland-specific (`陸`) variant.
    pub cn_specific: bool,
    /// Display reading after cleanup.
    pub pinyin: String,
    /// Display bopomofo after cleanup; always empty for Hakka.
    pub bopomofo: String,
}

/// Annotate one heteronym.
///
/// `reading` is the romanized field (`pinyin`, or `trs` when pinyin is
/// empty). `title` may carry anchors; each base inherits the covering href.
pub fn annotate(lang: Lang, title: &str, bopomofo: &str, reading: &str) -> PhoneticAnnotation {
    let mut pinyin = reading.to_string();
    let mut bopomofo = bopomofo.to_string();

    if lang != Lang::CrossStrait {
        pinyin = replace_first(&PAREN_GLOSS_RE, &strip_tags(&pinyin), "");
        bopomofo = strip_tags(&bopomofo).into_owned();
    }

    pinyin = pinyin.replace('ɡ', "g").replace('ɑ', "a").replace('，', ", ");

    let youyin = YOUYIN_RE.captures(&bopomofo).map(|caps| caps[1].to_string());

    let has_youyin_alt = YOUYIN_ALT_RE.is_match(&bopomofo);
    let mut bopomofo_alt = if ALT_MARK_RE.is_match(&bopomofo) {
        alt_tail(&bopomofo)
    } else if has_youyin_alt {
        replace_first(&YOUYIN_ALT_HEAD_RE, &bopomofo, "")
    } else {
        String::new()
    };
    bopomofo_alt = ideographic_spacing(&bopomofo_alt);

    let pinyin_alt = if ALT_MARK_RE.is_match(&pinyin) {
        alt_tail(&pinyin)
    } else if has_youyin_alt {
        second_half(&pinyin)
    } else {
        String::new()
    };

    bopomofo = tokenize_bopomofo(&bopomofo);
    let cn_specific = bopomofo.contains('陸');

    let mut b = BPMF_PUNCT_RE.replace_all(&bopomofo, " ").into_owned();
    b = replace_first(&BPMF_YOUYIN_RE, &b, "");
    b = replace_first(&BIAN_SLASH_RE, &b, "");
    b = replace_first(&SLASH_TAIL_RE, &b, "");

    let cn_bopomofo = b.contains("<br>陸").then(|| replace_first(&CN_HEAD_RE, &b, ""));
    b = replace_first(&BR_TAIL_RE, &b, "");
    b = STRIKE_RE.replace_all(&b, "").into_owned();

    let bases = scan_bases(title);

    let mut p = replace_first(&PY_BIAN_RE, &pinyin, "");
    p = replace_first(&SLASH_TAIL_RE, &p, "");
    p = replace_first(&PY_BR_TAIL_RE, &p, "");
    let p = p.replace('-', "\u{2011}");

    let mut romanization = Vec::new();
    for token in PY_PUNCT_RE.replace_all(&p, " ").split(' ').filter(|t| !t.is_empty()) {
        let span = if lang == Lang::Taiwanese {
            let runs = HYPHEN_RUN_RE.find_iter(token).count();
            (runs > 0).then_some(runs + 1)
        } else if RHOTIC_RE.is_match(token) && !RHOTIC_EXCEPTION_RE.is_match(token) {
            if let Some(cns) = cn_bopomofo.as_deref() {
                let cns: Vec<&str> = WHITESPACE_RE.split(cns).collect();
                let mut tws: Vec<&str> = WHITESPACE_RE.split(&b).collect();
                if tws.len() >= 2 && cns.len() >= 2 {
                    let at = tws.len() - 2;
                    tws[at] = cns[cns.len() - 2];
                }
                let backfilled = tws.join(" ");
                bopomofo_alt = FINAL_ER_RE
                    .replace(&b.replace(' ', "\u{3000}"), "ㄦ")
                    .into_owned();
                b = backfilled;
            }
            Some(2)
        } else {
            let runs = VOWEL_RUN_RE.find_iter(token).count();
            (runs > 0).then_some(runs)
        };
        romanization.push(Syllable::new(token, span));
    }

    let zhuyin: Vec<Syllable> = b
        .split(' ')
        .filter(|s| !s.is_empty())
        .map(|s| Syllable::new(s, None))
        .collect();

    let ruby = RubyTree {
        bases,
        tiers: vec![
            Tier { kind: TierKind::Zhuyin, syllables: zhuyin },
            Tier { kind: TierKind::Romanization, syllables: romanization },
        ],
    };

    match lang {
        Lang::CrossStrait if bopomofo.contains("<br>") => {
            pinyin = CN_MARK_RE
                .replacen(&replace_first(&CN_BR_HEAD_RE, &pinyin, ""), 1, "")
                .into_owned();
            pinyin = CN_PY_PUNCT_RE.replace_all(&pinyin, "$1 ").into_owned();

            bopomofo = CN_MARK_RE
                .replacen(&replace_first(&CN_BR_HEAD_RE, &bopomofo, ""), 1, "")
                .into_owned();
            bopomofo = CN_BPMF_PUNCT_RE.replace_all(&bopomofo, "$1").into_owned();
            bopomofo = ideographic_spacing(&bopomofo);
        }
        Lang::CrossStrait => {
            pinyin.clear();
            bopomofo.clear();
        }
        Lang::Hakka => bopomofo.clear(),
        _ => {}
    }

    PhoneticAnnotation {
        ruby,
        youyin,
        bopomofo_alt: non_empty(bopomofo_alt),
        pinyin_alt: non_empty(pinyin_alt),
        cn_specific,
        pinyin,
        bopomofo,
    }
}

/// Text after the last alternate-reading separator.
fn alt_tail(text: &str) -> String {
    ALT_TAIL_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Second half of a space-joined pair of readings.
fn second_half(text: &str) -> String {
    let tokens: Vec<&str> = text.split(' ').collect();
    tokens[tokens.len() / 2..].join(" ")
}

/// Full-width spacing between syllables, with tone marks kept tight.
fn ideographic_spacing(text: &str) -> String {
    ALT_TONE_SPACE_RE
        .replace_all(&text.replace(' ', "\u{3000}"), "$1 ")
        .into_owned()
}

/// One bopomofo syllable per space-delimited unit.
fn tokenize_bopomofo(text: &str) -> String {
    let text = ER_RE.replace_all(text, "$1 $2");
    let text = IDEO_SPACE_RE.replace_all(&text, " ");
    let text = TONE_SPLIT_RE.replace_all(&text, "$1 ");
    CHECKED_SPLIT_RE.replace_all(&text, "$1 ").into_owned()
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

// ============================================================================
// Title bases
// ============================================================================

/// One base per grapheme of `title`, whitespace dropped.
///
/// Top-level text links to its own headword; text inside an anchor takes the
/// anchor's href; text inside any other element is unlinked.
pub fn scan_bases(title: &str) -> Vec<Base> {
    // Each open element: Some(href) for anchors, None otherwise.
    let mut stack: Vec<Option<String>> = Vec::new();
    let mut bases = Vec::new();
    let mut rest = title;

    while !rest.is_empty() {
        let (text, after) = match rest.find('<') {
            Some(at) => rest.split_at(at),
            None => (rest, ""),
        };

        for c in decode_entities(text).chars().filter(|c| !c.is_whitespace()) {
            let href = if stack.is_empty() {
                Some(format!("./#{}", urlencoding::encode(c.encode_utf8(&mut [0u8; 4]))))
            } else {
                stack.iter().rev().find_map(|h| h.clone())
            };
            bases.push(Base::new(c.to_string(), href));
        }

        if after.is_empty() {
            break;
        }
        let Some(close) = after.find('>') else {
            // Unterminated tag: the rest is text.
            for c in decode_entities(after).chars().filter(|c| !c.is_whitespace()) {
                bases.push(Base::new(c.to_string(), None));
            }
            break;
        };
        let tag = &after[1..close];
        rest = &after[close + 1..];

        if tag.starts_with('/') {
            stack.pop();
        } else if !tag.ends_with('/') && !is_void(tag) {
            let is_anchor = tag.split_whitespace().next().is_some_and(|n| n.eq_ignore_ascii_case("a"));
            let href = is_anchor
                .then(|| HREF_RE.captures(tag))
                .flatten()
                .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
                .map(|m| decode_entities(m.as_str()).into_owned());
            stack.push(href);
        }
    }

    bases
}

fn is_void(tag: &str) -> bool {
    let name = tag.split_whitespace().next().unwrap_or("");
    ["br", "img", "wbr", "hr"].iter().any(|v| name.eq_ignore_ascii_case(v))
}

// ============================================================================
// Tone display
// ============================================================================

/// Wrap bopomofo tone marks in `<span class="tone">`.
pub fn format_bopomofo(bopomofo: &str) -> String {
    BPMF_TONE_RE
        .replace_all(bopomofo, r#"<span class="tone">$1</span>"#)
        .into_owned()
}

/// Wrap tone-marked pinyin vowels in `<span class="tone">`.
pub fn format_pinyin(pinyin: &str) -> String {
    PINYIN_TONE_RE
        .replace_all(pinyin, r#"<span class="tone">$1</span>"#)
        .into_owned()
}
