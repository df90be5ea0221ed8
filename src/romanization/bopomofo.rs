//! Tâi-lô → Taiwanese phonetic symbols (Bopomofo extensions).
//!
//! Each romanized syllable becomes initial + finals + tone glyph. Checked
//! syllables carry their stop as a small final (ㆴㆵㆶㆷ), with a dot for the
//! high checked tone. Tone 1 has no glyph; syllables are space separated.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::lang::Lang;

const CONSONANTS: &[(&str, &str)] = &[
    ("tshi", "ㄑ"),
    ("tsi", "ㄐ"),
    ("tsh", "ㄘ"),
    ("ji", "ㆢ"),
    ("si", "ㄒ"),
    ("ph", "ㄆ"),
    ("th", "ㄊ"),
    ("kh", "ㄎ"),
    ("ng", "ㄫ"),
    ("ts", "ㄗ"),
    ("p", "ㄅ"),
    ("b", "ㆠ"),
    ("m", "ㄇ"),
    ("t", "ㄉ"),
    ("n", "ㄋ"),
    ("l", "ㄌ"),
    ("k", "ㄍ"),
    ("g", "ㆣ"),
    ("h", "ㄏ"),
    ("j", "ㆡ"),
    ("s", "ㄙ"),
];

/// Finals, longest first so alternation prefers them.
const VOWELS: &[(&str, &str)] = &[
    ("ainn", "ㆮ"),
    ("aunn", "ㆯ"),
    ("ang", "ㄤ"),
    ("ann", "ㆩ"),
    ("onn", "ㆧ"),
    ("enn", "ㆥ"),
    ("ong", "ㆲ"),
    ("inn", "ㆪ"),
    ("unn", "ㆫ"),
    ("ing", "ㄧㄥ"),
    ("an", "ㄢ"),
    ("oo", "ㆦ"),
    ("ai", "ㄞ"),
    ("au", "ㄠ"),
    ("am", "ㆰ"),
    ("om", "ㆱ"),
    ("ng", "ㆭ"),
    ("in", "ㄧㄣ"),
    ("un", "ㄨㄣ"),
    ("a", "ㄚ"),
    ("o", "ㄜ"),
    ("e", "ㆤ"),
    ("m", "ㆬ"),
    ("i", "ㄧ"),
    ("u", "ㄨ"),
];

static CHUNK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z\x{0300}-\x{030D}]+").expect("valid chunk regex"));
static TONE_MARK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x{0300}-\x{0302}\x{0304}\x{030D}]").expect("valid tone mark regex"));
static PALATAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(tsh?|[sj])i").expect("valid palatal regex"));
static CV_RE: Lazy<Regex> = Lazy::new(|| {
    let consonants: Vec<&str> = CONSONANTS.iter().map(|(k, _)| *k).collect();
    let vowels: Vec<&str> = VOWELS.iter().map(|(k, _)| *k).collect();
    Regex::new(&format!(r"^({})((?:{})+[ptkh]?)$", consonants.join("|"), vowels.join("|")))
        .expect("valid syllable regex")
});
static VOWEL_RE: Lazy<Regex> = Lazy::new(|| {
    let vowels: Vec<&str> = VOWELS.iter().map(|(k, _)| *k).collect();
    Regex::new(&vowels.join("|")).expect("valid vowel regex")
});
static PUNCT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.?!,] ?").expect("valid punct regex"));

fn lookup(table: &[(&str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Tone glyph for a TL combining mark. `$` stands for the high checked tone
/// until the stop final is known.
fn tone_glyph(mark: char) -> Option<&'static str> {
    match mark {
        '\u{0300}' => Some("˪"),
        '\u{0301}' => Some("ˋ"),
        '\u{0302}' => Some("ˊ"),
        '\u{0304}' => Some("˫"),
        '\u{030D}' => Some("$"),
        _ => None,
    }
}

fn checked_final(stop: char, high: bool) -> Option<&'static str> {
    Some(match (stop, high) {
        ('p', false) => "ㆴ",
        ('t', false) => "ㆵ",
        ('k', false) => "ㆶ",
        ('h', false) => "ㆷ",
        ('p', true) => "ㆴ\u{0358}",
        ('t', true) => "ㆵ\u{0358}",
        ('k', true) => "ㆶ\u{0358}",
        ('h', true) => "ㆷ\u{0358}",
        _ => return None,
    })
}

/// Convert a Tâi-lô reading to Taiwanese phonetic symbols.
///
/// Hakka has no phonetic-symbol rendering and yields a single space;
/// Mandarin and cross-strait readings are returned unchanged.
pub fn trs_to_bopomofo(lang: Lang, trs: &str) -> String {
    match lang {
        Lang::Hakka => return " ".to_string(),
        Lang::Mandarin | Lang::CrossStrait => return trs.to_string(),
        Lang::Taiwanese => {}
    }

    let converted = CHUNK_RE.replace_all(trs, |caps: &regex::Captures<'_>| syllable(&caps[0]));
    let joined: String = converted.chars().filter(|c| *c != '-' && *c != ' ').collect();
    PUNCT_RE.replace_all(&joined.replace('\u{FFFD}', " "), "").into_owned()
}

/// One syllable; U+FFFD stands in for the separator of a toneless syllable.
fn syllable(chunk: &str) -> String {
    let mut tone = "";
    let lower = chunk.to_lowercase();
    for m in TONE_MARK_RE.find_iter(&lower) {
        if let Some(glyph) = m.as_str().chars().next().and_then(tone_glyph) {
            tone = glyph;
        }
    }
    let mut token = TONE_MARK_RE.replace_all(&lower, "").into_owned();

    token = PALATAL_RE.replace(&token, "${1}ii").into_owned();
    if let Some(stem) = token.strip_suffix("ok") {
        token = format!("{}ook", stem);
    }
    if let Some(caps) = CV_RE.captures(&token) {
        let initial = lookup(CONSONANTS, &caps[1]).unwrap_or("");
        token = format!("{}{}", initial, &caps[2]);
    }

    let mut final_glyph = None;
    if let Some(stop) = token.chars().last().filter(|c| "ptkh".contains(*c)) {
        // Only a high (`$`) or unmarked tone combines with the stop.
        let high = tone == "$";
        if high || tone.is_empty() {
            final_glyph = checked_final(stop, high);
        }
        token.pop();
    }

    let mut out = VOWEL_RE
        .replace_all(&token, |caps: &regex::Captures<'_>| lookup(VOWELS, &caps[0]).unwrap_or("").to_string())
        .into_owned();
    match final_glyph {
        Some(glyph) => out.push_str(glyph),
        None if tone.is_empty() => out.push('\u{FFFD}'),
        None => out.push_str(tone),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_syllables() {
        assert_eq!(trs_to_bopomofo(Lang::Taiwanese, "ba\u{030D}k"), "ㆠㄚㆶ\u{0358}");
        assert_eq!(trs_to_bopomofo(Lang::Taiwanese, "tsu\u{0301}"), "ㄗㄨˋ");
        assert_eq!(trs_to_bopomofo(Lang::Taiwanese, "sann"), "ㄙㆩ ");
    }

    #[test]
    fn test_palatal_initials() {
        assert_eq!(trs_to_bopomofo(Lang::Taiwanese, "tsia\u{030D}h"), "ㄐㄧㄚㆷ\u{0358}");
        assert_eq!(trs_to_bopomofo(Lang::Taiwanese, "si"), "ㄒㄧ ");
    }

    #[test]
    fn test_phrase() {
        assert_eq!(trs_to_bopomofo(Lang::Taiwanese, "tsia\u{030D}h-pn\u{0304}g"), "ㄐㄧㄚㆷ\u{0358}ㄅㆭ˫");
        assert_eq!(trs_to_bopomofo(Lang::Taiwanese, "a, a"), "ㄚ ㄚ ");
    }

    #[test]
    fn test_other_languages() {
        assert_eq!(trs_to_bopomofo(Lang::Hakka, "ngai¹¹"), " ");
        assert_eq!(trs_to_bopomofo(Lang::Mandarin, "méng"), "méng");
    }
}
