//! Hakka romanization: Taiwan Hakka (TH) → Pha̍k-fa-sṳ (PFS).
//!
//! TH writes tones as superscript digits after the syllable; PFS writes
//! them as a diacritic on the main vowel.

use once_cell::sync::Lazy;
use regex::Regex;

static WORD_INITIAL_I_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bi").expect("valid initial i regex"));
static BARE_Y_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\by(\b|[ptk])h?").expect("valid bare y regex"));
static CHECKED_IH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(i[ptk])h").expect("valid checked ih regex"));
static Y_NASAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"y([mn])").expect("valid y nasal regex"));
static TONED_SYLLABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^¹²³⁴⁵]+[¹²³⁴⁵]+").expect("valid toned syllable regex"));
static TONE_DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[¹²³⁴⁵]+").expect("valid tone digits regex"));

/// Vowels in the order PFS prefers them as the tone carrier.
const TONE_CARRIERS: [char; 8] = ['o', 'e', 'a', 'u', 'i', 'ṳ', 'n', 'm'];

/// TH tone superscripts → PFS diacritic. `None` for contours PFS leaves alone.
fn pfs_mark(tone: &str) -> Option<&'static str> {
    match tone {
        "²⁴" => Some("\u{0302}"),
        "¹¹" => Some("\u{0300}"),
        "³¹" => Some("\u{0301}"),
        "⁵⁵" | "²" => Some(""),
        "⁵" => Some("\u{030D}"),
        _ => None,
    }
}

/// TH → PFS.
pub fn to_pfs(yin: &str) -> String {
    let consonants = yin
        .replace('t', "th")
        .replace('p', "ph")
        .replace('k', "kh")
        .replace('c', "chh")
        .replace('b', "p")
        .replace('d', "t")
        .replace('g', "k")
        .replace("nk", "ng")
        .replace('j', "ch")
        .replace('q', "chh")
        .replace('x', "s")
        .replace('z', "ch")
        .replace("ii", "ṳ")
        .replace("ua", "oa")
        .replace("ue", "oe");

    let s = WORD_INITIAL_I_RE.replace_all(&consonants, "y");
    let s = BARE_Y_RE.replace_all(&s, "yi$1");
    let s = CHECKED_IH_RE.replace_all(&s, "$1");
    let s = Y_NASAL_RE.replace_all(&s, "yi$1");

    let mut out = String::with_capacity(s.len() + 8);
    let mut last = 0;
    for m in TONED_SYLLABLE_RE.find_iter(&s) {
        out.push_str(&s[last..m.start()]);
        out.push_str(&mark_tone(m.as_str()));
        last = m.end();
    }
    out.push_str(&s[last..]);
    out.trim().to_string()
}

/// Replace one syllable's tone digits with a diacritic on its carrier vowel.
fn mark_tone(segment: &str) -> String {
    let Some(digits) = TONE_DIGITS_RE.find(segment) else {
        return segment.to_string();
    };
    let syllable = &segment[..digits.start()];
    let Some(mark) = pfs_mark(digits.as_str()) else {
        tracing::trace!(segment, "unknown Hakka tone contour");
        return segment.to_string();
    };

    TONE_CARRIERS
        .iter()
        .find_map(|&vowel| syllable.find(vowel).map(|at| at + vowel.len_utf8()))
        .map(|at| format!("{}{}{} ", &syllable[..at], mark, &syllable[at..]))
        .unwrap_or_else(|| segment.to_string())
}
