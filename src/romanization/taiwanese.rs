//! Taiwanese romanization: Tâi-lô → Pe̍h-ōe-jī (POJ) and Daighi (DT).
//!
//! Input syllables are joined with U+2011 (non-breaking hyphen) by the
//! caller. Word characters are ASCII `[[:word:]]`; combining tone marks are
//! not, so a syllable's marks sit between its letters and the next separator.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::ConvertContext;
use crate::utils::{replace_guarded, static_regex};

static_regex! {
    // POJ
    POJ_OO_RE = r"(?i)(o)([^.!?,[:word:]\s\x{2011}]*)o";
    POJ_UA_RE = r"u([^[:word:]\s\x{2011}.!?,-]*)a";
    POJ_UE_RE = r"u([^[:word:]\s\x{2011}.!?,-]*)e";
    POJ_IK_RE = r"i([^[:word:]\s\x{2011}.!?,-]*)k($|[-\x{2011}\s])";
    POJ_ING_RE = r"i([^[:word:]\s\x{2011}.!?,-]*)ng";
    POJ_NN_RE = r"nn($|[-\x{2011}\s])";
    POJ_NNH_RE = r"nnh($|[-\x{2011}\s])";
    POJ_IR_RE = r"([ie])r";
    POJ_SPLIT_RE = r"[- \x{2011}.,!?]";
    POJ_TONE_RE = r"[\x{0300}-\x{0302}\x{0304}\x{0306}\x{0307}\x{030D}]";

    // DT consonants: aspirated → plain → voiced, lower case then capitalised
    DT_PH_RE = r"ph([[:word:]])";
    DT_B_RE = r"b([[:word:]])";
    DT_P_RE = r"p([[:word:]])";
    DT_PH_TMP_RE = r"PH([[:word:]])";
    DT_TH_RE = r"th([[:word:]])";
    DT_T_RE = r"t([[:word:]])";
    DT_TH_TMP_RE = r"TH([[:word:]])";
    DT_KH_RE = r"kh([[:word:]])";
    DT_G_RE = r"g([[:word:]])";
    DT_K_RE = r"k([[:word:]])";
    DT_KH_TMP_RE = r"KH([[:word:]])";
    DT_CAP_PH_RE = r"Ph([[:word:]])";
    DT_CAP_B_RE = r"B([[:word:]])";
    DT_CAP_P_RE = r"P([[:word:]])";
    DT_CAP_PH_TMP_RE = r"pH([[:word:]])";
    DT_CAP_TH_RE = r"Th([[:word:]])";
    DT_CAP_T_RE = r"T([[:word:]])";
    DT_CAP_TH_TMP_RE = r"tH([[:word:]])";
    DT_CAP_KH_RE = r"Kh([[:word:]])";
    DT_CAP_G_RE = r"G([[:word:]])";
    DT_CAP_K_RE = r"K([[:word:]])";
    DT_CAP_KH_TMP_RE = r"kH([[:word:]])";

    // DT vowels
    DT_OO_RE = r"o([^.!?,[:word:]\s\x{2011}]*)o";
    DT_O_RE = r"o([^.!?,[:word:]\s\x{2011}]*)";
    DT_OO_TMP_RE = r"O([^[:word:]\s\x{2011}]*)O";
    DT_CAP_OO_RE = r"O([^.!?,[:word:]\s\x{2011}]*)o([^.!?,[:word:]\s\x{2011}]*)r?";
    DT_TONE_RE = r"[\x{0300}-\x{0302}\x{0304}\x{0307}\x{030D}]";
    DT_CHECKED_RE = r"([aeiou])(r?[ptkh])";
    DT_DOUBLE_HYPHEN_RE = r"[-\x{2011}][-\x{2011}]([aeiou])";
    DT_DOUBLE_HYPHEN_MACRON_RE = r"[-\x{2011}][-\x{2011}](ā|a\x{0304}|ō|o\x{0304}|ī|i\x{0304}|ē|e\x{0304}|ū|u\x{0304})";
    DT_NN_RE = r"nn($|[-\s])";

    // DT sandhi
    DT_BODY_GROUP_RE = r"((?:[^.,!?]*(?:[[:word:]][^-.,!?[:word:]\s\x{2011}]*)[- \x{2011}])+)([[:word:]])";
    DT_RUBY_GROUP_RE = r"((?:\S*(?:[[:word:]][^[:word:]\s\x{2011}]*)\x{2011})+)([[:word:]])";
    DT_SEGMENT_SPLIT_RE = r"[- \x{2011}.,!?]";
    DT_PARTICLE_MID_RE = r"\x{0332}([[:word:]]*[ \x{2011}]a[ -\x{2011}])";
    DT_PARTICLE_LOW_RE = r"\x{0300}([[:word:]]*[ \x{2011}]a[ -\x{2011}])";
    WORD_RE = r"[[:word:]]";
    SANDHI_CHECKED_RE = r"(?i)[aeiou]r?[hptk]";
    SANDHI_MARK_RE = r"[\x{0300}\x{0332}\x{0306}\x{0304}]";
    SANDHI_VOWEL_RE = r"(?i)[aioue]";
    SANDHI_NASAL_RE = r"(?i)[nm]";
    SANDHI_MID_STOP_RE = r"(?i)[aeiou]\x{0304}r?[ptk]";
    SANDHI_MID_H_RE = r"(?i)[aeiou]\x{0304}r?h";
}

// ============================================================================
// POJ
// ============================================================================

/// Tâi-lô → POJ.
pub fn to_poj(yin: &str) -> String {
    let mut s = POJ_OO_RE.replace_all(yin, "$1$2\u{0358}").into_owned();
    s = s.replace("ts", "ch").replace("Ts", "Ch");
    s = POJ_UA_RE.replace_all(&s, "o${1}a").into_owned();
    s = POJ_UE_RE.replace_all(&s, "o${1}e").into_owned();
    s = POJ_IK_RE.replace_all(&s, "e${1}k$2").into_owned();
    s = POJ_ING_RE.replace_all(&s, "e${1}ng").into_owned();
    s = POJ_NN_RE.replace_all(&s, "\u{207F}$1").into_owned();
    s = POJ_NNH_RE.replace_all(&s, "h\u{207F}$1").into_owned();
    s = POJ_IR_RE.replace_all(&s, "$1\u{0358}").into_owned();
    s = s.replace('\u{030B}', "\u{0306}");

    map_segments(&POJ_SPLIT_RE, &s, relocate_poj_tone)
}

/// Move a syllable's tone mark onto the vowel POJ writes it on.
fn relocate_poj_tone(segment: &str) -> String {
    let Some(tone) = POJ_TONE_RE.find(segment).map(|m| m.as_str().to_string()) else {
        return segment.to_string();
    };
    let bare = POJ_TONE_RE.replace_all(segment, "").into_owned();

    // (needle, offset after which the mark goes)
    let anchor = find_after(&bare, "oa", |next| "inht".contains(next))
        .or_else(|| find_after(&bare, "oe", |next| next == 'h'))
        .or_else(|| find_ignore_case(&bare, "o").map(|at| at + 1))
        .or_else(|| find_ignore_case(&bare, "e").map(|at| at + 1))
        .or_else(|| find_ignore_case(&bare, "a").map(|at| at + 1))
        .or_else(|| find_ignore_case(&bare, "u").map(|at| at + 1))
        .or_else(|| find_ignore_case(&bare, "i").map(|at| at + 1))
        .or_else(|| find_ignore_case(&bare, "ng").map(|at| at + 1))
        .or_else(|| find_ignore_case(&bare, "m").map(|at| at + 1));

    match anchor {
        Some(at) => format!("{}{}{}", &bare[..at], tone, &bare[at..]),
        None => bare + &tone,
    }
}

/// Char-boundary offsets where ASCII `needle` occurs, ignoring ASCII case.
fn matches_ignore_case<'a>(text: &'a str, needle: &'a str) -> impl Iterator<Item = usize> + 'a {
    text.char_indices().map(|(at, _)| at).filter(move |&at| {
        text.as_bytes()
            .get(at..at + needle.len())
            .is_some_and(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
    })
}

fn find_ignore_case(text: &str, needle: &str) -> Option<usize> {
    matches_ignore_case(text, needle).next()
}

/// Offset just past `needle` where the next char, lower-cased, satisfies `next`.
fn find_after(text: &str, needle: &str, next: impl Fn(char) -> bool) -> Option<usize> {
    matches_ignore_case(text, needle)
        .map(|at| at + needle.len())
        .find(|&end| text[end..].chars().next().is_some_and(|c| next(c.to_ascii_lowercase())))
}

// ============================================================================
// DT
// ============================================================================

/// Citation-tone mark substitution, TL mark → DT mark.
fn dt_tone(mark: char) -> &'static str {
    match mark {
        '\u{0300}' => "\u{0332}",
        '\u{0301}' => "\u{0300}",
        '\u{0302}' => "\u{0306}",
        '\u{0304}' => "\u{0304}",
        '\u{0305}' => "\u{0305}",
        '\u{0306}' => "\u{0301}",
        '\u{0307}' | '\u{030D}' => "\u{200B}",
        _ => "",
    }
}

/// Sandhi-tone mark substitution, keyed by the DT citation mark.
fn dt_sandhi_tone(mark: char) -> Option<&'static str> {
    match mark {
        '\u{0300}' => Some(""),
        '\u{0332}' => Some("\u{0300}"),
        '\u{0306}' => Some("\u{0304}"),
        '\u{0304}' => Some("\u{0332}"),
        _ => None,
    }
}

/// Tâi-lô → DT, then tone sandhi over each breath group.
pub fn to_daighi(yin: &str, context: ConvertContext) -> String {
    let mut s = swap_initials(yin);
    s = swap_vowels(&s);

    s = DT_TONE_RE
        .replace_all(&s, |caps: &Captures<'_>| {
            caps[0].chars().next().map_or("", dt_tone).to_string()
        })
        .into_owned();
    s = DT_CHECKED_RE.replace_all(&s, "$1\u{0304}$2").into_owned();
    s = s.replace('\u{200B}', "");

    // `--` before a toneless vowel: the neutral tone ring.
    s = replace_guarded(&DT_DOUBLE_HYPHEN_RE, &s, |caps, rest| {
        let marked = rest.starts_with(['\u{0300}', '\u{0332}', '\u{0306}', '\u{0304}']);
        (!marked).then(|| format!("{}\u{030A}", &caps[1]))
    });
    s = DT_DOUBLE_HYPHEN_MACRON_RE
        .replace_all(&s, |caps: &Captures<'_>| {
            let vowel = strip_macron(&caps[1]);
            format!("\u{2011}\u{2011}{}\u{030A}", vowel)
        })
        .into_owned();
    s = DT_NN_RE.replace_all(&s, "\u{207F}$1").into_owned();

    s = match context {
        ConvertContext::Body => DT_BODY_GROUP_RE
            .replace_all(&s, |caps: &Captures<'_>| {
                format!("{}{}", map_segments(&DT_SEGMENT_SPLIT_RE, &caps[1], sandhi), &caps[2])
            })
            .into_owned(),
        ConvertContext::Ruby => DT_RUBY_GROUP_RE
            .replace_all(&s, |caps: &Captures<'_>| {
                let prefix: Vec<String> = caps[1].split('\u{2011}').map(sandhi).collect();
                format!("{}{}", prefix.join("\u{2011}"), &caps[2])
            })
            .into_owned(),
    };

    // Before the particle `a`: low becomes mid, high falling loses its mark.
    s = DT_PARTICLE_MID_RE.replace_all(&s, "\u{0304}$1").into_owned();
    DT_PARTICLE_LOW_RE.replace_all(&s, "$1").into_owned()
}

fn strip_macron(vowel: &str) -> char {
    match vowel.chars().next() {
        Some('ā') => 'a',
        Some('ō') => 'o',
        Some('ī') => 'i',
        Some('ē') => 'e',
        Some('ū') => 'u',
        Some(c) => c,
        None => 'a',
    }
}

/// DT voicing alternation: TL aspirated → DT plain, plain → voiced,
/// voiced → `bh`/`gh`. Upper-case placeholders keep the swaps from chaining.
fn swap_initials(yin: &str) -> String {
    let steps: [(&Lazy<Regex>, &str); 22] = [
        (&DT_PH_RE, "PH$1"),
        (&DT_B_RE, "bh$1"),
        (&DT_P_RE, "b$1"),
        (&DT_PH_TMP_RE, "p$1"),
        (&DT_TH_RE, "TH$1"),
        (&DT_T_RE, "d$1"),
        (&DT_TH_TMP_RE, "t$1"),
        (&DT_KH_RE, "KH$1"),
        (&DT_G_RE, "gh$1"),
        (&DT_K_RE, "g$1"),
        (&DT_KH_TMP_RE, "k$1"),
        (&DT_CAP_PH_RE, "pH$1"),
        (&DT_CAP_B_RE, "Bh$1"),
        (&DT_CAP_P_RE, "B$1"),
        (&DT_CAP_PH_TMP_RE, "P$1"),
        (&DT_CAP_TH_RE, "tH$1"),
        (&DT_CAP_T_RE, "D$1"),
        (&DT_CAP_TH_TMP_RE, "T$1"),
        (&DT_CAP_KH_RE, "kH$1"),
        (&DT_CAP_G_RE, "Gh$1"),
        (&DT_CAP_K_RE, "G$1"),
        (&DT_CAP_KH_TMP_RE, "K$1"),
    ];

    // Affricates first, so the `t` swaps never see them.
    let mut s = yin
        .replace("tsh", "c")
        .replace("ts", "z")
        .replace("Tsh", "C")
        .replace("Ts", "Z")
        .replace('j', "r")
        .replace('J', "R");
    for (re, rep) in steps {
        s = re.replace_all(&s, rep).into_owned();
    }
    s
}

/// `oo` → `o`, lone `o` → `or` unless a nasal/velar coda follows.
fn swap_vowels(s: &str) -> String {
    let s = DT_OO_RE.replace_all(s, "O${1}O").into_owned();
    let s = replace_guarded(&DT_O_RE, &s, |caps, rest| {
        let coda = rest
            .trim_start_matches(|c: char| !c.is_ascii_alphanumeric() && c != '_' && !c.is_whitespace() && c != '\u{2011}')
            .starts_with(['k', 'n', 'm']);
        (!coda).then(|| format!("o{}r", &caps[1]))
    });
    let s = DT_OO_TMP_RE.replace_all(&s, "o$1").into_owned();
    DT_CAP_OO_RE.replace_all(&s, "O$1$2").into_owned()
}

/// Sandhi for one non-final syllable.
fn sandhi(segment: &str) -> String {
    if !WORD_RE.is_match(segment) {
        return segment.to_string();
    }
    if SANDHI_CHECKED_RE.is_match(segment) {
        return insert_after_first(&SANDHI_VOWEL_RE, segment, "\u{0332}");
    }
    if !SANDHI_MARK_RE.is_match(segment) {
        // Syllabic nasals carry the mark themselves.
        let re = if SANDHI_VOWEL_RE.is_match(segment) { &SANDHI_VOWEL_RE } else { &SANDHI_NASAL_RE };
        return insert_after_first(re, segment, "\u{0304}");
    }
    if SANDHI_MID_STOP_RE.is_match(segment) {
        return segment.replace('\u{0304}', "");
    }
    if SANDHI_MID_H_RE.is_match(segment) {
        return segment.replace('\u{0304}', "\u{0300}");
    }
    segment
        .chars()
        .map(|c| dt_sandhi_tone(c).map_or_else(|| c.to_string(), str::to_string))
        .collect()
}

fn insert_after_first(re: &Regex, text: &str, mark: &str) -> String {
    match re.find(text) {
        Some(m) => format!("{}{}{}", &text[..m.end()], mark, &text[m.end()..]),
        None => text.to_string(),
    }
}

/// Apply `f` to the text between separators, keeping the separators.
fn map_segments(separators: &Regex, text: &str, f: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut last = 0;
    for m in separators.find_iter(text) {
        out.push_str(&f(&text[last..m.start()]));
        out.push_str(m.as_str());
        last = m.end();
    }
    out.push_str(&f(&text[last..]));
    out
}
