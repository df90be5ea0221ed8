//! Minimal HTML text helpers
//!
//! Entry text carries a small, known set of inline tags (`<a>`, `<span>`,
//! `<br>`) and character references. These helpers cover exactly that.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static CHAR_REF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:#[xX]([0-9a-fA-F]+)|#([0-9]+)|(amp|lt|gt|quot|apos|nbsp));")
        .expect("valid char ref regex")
});

/// Remove every `<...>` tag.
pub fn strip_tags(text: &str) -> Cow<'_, str> {
    TAG_RE.replace_all(text, "")
}

/// Decode numeric character references and the few named ones entry text uses.
///
/// Unknown or invalid references are left as written.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    CHAR_REF_RE.replace_all(text, |caps: &regex::Captures<'_>| {
        let code = if let Some(hex) = caps.get(1) {
            u32::from_str_radix(hex.as_str(), 16).ok()
        } else if let Some(dec) = caps.get(2) {
            dec.as_str().parse::<u32>().ok()
        } else {
            match caps.get(3).map(|m| m.as_str()) {
                Some("amp") => Some(0x26),
                Some("lt") => Some(0x3C),
                Some("gt") => Some(0x3E),
                Some("quot") => Some(0x22),
                Some("apos") => Some(0x27),
                Some("nbsp") => Some(0xA0),
                _ => None,
            }
        };
        match code.and_then(char::from_u32) {
            Some(c) => c.to_string(),
            None => caps[0].to_string(),
        }
    })
}

/// Escape text for an HTML text node or a double-quoted attribute.
pub fn escape_text(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<a href=\"x\">萌</a><br>典"), "萌典");
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("&#x840C;&#20856;"), "萌典");
        assert_eq!(decode_entities("a&amp;b&nbsp;"), "a&b\u{A0}");
        assert_eq!(decode_entities("&#xZZ; &bogus;"), "&#xZZ; &bogus;");
        assert_eq!(decode_entities("&#xD800;"), "&#xD800;");
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a<b>\"c\"&"), "a&lt;b&gt;&quot;c&quot;&amp;");
        assert!(matches!(escape_text("萌"), Cow::Borrowed(_)));
    }
}
