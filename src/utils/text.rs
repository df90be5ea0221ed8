//! Regex replacement helpers
//!
//! Several romanization rules only apply when the text after a match does
//! (or does not) look a certain way. The regex crate has no lookaround, so
//! those rules match first and let a guard inspect the remainder.

use regex::{Captures, Regex};

/// Declare `static NAME: Lazy<Regex>` items, each compiled on first use.
macro_rules! static_regex {
    ($($name:ident = $pattern:expr;)+) => {
        $(static $name: ::once_cell::sync::Lazy<::regex::Regex> = ::once_cell::sync::Lazy::new(|| {
            ::regex::Regex::new($pattern).expect(concat!("valid ", stringify!($name), " regex"))
        });)+
    };
}
pub(crate) use static_regex;

/// Replace every match of `re` with the output of `rep`.
///
/// `rep` receives the captures and the haystack remainder after the match.
/// Returning `None` keeps the matched text unchanged.
pub fn replace_guarded<F>(re: &Regex, haystack: &str, mut rep: F) -> String
where
    F: FnMut(&Captures<'_>, &str) -> Option<String>,
{
    let mut out = String::with_capacity(haystack.len());
    let mut last = 0;
    for caps in re.captures_iter(haystack) {
        let Some(m) = caps.get(0) else { continue };
        out.push_str(&haystack[last..m.start()]);
        match rep(&caps, &haystack[m.end()..]) {
            Some(replacement) => out.push_str(&replacement),
            None => out.push_str(m.as_str()),
        }
        last = m.end();
    }
    out.push_str(&haystack[last..]);
    out
}

/// Replace only the first match, expanding `$n` references.
pub fn replace_first(re: &Regex, haystack: &str, rep: &str) -> String {
    re.replacen(haystack, 1, rep).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    static_regex! {
        DIGITS_RE = r"\d+";
        SYLLABLE_RE = r"[a-z]+\d";
    }

    #[test]
    fn test_static_regex_declares_each_pattern() {
        assert_eq!(DIGITS_RE.find("ngai11").map(|m| m.as_str()), Some("11"));
        assert!(SYLLABLE_RE.is_match("siid5"));
    }

    #[test]
    fn test_guard_rejects_keep_match() {
        let re = Regex::new("o").unwrap();
        let out = replace_guarded(&re, "ok on", |_, rest| {
            (!rest.starts_with('n')).then(|| "O".to_string())
        });
        assert_eq!(out, "Ok on");
    }

    #[test]
    fn test_replace_first_only() {
        let re = Regex::new("a").unwrap();
        assert_eq!(replace_first(&re, "aaa", "b"), "baa");
    }
}
