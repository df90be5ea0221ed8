//! Inline cross-reference markup in definition text.
//!
//! Source text marks a link as `` `text~ ``. A link may sit directly after an
//! opening bracket and/or be followed by a run of closing punctuation; those
//! flanks stay outside the anchor, inside a `punct` span. Two definition
//! level forms precede link expansion: the discrimination chain
//! (`` `辨~⃞&nbsp`似~⃞ ``) and the note glyph (`` `X~⃞ ``), both of which take
//! their text from the definition that follows.

use crate::lang::Lang;
use crate::record::schema::Definition;

const OPEN: [char; 5] = ['「', '【', '『', '（', '《'];
const CLOSE: [char; 16] = [
    '。', '，', '、', '；', '：', '？', '！', '─', '…', '．', '·', '－', '」', '』', '》', '〉',
];

const NOTE_GLYPH: char = '\u{20DE}';
const DISCRIMINATION_CHAIN: &str = "`辨~\u{20DE}&nbsp`似~\u{20DE}";
const ZWSP: char = '\u{200B}';

// ============================================================================
// Definition-level collapsing
// ============================================================================

/// What a definition's `def` text says about its successor.
enum Head {
    Chain,
    Note(char),
}

fn classify(def: &str) -> Option<Head> {
    if def == DISCRIMINATION_CHAIN {
        return Some(Head::Chain);
    }
    let mut chars = def.chars();
    match (chars.next(), chars.next(), chars.next(), chars.next(), chars.next()) {
        (Some('`'), Some(c), Some('~'), Some(NOTE_GLYPH), None) => Some(Head::Note(c)),
        _ => None,
    }
}

/// Text of `def` before its first full-width parenthesis.
fn referenced_text(def: &str) -> &str {
    def.split('（').next().unwrap_or("")
}

/// Merge note/discrimination heads into the definition that follows them.
///
/// The merged definition keeps the follower's fields and nothing of the
/// head, part-of-speech tag included. A head whose follower has no
/// referenced text is left as is.
pub fn collapse_note_chains(defs: &mut Vec<Definition>) {
    let mut i = 0;
    while i + 1 < defs.len() {
        let label = match classify(&defs[i].def) {
            Some(Head::Chain) => format!("辨{g} 似{g} ", g = NOTE_GLYPH),
            Some(Head::Note(c)) => format!("{}{} ", c, NOTE_GLYPH),
            None => {
                i += 1;
                continue;
            }
        };

        let referenced = referenced_text(&defs[i + 1].def);
        if referenced.is_empty() {
            i += 1;
            continue;
        }

        let merged_def = format!("{}{}", label, referenced);
        defs.remove(i);
        defs[i].def = merged_def;
        i += 1;
    }
}

// ============================================================================
// Link tokens
// ============================================================================

/// Expand every `` `text~ `` token into an anchor to `./#<prefix><text>`.
pub fn expand_links(text: &str, lang: Lang) -> String {
    if !text.contains('`') {
        return text.to_string();
    }

    let prefix = lang.hash_prefix();
    let mut out = String::with_capacity(text.len() + 32);
    // Byte offset in `out` of a raw opening bracket that may flank the next token.
    let mut pending_open: Option<(usize, char)> = None;
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        if c == '`' {
            let body = &rest[1..];
            if let Some(end) = body.find('~').filter(|&end| end > 0) {
                let target = &body[..end];
                let after = &body[end + 1..];
                let close_len: usize = after
                    .chars()
                    .take_while(|c| CLOSE.contains(c))
                    .map(char::len_utf8)
                    .sum();
                let close = &after[..close_len];

                let open = pending_open.take().map(|(at, open)| {
                    out.truncate(at);
                    open
                });

                let anchor = format!(r#"<a href="./#{}{}">{}</a>"#, prefix, target, target);
                if open.is_some() || !close.is_empty() {
                    out.push_str(r#"<span class="punct">"#);
                    if let Some(open) = open {
                        out.push(open);
                    }
                    out.push_str(&anchor);
                    out.push_str(close);
                    out.push_str("</span>");
                } else {
                    out.push_str(&anchor);
                }

                rest = &after[close_len..];
                continue;
            }
        }

        pending_open = OPEN.contains(&c).then(|| (out.len(), c));
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    out
}

/// Add a zero-width space after closing parentheses in text (not inside
/// tags) and collapse the `./##` artifact of doubled hash prefixes.
pub fn insert_wrap_markers(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut in_tag = false;
    for c in text.chars() {
        out.push(c);
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            ')' | '）' if !in_tag => out.push(ZWSP),
            _ => {}
        }
    }
    if out.contains("./##") {
        out = out.replace("./##", "./#");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn def(f: &str) -> Definition {
        Definition { def: f.into(), ..Default::default() }
    }

    #[test]
    fn test_bracketed_link_keeps_flanks_outside_anchor() {
        assert_eq!(
            expand_links("「`大~」", Lang::Mandarin),
            r#"<span class="punct">「<a href="./#大">大</a>」</span>"#
        );
    }

    #[test]
    fn test_link_variants() {
        assert_eq!(expand_links("見`萌~", Lang::Mandarin), r#"見<a href="./#萌">萌</a>"#);
        assert_eq!(
            expand_links("`食~。", Lang::Taiwanese),
            r#"<span class="punct"><a href="./#'食">食</a>。</span>"#
        );
        assert_eq!(
            expand_links("《`詩經~", Lang::Hakka),
            r#"<span class="punct">《<a href="./#:詩經">詩經</a></span>"#
        );
        assert_eq!(
            expand_links("`甲~、`乙~", Lang::CrossStrait),
            r#"<span class="punct"><a href="./#~甲">甲</a>、</span><a href="./#~乙">乙</a>"#
        );
    }

    #[test]
    fn test_unterminated_token_left_alone() {
        assert_eq!(expand_links("a`b", Lang::Mandarin), "a`b");
        assert_eq!(expand_links("`~x", Lang::Mandarin), "`~x");
    }

    #[test]
    fn test_wrap_markers_skip_tags() {
        assert_eq!(insert_wrap_markers("（文）a"), "（文）\u{200B}a");
        assert_eq!(insert_wrap_markers("(變)"), "(變)\u{200B}");
        assert_eq!(insert_wrap_markers(r#"<a href="./##x">x</a>"#), r#"<a href="./#x">x</a>"#);
        assert_eq!(insert_wrap_markers("<b title=\")\">"), "<b title=\")\">");
    }

    #[test]
    fn test_note_glyph_collapses_into_next() {
        let mut defs = vec![def("`注~\u{20DE}"), def("參見某條（舊）。")];
        collapse_note_chains(&mut defs);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].def, "注\u{20DE} 參見某條");
    }

    #[test]
    fn test_discrimination_chain_collapses() {
        let mut defs = vec![
            Definition { part_of_speech: Some("名".into()), ..def(DISCRIMINATION_CHAIN) },
            def("「甲」與「乙」有別（說明）"),
            def("其他"),
        ];
        collapse_note_chains(&mut defs);
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].def, "辨\u{20DE} 似\u{20DE} 「甲」與「乙」有別");
        // The head's tag does not carry over to an untagged follower.
        assert_eq!(defs[0].part_of_speech, None);
        assert_eq!(defs[1].def, "其他");
    }

    #[test]
    fn test_collapse_keeps_follower_tag() {
        let mut defs = vec![
            Definition { part_of_speech: Some("名".into()), ..def("`注~\u{20DE}") },
            Definition { part_of_speech: Some("動".into()), ..def("參見某條") },
        ];
        collapse_note_chains(&mut defs);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].part_of_speech.as_deref(), Some("動"));
    }

    #[test]
    fn test_head_without_referenced_text_is_kept() {
        let mut defs = vec![def("`注~\u{20DE}"), def("（僅括號）")];
        collapse_note_chains(&mut defs);
        assert_eq!(defs.len(), 2);
    }
}
