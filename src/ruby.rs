//! Ruby trees and the right-angle renderer.
//!
//! The annotator produces a [`RubyTree`]: base graphemes plus ordered tiers
//! of syllables. [`render`] pairs them into a flat [`HRuby`] where every
//! base (or merged run of bases) carries its own annotation, so each tier
//! can be styled on its own.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::fmt::Write as _;

use crate::utils::{decode_entities, escape_text};

/// Style given to the copied-through `<rt>` so the text stays selectable.
pub const HIDDEN_RT_STYLE: &str = "text-indent: -9999px; color: transparent";

static TONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\x{02D9}\x{02CA}\x{02C5}\x{02C7}\x{02CB}\x{02EA}\x{02EB}]|[\x{31B4}-\x{31B7}][\x{0307}\x{0358}\x{030D}]?")
        .expect("valid tone regex")
});

static FORM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^\x{02D9}?",
        r"([\x{3105}-\x{3119}\x{312A}-\x{312C}\x{31A0}-\x{31A3}])?",
        r"([\x{3127}-\x{3129}])?",
        r"([\x{311A}-\x{3129}\x{312D}\x{31A4}-\x{31B3}\x{31B8}-\x{31BA}])?",
        r"([\x{02D9}\x{02CA}\x{02C5}\x{02C7}\x{02CB}\x{02EA}\x{02EB}]|[\x{31B4}-\x{31B7}][\x{0307}\x{0358}\x{030D}]?)?$",
    ))
    .expect("valid form regex")
});

static MARKED_VOWEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[aeiou][\x{0307}\x{030D}\x{0358}]").expect("valid marked vowel regex"));

// ============================================================================
// Intermediate tree
// ============================================================================

/// One base grapheme, optionally linked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Base {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl Base {
    pub fn new(text: impl Into<String>, href: Option<String>) -> Self {
        Self { text: text.into(), href }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TierKind {
    Zhuyin,
    Romanization,
}

impl TierKind {
    fn class(self) -> &'static str {
        match self {
            TierKind::Zhuyin => "zhuyin",
            TierKind::Romanization => "romanization",
        }
    }
}

/// A tier syllable and the number of bases it declares to cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Syllable {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<usize>,
}

impl Syllable {
    pub fn new(text: impl Into<String>, span: Option<usize>) -> Self {
        Self { text: text.into(), span }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tier {
    pub kind: TierKind,
    pub syllables: Vec<Syllable>,
}

/// Bases plus annotation tiers, before alignment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RubyTree {
    pub bases: Vec<Base>,
    pub tiers: Vec<Tier>,
}

impl RubyTree {
    pub fn romanization_tiers(&self) -> impl Iterator<Item = &Tier> {
        self.tiers.iter().filter(|t| t.kind == TierKind::Romanization)
    }

    /// Rewrite the first romanization tier with `convert`.
    ///
    /// With `parallel`, the unconverted tier is kept right after it as a
    /// second romanization tier.
    pub fn convert_romanization(&self, convert: impl Fn(&str) -> String, parallel: bool) -> RubyTree {
        let mut tree = self.clone();
        let Some(pos) = tree.tiers.iter().position(|t| t.kind == TierKind::Romanization) else {
            return tree;
        };

        let original = tree.tiers[pos].clone();
        for syllable in &mut tree.tiers[pos].syllables {
            syllable.text = convert(&syllable.text);
        }
        if parallel {
            tree.tiers.insert(pos + 1, original);
        }
        tree
    }

    /// Nested `<rb>`/`<rtc>` markup with every tier hidden.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        for base in &self.bases {
            write_base(&mut out, base);
        }
        for tier in &self.tiers {
            let _ = write!(out, r#"<rtc class="{}" hidden="hidden">"#, tier.kind.class());
            for syllable in &tier.syllables {
                match syllable.span {
                    Some(span) => {
                        let _ = write!(out, r#"<rt rbspan="{}">"#, span);
                    }
                    None => out.push_str("<rt>"),
                }
                out.push_str(&escape_text(&syllable.text));
                out.push_str("</rt>");
            }
            out.push_str("</rtc>");
        }
        out
    }
}

// ============================================================================
// Rendered tree
// ============================================================================

/// A base merged with its zhuyin reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZhuyinUnit {
    pub bases: SmallVec<[Base; 2]>,
    pub zhuyin: String,
    /// Reading without tone marks.
    pub yin: String,
    /// Canonical tone glyph.
    pub diao: String,
    pub length: usize,
    /// Initial/medial/final shape, e.g. `SJY`.
    pub form: String,
}

/// Bases covered by one romanization syllable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationGroup {
    pub order: usize,
    pub span: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_span: Option<usize>,
    pub text: String,
    /// `text` with dotted/marked vowels folded into private-use codepoints.
    pub annotation: String,
    pub children: Vec<RubyNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RubyNode {
    Base(Base),
    Zhuyin(ZhuyinUnit),
    Group(Box<AnnotationGroup>),
}

impl RubyNode {
    /// Number of base graphemes under this node.
    pub fn span(&self) -> usize {
        match self {
            RubyNode::Base(_) => 1,
            RubyNode::Zhuyin(unit) => unit.bases.len(),
            RubyNode::Group(group) => group.span,
        }
    }

    fn into_bases(self) -> Vec<Base> {
        match self {
            RubyNode::Base(base) => vec![base],
            RubyNode::Zhuyin(unit) => unit.bases.into_vec(),
            RubyNode::Group(group) => group.children.into_iter().flat_map(RubyNode::into_bases).collect(),
        }
    }
}

/// Flattened right-angle ruby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HRuby {
    pub class: &'static str,
    pub nodes: Vec<RubyNode>,
}

impl HRuby {
    /// Groups produced by the first romanization tier, in document order.
    pub fn base_groups(&self) -> Vec<&AnnotationGroup> {
        fn collect<'a>(nodes: &'a [RubyNode], out: &mut Vec<&'a AnnotationGroup>) {
            for node in nodes {
                if let RubyNode::Group(group) = node {
                    if group.order == 0 {
                        out.push(group);
                    } else {
                        collect(&group.children, out);
                    }
                }
            }
        }
        let mut out = Vec::new();
        collect(&self.nodes, &mut out);
        out
    }

    pub fn to_markup(&self) -> String {
        let mut out = format!(r#"<hruby class="{c}" {c}="{c}">"#, c = self.class);
        for node in &self.nodes {
            write_node(&mut out, node, self.class);
        }
        out.push_str("</hruby>");
        out
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Align every tier of `tree` to its bases.
///
/// Never fails: trailing syllables with nothing left to cover are dropped,
/// trailing bases with no syllable stay unannotated.
pub fn render(tree: &RubyTree) -> HRuby {
    let bases: Vec<Base> = tree
        .bases
        .iter()
        .map(|b| Base {
            text: decode_entities(&b.text).into_owned(),
            href: b.href.clone(),
        })
        .collect();
    let max_span = bases.len();

    let zhuyin = tree.tiers.iter().find(|t| t.kind == TierKind::Zhuyin);
    let (mut queue, unpaired) = merge_zhuyin(bases, zhuyin);

    let mut nodes: Vec<RubyNode> = Vec::new();
    for (order, tier) in tree.romanization_tiers().enumerate() {
        if order == 0 {
            nodes = group_first_tier(&mut queue, tier, max_span);
        } else {
            wrap_tier(&mut nodes, tier, order);
        }
    }
    nodes.extend(queue);
    nodes.extend(unpaired.into_iter().map(RubyNode::Base));

    HRuby { class: "rightangle", nodes }
}

/// Pass 0: pair bases with zhuyin syllables, left to right.
///
/// Returns the units tier 0 may consume and the bases left without a zhuyin
/// syllable. A tree with no zhuyin syllables at all offers every base as a
/// unit of its own.
fn merge_zhuyin(bases: Vec<Base>, zhuyin: Option<&Tier>) -> (VecDeque<RubyNode>, Vec<Base>) {
    let syllables = zhuyin.map(|t| t.syllables.as_slice()).unwrap_or_default();
    if syllables.is_empty() {
        return (bases.into_iter().map(RubyNode::Base).collect(), Vec::new());
    }

    let mut queue = VecDeque::with_capacity(syllables.len());
    let mut bases = bases.into_iter().peekable();
    for syllable in syllables {
        if bases.peek().is_none() {
            break;
        }
        let take = syllable.span.unwrap_or(1).max(1);
        let unit_bases: SmallVec<[Base; 2]> = bases.by_ref().take(take).collect();
        queue.push_back(RubyNode::Zhuyin(zhuyin_unit(unit_bases, &decode_entities(&syllable.text))));
    }
    (queue, bases.collect())
}

fn zhuyin_unit(bases: SmallVec<[Base; 2]>, zhuyin: &str) -> ZhuyinUnit {
    let yin = TONE_RE.replace_all(zhuyin, "").into_owned();
    let diao = zhuyin
        .replacen(yin.as_str(), "", 1)
        .replace('\u{02C5}', "\u{02C7}")
        .replace('\u{030D}', "\u{0358}")
        .replace('\u{0358}', "\u{0307}");

    let form = match FORM_RE.captures(zhuyin) {
        Some(caps) => [(1, 'S'), (2, 'J'), (3, 'Y')]
            .iter()
            .filter(|(i, _)| caps.get(*i).is_some())
            .map(|(_, letter)| *letter)
            .collect(),
        None => zhuyin.to_string(),
    };

    ZhuyinUnit {
        bases,
        zhuyin: zhuyin.to_string(),
        length: yin.chars().count(),
        yin,
        diao,
        form,
    }
}

/// Tier 0: consume queued units until each syllable's declared span is met.
fn group_first_tier(queue: &mut VecDeque<RubyNode>, tier: &Tier, max_span: usize) -> Vec<RubyNode> {
    let mut nodes = Vec::new();

    for syllable in &tier.syllables {
        if queue.is_empty() {
            break;
        }
        let declared = syllable.span.unwrap_or(1).min(max_span);

        let mut taken: Vec<RubyNode> = Vec::new();
        let mut covered = 0;
        while covered < declared {
            let Some(unit) = queue.pop_front() else { break };
            covered += unit.span();
            taken.push(unit);
        }
        if taken.is_empty() {
            continue;
        }

        if declared < covered {
            if taken.len() > 1 {
                // Only one merged unit is ever re-split; the run stays unannotated.
                tracing::debug!(syllable = %syllable.text, declared, covered, "refusing multi-unit split");
                nodes.extend(taken);
                continue;
            }
            let mut split = taken.pop().map(RubyNode::into_bases).unwrap_or_default();
            let tail = split.split_off(declared);
            for base in tail.into_iter().rev() {
                queue.push_front(RubyNode::Base(base));
            }
            taken = split.into_iter().map(RubyNode::Base).collect();
            covered = declared;
        }

        nodes.push(group_node(0, covered, syllable, taken));
    }

    nodes
}

/// Tier k > 0: wrap the k-th tier's syllable around tier 0's group at the
/// same position.
fn wrap_tier(nodes: &mut [RubyNode], tier: &Tier, order: usize) {
    for (idx, syllable) in tier.syllables.iter().enumerate() {
        let mut n = idx;
        let Some(target) = find_base_group(nodes, &mut n) else { break };
        let inner = std::mem::replace(target, RubyNode::Base(Base::default()));
        let span = inner.span();
        *target = group_node(order, span, syllable, vec![inner]);
    }
}

fn find_base_group<'a>(nodes: &'a mut [RubyNode], n: &mut usize) -> Option<&'a mut RubyNode> {
    for node in nodes.iter_mut() {
        let order = match node {
            RubyNode::Group(group) => group.order,
            _ => continue,
        };
        if order == 0 {
            if *n == 0 {
                return Some(node);
            }
            *n -= 1;
        } else if let RubyNode::Group(group) = node {
            if let Some(found) = find_base_group(&mut group.children, n) {
                return Some(found);
            }
        }
    }
    None
}

fn group_node(order: usize, span: usize, syllable: &Syllable, children: Vec<RubyNode>) -> RubyNode {
    let text = decode_entities(&syllable.text).into_owned();
    RubyNode::Group(Box::new(AnnotationGroup {
        order,
        span,
        declared_span: syllable.span,
        annotation: fold_marked_vowels(&text),
        text,
        children,
    }))
}

/// Replace `a`/`e`/`i`/`o`/`u` + dot/vertical-line mark with U+F0061.. so
/// annotations can be matched regardless of those marks.
pub fn fold_marked_vowels(text: &str) -> String {
    MARKED_VOWEL_RE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let vowel = caps[0].chars().next().map_or(0, u32::from);
            char::from_u32(0xF0000 + vowel).map(String::from).unwrap_or_default()
        })
        .into_owned()
}

// ============================================================================
// Markup
// ============================================================================

fn write_base(out: &mut String, base: &Base) {
    out.push_str("<rb>");
    match &base.href {
        Some(href) => {
            let _ = write!(out, r#"<a href="{}">{}</a>"#, escape_text(href), escape_text(&base.text));
        }
        None => out.push_str(&escape_text(&base.text)),
    }
    out.push_str("</rb>");
}

fn write_node(out: &mut String, node: &RubyNode, class: &str) {
    match node {
        RubyNode::Base(base) => write_base(out, base),
        RubyNode::Zhuyin(unit) => {
            let _ = write!(
                out,
                r#"<ru zhuyin="" diao="{}" length="{}" form="{}">"#,
                escape_text(&unit.diao),
                unit.length,
                escape_text(&unit.form)
            );
            for base in &unit.bases {
                write_base(out, base);
            }
            let _ = write!(
                out,
                "<zhuyin><yin>{}</yin><diao>{}</diao></zhuyin></ru>",
                escape_text(&unit.yin),
                escape_text(&unit.diao)
            );
        }
        RubyNode::Group(group) => {
            let _ = write!(
                out,
                r#"<ru span="{}" order="{}" class="{}" annotation="{}">"#,
                group.span,
                group.order,
                class,
                escape_text(&group.annotation)
            );
            for child in &group.children {
                write_node(out, child, class);
            }
            out.push_str("<rt");
            if let Some(span) = group.declared_span {
                let _ = write!(out, r#" rbspan="{}""#, span);
            }
            let _ = write!(out, r#" style="{}">{}</rt></ru>"#, HIDDEN_RT_STYLE, escape_text(&group.text));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn bases(text: &str) -> Vec<Base> {
        text.chars().map(|c| Base::new(c.to_string(), None)).collect()
    }

    fn tier(kind: TierKind, syllables: &[(&str, Option<usize>)]) -> Tier {
        Tier {
            kind,
            syllables: syllables.iter().map(|(t, s)| Syllable::new(*t, *s)).collect(),
        }
    }

    fn top_spans(hruby: &HRuby) -> Vec<usize> {
        hruby.base_groups().iter().map(|g| g.span).collect()
    }

    #[test]
    fn test_zhuyin_unit_shape() {
        let unit = zhuyin_unit(SmallVec::new(), "ㄇㄥˊ");
        assert_eq!(unit.yin, "ㄇㄥ");
        assert_eq!(unit.diao, "ˊ");
        assert_eq!(unit.length, 2);
        assert_eq!(unit.form, "SY");

        let unit = zhuyin_unit(SmallVec::new(), "ㄧㄠˇ");
        assert_eq!(unit.form, "JY");

        let unit = zhuyin_unit(SmallVec::new(), "˙ㄉㄜ");
        assert_eq!(unit.yin, "ㄉㄜ");
        assert_eq!(unit.diao, "˙");
    }

    #[test]
    fn test_checked_tone_diao_is_canonicalised() {
        let unit = zhuyin_unit(SmallVec::new(), "ㄒㄧㆷ\u{030D}");
        assert_eq!(unit.yin, "ㄒㄧ");
        assert_eq!(unit.diao, "ㆷ\u{0307}");
    }

    #[test]
    fn test_unmatched_form_keeps_reading() {
        let unit = zhuyin_unit(SmallVec::new(), "abc");
        assert_eq!(unit.form, "abc");
    }

    #[test]
    fn test_spans_follow_declared_spans() {
        let tree = RubyTree {
            bases: bases("一塊兒"),
            tiers: vec![
                tier(TierKind::Zhuyin, &[("ㄧˊ", None), ("ㄎㄨㄞˋ", None), ("ㄦ", None)]),
                tier(TierKind::Romanization, &[("yí", Some(1)), ("kuàir", Some(2))]),
            ],
        };
        let hruby = render(&tree);
        assert_eq!(top_spans(&hruby), vec![1, 2]);
        assert_eq!(hruby.nodes.len(), 2);
    }

    #[test]
    fn test_trailing_mismatch_is_tolerated() {
        let tree = RubyTree {
            bases: bases("萌典"),
            tiers: vec![tier(
                TierKind::Romanization,
                &[("méng", None), ("diǎn", None), ("extra", None)],
            )],
        };
        let hruby = render(&tree);
        assert_eq!(top_spans(&hruby), vec![1, 1]);

        let tree = RubyTree {
            bases: bases("萌典"),
            tiers: vec![tier(TierKind::Romanization, &[("méng", None)])],
        };
        let hruby = render(&tree);
        assert_eq!(top_spans(&hruby), vec![1]);
        assert!(matches!(hruby.nodes[1], RubyNode::Base(_)));
    }

    #[test]
    fn test_bases_past_last_zhuyin_stay_unannotated() {
        let tree = RubyTree {
            bases: bases("萌典型"),
            tiers: vec![
                tier(TierKind::Zhuyin, &[("ㄇㄥˊ", None), ("ㄉㄧㄢˇ", None)]),
                tier(TierKind::Romanization, &[("méng", Some(1)), ("diǎnxíng", Some(2))]),
            ],
        };
        let hruby = render(&tree);
        assert_eq!(top_spans(&hruby), vec![1, 1]);
        assert_eq!(hruby.nodes.len(), 3);
        assert!(matches!(&hruby.nodes[2], RubyNode::Base(b) if b.text == "型"));

        let markup = hruby.to_markup();
        assert_eq!(markup.matches("<rt").count(), 2);
        assert!(markup.ends_with("</ru><rb>型</rb></hruby>"), "{}", markup);
    }

    #[test]
    fn test_extra_syllables_do_not_claim_bases_without_zhuyin() {
        let tree = RubyTree {
            bases: bases("萌典型"),
            tiers: vec![
                tier(TierKind::Zhuyin, &[("ㄇㄥˊ", None)]),
                tier(TierKind::Romanization, &[("méng", None), ("diǎn", None), ("xíng", None)]),
            ],
        };
        let hruby = render(&tree);
        assert_eq!(top_spans(&hruby), vec![1]);
        assert!(hruby.nodes[1..].iter().all(|n| matches!(n, RubyNode::Base(_))));
        assert_eq!(hruby.nodes.len(), 3);
    }

    #[test]
    fn test_refuses_to_split_more_than_one_unit() {
        // Zhuyin merges 典型 into one unit; a declared span of 2 would need
        // the single-base unit plus half of the merged one.
        let tree = RubyTree {
            bases: bases("萌典型"),
            tiers: vec![
                tier(TierKind::Zhuyin, &[("ㄇㄥˊ", None), ("ㄉㄧㄢˇ", Some(2))]),
                tier(TierKind::Romanization, &[("méngdiǎn", Some(2)), ("xíng", Some(1))]),
            ],
        };
        let hruby = render(&tree);
        assert!(hruby.base_groups().is_empty());
        assert_eq!(hruby.nodes.len(), 2);
        assert!(hruby.nodes.iter().all(|n| matches!(n, RubyNode::Zhuyin(_))));
    }

    #[test]
    fn test_single_unit_is_resplit() {
        let tree = RubyTree {
            bases: bases("萌典"),
            tiers: vec![
                tier(TierKind::Zhuyin, &[("ㄇㄥˊ", Some(2))]),
                tier(TierKind::Romanization, &[("méng", Some(1)), ("diǎn", Some(1))]),
            ],
        };
        let hruby = render(&tree);
        assert_eq!(top_spans(&hruby), vec![1, 1]);
        let groups = hruby.base_groups();
        assert!(matches!(&groups[1].children[0], RubyNode::Base(b) if b.text == "典"));
    }

    #[test]
    fn test_second_tier_wraps_first_tier_groups() {
        let tree = RubyTree {
            bases: bases("萌典"),
            tiers: vec![
                tier(TierKind::Romanization, &[("méng", None), ("diǎn", None)]),
                tier(TierKind::Romanization, &[("meng2", None), ("dian3", None)]),
            ],
        };
        let hruby = render(&tree);
        assert_eq!(hruby.nodes.len(), 2);
        match &hruby.nodes[0] {
            RubyNode::Group(outer) => {
                assert_eq!(outer.order, 1);
                assert_eq!(outer.text, "meng2");
                assert_eq!(outer.span, 1);
                assert!(matches!(&outer.children[0], RubyNode::Group(g) if g.order == 0 && g.text == "méng"));
            }
            other => panic!("expected group, got {:?}", other),
        }
        assert_eq!(top_spans(&hruby), vec![1, 1]);
    }

    #[test]
    fn test_markup_and_numeric_refs() {
        let tree = RubyTree {
            bases: vec![Base::new("&#x840C;", Some("./#%E8%90%8C".into()))],
            tiers: vec![
                tier(TierKind::Zhuyin, &[("ㄇㄥˊ", None)]),
                tier(TierKind::Romanization, &[("méng", Some(1))]),
            ],
        };
        let markup = render(&tree).to_markup();
        assert_eq!(
            markup,
            concat!(
                r#"<hruby class="rightangle" rightangle="rightangle">"#,
                r#"<ru span="1" order="0" class="rightangle" annotation="méng">"#,
                r#"<ru zhuyin="" diao="ˊ" length="2" form="SY"><rb><a href="./#%E8%90%8C">萌</a></rb>"#,
                r#"<zhuyin><yin>ㄇㄥ</yin><diao>ˊ</diao></zhuyin></ru>"#,
                r#"<rt rbspan="1" style="text-indent: -9999px; color: transparent">méng</rt></ru></hruby>"#,
            )
        );
    }

    #[test]
    fn test_fold_marked_vowels() {
        assert_eq!(fold_marked_vowels("o\u{0358}"), "\u{F006F}");
        assert_eq!(fold_marked_vowels("tsia\u{030D}h"), "tsi\u{F0061}h");
        assert_eq!(fold_marked_vowels("méng"), "méng");
    }

    #[test]
    fn test_intermediate_markup() {
        let tree = RubyTree {
            bases: bases("兒"),
            tiers: vec![
                tier(TierKind::Zhuyin, &[("ㄦˊ", None)]),
                tier(TierKind::Romanization, &[("ér", Some(1))]),
            ],
        };
        assert_eq!(
            tree.to_markup(),
            concat!(
                "<rb>兒</rb>",
                r#"<rtc class="zhuyin" hidden="hidden"><rt>ㄦˊ</rt></rtc>"#,
                r#"<rtc class="romanization" hidden="hidden"><rt rbspan="1">ér</rt></rtc>"#,
            )
        );
    }

    #[test]
    fn test_convert_romanization_parallel() {
        let tree = RubyTree {
            bases: bases("萌"),
            tiers: vec![tier(TierKind::Romanization, &[("méng", None)])],
        };
        let converted = tree.convert_romanization(|s| s.to_uppercase(), true);
        assert_eq!(converted.tiers.len(), 2);
        assert_eq!(converted.tiers[0].syllables[0].text, "MÉNG");
        assert_eq!(converted.tiers[1].syllables[0].text, "méng");
    }

    proptest! {
        #[test]
        fn prop_first_tier_spans_cover_all_bases(spans in prop::collection::vec(1usize..4, 1..8)) {
            let total: usize = spans.iter().sum();
            let text: String = std::iter::repeat('字').take(total).collect();
            let zhuyin: Vec<(&str, Option<usize>)> = (0..total).map(|_| ("ㄗˋ", None)).collect();
            let roman: Vec<(&str, Option<usize>)> = spans.iter().map(|s| ("zi", Some(*s))).collect();
            let tree = RubyTree {
                bases: bases(&text),
                tiers: vec![tier(TierKind::Zhuyin, &zhuyin), tier(TierKind::Romanization, &roman)],
            };
            let hruby = render(&tree);
            prop_assert_eq!(top_spans(&hruby).iter().sum::<usize>(), total);
            prop_assert_eq!(hruby.nodes.len(), spans.len());
        }
    }
}
