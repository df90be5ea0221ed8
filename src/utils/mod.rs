//! Utility modules shared by the decoding and annotation passes
//!
//! - Text: lazily compiled statics, guarded regex replacement (the regex
//!   crate has no lookahead)
//! - HTML: character references, tag stripping, text escaping

pub mod html;
pub mod text;

// Re-export commonly used helpers
pub use html::{decode_entities, escape_text, strip_tags};
pub use text::{replace_first, replace_guarded};
pub(crate) use text::static_regex;
