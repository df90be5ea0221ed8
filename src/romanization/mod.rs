//! Romanization conversion.
//!
//! Each language family has a canonical system that readings are stored in
//! (HanYu pinyin, Tâi-lô, Taiwan Hakka) and alternatives the reader may pick:
//! - `mandarin`: TongYong, Wade-Giles, GuoYin (MPS II) by syllable table
//! - `taiwanese`: POJ and Daighi (DT), including DT tone sandhi
//! - `hakka`: Pha̍k-fa-sṳ
//! - `bopomofo`: Tâi-lô → Taiwanese phonetic symbols
//! - `preference`: stored per-language choice

pub mod bopomofo;
pub mod hakka;
pub mod mandarin;
pub mod preference;
pub mod taiwanese;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::lang::Lang;

pub use bopomofo::trs_to_bopomofo;
pub use preference::{MemoryPreferences, Preference, PreferenceStore};

/// A romanization system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum System {
    HanYu,
    TongYong,
    WadeGiles,
    GuoYin,
    #[serde(rename = "TL")]
    Tailo,
    #[serde(rename = "POJ")]
    Poj,
    #[serde(rename = "DT")]
    Daighi,
    #[serde(rename = "TH")]
    TaiwanHakka,
    #[serde(rename = "PFS")]
    PhakFaSu,
}

impl System {
    pub fn name(self) -> &'static str {
        match self {
            System::HanYu => "HanYu",
            System::TongYong => "TongYong",
            System::WadeGiles => "WadeGiles",
            System::GuoYin => "GuoYin",
            System::Tailo => "TL",
            System::Poj => "POJ",
            System::Daighi => "DT",
            System::TaiwanHakka => "TH",
            System::PhakFaSu => "PFS",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "HanYu" => System::HanYu,
            "TongYong" => System::TongYong,
            "WadeGiles" => System::WadeGiles,
            "GuoYin" => System::GuoYin,
            "TL" => System::Tailo,
            "POJ" => System::Poj,
            "DT" => System::Daighi,
            "TH" => System::TaiwanHakka,
            "PFS" => System::PhakFaSu,
            _ => return None,
        })
    }

    /// The system readings of `lang` are stored in.
    pub fn canonical(lang: Lang) -> Self {
        match lang {
            Lang::Mandarin | Lang::CrossStrait => System::HanYu,
            Lang::Taiwanese => System::Tailo,
            Lang::Hakka => System::TaiwanHakka,
        }
    }

    /// Systems a reader may select for `lang`, canonical first.
    pub fn available(lang: Lang) -> &'static [System] {
        match lang {
            Lang::Mandarin => &[System::HanYu, System::TongYong, System::WadeGiles, System::GuoYin],
            Lang::Taiwanese => &[System::Tailo, System::Poj, System::Daighi],
            Lang::Hakka => &[System::TaiwanHakka, System::PhakFaSu],
            Lang::CrossStrait => &[System::HanYu],
        }
    }
}

impl fmt::Display for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a converted reading is shown; DT sandhi groups differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertContext {
    /// Running text: breath groups end at punctuation.
    Body,
    /// A single ruby annotation: only `‑`-joined syllables form a group.
    Ruby,
}

/// Convert a canonical `reading` of `lang` into `system`.
///
/// The canonical system, and any system that does not belong to `lang`,
/// return the input unchanged. Syllables a table does not know pass through.
pub fn convert(lang: Lang, reading: &str, system: System, context: ConvertContext) -> String {
    if system == System::canonical(lang) || !System::available(lang).contains(&system) {
        return reading.to_string();
    }

    let yin = reading.replace('-', "\u{2011}");
    if yin.is_empty() {
        return yin;
    }

    match system {
        System::TongYong | System::WadeGiles | System::GuoYin => mandarin::convert(&yin, system),
        System::Poj => taiwanese::to_poj(&yin),
        System::Daighi => taiwanese::to_daighi(&yin, context),
        System::PhakFaSu => hakka::to_pfs(&yin),
        System::HanYu | System::Tailo | System::TaiwanHakka => yin,
    }
}
