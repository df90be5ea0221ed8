//! Reader's romanization preference per language.
//!
//! Stored values are strings: a system name (`"TL"`, `"WadeGiles"`), or
//! `<canonical>-<system>` (`"HanYu-TongYong"`, `"TL-DT"`) for a parallel
//! display that keeps the canonical reading as a second tier.

use dashmap::DashMap;
use serde::Serialize;
use std::fmt;

use super::System;
use crate::lang::Lang;

/// A parsed preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Preference {
    pub system: System,
    /// Show the canonical reading alongside the converted one.
    pub parallel: bool,
}

impl Preference {
    pub fn canonical(lang: Lang) -> Self {
        Self { system: System::canonical(lang), parallel: false }
    }

    /// Parse a stored value. Anything unknown falls back to the canonical system.
    pub fn parse(lang: Lang, raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
            return Self::canonical(lang);
        };
        let canonical = System::canonical(lang);
        let allowed = System::available(lang);

        let (system, parallel) = match raw.split_once('-') {
            Some((head, tail)) if head == canonical.name() => (System::from_name(tail), true),
            Some(_) => (None, false),
            None => (System::from_name(raw), false),
        };

        match system {
            Some(system) if allowed.contains(&system) && !(parallel && system == canonical) => {
                Self { system, parallel }
            }
            _ => {
                tracing::debug!(lang = %lang, value = raw, "unknown romanization preference, using canonical");
                Self::canonical(lang)
            }
        }
    }

    pub fn is_canonical(&self, lang: Lang) -> bool {
        self.system == System::canonical(lang)
    }

    /// Stored form for `lang`.
    pub fn to_value(&self, lang: Lang) -> String {
        if self.parallel {
            format!("{}-{}", System::canonical(lang).name(), self.system.name())
        } else {
            self.system.name().to_string()
        }
    }
}

impl fmt::Display for Preference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parallel {
            write!(f, "{} (parallel)", self.system)
        } else {
            write!(f, "{}", self.system)
        }
    }
}

/// Get/set access to stored preferences, keyed by language.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, lang: Lang) -> Option<String>;
    fn set(&self, lang: Lang, value: &str);

    /// The parsed preference for `lang`.
    fn preference(&self, lang: Lang) -> Preference {
        Preference::parse(lang, self.get(lang).as_deref())
    }
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: DashMap<Lang, String>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, lang: Lang) -> Option<String> {
        self.values.get(&lang).map(|v| v.value().clone())
    }

    fn set(&self, lang: Lang, value: &str) {
        self.values.insert(lang, value.to_string());
    }
}
