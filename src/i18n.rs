//! Language handling: supported languages, text direction, string lookup and
//! the persisted language preference.
//!
//! Translation lookup is an explicit [`Locale`] value handed to whatever
//! renders text, never ambient global state. That keeps every renderer
//! testable with any language.
//!
//! ## Lookup order
//!
//! [`Locale::t`] returns the string for the locale's language, falling back
//! to the default language, and finally to the raw key itself:
//!
//! ```text
//! he["nav.label"]  →  en["nav.label"]  →  "nav.label"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LanguageError {
    #[error("unsupported language '{0}' (expected en or he)")]
    Unsupported(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    He,
}

/// Text direction for the `dir` HTML attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ltr,
    Rtl,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::He];

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::He => "he",
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            Language::En => Direction::Ltr,
            Language::He => Direction::Rtl,
        }
    }

    /// The other language of the pair.
    pub fn toggle(self) -> Self {
        match self {
            Language::En => Language::He,
            Language::He => Language::En,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = LanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "he" => Ok(Language::He),
            other => Err(LanguageError::Unsupported(other.to_string())),
        }
    }
}

// =============================================================================
// String catalog
// =============================================================================

/// Localized strings keyed by language, then by message key.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    strings: BTreeMap<Language, BTreeMap<String, String>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, language: Language, key: impl Into<String>, value: impl Into<String>) {
        self.strings
            .entry(language)
            .or_default()
            .insert(key.into(), value.into());
    }

    pub fn get(&self, language: Language, key: &str) -> Option<&str> {
        self.strings
            .get(&language)
            .and_then(|m| m.get(key))
            .map(String::as_str)
    }

    /// Strings used by the mirror fragment and the CLI.
    pub fn builtin() -> Self {
        let mut c = Self::new();
        c.insert(Language::En, "nav.label", "Main navigation");
        c.insert(Language::He, "nav.label", "ניווט ראשי");
        c.insert(Language::En, "menu.empty", "No menu items");
        c.insert(Language::He, "menu.empty", "אין פריטי תפריט");
        c.insert(Language::En, "language.name", "English");
        c.insert(Language::He, "language.name", "עברית");
        c
    }
}

/// Rendering context: which language to show and where to look strings up.
#[derive(Debug, Clone, Copy)]
pub struct Locale<'a> {
    pub language: Language,
    pub default: Language,
    catalog: &'a Catalog,
}

impl<'a> Locale<'a> {
    pub fn new(language: Language, default: Language, catalog: &'a Catalog) -> Self {
        Self {
            language,
            default,
            catalog,
        }
    }

    pub fn direction(&self) -> Direction {
        self.language.direction()
    }

    /// Look up `key`, falling back to the default language, then to `key`.
    pub fn t<'k>(&self, key: &'k str) -> &'k str
    where
        'a: 'k,
    {
        self.catalog
            .get(self.language, key)
            .or_else(|| self.catalog.get(self.default, key))
            .unwrap_or(key)
    }
}

// =============================================================================
// Persisted preference
// =============================================================================

/// The operator's chosen UI language, stored as a single word in a file.
#[derive(Debug, Clone)]
pub struct LanguagePreference {
    path: PathBuf,
}

impl LanguagePreference {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored language. A missing or unreadable file, or an
    /// unsupported value, yields `default`.
    pub fn load(&self, default: Language) -> Language {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(default)
    }

    pub fn save(&self, language: Language) -> Result<(), LanguageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, format!("{}\n", language.code()))?;
        Ok(())
    }

    /// Flip the stored language and return the new value.
    pub fn toggle(&self, default: Language) -> Result<Language, LanguageError> {
        let next = self.load(default).toggle();
        self.save(next)?;
        Ok(next)
    }
}
