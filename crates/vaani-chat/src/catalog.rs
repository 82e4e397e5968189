//! Greeting, placeholder, and reply-pool lookup per language.
//!
//! `ResponseProvider` is the narrow contract the controller consumes.
//! `ResponseCatalog` implements it from TOML, either the catalog embedded in
//! the crate or a file supplied at runtime.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use vaani_core::error::{Result, VaaniError};
use vaani_core::LanguageCode;

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.toml");

/// Pure lookup from a language code to its canned text.
///
/// Every code returned by `languages()` must have a greeting, a placeholder,
/// and a non-empty reply pool.
pub trait ResponseProvider: Send + Sync {
    /// Supported codes, in presentation order.
    fn languages(&self) -> Vec<LanguageCode>;

    fn greeting_for(&self, code: &LanguageCode) -> Option<&str>;

    fn placeholder_for(&self, code: &LanguageCode) -> Option<&str>;

    fn replies_for(&self, code: &LanguageCode) -> Option<&[String]>;

    fn supports(&self, code: &LanguageCode) -> bool {
        self.greeting_for(code).is_some()
    }
}

/// Canned text for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageEntry {
    pub code: LanguageCode,
    /// Native-script name shown in a language picker.
    pub label: String,
    pub greeting: String,
    pub placeholder: String,
    pub replies: Vec<String>,
}

/// Ordered set of language entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseCatalog {
    #[serde(rename = "language", default)]
    entries: Vec<LanguageEntry>,
}

impl ResponseCatalog {
    /// Build a catalog from entries, validating it.
    pub fn new(entries: Vec<LanguageEntry>) -> Result<Self> {
        let catalog = Self { entries };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The catalog shipped with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    /// Parse and validate a TOML catalog.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let catalog: ResponseCatalog =
            toml::from_str(content).map_err(|e| VaaniError::Catalog(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a TOML catalog from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_toml_str(&content)?;
        tracing::info!(
            path = %path.display(),
            languages = catalog.entries.len(),
            "Response catalog loaded"
        );
        Ok(catalog)
    }

    /// Check the invariants uniform reply selection depends on.
    pub fn validate(&self) -> Result<()> {
        if self.entries.is_empty() {
            return Err(VaaniError::Catalog(
                "catalog must contain at least one language".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for entry in &self.entries {
            if !seen.insert(&entry.code) {
                return Err(VaaniError::Catalog(format!(
                    "duplicate language code: {}",
                    entry.code
                )));
            }
            if entry.greeting.trim().is_empty() {
                return Err(VaaniError::Catalog(format!(
                    "language {} has an empty greeting",
                    entry.code
                )));
            }
            if entry.replies.is_empty() {
                return Err(VaaniError::Catalog(format!(
                    "language {} has an empty reply pool",
                    entry.code
                )));
            }
        }
        Ok(())
    }

    pub fn entries(&self) -> &[LanguageEntry] {
        &self.entries
    }

    pub fn entry(&self, code: &LanguageCode) -> Option<&LanguageEntry> {
        self.entries.iter().find(|e| &e.code == code)
    }
}

impl ResponseProvider for ResponseCatalog {
    fn languages(&self) -> Vec<LanguageCode> {
        self.entries.iter().map(|e| e.code.clone()).collect()
    }

    fn greeting_for(&self, code: &LanguageCode) -> Option<&str> {
        self.entry(code).map(|e| e.greeting.as_str())
    }

    fn placeholder_for(&self, code: &LanguageCode) -> Option<&str> {
        self.entry(code).map(|e| e.placeholder.as_str())
    }

    fn replies_for(&self, code: &LanguageCode) -> Option<&[String]> {
        self.entry(code).map(|e| e.replies.as_slice())
    }
}
