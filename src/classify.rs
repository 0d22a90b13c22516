//! Identifier classification
//!
//! Decides which resolution path an incoming identifier takes. Classification
//! is total: anything that is neither a standardized key nor a registry number
//! is treated as free text that may also be a structure notation.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Shape of a standardized structural key (InChIKey): 14-10-1 uppercase letters
const STANDARD_KEY_PATTERN: &str = r"^[A-Z]{14}-[A-Z]{10}-[A-Z]$";

fn standard_key_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(STANDARD_KEY_PATTERN).expect("static pattern compiles"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    StandardizedKey,
    RegistryNumber,
    FreeTextOrStructure,
}

impl std::fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StandardizedKey => write!(f, "standardized-key"),
            Self::RegistryNumber => write!(f, "registry-number"),
            Self::FreeTextOrStructure => write!(f, "free-text"),
        }
    }
}

/// An identifier together with the shape it was recognised as
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedIdentifier {
    kind: IdentifierKind,
    text: String,
}

impl ClassifiedIdentifier {
    pub fn kind(&self) -> IdentifierKind {
        self.kind
    }

    /// The trimmed identifier text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The text when it is a standardized key
    pub fn standardized_key(&self) -> Option<&str> {
        (self.kind == IdentifierKind::StandardizedKey).then_some(self.text.as_str())
    }

    /// The text when it is a registry number
    pub fn registry_number(&self) -> Option<&str> {
        (self.kind == IdentifierKind::RegistryNumber).then_some(self.text.as_str())
    }
}

pub fn looks_like_standardized_key(text: &str) -> bool {
    standard_key_regex().is_match(text.trim())
}

pub fn looks_like_registry_number(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

/// Classify raw input. Never fails.
pub fn classify(text: &str) -> ClassifiedIdentifier {
    let trimmed = text.trim();
    let kind = if looks_like_standardized_key(trimmed) {
        IdentifierKind::StandardizedKey
    } else if looks_like_registry_number(trimmed) {
        IdentifierKind::RegistryNumber
    } else {
        IdentifierKind::FreeTextOrStructure
    };

    ClassifiedIdentifier {
        kind,
        text: trimmed.to_string(),
    }
}
