//! Compound record types
//!
//! `ResolvedCompound` accumulates the output of a resolution run. Every field
//! is written at most once through [`fill_once`]; the first pipeline step that
//! produces a value owns it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fingerprint width used for similarity and exact-match comparison
pub const FINGERPRINT_BITS: usize = 2048;

/// Source name used for the link recorded when the caller supplied the structure
pub const USER_PROVIDED_SOURCE: &str = "User-provided";

/// Write `value` into `slot` only if the slot is still empty.
///
/// Returns true when the value was adopted.
pub fn fill_once<T>(slot: &mut Option<T>, value: Option<T>) -> bool {
    match (slot.is_none(), value) {
        (true, Some(v)) => {
            *slot = Some(v);
            true
        }
        _ => false,
    }
}

/// A record of which external source contributed data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLink {
    #[serde(rename = "db_name")]
    pub source: String,
    pub url: String,
}

impl SourceLink {
    pub fn new(source: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            url: url.into(),
        }
    }
}

/// Source links in discovery order, at most one per source name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceLinks(Vec<SourceLink>);

impl SourceLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a link unless one with the same source name is already present.
    ///
    /// Returns false when the link was a duplicate and ignored.
    pub fn add(&mut self, link: SourceLink) -> bool {
        if self.contains(&link.source) {
            return false;
        }
        self.0.push(link);
        true
    }

    pub fn contains(&self, source: &str) -> bool {
        self.0.iter().any(|l| l.source == source)
    }

    pub fn get(&self, source: &str) -> Option<&SourceLink> {
        self.0.iter().find(|l| l.source == source)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceLink> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<SourceLink> for SourceLinks {
    fn from_iter<I: IntoIterator<Item = SourceLink>>(iter: I) -> Self {
        let mut links = SourceLinks::new();
        for link in iter {
            links.add(link);
        }
        links
    }
}

/// Fixed-length fingerprint stored as a '0'/'1' bit-string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Accepts only non-empty strings made of '0' and '1'
    pub fn from_bit_string(bits: impl Into<String>) -> Option<Self> {
        let bits = bits.into();
        if bits.is_empty() || !bits.bytes().all(|b| b == b'0' || b == b'1') {
            return None;
        }
        Some(Self(bits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn count_ones(&self) -> usize {
        self.0.bytes().filter(|b| *b == b'1').count()
    }
}

/// Which pipeline step supplied the raw structure notation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureOrigin {
    UserProvided,
    PrimarySource,
    SecondarySource,
}

impl StructureOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            StructureOrigin::UserProvided => "user_provided",
            StructureOrigin::PrimarySource => "primary_source",
            StructureOrigin::SecondarySource => "secondary_source",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user_provided" => Some(StructureOrigin::UserProvided),
            "primary_source" => Some(StructureOrigin::PrimarySource),
            "secondary_source" => Some(StructureOrigin::SecondarySource),
            _ => None,
        }
    }
}

/// A source call that was downgraded to "unavailable" during resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub source: String,
    pub operation: String,
    pub reason: String,
}

/// The merged result of resolving one identifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedCompound {
    /// The identifier as the caller supplied it (trimmed)
    pub query: String,
    pub smiles_raw: Option<String>,
    pub smiles_normalized: Option<String>,
    #[serde(rename = "iupac_name")]
    pub systematic_name: Option<String>,
    pub common_name: Option<String>,
    #[serde(rename = "pubchem_cid")]
    pub registry_id: Option<String>,
    /// Canonical long-form structural identifier
    pub inchi: Option<String>,
    /// Standardized key (short structural hash)
    pub inchi_key: Option<String>,
    pub molecular_formula: Option<String>,
    pub molecular_weight: Option<f64>,
    pub fingerprint: Option<Fingerprint>,
    #[serde(rename = "structure_2d_svg")]
    pub structure_svg: Option<String>,
    pub sources: SourceLinks,
    pub structure_origin: Option<StructureOrigin>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unavailable: Vec<SourceFailure>,
}

impl ResolvedCompound {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn has_structure(&self) -> bool {
        self.smiles_raw.is_some()
    }

    /// Sources were found but no structure could be established
    pub fn is_link_only(&self) -> bool {
        !self.has_structure() && !self.sources.is_empty()
    }

    pub fn has_names(&self) -> bool {
        self.systematic_name.is_some() || self.common_name.is_some()
    }

    /// Best human-facing label
    pub fn display_name(&self) -> &str {
        self.common_name
            .as_deref()
            .or(self.systematic_name.as_deref())
            .unwrap_or(&self.query)
    }
}

/// A persisted compound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub compound_id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub compound: ResolvedCompound,
}
