//! Compound catalog
//!
//! Storage behind the deduplication engine. Two implementations:
//! - [`InMemoryCatalog`]: process-local, for tests and dry runs
//! - `PgCatalog` (feature `database`): Postgres via sqlx
//!
//! Both enforce uniqueness of the standardized key and report a conflicting
//! insert as [`CatalogError::Duplicate`].

pub mod dedup;
pub mod memory;
#[cfg(feature = "database")]
pub mod postgres;

pub use dedup::{DeduplicationEngine, DuplicateMatch, StoreOutcome};
pub use memory::InMemoryCatalog;
#[cfg(feature = "database")]
pub use postgres::PgCatalog;

use crate::compound::{CatalogRecord, ResolvedCompound};
use crate::error::CatalogError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

/// Fields compared by the duplicate cascade, in cascade order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupField {
    InchiKey,
    SmilesNormalized,
    SmilesRaw,
    CommonName,
}

impl DedupField {
    /// Priority order; the first field that matches decides
    pub const CASCADE: [DedupField; 4] = [
        DedupField::InchiKey,
        DedupField::SmilesNormalized,
        DedupField::SmilesRaw,
        DedupField::CommonName,
    ];

    /// Comparison value for `compound`, or None when the field is empty.
    /// Common names are case folded.
    pub fn value_of(&self, compound: &ResolvedCompound) -> Option<String> {
        let raw = match self {
            DedupField::InchiKey => compound.inchi_key.as_deref(),
            DedupField::SmilesNormalized => compound.smiles_normalized.as_deref(),
            DedupField::SmilesRaw => compound.smiles_raw.as_deref(),
            DedupField::CommonName => compound.common_name.as_deref(),
        }?;
        if raw.is_empty() {
            return None;
        }
        Some(match self {
            DedupField::CommonName => fold_name(raw),
            _ => raw.to_string(),
        })
    }
}

impl std::fmt::Display for DedupField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DedupField::InchiKey => write!(f, "inchi_key"),
            DedupField::SmilesNormalized => write!(f, "smiles_normalized"),
            DedupField::SmilesRaw => write!(f, "smiles_raw"),
            DedupField::CommonName => write!(f, "common_name"),
        }
    }
}

/// Case folding for name comparison: NFKC, then lowercase
pub fn fold_name(name: &str) -> String {
    name.nfkc().collect::<String>().to_lowercase()
}

/// Result of a duplicate purge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeReport {
    /// Keys that had more than one record
    pub duplicate_keys: Vec<String>,
    /// Records deleted; the earliest record per key is kept
    pub removed: Vec<Uuid>,
}

impl PurgeReport {
    pub fn is_clean(&self) -> bool {
        self.duplicate_keys.is_empty()
    }
}

/// Persistent compound storage
#[async_trait]
pub trait CompoundCatalog: Send + Sync {
    /// Earliest record whose `field` equals `value` exactly.
    ///
    /// For [`DedupField::CommonName`] `value` must already be folded with
    /// [`fold_name`]; it is compared against the folded stored name.
    async fn find_by_exact(
        &self,
        field: DedupField,
        value: &str,
    ) -> Result<Option<CatalogRecord>, CatalogError>;

    /// Persist a compound. `CatalogError::Duplicate` when its key is taken.
    async fn insert(&self, compound: &ResolvedCompound) -> Result<CatalogRecord, CatalogError>;

    async fn get(&self, id: Uuid) -> Result<Option<CatalogRecord>, CatalogError>;

    async fn count(&self) -> Result<u64, CatalogError>;

    /// Case-insensitive substring search over names, structure notations,
    /// key and formula, ordered by common name then systematic name.
    /// An empty query lists everything.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<CatalogRecord>, CatalogError>;

    /// Keep the earliest record per standardized key and delete the rest
    async fn purge_duplicates(&self) -> Result<PurgeReport, CatalogError>;
}

/// Whether `record` matches a lowercased search needle
pub(crate) fn matches_search(record: &CatalogRecord, needle: &str) -> bool {
    let c = &record.compound;
    [
        &c.systematic_name,
        &c.common_name,
        &c.smiles_normalized,
        &c.smiles_raw,
        &c.inchi_key,
        &c.molecular_formula,
    ]
    .into_iter()
    .flatten()
    .any(|value| value.to_lowercase().contains(needle))
}

/// Ordering used by `search`: common name, then systematic name, case-insensitive, nulls last
pub(crate) fn search_order(a: &CatalogRecord, b: &CatalogRecord) -> std::cmp::Ordering {
    fn key(value: &Option<String>) -> (bool, String) {
        match value {
            Some(v) => (false, v.to_lowercase()),
            None => (true, String::new()),
        }
    }
    key(&a.compound.common_name)
        .cmp(&key(&b.compound.common_name))
        .then_with(|| key(&a.compound.systematic_name).cmp(&key(&b.compound.systematic_name)))
        .then_with(|| a.created_at.cmp(&b.created_at))
}
