//! Duplicate detection before storage
//!
//! The cascade compares a resolved compound against the catalog field by
//! field in [`DedupField::CASCADE`] order, exact matches only. The first hit
//! decides; empty fields are skipped.

use super::{CompoundCatalog, DedupField};
use crate::compound::{CatalogRecord, ResolvedCompound};
use crate::error::CatalogError;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// An existing record and the field it matched on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateMatch {
    pub record: CatalogRecord,
    pub matched_on: DedupField,
}

/// Outcome of `deduplicate_and_store`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StoreOutcome {
    /// Nothing was written; the catalog already holds this compound
    Existing {
        record: CatalogRecord,
        matched_on: DedupField,
    },
    Inserted(CatalogRecord),
}

impl StoreOutcome {
    pub fn record(&self) -> &CatalogRecord {
        match self {
            StoreOutcome::Existing { record, .. } => record,
            StoreOutcome::Inserted(record) => record,
        }
    }

    pub fn is_existing(&self) -> bool {
        matches!(self, StoreOutcome::Existing { .. })
    }
}

impl From<DuplicateMatch> for StoreOutcome {
    fn from(m: DuplicateMatch) -> Self {
        StoreOutcome::Existing {
            record: m.record,
            matched_on: m.matched_on,
        }
    }
}

pub struct DeduplicationEngine {
    catalog: Arc<dyn CompoundCatalog>,
}

impl DeduplicationEngine {
    pub fn new(catalog: Arc<dyn CompoundCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Arc<dyn CompoundCatalog> {
        &self.catalog
    }

    /// Run the cascade; `None` when every populated field misses
    pub async fn find_existing(
        &self,
        compound: &ResolvedCompound,
    ) -> Result<Option<DuplicateMatch>, CatalogError> {
        for field in DedupField::CASCADE {
            let Some(value) = field.value_of(compound) else {
                continue;
            };
            if let Some(record) = self.catalog.find_by_exact(field, &value).await? {
                debug!(
                    field = %field,
                    compound_id = %record.compound_id,
                    "Duplicate found"
                );
                return Ok(Some(DuplicateMatch {
                    record,
                    matched_on: field,
                }));
            }
        }
        Ok(None)
    }

    /// Store `compound` unless the catalog already holds it.
    ///
    /// A concurrent writer can insert the same key between the cascade and
    /// our insert; the key constraint rejects ours and the cascade is re-run
    /// to return the winner.
    pub async fn deduplicate_and_store(
        &self,
        compound: &ResolvedCompound,
    ) -> Result<StoreOutcome, CatalogError> {
        if let Some(existing) = self.find_existing(compound).await? {
            info!(
                query = %compound.query,
                matched_on = %existing.matched_on,
                compound_id = %existing.record.compound_id,
                "Compound already catalogued"
            );
            return Ok(existing.into());
        }

        match self.catalog.insert(compound).await {
            Ok(record) => {
                info!(
                    query = %compound.query,
                    compound_id = %record.compound_id,
                    "Compound catalogued"
                );
                Ok(StoreOutcome::Inserted(record))
            }
            Err(CatalogError::Duplicate { key }) => {
                debug!(key = %key, "Lost insert race, re-checking");
                match self.find_existing(compound).await? {
                    Some(existing) => Ok(existing.into()),
                    None => Err(CatalogError::Duplicate { key }),
                }
            }
            Err(e) => Err(e),
        }
    }
}
