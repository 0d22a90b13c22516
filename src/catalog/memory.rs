//! In-memory catalog

use super::{fold_name, matches_search, search_order, CompoundCatalog, DedupField, PurgeReport};
use crate::compound::{CatalogRecord, ResolvedCompound};
use crate::error::CatalogError;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local catalog. Records are kept in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    records: RwLock<Vec<CatalogRecord>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load records as-is, bypassing the key constraint (e.g. legacy data to purge)
    pub fn with_records(records: Vec<CatalogRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    pub async fn records(&self) -> Vec<CatalogRecord> {
        self.records.read().await.clone()
    }
}

fn field_matches(record: &CatalogRecord, field: DedupField, value: &str) -> bool {
    let c = &record.compound;
    match field {
        DedupField::InchiKey => c.inchi_key.as_deref() == Some(value),
        DedupField::SmilesNormalized => c.smiles_normalized.as_deref() == Some(value),
        DedupField::SmilesRaw => c.smiles_raw.as_deref() == Some(value),
        DedupField::CommonName => c.common_name.as_deref().map(fold_name).as_deref() == Some(value),
    }
}

#[async_trait]
impl CompoundCatalog for InMemoryCatalog {
    async fn find_by_exact(
        &self,
        field: DedupField,
        value: &str,
    ) -> Result<Option<CatalogRecord>, CatalogError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| field_matches(r, field, value))
            .min_by_key(|r| r.created_at)
            .cloned())
    }

    async fn insert(&self, compound: &ResolvedCompound) -> Result<CatalogRecord, CatalogError> {
        let mut records = self.records.write().await;

        // Checked under the write lock, mirroring the unique index
        if let Some(key) = compound.inchi_key.as_deref() {
            if records
                .iter()
                .any(|r| r.compound.inchi_key.as_deref() == Some(key))
            {
                return Err(CatalogError::Duplicate {
                    key: key.to_string(),
                });
            }
        }

        let record = CatalogRecord {
            compound_id: Uuid::new_v4(),
            created_at: Utc::now(),
            compound: compound.clone(),
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<CatalogRecord>, CatalogError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.compound_id == id).cloned())
    }

    async fn count(&self) -> Result<u64, CatalogError> {
        Ok(self.records.read().await.len() as u64)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<CatalogRecord>, CatalogError> {
        let needle = query.trim().to_lowercase();
        let records = self.records.read().await;
        let mut hits: Vec<CatalogRecord> = records
            .iter()
            .filter(|r| needle.is_empty() || matches_search(r, &needle))
            .cloned()
            .collect();
        hits.sort_by(search_order);
        hits.truncate(limit);
        Ok(hits)
    }

    async fn purge_duplicates(&self) -> Result<PurgeReport, CatalogError> {
        let mut records = self.records.write().await;

        let mut by_key: BTreeMap<String, Vec<(chrono::DateTime<Utc>, Uuid)>> = BTreeMap::new();
        for record in records.iter() {
            if let Some(key) = &record.compound.inchi_key {
                by_key
                    .entry(key.clone())
                    .or_default()
                    .push((record.created_at, record.compound_id));
            }
        }

        let mut report = PurgeReport::default();
        let mut doomed = HashSet::new();
        for (key, mut entries) in by_key {
            if entries.len() < 2 {
                continue;
            }
            entries.sort();
            report.duplicate_keys.push(key);
            for (_, id) in entries.into_iter().skip(1) {
                doomed.insert(id);
                report.removed.push(id);
            }
        }

        records.retain(|r| !doomed.contains(&r.compound_id));
        Ok(report)
    }
}
