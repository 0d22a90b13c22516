//! Cross-reference augmentation
//!
//! Finds a compound's accession in a third registry (DrugBank by default) and
//! records it as a SourceLink. Two levels against the cross-reference registry:
//!
//! 1. Resolve the registry's internal source id for the target database, once
//!    per process, via [`SourceCatalogCache`].
//! 2. Query the mappings for the compound's standardized key and pick the
//!    target's accession.
//!
//! When that yields nothing, the primary source's own cross-reference fields
//! are consulted by registry id.

use crate::compound::{ResolvedCompound, SourceFailure, SourceLink};
use crate::config::CrossReferenceTarget;
use crate::sources::{CompoundSource, SourceCapability};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

/// Process-wide cache of the registry's internal id for the target database.
///
/// Populated at most once and never invalidated. Lookups that find nothing
/// leave it empty so a later request can try again.
#[derive(Debug, Default)]
pub struct SourceCatalogCache {
    source_id: OnceLock<String>,
}

impl SourceCatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&str> {
        self.source_id.get().map(String::as_str)
    }

    /// Store the id unless another request got there first; returns the kept value
    pub fn populate(&self, source_id: String) -> &str {
        self.source_id.get_or_init(|| source_id)
    }
}

pub struct CrossReferenceAugmenter {
    registry: Arc<dyn CompoundSource>,
    primary: Arc<dyn CompoundSource>,
    cache: Arc<SourceCatalogCache>,
    target: CrossReferenceTarget,
}

impl CrossReferenceAugmenter {
    pub fn new(
        registry: Arc<dyn CompoundSource>,
        primary: Arc<dyn CompoundSource>,
        cache: Arc<SourceCatalogCache>,
        target: CrossReferenceTarget,
    ) -> Self {
        Self {
            registry,
            primary,
            cache,
            target,
        }
    }

    pub fn target(&self) -> &CrossReferenceTarget {
        &self.target
    }

    /// Add the cross-reference link to `compound` when one can be found.
    ///
    /// Uses the compound's standardized key and registry id; returns true when
    /// a link was added. Source failures are appended to `compound.unavailable`.
    pub async fn augment(&self, compound: &mut ResolvedCompound) -> bool {
        let key = compound.inchi_key.clone();
        let registry_id = compound.registry_id.clone();
        if key.is_none() && registry_id.is_none() {
            return false;
        }

        let mut failures = Vec::new();
        let mut accession = None;

        if let Some(key) = key.as_deref() {
            accession = self.accession_by_key(key, &mut failures).await;
        }
        if accession.is_none() {
            if let Some(id) = registry_id.as_deref() {
                accession = self.accession_by_registry_id(id, &mut failures).await;
            }
        }

        compound.unavailable.extend(failures);

        match accession {
            Some(accession) => {
                let url = self.target.url_for(&accession);
                info!(
                    query = %compound.query,
                    link = %self.target.link_name,
                    accession = %accession,
                    "Cross-reference found"
                );
                compound
                    .sources
                    .add(SourceLink::new(self.target.link_name.clone(), url))
            }
            None => {
                debug!(query = %compound.query, link = %self.target.link_name, "No cross-reference found");
                false
            }
        }
    }

    /// Level 1: the registry's internal id for the target database
    async fn registry_source_id(&self, failures: &mut Vec<SourceFailure>) -> Option<String> {
        if let Some(id) = self.cache.get() {
            return Some(id.to_string());
        }
        if !self.registry.supports(SourceCapability::SourceCatalog) {
            return None;
        }

        let lookup = self.registry.source_catalog().await;
        failures.extend(lookup.failure(self.registry.source_name(), SourceCapability::SourceCatalog));

        let needle = self.target.catalog_match.to_lowercase();
        let entry = lookup
            .found()?
            .into_iter()
            .find(|entry| entry.name.to_lowercase().contains(&needle));

        match entry {
            Some(entry) => {
                debug!(source_id = %entry.source_id, name = %entry.name, "Registry source id resolved");
                Some(self.cache.populate(entry.source_id).to_string())
            }
            None => {
                debug!(catalog_match = %self.target.catalog_match, "Target not listed in registry catalog");
                None
            }
        }
    }

    /// Level 2: mappings for the standardized key
    async fn accession_by_key(&self, key: &str, failures: &mut Vec<SourceFailure>) -> Option<String> {
        let source_id = self.registry_source_id(failures).await?;
        if !self.registry.supports(SourceCapability::XrefByKey) {
            return None;
        }

        let lookup = self.registry.cross_references_by_key(key).await;
        failures.extend(lookup.failure(self.registry.source_name(), SourceCapability::XrefByKey));

        lookup
            .found()?
            .into_iter()
            .find(|xref| xref.source_id == source_id && !xref.accession.trim().is_empty())
            .map(|xref| xref.accession)
    }

    /// Fallback through the primary source's cross-reference fields
    async fn accession_by_registry_id(
        &self,
        registry_id: &str,
        failures: &mut Vec<SourceFailure>,
    ) -> Option<String> {
        let source = self.primary.source_name();

        if self.primary.supports(SourceCapability::XrefByField) {
            let lookup = self.primary.xref_field(registry_id, &self.target.link_name).await;
            failures.extend(lookup.failure(source, SourceCapability::XrefByField));
            let first = lookup
                .found()
                .and_then(|values| values.into_iter().find(|v| !v.trim().is_empty()));
            if first.is_some() {
                return first;
            }
        }

        if self.primary.supports(SourceCapability::XrefRegistryIds) {
            let lookup = self
                .primary
                .xref_registry_ids(registry_id, &self.target.link_name)
                .await;
            failures.extend(lookup.failure(source, SourceCapability::XrefRegistryIds));
            let prefix = self.target.accession_prefix.to_uppercase();
            return lookup
                .found()
                .and_then(|ids| ids.into_iter().find(|id| id.to_uppercase().starts_with(&prefix)));
        }

        None
    }
}
