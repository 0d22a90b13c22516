//! CompoundSource trait and related types
//!
//! The core abstraction for external knowledge sources. Adapters expose a
//! subset of [`SourceCapability`]; callers check `supports` before calling.

use crate::compound::SourceFailure;
use crate::error::SourceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Operations a source may provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceCapability {
    /// Resolve a registry id from a free-text name
    IdByName,
    /// Resolve a registry id from a standardized key
    IdByKey,
    /// Fetch a structure notation by registry id
    StructureById,
    /// Fetch systematic/common names by registry id
    NamesById,
    /// Fetch the standardized key by registry id
    KeyById,
    /// Look up a structure notation directly from a name
    StructureByName,
    /// List the registries the source cross-references
    SourceCatalog,
    /// Cross-reference mappings for a standardized key
    XrefByKey,
    /// Accessions from a dedicated cross-reference field, by registry id
    XrefByField,
    /// Free-form registry id list filtered by a source name, by registry id
    XrefRegistryIds,
}

impl std::fmt::Display for SourceCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IdByName => write!(f, "id-by-name"),
            Self::IdByKey => write!(f, "id-by-key"),
            Self::StructureById => write!(f, "structure-by-id"),
            Self::NamesById => write!(f, "names-by-id"),
            Self::KeyById => write!(f, "key-by-id"),
            Self::StructureByName => write!(f, "structure-by-name"),
            Self::SourceCatalog => write!(f, "source-catalog"),
            Self::XrefByKey => write!(f, "xref-by-key"),
            Self::XrefByField => write!(f, "xref-by-field"),
            Self::XrefRegistryIds => write!(f, "xref-registry-ids"),
        }
    }
}

/// Result of one adapter call. Adapters never return errors to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    /// The source answered but has no such record
    Missing,
    /// Transport, status or decode failure; the reason is kept for diagnostics
    Unavailable(String),
    /// The adapter does not implement the capability
    Unsupported,
}

impl<T> Lookup<T> {
    /// Downgrade a client result, logging failures
    pub fn settle(
        source: &str,
        capability: SourceCapability,
        result: Result<Option<T>, SourceError>,
    ) -> Self {
        match result {
            Ok(Some(value)) => Lookup::Found(value),
            Ok(None) => {
                tracing::debug!(source, operation = %capability, "No record found");
                Lookup::Missing
            }
            Err(e) => {
                tracing::warn!(source, operation = %capability, error = %e, "Source unavailable");
                Lookup::Unavailable(e.to_string())
            }
        }
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::Missing => Lookup::Missing,
            Lookup::Unavailable(reason) => Lookup::Unavailable(reason),
            Lookup::Unsupported => Lookup::Unsupported,
        }
    }

    /// Diagnostic entry when the call was unavailable
    pub fn failure(&self, source: &str, capability: SourceCapability) -> Option<SourceFailure> {
        match self {
            Lookup::Unavailable(reason) => Some(SourceFailure {
                source: source.to_string(),
                operation: capability.to_string(),
                reason: reason.clone(),
            }),
            _ => None,
        }
    }
}

/// Names reported for a compound
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundNames {
    pub systematic: Option<String>,
    pub common: Option<String>,
    /// Set when one of the name lookups was unavailable but the other answered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_failure: Option<String>,
}

impl CompoundNames {
    pub fn is_empty(&self) -> bool {
        self.systematic.is_none() && self.common.is_none()
    }
}

/// One registry listed by a cross-reference source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub source_id: String,
    pub name: String,
}

/// A compound's accession in another registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReference {
    pub source_id: String,
    pub accession: String,
}

/// Trait for external knowledge sources
///
/// Default method bodies return `Lookup::Unsupported`; adapters override the
/// operations listed in `capabilities`.
#[async_trait]
pub trait CompoundSource: Send + Sync {
    /// Name recorded on SourceLinks (e.g. "PubChem")
    fn source_name(&self) -> &'static str;

    fn capabilities(&self) -> &[SourceCapability];

    fn supports(&self, capability: SourceCapability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Reference URL for a SourceLink built from a source id or query
    fn reference_url(&self, id: &str) -> String;

    async fn resolve_id_by_name(&self, _name: &str) -> Lookup<String> {
        Lookup::Unsupported
    }

    async fn resolve_id_by_key(&self, _key: &str) -> Lookup<String> {
        Lookup::Unsupported
    }

    async fn structure_by_id(&self, _id: &str) -> Lookup<String> {
        Lookup::Unsupported
    }

    async fn names_by_id(&self, _id: &str) -> Lookup<CompoundNames> {
        Lookup::Unsupported
    }

    async fn key_by_id(&self, _id: &str) -> Lookup<String> {
        Lookup::Unsupported
    }

    async fn structure_by_name(&self, _name: &str) -> Lookup<String> {
        Lookup::Unsupported
    }

    async fn source_catalog(&self) -> Lookup<Vec<RegistryEntry>> {
        Lookup::Unsupported
    }

    async fn cross_references_by_key(&self, _key: &str) -> Lookup<Vec<CrossReference>> {
        Lookup::Unsupported
    }

    /// Accessions listed under a dedicated cross-reference field (e.g. "DrugBank")
    async fn xref_field(&self, _id: &str, _field: &str) -> Lookup<Vec<String>> {
        Lookup::Unsupported
    }

    /// Registry ids contributed by `source_filter` (e.g. "DrugBank")
    async fn xref_registry_ids(&self, _id: &str, _source_filter: &str) -> Lookup<Vec<String>> {
        Lookup::Unsupported
    }
}
