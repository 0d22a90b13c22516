//! PubChem CompoundSource implementation

use super::client::PubChemClient;
use super::COMPOUND_PAGE_BASE;
use crate::config::ResolverConfig;
use crate::error::SourceError;
use crate::sources::traits::{CompoundNames, CompoundSource, Lookup, SourceCapability};
use async_trait::async_trait;

const STRUCTURE_PROPERTIES: &[&str] = &["CanonicalSMILES", "ConnectivitySMILES"];

/// PubChem source adapter
pub struct PubChemSource {
    client: PubChemClient,
}

impl PubChemSource {
    pub fn from_config(config: &ResolverConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: PubChemClient::from_config(config)?,
        })
    }

    /// Create with an existing client
    pub fn with_client(client: PubChemClient) -> Self {
        Self { client }
    }

    fn settle<T>(
        &self,
        capability: SourceCapability,
        result: Result<Option<T>, SourceError>,
    ) -> Lookup<T> {
        Lookup::settle(self.source_name(), capability, result)
    }
}

#[async_trait]
impl CompoundSource for PubChemSource {
    fn source_name(&self) -> &'static str {
        "PubChem"
    }

    fn capabilities(&self) -> &[SourceCapability] {
        &[
            SourceCapability::IdByName,
            SourceCapability::IdByKey,
            SourceCapability::StructureById,
            SourceCapability::NamesById,
            SourceCapability::KeyById,
            SourceCapability::XrefByField,
            SourceCapability::XrefRegistryIds,
        ]
    }

    fn reference_url(&self, id: &str) -> String {
        format!("{}/{}", COMPOUND_PAGE_BASE, id)
    }

    async fn resolve_id_by_name(&self, name: &str) -> Lookup<String> {
        self.settle(
            SourceCapability::IdByName,
            self.client.cid_by_name(name).await,
        )
    }

    async fn resolve_id_by_key(&self, key: &str) -> Lookup<String> {
        self.settle(
            SourceCapability::IdByKey,
            self.client.cid_by_inchikey(key).await,
        )
    }

    async fn structure_by_id(&self, id: &str) -> Lookup<String> {
        let result = self.client.properties(id, STRUCTURE_PROPERTIES).await;
        self.settle(
            SourceCapability::StructureById,
            result.map(|props| props.and_then(|p| p.structure())),
        )
    }

    async fn names_by_id(&self, id: &str) -> Lookup<CompoundNames> {
        let common = self.settle(
            SourceCapability::NamesById,
            self.client
                .synonyms(id)
                .await
                .map(|synonyms| synonyms.and_then(|s| s.into_iter().next())),
        );
        let systematic = self.settle(
            SourceCapability::NamesById,
            self.client
                .properties(id, &["IUPACName"])
                .await
                .map(|props| props.and_then(|p| p.iupac_name)),
        );

        // Either half is useful on its own; an outage of the other half is still reported
        let failure = match (&common, &systematic) {
            (Lookup::Unavailable(reason), _) | (_, Lookup::Unavailable(reason)) => {
                Some(reason.clone())
            }
            _ => None,
        };
        let names = CompoundNames {
            common: common.found(),
            systematic: systematic.found(),
            partial_failure: None,
        };

        match failure {
            Some(reason) if names.is_empty() => Lookup::Unavailable(reason),
            _ if names.is_empty() => Lookup::Missing,
            partial_failure => Lookup::Found(CompoundNames {
                partial_failure,
                ..names
            }),
        }
    }

    async fn key_by_id(&self, id: &str) -> Lookup<String> {
        let result = self.client.properties(id, &["InChIKey"]).await;
        self.settle(
            SourceCapability::KeyById,
            result.map(|props| props.and_then(|p| p.inchi_key)),
        )
    }

    async fn xref_field(&self, id: &str, field: &str) -> Lookup<Vec<String>> {
        self.settle(
            SourceCapability::XrefByField,
            self.client.xrefs(id, field, None).await,
        )
    }

    async fn xref_registry_ids(&self, id: &str, source_filter: &str) -> Lookup<Vec<String>> {
        self.settle(
            SourceCapability::XrefRegistryIds,
            self.client
                .xrefs(id, "RegistryID", Some(source_filter))
                .await,
        )
    }
}
