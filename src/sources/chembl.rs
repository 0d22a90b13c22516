//! ChEMBL integration
//!
//! Secondary source: looks a structure up directly from a synonym, bypassing
//! registry ids entirely.

use crate::config::{HttpSettings, ResolverConfig};
use crate::error::SourceError;
use crate::sources::http::{endpoint, SourceHttp};
use crate::sources::traits::{CompoundSource, Lookup, SourceCapability};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const SEARCH_PAGE_BASE: &str = "https://www.ebi.ac.uk/chembl/g/#search_results/all/query=";

#[derive(Debug, Clone, Deserialize)]
pub struct MoleculeList {
    #[serde(default)]
    pub molecules: Vec<Molecule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Molecule {
    pub molecule_chembl_id: Option<String>,
    #[serde(default)]
    pub molecule_structures: Option<MoleculeStructures>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoleculeStructures {
    pub canonical_smiles: Option<String>,
}

impl MoleculeList {
    /// Structure of the first molecule, when it carries one
    pub fn first_structure(self) -> Option<String> {
        self.molecules
            .into_iter()
            .next()
            .and_then(|m| m.molecule_structures)
            .and_then(|s| s.canonical_smiles)
            .filter(|s| !s.trim().is_empty())
    }
}

/// ChEMBL API client
pub struct ChemblClient {
    base: String,
    http: SourceHttp,
}

impl ChemblClient {
    pub fn new(base: impl Into<String>, settings: &HttpSettings) -> Result<Self, SourceError> {
        Ok(Self {
            base: base.into(),
            http: SourceHttp::new(
                "ChEMBL",
                settings,
                Duration::from_millis(settings.ebi_min_interval_ms),
            )?,
        })
    }

    /// Molecules whose synonym matches `name` case-insensitively
    pub async fn molecules_by_synonym(&self, name: &str) -> Result<Option<MoleculeList>, SourceError> {
        let mut url = endpoint(&self.base, &["molecule.json"])?;
        url.query_pairs_mut()
            .append_pair("molecule_synonyms__molecule_synonym__iexact", name);
        self.http.get_json(&url).await
    }
}

/// ChEMBL source adapter
pub struct ChemblSource {
    client: ChemblClient,
}

impl ChemblSource {
    pub fn from_config(config: &ResolverConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: ChemblClient::new(config.endpoints.chembl.clone(), &config.http)?,
        })
    }

    pub fn with_client(client: ChemblClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CompoundSource for ChemblSource {
    fn source_name(&self) -> &'static str {
        "ChEMBL"
    }

    fn capabilities(&self) -> &[SourceCapability] {
        &[SourceCapability::StructureByName]
    }

    /// ChEMBL links point at a search for the query text, not a molecule id
    fn reference_url(&self, query: &str) -> String {
        format!("{}{}", SEARCH_PAGE_BASE, encode_query_param(query))
    }

    async fn structure_by_name(&self, name: &str) -> Lookup<String> {
        let result = self.client.molecules_by_synonym(name).await;
        Lookup::settle(
            self.source_name(),
            SourceCapability::StructureByName,
            result.map(|list| list.and_then(MoleculeList::first_structure)),
        )
    }
}

/// Percent-encode a query value the way the ChEMBL web UI expects (`%20` for spaces)
fn encode_query_param(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            other => encoded.push_str(&format!("%{:02X}", other)),
        }
    }
    encoded
}
