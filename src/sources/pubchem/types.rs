//! PubChem PUG-REST response types
//!
//! Reference: https://pubchem.ncbi.nlm.nih.gov/docs/pug-rest

use serde::Deserialize;
use std::collections::HashMap;

/// `.../cids/JSON`
#[derive(Debug, Clone, Deserialize)]
pub struct IdentifierListResponse {
    #[serde(rename = "IdentifierList")]
    pub identifier_list: IdentifierList,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentifierList {
    #[serde(rename = "CID", default)]
    pub cids: Vec<u64>,
}

impl IdentifierListResponse {
    /// First usable CID. PubChem reports "no match" on some routes as CID 0.
    pub fn first_cid(&self) -> Option<String> {
        self.identifier_list
            .cids
            .iter()
            .find(|cid| **cid > 0)
            .map(|cid| cid.to_string())
    }
}

/// `.../property/{names}/JSON`
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyTableResponse {
    #[serde(rename = "PropertyTable")]
    pub property_table: PropertyTable,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropertyTable {
    #[serde(rename = "Properties", default)]
    pub properties: Vec<CompoundProperties>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompoundProperties {
    #[serde(rename = "CID")]
    pub cid: Option<u64>,
    #[serde(rename = "CanonicalSMILES")]
    pub canonical_smiles: Option<String>,
    #[serde(rename = "ConnectivitySMILES")]
    pub connectivity_smiles: Option<String>,
    /// Newer responses report the isomeric notation under this name
    #[serde(rename = "SMILES")]
    pub smiles: Option<String>,
    #[serde(rename = "InChIKey")]
    pub inchi_key: Option<String>,
    #[serde(rename = "IUPACName")]
    pub iupac_name: Option<String>,
}

impl CompoundProperties {
    /// Structure notation in order of preference
    pub fn structure(&self) -> Option<String> {
        [
            &self.canonical_smiles,
            &self.connectivity_smiles,
            &self.smiles,
        ]
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
        .cloned()
    }
}

impl PropertyTableResponse {
    pub fn first(self) -> Option<CompoundProperties> {
        self.property_table.properties.into_iter().next()
    }
}

/// `.../synonyms/JSON` and `.../xrefs/{field}/JSON`
#[derive(Debug, Clone, Deserialize)]
pub struct InformationListResponse {
    #[serde(rename = "InformationList")]
    pub information_list: InformationList,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InformationList {
    #[serde(rename = "Information", default)]
    pub information: Vec<Information>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Information {
    #[serde(rename = "CID")]
    pub cid: Option<u64>,
    #[serde(rename = "Synonym", default)]
    pub synonyms: Vec<String>,
    /// Cross-reference fields, keyed by the xref name ("DrugBank", "RegistryID", ...)
    #[serde(flatten)]
    pub fields: HashMap<String, serde_json::Value>,
}

impl Information {
    /// String values listed under a cross-reference field
    pub fn strings(&self, field: &str) -> Vec<String> {
        match self.fields.get(field) {
            Some(serde_json::Value::Array(values)) => values
                .iter()
                .filter_map(|v| match v {
                    serde_json::Value::String(s) => Some(s.clone()),
                    serde_json::Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            Some(serde_json::Value::String(s)) => vec![s.clone()],
            _ => Vec::new(),
        }
    }
}

impl InformationListResponse {
    pub fn first(self) -> Option<Information> {
        self.information_list.information.into_iter().next()
    }
}
