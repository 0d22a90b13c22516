//! UniChem integration
//!
//! Tertiary cross-reference registry. UniChem identifies each contributing
//! database by a numeric `src_id`; the service returns it as a string on some
//! routes and as a number on others.

use crate::config::{HttpSettings, ResolverConfig};
use crate::error::SourceError;
use crate::sources::http::{endpoint, SourceHttp};
use crate::sources::traits::{
    CompoundSource, CrossReference, Lookup, RegistryEntry, SourceCapability,
};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct UniChemSourceInfo {
    #[serde(default, deserialize_with = "string_or_number")]
    pub src_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UniChemMapping {
    #[serde(default, deserialize_with = "string_or_number")]
    pub src_id: Option<String>,
    #[serde(default)]
    pub src_compound_id: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// UniChem REST client
pub struct UniChemClient {
    base: String,
    http: SourceHttp,
}

impl UniChemClient {
    pub fn new(base: impl Into<String>, settings: &HttpSettings) -> Result<Self, SourceError> {
        Ok(Self {
            base: base.into(),
            http: SourceHttp::new(
                "UniChem",
                settings,
                Duration::from_millis(settings.ebi_min_interval_ms),
            )?,
        })
    }

    pub async fn sources(&self) -> Result<Option<Vec<UniChemSourceInfo>>, SourceError> {
        let url = endpoint(&self.base, &["sources"])?;
        self.http.get_json(&url).await
    }

    pub async fn mappings(&self, key: &str) -> Result<Option<Vec<UniChemMapping>>, SourceError> {
        let url = endpoint(&self.base, &["inchikey", key])?;
        self.http.get_json(&url).await
    }
}

/// UniChem source adapter
pub struct UniChemSource {
    client: UniChemClient,
}

impl UniChemSource {
    pub fn from_config(config: &ResolverConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: UniChemClient::new(config.endpoints.unichem.clone(), &config.http)?,
        })
    }

    pub fn with_client(client: UniChemClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CompoundSource for UniChemSource {
    fn source_name(&self) -> &'static str {
        "UniChem"
    }

    fn capabilities(&self) -> &[SourceCapability] {
        &[SourceCapability::SourceCatalog, SourceCapability::XrefByKey]
    }

    fn reference_url(&self, key: &str) -> String {
        format!("https://www.ebi.ac.uk/unichem/compoundsources?type=inchikey&compound={}", key)
    }

    async fn source_catalog(&self) -> Lookup<Vec<RegistryEntry>> {
        let result = self.client.sources().await.map(|sources| {
            sources.map(|list| {
                list.into_iter()
                    .filter_map(|s| {
                        Some(RegistryEntry {
                            source_id: s.src_id?,
                            name: s.name.unwrap_or_default(),
                        })
                    })
                    .collect::<Vec<_>>()
            })
        });
        Lookup::settle(self.source_name(), SourceCapability::SourceCatalog, result)
    }

    async fn cross_references_by_key(&self, key: &str) -> Lookup<Vec<CrossReference>> {
        let result = self.client.mappings(key).await.map(|mappings| {
            mappings
                .map(|list| {
                    list.into_iter()
                        .filter_map(|m| {
                            Some(CrossReference {
                                source_id: m.src_id?,
                                accession: m.src_compound_id?,
                            })
                        })
                        .collect::<Vec<_>>()
                })
                .filter(|refs| !refs.is_empty())
        });
        Lookup::settle(self.source_name(), SourceCapability::XrefByKey, result)
    }
}
