//! PubChem PUG-REST client
//!
//! Rate-limited HTTP client. Every method returns `Ok(None)` when PubChem has
//! no record (404 or an empty payload).

use super::types::{
    CompoundProperties, IdentifierListResponse, InformationListResponse, PropertyTableResponse,
};
use crate::config::{HttpSettings, ResolverConfig};
use crate::error::SourceError;
use crate::sources::http::{endpoint, SourceHttp};
use std::time::Duration;

pub struct PubChemClient {
    base: String,
    http: SourceHttp,
}

impl PubChemClient {
    pub fn new(base: impl Into<String>, settings: &HttpSettings) -> Result<Self, SourceError> {
        Ok(Self {
            base: base.into(),
            http: SourceHttp::new(
                "PubChem",
                settings,
                Duration::from_millis(settings.pubchem_min_interval_ms),
            )?,
        })
    }

    pub fn from_config(config: &ResolverConfig) -> Result<Self, SourceError> {
        Self::new(config.endpoints.pubchem.clone(), &config.http)
    }

    /// First CID for a compound name
    pub async fn cid_by_name(&self, name: &str) -> Result<Option<String>, SourceError> {
        let url = endpoint(&self.base, &["compound", "name", name, "cids", "JSON"])?;
        let response: Option<IdentifierListResponse> = self.http.get_json(&url).await?;
        Ok(response.and_then(|r| r.first_cid()))
    }

    /// First CID for an InChIKey
    pub async fn cid_by_inchikey(&self, key: &str) -> Result<Option<String>, SourceError> {
        let url = endpoint(&self.base, &["compound", "inchikey", key, "cids", "JSON"])?;
        let response: Option<IdentifierListResponse> = self.http.get_json(&url).await?;
        Ok(response.and_then(|r| r.first_cid()))
    }

    /// Selected properties for a CID
    pub async fn properties(
        &self,
        cid: &str,
        names: &[&str],
    ) -> Result<Option<CompoundProperties>, SourceError> {
        let list = names.join(",");
        let url = endpoint(&self.base, &["compound", "cid", cid, "property", &list, "JSON"])?;
        let response: Option<PropertyTableResponse> = self.http.get_json(&url).await?;
        Ok(response.and_then(|r| r.first()))
    }

    /// Synonyms for a CID, most common first
    pub async fn synonyms(&self, cid: &str) -> Result<Option<Vec<String>>, SourceError> {
        let url = endpoint(&self.base, &["compound", "cid", cid, "synonyms", "JSON"])?;
        let response: Option<InformationListResponse> = self.http.get_json(&url).await?;
        Ok(response
            .and_then(|r| r.first())
            .map(|info| info.synonyms)
            .filter(|synonyms| !synonyms.is_empty()))
    }

    /// Values of a cross-reference field, optionally filtered by contributing source
    pub async fn xrefs(
        &self,
        cid: &str,
        field: &str,
        source: Option<&str>,
    ) -> Result<Option<Vec<String>>, SourceError> {
        let mut url = endpoint(&self.base, &["compound", "cid", cid, "xrefs", field, "JSON"])?;
        if let Some(source) = source {
            url.query_pairs_mut().append_pair("source", source);
        }

        let response: Option<InformationListResponse> = self.http.get_json(&url).await?;
        Ok(response
            .and_then(|r| r.first())
            .map(|info| info.strings(field))
            .filter(|values| !values.is_empty()))
    }
}
