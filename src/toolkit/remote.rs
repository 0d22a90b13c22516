//! HTTP adapter for a cheminformatics sidecar service
//!
//! Parsing returns the full property sheet for a structure in one round trip;
//! the sheet is kept as the `Structure` handle so the descriptor accessors do
//! not go back to the network. Fingerprints and key hashing are separate calls.

use super::{Structure, StructureToolkit};
use crate::config::{HttpSettings, SourceEndpoints};
use crate::error::{SourceError, ToolkitError};
use crate::sources::http::{decode_json, endpoint, SourceHttp};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Property sheet returned by `POST /v1/structures/parse`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StructureProfile {
    pub canonical: String,
    pub inchi: String,
    pub formula: String,
    pub exact_mass: f64,
    #[serde(default)]
    pub svg: Option<String>,
}

#[derive(Debug, Serialize)]
struct ParseRequest<'a> {
    notation: &'a str,
}

#[derive(Debug, Serialize)]
struct FingerprintRequest<'a> {
    notation: &'a str,
    bits: usize,
}

#[derive(Debug, Deserialize)]
struct FingerprintResponse {
    bits: String,
}

#[derive(Debug, Serialize)]
struct KeyRequest<'a> {
    inchi: &'a str,
}

#[derive(Debug, Deserialize)]
struct KeyResponse {
    key: String,
}

pub struct RemoteToolkit {
    base: String,
    http: SourceHttp,
}

impl RemoteToolkit {
    pub fn new(endpoints: &SourceEndpoints, settings: &HttpSettings) -> Result<Self, SourceError> {
        Ok(Self {
            base: endpoints.structure_service.clone(),
            http: SourceHttp::new("structure-service", settings, Duration::ZERO)?,
        })
    }

    fn profile<'a>(&self, structure: &'a Structure) -> Result<&'a StructureProfile, ToolkitError> {
        structure
            .handle::<StructureProfile>()
            .ok_or_else(|| ToolkitError::Unavailable(format!(
                "structure '{}' was not parsed by the structure service",
                structure.notation()
            )))
    }

    async fn post<B, T>(&self, segments: &[&str], payload: &B) -> Result<T, ToolkitError>
    where
        B: Serialize + Sync,
        T: for<'de> Deserialize<'de>,
    {
        let url = endpoint(&self.base, segments)?;
        let (status, body) = self.http.post_json_raw(&url, payload).await?;
        decode_json(status, &body)?.ok_or_else(|| {
            ToolkitError::Unavailable(format!("{} not found on structure service", url.path()))
        })
    }
}

#[async_trait]
impl StructureToolkit for RemoteToolkit {
    async fn parse(&self, notation: &str) -> Result<Structure, ToolkitError> {
        let url = endpoint(&self.base, &["v1", "structures", "parse"])?;
        let (status, body) = self
            .http
            .post_json_raw(&url, &ParseRequest { notation })
            .await?;

        if status == StatusCode::UNPROCESSABLE_ENTITY || status == StatusCode::BAD_REQUEST {
            return Err(ToolkitError::Unparseable {
                notation: notation.to_string(),
            });
        }

        let profile: StructureProfile = decode_json(status, &body)?.ok_or_else(|| {
            ToolkitError::Unavailable("parse endpoint not found on structure service".to_string())
        })?;
        Ok(Structure::new(notation, profile))
    }

    async fn canonical_form(&self, structure: &Structure) -> Result<String, ToolkitError> {
        Ok(self.profile(structure)?.canonical.clone())
    }

    async fn long_identifier(&self, structure: &Structure) -> Result<String, ToolkitError> {
        let inchi = &self.profile(structure)?.inchi;
        if inchi.is_empty() {
            return Err(ToolkitError::MissingProperty {
                property: "inchi",
                notation: structure.notation().to_string(),
            });
        }
        Ok(inchi.clone())
    }

    async fn short_hash(&self, long_identifier: &str) -> Result<String, ToolkitError> {
        let response: KeyResponse = self
            .post(
                &["v1", "identifiers", "key"],
                &KeyRequest {
                    inchi: long_identifier,
                },
            )
            .await?;
        Ok(response.key)
    }

    async fn formula(&self, structure: &Structure) -> Result<String, ToolkitError> {
        Ok(self.profile(structure)?.formula.clone())
    }

    async fn exact_weight(&self, structure: &Structure) -> Result<f64, ToolkitError> {
        Ok(self.profile(structure)?.exact_mass)
    }

    async fn fingerprint(
        &self,
        structure: &Structure,
        bits: usize,
    ) -> Result<String, ToolkitError> {
        let response: FingerprintResponse = self
            .post(
                &["v1", "structures", "fingerprint"],
                &FingerprintRequest {
                    notation: structure.notation(),
                    bits,
                },
            )
            .await?;

        if response.bits.len() != bits {
            return Err(ToolkitError::Unavailable(format!(
                "fingerprint has {} bits, expected {}",
                response.bits.len(),
                bits
            )));
        }
        Ok(response.bits)
    }

    async fn depict(&self, structure: &Structure) -> Result<String, ToolkitError> {
        self.profile(structure)?
            .svg
            .clone()
            .ok_or_else(|| ToolkitError::MissingProperty {
                property: "svg",
                notation: structure.notation().to_string(),
            })
    }
}
