//! Resolver configuration
//!
//! Configuration is read from a YAML file and/or environment variables.
//! Environment variables always win over file values so deployments can
//! override a checked-in file without editing it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_PUBCHEM_BASE: &str = "https://pubchem.ncbi.nlm.nih.gov/rest/pug";
pub const DEFAULT_CHEMBL_BASE: &str = "https://www.ebi.ac.uk/chembl/api/data";
pub const DEFAULT_UNICHEM_BASE: &str = "https://www.ebi.ac.uk/unichem/rest";
pub const DEFAULT_STRUCTURE_SERVICE: &str = "http://localhost:8085";

/// Top-level configuration for the resolution engine
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub endpoints: SourceEndpoints,
    pub http: HttpSettings,
    pub cross_reference: CrossReferenceTarget,
    pub database: DatabaseConfig,
}

/// Base URLs of the external services
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceEndpoints {
    pub pubchem: String,
    pub chembl: String,
    pub unichem: String,
    pub structure_service: String,
}

impl Default for SourceEndpoints {
    fn default() -> Self {
        Self {
            pubchem: DEFAULT_PUBCHEM_BASE.to_string(),
            chembl: DEFAULT_CHEMBL_BASE.to_string(),
            unichem: DEFAULT_UNICHEM_BASE.to_string(),
            structure_service: DEFAULT_STRUCTURE_SERVICE.to_string(),
        }
    }
}

/// Per-call HTTP behaviour shared by all source adapters
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Upper bound for a single request, connect included
    pub timeout_secs: u64,
    /// Total tries per call (1 = no retry)
    pub attempts: u32,
    pub retry_backoff_ms: u64,
    /// Minimum spacing between PubChem requests (PUG-REST allows 5 req/sec)
    pub pubchem_min_interval_ms: u64,
    /// Minimum spacing between requests to the EBI services
    pub ebi_min_interval_ms: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            attempts: 2,
            retry_backoff_ms: 500,
            pubchem_min_interval_ms: 200,
            ebi_min_interval_ms: 100,
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// The tertiary registry link the cross-reference augmenter looks for
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CrossReferenceTarget {
    /// Source name recorded on the SourceLink
    pub link_name: String,
    /// Case-insensitive substring matched against the registry's source list
    pub catalog_match: String,
    /// URL template; `{accession}` is replaced by the external accession
    pub url_template: String,
    /// Prefix that identifies an accession in free-form registry id lists
    pub accession_prefix: String,
}

impl Default for CrossReferenceTarget {
    fn default() -> Self {
        Self {
            link_name: "DrugBank".to_string(),
            catalog_match: "drugbank".to_string(),
            url_template: "https://go.drugbank.com/drugs/{accession}".to_string(),
            accession_prefix: "DB".to_string(),
        }
    }
}

impl CrossReferenceTarget {
    pub fn url_for(&self, accession: &str) -> String {
        self.url_template.replace("{accession}", accession)
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
    pub idle_timeout_secs: Option<u64>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: "postgresql://localhost:5432/compounds".to_string(),
            max_connections: 10,
            connection_timeout_secs: 30,
            idle_timeout_secs: Some(600), // 10 minutes
        }
    }
}

impl ResolverConfig {
    /// Defaults overridden by environment variables (`.env` is honoured)
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Load a YAML file, then apply environment overrides
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading resolver configuration from {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config = Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        dotenvy::dotenv().ok();
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: ResolverConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (name, base) in [
            ("pubchem", &self.endpoints.pubchem),
            ("chembl", &self.endpoints.chembl),
            ("unichem", &self.endpoints.unichem),
            ("structure_service", &self.endpoints.structure_service),
        ] {
            url::Url::parse(base)
                .with_context(|| format!("endpoint '{}' is not a valid URL: {}", name, base))?;
        }
        if self.http.attempts == 0 {
            anyhow::bail!("http.attempts must be at least 1");
        }
        if !self.cross_reference.url_template.contains("{accession}") {
            anyhow::bail!("cross_reference.url_template must contain {{accession}}");
        }
        Ok(())
    }

    /// Apply overrides from a variable lookup; unparseable numbers are ignored
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("PUBCHEM_BASE_URL") {
            self.endpoints.pubchem = v;
        }
        if let Some(v) = var("CHEMBL_BASE_URL") {
            self.endpoints.chembl = v;
        }
        if let Some(v) = var("UNICHEM_BASE_URL") {
            self.endpoints.unichem = v;
        }
        if let Some(v) = var("STRUCTURE_SERVICE_URL") {
            self.endpoints.structure_service = v;
        }
        if let Some(v) = var("SOURCE_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.http.timeout_secs = v;
        }
        if let Some(v) = var("SOURCE_ATTEMPTS").and_then(|s| s.parse().ok()) {
            self.http.attempts = std::cmp::max(v, 1);
        }
        if let Some(v) = var("PUBCHEM_MIN_INTERVAL_MS").and_then(|s| s.parse().ok()) {
            self.http.pubchem_min_interval_ms = v;
        }
        if let Some(v) = var("DATABASE_URL") {
            self.database.database_url = v;
        }
        if let Some(v) = var("DATABASE_POOL_SIZE").and_then(|s| s.parse().ok()) {
            self.database.max_connections = v;
        }
    }
}

/// Mask sensitive information in a database URL for logging
pub fn mask_database_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        let mut masked = parsed.clone();
        if parsed.password().is_some() {
            let _ = masked.set_password(Some("***"));
        }
        masked.to_string()
    } else {
        "***".to_string()
    }
}
