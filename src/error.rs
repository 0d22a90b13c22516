//! Error types for the compound resolution engine
//!
//! Source and toolkit errors never escape the orchestrator: they are downgraded
//! to "unavailable" / "unparseable" outcomes at the adapter boundary. Only
//! resolution outcomes and catalog failures reach callers.

use thiserror::Error;

/// Failure of a single call against an external knowledge source
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),
}

impl SourceError {
    /// Whether another attempt could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            SourceError::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            SourceError::Status { status, .. } => *status == 429 || *status >= 500,
            SourceError::Decode(_) | SourceError::Url(_) => false,
        }
    }
}

/// Failure reported by the structure canonicalization capability
#[derive(Error, Debug)]
pub enum ToolkitError {
    #[error("structure notation could not be parsed: {notation}")]
    Unparseable { notation: String },

    #[error("structure toolkit unavailable: {0}")]
    Unavailable(String),

    #[error("structure toolkit returned no {property} for {notation}")]
    MissingProperty {
        property: &'static str,
        notation: String,
    },
}

impl From<SourceError> for ToolkitError {
    fn from(error: SourceError) -> Self {
        ToolkitError::Unavailable(error.to_string())
    }
}

/// Terminal outcomes of `Resolver::resolve`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("identifier cannot be empty")]
    EmptyIdentifier,

    #[error("'{identifier}' is not a parseable structure and no external source recognised it")]
    Unresolvable { identifier: String },
}

/// Catalog storage errors
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Insert rejected by the uniqueness constraint on the standardized key
    #[error("a compound with key {key} is already catalogued")]
    Duplicate { key: String },

    #[error("catalog record {id} is malformed: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "database")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
