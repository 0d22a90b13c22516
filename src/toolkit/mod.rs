//! Structure canonicalization capability
//!
//! The cheminformatics primitives (parsing, canonical forms, structural
//! identifiers, descriptors, fingerprints, depiction) are provided by an
//! external toolkit. The engine consumes them through [`StructureToolkit`].

pub mod remote;

pub use remote::RemoteToolkit;

use crate::error::ToolkitError;
use async_trait::async_trait;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A successfully parsed structure.
///
/// Holds the notation it was parsed from plus an opaque, toolkit-specific
/// handle (a molecule object, a cached property sheet, ...). Only the toolkit
/// that produced a `Structure` knows how to read its handle.
#[derive(Clone)]
pub struct Structure {
    notation: String,
    handle: Arc<dyn Any + Send + Sync>,
}

impl Structure {
    pub fn new<H: Any + Send + Sync>(notation: impl Into<String>, handle: H) -> Self {
        Self {
            notation: notation.into(),
            handle: Arc::new(handle),
        }
    }

    /// The notation this structure was parsed from
    pub fn notation(&self) -> &str {
        &self.notation
    }

    pub fn handle<H: Any>(&self) -> Option<&H> {
        self.handle.downcast_ref::<H>()
    }
}

impl fmt::Debug for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Structure")
            .field("notation", &self.notation)
            .finish_non_exhaustive()
    }
}

/// Cheminformatics capability consumed by the resolver.
///
/// Implementations must be deterministic: the same notation always yields the
/// same canonical form, identifiers and fingerprint.
#[async_trait]
pub trait StructureToolkit: Send + Sync {
    /// Parse a structure notation. `ToolkitError::Unparseable` when rejected.
    async fn parse(&self, notation: &str) -> Result<Structure, ToolkitError>;

    /// Canonical (normalized) structure notation
    async fn canonical_form(&self, structure: &Structure) -> Result<String, ToolkitError>;

    /// Canonical long-form structural identifier
    async fn long_identifier(&self, structure: &Structure) -> Result<String, ToolkitError>;

    /// Short hash (standardized key) derived from a long-form identifier
    async fn short_hash(&self, long_identifier: &str) -> Result<String, ToolkitError>;

    async fn formula(&self, structure: &Structure) -> Result<String, ToolkitError>;

    async fn exact_weight(&self, structure: &Structure) -> Result<f64, ToolkitError>;

    /// Fingerprint as a bit-string of exactly `bits` characters
    async fn fingerprint(&self, structure: &Structure, bits: usize)
        -> Result<String, ToolkitError>;

    /// Rendered 2-D depiction (SVG markup)
    async fn depict(&self, structure: &Structure) -> Result<String, ToolkitError>;
}
