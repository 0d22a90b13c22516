//! compound-resolver - chemical identifier resolution and deduplication
//!
//! Resolves a loosely-typed chemical identifier (structure notation, PubChem
//! CID, InChIKey or free-text name) into a canonical compound record, then
//! checks it against the catalog before storage.
//!
//! ## Call chain
//! identifier -> classify -> sources (PubChem, ChEMBL) -> toolkit
//! -> cross-reference (UniChem / DrugBank) -> ResolvedCompound
//! -> DeduplicationEngine -> catalog
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use compound_resolver::catalog::{DeduplicationEngine, InMemoryCatalog};
//! use compound_resolver::config::ResolverConfig;
//! use compound_resolver::resolve::Resolver;
//! use compound_resolver::xref::SourceCatalogCache;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = ResolverConfig::from_env();
//! let resolver = Resolver::from_config(&config, Arc::new(SourceCatalogCache::new()))?;
//! let engine = DeduplicationEngine::new(Arc::new(InMemoryCatalog::new()));
//!
//! let compound = resolver.resolve("Aspirin").await?;
//! let outcome = engine.deduplicate_and_store(&compound).await?;
//! println!("{}", outcome.record().compound_id);
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

pub mod config;

// Record types and first-writer-wins merge helpers
pub mod compound;

pub mod classify;

// Cheminformatics capability (parse, canonicalize, describe, depict)
pub mod toolkit;

// External knowledge sources
pub mod sources;

pub mod xref;

// Resolution pipeline
pub mod resolve;

// Storage and duplicate detection
pub mod catalog;

pub mod seed;

pub use catalog::{CompoundCatalog, DeduplicationEngine, StoreOutcome};
pub use compound::{CatalogRecord, ResolvedCompound, SourceLink};
pub use config::ResolverConfig;
pub use error::{CatalogError, ResolveError};
pub use resolve::Resolver;
