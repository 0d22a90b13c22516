//! PubChem PUG-REST integration
//!
//! The primary source. `client` speaks the REST API, `loader` adapts it to
//! [`CompoundSource`](crate::sources::CompoundSource).

pub mod client;
pub mod loader;
pub mod types;

pub use client::PubChemClient;
pub use loader::PubChemSource;

/// Public compound page, used for SourceLinks
pub const COMPOUND_PAGE_BASE: &str = "https://pubchem.ncbi.nlm.nih.gov/compound";
