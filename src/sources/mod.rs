//! External knowledge sources
//!
//! Three adapters sit behind the [`CompoundSource`] trait:
//! - PubChem (primary): name/key to CID, structures, names, keys, cross-references
//! - ChEMBL (secondary): structure by synonym
//! - UniChem (tertiary): registry catalog and key-based cross-references

pub mod chembl;
pub mod http;
pub mod pubchem;
pub mod traits;
pub mod unichem;

#[cfg(test)]
pub(crate) mod test_server;

pub use chembl::ChemblSource;
pub use pubchem::PubChemSource;
pub use traits::{
    CompoundNames, CompoundSource, CrossReference, Lookup, RegistryEntry, SourceCapability,
};
pub use unichem::UniChemSource;
