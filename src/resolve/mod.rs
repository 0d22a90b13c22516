//! Identifier resolution
//!
//! Turns one loosely-typed identifier into a merged [`ResolvedCompound`].
//!
//! ```text
//! "Aspirin"
//!     │
//!     ▼
//! Resolver.resolve()
//!     │
//!     ├─► 1. toolkit parse ──► smiles_raw (User-provided)
//!     ├─► 3. derive inchi / inchi_key from the user structure
//!     ├─► 2. registry id: number │ IdByKey │ IdByName        ┐
//!     ├─► 4. PubChem: key, structure, names by id           │ concurrent with
//!     │                                                      │ ChEMBL lookup (5)
//!     ├─► 5. merge ChEMBL structure (only if still empty)   ┘
//!     ├─► 6. derive inchi / inchi_key / depiction
//!     ├─► 7. cross-reference link (DrugBank)
//!     └─► 8. formula, weight, normalized form, fingerprint
//! ```
//!
//! Every field is first-writer-wins; see [`crate::compound::fill_once`].
//!
//! [`ResolvedCompound`]: crate::compound::ResolvedCompound

pub mod orchestrator;

pub use orchestrator::Resolver;
