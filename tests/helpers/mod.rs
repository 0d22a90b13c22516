//! Shared fakes for the integration tests
//!
//! - `FakeToolkit`: deterministic stand-in for a cheminformatics toolkit
//! - `ScriptedSource`: a CompoundSource whose answers are configured per test
//! - `RacingCatalog`: an in-memory catalog that loses every insert race once

#![allow(dead_code)]

use async_trait::async_trait;
use compound_resolver::catalog::{CompoundCatalog, DedupField, InMemoryCatalog, PurgeReport};
use compound_resolver::compound::{CatalogRecord, ResolvedCompound};
use compound_resolver::config::CrossReferenceTarget;
use compound_resolver::error::{CatalogError, ToolkitError};
use compound_resolver::resolve::Resolver;
use compound_resolver::sources::{
    CompoundNames, CompoundSource, CrossReference, Lookup, RegistryEntry, SourceCapability,
};
use compound_resolver::toolkit::{Structure, StructureToolkit};
use compound_resolver::xref::{CrossReferenceAugmenter, SourceCatalogCache};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

pub const ASPIRIN_KEY: &str = "BSYNRYMUTXBXSQ-UHFFFAOYSA-N";
pub const ASPIRIN_SMILES: &str = "CC(=O)OC1=CC=CC=C1C(=O)O";

// ============================================================================
// Toolkit
// ============================================================================

/// Parsed form held by `Structure` handles from the fake toolkit
#[derive(Debug, Clone)]
pub struct FakeMolecule {
    pub canonical: String,
}

/// Deterministic toolkit.
///
/// Accepts notations made of organic-subset atoms, ring digits and bond
/// symbols; plain English names and InChIKeys are rejected. The canonical form
/// is the notation's characters sorted, so "OCC" and "CCO" share one. The
/// fingerprint hashes the notation it is given, which makes fingerprints of
/// raw (non-canonical) notations differ.
#[derive(Default)]
pub struct FakeToolkit {
    offline: AtomicBool,
    pub parse_calls: AtomicUsize,
}

impl FakeToolkit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails as if the toolkit service were down
    pub fn offline() -> Self {
        let toolkit = Self::default();
        toolkit.offline.store(true, Ordering::SeqCst);
        toolkit
    }

    fn check_online(&self) -> Result<(), ToolkitError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ToolkitError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }

    fn molecule<'a>(&self, structure: &'a Structure) -> Result<&'a FakeMolecule, ToolkitError> {
        structure
            .handle::<FakeMolecule>()
            .ok_or_else(|| ToolkitError::Unavailable("foreign structure handle".to_string()))
    }

    pub fn canonicalize(notation: &str) -> String {
        let mut chars: Vec<char> = notation.chars().collect();
        chars.sort_unstable();
        chars.into_iter().collect()
    }

    pub fn is_parseable(notation: &str) -> bool {
        const UPPER: &str = "BCNOPSFIH";
        const LOWER: &str = "bcnopslr";
        const SYMBOLS: &str = "0123456789()[]=#@+-/\\%.";

        !notation.is_empty()
            && notation.chars().any(|c| c.is_ascii_alphabetic())
            && notation
                .chars()
                .all(|c| UPPER.contains(c) || LOWER.contains(c) || SYMBOLS.contains(c))
    }

    fn atoms(notation: &str) -> BTreeMap<char, usize> {
        let mut counts = BTreeMap::new();
        for c in notation.chars() {
            let atom = match c {
                'l' | 'r' => continue,
                c if c.is_ascii_alphabetic() => c.to_ascii_uppercase(),
                _ => continue,
            };
            *counts.entry(atom).or_insert(0) += 1;
        }
        counts
    }
}

fn digest(input: &str) -> Vec<u8> {
    Sha256::digest(input.as_bytes()).to_vec()
}

fn letters(bytes: &[u8]) -> String {
    bytes.iter().map(|b| (b'A' + b % 26) as char).collect()
}

#[async_trait]
impl StructureToolkit for FakeToolkit {
    async fn parse(&self, notation: &str) -> Result<Structure, ToolkitError> {
        self.check_online()?;
        self.parse_calls.fetch_add(1, Ordering::SeqCst);
        if !Self::is_parseable(notation) {
            return Err(ToolkitError::Unparseable {
                notation: notation.to_string(),
            });
        }
        Ok(Structure::new(
            notation,
            FakeMolecule {
                canonical: Self::canonicalize(notation),
            },
        ))
    }

    async fn canonical_form(&self, structure: &Structure) -> Result<String, ToolkitError> {
        self.check_online()?;
        Ok(self.molecule(structure)?.canonical.clone())
    }

    async fn long_identifier(&self, structure: &Structure) -> Result<String, ToolkitError> {
        self.check_online()?;
        Ok(format!("InChI=1S/{}", self.molecule(structure)?.canonical))
    }

    async fn short_hash(&self, long_identifier: &str) -> Result<String, ToolkitError> {
        self.check_online()?;
        let hash = digest(long_identifier);
        Ok(format!(
            "{}-{}-N",
            letters(&hash[..14]),
            letters(&hash[14..24])
        ))
    }

    async fn formula(&self, structure: &Structure) -> Result<String, ToolkitError> {
        self.check_online()?;
        let atoms = Self::atoms(&self.molecule(structure)?.canonical);
        Ok(atoms
            .iter()
            .map(|(atom, count)| {
                if *count == 1 {
                    atom.to_string()
                } else {
                    format!("{}{}", atom, count)
                }
            })
            .collect())
    }

    async fn exact_weight(&self, structure: &Structure) -> Result<f64, ToolkitError> {
        self.check_online()?;
        let atoms = Self::atoms(&self.molecule(structure)?.canonical);
        Ok(atoms
            .iter()
            .map(|(atom, count)| {
                let mass = match atom {
                    'C' => 12.0,
                    'N' => 14.003074,
                    'O' => 15.994915,
                    'S' => 31.972071,
                    'P' => 30.973762,
                    'F' => 18.998403,
                    'B' => 11.009305,
                    'I' => 126.904473,
                    _ => 1.007825,
                };
                mass * *count as f64
            })
            .sum())
    }

    async fn fingerprint(&self, structure: &Structure, bits: usize) -> Result<String, ToolkitError> {
        self.check_online()?;
        let mut out = String::with_capacity(bits);
        let mut round = 0u32;
        while out.len() < bits {
            for byte in digest(&format!("{}#{}", structure.notation(), round)) {
                for shift in 0..8 {
                    if out.len() == bits {
                        break;
                    }
                    out.push(if (byte >> shift) & 1 == 1 { '1' } else { '0' });
                }
            }
            round += 1;
        }
        Ok(out)
    }

    async fn depict(&self, structure: &Structure) -> Result<String, ToolkitError> {
        self.check_online()?;
        Ok(format!("<svg><text>{}</text></svg>", structure.notation()))
    }
}

// ============================================================================
// Sources
// ============================================================================

/// A source whose answers are set per test. Unconfigured lookups are `Missing`.
pub struct ScriptedSource {
    name: &'static str,
    capabilities: Vec<SourceCapability>,
    ids_by_name: HashMap<String, Lookup<String>>,
    ids_by_key: HashMap<String, Lookup<String>>,
    structures_by_id: HashMap<String, Lookup<String>>,
    names_by_id: HashMap<String, Lookup<CompoundNames>>,
    keys_by_id: HashMap<String, Lookup<String>>,
    structures_by_name: HashMap<String, Lookup<String>>,
    catalog: Lookup<Vec<RegistryEntry>>,
    xrefs_by_key: HashMap<String, Lookup<Vec<CrossReference>>>,
    xref_fields: HashMap<String, Lookup<Vec<String>>>,
    registry_ids: HashMap<String, Lookup<Vec<String>>>,
    /// Every call answers Unavailable
    down: bool,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedSource {
    fn new(name: &'static str, capabilities: Vec<SourceCapability>) -> Self {
        Self {
            name,
            capabilities,
            ids_by_name: HashMap::new(),
            ids_by_key: HashMap::new(),
            structures_by_id: HashMap::new(),
            names_by_id: HashMap::new(),
            keys_by_id: HashMap::new(),
            structures_by_name: HashMap::new(),
            catalog: Lookup::Missing,
            xrefs_by_key: HashMap::new(),
            xref_fields: HashMap::new(),
            registry_ids: HashMap::new(),
            down: false,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn pubchem() -> Self {
        Self::new(
            "PubChem",
            vec![
                SourceCapability::IdByName,
                SourceCapability::IdByKey,
                SourceCapability::StructureById,
                SourceCapability::NamesById,
                SourceCapability::KeyById,
                SourceCapability::XrefByField,
                SourceCapability::XrefRegistryIds,
            ],
        )
    }

    pub fn chembl() -> Self {
        Self::new("ChEMBL", vec![SourceCapability::StructureByName])
    }

    pub fn unichem() -> Self {
        Self::new(
            "UniChem",
            vec![SourceCapability::SourceCatalog, SourceCapability::XrefByKey],
        )
    }

    pub fn down(mut self) -> Self {
        self.down = true;
        self
    }

    /// Sleep before answering, to reorder completion against other sources
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_id_by_name(mut self, name: &str, id: &str) -> Self {
        self.ids_by_name
            .insert(name.to_string(), Lookup::Found(id.to_string()));
        self
    }

    pub fn with_id_by_key(mut self, key: &str, id: &str) -> Self {
        self.ids_by_key
            .insert(key.to_string(), Lookup::Found(id.to_string()));
        self
    }

    pub fn with_structure_by_id(mut self, id: &str, notation: &str) -> Self {
        self.structures_by_id
            .insert(id.to_string(), Lookup::Found(notation.to_string()));
        self
    }

    pub fn with_names(mut self, id: &str, systematic: Option<&str>, common: Option<&str>) -> Self {
        self.names_by_id.insert(
            id.to_string(),
            Lookup::Found(CompoundNames {
                systematic: systematic.map(str::to_string),
                common: common.map(str::to_string),
                partial_failure: None,
            }),
        );
        self
    }

    /// Names where one half answered and the other was unavailable
    pub fn with_partial_names(mut self, id: &str, systematic: &str, reason: &str) -> Self {
        self.names_by_id.insert(
            id.to_string(),
            Lookup::Found(CompoundNames {
                systematic: Some(systematic.to_string()),
                common: None,
                partial_failure: Some(reason.to_string()),
            }),
        );
        self
    }

    pub fn with_key_by_id(mut self, id: &str, key: &str) -> Self {
        self.keys_by_id
            .insert(id.to_string(), Lookup::Found(key.to_string()));
        self
    }

    pub fn with_structure_by_name(mut self, name: &str, notation: &str) -> Self {
        self.structures_by_name
            .insert(name.to_string(), Lookup::Found(notation.to_string()));
        self
    }

    pub fn with_catalog(mut self, entries: &[(&str, &str)]) -> Self {
        self.catalog = Lookup::Found(
            entries
                .iter()
                .map(|(id, name)| RegistryEntry {
                    source_id: id.to_string(),
                    name: name.to_string(),
                })
                .collect(),
        );
        self
    }

    pub fn with_xrefs(mut self, key: &str, mappings: &[(&str, &str)]) -> Self {
        self.xrefs_by_key.insert(
            key.to_string(),
            Lookup::Found(
                mappings
                    .iter()
                    .map(|(id, accession)| CrossReference {
                        source_id: id.to_string(),
                        accession: accession.to_string(),
                    })
                    .collect(),
            ),
        );
        self
    }

    pub fn with_xref_field(mut self, id: &str, values: &[&str]) -> Self {
        self.xref_fields.insert(
            id.to_string(),
            Lookup::Found(values.iter().map(|v| v.to_string()).collect()),
        );
        self
    }

    pub fn with_registry_ids(mut self, id: &str, values: &[&str]) -> Self {
        self.registry_ids.insert(
            id.to_string(),
            Lookup::Found(values.iter().map(|v| v.to_string()).collect()),
        );
        self
    }

    /// Calls made so far, as "operation:argument"
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.split(':').next() == Some(operation))
            .count()
    }

    async fn answer<T: Clone>(
        &self,
        operation: &str,
        arg: &str,
        table: &HashMap<String, Lookup<T>>,
    ) -> Lookup<T> {
        self.log(operation, arg);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.down {
            return Lookup::Unavailable(format!("{} is down", self.name));
        }
        table.get(arg).cloned().unwrap_or(Lookup::Missing)
    }

    fn log(&self, operation: &str, arg: &str) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(format!("{}:{}", operation, arg));
        }
    }
}

#[async_trait]
impl CompoundSource for ScriptedSource {
    fn source_name(&self) -> &'static str {
        self.name
    }

    fn capabilities(&self) -> &[SourceCapability] {
        &self.capabilities
    }

    fn reference_url(&self, id: &str) -> String {
        format!("https://{}.example/{}", self.name.to_lowercase(), id)
    }

    async fn resolve_id_by_name(&self, name: &str) -> Lookup<String> {
        self.answer("id_by_name", name, &self.ids_by_name).await
    }

    async fn resolve_id_by_key(&self, key: &str) -> Lookup<String> {
        self.answer("id_by_key", key, &self.ids_by_key).await
    }

    async fn structure_by_id(&self, id: &str) -> Lookup<String> {
        self.answer("structure_by_id", id, &self.structures_by_id)
            .await
    }

    async fn names_by_id(&self, id: &str) -> Lookup<CompoundNames> {
        self.answer("names_by_id", id, &self.names_by_id).await
    }

    async fn key_by_id(&self, id: &str) -> Lookup<String> {
        self.answer("key_by_id", id, &self.keys_by_id).await
    }

    async fn structure_by_name(&self, name: &str) -> Lookup<String> {
        self.answer("structure_by_name", name, &self.structures_by_name)
            .await
    }

    async fn source_catalog(&self) -> Lookup<Vec<RegistryEntry>> {
        let table = HashMap::from([(String::new(), self.catalog.clone())]);
        self.answer("source_catalog", "", &table).await
    }

    async fn cross_references_by_key(&self, key: &str) -> Lookup<Vec<CrossReference>> {
        self.answer("xrefs_by_key", key, &self.xrefs_by_key).await
    }

    async fn xref_field(&self, id: &str, _field: &str) -> Lookup<Vec<String>> {
        self.answer("xref_field", id, &self.xref_fields).await
    }

    async fn xref_registry_ids(&self, id: &str, _source_filter: &str) -> Lookup<Vec<String>> {
        self.answer("registry_ids", id, &self.registry_ids).await
    }
}

// ============================================================================
// Wiring
// ============================================================================

pub struct Harness {
    pub toolkit: Arc<FakeToolkit>,
    pub primary: Arc<ScriptedSource>,
    pub secondary: Arc<ScriptedSource>,
    pub registry: Arc<ScriptedSource>,
    pub cache: Arc<SourceCatalogCache>,
    pub resolver: Resolver,
}

impl Harness {
    pub fn new(primary: ScriptedSource, secondary: ScriptedSource, registry: ScriptedSource) -> Self {
        Self::with_toolkit(FakeToolkit::new(), primary, secondary, registry)
    }

    pub fn with_toolkit(
        toolkit: FakeToolkit,
        primary: ScriptedSource,
        secondary: ScriptedSource,
        registry: ScriptedSource,
    ) -> Self {
        Self::with_cache(
            toolkit,
            primary,
            secondary,
            registry,
            Arc::new(SourceCatalogCache::new()),
        )
    }

    pub fn with_cache(
        toolkit: FakeToolkit,
        primary: ScriptedSource,
        secondary: ScriptedSource,
        registry: ScriptedSource,
        cache: Arc<SourceCatalogCache>,
    ) -> Self {
        let toolkit = Arc::new(toolkit);
        let primary = Arc::new(primary);
        let secondary = Arc::new(secondary);
        let registry = Arc::new(registry);

        let augmenter = CrossReferenceAugmenter::new(
            registry.clone(),
            primary.clone(),
            cache.clone(),
            CrossReferenceTarget::default(),
        );
        let resolver = Resolver::new(toolkit.clone(), primary.clone(), secondary.clone(), augmenter);

        Self {
            toolkit,
            primary,
            secondary,
            registry,
            cache,
            resolver,
        }
    }

    /// All three sources unreachable
    pub fn offline() -> Self {
        Self::new(
            ScriptedSource::pubchem().down(),
            ScriptedSource::chembl().down(),
            ScriptedSource::unichem().down(),
        )
    }
}

/// PubChem knows aspirin as CID 2244; UniChem maps its key to DrugBank
pub fn aspirin_harness() -> Harness {
    Harness::new(
        ScriptedSource::pubchem()
            .with_id_by_name("Aspirin", "2244")
            .with_id_by_key(ASPIRIN_KEY, "2244")
            .with_key_by_id("2244", ASPIRIN_KEY)
            .with_structure_by_id("2244", ASPIRIN_SMILES)
            .with_names("2244", Some("2-acetyloxybenzoic acid"), Some("aspirin")),
        ScriptedSource::chembl().with_structure_by_name("Aspirin", "CC(=O)Oc1ccccc1C(=O)O"),
        ScriptedSource::unichem()
            .with_catalog(&[("1", "chembl"), ("2", "drugbank")])
            .with_xrefs(ASPIRIN_KEY, &[("1", "CHEMBL25"), ("2", "DB00945")]),
    )
}

// ============================================================================
// Catalog
// ============================================================================

/// Catalog where a competing writer sneaks in a record with the same key
/// just before our first insert
#[derive(Default)]
pub struct RacingCatalog {
    pub inner: InMemoryCatalog,
    raced: AtomicBool,
    pub competitor_id: Mutex<Option<Uuid>>,
}

#[async_trait]
impl CompoundCatalog for RacingCatalog {
    async fn find_by_exact(
        &self,
        field: DedupField,
        value: &str,
    ) -> Result<Option<CatalogRecord>, CatalogError> {
        self.inner.find_by_exact(field, value).await
    }

    async fn insert(&self, compound: &ResolvedCompound) -> Result<CatalogRecord, CatalogError> {
        if !self.raced.swap(true, Ordering::SeqCst) {
            let mut competitor = compound.clone();
            competitor.query = format!("{} (concurrent)", compound.query);
            let record = self.inner.insert(&competitor).await?;
            if let Ok(mut id) = self.competitor_id.lock() {
                *id = Some(record.compound_id);
            }
        }
        self.inner.insert(compound).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<CatalogRecord>, CatalogError> {
        self.inner.get(id).await
    }

    async fn count(&self) -> Result<u64, CatalogError> {
        self.inner.count().await
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<CatalogRecord>, CatalogError> {
        self.inner.search(query, limit).await
    }

    async fn purge_duplicates(&self) -> Result<PurgeReport, CatalogError> {
        self.inner.purge_duplicates().await
    }
}
