//! Resolution pipeline

use crate::classify::{classify, ClassifiedIdentifier, IdentifierKind};
use crate::compound::{
    fill_once, Fingerprint, ResolvedCompound, SourceFailure, SourceLink, StructureOrigin,
    FINGERPRINT_BITS, USER_PROVIDED_SOURCE,
};
use crate::config::ResolverConfig;
use crate::error::{ResolveError, SourceError, ToolkitError};
use crate::sources::{
    ChemblSource, CompoundSource, Lookup, PubChemSource, SourceCapability, UniChemSource,
};
use crate::toolkit::{RemoteToolkit, Structure, StructureToolkit};
use crate::xref::{CrossReferenceAugmenter, SourceCatalogCache};
use std::sync::Arc;
use tracing::{debug, info, warn};

const TOOLKIT_SOURCE: &str = "structure-toolkit";

/// Sequences classifier, sources, toolkit and cross-reference augmentation
pub struct Resolver {
    toolkit: Arc<dyn StructureToolkit>,
    primary: Arc<dyn CompoundSource>,
    secondary: Arc<dyn CompoundSource>,
    augmenter: CrossReferenceAugmenter,
}

impl Resolver {
    pub fn new(
        toolkit: Arc<dyn StructureToolkit>,
        primary: Arc<dyn CompoundSource>,
        secondary: Arc<dyn CompoundSource>,
        augmenter: CrossReferenceAugmenter,
    ) -> Self {
        Self {
            toolkit,
            primary,
            secondary,
            augmenter,
        }
    }

    /// Build the production wiring: PubChem, ChEMBL, UniChem and the remote toolkit.
    ///
    /// The cache is shared so that several resolvers in one process resolve the
    /// registry source id only once.
    pub fn from_config(
        config: &ResolverConfig,
        cache: Arc<SourceCatalogCache>,
    ) -> Result<Self, SourceError> {
        let primary: Arc<dyn CompoundSource> = Arc::new(PubChemSource::from_config(config)?);
        let secondary: Arc<dyn CompoundSource> = Arc::new(ChemblSource::from_config(config)?);
        let registry: Arc<dyn CompoundSource> = Arc::new(UniChemSource::from_config(config)?);
        let toolkit: Arc<dyn StructureToolkit> =
            Arc::new(RemoteToolkit::new(&config.endpoints, &config.http)?);

        let augmenter = CrossReferenceAugmenter::new(
            registry,
            primary.clone(),
            cache,
            config.cross_reference.clone(),
        );
        Ok(Self::new(toolkit, primary, secondary, augmenter))
    }

    /// Resolve one identifier into a merged compound record.
    ///
    /// Source and toolkit failures never abort resolution; they leave fields
    /// empty and are listed in `unavailable`. Fails only when the input is
    /// empty or nothing at all could be established.
    pub async fn resolve(&self, identifier: &str) -> Result<ResolvedCompound, ResolveError> {
        let text = identifier.trim();
        if text.is_empty() {
            return Err(ResolveError::EmptyIdentifier);
        }

        let classified = classify(text);
        debug!(identifier = %text, kind = %classified.kind(), "Resolving identifier");

        let mut compound = ResolvedCompound::new(text);
        fill_once(
            &mut compound.inchi_key,
            classified.standardized_key().map(str::to_string),
        );

        // Step 1: the input itself may be a structure
        let user_structure = self.parse_user_structure(&mut compound).await;

        // Steps 2-4 run alongside the secondary lookup; the merge order is fixed below
        let (_, secondary) = tokio::join!(
            self.primary_chain(&classified, &mut compound, user_structure.as_ref()),
            self.secondary_structure(text),
        );

        // Step 5
        self.merge_secondary(&mut compound, secondary);

        let structure = match user_structure {
            Some(structure) => Some(structure),
            None => self.parse_source_structure(&mut compound).await,
        };

        // Step 6
        if let Some(structure) = &structure {
            self.derive_identifiers(&mut compound, structure).await;
        }

        // Step 7
        if compound.inchi_key.is_some() || compound.registry_id.is_some() {
            self.augmenter.augment(&mut compound).await;
        }

        // Step 8
        if let Some(structure) = &structure {
            self.compute_descriptors(&mut compound, structure).await;
        }

        if !compound.has_structure() && compound.sources.is_empty() {
            info!(identifier = %text, "Identifier could not be resolved");
            return Err(ResolveError::Unresolvable {
                identifier: text.to_string(),
            });
        }

        info!(
            identifier = %text,
            inchi_key = compound.inchi_key.as_deref().unwrap_or("-"),
            sources = compound.sources.len(),
            link_only = compound.is_link_only(),
            "Identifier resolved"
        );
        Ok(compound)
    }

    async fn parse_user_structure(&self, compound: &mut ResolvedCompound) -> Option<Structure> {
        let text = compound.query.clone();
        let structure = toolkit_value(compound, "parse", self.toolkit.parse(&text).await)?;

        compound.smiles_raw = Some(text);
        compound.structure_origin = Some(StructureOrigin::UserProvided);
        compound
            .sources
            .add(SourceLink::new(USER_PROVIDED_SOURCE, "#"));
        debug!(identifier = %compound.query, "Input parsed as a structure");
        Some(structure)
    }

    /// Steps 3, 2 and 4, in that order
    async fn primary_chain(
        &self,
        classified: &ClassifiedIdentifier,
        compound: &mut ResolvedCompound,
        user_structure: Option<&Structure>,
    ) {
        // Step 3
        if let Some(structure) = user_structure {
            if compound.inchi_key.is_none() {
                self.derive_key(compound, structure).await;
            }
        }

        // Step 2
        let Some(registry_id) = self.registry_id(classified, compound).await else {
            debug!(identifier = %compound.query, "No registry id");
            return;
        };

        // Step 4
        fill_once(&mut compound.registry_id, Some(registry_id.clone()));
        let source = self.primary.source_name();
        compound
            .sources
            .add(SourceLink::new(source, self.primary.reference_url(&registry_id)));

        if compound.inchi_key.is_none() && self.primary.supports(SourceCapability::KeyById) {
            let lookup = self.primary.key_by_id(&registry_id).await;
            record(compound, source, SourceCapability::KeyById, &lookup);
            fill_once(&mut compound.inchi_key, lookup.found());
        }

        if !compound.has_structure() && self.primary.supports(SourceCapability::StructureById) {
            let lookup = self.primary.structure_by_id(&registry_id).await;
            record(compound, source, SourceCapability::StructureById, &lookup);
            if fill_once(&mut compound.smiles_raw, lookup.found()) {
                compound.structure_origin = Some(StructureOrigin::PrimarySource);
            }
        }

        if !compound.has_names() && self.primary.supports(SourceCapability::NamesById) {
            let lookup = self.primary.names_by_id(&registry_id).await;
            record(compound, source, SourceCapability::NamesById, &lookup);
            if let Some(names) = lookup.found() {
                if let Some(reason) = names.partial_failure {
                    warn!(source, operation = %SourceCapability::NamesById, reason = %reason, "Names incomplete");
                    compound.unavailable.push(SourceFailure {
                        source: source.to_string(),
                        operation: SourceCapability::NamesById.to_string(),
                        reason,
                    });
                }
                fill_once(&mut compound.systematic_name, names.systematic);
                fill_once(&mut compound.common_name, names.common);
            }
        }
    }

    /// Step 2: number as-is, else by key, else by name
    async fn registry_id(
        &self,
        classified: &ClassifiedIdentifier,
        compound: &mut ResolvedCompound,
    ) -> Option<String> {
        if classified.kind() == IdentifierKind::RegistryNumber {
            return Some(classified.text().to_string());
        }

        let source = self.primary.source_name();
        if let Some(key) = compound.inchi_key.clone() {
            if self.primary.supports(SourceCapability::IdByKey) {
                let lookup = self.primary.resolve_id_by_key(&key).await;
                record(compound, source, SourceCapability::IdByKey, &lookup);
                if let Some(id) = lookup.found() {
                    return Some(id);
                }
            }
        }

        if self.primary.supports(SourceCapability::IdByName) {
            let lookup = self.primary.resolve_id_by_name(classified.text()).await;
            record(compound, source, SourceCapability::IdByName, &lookup);
            return lookup.found();
        }
        None
    }

    async fn secondary_structure(&self, text: &str) -> Lookup<String> {
        if !self.secondary.supports(SourceCapability::StructureByName) {
            return Lookup::Unsupported;
        }
        self.secondary.structure_by_name(text).await
    }

    fn merge_secondary(&self, compound: &mut ResolvedCompound, lookup: Lookup<String>) {
        let source = self.secondary.source_name();
        record(compound, source, SourceCapability::StructureByName, &lookup);

        let Some(notation) = lookup.found().filter(|s| !s.trim().is_empty()) else {
            return;
        };
        if fill_once(&mut compound.smiles_raw, Some(notation)) {
            compound.structure_origin = Some(StructureOrigin::SecondarySource);
        }
        let url = self.secondary.reference_url(&compound.query);
        compound.sources.add(SourceLink::new(source, url));
    }

    async fn parse_source_structure(&self, compound: &mut ResolvedCompound) -> Option<Structure> {
        let notation = compound.smiles_raw.clone()?;
        let parsed = self.toolkit.parse(&notation).await;
        if let Err(ToolkitError::Unparseable { .. }) = &parsed {
            warn!(
                identifier = %compound.query,
                notation = %notation,
                "Source structure could not be parsed; derived fields stay empty"
            );
        }
        toolkit_value(compound, "parse", parsed)
    }

    async fn derive_key(&self, compound: &mut ResolvedCompound, structure: &Structure) {
        let long = self.toolkit.long_identifier(structure).await;
        let Some(inchi) = toolkit_value(compound, "long_identifier", long) else {
            return;
        };
        let key = self.toolkit.short_hash(&inchi).await;
        let key = toolkit_value(compound, "short_hash", key);
        fill_once(&mut compound.inchi, Some(inchi));
        fill_once(&mut compound.inchi_key, key);
    }

    /// Step 6
    async fn derive_identifiers(&self, compound: &mut ResolvedCompound, structure: &Structure) {
        if compound.inchi.is_none() {
            self.derive_key(compound, structure).await;
        }
        let svg = self.toolkit.depict(structure).await;
        let svg = toolkit_value(compound, "depict", svg);
        fill_once(&mut compound.structure_svg, svg);
    }

    /// Step 8. The fingerprint is taken from the parsed normalized form so that
    /// notations of the same compound produce identical bits.
    async fn compute_descriptors(&self, compound: &mut ResolvedCompound, structure: &Structure) {
        let formula = self.toolkit.formula(structure).await;
        let formula = toolkit_value(compound, "formula", formula);
        fill_once(&mut compound.molecular_formula, formula);

        let weight = self.toolkit.exact_weight(structure).await;
        let weight = toolkit_value(compound, "exact_weight", weight);
        fill_once(&mut compound.molecular_weight, weight);

        let canonical = self.toolkit.canonical_form(structure).await;
        let Some(canonical) = toolkit_value(compound, "canonical_form", canonical) else {
            return;
        };
        fill_once(&mut compound.smiles_normalized, Some(canonical.clone()));

        let normalized = self.toolkit.parse(&canonical).await;
        let Some(normalized) = toolkit_value(compound, "parse", normalized) else {
            return;
        };
        let bits = self.toolkit.fingerprint(&normalized, FINGERPRINT_BITS).await;
        let fingerprint = toolkit_value(compound, "fingerprint", bits)
            .filter(|bits| bits.len() == FINGERPRINT_BITS)
            .and_then(Fingerprint::from_bit_string);
        if fingerprint.is_none() {
            debug!(identifier = %compound.query, "No fingerprint computed");
        }
        fill_once(&mut compound.fingerprint, fingerprint);
    }
}

/// Append a diagnostic entry when a source call was downgraded
fn record<T>(
    compound: &mut ResolvedCompound,
    source: &str,
    capability: SourceCapability,
    lookup: &Lookup<T>,
) {
    if let Some(failure) = lookup.failure(source, capability) {
        compound.unavailable.push(failure);
    }
}

/// Turn a toolkit result into an optional value.
///
/// Unparseable notations are expected (names are tried as structures first);
/// an unreachable toolkit is recorded like an unavailable source.
fn toolkit_value<T>(
    compound: &mut ResolvedCompound,
    operation: &str,
    result: Result<T, ToolkitError>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(ToolkitError::Unparseable { notation }) => {
            debug!(notation = %notation, operation, "Not a parseable structure");
            None
        }
        Err(e) => {
            warn!(identifier = %compound.query, operation, error = %e, "Structure toolkit failed");
            compound.unavailable.push(SourceFailure {
                source: TOOLKIT_SOURCE.to_string(),
                operation: operation.to_string(),
                reason: e.to_string(),
            });
            None
        }
    }
}
