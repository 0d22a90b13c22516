//! Deduplication, seeding and purge against the in-memory catalog

mod helpers;

use chrono::{Duration, Utc};
use compound_resolver::catalog::{
    CompoundCatalog, DedupField, DeduplicationEngine, InMemoryCatalog, StoreOutcome,
};
use compound_resolver::compound::{CatalogRecord, ResolvedCompound};
use compound_resolver::seed::{seed_catalog, SeedOptions};
use helpers::{aspirin_harness, Harness, RacingCatalog, ScriptedSource, ASPIRIN_KEY, ASPIRIN_SMILES};
use std::sync::Arc;
use uuid::Uuid;

fn compound(query: &str) -> ResolvedCompound {
    ResolvedCompound::new(query)
}

fn record(query: &str, key: Option<&str>, age_minutes: i64) -> CatalogRecord {
    let mut c = compound(query);
    c.inchi_key = key.map(str::to_string);
    CatalogRecord {
        compound_id: Uuid::new_v4(),
        created_at: Utc::now() - Duration::minutes(age_minutes),
        compound: c,
    }
}

// ============================================================================
// Deduplication
// ============================================================================

#[tokio::test]
async fn test_resolved_aspirin_stored_once() {
    let harness = aspirin_harness();
    let engine = DeduplicationEngine::new(Arc::new(InMemoryCatalog::new()));

    let by_name = harness.resolver.resolve("Aspirin").await.unwrap();
    let first = engine.deduplicate_and_store(&by_name).await.unwrap();
    assert!(matches!(first, StoreOutcome::Inserted(_)));

    let by_key = harness.resolver.resolve(ASPIRIN_KEY).await.unwrap();
    let second = engine.deduplicate_and_store(&by_key).await.unwrap();

    match second {
        StoreOutcome::Existing { record, matched_on } => {
            assert_eq!(matched_on, DedupField::InchiKey);
            assert_eq!(record.compound_id, first.record().compound_id);
            assert_eq!(record.compound.query, "Aspirin");
        }
        other => panic!("expected existing record, got {:?}", other),
    }
    assert_eq!(engine.catalog().count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_raw_structure_match_beats_name_match() {
    let catalog = Arc::new(InMemoryCatalog::new());

    let mut by_structure = compound("ethanol entry");
    by_structure.smiles_raw = Some("CCO".to_string());
    by_structure.common_name = Some("Ethanol".to_string());
    let structure_record = catalog.insert(&by_structure).await.unwrap();

    let mut by_name = compound("alcohol entry");
    by_name.smiles_raw = Some("OCC".to_string());
    by_name.common_name = Some("Alcohol".to_string());
    catalog.insert(&by_name).await.unwrap();

    let engine = DeduplicationEngine::new(catalog);
    let mut candidate = compound("candidate");
    candidate.smiles_raw = Some("CCO".to_string());
    candidate.common_name = Some("ALCOHOL".to_string());

    let found = engine.find_existing(&candidate).await.unwrap().unwrap();
    assert_eq!(found.matched_on, DedupField::SmilesRaw);
    assert_eq!(found.record.compound_id, structure_record.compound_id);
}

#[tokio::test]
async fn test_normalized_structure_match() {
    let harness = Harness::offline();
    let engine = DeduplicationEngine::new(Arc::new(InMemoryCatalog::new()));

    let mut stored = harness.resolver.resolve("CCO").await.unwrap();
    // Keep the key out of it so the normalized form decides
    stored.inchi_key = None;
    engine.deduplicate_and_store(&stored).await.unwrap();

    let mut candidate = harness.resolver.resolve("OCC").await.unwrap();
    candidate.inchi_key = None;
    let outcome = engine.deduplicate_and_store(&candidate).await.unwrap();

    match outcome {
        StoreOutcome::Existing { matched_on, .. } => {
            assert_eq!(matched_on, DedupField::SmilesNormalized)
        }
        other => panic!("expected existing record, got {:?}", other),
    }
}

#[tokio::test]
async fn test_common_name_compared_case_folded() {
    let catalog = Arc::new(InMemoryCatalog::new());
    let mut stored = compound("Aspirin");
    stored.common_name = Some("Aspirin".to_string());
    catalog.insert(&stored).await.unwrap();

    let engine = DeduplicationEngine::new(catalog);
    let mut candidate = compound("ASPIRIN");
    candidate.common_name = Some("ＡＳＰＩＲＩＮ".to_string());

    let found = engine.find_existing(&candidate).await.unwrap().unwrap();
    assert_eq!(found.matched_on, DedupField::CommonName);
}

#[tokio::test]
async fn test_lost_insert_race_returns_winner() {
    let catalog = Arc::new(RacingCatalog::default());
    let engine = DeduplicationEngine::new(catalog.clone());

    let mut aspirin = compound("Aspirin");
    aspirin.inchi_key = Some(ASPIRIN_KEY.to_string());
    aspirin.smiles_raw = Some(ASPIRIN_SMILES.to_string());

    let outcome = engine.deduplicate_and_store(&aspirin).await.unwrap();

    let winner = (*catalog.competitor_id.lock().unwrap()).unwrap();
    match outcome {
        StoreOutcome::Existing { record, matched_on } => {
            assert_eq!(matched_on, DedupField::InchiKey);
            assert_eq!(record.compound_id, winner);
        }
        other => panic!("expected existing record, got {:?}", other),
    }
    assert_eq!(catalog.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_link_only_record_is_stored() {
    let harness = Harness::new(
        ScriptedSource::pubchem().with_id_by_name("Mystery", "999"),
        ScriptedSource::chembl(),
        ScriptedSource::unichem(),
    );
    let engine = DeduplicationEngine::new(Arc::new(InMemoryCatalog::new()));

    let resolved = harness.resolver.resolve("Mystery").await.unwrap();
    let outcome = engine.deduplicate_and_store(&resolved).await.unwrap();

    let stored = engine
        .catalog()
        .get(outcome.record().compound_id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.compound.smiles_raw.is_none());
    assert!(stored.compound.fingerprint.is_none());
    assert_eq!(stored.compound.registry_id.as_deref(), Some("999"));
    assert!(stored.compound.sources.contains("PubChem"));
}

// ============================================================================
// Seeding
// ============================================================================

fn seeding_harness() -> Harness {
    Harness::new(
        ScriptedSource::pubchem()
            .with_id_by_name("Aspirin", "2244")
            .with_id_by_name("Acetylsalicylic acid", "2244")
            .with_key_by_id("2244", ASPIRIN_KEY)
            .with_structure_by_id("2244", ASPIRIN_SMILES)
            .with_id_by_name("Unkeyed", "999"),
        ScriptedSource::chembl(),
        ScriptedSource::unichem(),
    )
}

#[tokio::test]
async fn test_seed_counts_inserted_existing_and_skipped() {
    let harness = seeding_harness();
    let engine = DeduplicationEngine::new(Arc::new(InMemoryCatalog::new()));
    let names = ["Aspirin", "  ", "Unkeyed", "Acetylsalicylic acid", "Mystery"];

    let report = seed_catalog(&harness.resolver, &engine, &names, &SeedOptions::default())
        .await
        .unwrap();

    assert_eq!(report.inserted, 1);
    assert_eq!(report.existing, 1);
    let skipped: Vec<_> = report.skipped.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(skipped, vec!["Unkeyed", "Mystery"]);
    assert_eq!(engine.catalog().count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_seed_without_key_requirement_keeps_link_only() {
    let harness = seeding_harness();
    let engine = DeduplicationEngine::new(Arc::new(InMemoryCatalog::new()));
    let options = SeedOptions {
        limit: None,
        require_key: false,
    };

    let report = seed_catalog(&harness.resolver, &engine, &["Unkeyed"], &options)
        .await
        .unwrap();

    assert_eq!(report.inserted, 1);
    assert!(report.skipped.is_empty());
}

#[tokio::test]
async fn test_seed_limit_counts_accepted_names() {
    let harness = Harness::offline();
    let catalog = Arc::new(InMemoryCatalog::new());
    let engine = DeduplicationEngine::new(catalog.clone());
    let names = vec![
        "Mystery".to_string(),
        "CCO".to_string(),
        "CCN".to_string(),
        "CCC".to_string(),
    ];
    let options = SeedOptions {
        limit: Some(2),
        require_key: true,
    };

    let report = seed_catalog(&harness.resolver, &engine, &names, &options)
        .await
        .unwrap();

    assert_eq!(report.accepted(), 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(engine.catalog().count().await.unwrap(), 2);
    let queries: Vec<_> = catalog
        .records()
        .await
        .into_iter()
        .map(|r| r.compound.query)
        .collect();
    assert_eq!(queries, vec!["CCO", "CCN"]);
}

// ============================================================================
// Purge
// ============================================================================

#[tokio::test]
async fn test_purge_keeps_earliest_record_per_key() {
    let oldest = record("Aspirin", Some(ASPIRIN_KEY), 30);
    let newer = record("aspirin again", Some(ASPIRIN_KEY), 10);
    let other = record("Ethanol", Some("LFQSCWFLJHTTHZ-UHFFFAOYSA-N"), 20);
    let unkeyed = record("Mystery", None, 5);
    let catalog = InMemoryCatalog::with_records(vec![
        newer.clone(),
        oldest.clone(),
        other.clone(),
        unkeyed.clone(),
    ]);

    let report = catalog.purge_duplicates().await.unwrap();

    assert_eq!(report.duplicate_keys, vec![ASPIRIN_KEY.to_string()]);
    assert_eq!(report.removed, vec![newer.compound_id]);
    assert_eq!(catalog.count().await.unwrap(), 3);
    assert!(catalog.get(oldest.compound_id).await.unwrap().is_some());
    assert!(catalog.get(unkeyed.compound_id).await.unwrap().is_some());

    assert!(catalog.purge_duplicates().await.unwrap().is_clean());
}
