//! Catalog seeding from a name list
//!
//! Resolves names one at a time and stores them through the deduplication
//! engine. Names that do not resolve are skipped, not fatal; catalog errors
//! abort the run.

use crate::catalog::{DeduplicationEngine, StoreOutcome};
use crate::error::CatalogError;
use crate::resolve::Resolver;
use serde::Serialize;
use tracing::{info, warn};

/// Antibiotic and related compound names used when no list is supplied
pub const DEFAULT_SEED_NAMES: &[&str] = &[
    "Penicillin G", "Amoxicillin", "Tetracycline", "Ciprofloxacin",
    "Azithromycin", "Doxycycline", "Metronidazole", "Clindamycin",
    "Vancomycin", "Streptomycin", "Erythromycin", "Cephalexin",
    "Sulfamethoxazole", "Trimethoprim", "Levofloxacin", "Gentamicin",
    "Ampicillin", "Chloramphenicol", "Rifampicin", "Isoniazid",
    "Cefazolin", "Cefoxitin", "Cefuroxime", "Cefotaxime", "Ceftriaxone",
    "Cefepime", "Ceftaroline", "Imipenem", "Meropenem", "Ertapenem",
    "Doripenem", "Aztreonam", "Polymyxin B", "Colistin", "Bacitracin",
    "Neomycin", "Kanamycin", "Tobramycin", "Amikacin", "Netilmicin",
    "Spectinomycin", "Linezolid", "Tedizolid", "Daptomycin", "Fidaxomicin",
    "Rifaximin", "Telavancin", "Dalbavancin", "Oritavancin", "Fosfomycin",
    "Nitrofurantoin", "Methenamine", "Phenazopyridine", "Mupirocin", "Retapamulin",
    "Fusidic acid", "Gramicidin", "Tyrocidine", "Valinomycin", "Nisin",
    "Polymyxin E", "Capreomycin", "Cycloserine", "Ethambutol", "Pyrazinamide",
    "Dapsone", "Clofazimine", "Bedaquiline", "Delamanid", "Pretomanid",
    "Thiacetazone", "Ethionamide", "Prothionamide", "Para-aminosalicylic acid",
    "Viomycin", "Kanamycin A", "Arbekacin", "Dibekacin",
    "Sisomicin", "Isepamicin", "Plazomicin", "Apramycin", "Hygromycin B",
    "Puromycin", "Streptothricin", "Bleomycin", "Actinomycin D", "Mithramycin",
    "Doxorubicin", "Daunorubicin", "Epirubicin", "Idarubicin", "Mitoxantrone",
    "Bleomycin A2", "Bleomycin B2", "Plicamycin", "Valrubicin", "Zorubicin",
];

#[derive(Debug, Clone)]
pub struct SeedOptions {
    /// Stop once this many names were accepted (inserted or already present)
    pub limit: Option<usize>,
    /// Skip compounds without a standardized key
    pub require_key: bool,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            limit: Some(100),
            require_key: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedSkip {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub inserted: usize,
    pub existing: usize,
    pub skipped: Vec<SeedSkip>,
}

impl SeedReport {
    pub fn accepted(&self) -> usize {
        self.inserted + self.existing
    }

    fn skip(&mut self, name: &str, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(name, reason = %reason, "Seed name skipped");
        self.skipped.push(SeedSkip {
            name: name.to_string(),
            reason,
        });
    }
}

pub async fn seed_catalog<S: AsRef<str>>(
    resolver: &Resolver,
    engine: &DeduplicationEngine,
    names: &[S],
    options: &SeedOptions,
) -> Result<SeedReport, CatalogError> {
    let mut report = SeedReport::default();

    for name in names {
        let name = name.as_ref().trim();
        if name.is_empty() {
            continue;
        }
        if options.limit.is_some_and(|limit| report.accepted() >= limit) {
            info!(limit = ?options.limit, "Seed limit reached");
            break;
        }

        let compound = match resolver.resolve(name).await {
            Ok(compound) => compound,
            Err(e) => {
                report.skip(name, e.to_string());
                continue;
            }
        };
        if options.require_key && compound.inchi_key.is_none() {
            report.skip(name, "no standardized key found");
            continue;
        }

        match engine.deduplicate_and_store(&compound).await? {
            StoreOutcome::Inserted(_) => report.inserted += 1,
            StoreOutcome::Existing { matched_on, .. } => {
                info!(name, matched_on = %matched_on, "Already catalogued");
                report.existing += 1;
            }
        }
    }

    info!(
        inserted = report.inserted,
        existing = report.existing,
        skipped = report.skipped.len(),
        "Seeding finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_names_are_nonempty() {
        assert!(DEFAULT_SEED_NAMES.len() > 90);
        assert!(DEFAULT_SEED_NAMES.iter().all(|n| !n.trim().is_empty()));
    }

    #[test]
    fn test_default_options_require_key() {
        let options = SeedOptions::default();
        assert!(options.require_key);
        assert_eq!(options.limit, Some(100));
    }
}
