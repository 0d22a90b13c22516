//! Postgres-backed catalog
//!
//! Schema lives in `sql/schema.sql`; `ensure_schema` applies it idempotently.
//! Per-request diagnostics (`unavailable`) are not persisted.

use super::{fold_name, CompoundCatalog, DedupField, PurgeReport};
use crate::compound::{
    CatalogRecord, Fingerprint, ResolvedCompound, SourceLinks, StructureOrigin,
};
use crate::config::{mask_database_url, DatabaseConfig};
use crate::error::CatalogError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

const COLUMNS: &str = "compound_id, created_at, query, smiles_raw, smiles_normalized, \
     iupac_name, common_name, pubchem_cid, inchi, inchi_key, molecular_formula, \
     molecular_weight, fingerprint, structure_2d_svg, structure_origin, metadata";

#[derive(Debug, FromRow)]
struct CompoundRow {
    compound_id: Uuid,
    created_at: DateTime<Utc>,
    query: String,
    smiles_raw: Option<String>,
    smiles_normalized: Option<String>,
    iupac_name: Option<String>,
    common_name: Option<String>,
    pubchem_cid: Option<String>,
    inchi: Option<String>,
    inchi_key: Option<String>,
    molecular_formula: Option<String>,
    molecular_weight: Option<f64>,
    fingerprint: Option<String>,
    structure_2d_svg: Option<String>,
    structure_origin: Option<String>,
    metadata: serde_json::Value,
}

impl TryFrom<CompoundRow> for CatalogRecord {
    type Error = CatalogError;

    fn try_from(row: CompoundRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| CatalogError::Corrupt {
            id: row.compound_id.to_string(),
            reason,
        };

        let sources: SourceLinks = serde_json::from_value(row.metadata.clone())
            .map_err(|e| corrupt(format!("metadata: {}", e)))?;
        let fingerprint = match &row.fingerprint {
            Some(bits) => Some(
                Fingerprint::from_bit_string(bits.clone())
                    .ok_or_else(|| corrupt("fingerprint is not a bit-string".to_string()))?,
            ),
            None => None,
        };
        let structure_origin = match &row.structure_origin {
            Some(origin) => Some(
                StructureOrigin::parse(origin)
                    .ok_or_else(|| corrupt(format!("unknown structure origin '{}'", origin)))?,
            ),
            None => None,
        };

        Ok(CatalogRecord {
            compound_id: row.compound_id,
            created_at: row.created_at,
            compound: ResolvedCompound {
                query: row.query,
                smiles_raw: row.smiles_raw,
                smiles_normalized: row.smiles_normalized,
                systematic_name: row.iupac_name,
                common_name: row.common_name,
                registry_id: row.pubchem_cid,
                inchi: row.inchi,
                inchi_key: row.inchi_key,
                molecular_formula: row.molecular_formula,
                molecular_weight: row.molecular_weight,
                fingerprint,
                structure_svg: row.structure_2d_svg,
                sources,
                structure_origin,
                unavailable: Vec::new(),
            },
        })
    }
}

fn column_for(field: DedupField) -> &'static str {
    match field {
        DedupField::InchiKey => "inchi_key",
        DedupField::SmilesNormalized => "smiles_normalized",
        DedupField::SmilesRaw => "smiles_raw",
        DedupField::CommonName => "common_name_folded",
    }
}

/// Escape LIKE wildcards in user input
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self, CatalogError> {
        info!(
            "Connecting to catalog database: {}",
            mask_database_url(&config.database_url)
        );

        let mut options = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs));
        if let Some(idle) = config.idle_timeout_secs {
            options = options.idle_timeout(Duration::from_secs(idle));
        }

        let pool = options.connect(&config.database_url).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the table and indexes if missing
    pub async fn ensure_schema(&self) -> Result<(), CatalogError> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;
        info!("Catalog schema ensured");
        Ok(())
    }
}

#[async_trait]
impl CompoundCatalog for PgCatalog {
    async fn find_by_exact(
        &self,
        field: DedupField,
        value: &str,
    ) -> Result<Option<CatalogRecord>, CatalogError> {
        let sql = format!(
            "SELECT {} FROM compounds WHERE {} = $1 ORDER BY created_at, compound_id LIMIT 1",
            COLUMNS,
            column_for(field)
        );
        let row = sqlx::query_as::<_, CompoundRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        row.map(CatalogRecord::try_from).transpose()
    }

    async fn insert(&self, compound: &ResolvedCompound) -> Result<CatalogRecord, CatalogError> {
        let compound_id = Uuid::new_v4();
        let created_at = Utc::now();
        let metadata = serde_json::to_value(&compound.sources)?;

        let result = sqlx::query(
            r#"
            INSERT INTO compounds
                (compound_id, created_at, query, smiles_raw, smiles_normalized, iupac_name,
                 common_name, common_name_folded, pubchem_cid, inchi, inchi_key,
                 molecular_formula, molecular_weight, fingerprint, structure_2d_svg,
                 structure_origin, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(compound_id)
        .bind(created_at)
        .bind(&compound.query)
        .bind(&compound.smiles_raw)
        .bind(&compound.smiles_normalized)
        .bind(&compound.systematic_name)
        .bind(&compound.common_name)
        .bind(compound.common_name.as_deref().map(fold_name))
        .bind(&compound.registry_id)
        .bind(&compound.inchi)
        .bind(&compound.inchi_key)
        .bind(&compound.molecular_formula)
        .bind(compound.molecular_weight)
        .bind(compound.fingerprint.as_ref().map(|f| f.as_str().to_string()))
        .bind(&compound.structure_svg)
        .bind(compound.structure_origin.map(|o| o.as_str()))
        .bind(metadata)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(CatalogRecord {
                compound_id,
                created_at,
                compound: ResolvedCompound {
                    unavailable: Vec::new(),
                    ..compound.clone()
                },
            }),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(CatalogError::Duplicate {
                    key: compound.inchi_key.clone().unwrap_or_default(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<CatalogRecord>, CatalogError> {
        let sql = format!("SELECT {} FROM compounds WHERE compound_id = $1", COLUMNS);
        let row = sqlx::query_as::<_, CompoundRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(CatalogRecord::try_from).transpose()
    }

    async fn count(&self) -> Result<u64, CatalogError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM compounds")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<CatalogRecord>, CatalogError> {
        let needle = query.trim().to_lowercase();
        let sql = format!(
            r#"
            SELECT {}
            FROM compounds
            WHERE $1 = ''
               OR LOWER(iupac_name) LIKE $2
               OR LOWER(common_name) LIKE $2
               OR LOWER(smiles_normalized) LIKE $2
               OR LOWER(smiles_raw) LIKE $2
               OR LOWER(inchi_key) LIKE $2
               OR LOWER(molecular_formula) LIKE $2
            ORDER BY LOWER(common_name) ASC NULLS LAST,
                     LOWER(iupac_name) ASC NULLS LAST,
                     created_at ASC
            LIMIT $3
            "#,
            COLUMNS
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        sqlx::query_as::<_, CompoundRow>(&sql)
            .bind(&needle)
            .bind(like_pattern(&needle))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(CatalogRecord::try_from)
            .collect()
    }

    async fn purge_duplicates(&self) -> Result<PurgeReport, CatalogError> {
        let removed: Vec<(Uuid, String)> = sqlx::query_as(
            r#"
            DELETE FROM compounds c
            USING (
                SELECT compound_id,
                       ROW_NUMBER() OVER (
                           PARTITION BY inchi_key ORDER BY created_at, compound_id
                       ) AS rn
                FROM compounds
                WHERE inchi_key IS NOT NULL
            ) ranked
            WHERE c.compound_id = ranked.compound_id AND ranked.rn > 1
            RETURNING c.compound_id, c.inchi_key
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let keys: BTreeSet<String> = removed.iter().map(|(_, key)| key.clone()).collect();
        let report = PurgeReport {
            duplicate_keys: keys.into_iter().collect(),
            removed: removed.into_iter().map(|(id, _)| id).collect(),
        };
        info!(
            keys = report.duplicate_keys.len(),
            removed = report.removed.len(),
            "Duplicate purge complete"
        );
        Ok(report)
    }
}
