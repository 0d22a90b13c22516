//! Compound catalog command line interface
//!
//! # Usage
//!
//! ```bash
//! # Resolve an identifier and print the merged record
//! compound_cli resolve "Aspirin"
//!
//! # Resolve and store, skipping duplicates
//! compound_cli store BSYNRYMUTXBXSQ-UHFFFAOYSA-N
//!
//! # Seed the catalog from the built-in antibiotic list (or a file, one name per line)
//! compound_cli seed --limit 20
//! compound_cli seed --file names.txt --allow-keyless
//!
//! # Maintenance
//! compound_cli init-db
//! compound_cli purge-duplicates
//! compound_cli search penicillin
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use compound_resolver::catalog::{
    CompoundCatalog, DeduplicationEngine, InMemoryCatalog, PgCatalog, StoreOutcome,
};
use compound_resolver::compound::ResolvedCompound;
use compound_resolver::config::ResolverConfig;
use compound_resolver::resolve::Resolver;
use compound_resolver::seed::{seed_catalog, SeedOptions, DEFAULT_SEED_NAMES};
use compound_resolver::xref::SourceCatalogCache;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "compound_cli")]
#[command(version = "0.1.0")]
#[command(about = "Resolve chemical identifiers and maintain the compound catalog")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML configuration file (environment variables still override it)
    #[arg(long, global = true, env = "COMPOUND_CONFIG")]
    config: Option<PathBuf>,

    /// Use a throwaway in-memory catalog instead of Postgres
    #[arg(long, global = true)]
    dry_run: bool,

    /// Output format
    #[arg(long, short = 'o', global = true, default_value = "pretty", value_enum)]
    format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve an identifier and print the merged record (nothing is stored)
    Resolve { identifier: String },

    /// Resolve an identifier and store it unless already catalogued
    Store { identifier: String },

    /// Resolve and store a list of names
    Seed {
        /// One name per line; the built-in antibiotic list when omitted
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Stop after this many names were accepted
        #[arg(short, long, default_value_t = 100)]
        limit: usize,

        /// Also store compounds without a standardized key (link-only records)
        #[arg(long)]
        allow_keyless: bool,
    },

    /// Keep the earliest record per standardized key and delete the rest
    PurgeDuplicates,

    /// Search catalogued compounds by name, structure, key or formula
    Search {
        query: String,

        #[arg(short, long, default_value_t = 25)]
        limit: usize,
    },

    /// Create the catalog schema
    InitDb,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(Level::WARN.into())
                .add_directive("compound_resolver=info".parse().unwrap_or_else(|_| Level::INFO.into())),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = cli.format;

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if format == OutputFormat::Json {
                println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
            } else {
                eprintln!("{}: {:#}", "error".red().bold(), e);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ResolverConfig::from_yaml_file(path)?,
        None => ResolverConfig::from_env(),
    };

    match cli.command {
        Commands::Resolve { identifier } => {
            let resolver = build_resolver(&config)?;
            let compound = resolver.resolve(&identifier).await?;
            print_compound(&compound, cli.format)
        }
        Commands::Store { identifier } => {
            let resolver = build_resolver(&config)?;
            let engine = DeduplicationEngine::new(open_catalog(&config, cli.dry_run).await?);
            let compound = resolver.resolve(&identifier).await?;
            let outcome = engine.deduplicate_and_store(&compound).await?;
            print_outcome(&outcome, cli.format)
        }
        Commands::Seed {
            file,
            limit,
            allow_keyless,
        } => {
            let names = match file {
                Some(path) => read_names(&path)?,
                None => DEFAULT_SEED_NAMES.iter().map(|s| s.to_string()).collect(),
            };
            let resolver = build_resolver(&config)?;
            let engine = DeduplicationEngine::new(open_catalog(&config, cli.dry_run).await?);
            let options = SeedOptions {
                limit: Some(limit),
                require_key: !allow_keyless,
            };
            let report = seed_catalog(&resolver, &engine, &names, &options).await?;

            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Pretty => {
                    println!(
                        "{} inserted {}, already present {}, skipped {}",
                        "Seeding finished:".green().bold(),
                        report.inserted,
                        report.existing,
                        report.skipped.len()
                    );
                    for skip in &report.skipped {
                        println!("  {} {} ({})", "-".yellow(), skip.name, skip.reason);
                    }
                }
            }
            Ok(())
        }
        Commands::PurgeDuplicates => {
            let catalog = open_catalog(&config, cli.dry_run).await?;
            let report = catalog.purge_duplicates().await?;
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Pretty if report.is_clean() => {
                    println!("{}", "No duplicate compounds found.".green())
                }
                OutputFormat::Pretty => {
                    for key in &report.duplicate_keys {
                        println!("  {} {}", "duplicate key".yellow(), key);
                    }
                    println!(
                        "{} removed {} record(s)",
                        "Purge complete:".green().bold(),
                        report.removed.len()
                    );
                }
            }
            Ok(())
        }
        Commands::Search { query, limit } => {
            let catalog = open_catalog(&config, cli.dry_run).await?;
            let records = catalog.search(&query, limit).await?;
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
                OutputFormat::Pretty => {
                    if records.is_empty() {
                        println!("{}", "No compounds found.".yellow());
                    }
                    for record in &records {
                        println!(
                            "{}  {}  {}",
                            record.compound_id.to_string().dimmed(),
                            record.compound.display_name().bold(),
                            record.compound.molecular_formula.as_deref().unwrap_or("-")
                        );
                    }
                }
            }
            Ok(())
        }
        Commands::InitDb => {
            let catalog = PgCatalog::connect(&config.database).await?;
            catalog.ensure_schema().await?;
            println!("{}", "Catalog schema ready.".green());
            Ok(())
        }
    }
}

fn build_resolver(config: &ResolverConfig) -> Result<Resolver> {
    Resolver::from_config(config, Arc::new(SourceCatalogCache::new()))
        .context("Failed to build source clients")
}

async fn open_catalog(config: &ResolverConfig, dry_run: bool) -> Result<Arc<dyn CompoundCatalog>> {
    if dry_run {
        return Ok(Arc::new(InMemoryCatalog::new()));
    }
    let catalog = PgCatalog::connect(&config.database)
        .await
        .context("Failed to connect to the catalog database")?;
    Ok(Arc::new(catalog))
}

fn read_names(path: &PathBuf) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

fn print_compound(compound: &ResolvedCompound, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(compound)?),
        OutputFormat::Pretty => {
            println!("{}", compound.display_name().cyan().bold());
            let rows = [
                ("structure", compound.smiles_raw.as_deref()),
                ("normalized", compound.smiles_normalized.as_deref()),
                ("iupac name", compound.systematic_name.as_deref()),
                ("pubchem cid", compound.registry_id.as_deref()),
                ("inchi key", compound.inchi_key.as_deref()),
                ("formula", compound.molecular_formula.as_deref()),
            ];
            for (label, value) in rows {
                println!("  {:<12} {}", label, value.unwrap_or("-"));
            }
            if let Some(weight) = compound.molecular_weight {
                println!("  {:<12} {:.4}", "weight", weight);
            }
            for link in compound.sources.iter() {
                println!("  {:<12} {} {}", "source", link.source.green(), link.url);
            }
            for failure in &compound.unavailable {
                println!(
                    "  {:<12} {} {}: {}",
                    "unavailable",
                    failure.source.yellow(),
                    failure.operation,
                    failure.reason
                );
            }
        }
    }
    Ok(())
}

fn print_outcome(outcome: &StoreOutcome, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(outcome)?),
        OutputFormat::Pretty => match outcome {
            StoreOutcome::Inserted(record) => println!(
                "{} {} ({})",
                "Stored".green().bold(),
                record.compound.display_name(),
                record.compound_id
            ),
            StoreOutcome::Existing { record, matched_on } => println!(
                "{} {} ({}), matched on {}",
                "Already catalogued:".yellow().bold(),
                record.compound.display_name(),
                record.compound_id,
                matched_on
            ),
        },
    }
    Ok(())
}
