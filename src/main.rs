//! # brickdex CLI (`bdx`)
//!
//! The `bdx` binary is the primary interface for brickdex. It provides
//! commands for store initialization, batch ingestion of the tabular part
//! and category sources, secondary-catalog reconciliation, category
//! reporting, search-index export, and part lookup.
//!
//! ## Usage
//!
//! ```bash
//! bdx --config ./config/bdx.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `bdx init` | Create the SQLite store and run schema migrations |
//! | `bdx ingest` | Load categories, parts, and relationships from CSV |
//! | `bdx reconcile` | Merge the secondary catalog into the store |
//! | `bdx report` | Print part counts per top-level category |
//! | `bdx index` | Write the denormalized search index artifact |
//! | `bdx find "<text>"` | Look up parts by number or name substring |
//! | `bdx stats` | Show store counts and last-run times |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the store
//! bdx init --config ./config/bdx.toml
//!
//! # Load the authoritative catalog
//! bdx ingest --config ./config/bdx.toml
//!
//! # Enrich it from the scraped catalog
//! bdx reconcile --config ./config/bdx.toml
//!
//! # Export the search index for the UI
//! bdx index --config ./config/bdx.toml
//!
//! # Find bricks
//! bdx find "2x4" --config ./config/bdx.toml
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use brickdex::{aggregate, config, find, index, ingest, migrate, reconcile, stats};

/// brickdex — a batch ingestion, reconciliation, and search tool for
/// building-block part catalogs.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file naming the store path and the tabular sources.
#[derive(Parser)]
#[command(
    name = "bdx",
    about = "brickdex — batch ingestion, reconciliation, and search for part catalogs",
    version,
    long_about = "brickdex loads a building-block part catalog from tabular sources into a \
    SQLite store, reconciles it against an independently scraped catalog (exact identifier \
    match with a normalized fallback), aggregates part counts over the category hierarchy, \
    and exports a denormalized search index for the desktop UI."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/bdx.toml`. The store path, source file paths,
    /// and report paths are read from this file.
    #[arg(long, global = true, default_value = "./config/bdx.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the store schema.
    ///
    /// Creates the SQLite file and all required tables (categories, parts,
    /// part_relationships, ingest_runs) plus indexes. Idempotent — running
    /// it multiple times is safe.
    Init,

    /// Load the tabular sources into the store.
    ///
    /// Reads the category, authoritative part, and (if configured)
    /// relationship CSVs, deduplicates, and upserts everything inside one
    /// transaction. Prints summary counts for every source.
    Ingest {
        /// Show row counts without writing to the store.
        #[arg(long)]
        dry_run: bool,
    },

    /// Merge the secondary (scraped) catalog into the store.
    ///
    /// Matches secondary rows against authoritative part numbers, exactly
    /// first and by normalized identifier second, and fills the
    /// external_name / external_category_id enrichment columns (added on
    /// first run). Unmatched identifiers go to the diagnostic report file.
    Reconcile {
        /// Run the matching passes and print counts without writing.
        #[arg(long)]
        dry_run: bool,
    },

    /// Print part counts per top-level category.
    ///
    /// Aggregates the secondary part source over the category hierarchy:
    /// every category with no parent gets a bucket (zero included), sorted
    /// by numeric id ascending.
    Report,

    /// Write the search index artifact.
    ///
    /// Produces one JSON document with the enriched part list and the
    /// category list, each part already joined with its category name and
    /// full display path. The search UI consumes this file as-is.
    Index {
        /// Write to this path instead of the configured one.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Look up parts by number or name substring.
    ///
    /// Case-insensitive substring match against part number OR name,
    /// ordered by part number ascending, capped at the configured result
    /// limit.
    Find {
        /// The text to match.
        query: String,

        /// Restrict to one direct category id.
        #[arg(long)]
        category: Option<i64>,

        /// Keep only parts with a label file reference.
        #[arg(long)]
        labels_only: bool,

        /// Maximum number of results to return.
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Show store counts and last-run times.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Store initialized successfully.");
        }
        Commands::Ingest { dry_run } => {
            ingest::run_ingest(&cfg, dry_run).await?;
        }
        Commands::Reconcile { dry_run } => {
            reconcile::run_reconcile(&cfg, dry_run).await?;
        }
        Commands::Report => {
            aggregate::run_report(&cfg)?;
        }
        Commands::Index { output } => {
            index::run_index(&cfg, output.as_deref()).await?;
        }
        Commands::Find {
            query,
            category,
            labels_only,
            limit,
        } => {
            find::run_find(&cfg, &query, category, labels_only, limit).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
