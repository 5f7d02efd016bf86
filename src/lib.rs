//! # brickdex
//!
//! A batch ingestion, reconciliation, and search tool for building-block
//! part catalogs.
//!
//! brickdex loads flat category and part rows from tabular sources into a
//! SQLite store, reconciles the authoritative catalog against an
//! independently scraped one (exact identifier match with a normalized
//! fuzzy fallback), aggregates part counts over the category hierarchy,
//! and exports a denormalized search index for the desktop UI.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌──────────┐
//! │ CSV sources  │──▶│ Category tree  │──▶│  SQLite   │
//! │ cats/parts/  │   │ + reconciler  │   │  store    │
//! │ secondary    │   │ + aggregator  │   └────┬─────┘
//! └──────────────┘   └───────────────┘        │
//!                         ┌───────────────────┤
//!                         ▼                   ▼
//!                    ┌──────────┐       ┌──────────┐
//!                    │  report  │       │  search   │
//!                    │ + index  │       │  (find)   │
//!                    └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! bdx init                      # create the store
//! bdx ingest                    # load categories, parts, relationships
//! bdx reconcile                 # enrich from the scraped catalog
//! bdx report                    # part counts per top-level category
//! bdx index                     # write search_index.json
//! bdx find "2x4"                # look up parts
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`sources`] | CSV decoding with skip-and-count |
//! | [`normalize`] | Identifier and search-text canonicalization |
//! | [`category`] | Category hierarchy resolution |
//! | [`reconcile`] | Two-pass catalog reconciliation |
//! | [`aggregate`] | Per-category counts and rollups |
//! | [`index`] | Search index artifact |
//! | [`ingest`] | Batch source loading |
//! | [`find`] | Part lookup for the search UI |
//! | [`stats`] | Store overview |
//! | [`db`] | Store connection |
//! | [`migrate`] | Schema migrations |

pub mod aggregate;
pub mod category;
pub mod config;
pub mod db;
pub mod find;
pub mod index;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod normalize;
pub mod reconcile;
pub mod sources;
pub mod stats;
