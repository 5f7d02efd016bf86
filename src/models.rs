//! Core data models used throughout brickdex.
//!
//! These types represent the categories, parts, and relationship links that
//! flow through the ingestion and reconciliation pipeline. Tabular rows are
//! decoded once, at the source boundary, into these typed records; everything
//! downstream works with named fields, never column positions.

/// A category as read from the category source.
///
/// `parent_id` is `None` for a top-level category. Category ids are numeric
/// in every known source and reports sort by them numerically, so the id is
/// carried as an `i64` rather than an opaque string.
#[derive(Debug, Clone)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
}

/// An authoritative part record, as stored.
///
/// `part_number` and `name` come from the authoritative source and are never
/// overwritten. `external_name` and `external_category_id` are enrichment
/// fields populated by reconciliation when a secondary-source match exists.
#[derive(Debug, Clone)]
pub struct PartRecord {
    pub part_number: String,
    pub name: String,
    pub category_id: Option<i64>,
    pub material: Option<String>,
    pub label_file: Option<String>,
    pub image_path: Option<String>,
    pub external_name: Option<String>,
    pub external_category_id: Option<i64>,
}

impl PartRecord {
    /// The category to resolve names and paths through: the enriched external
    /// id when reconciliation found one, the authoritative id otherwise.
    pub fn effective_category_id(&self) -> Option<i64> {
        self.external_category_id.or(self.category_id)
    }
}

/// A row from the secondary (scraped) part source.
#[derive(Debug, Clone)]
pub struct SecondaryRow {
    pub part_number: String,
    pub name: String,
    pub category_id: Option<i64>,
}

/// A subassembly link between two parts.
///
/// Deduplicated by `(child_part_number, parent_part_number)`; the first-seen
/// `rel_type` wins and later duplicates are dropped.
#[derive(Debug, Clone)]
pub struct Relationship {
    pub rel_type: String,
    pub child_part_number: String,
    pub parent_part_number: String,
}

/// A search hit returned by the part query interface.
#[derive(Debug, Clone)]
pub struct FoundPart {
    pub part_number: String,
    pub name: String,
    pub category_name: Option<String>,
    pub material: Option<String>,
    pub label_file: Option<String>,
}
