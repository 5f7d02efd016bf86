//! Part reconciliation.
//!
//! Merges the secondary (scraped) catalog into the authoritative part set.
//! Matching runs in two passes: exact `part_number` equality first, then a
//! fallback over normalized identifiers so that punctuation, case, and
//! leading-zero variants still pair up. Only the enrichment fields of an
//! authoritative record are ever written; `part_number` and `name` stay as
//! the authoritative source gave them.
//!
//! The whole operation is best effort, fully reported: rows missing required
//! fields are skipped and counted, rows with no match land in a diagnostic
//! report, and nothing short of a store failure aborts a run.

use anyhow::Result;
use chrono::Utc;
use sqlx::Row;
use std::collections::HashMap;
use std::path::Path;

use crate::category::CategoryTree;
use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::models::{PartRecord, SecondaryRow};
use crate::normalize::normalize_part_number;
use crate::sources;

/// Counters and diagnostics for one reconciliation run.
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    pub direct_matches: usize,
    pub fallback_matches: usize,
    pub unmatched: Vec<Unmatched>,
    pub duplicates_dropped: usize,
}

/// A secondary row that matched nothing; surfaced in the report file.
#[derive(Debug, Clone)]
pub struct Unmatched {
    pub part_number: String,
    pub name: String,
}

/// Collapse secondary rows to one per `(part_number, name)` key.
///
/// First occurrence wins, except that a later row whose category sits
/// strictly deeper in the tree replaces the shallower one — the scrape
/// lists a part once per category level it appears under, and the most
/// specific placement is the useful one.
pub fn dedup_secondary(rows: Vec<SecondaryRow>, tree: &CategoryTree) -> (Vec<SecondaryRow>, usize) {
    let mut kept: Vec<SecondaryRow> = Vec::with_capacity(rows.len());
    let mut by_key: HashMap<(String, String), usize> = HashMap::new();
    let mut dropped = 0usize;

    for row in rows {
        let key = (row.part_number.clone(), row.name.clone());
        match by_key.get(&key) {
            None => {
                by_key.insert(key, kept.len());
                kept.push(row);
            }
            Some(&idx) => {
                dropped += 1;
                let existing_depth = kept[idx].category_id.map_or(0, |id| tree.depth_of(id));
                let new_depth = row.category_id.map_or(0, |id| tree.depth_of(id));
                if new_depth > existing_depth {
                    kept[idx] = row;
                }
            }
        }
    }

    (kept, dropped)
}

/// Merge `secondary` into `parts`, mutating enrichment fields in place.
///
/// Pass one updates every record whose `part_number` matches a secondary row
/// exactly. Pass two takes the rows pass one could not place and retries
/// them against normalized identifiers; a record that already carries
/// enrichment is not overwritten again. Rows that match neither way are
/// collected for the diagnostic report.
pub fn reconcile(parts: &mut [PartRecord], secondary: &[SecondaryRow]) -> ReconcileOutcome {
    let mut outcome = ReconcileOutcome::default();

    // part_number -> index, first occurrence wins
    let mut exact: HashMap<String, usize> = HashMap::with_capacity(parts.len());
    // normalized part_number -> index, first occurrence wins
    let mut normalized: HashMap<String, usize> = HashMap::with_capacity(parts.len());
    for (idx, part) in parts.iter().enumerate() {
        exact.entry(part.part_number.clone()).or_insert(idx);
        normalized
            .entry(normalize_part_number(&part.part_number))
            .or_insert(idx);
    }

    // Pass one: exact identifier matches.
    let mut needs_fallback: Vec<&SecondaryRow> = Vec::new();
    for row in secondary {
        match exact.get(&row.part_number) {
            Some(&idx) => {
                parts[idx].external_name = Some(row.name.clone());
                parts[idx].external_category_id = row.category_id;
                outcome.direct_matches += 1;
            }
            None => needs_fallback.push(row),
        }
    }

    // Pass two: normalized fallback for everything pass one could not place.
    for row in needs_fallback {
        match normalized.get(&normalize_part_number(&row.part_number)) {
            Some(&idx) => {
                if parts[idx].external_name.is_none() {
                    parts[idx].external_name = Some(row.name.clone());
                    parts[idx].external_category_id = row.category_id;
                }
                outcome.fallback_matches += 1;
            }
            None => outcome.unmatched.push(Unmatched {
                part_number: row.part_number.clone(),
                name: row.name.clone(),
            }),
        }
    }

    outcome
}

/// Run a full reconciliation against the store.
///
/// Loads the secondary source and the category set, ensures the enrichment
/// columns exist (additive migration), reconciles in memory, then writes
/// every enriched record back inside a single transaction. The unmatched
/// report is written only when there is something to report.
pub async fn run_reconcile(config: &Config, dry_run: bool) -> Result<()> {
    let categories = sources::load_categories(&config.sources.categories)?;
    let tree = CategoryTree::new(categories.rows);

    let loaded = sources::load_secondary(&config.sources.secondary)?;
    let secondary_skipped = loaded.skipped;
    let (secondary, duplicates_dropped) = dedup_secondary(loaded.rows, &tree);

    let pool = db::connect(&config.db.path).await?;
    migrate::ensure_enrichment_columns(&pool).await?;

    let mut parts = load_store_parts(&pool).await?;
    let mut outcome = reconcile(&mut parts, &secondary);
    outcome.duplicates_dropped = duplicates_dropped;

    if dry_run {
        print_summary(&outcome, secondary_skipped, true);
        pool.close().await;
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    for part in parts.iter().filter(|p| p.external_name.is_some()) {
        sqlx::query(
            "UPDATE parts SET external_name = ?, external_category_id = ? WHERE part_number = ?",
        )
        .bind(&part.external_name)
        .bind(part.external_category_id)
        .bind(&part.part_number)
        .execute(&mut *tx)
        .await?;
    }
    sqlx::query("INSERT INTO ingest_runs (command, completed_at) VALUES (?, ?)")
        .bind("reconcile")
        .bind(Utc::now().timestamp())
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    if !outcome.unmatched.is_empty() {
        write_unmatched_report(&config.reports.unmatched_path, &outcome.unmatched)?;
    }

    print_summary(&outcome, secondary_skipped, false);
    if !outcome.unmatched.is_empty() {
        println!(
            "  unmatched report: {}",
            config.reports.unmatched_path.display()
        );
    }
    println!("ok");

    pool.close().await;
    Ok(())
}

async fn load_store_parts(pool: &sqlx::SqlitePool) -> Result<Vec<PartRecord>> {
    let rows = sqlx::query(
        "SELECT part_number, name, category_id, material, label_file, image_path, \
         external_name, external_category_id FROM parts ORDER BY part_number",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| PartRecord {
            part_number: row.get("part_number"),
            name: row.get("name"),
            category_id: row.get("category_id"),
            material: row.get("material"),
            label_file: row.get("label_file"),
            image_path: row.get("image_path"),
            external_name: row.get("external_name"),
            external_category_id: row.get("external_category_id"),
        })
        .collect())
}

fn write_unmatched_report(path: &Path, unmatched: &[Unmatched]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let lines: Vec<String> = unmatched
        .iter()
        .map(|u| format!("{}\t{}", u.part_number, u.name))
        .collect();
    std::fs::write(path, lines.join("\n") + "\n")?;
    Ok(())
}

fn print_summary(outcome: &ReconcileOutcome, skipped: usize, dry_run: bool) {
    if dry_run {
        println!("reconcile (dry-run)");
    } else {
        println!("reconcile");
    }
    println!("  direct matches: {}", outcome.direct_matches);
    println!("  fallback matches: {}", outcome.fallback_matches);
    println!("  unmatched: {}", outcome.unmatched.len());
    println!("  duplicates dropped: {}", outcome.duplicates_dropped);
    println!("  skipped rows: {}", skipped);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn part(part_number: &str, name: &str) -> PartRecord {
        PartRecord {
            part_number: part_number.to_string(),
            name: name.to_string(),
            category_id: None,
            material: None,
            label_file: None,
            image_path: None,
            external_name: None,
            external_category_id: None,
        }
    }

    fn secondary(part_number: &str, name: &str, category_id: Option<i64>) -> SecondaryRow {
        SecondaryRow {
            part_number: part_number.to_string(),
            name: name.to_string(),
            category_id,
        }
    }

    #[test]
    fn test_direct_match_enriches() {
        let mut parts = vec![part("3001", "Brick 2x4")];
        let rows = vec![secondary("3001", "Brick 2 x 4", Some(2))];

        let outcome = reconcile(&mut parts, &rows);

        assert_eq!(outcome.direct_matches, 1);
        assert_eq!(outcome.fallback_matches, 0);
        assert!(outcome.unmatched.is_empty());
        assert_eq!(parts[0].external_name.as_deref(), Some("Brick 2 x 4"));
        assert_eq!(parts[0].external_category_id, Some(2));
    }

    #[test]
    fn test_fallback_match_on_normalized_identifier() {
        let mut parts = vec![part("3068", "Tile 2x2")];
        let rows = vec![secondary("03068", "Tile 2 x 2", Some(3))];

        let outcome = reconcile(&mut parts, &rows);

        assert_eq!(outcome.direct_matches, 0);
        assert_eq!(outcome.fallback_matches, 1);
        assert_eq!(parts[0].external_name.as_deref(), Some("Tile 2 x 2"));
    }

    #[test]
    fn test_unmatched_row_is_reported_once() {
        let mut parts = vec![part("3001", "Brick 2x4")];
        let rows = vec![secondary("9999", "Ghost Part", None)];

        let outcome = reconcile(&mut parts, &rows);

        assert_eq!(outcome.unmatched.len(), 1);
        assert_eq!(outcome.unmatched[0].part_number, "9999");
        assert!(parts[0].external_name.is_none());
    }

    #[test]
    fn test_fallback_does_not_overwrite_existing_enrichment() {
        let mut parts = vec![part("3001", "Brick 2x4")];
        let rows = vec![
            secondary("3001", "Exact Name", Some(2)),
            secondary("03001", "Zero Padded Name", Some(9)),
        ];

        let outcome = reconcile(&mut parts, &rows);

        assert_eq!(outcome.direct_matches, 1);
        assert_eq!(outcome.fallback_matches, 1);
        assert_eq!(parts[0].external_name.as_deref(), Some("Exact Name"));
        assert_eq!(parts[0].external_category_id, Some(2));
    }

    #[test]
    fn test_idempotent_on_already_enriched_parts() {
        let mut parts = vec![part("3001", "Brick 2x4"), part("3068", "Tile 2x2")];
        let rows = vec![
            secondary("3001", "Brick External", Some(2)),
            secondary("03068", "Tile External", Some(3)),
        ];

        let first = reconcile(&mut parts, &rows);
        let snapshot: Vec<_> = parts
            .iter()
            .map(|p| (p.external_name.clone(), p.external_category_id))
            .collect();

        let second = reconcile(&mut parts, &rows);
        let after: Vec<_> = parts
            .iter()
            .map(|p| (p.external_name.clone(), p.external_category_id))
            .collect();

        assert_eq!(snapshot, after);
        assert_eq!(first.direct_matches, second.direct_matches);
        assert_eq!(first.fallback_matches, second.fallback_matches);
        assert_eq!(first.unmatched.len(), second.unmatched.len());
    }

    #[test]
    fn test_duplicate_authoritative_part_number_first_wins() {
        let mut parts = vec![part("3001", "First"), part("3001", "Second")];
        let rows = vec![secondary("3001", "External", Some(1))];

        reconcile(&mut parts, &rows);

        assert_eq!(parts[0].external_name.as_deref(), Some("External"));
        assert!(parts[1].external_name.is_none());
    }

    #[test]
    fn test_dedup_secondary_first_wins_at_equal_depth() {
        let tree = CategoryTree::new(vec![Category {
            id: 1,
            name: "Basic".to_string(),
            parent_id: None,
        }]);
        let rows = vec![
            secondary("3001", "Brick", Some(1)),
            secondary("3001", "Brick", Some(1)),
        ];

        let (kept, dropped) = dedup_secondary(rows, &tree);

        assert_eq!(kept.len(), 1);
        assert_eq!(dropped, 1);
    }

    #[test]
    fn test_dedup_secondary_deeper_category_wins() {
        let tree = CategoryTree::new(vec![
            Category {
                id: 1,
                name: "Basic".to_string(),
                parent_id: None,
            },
            Category {
                id: 2,
                name: "Plate".to_string(),
                parent_id: Some(1),
            },
        ]);
        let rows = vec![
            secondary("3001", "Brick", Some(1)),
            secondary("3001", "Brick", Some(2)),
        ];

        let (kept, dropped) = dedup_secondary(rows, &tree);

        assert_eq!(kept.len(), 1);
        assert_eq!(dropped, 1);
        assert_eq!(kept[0].category_id, Some(2));
    }

    #[test]
    fn test_all_zero_identifier_matches_by_design() {
        // "0000" and "000" both normalize to the empty string; the fuzzy
        // pass pairs them.
        let mut parts = vec![part("0000", "Zero Part")];
        let rows = vec![secondary("000", "Zero External", None)];

        let outcome = reconcile(&mut parts, &rows);

        assert_eq!(outcome.fallback_matches, 1);
        assert_eq!(parts[0].external_name.as_deref(), Some("Zero External"));
    }
}
