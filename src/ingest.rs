//! Ingestion pipeline orchestration.
//!
//! Coordinates a full batch load: category source → categories table,
//! authoritative part source → parts table, relationship source →
//! part_relationships table. All writes of one run happen inside a single
//! transaction committed at the end — a crash mid-run leaves the store at
//! its pre-run state. Re-running with the same inputs is idempotent.

use anyhow::Result;
use chrono::Utc;
use sqlx::{Sqlite, Transaction};
use std::collections::HashSet;

use crate::config::Config;
use crate::db;
use crate::models::Relationship;
use crate::sources::{self, PartSourceRow};

pub async fn run_ingest(config: &Config, dry_run: bool) -> Result<()> {
    let categories = sources::load_categories(&config.sources.categories)?;

    let loaded_parts = sources::load_parts(&config.sources.parts)?;
    let (parts, part_duplicates) = dedup_parts(loaded_parts.rows);

    let relationships = match &config.sources.relationships {
        Some(path) => Some(sources::load_relationships(path)?),
        None => None,
    };
    let (unique_rels, rel_duplicates) = match &relationships {
        Some(outcome) => {
            let (unique, dropped) = dedup_relationships(&outcome.rows);
            (unique, dropped)
        }
        None => (Vec::new(), 0),
    };

    if dry_run {
        println!("ingest (dry-run)");
        println!(
            "  categories: {} (skipped {})",
            categories.rows.len(),
            categories.skipped
        );
        println!(
            "  parts: {} (duplicates {}, skipped {})",
            parts.len(),
            part_duplicates,
            loaded_parts.skipped
        );
        if let Some(outcome) = &relationships {
            println!(
                "  relationships: {} (duplicates dropped {}, skipped {})",
                unique_rels.len(),
                rel_duplicates,
                outcome.skipped
            );
        }
        return Ok(());
    }

    let pool = db::connect(&config.db.path).await?;

    let mut tx = pool.begin().await?;

    for category in &categories.rows {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, parent_id) VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET name = excluded.name, parent_id = excluded.parent_id
            "#,
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(category.parent_id)
        .execute(&mut *tx)
        .await?;
    }

    for part in &parts {
        upsert_part(&mut tx, part).await?;
    }

    let mut rels_inserted = 0usize;
    for rel in &unique_rels {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO part_relationships (rel_type, child_part_number, parent_part_number)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&rel.rel_type)
        .bind(&rel.child_part_number)
        .bind(&rel.parent_part_number)
        .execute(&mut *tx)
        .await?;
        rels_inserted += result.rows_affected() as usize;
    }

    sqlx::query("INSERT INTO ingest_runs (command, completed_at) VALUES (?, ?)")
        .bind("ingest")
        .bind(Utc::now().timestamp())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    println!("ingest");
    println!(
        "  categories: {} (skipped {})",
        categories.rows.len(),
        categories.skipped
    );
    println!(
        "  parts: {} (duplicates {}, skipped {})",
        parts.len(),
        part_duplicates,
        loaded_parts.skipped
    );
    if let Some(outcome) = &relationships {
        println!(
            "  relationships: {} inserted (duplicates dropped {}, skipped {})",
            rels_inserted, rel_duplicates, outcome.skipped
        );
    }
    println!("ok");

    pool.close().await;
    Ok(())
}

/// First occurrence wins for duplicate authoritative part numbers.
/// Duplicates should not occur, but a corrupt export must not crash a run.
fn dedup_parts(rows: Vec<PartSourceRow>) -> (Vec<PartSourceRow>, usize) {
    let mut seen: HashSet<String> = HashSet::with_capacity(rows.len());
    let mut kept = Vec::with_capacity(rows.len());
    let mut duplicates = 0usize;

    for row in rows {
        if seen.insert(row.part_number.clone()) {
            kept.push(row);
        } else {
            duplicates += 1;
        }
    }

    (kept, duplicates)
}

/// First-seen `rel_type` wins per `(child, parent)` key; later duplicates
/// are silently dropped (the count still shows up in the run summary).
fn dedup_relationships(rows: &[Relationship]) -> (Vec<Relationship>, usize) {
    let mut seen: HashSet<(&str, &str)> = HashSet::with_capacity(rows.len());
    let mut kept = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;

    for rel in rows {
        let key = (rel.child_part_number.as_str(), rel.parent_part_number.as_str());
        if seen.insert(key) {
            kept.push(rel.clone());
        } else {
            dropped += 1;
        }
    }

    (kept, dropped)
}

async fn upsert_part(tx: &mut Transaction<'_, Sqlite>, part: &PartSourceRow) -> Result<()> {
    let category_id = sources::parse_category_id(&part.category_id);

    sqlx::query(
        r#"
        INSERT INTO parts (part_number, name, category_id, material, label_file, image_path)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(part_number) DO UPDATE SET
            name = excluded.name,
            category_id = excluded.category_id,
            material = excluded.material,
            label_file = excluded.label_file,
            image_path = excluded.image_path
        "#,
    )
    .bind(&part.part_number)
    .bind(&part.name)
    .bind(category_id)
    .bind(empty_to_null(&part.material))
    .bind(empty_to_null(&part.label_file))
    .bind(empty_to_null(&part.image_path))
    .execute(&mut **tx)
    .await?;

    Ok(())
}

fn empty_to_null(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(rel_type: &str, child: &str, parent: &str) -> Relationship {
        Relationship {
            rel_type: rel_type.to_string(),
            child_part_number: child.to_string(),
            parent_part_number: parent.to_string(),
        }
    }

    #[test]
    fn test_relationship_dedup_first_type_wins() {
        let rows = vec![rel("P", "3001", "3068"), rel("A", "3001", "3068")];
        let (unique, dropped) = dedup_relationships(&rows);

        assert_eq!(unique.len(), 1);
        assert_eq!(dropped, 1);
        assert_eq!(unique[0].rel_type, "P");
    }

    #[test]
    fn test_relationship_dedup_distinct_pairs_kept() {
        let rows = vec![rel("P", "3001", "3068"), rel("P", "3068", "3001")];
        let (unique, dropped) = dedup_relationships(&rows);

        assert_eq!(unique.len(), 2);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn test_part_dedup_first_wins() {
        let rows = vec![
            PartSourceRow {
                part_number: "3001".to_string(),
                name: "First".to_string(),
                category_id: String::new(),
                material: String::new(),
                label_file: String::new(),
                image_path: String::new(),
            },
            PartSourceRow {
                part_number: "3001".to_string(),
                name: "Second".to_string(),
                category_id: String::new(),
                material: String::new(),
                label_file: String::new(),
                image_path: String::new(),
            },
        ];

        let (kept, duplicates) = dedup_parts(rows);

        assert_eq!(kept.len(), 1);
        assert_eq!(duplicates, 1);
        assert_eq!(kept[0].name, "First");
    }
}
