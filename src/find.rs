//! Part lookup for the search UI.
//!
//! Case-insensitive substring match against part number OR name, with an
//! optional direct-category filter and an optional "has a label file"
//! filter. Results are ordered by part number ascending and capped — the
//! desktop view renders at most one page of rows.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;
use crate::models::FoundPart;

/// Query the store for matching parts.
///
/// `filter` matches as a substring of the part number or the display name.
/// `category` restricts to one direct category id; `require_label_file`
/// keeps only parts with a non-empty label file reference. At most `cap`
/// rows come back, ordered by part number.
pub async fn find_parts(
    pool: &SqlitePool,
    filter: &str,
    category: Option<i64>,
    require_label_file: bool,
    cap: i64,
) -> Result<Vec<FoundPart>> {
    let mut sql = String::from(
        "SELECT p.part_number, p.name, c.name AS category_name, p.material, p.label_file \
         FROM parts p \
         LEFT JOIN categories c ON p.category_id = c.id \
         WHERE (p.part_number LIKE ? OR p.name LIKE ?)",
    );
    if category.is_some() {
        sql.push_str(" AND p.category_id = ?");
    }
    if require_label_file {
        sql.push_str(" AND p.label_file IS NOT NULL AND p.label_file != ''");
    }
    sql.push_str(" ORDER BY p.part_number LIMIT ?");

    let pattern = format!("%{}%", filter);
    let mut query = sqlx::query(&sql).bind(&pattern).bind(&pattern);
    if let Some(id) = category {
        query = query.bind(id);
    }
    query = query.bind(cap);

    let rows = query.fetch_all(pool).await?;

    Ok(rows
        .iter()
        .map(|row| FoundPart {
            part_number: row.get("part_number"),
            name: row.get("name"),
            category_name: row.get("category_name"),
            material: row.get("material"),
            label_file: row.get("label_file"),
        })
        .collect())
}

/// CLI entry point — runs the query and prints matches.
pub async fn run_find(
    config: &Config,
    filter: &str,
    category: Option<i64>,
    labels_only: bool,
    limit: Option<i64>,
) -> Result<()> {
    if filter.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let pool = db::connect(&config.db.path).await?;
    let cap = limit.unwrap_or(config.search.result_cap);

    let results = find_parts(&pool, filter, category, labels_only, cap).await?;

    if results.is_empty() {
        println!("No results.");
        pool.close().await;
        return Ok(());
    }

    for (i, part) in results.iter().enumerate() {
        println!("{}. {} — {}", i + 1, part.part_number, part.name);
        println!(
            "    category: {}",
            part.category_name.as_deref().unwrap_or("Unknown")
        );
        if let Some(ref material) = part.material {
            println!("    material: {}", material);
        }
        if let Some(ref label) = part.label_file {
            println!("    label: {}", label);
        }
    }
    println!();
    println!(
        "Found {} {}",
        results.len(),
        if results.len() == 1 { "result" } else { "results" }
    );

    pool.close().await;
    Ok(())
}
