//! Store statistics and health overview.
//!
//! Provides a quick summary of what's loaded: part, category, and
//! relationship counts, enrichment coverage, and when the last batch runs
//! completed. Used by `bdx stats` to give confidence that ingestion and
//! reconciliation are working as expected.

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::db;
use crate::migrate;

/// Run the stats command: query the store and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(&config.db.path).await?;

    let total_parts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM parts")
        .fetch_one(&pool)
        .await?;

    let total_categories: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
        .fetch_one(&pool)
        .await?;

    let total_relationships: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM part_relationships")
        .fetch_one(&pool)
        .await?;

    // Enrichment columns only exist once a reconcile has run.
    let enriched: i64 = if migrate::has_column(&pool, "parts", "external_name").await? {
        sqlx::query_scalar("SELECT COUNT(*) FROM parts WHERE external_name IS NOT NULL")
            .fetch_one(&pool)
            .await?
    } else {
        0
    };

    let labeled: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM parts WHERE label_file IS NOT NULL AND label_file != ''",
    )
    .fetch_one(&pool)
    .await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("brickdex — Store Stats");
    println!("======================");
    println!();
    println!("  Database:      {}", config.db.path.display());
    println!("  Size:          {}", format_bytes(db_size));
    println!();
    println!("  Parts:         {}", total_parts);
    println!("  Categories:    {}", total_categories);
    println!("  Relationships: {}", total_relationships);
    println!(
        "  Enriched:      {} / {} ({}%)",
        enriched,
        total_parts,
        if total_parts > 0 {
            (enriched * 100) / total_parts
        } else {
            0
        }
    );
    println!("  With labels:   {}", labeled);

    // Last completed run per batch command
    let run_rows = sqlx::query(
        "SELECT command, MAX(completed_at) AS completed_at FROM ingest_runs GROUP BY command",
    )
    .fetch_all(&pool)
    .await?;

    if !run_rows.is_empty() {
        println!();
        println!("  Last runs:");
        for row in &run_rows {
            let command: String = row.get("command");
            let completed_at: i64 = row.get("completed_at");
            println!("    {:<12} {}", command, format_ts_relative(completed_at));
        }
    }

    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let delta = now - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
