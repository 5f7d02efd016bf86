use anyhow::Result;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(&config.db.path).await?;

    // Create categories table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            parent_id INTEGER
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create parts table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS parts (
            part_number TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category_id INTEGER,
            material TEXT,
            label_file TEXT,
            image_path TEXT
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create part_relationships table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS part_relationships (
            rel_type TEXT NOT NULL,
            child_part_number TEXT NOT NULL,
            parent_part_number TEXT NOT NULL,
            UNIQUE(child_part_number, parent_part_number)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create ingest_runs table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ingest_runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            command TEXT NOT NULL,
            completed_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create indexes
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_parts_category_id ON parts(category_id)")
        .execute(&pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_parts_label_file ON parts(label_file)")
        .execute(&pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_categories_parent_id ON categories(parent_id)")
        .execute(&pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_part_relationships_rel_type ON part_relationships(rel_type)",
    )
    .execute(&pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_part_relationships_child ON part_relationships(child_part_number)",
    )
    .execute(&pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_part_relationships_parent ON part_relationships(parent_part_number)",
    )
    .execute(&pool)
    .await?;

    pool.close().await;
    Ok(())
}

/// Does `table` already carry `column`?
pub async fn has_column(pool: &SqlitePool, table: &str, column: &str) -> Result<bool> {
    let rows = sqlx::query(&format!("PRAGMA table_info({})", table))
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().any(|row| {
        let name: String = row.get("name");
        name == column
    }))
}

/// Add the enrichment columns to `parts` if they are not there yet.
/// ALTER TABLE ADD COLUMN is not idempotent natively, so check first.
/// Additive only — existing columns and data are never touched.
pub async fn ensure_enrichment_columns(pool: &SqlitePool) -> Result<()> {
    if !has_column(pool, "parts", "external_name").await? {
        sqlx::query("ALTER TABLE parts ADD COLUMN external_name TEXT")
            .execute(pool)
            .await?;
    }
    if !has_column(pool, "parts", "external_category_id").await? {
        sqlx::query("ALTER TABLE parts ADD COLUMN external_category_id INTEGER")
            .execute(pool)
            .await?;
    }
    Ok(())
}
