//! Search index artifact.
//!
//! Produces one self-contained JSON document: the enriched part list plus
//! the category list, every record already joined with its category name
//! and full display path. The search UI reads this file and nothing else —
//! it never queries the category tree or the store.

use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use crate::category::{CategoryTree, UNKNOWN_CATEGORY};
use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::models::PartRecord;
use crate::normalize::normalize_search_text;
use crate::sources;

#[derive(Serialize)]
pub struct SearchIndex {
    pub parts: Vec<IndexPart>,
    pub categories: Vec<IndexCategory>,
}

#[derive(Serialize)]
pub struct IndexPart {
    pub id: String,
    pub name: String,
    pub normalized_name: String,
    pub category_id: Option<i64>,
    pub category_name: String,
    pub category_path: Vec<String>,
}

#[derive(Serialize)]
pub struct IndexCategory {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub full_path: Vec<String>,
}

/// Denormalize `parts` against the category tree. Dangling references get
/// the `"Unknown"` defaults rather than being dropped.
pub fn build_index(parts: &[PartRecord], tree: &CategoryTree) -> SearchIndex {
    let index_parts = parts
        .iter()
        .map(|part| {
            let category_id = part.effective_category_id();
            let (category_name, category_path) = match category_id {
                Some(id) if tree.contains(id) => (
                    tree.name_of(id).unwrap_or(UNKNOWN_CATEGORY).to_string(),
                    tree.full_path_of(id),
                ),
                _ => (
                    UNKNOWN_CATEGORY.to_string(),
                    vec![UNKNOWN_CATEGORY.to_string()],
                ),
            };
            IndexPart {
                id: part.part_number.clone(),
                name: part.name.clone(),
                normalized_name: normalize_search_text(&part.name),
                category_id,
                category_name,
                category_path,
            }
        })
        .collect();

    let categories = tree
        .categories()
        .iter()
        .map(|c| IndexCategory {
            id: c.id,
            name: c.name.clone(),
            parent_id: c.parent_id,
            full_path: tree.full_path_of(c.id),
        })
        .collect();

    SearchIndex {
        parts: index_parts,
        categories,
    }
}

/// Build the index from the store and write it as JSON.
///
/// If `output` is `Some`, writes to that file path; otherwise the configured
/// index path is used.
pub async fn run_index(config: &Config, output: Option<&Path>) -> Result<()> {
    let categories = sources::load_categories(&config.sources.categories)?;
    let tree = CategoryTree::new(categories.rows);

    let pool = db::connect(&config.db.path).await?;
    migrate::ensure_enrichment_columns(&pool).await?;

    let rows = sqlx::query_as::<_, (String, String, Option<i64>, Option<String>, Option<i64>)>(
        "SELECT part_number, name, category_id, external_name, external_category_id \
         FROM parts ORDER BY part_number",
    )
    .fetch_all(&pool)
    .await?;

    let parts: Vec<PartRecord> = rows
        .into_iter()
        .map(
            |(part_number, name, category_id, external_name, external_category_id)| PartRecord {
                part_number,
                name,
                category_id,
                material: None,
                label_file: None,
                image_path: None,
                external_name,
                external_category_id,
            },
        )
        .collect();

    let index = build_index(&parts, &tree);
    let json = serde_json::to_string_pretty(&index)?;

    let path = output.unwrap_or(&config.reports.index_path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &json)?;

    println!(
        "Search index created with {} parts and {} categories",
        index.parts.len(),
        index.categories.len()
    );
    println!("Saved to {}", path.display());

    pool.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn category(id: i64, name: &str, parent_id: Option<i64>) -> Category {
        Category {
            id,
            name: name.to_string(),
            parent_id,
        }
    }

    fn part(part_number: &str, name: &str, category_id: Option<i64>) -> PartRecord {
        PartRecord {
            part_number: part_number.to_string(),
            name: name.to_string(),
            category_id,
            material: None,
            label_file: None,
            image_path: None,
            external_name: None,
            external_category_id: None,
        }
    }

    fn tree() -> CategoryTree {
        CategoryTree::new(vec![
            category(1, "Basic", None),
            category(2, "Plate", Some(1)),
            category(3, "Tile", Some(2)),
        ])
    }

    #[test]
    fn test_part_carries_full_category_path() {
        let parts = vec![part("3068", "Tile 2x2", Some(3))];
        let index = build_index(&parts, &tree());

        assert_eq!(index.parts[0].category_name, "Tile");
        assert_eq!(index.parts[0].category_path, vec!["Basic", "Plate", "Tile"]);
    }

    #[test]
    fn test_dangling_category_defaults_to_unknown() {
        let parts = vec![part("3001", "Brick 2x4", Some(99))];
        let index = build_index(&parts, &tree());

        assert_eq!(index.parts[0].category_name, "Unknown");
        assert_eq!(index.parts[0].category_path, vec!["Unknown"]);
    }

    #[test]
    fn test_no_category_defaults_to_unknown() {
        let parts = vec![part("3001", "Brick 2x4", None)];
        let index = build_index(&parts, &tree());

        assert_eq!(index.parts[0].category_name, "Unknown");
    }

    #[test]
    fn test_enriched_category_preferred() {
        let mut enriched = part("3001", "Brick 2x4", Some(99));
        enriched.external_name = Some("Brick External".to_string());
        enriched.external_category_id = Some(2);

        let index = build_index(&[enriched], &tree());

        assert_eq!(index.parts[0].category_id, Some(2));
        assert_eq!(index.parts[0].category_name, "Plate");
        assert_eq!(index.parts[0].category_path, vec!["Basic", "Plate"]);
    }

    #[test]
    fn test_normalized_name_is_search_key() {
        let parts = vec![part("3001", "Brick 2x4, Modified", Some(1))];
        let index = build_index(&parts, &tree());

        assert_eq!(index.parts[0].normalized_name, "brick 2x4 modified");
    }

    #[test]
    fn test_categories_embedded_with_paths() {
        let index = build_index(&[], &tree());

        assert_eq!(index.categories.len(), 3);
        let tile = index.categories.iter().find(|c| c.id == 3).unwrap();
        assert_eq!(tile.full_path, vec!["Basic", "Plate", "Tile"]);
    }
}
