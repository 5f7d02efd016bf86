//! CSV decoding for the tabular sources.
//!
//! Each source is read once, in full, into typed records. Rows are accessed
//! by header name, never by position, so the loaders tolerate the column
//! order and presence differences between exports. A row that fails to
//! decode or is missing a required field is skipped and counted — a single
//! bad row never aborts a run.

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::models::{Category, Relationship, SecondaryRow};

/// Result of loading one source: the usable rows plus how many were skipped.
pub struct LoadOutcome<T> {
    pub rows: Vec<T>,
    pub skipped: usize,
}

/// An authoritative part row as decoded from the part source. Optional
/// descriptive columns may be absent entirely.
#[derive(Debug, Clone, Deserialize)]
pub struct PartSourceRow {
    pub part_number: String,
    pub name: String,
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub material: String,
    #[serde(default)]
    pub label_file: String,
    #[serde(default)]
    pub image_path: String,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    id: String,
    name: String,
    #[serde(default)]
    parent_id: String,
}

#[derive(Debug, Deserialize)]
struct RawSecondary {
    part_number: String,
    name: String,
    #[serde(default)]
    category_id: String,
}

#[derive(Debug, Deserialize)]
struct RawRelationship {
    rel_type: String,
    child_part_number: String,
    parent_part_number: String,
}

fn reader(path: &Path) -> Result<csv::Reader<BufReader<File>>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open source: {}", path.display()))?;
    Ok(ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file)))
}

/// Decode every row of `path` with `decode`, skipping rows that fail to
/// parse or that `decode` rejects.
fn load<R, T>(path: &Path, decode: impl Fn(R) -> Option<T>) -> Result<LoadOutcome<T>>
where
    R: for<'de> Deserialize<'de>,
{
    let mut rdr = reader(path)?;
    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for record in rdr.deserialize::<R>() {
        match record {
            Ok(raw) => match decode(raw) {
                Some(row) => rows.push(row),
                None => skipped += 1,
            },
            Err(_) => skipped += 1,
        }
    }

    Ok(LoadOutcome { rows, skipped })
}

/// Load the category source. A category needs a numeric id and a non-empty
/// name; an empty `parent_id` means top-level.
pub fn load_categories(path: &Path) -> Result<LoadOutcome<Category>> {
    load(path, |raw: RawCategory| {
        let id = raw.id.parse::<i64>().ok()?;
        if raw.name.is_empty() {
            return None;
        }
        let parent_id = if raw.parent_id.is_empty() {
            None
        } else {
            Some(raw.parent_id.parse::<i64>().ok()?)
        };
        Some(Category {
            id,
            name: raw.name,
            parent_id,
        })
    })
}

/// Load the authoritative part source. `part_number` and `name` are
/// required; a non-numeric category id is treated as dangling.
pub fn load_parts(path: &Path) -> Result<LoadOutcome<PartSourceRow>> {
    load(path, |raw: PartSourceRow| {
        if raw.part_number.is_empty() || raw.name.is_empty() {
            return None;
        }
        Some(raw)
    })
}

/// Load the secondary (scraped) part source.
pub fn load_secondary(path: &Path) -> Result<LoadOutcome<SecondaryRow>> {
    load(path, |raw: RawSecondary| {
        if raw.part_number.is_empty() || raw.name.is_empty() {
            return None;
        }
        Some(SecondaryRow {
            part_number: raw.part_number,
            name: raw.name,
            category_id: raw.category_id.parse::<i64>().ok(),
        })
    })
}

/// Load the relationship source.
pub fn load_relationships(path: &Path) -> Result<LoadOutcome<Relationship>> {
    load(path, |raw: RawRelationship| {
        if raw.child_part_number.is_empty() || raw.parent_part_number.is_empty() {
            return None;
        }
        Some(Relationship {
            rel_type: raw.rel_type,
            child_part_number: raw.child_part_number,
            parent_part_number: raw.parent_part_number,
        })
    })
}

/// Parse an optional category id from source text.
pub fn parse_category_id(raw: &str) -> Option<i64> {
    if raw.is_empty() {
        None
    } else {
        raw.parse::<i64>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_categories_parses_parent_links() {
        let file = write_csv("id,name,parent_id\n1,Basic,\n2,Plate,1\n");
        let outcome = load_categories(file.path()).unwrap();
        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.skipped, 0);
        assert_eq!(outcome.rows[0].parent_id, None);
        assert_eq!(outcome.rows[1].parent_id, Some(1));
    }

    #[test]
    fn test_load_categories_skips_bad_rows() {
        let file = write_csv("id,name,parent_id\nnot-a-number,Basic,\n2,,1\n3,Tile,2\n");
        let outcome = load_categories(file.path()).unwrap();
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.skipped, 2);
        assert_eq!(outcome.rows[0].id, 3);
    }

    #[test]
    fn test_load_parts_requires_number_and_name() {
        let file = write_csv(
            "part_number,name,category_id\n3001,Brick 2x4,2\n,Nameless,1\n3068,,3\n",
        );
        let outcome = load_parts(file.path()).unwrap();
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.skipped, 2);
    }

    #[test]
    fn test_load_parts_tolerates_missing_optional_columns() {
        let file = write_csv("name,part_number\nBrick 2x4,3001\n");
        let outcome = load_parts(file.path()).unwrap();
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0].part_number, "3001");
        assert!(outcome.rows[0].material.is_empty());
    }

    #[test]
    fn test_load_secondary_dangling_category() {
        let file = write_csv("part_number,name,category_id\n3001,Brick,abc\n");
        let outcome = load_secondary(file.path()).unwrap();
        assert_eq!(outcome.rows[0].category_id, None);
    }

    #[test]
    fn test_load_relationships() {
        let file = write_csv(
            "rel_type,child_part_number,parent_part_number\nP,3001,3068\nA,,3068\n",
        );
        let outcome = load_relationships(file.path()).unwrap();
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.rows[0].rel_type, "P");
    }
}
