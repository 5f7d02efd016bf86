//! Per-category part counts and top-level rollups.
//!
//! Every part is tallied against its direct category; parts whose ancestry
//! resolves also land in exactly one top-level bucket. Parts with a dangling
//! category or a broken ancestor chain stay in the raw tally and a separate
//! unresolved counter, so `sum(top_level) + unresolved` always equals the
//! total part count.

use anyhow::Result;
use std::collections::{BTreeMap, HashMap};

use crate::category::CategoryTree;
use crate::config::Config;
use crate::sources;

#[derive(Debug)]
pub struct CategoryCounts {
    /// Direct-category tallies, including dangling category ids.
    pub raw: HashMap<i64, u64>,
    /// One bucket per known top-level category, zero-initialized.
    pub top_level: BTreeMap<i64, u64>,
    /// Parts whose ancestry could not be resolved (dangling reference,
    /// broken chain, cycle, or no category at all).
    pub unresolved: u64,
    pub total: u64,
}

/// Count one entry per part. A part directly in a top-level category
/// increments that bucket once — the raw tally and the rollup are separate
/// maps, so nothing is double counted within the rollup.
pub fn aggregate<I>(category_ids: I, tree: &CategoryTree) -> CategoryCounts
where
    I: IntoIterator<Item = Option<i64>>,
{
    let mut counts = CategoryCounts {
        raw: HashMap::new(),
        top_level: tree.top_level().iter().map(|c| (c.id, 0)).collect(),
        unresolved: 0,
        total: 0,
    };

    for category_id in category_ids {
        counts.total += 1;
        match category_id {
            None => counts.unresolved += 1,
            Some(id) => {
                *counts.raw.entry(id).or_insert(0) += 1;
                match tree.ancestor_of(id) {
                    Some(ancestor) => {
                        *counts.top_level.entry(ancestor).or_insert(0) += 1;
                    }
                    None => counts.unresolved += 1,
                }
            }
        }
    }

    counts
}

/// Print the top-level aggregation report for the secondary part source:
/// `id: name - N parts`, numeric id ascending.
pub fn run_report(config: &Config) -> Result<()> {
    let categories = sources::load_categories(&config.sources.categories)?;
    let tree = CategoryTree::new(categories.rows);

    let parts = sources::load_secondary(&config.sources.secondary)?;
    let counts = aggregate(parts.rows.iter().map(|p| p.category_id), &tree);

    println!("Top-level categories and part counts:");
    for (id, count) in &counts.top_level {
        let name = tree.name_of(*id).unwrap_or(crate::category::UNKNOWN_CATEGORY);
        println!("{}: {} - {} parts", id, name, count);
    }
    println!();
    println!("  total parts: {}", counts.total);
    println!("  unresolved ancestry: {}", counts.unresolved);
    println!("  skipped rows: {}", parts.skipped);

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

    fn tree() -> CategoryTree {
        CategoryTree::new(vec![
            category(1, "Basic", None),
            category(2, "Plate", Some(1)),
            category(3, "Tile", Some(2)),
            category(4, "Technic", None),
        ])
    }

    #[test]
    fn test_rollup_counts_through_ancestors() {
        let tree = tree();
        let counts = aggregate(vec![Some(2), Some(3)], &tree);

        assert_eq!(counts.top_level.get(&1), Some(&2));
        assert_eq!(counts.raw.get(&2), Some(&1));
        assert_eq!(counts.raw.get(&3), Some(&1));
    }

    #[test]
    fn test_top_level_part_counted_once() {
        let tree = tree();
        let counts = aggregate(vec![Some(1)], &tree);

        assert_eq!(counts.top_level.get(&1), Some(&1));
        assert_eq!(counts.raw.get(&1), Some(&1));
        assert_eq!(counts.unresolved, 0);
    }

    #[test]
    fn test_zero_initialized_buckets() {
        let tree = tree();
        let counts = aggregate(std::iter::empty(), &tree);

        assert_eq!(counts.top_level.get(&1), Some(&0));
        assert_eq!(counts.top_level.get(&4), Some(&0));
        assert_eq!(counts.total, 0);
    }

    #[test]
    fn test_dangling_category_stays_in_raw_tally() {
        let tree = tree();
        let counts = aggregate(vec![Some(99)], &tree);

        assert_eq!(counts.raw.get(&99), Some(&1));
        assert_eq!(counts.unresolved, 1);
        assert_eq!(counts.top_level.values().sum::<u64>(), 0);
    }

    #[test]
    fn test_total_invariant_holds() {
        let tree = tree();
        let parts = vec![Some(1), Some(2), Some(3), Some(99), None, Some(4)];
        let total = parts.len() as u64;

        let counts = aggregate(parts, &tree);

        let rolled: u64 = counts.top_level.values().sum();
        assert_eq!(rolled + counts.unresolved, total);
        assert_eq!(counts.total, total);
    }
}
