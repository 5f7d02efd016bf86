//! Category hierarchy resolution.
//!
//! Builds an id→record map once from the flat `(id, name, parent_id)` rows
//! and answers ancestor and path queries against it in O(depth). Broken
//! chains — a parent id that is absent from the set — and cycles both
//! resolve to "unknown" ancestry rather than looping or failing; such
//! categories are excluded from top-level rollups but stay in raw tallies.

use std::collections::HashMap;

use crate::models::Category;

/// Longest parent chain the resolver will follow before declaring the
/// ancestry unresolvable. Real catalogs nest three levels deep; anything
/// past this is a cycle or corrupt data.
pub const MAX_CHAIN_DEPTH: usize = 10;

/// Sentinel name used wherever a category lookup dangles.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

pub struct CategoryTree {
    by_id: HashMap<i64, Category>,
    // id -> top-level ancestor, precomputed at construction; None = unknown
    ancestor: HashMap<i64, Option<i64>>,
}

impl CategoryTree {
    /// Build the tree from the full category set. Duplicate ids keep the
    /// first occurrence. Ancestors are resolved eagerly so every consumer
    /// shares one computation.
    pub fn new(categories: Vec<Category>) -> Self {
        let mut by_id: HashMap<i64, Category> = HashMap::with_capacity(categories.len());
        for category in categories {
            by_id.entry(category.id).or_insert(category);
        }

        let ancestor = by_id
            .keys()
            .map(|&id| (id, resolve_ancestor(&by_id, id)))
            .collect();

        Self { by_id, ancestor }
    }

    /// Top-level ancestor of `id`: the category reached by following
    /// `parent_id` links until one has no parent. A top-level category is
    /// its own ancestor. Returns `None` for an unknown id, a chain that
    /// references a missing category, or a chain longer than
    /// [`MAX_CHAIN_DEPTH`].
    pub fn ancestor_of(&self, id: i64) -> Option<i64> {
        self.ancestor.get(&id).copied().flatten()
    }

    /// Display path of `id`, root ancestor first, the category itself last.
    /// An id absent from the set yields `["Unknown"]`. A broken or cyclic
    /// chain yields the names collected up to the break or depth guard.
    pub fn full_path_of(&self, id: i64) -> Vec<String> {
        let Some(mut current) = self.by_id.get(&id) else {
            return vec![UNKNOWN_CATEGORY.to_string()];
        };

        let mut path = vec![current.name.clone()];
        for _ in 0..MAX_CHAIN_DEPTH {
            match current.parent_id.and_then(|pid| self.by_id.get(&pid)) {
                Some(parent) => {
                    path.insert(0, parent.name.clone());
                    current = parent;
                }
                None => break,
            }
        }
        path
    }

    /// Number of levels above the root for `id`; unknown ids count as depth
    /// one. Used to prefer the most specific category when deduplicating
    /// secondary rows.
    pub fn depth_of(&self, id: i64) -> usize {
        self.full_path_of(id).len()
    }

    pub fn name_of(&self, id: i64) -> Option<&str> {
        self.by_id.get(&id).map(|c| c.name.as_str())
    }

    pub fn contains(&self, id: i64) -> bool {
        self.by_id.contains_key(&id)
    }

    /// All top-level categories, sorted by numeric id ascending. These are
    /// the zero-initialized buckets for aggregation reports.
    pub fn top_level(&self) -> Vec<&Category> {
        let mut tops: Vec<&Category> = self
            .by_id
            .values()
            .filter(|c| c.parent_id.is_none())
            .collect();
        tops.sort_by_key(|c| c.id);
        tops
    }

    /// Every category in the set, sorted by id. The search index embeds this
    /// list so consumers never need the tree itself.
    pub fn categories(&self) -> Vec<&Category> {
        let mut all: Vec<&Category> = self.by_id.values().collect();
        all.sort_by_key(|c| c.id);
        all
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

fn resolve_ancestor(by_id: &HashMap<i64, Category>, id: i64) -> Option<i64> {
    let mut current = by_id.get(&id)?;
    for _ in 0..=MAX_CHAIN_DEPTH {
        match current.parent_id {
            None => return Some(current.id),
            Some(parent_id) => match by_id.get(&parent_id) {
                Some(parent) => current = parent,
                // Declared parent missing from the set: unknown ancestry,
                // not promotion to top level.
                None => return None,
            },
        }
    }
    None
}
