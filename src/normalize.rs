//! Identifier and search-text canonicalization.
//!
//! Two catalogs rarely agree on how a part number is written: `"3001"`,
//! `"03001"`, and `"3001-A"` may all refer to the same mold. The part-number
//! normalizer collapses punctuation, case, and leading zeros so that such
//! variants collide and can be matched in the reconciler's fallback pass.

/// Canonicalize a raw part identifier for fuzzy matching.
///
/// Strips every character that is not an ASCII letter or digit, lowercases
/// the rest, and removes leading zeros. Identifiers that differ only in
/// punctuation, case, or leading zeros normalize to the same key; an
/// all-zero identifier normalizes to the empty string.
pub fn normalize_part_number(raw: &str) -> String {
    let alnum: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    alnum.trim_start_matches('0').to_string()
}

/// Canonicalize a part name into a search key.
///
/// Lowercases, replaces every character that is not alphanumeric or an
/// underscore with a space, and collapses whitespace runs.
pub fn normalize_search_text(raw: &str) -> String {
    let replaced: String = raw
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' {
                c
            } else {
                ' '
            }
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}
