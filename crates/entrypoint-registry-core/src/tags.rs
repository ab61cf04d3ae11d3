//! Tag-set encoding and comparison
//!
//! Entry point tags are stored as a single `;`-joined string. Callers only
//! ever see the decomposed sequence. A tag that itself contains `;` does not
//! round-trip through [`join_tags`] / [`split_tags`]; such tags are not
//! rejected here.

use std::collections::HashSet;

use crate::types::Tags;

/// Delimiter used to persist a tag sequence as one string
pub const TAG_SEPARATOR: &str = ";";

/// Join a tag sequence into its stored form
pub fn join_tags(tags: &[String]) -> String {
    tags.join(TAG_SEPARATOR)
}

/// Split a stored tag string back into a sequence
///
/// The empty string decodes to an empty sequence, so that an entry point
/// created without tags reads back without tags.
pub fn split_tags(stored: &str) -> Tags {
    if stored.is_empty() {
        return Vec::new();
    }
    stored.split(TAG_SEPARATOR).map(str::to_string).collect()
}

/// Normalize a candidate tag sequence before it is compared or stored
///
/// Empty tags are dropped: `[""]` joins to the same stored string as `[]`
/// and would read back as `[]`. Repeated tags keep their first occurrence.
pub fn dedup_tags(tags: Tags) -> Tags {
    let mut seen = HashSet::with_capacity(tags.len());
    tags.into_iter()
        .filter(|tag| !tag.is_empty() && seen.insert(tag.clone()))
        .collect()
}

/// Compare two tag sequences as unordered sets
///
/// Both sides are copied, stripped of empty tags, deduplicated and sorted
/// lexicographically. The inputs are left untouched.
pub fn same_tag_set(left: &[String], right: &[String]) -> bool {
    canonical(left) == canonical(right)
}

fn canonical(tags: &[String]) -> Vec<&str> {
    let mut sorted: Vec<&str> = tags
        .iter()
        .map(String::as_str)
        .filter(|tag| !tag.is_empty())
        .collect();
    sorted.sort_unstable();
    sorted.dedup();
    sorted
}
