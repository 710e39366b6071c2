//! Hierarchical views over a flat snapshot.

use std::collections::BTreeSet;

use crate::snapshot::{ConfigurationSnapshot, KEY_DELIMITER};

/// Immediate child segments below `prefix`.
///
/// With an empty prefix every top-level segment is returned. A key equal to
/// `prefix` contributes nothing. Top-level segments starting with
/// `excluded_root` (case-sensitive) are left out.
pub fn child_segments(
    snapshot: &ConfigurationSnapshot,
    prefix: &str,
    excluded_root: Option<&str>,
) -> BTreeSet<String> {
    let mut children = BTreeSet::new();

    for key in snapshot.keys() {
        let remainder = if prefix.is_empty() {
            key
        } else {
            match key
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix(KEY_DELIMITER))
            {
                Some(rest) => rest,
                None => continue,
            }
        };

        let segment = remainder.split(KEY_DELIMITER).next().unwrap_or_default();
        if segment.is_empty() {
            continue;
        }
        if prefix.is_empty() && excluded_root.is_some_and(|section| has_section_prefix(segment, section)) {
            continue;
        }

        children.insert(segment.to_string());
    }

    children
}

/// Whether `key` belongs to `section` (case-sensitive prefix match).
pub fn has_section_prefix(key: &str, section: &str) -> bool {
    key.starts_with(section)
}
