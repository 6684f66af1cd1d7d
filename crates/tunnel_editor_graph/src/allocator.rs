// SPDX-License-Identifier: MIT OR Apache-2.0
//! Unique variable name allocation.

use std::collections::HashSet;

/// Produce a name not present in `occupied`.
///
/// Empty names are inert and returned unchanged. A taken name gets the
/// first free `_0`, `_1`, ... suffix.
pub fn allocate(requested: &str, occupied: &HashSet<String>) -> String {
    if requested.is_empty() || !occupied.contains(requested) {
        return requested.to_string();
    }

    (0u64..)
        .map(|n| format!("{requested}_{n}"))
        .find(|candidate| !occupied.contains(candidate))
        .unwrap_or_else(|| requested.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_free_name_unchanged() {
        assert_eq!(allocate("x", &names(&["y"])), "x");
        assert_eq!(allocate("", &names(&["", "x"])), "");
    }

    #[test]
    fn test_suffixes_in_order() {
        assert_eq!(allocate("x", &names(&["x"])), "x_0");
        assert_eq!(allocate("x", &names(&["x", "x_0"])), "x_1");
        assert_eq!(allocate("x", &names(&["x", "x_1"])), "x_0");
    }
}
