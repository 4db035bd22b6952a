//! Property-based tests for layered discovery and normalization.

use super::locate::{locate, Recursion};
use super::normalize::fold_dots;
use proptest::prelude::*;
use std::path::PathBuf;

fn path_component_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9_-]{1,20}"
}

fn absolute_path_strategy() -> impl Strategy<Value = PathBuf> {
    prop::collection::vec(path_component_strategy(), 1..8).prop_map(|parts| {
        let mut path = PathBuf::from("/");
        for part in parts {
            path.push(part);
        }
        path
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 1000,
        .. ProptestConfig::default()
    })]

    // A bound of N yields N + 1 levels, capped by the distance to the root.
    #[test]
    fn locate_level_count(path in absolute_path_strategy(), depth in 0usize..12) {
        let levels = path.components().count();
        let found = locate(&path, &["a", "b"], Recursion::Levels(depth));
        prop_assert_eq!(found.len(), 2 * (depth + 1).min(levels));
    }

    // The most specific candidates always come last.
    #[test]
    fn locate_target_last(path in absolute_path_strategy(), depth in 0usize..12) {
        let found = locate(&path, &["a", "b"], Recursion::Levels(depth));
        prop_assert_eq!(&found[found.len() - 2], &path.join("a"));
        prop_assert_eq!(&found[found.len() - 1], &path.join("b"));
    }

    // Each level is a strict ancestor of the next one.
    #[test]
    fn locate_general_to_specific(path in absolute_path_strategy()) {
        let found = locate(&path, &["f"], Recursion::Unbounded);
        for pair in found.windows(2) {
            let outer = pair[0].parent().unwrap();
            let inner = pair[1].parent().unwrap();
            prop_assert!(inner.starts_with(outer));
            prop_assert_ne!(inner, outer);
        }
    }

    // Folding dots is idempotent.
    #[test]
    fn fold_dots_idempotent(path in absolute_path_strategy()) {
        let once = fold_dots(&path);
        prop_assert_eq!(fold_dots(&once), once);
    }
}
