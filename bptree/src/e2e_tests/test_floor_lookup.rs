//! Test floor, strict predecessor and ceiling lookups against a model.

use std::collections::BTreeMap;

use crate::e2e_tests::helpers::*;

#[test]
fn test_floor_lookups_match_model() {
    let keys: Vec<u64> = shuffled_keys(2000, 17)
        .into_iter()
        .filter(|k| k % 3 == 0)
        .collect();
    let tree = populated_tree(5, keys.iter().copied());
    let model: BTreeMap<u64, u64> = keys.iter().map(|&k| (k, k * 10)).collect();

    for probe in 0..2010 {
        let floor = model.range(..=probe).next_back().map(|(k, _)| k);
        let before = model.range(..probe).next_back().map(|(k, _)| k);
        let ceiling = model.range(probe..).next().map(|(k, _)| k);

        assert_eq!(tree.key_at(tree.find_left(&probe)), floor, "find_left({probe})");
        assert_eq!(tree.key_at(tree.find_before(&probe)), before, "find_before({probe})");
        assert_eq!(tree.key_at(tree.lower_bound(&probe)), ceiling, "lower_bound({probe})");
    }
}

#[test]
fn test_floor_below_every_key() {
    let tree = populated_tree(4, 100..200);

    assert!(tree.find_left(&99).is_end());
    assert!(tree.find_before(&100).is_end());
    assert_eq!(tree.key_at(tree.find_left(&100)), Some(&100));
}

#[test]
fn test_floor_on_empty_tree() {
    let tree = tree_with_fanout(4);

    assert!(tree.find_left(&0).is_end());
    assert!(tree.find_left(&u64::MAX).is_end());
}
