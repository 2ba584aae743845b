//! Test removing entries through cursors from earlier lookups.

use crate::e2e_tests::helpers::*;

#[test]
fn test_remove_every_entry_via_find() {
    let mut tree = populated_tree(4, shuffled_keys(500, 3));

    for key in shuffled_keys(500, 4) {
        let cursor = tree.find(&key);
        assert_eq!(tree.remove_at(cursor), Some((key, key * 10)));
        assert!(tree.find(&key).is_end());
    }

    assert!(tree.is_empty());
    assert_tree_valid(&tree);
}

#[test]
fn test_remove_via_floor_cursor() {
    let mut tree = populated_tree(4, (0..100).map(|k| k * 2));

    // 51 is absent; its floor is 50.
    let cursor = tree.find_left(&51);
    assert_eq!(tree.remove_at(cursor), Some((50, 500)));
    assert_eq!(tree.key_at(tree.find_left(&51)), Some(&48));
    assert_tree_valid(&tree);
}

#[test]
fn test_end_and_missing_cursors_are_noops() {
    let mut tree = populated_tree(4, 0..20);

    assert!(tree.remove_at(tree.end()).is_none());
    assert!(tree.remove_at(tree.find(&1000)).is_none());
    assert_eq!(tree.size(), 20);
}

#[test]
fn test_remove_last_entry_via_cursor() {
    let mut tree = populated_tree(4, 0..1);

    let cursor = tree.begin();
    assert_eq!(tree.remove_at(cursor), Some((0, 0)));
    assert!(tree.is_empty());
    assert!(tree.begin().is_end());
}
