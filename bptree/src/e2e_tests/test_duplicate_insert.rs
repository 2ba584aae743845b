//! Test that inserting an existing key replaces its value in place.

use crate::e2e_tests::helpers::*;

#[test]
fn test_reinsert_updates_value() {
    let mut tree = populated_tree(4, 0..200);

    for key in 0..200 {
        assert_eq!(tree.insert(key, key + 1), Some(key * 10));
    }

    assert_eq!(tree.size(), 200);
    for key in 0..200 {
        assert_eq!(tree.search(&key), Some(&(key + 1)));
    }
    assert_tree_valid(&tree);
}

#[test]
fn test_indexing_inserts_default() {
    let mut tree = tree_with_fanout(4);

    for key in [5, 1, 5, 3, 5] {
        *tree.get_or_insert_default(key) += 1;
    }

    assert_eq!(tree[&5], 3);
    assert_eq!(tree[&1], 1);
    assert_eq!(tree.size(), 3);
}
