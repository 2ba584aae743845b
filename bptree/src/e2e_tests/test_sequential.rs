//! Test ascending inserts and removals with the default fanout.

use crate::btree::BPlusTree;
use crate::e2e_tests::helpers::*;

#[test]
fn test_sequential_insert_then_remove_ascending() {
    let mut tree: BPlusTree<u64, u64> = BPlusTree::new();
    assert_eq!(tree.config().fanout(), 16);

    for key in 0..100 {
        assert!(tree.insert(key, key * 10).is_none());
    }
    assert_tree_valid(&tree);
    assert_eq!(tree.size(), 100);
    assert_eq!(keys_forward(&tree), (0..100).collect::<Vec<_>>());

    for key in 0..100 {
        assert!(tree.remove(&key));
        assert_tree_valid(&tree);
    }

    assert!(tree.is_empty());
    assert_eq!(tree.size(), 0);
    assert!(tree.begin().is_end());
}

#[test]
fn test_sequential_remove_descending() {
    let mut tree = populated_tree(16, 0..1000);

    for key in (0..1000).rev() {
        assert_eq!(tree.take(&key), Some(key * 10));
    }

    assert!(tree.is_empty());
    assert_tree_valid(&tree);
}
