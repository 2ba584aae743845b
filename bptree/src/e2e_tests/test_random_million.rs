//! Test a large shuffled workload: fill, remove a random half, drain.

use crate::btree::BPlusTree;
use crate::e2e_tests::helpers::*;

const KEY_COUNT: u64 = 1_000_000;

#[test]
fn test_million_shuffled_keys() {
    let keys = shuffled_keys(KEY_COUNT, 0x5eed);
    let mut tree: BPlusTree<u64, u64> = BPlusTree::new();

    for &key in &keys {
        tree.insert(key, key * 10);
    }
    assert_tree_valid(&tree);
    assert_eq!(tree.size(), 1_000_000);

    let in_order: Vec<u64> = tree.iter().map(|(k, _)| *k).collect();
    assert!(is_strictly_ascending(&in_order));
    assert_eq!(in_order.len(), 1_000_000);

    // The shuffle is random, so its first half is a random half.
    let (removed, kept) = keys.split_at(keys.len() / 2);
    for key in removed {
        assert!(tree.remove(key), "key {key} should be present");
    }
    assert_tree_valid(&tree);
    assert_eq!(tree.size(), kept.len());

    for key in kept {
        assert_eq!(tree.search(key), Some(&(key * 10)));
    }
    for key in removed {
        assert!(tree.search(key).is_none());
        assert!(!tree.remove(key));
    }

    for key in kept {
        assert!(tree.remove(key));
    }
    assert_eq!(tree.size(), 0);
    assert!(tree.is_empty());
    assert_tree_valid(&tree);
}
