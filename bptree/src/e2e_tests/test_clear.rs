//! Test clearing a populated tree and reusing it.

use crate::e2e_tests::helpers::*;

#[test]
fn test_clear_and_refill() {
    let mut tree = populated_tree(4, 0..5000);

    tree.clear();
    assert!(tree.is_empty());
    assert_eq!(tree.size(), 0);
    assert!(tree.iter().next().is_none());
    assert_tree_valid(&tree);

    for key in shuffled_keys(100, 8) {
        tree.insert(key, key);
    }
    assert_eq!(keys_forward(&tree), (0..100).collect::<Vec<_>>());
    assert_tree_valid(&tree);
}

#[test]
fn test_clear_empty_tree() {
    let mut tree = tree_with_fanout(4);
    tree.clear();
    assert!(tree.is_empty());
}
