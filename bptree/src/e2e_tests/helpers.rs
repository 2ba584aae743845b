//! Common helpers for end-to-end tests.

pub use crate::testing::{assert_tree_valid, populated_tree, shuffled_keys, tree_with_fanout};

use crate::btree::BPlusTree;

/// Keys in chain order, walking cursors forward from `begin`.
pub fn keys_forward(tree: &BPlusTree<u64, u64>) -> Vec<u64> {
    let mut keys = Vec::new();
    let mut cursor = tree.begin();
    while let Some(key) = tree.key_at(cursor) {
        keys.push(*key);
        cursor = tree.next(cursor);
    }
    assert!(cursor.is_end(), "forward walk stopped on a non-end cursor");
    keys
}

/// Keys in reverse chain order, walking cursors backward from the end.
pub fn keys_backward(tree: &BPlusTree<u64, u64>) -> Vec<u64> {
    let mut keys = Vec::new();
    let mut cursor = tree.prev(tree.end());
    while let Some(key) = tree.key_at(cursor) {
        keys.push(*key);
        cursor = tree.prev(cursor);
    }
    assert!(cursor.is_end(), "backward walk stopped on a non-end cursor");
    keys
}

/// True if `keys` is strictly ascending.
pub fn is_strictly_ascending(keys: &[u64]) -> bool {
    keys.windows(2).all(|pair| pair[0] < pair[1])
}
