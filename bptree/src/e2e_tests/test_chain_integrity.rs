//! Test that the leaf chain reads the same forward and backward.

use crate::e2e_tests::helpers::*;

#[test]
fn test_chain_forward_and_backward_agree() {
    for fanout in [3, 4, 16] {
        let mut tree = populated_tree(fanout, shuffled_keys(3000, 11));
        for key in shuffled_keys(3000, 12).into_iter().take(1700) {
            tree.remove(&key);
        }

        let forward = keys_forward(&tree);
        let mut backward = keys_backward(&tree);
        backward.reverse();

        assert_eq!(forward.len(), tree.size());
        assert!(is_strictly_ascending(&forward));
        assert_eq!(forward, backward, "fanout {fanout}");
        assert_tree_valid(&tree);
    }
}

#[test]
fn test_iterator_matches_cursor_walk() {
    let tree = populated_tree(5, shuffled_keys(777, 5));

    let iterated: Vec<u64> = tree.iter().map(|(k, _)| *k).collect();
    let reversed: Vec<u64> = tree.iter().rev().map(|(k, _)| *k).collect();

    assert_eq!(iterated, keys_forward(&tree));
    assert_eq!(reversed, keys_backward(&tree));
}

#[test]
fn test_iter_from_walks_to_the_end() {
    let tree = populated_tree(4, (0..300).map(|k| k * 2));

    let tail: Vec<u64> = tree.iter_from(&401).map(|(k, _)| *k).collect();

    assert_eq!(tail, (201..300).map(|k| k * 2).collect::<Vec<_>>());
}
