//! Shared fixtures for unit and scenario tests.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::btree::BPlusTree;
use crate::config::TreeConfig;

/// An empty tree with the given fanout.
#[allow(clippy::expect_used)]
pub fn tree_with_fanout(fanout: usize) -> BPlusTree<u64, u64> {
    BPlusTree::with_config(TreeConfig::new(fanout).expect("valid fanout"))
}

/// The keys `0..n` in a seeded random order.
pub fn shuffled_keys(n: u64, seed: u64) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut keys: Vec<u64> = (0..n).collect();
    keys.shuffle(&mut rng);
    keys
}

/// A tree holding `key -> key * 10` for every key in `keys`.
pub fn populated_tree(fanout: usize, keys: impl IntoIterator<Item = u64>) -> BPlusTree<u64, u64> {
    let mut tree = tree_with_fanout(fanout);
    for key in keys {
        tree.insert(key, key * 10);
    }
    tree
}

/// Panic with a level dump if any structural invariant is broken.
pub fn assert_tree_valid(tree: &BPlusTree<u64, u64>) {
    if let Err(e) = tree.check_invariants() {
        panic!("invariant violated: {e}\n{}", tree.dump());
    }
}
