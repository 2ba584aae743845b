//! Leaf-chain cursors and iterators.
//!
//! A `Cursor` names one entry by (leaf, slot). It does not borrow the tree, so
//! it can be held across calls and handed back to `BPlusTree::remove_at`. Any
//! other mutation of the tree invalidates it; a cursor whose leaf has been
//! released reads as "no entry".

use super::arena::NodeId;
use super::tree::BPlusTree;

/// Position of one entry in the leaf chain, or the end sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor {
    leaf: Option<NodeId>,
    index: usize,
}

impl Cursor {
    /// The past-the-end position.
    pub const END: Self = Self {
        leaf: None,
        index: 0,
    };

    pub(crate) const fn at(leaf: NodeId, index: usize) -> Self {
        Self {
            leaf: Some(leaf),
            index,
        }
    }

    #[must_use]
    pub const fn is_end(&self) -> bool {
        self.leaf.is_none()
    }

    pub(crate) const fn leaf(&self) -> Option<NodeId> {
        self.leaf
    }

    /// Slot within the leaf.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }
}

/// Double-ended iterator over `(key, value)` pairs in key order.
///
/// Walks the leaf chain; the tree is never re-descended.
pub struct Iter<'a, K, V> {
    tree: &'a BPlusTree<K, V>,
    front: Cursor,
    back: Cursor,
    finished: bool,
}

impl<'a, K: Ord + Clone, V> Iter<'a, K, V> {
    /// Iterate the inclusive cursor range `front..=back`.
    ///
    /// `front` must not come after `back` in the chain.
    pub(crate) const fn new(tree: &'a BPlusTree<K, V>, front: Cursor, back: Cursor) -> Self {
        Self {
            tree,
            front,
            back,
            finished: front.is_end() || back.is_end(),
        }
    }
}

impl<'a, K: Ord + Clone, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let item = self.tree.entry(self.front)?;
        if self.front == self.back {
            self.finished = true;
        } else {
            self.front = self.tree.next(self.front);
        }
        Some(item)
    }
}

impl<K: Ord + Clone, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let item = self.tree.entry(self.back)?;
        if self.front == self.back {
            self.finished = true;
        } else {
            self.back = self.tree.prev(self.back);
        }
        Some(item)
    }
}

impl<K: Ord + Clone, V> std::iter::FusedIterator for Iter<'_, K, V> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeConfig;

    fn small_tree(keys: impl IntoIterator<Item = u32>) -> BPlusTree<u32, u32> {
        let mut tree = BPlusTree::with_config(TreeConfig::new(4).expect("valid fanout"));
        for k in keys {
            tree.insert(k, k + 100);
        }
        tree
    }

    #[test]
    fn test_cursor_walks_across_leaves() {
        let tree = small_tree(0..20);

        let mut cursor = tree.begin();
        let mut seen = Vec::new();
        while !cursor.is_end() {
            seen.push(*tree.key_at(cursor).expect("valid cursor"));
            cursor = tree.next(cursor);
        }

        assert_eq!(seen, (0..20).collect::<Vec<_>>());
        assert_eq!(cursor, tree.end());
    }

    #[test]
    fn test_cursor_retreats_from_end() {
        let tree = small_tree(0..20);

        let mut cursor = tree.prev(tree.end());
        let mut seen = Vec::new();
        while !cursor.is_end() {
            seen.push(*tree.value_at(cursor).expect("valid cursor"));
            cursor = tree.prev(cursor);
        }

        assert_eq!(seen, (100..120).rev().collect::<Vec<_>>());
    }

    #[test]
    fn test_end_cursor_reads_nothing() {
        let tree = small_tree([1, 2, 3]);
        assert!(tree.entry(Cursor::END).is_none());
        assert_eq!(tree.next(Cursor::END), Cursor::END);
    }

    #[test]
    fn test_iter_meets_in_the_middle() {
        let tree = small_tree(0..9);
        let mut iter = tree.iter();

        let mut front = Vec::new();
        let mut back = Vec::new();
        loop {
            match iter.next() {
                Some((k, _)) => front.push(*k),
                None => break,
            }
            match iter.next_back() {
                Some((k, _)) => back.push(*k),
                None => break,
            }
        }

        assert_eq!(front, vec![0, 1, 2, 3, 4]);
        assert_eq!(back, vec![8, 7, 6, 5]);
        assert!(iter.next().is_none());
        assert!(iter.next_back().is_none());
    }

    #[test]
    fn test_iter_on_empty_tree() {
        let tree = small_tree([]);
        assert_eq!(tree.iter().count(), 0);
        assert_eq!(tree.iter().rev().count(), 0);
    }
}
