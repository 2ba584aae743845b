//! B+Tree driver: lookup, insertion with splits, deletion with borrow/merge.
//!
//! Nodes keep no parent backlink. Operations that propagate a split or an
//! underflow toward the root first walk from the root to the target leaf and
//! record a `(parent, child slot)` step per level; each level of propagation
//! pops the next step off that path.

use std::fmt;
use std::ops::Index;

use super::arena::{NodeArena, NodeId};
use super::cursor::{Cursor, Iter};
use super::node::{InternalNode, LeafNode, Node};
use crate::config::TreeConfig;

/// Root-to-leaf walk: `(internal node, slot of the child taken)` per level.
type Path = Vec<(NodeId, usize)>;

/// An in-memory B+Tree map.
///
/// Entries live only in leaves; leaves are chained in key order so scans and
/// floor lookups never re-descend the tree.
pub struct BPlusTree<K, V> {
    pub(super) arena: NodeArena<K, V>,
    pub(super) root: Option<NodeId>,
    pub(super) config: TreeConfig,
}

impl<K, V> Default for BPlusTree<K, V> {
    fn default() -> Self {
        Self::with_config(TreeConfig::default())
    }
}

impl<K, V> BPlusTree<K, V> {
    /// Create an empty tree with the default fanout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty tree with the given shape.
    #[must_use]
    pub const fn with_config(config: TreeConfig) -> Self {
        Self {
            arena: NodeArena::new(),
            root: None,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// True when the tree holds no entries. O(1).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }
}

impl<K: Ord + Clone, V> BPlusTree<K, V> {
    /// Look up the value stored under `key`.
    #[must_use]
    pub fn search(&self, key: &K) -> Option<&V> {
        let leaf = self.arena.leaf(self.find_leaf(key)?);
        leaf.find_index(key).ok().map(|i| &leaf.values[i])
    }

    /// Look up the value stored under `key` for modification.
    pub fn search_mut(&mut self, key: &K) -> Option<&mut V> {
        let leaf_id = self.find_leaf(key)?;
        let leaf = self.arena.leaf_mut(leaf_id);
        leaf.find_index(key).ok().map(|i| &mut leaf.values[i])
    }

    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.search(key).is_some()
    }

    /// Cursor at `key`, or the end cursor if absent.
    #[must_use]
    pub fn find(&self, key: &K) -> Cursor {
        let Some(leaf_id) = self.find_leaf(key) else {
            return Cursor::END;
        };
        match self.arena.leaf(leaf_id).find_index(key) {
            Ok(i) => Cursor::at(leaf_id, i),
            Err(_) => Cursor::END,
        }
    }

    /// Cursor at the greatest key `<= key`, or the end cursor if none exists.
    #[must_use]
    pub fn find_left(&self, key: &K) -> Cursor {
        let Some(leaf_id) = self.find_leaf(key) else {
            return Cursor::END;
        };
        let leaf = self.arena.leaf(leaf_id);
        match leaf.child_index_of(key) {
            0 => self.last_entry_of(leaf.prev),
            i => Cursor::at(leaf_id, i - 1),
        }
    }

    /// Cursor at the greatest key `< key`, or the end cursor if none exists.
    #[must_use]
    pub fn find_before(&self, key: &K) -> Cursor {
        let Some(leaf_id) = self.find_leaf(key) else {
            return Cursor::END;
        };
        let leaf = self.arena.leaf(leaf_id);
        match leaf.item_index_of(key) {
            0 => self.last_entry_of(leaf.prev),
            i => Cursor::at(leaf_id, i - 1),
        }
    }

    /// Cursor at the smallest key `>= key`, or the end cursor if none exists.
    #[must_use]
    pub fn lower_bound(&self, key: &K) -> Cursor {
        let Some(leaf_id) = self.find_leaf(key) else {
            return Cursor::END;
        };
        let leaf = self.arena.leaf(leaf_id);
        let i = leaf.item_index_of(key);
        if i < leaf.len() {
            Cursor::at(leaf_id, i)
        } else {
            leaf.next.map_or(Cursor::END, |next| Cursor::at(next, 0))
        }
    }

    /// Insert a key-value pair.
    ///
    /// If the key already exists its value is replaced in place and the old
    /// value is returned; the tree never holds duplicate keys.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let fanout = self.config.fanout();
        let Some((leaf_id, path)) = self.find_leaf_with_path(&key) else {
            let mut leaf = LeafNode::with_capacity(fanout);
            leaf.push_back(key, value);
            self.root = Some(self.arena.alloc(Node::Leaf(leaf)));
            self.verify();
            return None;
        };

        let leaf = self.arena.leaf_mut(leaf_id);
        if let Some(old) = leaf.insert(key, value) {
            return Some(old);
        }
        if leaf.len() > fanout {
            self.split_leaf(leaf_id, path);
        }
        self.verify();
        None
    }

    /// Remove the entry under `cursor`, returning it.
    ///
    /// The end cursor, or a cursor whose leaf no longer exists or no longer
    /// covers its slot, is a no-op returning `None`.
    pub fn remove_at(&mut self, cursor: Cursor) -> Option<(K, V)> {
        let leaf_id = cursor.leaf()?;
        let key = self.arena.get_leaf(leaf_id)?.keys.get(cursor.index())?.clone();
        let (found, path) = self.find_leaf_with_path(&key)?;
        if found != leaf_id {
            return None;
        }

        let min = self.config.min_leaf_entries();
        let leaf = self.arena.leaf_mut(leaf_id);
        let removed = leaf.remove_at(cursor.index());

        if path.is_empty() {
            if leaf.is_empty() {
                self.arena.release(leaf_id);
                self.root = None;
            }
        } else if leaf.len() < min {
            self.rebalance_leaf(leaf_id, path);
        }
        self.verify();
        Some(removed)
    }

    /// Remove `key`. Returns false, without touching the tree, if it is absent.
    pub fn remove(&mut self, key: &K) -> bool {
        self.take(key).is_some()
    }

    /// Remove `key`, returning its value.
    pub fn take(&mut self, key: &K) -> Option<V> {
        let cursor = self.find(key);
        self.remove_at(cursor).map(|(_, value)| value)
    }

    /// Mutable reference to the value under `key`, inserting `V::default()` first if absent.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        if !self.contains_key(&key) {
            self.insert(key.clone(), V::default());
        }
        match self.search_mut(&key) {
            Some(value) => value,
            None => unreachable!("key was present or just inserted"),
        }
    }

    /// Number of entries, counted by walking the leaf chain. O(n).
    #[must_use]
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut current = self.leftmost_leaf();
        while let Some(id) = current {
            let leaf = self.arena.leaf(id);
            count += leaf.len();
            current = leaf.next;
        }
        count
    }

    /// Alias of `len`.
    #[must_use]
    pub fn size(&self) -> usize {
        self.len()
    }

    /// Release every node, children before parents, and leave the tree empty.
    pub fn clear(&mut self) {
        if let Some(root) = self.root.take() {
            let released = self.release_subtree(root);
            tracing::debug!("cleared tree, released {released} nodes");
        }
        debug_assert_eq!(self.arena.live(), 0, "nodes leaked outside the tree");
        self.arena.reset();
    }

    /// Cursor at the smallest entry (the end cursor when empty).
    #[must_use]
    pub fn begin(&self) -> Cursor {
        self.leftmost_leaf()
            .map_or(Cursor::END, |leaf| Cursor::at(leaf, 0))
    }

    /// The past-the-end cursor.
    #[must_use]
    pub const fn end(&self) -> Cursor {
        Cursor::END
    }

    /// Advance one entry along the leaf chain.
    #[must_use]
    pub fn next(&self, cursor: Cursor) -> Cursor {
        let Some((leaf_id, leaf)) = self.cursor_leaf(cursor) else {
            return Cursor::END;
        };
        if cursor.index() + 1 < leaf.len() {
            Cursor::at(leaf_id, cursor.index() + 1)
        } else {
            leaf.next.map_or(Cursor::END, |next| Cursor::at(next, 0))
        }
    }

    /// Step back one entry along the leaf chain.
    ///
    /// Retreating from the end cursor lands on the last entry; retreating
    /// from the first entry yields the end cursor.
    #[must_use]
    pub fn prev(&self, cursor: Cursor) -> Cursor {
        if cursor.is_end() {
            return self.last_entry_of(self.rightmost_leaf());
        }
        let Some((leaf_id, leaf)) = self.cursor_leaf(cursor) else {
            return Cursor::END;
        };
        match cursor.index() {
            0 => self.last_entry_of(leaf.prev),
            i => Cursor::at(leaf_id, i - 1),
        }
    }

    /// Key and value under `cursor`.
    #[must_use]
    pub fn entry(&self, cursor: Cursor) -> Option<(&K, &V)> {
        let leaf = self.arena.get_leaf(cursor.leaf()?)?;
        Some((leaf.keys.get(cursor.index())?, leaf.values.get(cursor.index())?))
    }

    #[must_use]
    pub fn key_at(&self, cursor: Cursor) -> Option<&K> {
        self.entry(cursor).map(|(key, _)| key)
    }

    #[must_use]
    pub fn value_at(&self, cursor: Cursor) -> Option<&V> {
        self.entry(cursor).map(|(_, value)| value)
    }

    pub fn value_at_mut(&mut self, cursor: Cursor) -> Option<&mut V> {
        self.arena
            .get_leaf_mut(cursor.leaf()?)?
            .values
            .get_mut(cursor.index())
    }

    /// Smallest entry.
    #[must_use]
    pub fn first(&self) -> Option<(&K, &V)> {
        self.entry(self.begin())
    }

    /// Largest entry.
    #[must_use]
    pub fn last(&self) -> Option<(&K, &V)> {
        self.entry(self.prev(Cursor::END))
    }

    /// Iterate all entries in ascending key order. Use `.rev()` for descending.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self, self.begin(), self.prev(Cursor::END))
    }

    /// Iterate entries with keys `>= key` in ascending order.
    #[must_use]
    pub fn iter_from(&self, key: &K) -> Iter<'_, K, V> {
        Iter::new(self, self.lower_bound(key), self.prev(Cursor::END))
    }

    /// Find the leaf that covers `key`.
    fn find_leaf(&self, key: &K) -> Option<NodeId> {
        let mut current = self.root?;
        loop {
            match &self.arena[current] {
                Node::Leaf(_) => return Some(current),
                Node::Internal(node) => current = node.children[node.child_index_of(key)],
            }
        }
    }

    /// Find the leaf that covers `key`, recording the parent chain on the way down.
    fn find_leaf_with_path(&self, key: &K) -> Option<(NodeId, Path)> {
        let mut current = self.root?;
        let mut path = Path::new();
        loop {
            match &self.arena[current] {
                Node::Leaf(_) => return Some((current, path)),
                Node::Internal(node) => {
                    let slot = node.child_index_of(key);
                    path.push((current, slot));
                    current = node.children[slot];
                }
            }
        }
    }

    fn leftmost_leaf(&self) -> Option<NodeId> {
        let mut current = self.root?;
        while let Node::Internal(node) = &self.arena[current] {
            current = node.children[0];
        }
        Some(current)
    }

    fn rightmost_leaf(&self) -> Option<NodeId> {
        let mut current = self.root?;
        while let Node::Internal(node) = &self.arena[current] {
            current = node.children[node.children.len() - 1];
        }
        Some(current)
    }

    /// Cursor at the last slot of `leaf`, or the end cursor for `None`.
    fn last_entry_of(&self, leaf: Option<NodeId>) -> Cursor {
        leaf.map_or(Cursor::END, |id| {
            Cursor::at(id, self.arena.leaf(id).len().saturating_sub(1))
        })
    }

    /// The leaf under `cursor`, if it still exists and covers the cursor's slot.
    fn cursor_leaf(&self, cursor: Cursor) -> Option<(NodeId, &LeafNode<K, V>)> {
        let id = cursor.leaf()?;
        let leaf = self.arena.get_leaf(id)?;
        (cursor.index() < leaf.len()).then_some((id, leaf))
    }

    /// Split an overflowing leaf and splice the new right half into the chain.
    fn split_leaf(&mut self, leaf_id: NodeId, path: Path) {
        let fanout = self.config.fanout();
        let leaf = self.arena.leaf_mut(leaf_id);
        let mut right = leaf.split(fanout);
        let separator = right.keys[0].clone();
        right.prev = Some(leaf_id);
        right.next = leaf.next;

        let right_id = self.arena.alloc(Node::Leaf(right));
        self.arena.leaf_mut(leaf_id).next = Some(right_id);
        if let Some(next) = self.arena.leaf(right_id).next {
            self.arena.leaf_mut(next).prev = Some(right_id);
        }
        tracing::trace!("split leaf {leaf_id:?} into {right_id:?}");

        self.insert_into_parent(leaf_id, separator, right_id, path);
    }

    /// Insert a separator and new right sibling into the parent after a child split.
    ///
    /// Splits full parents in turn and grows a new root when the old root splits.
    fn insert_into_parent(
        &mut self,
        mut left: NodeId,
        mut separator: K,
        mut right: NodeId,
        mut path: Path,
    ) {
        let fanout = self.config.fanout();
        loop {
            let Some((parent_id, slot)) = path.pop() else {
                let root = InternalNode::with_children(fanout, left, separator, right);
                let root_id = self.arena.alloc(Node::Internal(root));
                self.root = Some(root_id);
                tracing::debug!("tree grew a new root {root_id:?}");
                return;
            };

            let parent = self.arena.internal_mut(parent_id);
            debug_assert_eq!(parent.children[slot], left);
            parent.insert_split(slot, separator, right);
            if parent.keys.len() <= fanout {
                return;
            }

            let (promoted, sibling) = parent.split(fanout);
            let sibling_id = self.arena.alloc(Node::Internal(sibling));
            tracing::trace!("split internal node {parent_id:?} into {sibling_id:?}");

            left = parent_id;
            separator = promoted;
            right = sibling_id;
        }
    }

    /// Restore minimum occupancy of a non-root leaf.
    ///
    /// Borrows from the left sibling, then the right sibling, and merges only
    /// when neither can spare an entry.
    fn rebalance_leaf(&mut self, leaf_id: NodeId, mut path: Path) {
        let min = self.config.min_leaf_entries();
        let Some((parent_id, slot)) = path.pop() else {
            return;
        };
        let (left, right) = self.siblings(parent_id, slot);

        if let Some(left_id) = left.filter(|&id| self.arena.leaf(id).len() > min) {
            let left_leaf = self.arena.leaf_mut(left_id);
            let (key, value) = left_leaf.remove_at(left_leaf.len() - 1);
            self.arena.internal_mut(parent_id).keys[slot - 1] = key.clone();
            self.arena.leaf_mut(leaf_id).push_front(key, value);
            tracing::trace!("leaf {leaf_id:?} borrowed from left sibling {left_id:?}");
            return;
        }

        if let Some(right_id) = right.filter(|&id| self.arena.leaf(id).len() > min) {
            let right_leaf = self.arena.leaf_mut(right_id);
            let (key, value) = right_leaf.remove_at(0);
            let separator = right_leaf.keys[0].clone();
            self.arena.internal_mut(parent_id).keys[slot] = separator;
            self.arena.leaf_mut(leaf_id).push_back(key, value);
            tracing::trace!("leaf {leaf_id:?} borrowed from right sibling {right_id:?}");
            return;
        }

        // Merge the right node of the pair into the left one.
        let (survivor, absorbed, separator_slot) = match (left, right) {
            (Some(left_id), _) => (left_id, leaf_id, slot - 1),
            (None, Some(right_id)) => (leaf_id, right_id, slot),
            (None, None) => unreachable!("internal node {parent_id:?} has a single child"),
        };
        let Some(Node::Leaf(mut gone)) = self.arena.release(absorbed) else {
            panic!("merge target {absorbed:?} is not a leaf");
        };
        let survivor_leaf = self.arena.leaf_mut(survivor);
        survivor_leaf.append(&mut gone);
        survivor_leaf.next = gone.next;
        if let Some(next) = gone.next {
            self.arena.leaf_mut(next).prev = Some(survivor);
        }
        tracing::trace!("merged leaf {absorbed:?} into {survivor:?}");

        let parent = self.arena.internal_mut(parent_id);
        parent.keys.remove(separator_slot);
        parent.children.remove(separator_slot + 1);
        self.rebalance_internal(parent_id, path);
    }

    /// Restore minimum occupancy of an internal node after it lost a child.
    ///
    /// At the root, a node left with no keys is replaced by its only child.
    fn rebalance_internal(&mut self, node_id: NodeId, mut path: Path) {
        let Some((parent_id, slot)) = path.pop() else {
            let root = self.arena.internal(node_id);
            if root.keys.is_empty() {
                let child = root.children[0];
                self.arena.release(node_id);
                self.root = Some(child);
                tracing::debug!("collapsed root {node_id:?}, new root {child:?}");
            }
            return;
        };

        let min = self.config.min_internal_keys();
        if self.arena.internal(node_id).keys.len() >= min {
            return;
        }
        let (left, right) = self.siblings(parent_id, slot);

        if let Some(left_id) = left.filter(|&id| self.arena.internal(id).keys.len() > min) {
            let Some((lifted, child)) = self.arena.internal_mut(left_id).pop_last() else {
                unreachable!("left sibling {left_id:?} has spare keys");
            };
            let lowered =
                std::mem::replace(&mut self.arena.internal_mut(parent_id).keys[slot - 1], lifted);
            let node = self.arena.internal_mut(node_id);
            node.keys.insert(0, lowered);
            node.children.insert(0, child);
            tracing::trace!("internal {node_id:?} rotated in from left sibling {left_id:?}");
            return;
        }

        if let Some(right_id) = right.filter(|&id| self.arena.internal(id).keys.len() > min) {
            let Some((lifted, child)) = self.arena.internal_mut(right_id).pop_first() else {
                unreachable!("right sibling {right_id:?} has spare keys");
            };
            let lowered =
                std::mem::replace(&mut self.arena.internal_mut(parent_id).keys[slot], lifted);
            let node = self.arena.internal_mut(node_id);
            node.keys.push(lowered);
            node.children.push(child);
            tracing::trace!("internal {node_id:?} rotated in from right sibling {right_id:?}");
            return;
        }

        let (survivor, absorbed, separator_slot) = match (left, right) {
            (Some(left_id), _) => (left_id, node_id, slot - 1),
            (None, Some(right_id)) => (node_id, right_id, slot),
            (None, None) => unreachable!("internal node {parent_id:?} has a single child"),
        };
        let parent = self.arena.internal_mut(parent_id);
        let separator = parent.keys.remove(separator_slot);
        parent.children.remove(separator_slot + 1);

        let Some(Node::Internal(mut gone)) = self.arena.release(absorbed) else {
            panic!("merge target {absorbed:?} is not an internal node");
        };
        self.arena.internal_mut(survivor).merge(separator, &mut gone);
        tracing::trace!("merged internal {absorbed:?} into {survivor:?}");

        self.rebalance_internal(parent_id, path);
    }

    /// Left and right neighbours of `parent.children[slot]` under the same parent.
    fn siblings(&self, parent_id: NodeId, slot: usize) -> (Option<NodeId>, Option<NodeId>) {
        let parent = self.arena.internal(parent_id);
        let left = slot.checked_sub(1).map(|s| parent.children[s]);
        let right = parent.children.get(slot + 1).copied();
        (left, right)
    }

    /// Post-order release of a subtree. Returns the number of nodes released.
    fn release_subtree(&mut self, id: NodeId) -> usize {
        let children = match &mut self.arena[id] {
            Node::Internal(node) => std::mem::take(&mut node.children),
            Node::Leaf(_) => Vec::new(),
        };
        let released: usize = children
            .into_iter()
            .map(|child| self.release_subtree(child))
            .sum();
        self.arena.release(id);
        released + 1
    }

    /// Panic on a broken invariant when built with `verify-invariants`.
    fn verify(&self) {
        if !cfg!(feature = "verify-invariants") {
            return;
        }
        if let Err(violation) = self.check_invariants() {
            panic!("B+Tree invariant violated: {violation}");
        }
    }
}

impl<K: Ord + Clone, V> Index<&K> for BPlusTree<K, V> {
    type Output = V;

    /// Panics if `key` is absent.
    fn index(&self, key: &K) -> &V {
        match self.search(key) {
            Some(value) => value,
            None => panic!("key not found in BPlusTree"),
        }
    }
}

impl<'a, K: Ord + Clone, V> IntoIterator for &'a BPlusTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Ord + Clone, V> Extend<(K, V)> for BPlusTree<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord + Clone, V> FromIterator<(K, V)> for BPlusTree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<K: Ord + Clone + fmt::Debug, V: fmt::Debug> fmt::Debug for BPlusTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;

    fn tree_with_fanout<V>(fanout: usize) -> BPlusTree<u32, V> {
        BPlusTree::with_config(TreeConfig::new(fanout).expect("valid fanout"))
    }

    fn assert_valid<V>(tree: &BPlusTree<u32, V>) {
        if let Err(e) = tree.check_invariants() {
            panic!("invariant violated: {e}\n{}", tree.dump());
        }
    }

    fn height<V>(tree: &BPlusTree<u32, V>) -> usize {
        let Some(mut current) = tree.root else {
            return 0;
        };
        let mut height = 1;
        while let Node::Internal(node) = &tree.arena[current] {
            current = node.children[0];
            height += 1;
        }
        height
    }

    #[test]
    fn test_empty_tree() {
        let mut tree: BPlusTree<u32, u32> = BPlusTree::new();

        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert!(tree.search(&1).is_none());
        assert!(tree.find(&1).is_end());
        assert!(tree.find_left(&1).is_end());
        assert!(tree.find_before(&1).is_end());
        assert!(tree.lower_bound(&1).is_end());
        assert!(tree.first().is_none());
        assert!(tree.last().is_none());
        assert!(!tree.remove(&1));
        assert!(tree.remove_at(Cursor::END).is_none());
        assert_valid(&tree);
    }

    #[test]
    fn test_insert_and_search() {
        let mut tree = BPlusTree::new();
        for i in 0..100u32 {
            assert!(tree.insert(i, i * 2).is_none());
            assert_eq!(tree.search(&i), Some(&(i * 2)));
        }
        for i in 100..200u32 {
            assert!(tree.search(&i).is_none());
        }
        assert_eq!(tree.len(), 100);
        assert_valid(&tree);
    }

    #[test]
    fn test_insert_existing_key_updates_in_place() {
        let mut tree = tree_with_fanout(4);
        for i in 0..20u32 {
            tree.insert(i, "original");
        }

        assert_eq!(tree.insert(7, "updated"), Some("original"));
        assert_eq!(tree.search(&7), Some(&"updated"));
        assert_eq!(tree.len(), 20);
        assert_valid(&tree);
    }

    #[test]
    fn test_root_leaf_splits_into_two_levels() {
        let mut tree = tree_with_fanout(4);
        for i in 0..4u32 {
            tree.insert(i, ());
        }
        assert_eq!(height(&tree), 1);

        tree.insert(4, ());
        assert_eq!(height(&tree), 2);

        let root = tree.arena.internal(tree.root.expect("non-empty"));
        assert_eq!(root.keys, vec![3]);
        assert_eq!(tree.arena.leaf(root.children[0]).keys, vec![0, 1, 2]);
        assert_eq!(tree.arena.leaf(root.children[1]).keys, vec![3, 4]);
        assert_valid(&tree);
    }

    #[test]
    fn test_internal_split_promotes_key() {
        let mut tree = tree_with_fanout(3);
        for i in 0..30u32 {
            tree.insert(i, ());
            assert_valid(&tree);
        }
        assert!(height(&tree) >= 3);

        // Separators promoted out of an internal node appear in neither half.
        let root = tree.arena.internal(tree.root.expect("non-empty"));
        for &child in &root.children {
            for key in tree.arena[child].keys() {
                assert!(!root.keys.contains(key));
            }
        }
    }

    #[test]
    fn test_sequential_insert_then_remove_ascending() {
        let mut tree = BPlusTree::new();
        for i in 0..100u32 {
            tree.insert(i, i);
        }
        assert_eq!(tree.len(), 100);
        assert_eq!(tree.iter().count(), 100);

        for i in 0..100u32 {
            assert!(tree.remove(&i));
            assert!(tree.search(&i).is_none());
            assert_valid(&tree);
        }

        assert!(tree.is_empty());
        assert!(tree.root.is_none());
        assert_eq!(tree.arena.live(), 0);
    }

    #[test]
    fn test_remove_descending_collapses_root() {
        let mut tree = tree_with_fanout(4);
        for i in 0..200u32 {
            tree.insert(i, i);
        }
        let grown = height(&tree);
        assert!(grown >= 3);

        for i in (0..200u32).rev() {
            assert!(tree.remove(&i));
            assert_valid(&tree);
        }
        assert!(tree.is_empty());
        assert_eq!(tree.arena.live(), 0);
    }

    #[test]
    fn test_remove_missing_key_is_noop() {
        let mut tree = tree_with_fanout(4);
        for i in (0..40u32).step_by(2) {
            tree.insert(i, i);
        }

        assert!(!tree.remove(&7));
        assert!(!tree.remove(&1000));
        assert_eq!(tree.len(), 20);
        assert_valid(&tree);
    }

    #[test]
    fn test_borrow_from_left_updates_separator() {
        let mut tree = tree_with_fanout(4);
        // Leaves after these inserts: [0 1 2] [3 4 5]
        for i in 0..6u32 {
            tree.insert(i, ());
        }
        tree.insert(10, ());
        // Leaves: [0 1 2] [3 4 5 10]
        let root_id = tree.root.expect("non-empty");
        let left_before = tree.arena.leaf(tree.arena.internal(root_id).children[0]).len();
        assert_eq!(left_before, 3);

        // Drain the right leaf down to underflow.
        assert!(tree.remove(&10));
        assert!(tree.remove(&5));
        assert!(tree.remove(&4));
        assert_valid(&tree);

        let root = tree.arena.internal(tree.root.expect("non-empty"));
        let right = tree.arena.leaf(root.children[1]);
        assert_eq!(right.keys[0], root.keys[0]);
        assert_eq!(right.keys, vec![2, 3]);
    }

    #[test]
    fn test_borrow_from_right_updates_separator() {
        let mut tree = tree_with_fanout(4);
        for i in 0..7u32 {
            tree.insert(i, ());
        }
        // Leaves: [0 1 2] [3 4 5 6]
        assert!(tree.remove(&0));
        assert!(tree.remove(&1));
        assert_valid(&tree);

        let root = tree.arena.internal(tree.root.expect("non-empty"));
        assert_eq!(tree.arena.leaf(root.children[0]).keys, vec![2, 3]);
        assert_eq!(tree.arena.leaf(root.children[1]).keys, vec![4, 5, 6]);
        assert_eq!(root.keys, vec![4]);
    }

    #[test]
    fn test_merge_repairs_leaf_chain() {
        let mut tree = tree_with_fanout(4);
        for i in 0..5u32 {
            tree.insert(i, ());
        }
        // Leaves: [1 2] [3 4] once 0 is gone; neither side can lend, so
        // removing 4 merges the pair and collapses the root.
        assert!(tree.remove(&0));
        assert!(tree.remove(&4));
        assert_valid(&tree);
        assert_eq!(height(&tree), 1);

        let leaf = tree.arena.leaf(tree.root.expect("non-empty"));
        assert_eq!(leaf.keys, vec![1, 2, 3]);
        assert!(leaf.prev.is_none() && leaf.next.is_none());
    }

    #[test]
    fn test_remove_at_cursor() {
        let mut tree = tree_with_fanout(4);
        for i in 0..50u32 {
            tree.insert(i, i * 10);
        }

        let cursor = tree.find(&25);
        assert_eq!(tree.remove_at(cursor), Some((25, 250)));
        assert!(tree.search(&25).is_none());
        assert_eq!(tree.len(), 49);

        assert!(tree.remove_at(tree.end()).is_none());
        assert_eq!(tree.len(), 49);
        assert_valid(&tree);
    }

    #[test]
    fn test_remove_at_stale_cursor_is_noop() {
        let mut tree = tree_with_fanout(4);
        for i in 0..5u32 {
            tree.insert(i, i);
        }
        assert!(tree.remove(&0));
        let stale = tree.find(&4);
        assert!(tree.remove(&4));

        // The leaf that held 4 was merged away.
        assert!(tree.remove_at(stale).is_none());
        assert_eq!(tree.len(), 3);
        assert_valid(&tree);
    }

    #[test]
    fn test_find_left_is_inclusive_floor() {
        let mut tree = tree_with_fanout(4);
        for i in (10..=200u32).step_by(10) {
            tree.insert(i, i);
        }

        assert!(tree.find_left(&5).is_end());
        assert_eq!(tree.key_at(tree.find_left(&10)), Some(&10));
        assert_eq!(tree.key_at(tree.find_left(&15)), Some(&10));
        assert_eq!(tree.key_at(tree.find_left(&100)), Some(&100));
        assert_eq!(tree.key_at(tree.find_left(&109)), Some(&100));
        assert_eq!(tree.key_at(tree.find_left(&5000)), Some(&200));
    }

    #[test]
    fn test_find_before_is_strict() {
        let mut tree = tree_with_fanout(4);
        for i in (10..=200u32).step_by(10) {
            tree.insert(i, i);
        }

        assert!(tree.find_before(&10).is_end());
        assert_eq!(tree.key_at(tree.find_before(&11)), Some(&10));
        assert_eq!(tree.key_at(tree.find_before(&100)), Some(&90));
        assert_eq!(tree.key_at(tree.find_before(&5000)), Some(&200));
    }

    #[test]
    fn test_floor_hops_to_previous_leaf() {
        let mut tree = tree_with_fanout(4);
        for i in 0..40u32 {
            tree.insert(i * 2, ());
        }
        // Every odd probe is absent; the answer may sit at the end of the previous leaf.
        for probe in (1..80u32).step_by(2) {
            assert_eq!(tree.key_at(tree.find_left(&probe)), Some(&(probe - 1)));
            assert_eq!(tree.key_at(tree.find_before(&probe)), Some(&(probe - 1)));
        }
    }

    #[test]
    fn test_lower_bound_and_iter_from() {
        let mut tree = tree_with_fanout(4);
        for i in 0..10u32 {
            tree.insert(i * 10, i);
        }

        assert_eq!(tree.key_at(tree.lower_bound(&35)), Some(&40));
        assert_eq!(tree.key_at(tree.lower_bound(&40)), Some(&40));
        assert!(tree.lower_bound(&91).is_end());

        let values: Vec<u32> = tree.iter_from(&50).map(|(_, v)| *v).collect();
        assert_eq!(values, vec![5, 6, 7, 8, 9]);
        assert_eq!(tree.iter_from(&1000).count(), 0);
    }

    #[test]
    fn test_reverse_iteration() {
        let tree: BPlusTree<u32, u32> = (0..100u32).map(|i| (i, i)).collect();
        let keys: Vec<u32> = tree.iter().rev().map(|(k, _)| *k).collect();
        assert_eq!(keys, (0..100u32).rev().collect::<Vec<_>>());
    }

    #[test]
    fn test_first_and_last() {
        let mut tree = tree_with_fanout(4);
        for i in [50u32, 10, 90, 30, 70] {
            tree.insert(i, i);
        }
        assert_eq!(tree.first(), Some((&10, &10)));
        assert_eq!(tree.last(), Some((&90, &90)));
    }

    #[test]
    fn test_get_or_insert_default() {
        let mut tree: BPlusTree<u32, u32> = tree_with_fanout(4);

        *tree.get_or_insert_default(3) += 5;
        *tree.get_or_insert_default(3) += 5;

        assert_eq!(tree[&3], 10);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    #[should_panic(expected = "key not found")]
    fn test_index_missing_key_panics() {
        let tree: BPlusTree<u32, u32> = BPlusTree::new();
        let _ = tree[&1];
    }

    #[test]
    fn test_search_mut_and_value_at_mut() {
        let mut tree = tree_with_fanout(4);
        for i in 0..20u32 {
            tree.insert(i, i);
        }

        if let Some(v) = tree.search_mut(&5) {
            *v = 500;
        }
        let cursor = tree.find(&6);
        if let Some(v) = tree.value_at_mut(cursor) {
            *v = 600;
        }

        assert_eq!(tree.search(&5), Some(&500));
        assert_eq!(tree.search(&6), Some(&600));
    }

    #[test]
    fn test_clear_releases_every_node() {
        let mut tree = tree_with_fanout(4);
        for i in 0..500u32 {
            tree.insert(i, i);
        }
        assert!(tree.arena.live() > 1);

        tree.clear();

        assert!(tree.is_empty());
        assert_eq!(tree.arena.live(), 0);
        assert_eq!(tree.len(), 0);

        tree.insert(1, 1);
        assert_eq!(tree.len(), 1);
        assert_valid(&tree);
    }

    #[test]
    fn test_take_returns_value() {
        let mut tree = tree_with_fanout(4);
        tree.insert(1u32, String::from("one"));
        assert_eq!(tree.take(&1), Some(String::from("one")));
        assert_eq!(tree.take(&1), None);
    }

    #[test]
    fn test_debug_lists_entries_in_order() {
        let tree: BPlusTree<u32, char> = [(2, 'b'), (1, 'a'), (3, 'c')].into_iter().collect();
        assert_eq!(format!("{tree:?}"), "{1: 'a', 2: 'b', 3: 'c'}");
    }

    #[test]
    fn test_random_workload_small_fanouts() {
        for fanout in [3, 4, 5, 16] {
            let mut rng = StdRng::seed_from_u64(fanout as u64);
            let mut keys: Vec<u32> = (0..2000).collect();
            keys.shuffle(&mut rng);

            let mut tree = tree_with_fanout(fanout);
            for &k in &keys {
                tree.insert(k, k);
            }
            assert_valid(&tree);
            assert_eq!(tree.len(), keys.len());

            keys.shuffle(&mut rng);
            for (i, &k) in keys.iter().enumerate() {
                assert!(tree.remove(&k), "fanout {fanout}: key {k} missing");
                if i % 97 == 0 {
                    assert_valid(&tree);
                }
            }
            assert!(tree.is_empty());
            assert_eq!(tree.arena.live(), 0);
        }
    }
}
