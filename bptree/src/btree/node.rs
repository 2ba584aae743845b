//! B+Tree node types.
//!
//! The tree uses two node kinds:
//! - Internal nodes: separator keys and arena handles of their children
//! - Leaf nodes: key-value pairs, doubly-linked for ordered scans

use super::arena::NodeId;

/// A node stored in the arena.
#[derive(Debug)]
pub enum Node<K, V> {
    Internal(InternalNode<K>),
    Leaf(LeafNode<K, V>),
}

impl<K, V> Node<K, V> {
    /// Keys in sorted order.
    #[must_use]
    pub fn keys(&self) -> &[K] {
        match self {
            Self::Internal(node) => &node.keys,
            Self::Leaf(node) => &node.keys,
        }
    }
}

/// An internal (non-leaf) node.
///
/// Stores N keys and N+1 child handles.
/// `children[i]` contains keys < `keys[i]`
/// `children[i+1]` contains keys >= `keys[i]`
#[derive(Debug)]
pub struct InternalNode<K> {
    /// Separator keys in sorted order.
    pub keys: Vec<K>,
    /// Owned children. `children.len()` == `keys.len()` + 1
    pub children: Vec<NodeId>,
}

impl<K: Ord> InternalNode<K> {
    /// Create an empty internal node with room for one overflow key.
    #[must_use]
    pub fn with_capacity(fanout: usize) -> Self {
        Self {
            keys: Vec::with_capacity(fanout + 1),
            children: Vec::with_capacity(fanout + 2),
        }
    }

    /// Create a root with a single separator and two children.
    #[must_use]
    pub fn with_children(fanout: usize, left: NodeId, key: K, right: NodeId) -> Self {
        let mut node = Self::with_capacity(fanout);
        node.keys.push(key);
        node.children.push(left);
        node.children.push(right);
        node
    }

    /// Find the child slot that covers `key`.
    #[must_use]
    pub fn child_index_of(&self, key: &K) -> usize {
        child_index_of(&self.keys, key)
    }

    /// Insert a separator and the child to its right after the child at `slot` split.
    pub fn insert_split(&mut self, slot: usize, key: K, right_child: NodeId) {
        self.keys.insert(slot, key);
        self.children.insert(slot + 1, right_child);
    }

    /// Split an overflowing node, returning the promoted key and the new right node.
    ///
    /// The promoted key appears in neither half.
    #[must_use]
    pub fn split(&mut self, fanout: usize) -> (K, Self) {
        let mid = self.keys.len() / 2;

        let mut right = Self::with_capacity(fanout);
        right.keys.extend(self.keys.drain(mid + 1..));
        right.children.extend(self.children.drain(mid + 1..));

        let Some(promoted) = self.keys.pop() else {
            unreachable!("split of an internal node with no keys");
        };
        (promoted, right)
    }

    /// Detach the last key and the child to its right.
    pub fn pop_last(&mut self) -> Option<(K, NodeId)> {
        let key = self.keys.pop()?;
        let child = self.children.pop()?;
        Some((key, child))
    }

    /// Detach the first key and the child to its left.
    pub fn pop_first(&mut self) -> Option<(K, NodeId)> {
        if self.keys.is_empty() {
            return None;
        }
        Some((self.keys.remove(0), self.children.remove(0)))
    }

    /// Absorb `right` and the separator that sat between the two nodes in their parent.
    pub fn merge(&mut self, separator: K, right: &mut Self) {
        self.keys.push(separator);
        self.keys.append(&mut right.keys);
        self.children.append(&mut right.children);
    }
}

/// A leaf node.
///
/// Stores key-value pairs and non-owning links to sibling leaves.
#[derive(Debug)]
pub struct LeafNode<K, V> {
    /// Keys in sorted order.
    pub keys: Vec<K>,
    /// `values[i]` belongs to `keys[i]`.
    pub values: Vec<V>,
    pub prev: Option<NodeId>,
    pub next: Option<NodeId>,
}

impl<K: Ord, V> LeafNode<K, V> {
    /// Create an empty leaf with room for one overflow entry.
    #[must_use]
    pub fn with_capacity(fanout: usize) -> Self {
        Self {
            keys: Vec::with_capacity(fanout + 1),
            values: Vec::with_capacity(fanout + 1),
            prev: None,
            next: None,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Find the slot holding `key`, or where it would be inserted.
    pub fn find_index(&self, key: &K) -> Result<usize, usize> {
        self.keys.binary_search(key)
    }

    /// First slot whose key is not less than `key`.
    #[must_use]
    pub fn item_index_of(&self, key: &K) -> usize {
        self.keys.partition_point(|k| k < key)
    }

    /// First slot whose key is greater than `key`.
    #[must_use]
    pub fn child_index_of(&self, key: &K) -> usize {
        child_index_of(&self.keys, key)
    }

    /// Insert or update an entry.
    ///
    /// Returns the old value if updating, None if inserting.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.find_index(&key) {
            Ok(i) => Some(std::mem::replace(&mut self.values[i], value)),
            Err(i) => {
                self.keys.insert(i, key);
                self.values.insert(i, value);
                None
            }
        }
    }

    /// Remove the entry at `index`.
    pub fn remove_at(&mut self, index: usize) -> (K, V) {
        (self.keys.remove(index), self.values.remove(index))
    }

    pub fn push_front(&mut self, key: K, value: V) {
        self.keys.insert(0, key);
        self.values.insert(0, value);
    }

    pub fn push_back(&mut self, key: K, value: V) {
        self.keys.push(key);
        self.values.push(value);
    }

    /// Split an overflowing leaf, returning the new right leaf.
    ///
    /// The left half keeps `ceil(len / 2)` entries. Chain links are left to the caller.
    #[must_use]
    pub fn split(&mut self, fanout: usize) -> Self {
        let mid = self.keys.len().div_ceil(2);

        let mut right = Self::with_capacity(fanout);
        right.keys.extend(self.keys.drain(mid..));
        right.values.extend(self.values.drain(mid..));
        right
    }

    /// Move every entry of `other` onto the end of this leaf.
    pub fn append(&mut self, other: &mut Self) {
        self.keys.append(&mut other.keys);
        self.values.append(&mut other.values);
    }
}

/// First position whose key is greater than `key`.
///
/// Sequential scan over a small node.
#[must_use]
pub fn child_index_of<K: Ord>(keys: &[K], key: &K) -> usize {
    keys.iter().position(|k| key < k).unwrap_or(keys.len())
}
