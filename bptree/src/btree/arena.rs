//! Slot arena that owns every node of a tree.
//!
//! Nodes are addressed by `NodeId`. Released slots go on a free list and are
//! handed out again by later allocations, so a stale `NodeId` may alias a newer
//! node. The tree never keeps an id past the release of its node; cursors held
//! by callers are the one exception and are documented as invalidated by
//! mutation.

use std::ops::{Index, IndexMut};

use super::node::{InternalNode, LeafNode, Node};

/// Handle to a node slot in a `NodeArena`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Owner of all nodes in one tree.
#[derive(Debug)]
pub struct NodeArena<K, V> {
    slots: Vec<Option<Node<K, V>>>,
    /// Vacant slot indices, reused LIFO.
    free: Vec<NodeId>,
    /// Number of occupied slots.
    live: usize,
}

impl<K, V> Default for NodeArena<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> NodeArena<K, V> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Number of nodes currently allocated.
    #[must_use]
    pub const fn live(&self) -> usize {
        self.live
    }

    /// Store `node` and return its handle.
    pub fn alloc(&mut self, node: Node<K, V>) -> NodeId {
        self.live += 1;
        if let Some(id) = self.free.pop() {
            self.slots[id.index()] = Some(node);
            id
        } else {
            self.slots.push(Some(node));
            NodeId::new(self.slots.len() - 1)
        }
    }

    /// Remove a node from the arena, returning it.
    ///
    /// Returns `None` if the slot is already vacant.
    pub fn release(&mut self, id: NodeId) -> Option<Node<K, V>> {
        let node = self.slots.get_mut(id.index())?.take()?;
        self.free.push(id);
        self.live -= 1;
        Some(node)
    }

    /// Drop every node and forget all slots.
    pub fn reset(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.live = 0;
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node<K, V>> {
        self.slots.get(id.index())?.as_ref()
    }

    /// The leaf at `id`, if the slot is occupied by a leaf.
    #[must_use]
    pub fn get_leaf(&self, id: NodeId) -> Option<&LeafNode<K, V>> {
        match self.get(id)? {
            Node::Leaf(leaf) => Some(leaf),
            Node::Internal(_) => None,
        }
    }

    pub fn get_leaf_mut(&mut self, id: NodeId) -> Option<&mut LeafNode<K, V>> {
        match self.slots.get_mut(id.index())?.as_mut()? {
            Node::Leaf(leaf) => Some(leaf),
            Node::Internal(_) => None,
        }
    }

    /// The leaf at `id`. Panics if the slot holds anything else.
    #[must_use]
    pub fn leaf(&self, id: NodeId) -> &LeafNode<K, V> {
        match &self[id] {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => panic!("node {id:?} is not a leaf"),
        }
    }

    pub fn leaf_mut(&mut self, id: NodeId) -> &mut LeafNode<K, V> {
        match &mut self[id] {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => panic!("node {id:?} is not a leaf"),
        }
    }

    /// The internal node at `id`. Panics if the slot holds anything else.
    #[must_use]
    pub fn internal(&self, id: NodeId) -> &InternalNode<K> {
        match &self[id] {
            Node::Internal(node) => node,
            Node::Leaf(_) => panic!("node {id:?} is not an internal node"),
        }
    }

    pub fn internal_mut(&mut self, id: NodeId) -> &mut InternalNode<K> {
        match &mut self[id] {
            Node::Internal(node) => node,
            Node::Leaf(_) => panic!("node {id:?} is not an internal node"),
        }
    }
}

impl<K, V> Index<NodeId> for NodeArena<K, V> {
    type Output = Node<K, V>;

    fn index(&self, id: NodeId) -> &Self::Output {
        match self.get(id) {
            Some(node) => node,
            None => panic!("dangling node id {id:?}"),
        }
    }
}

impl<K, V> IndexMut<NodeId> for NodeArena<K, V> {
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        match self.slots.get_mut(id.index()).and_then(Option::as_mut) {
            Some(node) => node,
            None => panic!("dangling node id {id:?}"),
        }
    }
}
