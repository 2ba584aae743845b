//! Structural invariant checks and a level-by-level debug dump.

use std::fmt::{self, Write as _};

use super::arena::NodeId;
use super::node::Node;
use super::tree::BPlusTree;

/// A broken structural invariant, naming the offending node by arena slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantError {
    /// A child or chain link points at a vacant arena slot.
    DanglingNode { node: usize },
    /// Keys inside a node are not strictly increasing.
    UnsortedKeys { node: usize },
    /// A node holds more than `fanout` keys.
    Overfull { node: usize, len: usize, max: usize },
    /// A non-root node holds fewer than the minimum keys.
    Underfull { node: usize, len: usize, min: usize },
    /// The root exists but holds no keys.
    EmptyRoot { node: usize },
    /// A key lies outside the range its parent separators allow.
    KeyOutOfRange { node: usize },
    /// An internal node does not have exactly one more child than keys.
    ChildCountMismatch { node: usize, keys: usize, children: usize },
    /// A leaf's key and value counts differ.
    ValueCountMismatch { node: usize, keys: usize, values: usize },
    /// Leaves sit at different depths.
    UnevenDepth { node: usize, depth: usize, expected: usize },
    /// A `prev`/`next` link disagrees with the in-order leaf sequence.
    BrokenChain { node: usize },
    /// The last key of a leaf is not below the first key of its successor.
    ChainOrder { node: usize },
    /// The arena holds nodes unreachable from the root.
    LeakedNodes { reachable: usize, live: usize },
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingNode { node } => write!(f, "node {node} is not allocated"),
            Self::UnsortedKeys { node } => write!(f, "node {node} has unsorted keys"),
            Self::Overfull { node, len, max } => {
                write!(f, "node {node} holds {len} keys, maximum is {max}")
            }
            Self::Underfull { node, len, min } => {
                write!(f, "node {node} holds {len} keys, minimum is {min}")
            }
            Self::EmptyRoot { node } => write!(f, "root {node} holds no keys"),
            Self::KeyOutOfRange { node } => {
                write!(f, "node {node} has a key outside its separator range")
            }
            Self::ChildCountMismatch {
                node,
                keys,
                children,
            } => write!(f, "internal node {node} has {keys} keys but {children} children"),
            Self::ValueCountMismatch { node, keys, values } => {
                write!(f, "leaf {node} has {keys} keys but {values} values")
            }
            Self::UnevenDepth {
                node,
                depth,
                expected,
            } => write!(f, "leaf {node} at depth {depth}, expected {expected}"),
            Self::BrokenChain { node } => write!(f, "leaf {node} has a broken chain link"),
            Self::ChainOrder { node } => {
                write!(f, "leaf {node} overlaps the key range of its successor")
            }
            Self::LeakedNodes { reachable, live } => {
                write!(f, "{live} nodes allocated but only {reachable} reachable")
            }
        }
    }
}

impl std::error::Error for InvariantError {}

/// State carried through one recursive walk.
struct Walk {
    leaves: Vec<NodeId>,
    leaf_depth: Option<usize>,
    visited: usize,
}

impl<K: Ord + Clone, V> BPlusTree<K, V> {
    /// Check every structural invariant of the tree. O(n).
    ///
    /// Covers node occupancy, key order within and across nodes, uniform leaf
    /// depth, the doubly-linked leaf chain and arena bookkeeping.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let Some(root) = self.root else {
            let live = self.arena.live();
            if live != 0 {
                return Err(InvariantError::LeakedNodes { reachable: 0, live });
            }
            return Ok(());
        };

        let mut walk = Walk {
            leaves: Vec::new(),
            leaf_depth: None,
            visited: 0,
        };
        self.check_node(root, None, None, 0, &mut walk)?;
        self.check_chain(&walk.leaves)?;

        if walk.visited != self.arena.live() {
            return Err(InvariantError::LeakedNodes {
                reachable: walk.visited,
                live: self.arena.live(),
            });
        }
        Ok(())
    }

    /// Keys of `id` must satisfy `lower <= key < upper`.
    fn check_node(
        &self,
        id: NodeId,
        lower: Option<&K>,
        upper: Option<&K>,
        depth: usize,
        walk: &mut Walk,
    ) -> Result<(), InvariantError> {
        let node = id.index();
        let is_root = depth == 0;
        let Some(entry) = self.arena.get(id) else {
            return Err(InvariantError::DanglingNode { node });
        };
        walk.visited += 1;

        let keys = entry.keys();
        if !keys.windows(2).all(|pair| pair[0] < pair[1]) {
            return Err(InvariantError::UnsortedKeys { node });
        }
        if keys.len() > self.config.fanout() {
            return Err(InvariantError::Overfull {
                node,
                len: keys.len(),
                max: self.config.fanout(),
            });
        }
        if is_root && keys.is_empty() {
            return Err(InvariantError::EmptyRoot { node });
        }
        let in_range = keys.iter().all(|key| {
            lower.is_none_or(|lo| lo <= key) && upper.is_none_or(|hi| key < hi)
        });
        if !in_range {
            return Err(InvariantError::KeyOutOfRange { node });
        }

        match entry {
            Node::Leaf(leaf) => {
                let min = self.config.min_leaf_entries();
                if !is_root && leaf.len() < min {
                    return Err(InvariantError::Underfull {
                        node,
                        len: leaf.len(),
                        min,
                    });
                }
                if leaf.values.len() != leaf.keys.len() {
                    return Err(InvariantError::ValueCountMismatch {
                        node,
                        keys: leaf.keys.len(),
                        values: leaf.values.len(),
                    });
                }
                let expected = *walk.leaf_depth.get_or_insert(depth);
                if depth != expected {
                    return Err(InvariantError::UnevenDepth {
                        node,
                        depth,
                        expected,
                    });
                }
                walk.leaves.push(id);
            }
            Node::Internal(internal) => {
                let min = self.config.min_internal_keys();
                if !is_root && internal.keys.len() < min {
                    return Err(InvariantError::Underfull {
                        node,
                        len: internal.keys.len(),
                        min,
                    });
                }
                if internal.children.len() != internal.keys.len() + 1 {
                    return Err(InvariantError::ChildCountMismatch {
                        node,
                        keys: internal.keys.len(),
                        children: internal.children.len(),
                    });
                }
                for (i, &child) in internal.children.iter().enumerate() {
                    let lo = if i == 0 { lower } else { Some(&internal.keys[i - 1]) };
                    let hi = internal.keys.get(i).or(upper);
                    self.check_node(child, lo, hi, depth + 1, walk)?;
                }
            }
        }
        Ok(())
    }

    /// The chain must visit exactly the in-order leaves, linked both ways.
    fn check_chain(&self, leaves: &[NodeId]) -> Result<(), InvariantError> {
        for (i, &id) in leaves.iter().enumerate() {
            let leaf = self.arena.leaf(id);
            let expected_prev = i.checked_sub(1).map(|p| leaves[p]);
            let expected_next = leaves.get(i + 1).copied();
            if leaf.prev != expected_prev || leaf.next != expected_next {
                return Err(InvariantError::BrokenChain { node: id.index() });
            }
            if let Some(next) = expected_next {
                let successor = self.arena.leaf(next);
                let ordered = match (leaf.keys.last(), successor.keys.first()) {
                    (Some(last), Some(first)) => last < first,
                    _ => true,
                };
                if !ordered {
                    return Err(InvariantError::ChainOrder { node: id.index() });
                }
            }
        }
        Ok(())
    }
}

impl<K: fmt::Debug, V> BPlusTree<K, V> {
    /// Render the tree one level per line, each node as its bracketed key list.
    #[must_use]
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let mut level: Vec<NodeId> = self.root.into_iter().collect();
        let mut depth = 0;
        while !level.is_empty() {
            let _ = write!(out, "{depth}:");
            let mut below = Vec::new();
            for id in level {
                match self.arena.get(id) {
                    Some(node) => {
                        let _ = write!(out, " {:?}", node.keys());
                        if let Node::Internal(internal) = node {
                            below.extend_from_slice(&internal.children);
                        }
                    }
                    None => out.push_str(" <dangling>"),
                }
            }
            out.push('\n');
            level = below;
            depth += 1;
        }
        out
    }
}
