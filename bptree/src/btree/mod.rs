//! In-memory B+Tree map.
//!
//! # Structure
//!
//! The tree consists of:
//! - Internal nodes: separator keys and child handles, `children[i]` covers keys
//!   in `[keys[i-1], keys[i])`
//! - Leaf nodes: key-value pairs in ascending order, doubly-linked so scans and
//!   floor lookups walk the chain instead of re-descending
//!
//! All nodes live in a per-tree arena and refer to each other by `NodeId`. The
//! tree keeps no parent pointers; splits and merges propagate along the path
//! recorded on the way down.
//!
//! # Usage
//!
//! ```
//! use bptree::btree::BPlusTree;
//!
//! let mut tree = BPlusTree::new();
//! tree.insert(10, "ten");
//! tree.insert(20, "twenty");
//!
//! assert_eq!(tree.search(&10), Some(&"ten"));
//! assert_eq!(tree.key_at(tree.find_left(&15)), Some(&10));
//! assert!(tree.remove(&10));
//! assert_eq!(tree.len(), 1);
//! ```

mod arena;
mod cursor;
mod node;
mod tree;
mod verify;

pub use cursor::{Cursor, Iter};
pub use tree::BPlusTree;
pub use verify::InvariantError;
