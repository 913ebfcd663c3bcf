//! An in-memory ordered dictionary backed by a B-tree.
//!
//! [`BTree`] is a classic B-tree of configurable order: entries are stored in
//! internal nodes as well as leaves, overflowing nodes are split around their
//! median, and deletions are repaired by borrowing from a sibling, merging with
//! it, or collapsing the root.
//!
//! # Example
//!
//! ```
//! use lab_btree::BTree;
//!
//! let mut tree = BTree::new(3)?;
//! for key in [39, 4, 5, 52, 99, 23, 16, 9, 55, 85, 100, 44, 33, 101] {
//!     tree.insert(key, key * 10);
//! }
//!
//! for key in [23, 16, 100, 99, 101] {
//!     tree.remove(&key);
//!     assert!(tree.is_valid(3));
//! }
//!
//! assert_eq!(tree.find(&52), Some(&520));
//! assert_eq!(tree.find(&23), None);
//!
//! // Level-order view of the nodes, for printing.
//! for node in tree.traverse() {
//!     let _ = (node.depth(), node.keys(), node.values());
//! }
//! # Ok::<(), lab_btree::Error>(())
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library dependency
//! - **Explicit duplicate policy** - Ignore or replace, see [`DuplicatePolicy`]
//! - **Self-checking** - [`BTree::validate`] reports the first broken invariant
//! - **`cli`** - Builds the `btree_driver` binary for manual workloads
//!
//! # Implementation
//!
//! Nodes live in an arena and refer to each other by index, children as well as
//! parents. Insertion unwinds the recorded descent path splitting as it goes;
//! deletion repairs underflow by walking parent links back toward the root.
//! Structural events are reported through the [`log`] facade at `trace` level.

#![no_std]
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod raw;

pub mod btree;
pub mod error;

pub use btree::{BTree, Config, DEFAULT_ORDER, DuplicatePolicy, Insertion, MIN_ORDER, NodeView, Traverse};
pub use error::{Error, InvariantViolation, Result};
