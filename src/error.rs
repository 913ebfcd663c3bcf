//! Error types.

use thiserror::Error;

/// Convenient `Result` alias for fallible construction.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors reported when configuring a tree.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum Error {
    /// The requested order is below [`MIN_ORDER`](crate::MIN_ORDER).
    #[error("order must be at least 3, got {0}")]
    InvalidOrder(usize),
}

/// A broken structural invariant, as found by [`BTree::validate`].
///
/// Every public operation leaves the tree valid, so seeing one of these means a
/// bug in the tree itself. Depths count from the root at depth 0.
///
/// [`BTree::validate`]: crate::BTree::validate
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("keys out of order in node at depth {depth}")]
    UnsortedKeys { depth: usize },

    #[error("internal node at depth {depth} has {children} children for {keys} keys")]
    ChildCount { depth: usize, keys: usize, children: usize },

    #[error("node at depth {depth} holds a key outside the range set by its ancestors")]
    SeparatorOrder { depth: usize },

    #[error("node at depth {depth} holds {keys} keys, expected {min}..={max}")]
    Occupancy { depth: usize, keys: usize, min: usize, max: usize },

    #[error("leaf at depth {depth}, expected every leaf at depth {expected}")]
    LeafDepth { depth: usize, expected: usize },

    #[error("node at depth {depth} does not link back to the node holding it")]
    ParentLink { depth: usize },

    #[error("tree records {recorded} entries but holds {actual}")]
    Length { recorded: usize, actual: usize },

    #[error("{live} nodes allocated but only {reachable} reachable from the root")]
    Unreachable { live: usize, reachable: usize },
}
