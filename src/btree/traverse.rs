use core::fmt;
use core::iter::FusedIterator;

use alloc::collections::VecDeque;

use crate::raw::{Node, NodeId, RawBTree};

/// A level-order walk over the nodes of a [`BTree`](crate::BTree).
///
/// Created by [`BTree::traverse`](crate::BTree::traverse). Nodes come out root
/// first, then each level from left to right. Calling `traverse` again starts a
/// fresh walk from the root, while cloning continues from the current position.
pub struct Traverse<'a, K, V> {
    raw: &'a RawBTree<K, V>,
    queue: VecDeque<(NodeId, usize)>,
}

impl<'a, K, V> Traverse<'a, K, V> {
    pub(crate) fn new(raw: &'a RawBTree<K, V>) -> Self {
        Self {
            raw,
            queue: raw.root().map(|root| (root, 0)).into_iter().collect(),
        }
    }
}

impl<K, V> Clone for Traverse<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw,
            queue: self.queue.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Traverse<'a, K, V> {
    type Item = NodeView<'a, K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let (id, depth) = self.queue.pop_front()?;
        let node = self.raw.node(id);
        self.queue.extend(node.children().iter().map(|&child| (child, depth + 1)));
        let parent = node.parent().map(|parent| self.raw.node(parent));
        Some(NodeView { node, parent, depth })
    }
}

impl<K, V> FusedIterator for Traverse<'_, K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Traverse<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// A read-only view of one node, as yielded by [`Traverse`].
pub struct NodeView<'a, K, V> {
    node: &'a Node<K, V>,
    parent: Option<&'a Node<K, V>>,
    depth: usize,
}

impl<'a, K, V> NodeView<'a, K, V> {
    /// Distance from the root, which is at depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.node.is_leaf()
    }

    /// Number of entries in the node.
    #[must_use]
    pub fn len(&self) -> usize {
        self.node.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.node.is_empty()
    }

    /// Number of children; zero for a leaf.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.node.child_count()
    }

    /// The node's keys in ascending order.
    #[must_use]
    pub fn keys(&self) -> &'a [K] {
        self.node.keys()
    }

    /// The node's values, in the same order as [`keys`](Self::keys).
    #[must_use]
    pub fn values(&self) -> &'a [V] {
        self.node.values()
    }

    /// Keys of the node's parent; empty for the root.
    #[must_use]
    pub fn parent_keys(&self) -> &'a [K] {
        match self.parent {
            Some(parent) => parent.keys(),
            None => &[],
        }
    }

    /// The node's entries in ascending key order.
    pub fn entries(&self) -> impl Iterator<Item = (&'a K, &'a V)> {
        self.node.keys().iter().zip(self.node.values())
    }
}

impl<K, V> Clone for NodeView<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for NodeView<'_, K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for NodeView<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeView")
            .field("depth", &self.depth)
            .field("keys", &self.keys())
            .field("values", &self.values())
            .finish()
    }
}
