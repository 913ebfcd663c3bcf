use core::borrow::Borrow;

use alloc::vec::Vec;

use super::node_id::NodeId;

/// A B-tree node. Entries are kept as parallel `keys`/`values` vectors sorted by
/// key; an internal node holds exactly one more child than it has keys, a leaf
/// holds none.
#[derive(Clone)]
pub(crate) struct Node<K, V> {
    // Relation only, the arena owns every node.
    parent: Option<NodeId>,
    keys: Vec<K>,
    values: Vec<V>,
    children: Vec<NodeId>,
}

/// Result of searching for a key in a node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum SearchResult {
    /// Key was found at the given index.
    Found(usize),
    /// Key was not found; the index is both the insertion point and the child
    /// to descend into.
    GoDown(usize),
}

impl<K, V> Node<K, V> {
    /// Creates an empty node sized for a tree of the given order. Room is left
    /// for the one extra entry an overflowing node holds until it is split.
    pub(crate) fn new(order: usize) -> Self {
        Self {
            parent: None,
            keys: Vec::with_capacity(order),
            values: Vec::with_capacity(order),
            children: Vec::new(),
        }
    }

    pub(crate) fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    pub(crate) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns the number of entries in this node.
    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }

    pub(crate) fn values(&self) -> &[V] {
        &self.values
    }

    #[inline]
    pub(crate) fn value(&self, index: usize) -> &V {
        &self.values[index]
    }

    #[inline]
    pub(crate) fn value_mut(&mut self, index: usize) -> &mut V {
        &mut self.values[index]
    }

    pub(crate) fn child_count(&self) -> usize {
        self.children.len()
    }

    #[inline]
    pub(crate) fn child(&self, index: usize) -> NodeId {
        self.children[index]
    }

    pub(crate) fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub(crate) fn first_child(&self) -> Option<NodeId> {
        self.children.first().copied()
    }

    pub(crate) fn last_child(&self) -> Option<NodeId> {
        self.children.last().copied()
    }

    /// Position of `child` among this node's children, found by identity.
    pub(crate) fn child_position(&self, child: NodeId) -> Option<usize> {
        self.children.iter().position(|&id| id == child)
    }

    /// Computes the insertion index of `key` in this node.
    #[inline]
    pub(crate) fn search<Q>(&self, key: &Q) -> SearchResult
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        match self.keys.binary_search_by(|k| k.borrow().cmp(key)) {
            Ok(idx) => SearchResult::Found(idx),
            Err(idx) => SearchResult::GoDown(idx),
        }
    }

    pub(crate) fn insert_entry(&mut self, index: usize, key: K, value: V) {
        self.keys.insert(index, key);
        self.values.insert(index, value);
    }

    pub(crate) fn remove_entry(&mut self, index: usize) -> (K, V) {
        (self.keys.remove(index), self.values.remove(index))
    }

    /// Swaps the entry at `index` for another, returning the previous one.
    pub(crate) fn replace_entry(&mut self, index: usize, key: K, value: V) -> (K, V) {
        (
            core::mem::replace(&mut self.keys[index], key),
            core::mem::replace(&mut self.values[index], value),
        )
    }

    pub(crate) fn push_entry(&mut self, key: K, value: V) {
        self.keys.push(key);
        self.values.push(value);
    }

    pub(crate) fn push_entry_front(&mut self, key: K, value: V) {
        self.insert_entry(0, key, value);
    }

    /// Removes the greatest entry. The node must not be empty.
    pub(crate) fn pop_entry(&mut self) -> (K, V) {
        self.remove_entry(self.keys.len() - 1)
    }

    /// Removes the smallest entry. The node must not be empty.
    pub(crate) fn pop_entry_front(&mut self) -> (K, V) {
        self.remove_entry(0)
    }

    pub(crate) fn insert_child(&mut self, index: usize, child: NodeId) {
        self.children.insert(index, child);
    }

    pub(crate) fn remove_child(&mut self, index: usize) -> NodeId {
        self.children.remove(index)
    }

    pub(crate) fn push_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    pub(crate) fn push_child_front(&mut self, child: NodeId) {
        self.children.insert(0, child);
    }

    /// Pops the last child; `None` for a leaf.
    pub(crate) fn pop_child(&mut self) -> Option<NodeId> {
        self.children.pop()
    }

    /// Pops the first child; `None` for a leaf.
    pub(crate) fn pop_child_front(&mut self) -> Option<NodeId> {
        if self.children.is_empty() {
            None
        } else {
            Some(self.children.remove(0))
        }
    }

    /// Splits an overflowing node around its median entry.
    ///
    /// This node keeps the entries before `mid` and the children before
    /// `mid_children`; the returned sibling takes the entries after `mid` and the
    /// children from `mid_children` on. The median entry is returned separately
    /// for promotion into the parent. Parent links of the sibling's children are
    /// left for the caller to fix.
    pub(crate) fn split_off(&mut self, mid: usize, mid_children: usize) -> (K, V, Node<K, V>) {
        let mut sibling = Node {
            parent: self.parent,
            keys: self.keys.split_off(mid + 1),
            values: self.values.split_off(mid + 1),
            children: Vec::new(),
        };
        if !self.children.is_empty() {
            sibling.children = self.children.split_off(mid_children);
        }

        let median_key = self.keys.remove(mid);
        let median_value = self.values.remove(mid);
        (median_key, median_value, sibling)
    }

    /// Appends the separator entry followed by everything in `right`.
    pub(crate) fn merge_with_right(&mut self, separator_key: K, separator_value: V, mut right: Node<K, V>) {
        self.keys.push(separator_key);
        self.values.push(separator_value);
        self.keys.append(&mut right.keys);
        self.values.append(&mut right.values);
        self.children.append(&mut right.children);
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::vec;

    fn leaf(keys: &[i32]) -> Node<i32, i32> {
        let mut node = Node::new(8);
        for &key in keys {
            node.push_entry(key, key * 10);
        }
        node
    }

    #[test]
    fn new_node_is_a_detached_empty_leaf() {
        let node: Node<i32, i32> = Node::new(5);
        assert_eq!(node.parent(), None);
        assert!(node.is_leaf());
        assert!(node.is_empty());
        assert!(node.keys.capacity() >= 5);
    }

    #[test]
    fn search_reports_insertion_index() {
        let node = leaf(&[10, 20, 30]);
        assert_eq!(node.search(&5), SearchResult::GoDown(0));
        assert_eq!(node.search(&10), SearchResult::Found(0));
        assert_eq!(node.search(&25), SearchResult::GoDown(2));
        assert_eq!(node.search(&30), SearchResult::Found(2));
        assert_eq!(node.search(&31), SearchResult::GoDown(3));
        assert_eq!(leaf(&[]).search(&1), SearchResult::GoDown(0));
    }

    #[test]
    fn split_leaf_with_odd_entries() {
        // order 3 overflow: three entries, median index (3 - 1) / 2 = 1
        let mut node = leaf(&[5, 8, 12]);
        let (key, value, sibling) = node.split_off(1, 0);
        assert_eq!((key, value), (8, 80));
        assert_eq!(node.keys(), &[5]);
        assert_eq!(node.values(), &[50]);
        assert_eq!(sibling.keys(), &[12]);
        assert!(sibling.is_leaf());
    }

    #[test]
    fn split_internal_keeps_child_counts_consistent() {
        // order 4 overflow: four entries, five children
        let mut node = leaf(&[1, 2, 3, 4]);
        for index in 0..5 {
            node.push_child(NodeId::from_index(index));
        }
        let (key, _, sibling) = node.split_off((4 - 1) / 2, 5 / 2);
        assert_eq!(key, 2);
        assert_eq!(node.keys(), &[1]);
        assert_eq!(node.child_count(), 2);
        assert_eq!(sibling.keys(), &[3, 4]);
        assert_eq!(sibling.children(), &[NodeId::from_index(2), NodeId::from_index(3), NodeId::from_index(4)]);
    }

    #[test]
    fn merge_pulls_separator_between_halves() {
        let mut left = leaf(&[1, 2]);
        let right = leaf(&[7, 9]);
        left.merge_with_right(5, 50, right);
        assert_eq!(left.keys(), &[1, 2, 5, 7, 9]);
        assert_eq!(left.values(), &[10, 20, 50, 70, 90]);
    }

    #[test]
    fn entry_rotation_primitives() {
        let mut node = leaf(&[2, 4, 6]);
        assert_eq!(node.pop_entry(), (6, 60));
        assert_eq!(node.pop_entry_front(), (2, 20));
        node.push_entry_front(1, 11);
        node.push_entry(9, 99);
        assert_eq!(node.replace_entry(1, 5, 55), (4, 40));
        assert_eq!(node.keys(), &[1, 5, 9]);
        assert_eq!(node.values(), &[11, 55, 99]);
        assert_eq!(node.pop_child(), None);
        assert_eq!(node.pop_child_front(), None);
    }

    #[test]
    fn child_position_is_identity_lookup() {
        let mut node = leaf(&[1]);
        let ids = vec![NodeId::from_index(7), NodeId::from_index(3)];
        for &id in &ids {
            node.push_child(id);
        }
        assert_eq!(node.child_position(NodeId::from_index(3)), Some(1));
        assert_eq!(node.child_position(NodeId::from_index(4)), None);
    }
}
