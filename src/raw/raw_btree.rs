use core::borrow::Borrow;

use log::trace;
use smallvec::SmallVec;

use super::arena::Arena;
use super::node::{Node, SearchResult};
use super::node_id::NodeId;
use crate::btree::Insertion;
use crate::btree::config::{DuplicatePolicy, min_keys};

/// The core B-tree implementation backing `BTree`.
///
/// Entries live in every node, not only in leaves. Children are owned through
/// the arena; each node also records its parent so that deletion can walk back
/// up from the leaf where an underflow started.
#[derive(Clone)]
pub(crate) struct RawBTree<K, V> {
    /// Arena storing all tree nodes.
    nodes: Arena<Node<K, V>>,
    /// Handle to the root node, if the tree is non-empty.
    root: Option<NodeId>,
    /// Maximum number of children per node.
    order: usize,
    /// Total number of entries in the tree.
    len: usize,
}

/// One step of a root-to-leaf descent.
struct PathFrame {
    /// The internal node passed through.
    node: NodeId,
    /// Index of the child descended into.
    child_index: usize,
}

type Path = SmallVec<[PathFrame; 16]>;

impl<K, V> RawBTree<K, V> {
    /// Creates an empty tree. `order` must already be validated.
    pub(crate) const fn new(order: usize) -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
            order,
            len: 0,
        }
    }

    pub(crate) const fn order(&self) -> usize {
        self.order
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node<K, V> {
        self.nodes.get(id)
    }

    /// Number of nodes currently allocated.
    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of levels; zero for an empty tree.
    pub(crate) fn height(&self) -> usize {
        let mut height = 0;
        let mut current = self.root;
        while let Some(id) = current {
            height += 1;
            current = self.nodes.get(id).first_child();
        }
        height
    }

    /// Drops every node.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.len = 0;
    }

    fn min_keys(&self) -> usize {
        min_keys(self.order)
    }

    fn is_overflowing(&self, id: NodeId) -> bool {
        self.nodes.get(id).len() >= self.order
    }

    fn leftmost_leaf(&self, mut id: NodeId) -> NodeId {
        while let Some(child) = self.nodes.get(id).first_child() {
            id = child;
        }
        id
    }

    fn rightmost_leaf(&self, mut id: NodeId) -> NodeId {
        while let Some(child) = self.nodes.get(id).last_child() {
            id = child;
        }
        id
    }

    /// Splits the overflowing child at `child_index` of `parent_id`, promoting its
    /// median entry into the parent. Never cascades; the caller checks the parent.
    fn split_child(&mut self, parent_id: NodeId, child_index: usize) {
        let child_id = self.nodes.get(parent_id).child(child_index);
        let child = self.nodes.get_mut(child_id);
        let mid = (child.len() - 1) / 2;
        let mid_children = child.child_count() / 2;
        let (median_key, median_value, sibling) = child.split_off(mid, mid_children);
        child.set_parent(Some(parent_id));

        let adopted: SmallVec<[NodeId; 16]> = sibling.children().iter().copied().collect();
        let sibling_id = self.nodes.alloc(sibling);
        self.nodes.get_mut(sibling_id).set_parent(Some(parent_id));
        for grandchild in adopted {
            self.nodes.get_mut(grandchild).set_parent(Some(sibling_id));
        }

        let parent = self.nodes.get_mut(parent_id);
        parent.insert_entry(child_index, median_key, median_value);
        parent.insert_child(child_index + 1, sibling_id);

        trace!("split child {child_index} of {parent_id:?} into {child_id:?} and {sibling_id:?}");
    }

    /// Replaces an overflowing root with a new root holding only the median.
    /// This is the only place the tree grows taller.
    fn grow_root(&mut self, old_root: NodeId) {
        let mut new_root = Node::new(self.order);
        new_root.push_child(old_root);
        let new_root_id = self.nodes.alloc(new_root);
        self.split_child(new_root_id, 0);
        self.root = Some(new_root_id);

        trace!("grew root {new_root_id:?}, height is now {}", self.height());
    }

    /// Repairs an underflow starting at `node_id` and walking toward the root.
    ///
    /// At each level the node borrows from its left sibling, else its right
    /// sibling, else merges with one of them and the repair moves to the parent.
    fn rebalance(&mut self, mut node_id: NodeId) {
        let min = self.min_keys();

        loop {
            let node = self.nodes.get(node_id);
            let Some(parent_id) = node.parent() else {
                self.collapse_root(node_id);
                return;
            };
            if node.len() >= min {
                return;
            }

            let parent = self.nodes.get(parent_id);
            let index = parent
                .child_position(node_id)
                .expect("`RawBTree::rebalance()` - parent does not hold the child!");

            if index > 0 && self.nodes.get(parent.child(index - 1)).len() > min {
                self.borrow_from_left(parent_id, index);
                return;
            }

            if index + 1 < parent.child_count() && self.nodes.get(parent.child(index + 1)).len() > min {
                self.borrow_from_right(parent_id, index);
                return;
            }

            let separator = if index > 0 { index - 1 } else { index };
            self.merge_children(parent_id, separator);
            node_id = parent_id;
        }
    }

    /// Rotates the left sibling's last entry through the parent into the front
    /// of the child at `index`.
    fn borrow_from_left(&mut self, parent_id: NodeId, index: usize) {
        let parent = self.nodes.get(parent_id);
        let left_id = parent.child(index - 1);
        let node_id = parent.child(index);

        let left = self.nodes.get_mut(left_id);
        let (key, value) = left.pop_entry();
        let moved_child = left.pop_child();

        let (separator_key, separator_value) = self.nodes.get_mut(parent_id).replace_entry(index - 1, key, value);

        let node = self.nodes.get_mut(node_id);
        node.push_entry_front(separator_key, separator_value);
        if let Some(child) = moved_child {
            node.push_child_front(child);
            self.nodes.get_mut(child).set_parent(Some(node_id));
        }

        trace!("{node_id:?} borrowed from left sibling {left_id:?}");
    }

    /// Rotates the right sibling's first entry through the parent onto the end
    /// of the child at `index`.
    fn borrow_from_right(&mut self, parent_id: NodeId, index: usize) {
        let parent = self.nodes.get(parent_id);
        let node_id = parent.child(index);
        let right_id = parent.child(index + 1);

        let right = self.nodes.get_mut(right_id);
        let (key, value) = right.pop_entry_front();
        let moved_child = right.pop_child_front();

        let (separator_key, separator_value) = self.nodes.get_mut(parent_id).replace_entry(index, key, value);

        let node = self.nodes.get_mut(node_id);
        node.push_entry(separator_key, separator_value);
        if let Some(child) = moved_child {
            node.push_child(child);
            self.nodes.get_mut(child).set_parent(Some(node_id));
        }

        trace!("{node_id:?} borrowed from right sibling {right_id:?}");
    }

    /// Merges the children on either side of the parent's entry at `separator`,
    /// pulling that entry down between them. The right child is freed.
    fn merge_children(&mut self, parent_id: NodeId, separator: usize) {
        let parent = self.nodes.get_mut(parent_id);
        let (separator_key, separator_value) = parent.remove_entry(separator);
        let right_id = parent.remove_child(separator + 1);
        let left_id = parent.child(separator);

        let right = self.nodes.take(right_id);
        let adopted: SmallVec<[NodeId; 16]> = right.children().iter().copied().collect();
        self.nodes.get_mut(left_id).merge_with_right(separator_key, separator_value, right);
        for child in adopted {
            self.nodes.get_mut(child).set_parent(Some(left_id));
        }

        trace!("merged {right_id:?} into {left_id:?}");
    }

    /// Handles a root that may have been emptied. An empty internal root is
    /// replaced by its only child; an empty leaf root leaves the tree empty.
    /// A root that still holds entries is exempt from minimum occupancy.
    fn collapse_root(&mut self, root_id: NodeId) {
        let root = self.nodes.get(root_id);
        if !root.is_empty() {
            return;
        }

        let new_root = root.first_child();
        self.nodes.free(root_id);
        if let Some(child) = new_root {
            self.nodes.get_mut(child).set_parent(None);
        }
        self.root = new_root;

        trace!("collapsed root {root_id:?}, height is now {}", self.height());
    }
}

// Hooks for corrupting a tree in tests.
#[cfg(test)]
impl<K, V> RawBTree<K, V> {
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        self.nodes.get_mut(id)
    }

    pub(crate) fn alloc_node(&mut self, node: Node<K, V>) -> NodeId {
        self.nodes.alloc(node)
    }

    pub(crate) fn set_len(&mut self, len: usize) {
        self.len = len;
    }
}

impl<K: Ord, V> RawBTree<K, V> {
    /// Locates a key, returning the node holding it and its index there.
    pub(crate) fn search<Q>(&self, key: &Q) -> Option<(NodeId, usize)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root?;

        loop {
            let node = self.nodes.get(current);
            match node.search(key) {
                SearchResult::Found(idx) => return Some((current, idx)),
                SearchResult::GoDown(_) if node.is_leaf() => return None,
                SearchResult::GoDown(idx) => current = node.child(idx),
            }
        }
    }

    /// Returns a reference to the value corresponding to the key.
    pub(crate) fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let (id, idx) = self.search(key)?;
        Some(self.nodes.get(id).value(idx))
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub(crate) fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let (id, idx) = self.search(key)?;
        Some(self.nodes.get_mut(id).value_mut(idx))
    }

    /// Inserts an entry, applying `duplicates` if the key is already present.
    pub(crate) fn insert(&mut self, key: K, value: V, duplicates: DuplicatePolicy) -> Insertion<V> {
        let Some(root) = self.root else {
            let mut leaf = Node::new(self.order);
            leaf.push_entry(key, value);
            let root = self.nodes.alloc(leaf);
            self.root = Some(root);
            self.len = 1;
            trace!("allocated root leaf {root:?}");
            return Insertion::Inserted;
        };

        // Descend to the leaf, remembering the way back up.
        let mut path: Path = SmallVec::new();
        let mut current = root;

        loop {
            let node = self.nodes.get(current);
            match node.search(&key) {
                SearchResult::Found(idx) => {
                    return match duplicates {
                        DuplicatePolicy::Ignore => Insertion::Ignored(value),
                        DuplicatePolicy::Replace => {
                            let stored = self.nodes.get_mut(current).value_mut(idx);
                            Insertion::Replaced(core::mem::replace(stored, value))
                        }
                    };
                }
                SearchResult::GoDown(idx) if node.is_leaf() => {
                    self.nodes.get_mut(current).insert_entry(idx, key, value);
                    break;
                }
                SearchResult::GoDown(idx) => {
                    path.push(PathFrame {
                        node: current,
                        child_index: idx,
                    });
                    current = node.child(idx);
                }
            }
        }
        self.len += 1;

        // Unwind, splitting each child that overflowed. A child that did not
        // overflow added nothing to its parent, so the unwind can stop there.
        while let Some(frame) = path.pop() {
            let child = self.nodes.get(frame.node).child(frame.child_index);
            if !self.is_overflowing(child) {
                return Insertion::Inserted;
            }
            self.split_child(frame.node, frame.child_index);
        }

        if self.is_overflowing(root) {
            self.grow_root(root);
        }

        Insertion::Inserted
    }

    /// Removes a key from the tree, returning its entry.
    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let (id, idx) = self.search(key)?;

        let removed = if self.nodes.get(id).is_leaf() {
            self.remove_from_leaf(id, idx)
        } else {
            self.remove_from_internal(id, idx)
        };
        self.len -= 1;

        Some(removed)
    }

    fn remove_from_leaf(&mut self, leaf_id: NodeId, idx: usize) -> (K, V) {
        let removed = self.nodes.get_mut(leaf_id).remove_entry(idx);
        self.rebalance(leaf_id);
        removed
    }

    /// Replaces the entry at `idx` of an internal node with its predecessor when
    /// that leaf can spare an entry, otherwise with its successor, then repairs
    /// the leaf the substitute came from.
    fn remove_from_internal(&mut self, node_id: NodeId, idx: usize) -> (K, V) {
        let node = self.nodes.get(node_id);
        let predecessor_leaf = self.rightmost_leaf(node.child(idx));
        let successor_leaf = self.leftmost_leaf(node.child(idx + 1));

        if self.nodes.get(predecessor_leaf).len() > self.min_keys() {
            let (key, value) = self.nodes.get_mut(predecessor_leaf).pop_entry();
            return self.nodes.get_mut(node_id).replace_entry(idx, key, value);
        }

        let (key, value) = self.nodes.get_mut(successor_leaf).pop_entry_front();
        let removed = self.nodes.get_mut(node_id).replace_entry(idx, key, value);
        self.rebalance(successor_leaf);
        removed
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
mod tests {
    use super::*;
    use alloc::collections::BTreeMap;
    use alloc::vec;
    use alloc::vec::Vec;
    use proptest::prelude::*;

    fn tree_with(order: usize, keys: &[i32]) -> RawBTree<i32, i32> {
        let mut tree = RawBTree::new(order);
        for &key in keys {
            tree.insert(key, key, DuplicatePolicy::Ignore);
            tree.validate(order).unwrap();
        }
        tree
    }

    /// Keys of every node, level by level, for asserting exact shapes.
    fn shape(tree: &RawBTree<i32, i32>) -> Vec<Vec<Vec<i32>>> {
        let mut levels = Vec::new();
        let mut level: Vec<NodeId> = tree.root().into_iter().collect();
        while !level.is_empty() {
            levels.push(level.iter().map(|&id| tree.node(id).keys().to_vec()).collect());
            level = level.iter().flat_map(|&id| tree.node(id).children().to_vec()).collect();
        }
        levels
    }

    #[test]
    fn root_split_promotes_median() {
        let tree = tree_with(3, &[5, 8, 12]);
        assert_eq!(shape(&tree), vec![vec![vec![8]], vec![vec![5], vec![12]]]);
        assert_eq!(tree.height(), 2);
    }

    #[test]
    fn split_of_even_overflow_keeps_left_smaller() {
        // order 4 overflows at four entries: median index 1
        let tree = tree_with(4, &[1, 2, 3, 4]);
        assert_eq!(shape(&tree), vec![vec![vec![2]], vec![vec![1], vec![3, 4]]]);
    }

    #[test]
    fn duplicate_policy() {
        let mut tree = tree_with(3, &[1, 2, 3]);
        assert_eq!(tree.insert(2, 20, DuplicatePolicy::Ignore), Insertion::Ignored(20));
        assert_eq!(tree.get(&2), Some(&2));
        assert_eq!(tree.insert(2, 20, DuplicatePolicy::Replace), Insertion::Replaced(2));
        assert_eq!(tree.get(&2), Some(&20));
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn leaf_borrows_from_left_sibling() {
        //      [3]
        //  [1 2]   [4]
        let mut tree = tree_with(3, &[1, 3, 4, 2]);
        assert_eq!(shape(&tree), vec![vec![vec![3]], vec![vec![1, 2], vec![4]]]);

        assert_eq!(tree.remove(&4), Some((4, 4)));
        tree.validate(3).unwrap();
        assert_eq!(shape(&tree), vec![vec![vec![2]], vec![vec![1], vec![3]]]);
    }

    #[test]
    fn leaf_borrows_from_right_sibling() {
        //    [2]
        //  [1]  [3 4]
        let mut tree = tree_with(3, &[1, 2, 3, 4]);
        assert_eq!(shape(&tree), vec![vec![vec![2]], vec![vec![1], vec![3, 4]]]);

        assert_eq!(tree.remove(&1), Some((1, 1)));
        tree.validate(3).unwrap();
        assert_eq!(shape(&tree), vec![vec![vec![3]], vec![vec![2], vec![4]]]);
    }

    #[test]
    fn merge_collapses_root() {
        let mut tree = tree_with(3, &[1, 2, 3]);
        assert_eq!(tree.remove(&3), Some((3, 3)));
        tree.validate(3).unwrap();
        assert_eq!(shape(&tree), vec![vec![vec![1, 2]]]);
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn internal_key_prefers_spare_predecessor() {
        //    [3]
        //  [1 2]  [4]
        let mut tree = tree_with(3, &[1, 3, 4, 2]);
        assert_eq!(tree.remove(&3), Some((3, 3)));
        tree.validate(3).unwrap();
        assert_eq!(shape(&tree), vec![vec![vec![2]], vec![vec![1], vec![4]]]);
    }

    #[test]
    fn internal_key_falls_back_to_successor() {
        //    [2]
        //  [1]  [3 4]
        let mut tree = tree_with(3, &[1, 2, 3, 4]);
        assert_eq!(tree.remove(&2), Some((2, 2)));
        tree.validate(3).unwrap();
        assert_eq!(shape(&tree), vec![vec![vec![3]], vec![vec![1], vec![4]]]);
    }

    #[test]
    fn removing_everything_frees_every_node() {
        let keys: Vec<i32> = (0..200).collect();
        let mut tree = tree_with(3, &keys);
        for key in keys.iter().rev() {
            assert_eq!(tree.remove(key), Some((*key, *key)));
            tree.validate(3).unwrap();
        }
        assert!(tree.is_empty());
        assert_eq!(tree.root(), None);
        assert_eq!(tree.node_count(), 0);
        assert_eq!(tree.height(), 0);
    }

    #[test]
    fn remove_absent_key_is_noop() {
        let mut tree = tree_with(3, &[10, 20, 30, 40]);
        let before = shape(&tree);
        assert_eq!(tree.remove(&25), None);
        assert_eq!(shape(&tree), before);
        assert_eq!(RawBTree::<i32, i32>::new(3).remove(&1), None);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert(i32),
        Remove(i32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0i32..1000).prop_map(Op::Insert),
            2 => (0i32..1000).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn tree_matches_model(order in 3usize..9, ops in prop::collection::vec(op_strategy(), 0..500)) {
            let mut tree: RawBTree<i32, i32> = RawBTree::new(order);
            let mut model: BTreeMap<i32, i32> = BTreeMap::new();

            for (step, op) in ops.into_iter().enumerate() {
                let step = step as i32;
                match op {
                    Op::Insert(key) => {
                        let inserted = tree.insert(key, step, DuplicatePolicy::Ignore) == Insertion::Inserted;
                        prop_assert_eq!(inserted, !model.contains_key(&key));
                        model.entry(key).or_insert(step);
                    }
                    Op::Remove(key) => {
                        prop_assert_eq!(tree.remove(&key), model.remove_entry(&key));
                    }
                }
                prop_assert_eq!(tree.validate(order), Ok(()));
                prop_assert_eq!(tree.len(), model.len());
            }

            for (key, value) in &model {
                prop_assert_eq!(tree.get(key), Some(value));
            }
        }
    }
}
