use core::borrow::Borrow;
use core::fmt;

use log::debug;

use crate::error::{InvariantViolation, Result};
use crate::raw::RawBTree;

pub(crate) mod config;
mod traverse;

pub use config::{Config, DEFAULT_ORDER, DuplicatePolicy, MIN_ORDER};
pub use traverse::{NodeView, Traverse};

/// An ordered dictionary stored in a B-tree of configurable order.
///
/// A tree of order `m` keeps at most `m - 1` entries and `m` children in each
/// node, and every node other than the root at least `ceil(m / 2) - 1`
/// entries. Entries live in internal nodes as well as leaves, and all leaves
/// sit at the same depth, so lookups, inserts and removals touch
/// O(log<sub>m</sub> n) nodes.
///
/// Inserting a key that is already present follows the tree's
/// [`DuplicatePolicy`]; by default the stored entry is kept.
///
/// # Examples
///
/// ```
/// use lab_btree::BTree;
///
/// let mut tree = BTree::new(3)?;
/// for (key, value) in [(1, 5), (4, 7), (5, 43), (-43, 3), (99, 2), (23, 7)] {
///     tree.insert(key, value);
/// }
///
/// assert_eq!(tree.find(&5), Some(&43));
/// assert_eq!(tree.find(&-1), None);
/// assert!(tree.is_valid(3));
///
/// assert_eq!(tree.remove(&4), Some(7));
/// assert_eq!(tree.find(&4), None);
/// assert_eq!(tree.len(), 5);
/// # Ok::<(), lab_btree::Error>(())
/// ```
pub struct BTree<K, V> {
    raw: RawBTree<K, V>,
    config: Config,
}

/// Outcome of [`BTree::insert`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Insertion<V> {
    /// The key was new and the entry was added.
    Inserted,
    /// The key was present and [`DuplicatePolicy::Ignore`] applied; holds the
    /// value that was offered and not stored.
    Ignored(V),
    /// The key was present and [`DuplicatePolicy::Replace`] applied; holds the
    /// value that was overwritten.
    Replaced(V),
}

impl<V> Insertion<V> {
    /// Returns true if a new entry was added.
    #[must_use]
    pub fn is_inserted(&self) -> bool {
        matches!(self, Insertion::Inserted)
    }
}

impl<K, V> BTree<K, V> {
    /// Creates an empty tree of the given order that ignores duplicate inserts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOrder`](crate::Error::InvalidOrder) if `order` is
    /// below [`MIN_ORDER`].
    ///
    /// # Examples
    ///
    /// ```
    /// use lab_btree::{BTree, Error};
    ///
    /// assert!(BTree::<i32, i32>::new(3).is_ok());
    /// assert_eq!(BTree::<i32, i32>::new(2).err(), Some(Error::InvalidOrder(2)));
    /// ```
    pub fn new(order: usize) -> Result<Self> {
        Ok(Self::with_config(Config::new(order)?))
    }

    /// Creates an empty tree from a validated [`Config`].
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        BTree {
            raw: RawBTree::new(config.order()),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the order: the maximum number of children of a node.
    #[must_use]
    pub fn order(&self) -> usize {
        self.raw.order()
    }

    /// Returns the number of entries in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns the number of levels, zero for an empty tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use lab_btree::BTree;
    ///
    /// let mut tree = BTree::new(3)?;
    /// assert_eq!(tree.height(), 0);
    /// tree.extend([(1, ()), (2, ())]);
    /// assert_eq!(tree.height(), 1);
    /// tree.insert(3, ());
    /// assert_eq!(tree.height(), 2);
    /// # Ok::<(), lab_btree::Error>(())
    /// ```
    #[must_use]
    pub fn height(&self) -> usize {
        self.raw.height()
    }

    /// Removes every entry, keeping the configuration.
    pub fn clear(&mut self) {
        debug!("clearing tree of {} entries", self.raw.len());
        self.raw.clear();
    }

    /// Walks the nodes in level order for printing or inspection.
    ///
    /// The walk borrows the tree and never changes it; call `traverse` again to
    /// start over.
    ///
    /// # Examples
    ///
    /// ```
    /// use lab_btree::BTree;
    ///
    /// let tree: BTree<i32, char> = [(5, 'a'), (8, 'b'), (12, 'c')].into_iter().collect();
    /// let levels: Vec<(usize, Vec<i32>)> = tree.traverse().map(|node| (node.depth(), node.keys().to_vec())).collect();
    /// assert_eq!(levels, vec![(0, vec![5, 8, 12])]);
    /// ```
    #[must_use]
    pub fn traverse(&self) -> Traverse<'_, K, V> {
        Traverse::new(&self.raw)
    }
}

impl<K: Ord, V> BTree<K, V> {
    /// Returns a reference to the value stored under `key`.
    ///
    /// The key may be any borrowed form of the tree's key type, but the ordering
    /// on the borrowed form *must* match the ordering on the key type.
    ///
    /// # Examples
    ///
    /// ```
    /// use lab_btree::BTree;
    ///
    /// let mut tree = BTree::new(4)?;
    /// tree.insert(String::from("a"), 1);
    /// assert_eq!(tree.find("a"), Some(&1));
    /// assert_eq!(tree.find("b"), None);
    /// # Ok::<(), lab_btree::Error>(())
    /// ```
    pub fn find<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get(key)
    }

    /// Returns a mutable reference to the value stored under `key`.
    pub fn find_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get_mut(key)
    }

    /// Returns true if the tree holds `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.search(key).is_some()
    }

    /// Inserts an entry.
    ///
    /// If the key is already present the tree's [`DuplicatePolicy`] decides
    /// whether the stored value is kept or overwritten; the structure is left
    /// unchanged either way.
    ///
    /// # Examples
    ///
    /// ```
    /// use lab_btree::{BTree, Config, DuplicatePolicy, Insertion};
    ///
    /// let mut tree = BTree::new(3)?;
    /// assert_eq!(tree.insert(1, "a"), Insertion::Inserted);
    /// assert_eq!(tree.insert(1, "b"), Insertion::Ignored("b"));
    /// assert_eq!(tree.find(&1), Some(&"a"));
    ///
    /// let mut tree = BTree::with_config(Config::new(3)?.with_duplicates(DuplicatePolicy::Replace));
    /// tree.insert(1, "a");
    /// assert_eq!(tree.insert(1, "b"), Insertion::Replaced("a"));
    /// assert_eq!(tree.find(&1), Some(&"b"));
    /// # Ok::<(), lab_btree::Error>(())
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Insertion<V> {
        self.raw.insert(key, value, self.config.duplicates())
    }

    /// Removes `key`, returning its value. Does nothing if the key is absent.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.remove(key).map(|(_, value)| value)
    }

    /// Removes `key`, returning the stored key and value.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.remove(key)
    }

    /// Returns true if the tree satisfies every B-tree invariant for a tree of
    /// the given order.
    ///
    /// Checks sorted keys, child counts, separator ordering, occupancy bounds,
    /// equal leaf depth and parent links. An empty tree is always valid.
    #[must_use]
    pub fn is_valid(&self, order: usize) -> bool {
        order >= MIN_ORDER && self.raw.validate(order).is_ok()
    }

    /// Checks the tree against its own order, naming the first broken invariant.
    ///
    /// # Errors
    ///
    /// Returns the [`InvariantViolation`] found, which indicates a bug in the
    /// tree.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        self.raw.validate(self.raw.order())
    }
}

impl<K: Clone, V: Clone> Clone for BTree<K, V> {
    fn clone(&self) -> Self {
        BTree {
            raw: self.raw.clone(),
            config: self.config,
        }
    }
}

impl<K, V> Default for BTree<K, V> {
    /// Creates an empty tree of order [`DEFAULT_ORDER`].
    fn default() -> Self {
        Self::with_config(Config::default())
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for BTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BTree")
            .field("config", &self.config)
            .field("len", &self.len())
            .field("nodes", &self.traverse())
            .finish()
    }
}

impl<K: Ord, V> Extend<(K, V)> for BTree<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for BTree<K, V> {
    /// Builds a tree of order [`DEFAULT_ORDER`].
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = BTree::default();
        tree.extend(iter);
        tree
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::format;
    use alloc::string::String;
    use alloc::vec::Vec;

    #[test]
    fn remove_on_empty_tree_is_noop() {
        let mut tree: BTree<i32, i32> = BTree::new(3).unwrap();
        assert_eq!(tree.remove(&1), None);
        assert!(tree.is_empty());
        assert!(tree.is_valid(3));
    }

    #[test]
    fn is_valid_rejects_orders_below_minimum() {
        let tree: BTree<i32, i32> = BTree::new(3).unwrap();
        assert!(!tree.is_valid(2));
        assert!(!tree.is_valid(0));
    }

    #[test]
    fn clear_keeps_configuration() {
        let config = Config::new(5).unwrap().with_duplicates(DuplicatePolicy::Replace);
        let mut tree = BTree::with_config(config);
        tree.extend((0..100).map(|key| (key, key)));
        tree.clear();

        assert!(tree.is_empty());
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.config(), &config);
        assert_eq!(tree.validate(), Ok(()));

        tree.insert(1, 1);
        assert_eq!(tree.insert(1, 2), Insertion::Replaced(1));
    }

    #[test]
    fn clone_is_independent() {
        let mut tree: BTree<i32, String> = BTree::new(3).unwrap();
        tree.extend((0..20).map(|key| (key, format!("v{key}"))));
        let snapshot = tree.clone();

        for key in 0..10 {
            tree.remove(&key);
        }
        *tree.find_mut(&15).unwrap() = String::from("changed");

        assert_eq!(snapshot.len(), 20);
        assert_eq!(snapshot.find(&3).map(String::as_str), Some("v3"));
        assert_eq!(snapshot.find(&15).map(String::as_str), Some("v15"));
        assert_eq!(tree.find(&15).map(String::as_str), Some("changed"));
        assert_eq!(snapshot.validate(), Ok(()));
        assert_eq!(tree.validate(), Ok(()));
    }

    #[test]
    fn remove_entry_returns_stored_key() {
        let mut tree: BTree<String, u8> = BTree::new(4).unwrap();
        tree.insert(String::from("k"), 1);
        assert_eq!(tree.remove_entry("k"), Some((String::from("k"), 1)));
        assert!(!tree.contains_key("k"));
    }

    #[test]
    fn debug_lists_nodes() {
        let tree: BTree<i32, i32> = [(2, 20), (1, 10)].into_iter().collect();
        let rendered = format!("{tree:?}");
        assert!(rendered.starts_with("BTree { config: Config { order: 64"));
        assert!(rendered.contains("keys: [1, 2], values: [10, 20]"));
        let keys: Vec<i32> = tree.traverse().flat_map(|node| node.keys().to_vec()).collect();
        assert_eq!(keys, [1, 2]);
    }
}
