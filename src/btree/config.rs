use crate::error::{Error, Result};

/// Smallest order a tree accepts. At order 3 every non-root node holds one or
/// two entries.
pub const MIN_ORDER: usize = 3;

/// Order used by [`Config::default`].
pub const DEFAULT_ORDER: usize = 64;

/// What [`BTree::insert`](crate::BTree::insert) does with a key that is already
/// present.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum DuplicatePolicy {
    /// Keep the stored entry and hand the new value back.
    #[default]
    Ignore,
    /// Overwrite the stored value and hand the old one back.
    Replace,
}

/// Construction parameters for a [`BTree`](crate::BTree).
///
/// # Examples
///
/// ```
/// use lab_btree::{BTree, Config, DuplicatePolicy};
///
/// let config = Config::new(5)?.with_duplicates(DuplicatePolicy::Replace);
/// assert_eq!(config.max_keys(), 4);
/// assert_eq!(config.min_keys(), 2);
///
/// let tree: BTree<u32, &str> = BTree::with_config(config);
/// assert_eq!(tree.order(), 5);
/// # Ok::<(), lab_btree::Error>(())
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Config {
    order: usize,
    duplicates: DuplicatePolicy,
}

impl Config {
    /// Creates a configuration for a tree of the given order (maximum number of
    /// children per node), ignoring duplicate inserts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOrder`] if `order` is below [`MIN_ORDER`].
    pub const fn new(order: usize) -> Result<Self> {
        if order < MIN_ORDER {
            return Err(Error::InvalidOrder(order));
        }
        Ok(Self {
            order,
            duplicates: DuplicatePolicy::Ignore,
        })
    }

    #[must_use]
    pub const fn with_duplicates(mut self, duplicates: DuplicatePolicy) -> Self {
        self.duplicates = duplicates;
        self
    }

    #[must_use]
    pub const fn order(&self) -> usize {
        self.order
    }

    #[must_use]
    pub const fn duplicates(&self) -> DuplicatePolicy {
        self.duplicates
    }

    /// Most entries any node may hold.
    #[must_use]
    pub const fn max_keys(&self) -> usize {
        self.order - 1
    }

    /// Fewest entries a non-root node may hold: `ceil(order / 2) - 1`.
    #[must_use]
    pub const fn min_keys(&self) -> usize {
        min_keys(self.order)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            order: DEFAULT_ORDER,
            duplicates: DuplicatePolicy::Ignore,
        }
    }
}

pub(crate) const fn min_keys(order: usize) -> usize {
    order.div_ceil(2) - 1
}
