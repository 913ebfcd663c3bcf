use super::node_id::NodeId;
use super::raw_btree::RawBTree;
use crate::btree::config::min_keys;
use crate::error::InvariantViolation;

/// State threaded through the recursive check.
struct Walk {
    order: usize,
    leaf_depth: Option<usize>,
    entries: usize,
    nodes: usize,
}

impl<K: Ord, V> RawBTree<K, V> {
    /// Checks every structural invariant against `order`, stopping at the first
    /// violation.
    pub(crate) fn validate(&self, order: usize) -> Result<(), InvariantViolation> {
        let Some(root) = self.root() else {
            if self.len() != 0 {
                return Err(InvariantViolation::Length {
                    recorded: self.len(),
                    actual: 0,
                });
            }
            return self.check_reachable(0);
        };

        if self.node(root).parent().is_some() {
            return Err(InvariantViolation::ParentLink { depth: 0 });
        }

        let mut walk = Walk {
            order,
            leaf_depth: None,
            entries: 0,
            nodes: 0,
        };
        self.validate_node(root, 0, None, None, &mut walk)?;

        if walk.entries != self.len() {
            return Err(InvariantViolation::Length {
                recorded: self.len(),
                actual: walk.entries,
            });
        }
        self.check_reachable(walk.nodes)
    }

    fn check_reachable(&self, reachable: usize) -> Result<(), InvariantViolation> {
        let live = self.node_count();
        if live == reachable {
            Ok(())
        } else {
            Err(InvariantViolation::Unreachable { live, reachable })
        }
    }

    /// Validates the subtree at `id`, whose keys must lie strictly between
    /// `lower` and `upper` when those are set.
    fn validate_node(
        &self,
        id: NodeId,
        depth: usize,
        lower: Option<&K>,
        upper: Option<&K>,
        walk: &mut Walk,
    ) -> Result<(), InvariantViolation> {
        let node = self.node(id);
        let keys = node.keys();
        walk.nodes += 1;
        walk.entries += keys.len();

        if keys.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(InvariantViolation::UnsortedKeys { depth });
        }

        // The root alone may drop below the minimum.
        let min = if depth == 0 { 0 } else { min_keys(walk.order) };
        let max = walk.order - 1;
        if keys.len() < min || keys.len() > max {
            return Err(InvariantViolation::Occupancy {
                depth,
                keys: keys.len(),
                min,
                max,
            });
        }

        let below_lower = lower.is_some_and(|bound| keys.first().is_some_and(|first| first <= bound));
        let above_upper = upper.is_some_and(|bound| keys.last().is_some_and(|last| last >= bound));
        if below_lower || above_upper {
            return Err(InvariantViolation::SeparatorOrder { depth });
        }

        if node.is_leaf() {
            match walk.leaf_depth {
                None => walk.leaf_depth = Some(depth),
                Some(expected) if expected != depth => {
                    return Err(InvariantViolation::LeafDepth { depth, expected });
                }
                Some(_) => {}
            }
            return Ok(());
        }

        if node.child_count() != keys.len() + 1 {
            return Err(InvariantViolation::ChildCount {
                depth,
                keys: keys.len(),
                children: node.child_count(),
            });
        }

        for (index, &child) in node.children().iter().enumerate() {
            if self.node(child).parent() != Some(id) {
                return Err(InvariantViolation::ParentLink { depth: depth + 1 });
            }
            let child_lower = if index == 0 { lower } else { keys.get(index - 1) };
            let child_upper = keys.get(index).or(upper);
            self.validate_node(child, depth + 1, child_lower, child_upper, walk)?;
        }

        Ok(())
    }
}
