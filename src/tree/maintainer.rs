//! Incremental insert/remove of leaves in an encoded tree
//!
//! Insert: anchor = max right among the siblings (parent.left if none),
//! every boundary > anchor moves by +2, new leaf = [anchor + 1, anchor + 2].
//! Remove: every boundary > removed.right moves by -2.
//!
//! Shifts are scoped to the node's group and always run left-field first,
//! right-field second. Records without bounds never match a shift.

use tracing::{debug, error, warn};

use super::{Group, Interval, Node, NodeId};
use crate::store::{Field, FindOptions, NodeStore, Predicate};
use crate::TreeError;

/// Slots occupied by one leaf.
const LEAF_SLOTS: i64 = 2;

/// Why an insert or remove left the encoding alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Node has no parent.
    Root,
    /// Parent lacks left/right.
    ParentUnencoded,
    /// A sibling lacks left/right; only a full rebuild may fix this forest.
    SiblingUnencoded(NodeId),
    /// Removed node was never encoded, so it occupies no slots.
    NodeUnencoded,
}

/// Result of [`IntervalMaintainer::insert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Node received this interval; the tree was shifted to make room.
    Encoded(Interval),
    /// Node stays unencoded.
    Skipped(SkipReason),
}

/// Result of [`IntervalMaintainer::remove`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// Gap closed.
    Closed {
        /// Rightmost boundary among the remaining siblings (parent.left if none).
        anchor: i64,
        /// Records whose left and right moved, respectively.
        shifted: (usize, usize),
    },
    /// Nothing changed.
    Skipped(SkipReason),
}

/// Keeps an encoded forest consistent across single-leaf inserts and removes.
#[derive(Debug)]
pub struct IntervalMaintainer<'s, S: NodeStore> {
    store: &'s mut S,
    maintain_depth: bool,
    verify_containment: bool,
}

impl<'s, S: NodeStore> IntervalMaintainer<'s, S> {
    /// Create a maintainer writing through `store`.
    pub fn new(store: &'s mut S, maintain_depth: bool, verify_containment: bool) -> Self {
        Self {
            store,
            maintain_depth,
            verify_containment,
        }
    }

    /// Make room for `node` and assign its interval (and depth).
    ///
    /// `node` is about to be created: the fields are set on the value, the
    /// caller persists it. Encoding fields the caller filled in are replaced,
    /// or cleared when the insert is skipped.
    pub fn insert(&mut self, node: &mut Node) -> Result<InsertOutcome, TreeError> {
        let Some(parent) = self.parent_of(node)? else {
            node.clear_encoding();
            return Ok(InsertOutcome::Skipped(SkipReason::Root));
        };
        let Some(parent_interval) = parent.interval() else {
            warn!(node = %node.id, parent = %parent.id, "parent unencoded, leaving node for a rebuild");
            node.clear_encoding();
            return Ok(InsertOutcome::Skipped(SkipReason::ParentUnencoded));
        };

        let siblings = self.siblings_of(node)?;
        let anchor = match self.anchor(node, &parent_interval, &siblings)? {
            Ok(anchor) => anchor,
            Err(reason) => {
                node.clear_encoding();
                return Ok(InsertOutcome::Skipped(reason));
            }
        };

        debug!(node = %node.id, anchor, "inserting leaf");
        self.shift(node.group.as_ref(), anchor, LEAF_SLOTS)?;

        let interval = Interval::leaf_after(anchor);
        node.set_interval(interval);
        node.depth = if self.maintain_depth {
            Some(match parent.depth {
                Some(depth) => depth + 1,
                None => self.count_ancestors(node.group.as_ref(), &interval)?,
            })
        } else {
            None
        };
        Ok(InsertOutcome::Encoded(interval))
    }

    /// Close the gap `node` leaves behind. Call before deleting it.
    ///
    /// A node with descendants is still shifted as a two-slot leaf; its
    /// subtree has to be removed or reparented first.
    pub fn remove(&mut self, node: &Node) -> Result<RemoveOutcome, TreeError> {
        let Some(parent) = self.parent_of(node)? else {
            return Ok(RemoveOutcome::Skipped(SkipReason::Root));
        };
        let Some(parent_interval) = parent.interval() else {
            warn!(node = %node.id, parent = %parent.id, "parent unencoded, nothing to close");
            return Ok(RemoveOutcome::Skipped(SkipReason::ParentUnencoded));
        };

        let siblings = self.siblings_of(node)?;
        let anchor = match self.anchor(node, &parent_interval, &siblings)? {
            Ok(anchor) => anchor,
            Err(reason) => return Ok(RemoveOutcome::Skipped(reason)),
        };

        let Some(interval) = node.interval() else {
            return Ok(RemoveOutcome::Skipped(SkipReason::NodeUnencoded));
        };
        if !interval.is_leaf() {
            warn!(
                node = %node.id,
                %interval,
                descendants = interval.descendant_count(),
                "removing a non-leaf; its descendants keep stale intervals until the next rebuild"
            );
        }

        debug!(node = %node.id, anchor, boundary = interval.right, "closing gap");
        let shifted = self.shift(node.group.as_ref(), interval.right, -LEAF_SLOTS)?;
        Ok(RemoveOutcome::Closed { anchor, shifted })
    }

    /// Parent record, `None` for roots. A vanished parent is an error.
    fn parent_of(&self, node: &Node) -> Result<Option<Node>, TreeError> {
        let Some(parent_id) = &node.parent_id else {
            return Ok(None);
        };
        let parent = self
            .store
            .get(parent_id)
            .map_err(TreeError::store("get parent"))?
            .ok_or_else(|| TreeError::NotFound(parent_id.clone()))?;
        if parent.group != node.group {
            return Err(TreeError::InconsistentTree(format!(
                "node {} and its parent {} sit in different groups",
                node.id, parent.id
            )));
        }
        Ok(Some(parent))
    }

    fn siblings_of(&self, node: &Node) -> Result<Vec<Node>, TreeError> {
        let predicate = Predicate::all()
            .parent(node.parent_id.as_ref())
            .group(node.group.as_ref())
            .exclude(&node.id);
        self.store
            .find(&predicate, &FindOptions::default())
            .map_err(TreeError::store("find siblings"))
    }

    /// Rightmost sibling boundary, or the parent's left when there are none.
    ///
    /// The inner `Err` is a skip: some sibling is unencoded.
    fn anchor(
        &self,
        node: &Node,
        parent: &Interval,
        siblings: &[Node],
    ) -> Result<Result<i64, SkipReason>, TreeError> {
        let mut anchor = parent.left;
        for sibling in siblings {
            let Some(interval) = sibling.interval() else {
                warn!(node = %node.id, sibling = %sibling.id, "sibling unencoded, leaving forest for a rebuild");
                return Ok(Err(SkipReason::SiblingUnencoded(sibling.id.clone())));
            };
            if self.verify_containment && !parent.strictly_contains(&interval) {
                return Err(TreeError::InconsistentTree(format!(
                    "sibling {} {} lies outside parent interval {}",
                    sibling.id, interval, parent
                )));
            }
            anchor = anchor.max(interval.right);
        }
        Ok(Ok(anchor))
    }

    /// Move every boundary greater than `boundary` by `delta` within `group`.
    fn shift(
        &mut self,
        group: Option<&Group>,
        boundary: i64,
        delta: i64,
    ) -> Result<(usize, usize), TreeError> {
        let scope = Predicate::all().group(group);

        let lefts = self
            .store
            .bulk_increment(&scope.clone().gt(Field::Left, boundary), Field::Left, delta)
            .map_err(TreeError::store("shift left"))?;

        let rights = self
            .store
            .bulk_increment(&scope.gt(Field::Right, boundary), Field::Right, delta)
            .map_err(|source| {
                error!(
                    group = %crate::forest_label(group),
                    boundary,
                    delta,
                    %source,
                    "right-field shift failed after left-field shift"
                );
                TreeError::PartialShift {
                    group: group.cloned(),
                    source,
                }
            })?;

        debug!(boundary, delta, lefts, rights, "range shift applied");
        Ok((lefts, rights))
    }

    /// Encoded records strictly enclosing `interval`.
    fn count_ancestors(&self, group: Option<&Group>, interval: &Interval) -> Result<u32, TreeError> {
        let predicate = Predicate::all()
            .group(group)
            .lt(Field::Left, interval.left)
            .gt(Field::Right, interval.right);
        let ancestors = self
            .store
            .find(&predicate, &FindOptions::default())
            .map_err(TreeError::store("find ancestors"))?;
        Ok(u32::try_from(ancestors.len()).unwrap_or(u32::MAX))
    }
}
