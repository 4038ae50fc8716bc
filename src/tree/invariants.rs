//! Structural checks over an encoded forest
//!
//! For every encoded node n whose children c1..ck are all encoded:
//!   n.left < n.right
//!   leaf ⇔ n.right - n.left == 1
//!   n.left < c1.left, ci.right < c(i+1).left, ck.right < n.right
//!   n.right == ck.right + 1 (n.left + 1 without children)
//!   depth(c) == depth(n) + 1, depth(root) == 0 (when depths are present)
//!
//! Nodes with an unencoded child are pending a rebuild and are not checked.

use std::collections::HashMap;

use thiserror::Error;

use super::{Group, Node, NodeId};

/// Records keyed by (group, id); parent pointers never cross groups.
type Index<'a, T> = HashMap<(&'a Option<Group>, &'a NodeId), T>;

/// One broken invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    /// `left >= right`.
    #[error("{id}: left {left} is not below right {right}")]
    Malformed {
        /// Offending node.
        id: NodeId,
        /// Its left.
        left: i64,
        /// Its right.
        right: i64,
    },

    /// Width disagrees with having children.
    #[error("{id}: width {width} but {children} children")]
    LeafMismatch {
        /// Offending node.
        id: NodeId,
        /// `right - left`.
        width: i64,
        /// Number of children.
        children: usize,
    },

    /// Child interval escapes the parent or overlaps the previous sibling.
    #[error("{child} is misplaced under {parent}")]
    Misplaced {
        /// Parent node.
        parent: NodeId,
        /// Child node.
        child: NodeId,
    },

    /// `right != last child right + 1`.
    #[error("{id}: right {right} should be {expected}")]
    LooseRight {
        /// Offending node.
        id: NodeId,
        /// Stored right.
        right: i64,
        /// Right implied by the children.
        expected: i64,
    },

    /// Depth does not follow the parent.
    #[error("{id}: depth {depth} should be {expected}")]
    Depth {
        /// Offending node.
        id: NodeId,
        /// Stored depth.
        depth: u32,
        /// Depth implied by the parent.
        expected: u32,
    },
}

/// Collect every violation among `nodes`.
///
/// Children are matched by parent pointer within the same group.
pub fn check(nodes: &[Node]) -> Vec<Violation> {
    let mut by_id: Index<'_, &Node> = HashMap::new();
    let mut children: Index<'_, Vec<&Node>> = HashMap::new();
    for node in nodes {
        by_id.insert((&node.group, &node.id), node);
        if let Some(parent) = &node.parent_id {
            children.entry((&node.group, parent)).or_default().push(node);
        }
    }

    let mut violations = Vec::new();
    for node in nodes {
        let Some(interval) = node.interval() else {
            continue;
        };
        if !interval.is_valid() {
            violations.push(Violation::Malformed {
                id: node.id.clone(),
                left: interval.left,
                right: interval.right,
            });
            continue;
        }

        check_depth(node, &by_id, &mut violations);

        let kids = children
            .get(&(&node.group, &node.id))
            .map(Vec::as_slice)
            .unwrap_or_default();
        let mut encoded: Vec<_> = Vec::with_capacity(kids.len());
        for kid in kids {
            match kid.interval() {
                Some(i) => encoded.push((kid, i)),
                None => break,
            }
        }
        if encoded.len() != kids.len() {
            continue;
        }
        encoded.sort_by(|(a, ai), (b, bi)| ai.left.cmp(&bi.left).then_with(|| a.id.cmp(&b.id)));

        if interval.is_leaf() != encoded.is_empty() {
            violations.push(Violation::LeafMismatch {
                id: node.id.clone(),
                width: interval.width(),
                children: encoded.len(),
            });
        }

        let mut floor = interval.left;
        for (kid, kid_interval) in &encoded {
            if kid_interval.left <= floor || kid_interval.right >= interval.right {
                violations.push(Violation::Misplaced {
                    parent: node.id.clone(),
                    child: kid.id.clone(),
                });
            }
            floor = kid_interval.right;
        }

        let expected = encoded
            .last()
            .map_or(interval.left + 1, |(_, i)| i.right + 1);
        if interval.right != expected {
            violations.push(Violation::LooseRight {
                id: node.id.clone(),
                right: interval.right,
                expected,
            });
        }
    }
    violations
}

fn check_depth(
    node: &Node,
    by_id: &Index<'_, &Node>,
    violations: &mut Vec<Violation>,
) {
    let Some(depth) = node.depth else {
        return;
    };
    let expected = match &node.parent_id {
        None => Some(0),
        Some(parent) => by_id
            .get(&(&node.group, parent))
            .and_then(|p| p.depth)
            .map(|d| d + 1),
    };
    if let Some(expected) = expected {
        if depth != expected {
            violations.push(Violation::Depth {
                id: node.id.clone(),
                depth,
                expected,
            });
        }
    }
}
