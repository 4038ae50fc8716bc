//! Tree queries over encoded records
//!
//! Every relational query is a single store lookup: containment of
//! intervals for ancestors/descendants, parent pointers for
//! children/siblings. Unencoded records yield empty interval-based results.

mod options;

pub use options::QueryOptions;

use crate::store::{Field, NodeStore, Predicate};
use crate::tree::Node;
use crate::TreeError;

/// Node has no descendants (`right - left == 1`). Unencoded nodes are not leaves.
pub fn is_leaf(node: &Node) -> bool {
    node.interval().is_some_and(|i| i.is_leaf())
}

/// Node has a parent.
pub fn is_child(node: &Node) -> bool {
    node.parent_id.is_some()
}

/// `node` lies strictly inside `other`.
pub fn is_descendant_of(node: &Node, other: &Node) -> bool {
    match (node.interval(), other.interval()) {
        (Some(n), Some(o)) => node.group == other.group && o.left < n.left && n.left < o.right,
        _ => false,
    }
}

/// `other` lies strictly inside `node`.
pub fn is_ancestor_of(node: &Node, other: &Node) -> bool {
    is_descendant_of(other, node)
}

/// Store-backed relational queries.
#[derive(Debug)]
pub struct QueryEngine<'s, S: NodeStore> {
    store: &'s S,
}

impl<'s, S: NodeStore> QueryEngine<'s, S> {
    /// Query through `store`.
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    fn run(&self, base: Predicate, options: &QueryOptions) -> Result<Vec<Node>, TreeError> {
        self.store
            .find(&options.predicate(base), &options.find_options())
            .map_err(TreeError::store("find"))
    }

    /// Parent record; `None` for roots.
    pub fn parent(&self, node: &Node) -> Result<Option<Node>, TreeError> {
        let Some(parent_id) = &node.parent_id else {
            return Ok(None);
        };
        self.store
            .get(parent_id)
            .map_err(TreeError::store("get parent"))?
            .map(Some)
            .ok_or_else(|| TreeError::NotFound(parent_id.clone()))
    }

    /// `left <= node.left AND right >= node.right` in the same group.
    pub fn self_and_ancestors(
        &self,
        node: &Node,
        options: &QueryOptions,
    ) -> Result<Vec<Node>, TreeError> {
        let Some(interval) = node.interval() else {
            return Ok(Vec::new());
        };
        let base = Predicate::all()
            .group(node.group.as_ref())
            .lte(Field::Left, interval.left)
            .gte(Field::Right, interval.right);
        self.run(base, options)
    }

    /// Ancestors, self excluded.
    pub fn ancestors(&self, node: &Node, options: &QueryOptions) -> Result<Vec<Node>, TreeError> {
        let Some(interval) = node.interval() else {
            return Ok(Vec::new());
        };
        let base = Predicate::all()
            .group(node.group.as_ref())
            .lte(Field::Left, interval.left)
            .gte(Field::Right, interval.right)
            .exclude(&node.id);
        self.run(base, options)
    }

    /// Direct children by parent pointer.
    pub fn children(&self, node: &Node, options: &QueryOptions) -> Result<Vec<Node>, TreeError> {
        let base = Predicate::all()
            .parent(Some(&node.id))
            .group(node.group.as_ref());
        self.run(base, options)
    }

    /// The node and its direct children, as one query.
    pub fn self_and_children(
        &self,
        node: &Node,
        options: &QueryOptions,
    ) -> Result<Vec<Node>, TreeError> {
        let base = Predicate::all().group(node.group.as_ref()).any_of([
            Predicate::all().id(&node.id),
            Predicate::all().parent(Some(&node.id)),
        ]);
        self.run(base, options)
    }

    /// `left >= node.left AND right <= node.right` in the same group.
    pub fn self_and_descendants(
        &self,
        node: &Node,
        options: &QueryOptions,
    ) -> Result<Vec<Node>, TreeError> {
        let Some(interval) = node.interval() else {
            return Ok(Vec::new());
        };
        let base = Predicate::all()
            .group(node.group.as_ref())
            .gte(Field::Left, interval.left)
            .lte(Field::Right, interval.right);
        self.run(base, options)
    }

    /// Descendants, self excluded.
    pub fn descendants(&self, node: &Node, options: &QueryOptions) -> Result<Vec<Node>, TreeError> {
        let Some(interval) = node.interval() else {
            return Ok(Vec::new());
        };
        let base = Predicate::all()
            .group(node.group.as_ref())
            .gte(Field::Left, interval.left)
            .lte(Field::Right, interval.right)
            .exclude(&node.id);
        self.run(base, options)
    }

    /// Records sharing the node's parent, the node included.
    pub fn self_and_siblings(
        &self,
        node: &Node,
        options: &QueryOptions,
    ) -> Result<Vec<Node>, TreeError> {
        let base = Predicate::all()
            .parent(node.parent_id.as_ref())
            .group(node.group.as_ref());
        self.run(base, options)
    }

    /// Records sharing the node's parent.
    pub fn siblings(&self, node: &Node, options: &QueryOptions) -> Result<Vec<Node>, TreeError> {
        let base = Predicate::all()
            .parent(node.parent_id.as_ref())
            .group(node.group.as_ref())
            .exclude(&node.id);
        self.run(base, options)
    }

    /// Distance from the root (root = 0).
    ///
    /// Uses the maintained `depth` when present, otherwise counts ancestors.
    /// `None` for an unencoded node.
    pub fn level(&self, node: &Node) -> Result<Option<u32>, TreeError> {
        if let Some(depth) = node.depth {
            return Ok(Some(depth));
        }
        if !node.is_encoded() {
            return Ok(None);
        }
        let ancestors = self.ancestors(node, &QueryOptions::default())?;
        Ok(Some(u32::try_from(ancestors.len()).unwrap_or(u32::MAX)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Interval;

    fn encoded(mut node: Node, left: i64, right: i64) -> Node {
        node.set_interval(Interval::new(left, right));
        node
    }

    #[test]
    fn test_pure_predicates() {
        let root = encoded(Node::root("michael"), 1, 20);
        let kelly = encoded(Node::child("kelly", "meredith"), 3, 4);
        let loose = Node::child("joe", "michael");

        assert!(is_leaf(&kelly));
        assert!(!is_leaf(&root));
        assert!(!is_leaf(&loose));

        assert!(is_child(&kelly));
        assert!(!is_child(&root));

        assert!(is_descendant_of(&kelly, &root));
        assert!(!is_descendant_of(&root, &kelly));
        assert!(!is_descendant_of(&root, &root));
        assert!(is_ancestor_of(&root, &kelly));
        assert!(!is_ancestor_of(&kelly, &root));

        assert!(!is_descendant_of(&loose, &root));
    }

    #[test]
    fn test_groups_do_not_nest() {
        let a = encoded(Node::root("a").in_group("A"), 1, 20);
        let b = encoded(Node::child("b", "x").in_group("B"), 3, 4);
        assert!(!is_descendant_of(&b, &a));
    }
}
