//! Full rebuild of the encoding from parent pointers
//!
//! Depth-first: node entered with cursor c gets left = c, children are
//! numbered from c + 1 one after another, right = last child right + 1
//! (or c + 1 for a leaf). Writes happen post-order, once the subtree is known.

use std::collections::HashSet;

use tracing::debug;

use super::{Interval, Node, NodeId};
use crate::store::{Field, FieldUpdate, FindOptions, NodeStore, Predicate, Sort};
use crate::TreeError;

/// Rebuilds left/right (and depth) for a subtree.
#[derive(Debug)]
pub struct TreeBuilder<'s, S: NodeStore> {
    store: &'s mut S,

    /// Write `depth` alongside the bounds
    maintain_depth: bool,

    /// Nodes entered during the current rebuild (cycle guard)
    visited: HashSet<NodeId>,

    /// Records persisted during the current rebuild
    written: usize,
}

impl<'s, S: NodeStore> TreeBuilder<'s, S> {
    /// Create a builder writing through `store`.
    pub fn new(store: &'s mut S, maintain_depth: bool) -> Self {
        Self {
            store,
            maintain_depth,
            visited: HashSet::new(),
            written: 0,
        }
    }

    /// Number of records written so far.
    pub fn nodes_written(&self) -> usize {
        self.written
    }

    /// Encode `root` and every descendant, numbering from `start_left`.
    ///
    /// On failure the subtree may be partially encoded; run the rebuild
    /// again to repair it.
    pub fn rebuild(&mut self, root: &Node, start_left: i64) -> Result<Interval, TreeError> {
        debug!(root = %root.id, start_left, "rebuilding subtree");
        self.visited.clear();
        self.written = 0;

        let depth = if self.maintain_depth {
            Some(self.depth_of(root)?)
        } else {
            None
        };

        let interval = self.visit(root, start_left, depth)?;
        debug!(
            root = %root.id,
            %interval,
            nodes = self.written,
            "subtree rebuilt"
        );
        Ok(interval)
    }

    fn visit(&mut self, node: &Node, cursor: i64, depth: Option<u32>) -> Result<Interval, TreeError> {
        if !self.visited.insert(node.id.clone()) {
            return Err(TreeError::InconsistentTree(format!(
                "node {} reached twice while rebuilding (parent cycle)",
                node.id
            )));
        }

        let children = self.children_of(node)?;
        let child_depth = depth.map(|d| d + 1);

        let mut right = cursor + 1;
        for child in &children {
            let child_interval = self.visit(child, right, child_depth)?;
            right = child_interval.right + 1;
        }

        let interval = Interval::new(cursor, right);
        let update = FieldUpdate::interval(interval).with_depth(depth);
        self.store
            .persist(&node.id, &update)
            .map_err(TreeError::persist("persist"))?;
        self.written += 1;
        Ok(interval)
    }

    /// Children in a stable order: already-encoded ones by current left,
    /// then the rest in store order (insertion order for most stores).
    fn children_of(&self, node: &Node) -> Result<Vec<Node>, TreeError> {
        let predicate = Predicate::all()
            .parent(Some(&node.id))
            .group(node.group.as_ref());
        let options = FindOptions {
            sort: Some(Sort::ascending(Field::Left)),
            ..FindOptions::default()
        };
        self.store
            .find(&predicate, &options)
            .map_err(TreeError::store("find children"))
    }

    /// Distance from `node` to the root of its forest.
    fn depth_of(&self, node: &Node) -> Result<u32, TreeError> {
        let mut depth = 0;
        let mut seen = HashSet::from([node.id.clone()]);
        let mut parent_id = node.parent_id.clone();

        while let Some(id) = parent_id {
            if !seen.insert(id.clone()) {
                return Err(TreeError::InconsistentTree(format!(
                    "parent chain of {} loops through {}",
                    node.id, id
                )));
            }
            let parent = self
                .store
                .get(&id)
                .map_err(TreeError::store("get parent"))?
                .ok_or(TreeError::NotFound(id))?;
            if let Some(parent_depth) = parent.depth {
                return Ok(parent_depth + depth + 1);
            }
            depth += 1;
            parent_id = parent.parent_id;
        }

        Ok(depth)
    }
}
