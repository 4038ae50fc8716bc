//! # Nested-set intervals over a flat record store
//!
//! Hierarchical records (org charts, category trees, comment threads) kept in
//! a flat collection get an interval `[left, right]` each, so that tree
//! queries become range comparisons instead of recursive parent walks.
//!
//! ## Core Algorithm
//!
//! 1. **Rebuild**: depth-first numbering from parent pointers
//! 2. **Insert**: anchor after the rightmost sibling, shift everything right of it by +2
//! 3. **Remove**: shift everything right of the removed leaf by -2
//! 4. **Forests**: shifts never leave the node's `group`
//!
//! Records whose parent or siblings are not encoded are left alone until the
//! next rebuild.
//!
//! ## Usage Example
//!
//! ```
//! use nested_set::{MemoryStore, NestedSet, NestedSetConfig, Node, NodeId};
//! use nested_set::query::QueryOptions;
//!
//! let store = MemoryStore::from_nodes([
//!     Node::root("michael"),
//!     Node::child("meredith", "michael"),
//!     Node::child("kelly", "meredith"),
//! ])?;
//! let mut tree = NestedSet::new(store, NestedSetConfig::default());
//! tree.rebuild_tree(&NodeId::from("michael"), 1)?;
//!
//! tree.insert(Node::child("creed", "meredith"))?;
//! let creed = tree.get(&NodeId::from("creed"))?;
//! let ancestors = tree.query().ancestors(&creed, &QueryOptions::default())?;
//! assert_eq!(ancestors.len(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod query;
pub mod store;
pub mod tree;

pub use store::{MemoryStore, NodeStore, StoreError};
pub use tree::{
    EncodingSnapshot, Group, InsertOutcome, Interval, Node, NodeId, RemoveOutcome, SkipReason,
    Violation,
};

use thiserror::Error;
use tracing::debug;

use query::QueryEngine;
use store::{Predicate, StoreError as BackendError};
use tree::{IntervalMaintainer, TreeBuilder};

/// Errors surfaced by rebuilds, maintenance and queries
#[derive(Error, Debug)]
pub enum TreeError {
    /// Referenced node or parent vanished
    #[error("node {0} not found")]
    NotFound(NodeId),

    /// Underlying fetch/update/persist failed
    #[error("store {op} failed: {source}")]
    Store {
        /// Operation that failed
        op: &'static str,
        /// Backend error
        #[source]
        source: BackendError,
    },

    /// Mixed encoded/unencoded or overlapping state that a prior partial
    /// failure must have left behind
    #[error("inconsistent tree: {0}")]
    InconsistentTree(String),

    /// Left-field shift applied, right-field shift failed
    #[error("forest {} left half-shifted: {source}", forest_label(.group.as_ref()))]
    PartialShift {
        /// Forest that needs a rebuild
        group: Option<Group>,
        /// Backend error from the right-field shift
        #[source]
        source: BackendError,
    },
}

impl TreeError {
    /// Map a failed read or bulk update.
    pub(crate) fn store(op: &'static str) -> impl FnOnce(BackendError) -> TreeError {
        move |source| TreeError::Store { op, source }
    }

    /// Map a failed single-record write; a missing record is `NotFound`.
    pub(crate) fn persist(op: &'static str) -> impl FnOnce(BackendError) -> TreeError {
        move |source| match source {
            BackendError::UnknownNode(id) => TreeError::NotFound(id),
            source => TreeError::Store { op, source },
        }
    }

    /// The encoding may be damaged; run a full rebuild of the forest.
    pub fn requires_rebuild(&self) -> bool {
        !matches!(self, TreeError::NotFound(_))
    }
}

/// Display name of a forest; the global forest has no key.
pub fn forest_label(group: Option<&Group>) -> String {
    match group {
        Some(group) => group.to_string(),
        None => "<global>".to_string(),
    }
}

/// Configuration parameters for encoding maintenance
#[derive(Debug, Clone)]
pub struct NestedSetConfig {
    /// Write `depth` alongside `left`/`right`
    pub maintain_depth: bool,

    /// First `left` handed out by [`NestedSet::rebuild_forest`]
    pub start_left: i64,

    /// Check sibling intervals lie inside the parent before shifting
    pub verify_containment: bool,
}

impl Default for NestedSetConfig {
    fn default() -> Self {
        Self {
            maintain_depth: true,
            start_left: 1,
            verify_containment: true,
        }
    }
}

impl NestedSetConfig {
    /// Enable or disable depth maintenance.
    pub fn with_depth(mut self, enabled: bool) -> Self {
        self.maintain_depth = enabled;
        self
    }

    /// Set the first `left` used for forest rebuilds.
    pub fn with_start_left(mut self, start_left: i64) -> Self {
        self.start_left = start_left;
        self
    }

    /// Enable or disable sibling containment checks.
    pub fn with_containment_checks(mut self, enabled: bool) -> Self {
        self.verify_containment = enabled;
        self
    }
}

/// Nested-set maintenance over an injected store
///
/// Mutating calls take `&mut self`, so one instance is a single writer.
/// Hosts sharing the underlying collection between instances must serialize
/// inserts/removes per group themselves.
#[derive(Debug)]
pub struct NestedSet<S: NodeStore> {
    store: S,
    config: NestedSetConfig,
}

impl<S: NodeStore> NestedSet<S> {
    /// Wrap `store`.
    pub fn new(store: S, config: NestedSetConfig) -> Self {
        Self { store, config }
    }

    /// Active configuration.
    pub fn config(&self) -> &NestedSetConfig {
        &self.config
    }

    /// Borrow the store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Borrow the store mutably (writes bypass maintenance).
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Give the store back.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Fetch a record.
    pub fn get(&self, id: &NodeId) -> Result<Node, TreeError> {
        self.store
            .get(id)
            .map_err(TreeError::store("get"))?
            .ok_or_else(|| TreeError::NotFound(id.clone()))
    }

    /// Query interface over the same store.
    pub fn query(&self) -> QueryEngine<'_, S> {
        QueryEngine::new(&self.store)
    }

    /// Renumber `root` and its whole subtree starting at `start_left`.
    pub fn rebuild_tree(&mut self, root: &NodeId, start_left: i64) -> Result<Interval, TreeError> {
        let root = self.get(root)?;
        TreeBuilder::new(&mut self.store, self.config.maintain_depth).rebuild(&root, start_left)
    }

    /// Rebuild every root of `group` back to back, in store order.
    pub fn rebuild_forest(
        &mut self,
        group: Option<&Group>,
    ) -> Result<Vec<(NodeId, Interval)>, TreeError> {
        let roots = self
            .store
            .find(
                &Predicate::all().parent(None).group(group),
                &store::FindOptions::default(),
            )
            .map_err(TreeError::store("find roots"))?;

        debug!(forest = %forest_label(group), roots = roots.len(), "rebuilding forest");
        let mut builder = TreeBuilder::new(&mut self.store, self.config.maintain_depth);
        let mut cursor = self.config.start_left;
        let mut assigned = Vec::with_capacity(roots.len());
        for root in roots {
            let interval = builder.rebuild(&root, cursor)?;
            cursor = interval.right + 1;
            assigned.push((root.id, interval));
        }
        Ok(assigned)
    }

    /// Encode `node` ahead of its creation; the caller persists it.
    pub fn on_insert(&mut self, node: &mut Node) -> Result<InsertOutcome, TreeError> {
        self.maintainer().insert(node)
    }

    /// Encode and create `node`.
    pub fn insert(&mut self, mut node: Node) -> Result<InsertOutcome, TreeError> {
        if self
            .store
            .get(&node.id)
            .map_err(TreeError::store("get"))?
            .is_some()
        {
            return Err(TreeError::Store {
                op: "insert",
                source: BackendError::DuplicateId(node.id),
            });
        }
        let outcome = self.on_insert(&mut node)?;
        self.store
            .insert(node)
            .map_err(TreeError::store("insert"))?;
        Ok(outcome)
    }

    /// Close the gap `node` is about to leave; the caller deletes it.
    pub fn on_remove(&mut self, node: &Node) -> Result<RemoveOutcome, TreeError> {
        self.maintainer().remove(node)
    }

    /// Close the gap and delete the record.
    pub fn remove(&mut self, id: &NodeId) -> Result<RemoveOutcome, TreeError> {
        let node = self.get(id)?;
        let outcome = self.on_remove(&node)?;
        self.store.delete(id).map_err(TreeError::store("delete"))?;
        Ok(outcome)
    }

    /// Structural violations among the records of `group`.
    pub fn check(&self, group: Option<&Group>) -> Result<Vec<Violation>, TreeError> {
        let nodes = self
            .store
            .find(&Predicate::all().group(group), &store::FindOptions::default())
            .map_err(TreeError::store("find"))?;
        Ok(tree::invariants::check(&nodes))
    }

    /// Capture the encoding of `group`.
    pub fn snapshot(&self, group: Option<&Group>) -> Result<EncodingSnapshot, TreeError> {
        EncodingSnapshot::capture(&self.store, &Predicate::all().group(group))
            .map_err(TreeError::store("find"))
    }

    fn maintainer(&mut self) -> IntervalMaintainer<'_, S> {
        IntervalMaintainer::new(
            &mut self.store,
            self.config.maintain_depth,
            self.config.verify_containment,
        )
    }
}
