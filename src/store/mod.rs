//! Record store contract
//!
//! The encoding algorithms never touch storage directly: they go through
//! [`NodeStore`], an explicit handle passed in by the host. The store is
//! expected to index `parent_id`, `left`, `right` and `group`.

mod memory;
mod predicate;

pub use memory::MemoryStore;
pub use predicate::{
    Comparison, Condition, Field, FieldUpdate, FindOptions, Predicate, Sort, SortOrder,
};

use thiserror::Error;

use crate::tree::{Node, NodeId};

/// Errors reported by a store backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend-specific failure (I/O, connection, rejected write).
    #[error("store backend failure: {0}")]
    Backend(String),

    /// Write addressed a record that does not exist.
    #[error("no record with id {0}")]
    UnknownNode(NodeId),

    /// Insert collided with an existing record.
    #[error("record {0} already exists")]
    DuplicateId(NodeId),
}

impl StoreError {
    /// Helper for constructing backend failures.
    pub fn backend(msg: impl Into<String>) -> Self {
        StoreError::Backend(msg.into())
    }
}

/// Document/table store holding tree records.
///
/// Concurrency and atomicity are the backend's business; callers serialize
/// mutations per group.
pub trait NodeStore {
    /// Fetch one record; `Ok(None)` when absent.
    fn get(&self, id: &NodeId) -> Result<Option<Node>, StoreError>;

    /// Fetch every record matching `predicate`, shaped by `options`.
    fn find(&self, predicate: &Predicate, options: &FindOptions) -> Result<Vec<Node>, StoreError>;

    /// Add `delta` to `field` on every matching record that has the field set.
    ///
    /// Returns the number of records changed.
    fn bulk_increment(
        &mut self,
        predicate: &Predicate,
        field: Field,
        delta: i64,
    ) -> Result<usize, StoreError>;

    /// Write encoding fields of a single record.
    fn persist(&mut self, id: &NodeId, update: &FieldUpdate) -> Result<(), StoreError>;

    /// Create a record.
    fn insert(&mut self, node: Node) -> Result<(), StoreError>;

    /// Delete a record; `Ok(false)` when it did not exist.
    fn delete(&mut self, id: &NodeId) -> Result<bool, StoreError>;
}
