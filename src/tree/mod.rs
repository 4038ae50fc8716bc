//! Nested-set encoded tree
//!
//! Each record carries an interval [left, right]; containment of intervals
//! mirrors ancestry, so tree queries become range comparisons.
//!
//! Two writers keep the encoding in shape:
//! - [`TreeBuilder`] renumbers a whole subtree from parent pointers
//! - [`IntervalMaintainer`] patches it for single-leaf inserts/removes

mod builder;
mod interval;
pub mod invariants;
mod maintainer;
mod node;
pub mod snapshot;

pub use builder::TreeBuilder;
pub use interval::Interval;
pub use invariants::Violation;
pub use maintainer::{InsertOutcome, IntervalMaintainer, RemoveOutcome, SkipReason};
pub use node::{Group, Node, NodeId};
pub use snapshot::EncodingSnapshot;
