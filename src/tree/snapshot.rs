//! Point-in-time copy of the encoding fields
//!
//! Used to compare a forest before and after an operation, and to fingerprint
//! an encoding so repeated rebuilds can be checked for determinism.

use std::collections::BTreeMap;

use super::NodeId;
use crate::store::{FindOptions, NodeStore, Predicate, StoreError};

/// Encoding fields of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodedFields {
    /// `left`, if set.
    pub left: Option<i64>,
    /// `right`, if set.
    pub right: Option<i64>,
    /// `depth`, if set.
    pub depth: Option<u32>,
}

/// Encoding fields of every record matching a predicate, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodingSnapshot {
    entries: BTreeMap<NodeId, EncodedFields>,
}

impl EncodingSnapshot {
    /// Capture every record matching `predicate`.
    pub fn capture<S: NodeStore>(store: &S, predicate: &Predicate) -> Result<Self, StoreError> {
        let entries = store
            .find(predicate, &FindOptions::default())?
            .into_iter()
            .map(|node| {
                let fields = EncodedFields {
                    left: node.left,
                    right: node.right,
                    depth: node.depth,
                };
                (node.id, fields)
            })
            .collect();
        Ok(Self { entries })
    }

    /// Fields recorded for `id`.
    pub fn get(&self, id: &NodeId) -> Option<&EncodedFields> {
        self.entries.get(id)
    }

    /// Number of records captured.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No records captured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids whose fields differ, or that exist on one side only.
    pub fn diff(&self, other: &EncodingSnapshot) -> Vec<NodeId> {
        let mut changed: Vec<NodeId> = self
            .entries
            .iter()
            .filter(|(id, fields)| other.entries.get(*id) != Some(*fields))
            .map(|(id, _)| id.clone())
            .collect();
        changed.extend(
            other
                .entries
                .keys()
                .filter(|id| !self.entries.contains_key(*id))
                .cloned(),
        );
        changed.sort();
        changed
    }

    /// blake3 digest over the captured fields, in id order.
    pub fn fingerprint(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        for (id, fields) in &self.entries {
            hasher.update(id.as_str().as_bytes());
            hasher.update(&[0]);
            for value in [fields.left, fields.right, fields.depth.map(i64::from)] {
                match value {
                    Some(v) => {
                        hasher.update(&[1]);
                        hasher.update(&v.to_le_bytes());
                    }
                    None => {
                        hasher.update(&[0]);
                    }
                }
            }
        }
        hasher.finalize()
    }
}
