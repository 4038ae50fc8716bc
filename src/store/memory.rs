use std::collections::{BTreeMap, HashMap};

use super::{Field, FieldUpdate, FindOptions, NodeStore, Predicate, StoreError};
use crate::tree::{Node, NodeId};

/// In-memory [`NodeStore`].
///
/// Natural order is insertion order, like a document collection without an
/// explicit sort, so every query is deterministic.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    /// Records by insertion sequence
    records: BTreeMap<u64, Node>,

    /// id -> insertion sequence
    index: HashMap<NodeId, u64>,

    next_seq: u64,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from records, rejecting duplicate ids.
    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Result<Self, StoreError> {
        let mut store = Self::new();
        for node in nodes {
            store.insert(node)?;
        }
        Ok(store)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate all records in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.records.values()
    }

    fn record_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        let seq = self.index.get(id)?;
        self.records.get_mut(seq)
    }
}

impl NodeStore for MemoryStore {
    fn get(&self, id: &NodeId) -> Result<Option<Node>, StoreError> {
        Ok(self
            .index
            .get(id)
            .and_then(|seq| self.records.get(seq))
            .cloned())
    }

    fn find(&self, predicate: &Predicate, options: &FindOptions) -> Result<Vec<Node>, StoreError> {
        let mut matched: Vec<Node> = self
            .records
            .values()
            .filter(|node| predicate.matches(node))
            .cloned()
            .collect();

        if let Some(sort) = options.sort {
            matched.sort_by(|a, b| sort.compare(a, b));
        }

        let limit = options.limit.unwrap_or(usize::MAX);
        let mut page: Vec<Node> = matched.into_iter().skip(options.skip).take(limit).collect();

        if let Some(keys) = &options.projection {
            for node in &mut page {
                node.attributes.retain(|key, _| keys.iter().any(|k| k == key));
            }
        }

        Ok(page)
    }

    fn bulk_increment(
        &mut self,
        predicate: &Predicate,
        field: Field,
        delta: i64,
    ) -> Result<usize, StoreError> {
        if field == Field::Depth {
            if let Some(node) = self.records.values().find(|node| {
                predicate.matches(node)
                    && node
                        .depth
                        .is_some_and(|d| u32::try_from(i64::from(d) + delta).is_err())
            }) {
                return Err(StoreError::backend(format!(
                    "depth of {} would leave the u32 range",
                    node.id
                )));
            }
        }

        let mut changed = 0;
        for node in self.records.values_mut() {
            if !predicate.matches(node) {
                continue;
            }
            let slot = match field {
                Field::Left => node.left.as_mut(),
                Field::Right => node.right.as_mut(),
                Field::Depth => {
                    if let Some(depth) = node.depth.as_mut() {
                        *depth = u32::try_from(i64::from(*depth) + delta).unwrap_or(*depth);
                        changed += 1;
                    }
                    continue;
                }
            };
            if let Some(value) = slot {
                *value += delta;
                changed += 1;
            }
        }
        Ok(changed)
    }

    fn persist(&mut self, id: &NodeId, update: &FieldUpdate) -> Result<(), StoreError> {
        let node = self
            .record_mut(id)
            .ok_or_else(|| StoreError::UnknownNode(id.clone()))?;
        update.apply(node);
        Ok(())
    }

    fn insert(&mut self, node: Node) -> Result<(), StoreError> {
        if self.index.contains_key(&node.id) {
            return Err(StoreError::DuplicateId(node.id));
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.index.insert(node.id.clone(), seq);
        self.records.insert(seq, node);
        Ok(())
    }

    fn delete(&mut self, id: &NodeId) -> Result<bool, StoreError> {
        Ok(match self.index.remove(id) {
            Some(seq) => self.records.remove(&seq).is_some(),
            None => false,
        })
    }
}
