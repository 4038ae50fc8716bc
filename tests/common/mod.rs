//! Shared fixtures for the integration tests

#![allow(dead_code)]

use nested_set::store::{Field, FieldUpdate, FindOptions, NodeStore, Predicate, StoreError};
use nested_set::{Interval, MemoryStore, NestedSet, NestedSetConfig, Node, NodeId};

/// `(id, parent)` pairs in insertion order.
pub type Shape = &'static [(&'static str, Option<&'static str>)];

/// M → A, B, C; A → A1, A2; B → B1, B2, B3; C → C1
pub const LETTERS: Shape = &[
    ("M", None),
    ("A", Some("M")),
    ("B", Some("M")),
    ("C", Some("M")),
    ("A1", Some("A")),
    ("A2", Some("A")),
    ("B1", Some("B")),
    ("B2", Some("B")),
    ("B3", Some("B")),
    ("C1", Some("C")),
];

/// Intervals the letters tree gets from a rebuild starting at 1.
pub const LETTERS_ENCODED: &[(&str, i64, i64)] = &[
    ("M", 1, 20),
    ("A", 2, 7),
    ("A1", 3, 4),
    ("A2", 5, 6),
    ("B", 8, 15),
    ("B1", 9, 10),
    ("B2", 11, 12),
    ("B3", 13, 14),
    ("C", 16, 19),
    ("C1", 17, 18),
];

/// One office: michael manages meredith, jim and angela.
pub const OFFICE: Shape = &[
    ("michael", None),
    ("meredith", Some("michael")),
    ("jim", Some("michael")),
    ("angela", Some("michael")),
    ("kelly", Some("meredith")),
    ("creed", Some("meredith")),
    ("phyllis", Some("jim")),
    ("stanley", Some("jim")),
    ("dwight", Some("jim")),
    ("oscar", Some("angela")),
];

pub const OFFICE_ENCODED: &[(&str, i64, i64)] = &[
    ("michael", 1, 20),
    ("meredith", 2, 7),
    ("kelly", 3, 4),
    ("creed", 5, 6),
    ("jim", 8, 15),
    ("phyllis", 9, 10),
    ("stanley", 11, 12),
    ("dwight", 13, 14),
    ("angela", 16, 19),
    ("oscar", 17, 18),
];

/// Second office: same shape without creed and dwight.
pub const SMALL_OFFICE: Shape = &[
    ("michael", None),
    ("meredith", Some("michael")),
    ("jim", Some("michael")),
    ("angela", Some("michael")),
    ("kelly", Some("meredith")),
    ("phyllis", Some("jim")),
    ("stanley", Some("jim")),
    ("oscar", Some("angela")),
];

pub const SMALL_OFFICE_ENCODED: &[(&str, i64, i64)] = &[
    ("michael", 1, 16),
    ("meredith", 2, 5),
    ("kelly", 3, 4),
    ("jim", 6, 11),
    ("phyllis", 7, 8),
    ("stanley", 9, 10),
    ("angela", 12, 15),
    ("oscar", 13, 14),
];

/// Record id of `name`; grouped records are prefixed with their group so ids
/// stay unique across the whole store.
pub fn scoped(name: &str, group: Option<&str>) -> NodeId {
    match group {
        Some(group) => NodeId::new(format!("{group}/{name}")),
        None => NodeId::from(name),
    }
}

/// Unencoded records for `shape`, each carrying a `username` attribute.
pub fn records(shape: Shape, group: Option<&str>) -> Vec<Node> {
    shape
        .iter()
        .map(|&(name, parent)| {
            let id = scoped(name, group);
            let mut node = match parent {
                Some(parent) => Node::child(id, scoped(parent, group)),
                None => Node::root(id),
            };
            node = node.with_attribute("username", name);
            if let Some(group) = group {
                node = node
                    .in_group(group)
                    .with_attribute("organization", group);
            }
            node
        })
        .collect()
}

pub fn unencoded(shape: Shape) -> NestedSet<MemoryStore> {
    let store = MemoryStore::from_nodes(records(shape, None)).expect("fixture ids are unique");
    NestedSet::new(store, NestedSetConfig::default())
}

/// `shape` in the global forest, rebuilt from 1.
pub fn encoded(shape: Shape) -> NestedSet<MemoryStore> {
    let mut tree = unencoded(shape);
    let root = NodeId::from(shape[0].0);
    tree.rebuild_tree(&root, 1).expect("fixture rebuilds");
    tree
}

/// Office in group "A" and the small office in group "B", both rebuilt.
pub fn two_offices() -> NestedSet<MemoryStore> {
    let mut nodes = records(OFFICE, Some("A"));
    nodes.extend(records(SMALL_OFFICE, Some("B")));
    let store = MemoryStore::from_nodes(nodes).expect("fixture ids are unique");
    let mut tree = NestedSet::new(store, NestedSetConfig::default());
    for group in ["A", "B"] {
        tree.rebuild_tree(&scoped("michael", Some(group)), 1)
            .expect("fixture rebuilds");
    }
    tree
}

pub fn node<S: NodeStore>(tree: &NestedSet<S>, id: &str) -> Node {
    tree.get(&NodeId::from(id)).expect("node exists")
}

pub fn interval<S: NodeStore>(tree: &NestedSet<S>, id: &str) -> Option<Interval> {
    node(tree, id).interval()
}

/// Every `(id, left, right)` matches the store.
pub fn assert_intervals<S: NodeStore>(tree: &NestedSet<S>, expected: &[(&str, i64, i64)]) {
    for &(id, left, right) in expected {
        assert_eq!(
            interval(tree, id),
            Some(Interval::new(left, right)),
            "interval of {id}"
        );
    }
}

/// Same as [`assert_intervals`] for names scoped to `group`.
pub fn assert_group_intervals<S: NodeStore>(
    tree: &NestedSet<S>,
    group: &str,
    expected: &[(&str, i64, i64)],
) {
    for &(name, left, right) in expected {
        let id = scoped(name, Some(group));
        assert_eq!(
            tree.get(&id).expect("node exists").interval(),
            Some(Interval::new(left, right)),
            "interval of {id}"
        );
    }
}

pub fn ids(nodes: &[Node]) -> Vec<String> {
    nodes.iter().map(|n| n.id.to_string()).collect()
}

/// Store wrapper that fails chosen calls on demand.
#[derive(Debug, Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,

    /// Fail every bulk increment of the `right` field.
    pub fail_right_shift: bool,

    /// Fail the persist of this record.
    pub fail_persist_of: Option<NodeId>,

    /// Fail every find.
    pub fail_find: bool,

    /// Delete this record right before it is persisted.
    pub vanish_before_persist: Option<NodeId>,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn heal(&mut self) {
        self.fail_right_shift = false;
        self.fail_persist_of = None;
        self.fail_find = false;
        self.vanish_before_persist = None;
    }
}

impl NodeStore for FlakyStore {
    fn get(&self, id: &NodeId) -> Result<Option<Node>, StoreError> {
        self.inner.get(id)
    }

    fn find(&self, predicate: &Predicate, options: &FindOptions) -> Result<Vec<Node>, StoreError> {
        if self.fail_find {
            return Err(StoreError::backend("injected find failure"));
        }
        self.inner.find(predicate, options)
    }

    fn bulk_increment(
        &mut self,
        predicate: &Predicate,
        field: Field,
        delta: i64,
    ) -> Result<usize, StoreError> {
        if self.fail_right_shift && field == Field::Right {
            return Err(StoreError::backend("injected right-shift failure"));
        }
        self.inner.bulk_increment(predicate, field, delta)
    }

    fn persist(&mut self, id: &NodeId, update: &FieldUpdate) -> Result<(), StoreError> {
        if self.fail_persist_of.as_ref() == Some(id) {
            return Err(StoreError::backend("injected persist failure"));
        }
        if self.vanish_before_persist.as_ref() == Some(id) {
            self.inner.delete(id)?;
        }
        self.inner.persist(id, update)
    }

    fn insert(&mut self, node: Node) -> Result<(), StoreError> {
        self.inner.insert(node)
    }

    fn delete(&mut self, id: &NodeId) -> Result<bool, StoreError> {
        self.inner.delete(id)
    }
}

/// `shape` rebuilt from 1 behind a [`FlakyStore`].
pub fn flaky(shape: Shape) -> NestedSet<FlakyStore> {
    let store = MemoryStore::from_nodes(records(shape, None)).expect("fixture ids are unique");
    let mut tree = NestedSet::new(FlakyStore::new(store), NestedSetConfig::default());
    tree.rebuild_tree(&NodeId::from(shape[0].0), 1)
        .expect("fixture rebuilds");
    tree
}
