mod common;

use common::*;
use nested_set::query;
use nested_set::{MemoryStore, NestedSet, NestedSetConfig, Node, NodeId};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Insert(usize),
    Remove(usize),
    Rebuild,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => any::<usize>().prop_map(Op::Insert),
        2 => any::<usize>().prop_map(Op::Remove),
        1 => Just(Op::Rebuild),
    ]
}

fn apply(tree: &mut NestedSet<MemoryStore>, op: &Op, next: &mut usize) {
    match *op {
        Op::Insert(pick) => {
            let ids: Vec<NodeId> = tree.store().nodes().map(|n| n.id.clone()).collect();
            let parent = ids[pick % ids.len()].clone();
            tree.insert(Node::child(format!("n{next}"), parent))
                .expect("insert succeeds");
            *next += 1;
        }
        Op::Remove(pick) => {
            let leaves: Vec<NodeId> = tree
                .store()
                .nodes()
                .filter(|n| query::is_child(n) && query::is_leaf(n))
                .map(|n| n.id.clone())
                .collect();
            if let Some(id) = leaves.get(pick % leaves.len().max(1)) {
                tree.remove(id).expect("remove succeeds");
            }
        }
        Op::Rebuild => {
            tree.rebuild_tree(&NodeId::from("M"), 1)
                .expect("rebuild succeeds");
        }
    }
}

/// Random parent-pointer tree: node i hangs under some node j < i.
fn random_tree(picks: &[usize]) -> MemoryStore {
    let mut nodes = vec![Node::root("n0")];
    for (i, pick) in picks.iter().enumerate() {
        let parent = format!("n{}", pick % (i + 1));
        nodes.push(Node::child(format!("n{}", i + 1), parent));
    }
    MemoryStore::from_nodes(nodes).expect("generated ids are unique")
}

proptest! {
    #[test]
    fn test_maintenance_keeps_invariants(ops in proptest::collection::vec(op(), 1..40)) {
        let mut tree = encoded(LETTERS);
        let mut next = 0;

        for op in &ops {
            apply(&mut tree, op, &mut next);
            let violations = tree.check(None).expect("check runs");
            prop_assert!(violations.is_empty(), "after {:?}: {:?}", op, violations);
        }

        let count = tree.store().len() as i64;
        prop_assert_eq!(interval(&tree, "M").map(|i| i.right), Some(2 * count));
    }

    #[test]
    fn test_maintained_encoding_matches_rebuild(ops in proptest::collection::vec(op(), 1..40)) {
        let mut tree = encoded(LETTERS);
        let mut next = 0;
        for op in &ops {
            apply(&mut tree, op, &mut next);
        }

        let maintained = tree.snapshot(None).expect("snapshot");
        tree.rebuild_tree(&NodeId::from("M"), 1).expect("rebuild succeeds");
        let rebuilt = tree.snapshot(None).expect("snapshot");
        prop_assert_eq!(maintained.diff(&rebuilt), Vec::<NodeId>::new());
    }

    #[test]
    fn test_insert_then_remove_is_identity(pick in any::<usize>()) {
        let mut tree = encoded(OFFICE);
        let before = tree.snapshot(None).expect("snapshot");

        let parent = OFFICE[pick % OFFICE.len()].0;
        tree.insert(Node::child("temp", parent)).expect("insert succeeds");
        prop_assert!(tree.check(None).expect("check runs").is_empty());
        tree.remove(&NodeId::from("temp")).expect("remove succeeds");

        let after = tree.snapshot(None).expect("snapshot");
        prop_assert_eq!(before.fingerprint(), after.fingerprint());
    }

    #[test]
    fn test_rebuild_encodes_any_shape(
        picks in proptest::collection::vec(any::<usize>(), 0..60),
        start in -5i64..50,
    ) {
        let store = random_tree(&picks);
        let count = store.len() as i64;
        let mut tree = NestedSet::new(store, NestedSetConfig::default());

        let root = tree.rebuild_tree(&NodeId::from("n0"), start).expect("rebuild succeeds");
        prop_assert_eq!(root.left, start);
        prop_assert_eq!(root.width(), 2 * count - 1);
        prop_assert!(tree.check(None).expect("check runs").is_empty());

        for node in tree.store().nodes() {
            let interval = node.interval().expect("every node is reachable");
            let descendants = tree
                .query()
                .descendants(node, &Default::default())
                .expect("query succeeds");
            prop_assert_eq!(interval.descendant_count(), descendants.len() as i64);
            prop_assert_eq!(query::is_leaf(node), descendants.is_empty());
        }
    }
}
