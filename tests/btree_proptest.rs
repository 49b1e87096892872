//! Property tests: the tree against a `BTreeMap` model.
//!
//! Keys are kept distinct so deletes route to the one entry that holds
//! them, and each key gets its own record id so the single-leaf-root
//! delete path removes the same entry the model does.

use std::collections::BTreeMap;

use pagetree::{BTreeConfig, BTreeFile, BufferPoolManager, DiskManager, Key, KeyType, PageId, RecordId};
use proptest::prelude::*;
use tempfile::tempdir;

#[derive(Debug, Clone)]
enum Op {
    Insert(i32),
    Delete(i32),
    Scan(Option<i32>, Option<i32>),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let key = -300i32..300;
    prop_oneof![
        4 => key.clone().prop_map(Op::Insert),
        2 => key.clone().prop_map(Op::Delete),
        1 => (proptest::option::of(key.clone()), proptest::option::of(key))
            .prop_map(|(lo, hi)| Op::Scan(lo, hi)),
    ]
}

fn rid_for(key: i32) -> RecordId {
    RecordId::new(PageId::new((key + 1000) as u32), 0)
}

fn scan(tree: &mut BTreeFile<'_>, low: Option<i32>, high: Option<i32>) -> Vec<(i32, RecordId)> {
    tree.new_scan(low.map(Key::from), high.map(Key::from))
        .unwrap()
        .map(|r| match r.unwrap() {
            (Key::Integer(k), rid) => (k, rid),
            (Key::String(_), _) => unreachable!(),
        })
        .collect()
}

fn run(ops: Vec<Op>, capacity: u16) {
    let dir = tempdir().unwrap();
    let dm = DiskManager::create(dir.path().join("prop.db")).unwrap();
    let bpm = BufferPoolManager::new(24, dm);
    let config = BTreeConfig::new(KeyType::Integer)
        .with_leaf_capacity(capacity)
        .with_index_capacity(capacity);
    let mut tree = BTreeFile::create(&bpm, "model", config).unwrap();
    let mut model: BTreeMap<i32, RecordId> = BTreeMap::new();

    for op in ops {
        match op {
            Op::Insert(k) => {
                if model.contains_key(&k) {
                    continue;
                }
                tree.insert(&Key::from(k), rid_for(k)).unwrap();
                model.insert(k, rid_for(k));
            }
            Op::Delete(k) => {
                let removed = tree.delete(&Key::from(k), rid_for(k)).unwrap();
                assert_eq!(removed, model.remove(&k).is_some(), "delete {}", k);
            }
            Op::Scan(lo, hi) => {
                let expected: Vec<(i32, RecordId)> = model
                    .iter()
                    .filter(|(k, _)| lo.map_or(true, |lo| **k >= lo) && hi.map_or(true, |hi| **k <= hi))
                    .map(|(k, r)| (*k, *r))
                    .collect();
                assert_eq!(scan(&mut tree, lo, hi), expected, "scan {:?}..={:?}", lo, hi);
            }
        }
        assert_eq!(bpm.pinned_frame_count(), 1);
    }

    let all: Vec<(i32, RecordId)> = model.into_iter().collect();
    assert_eq!(scan(&mut tree, None, None), all);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn tree_matches_model_small_nodes(ops in prop::collection::vec(op_strategy(), 1..200)) {
        run(ops, 3);
    }

    #[test]
    fn tree_matches_model_page_sized_nodes(ops in prop::collection::vec(op_strategy(), 1..400)) {
        run(ops, 0);
    }
}
