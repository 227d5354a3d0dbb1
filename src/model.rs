//! Model-based checking of [`AvlTree`] against a sorted `Vec` multiset.
//!
//! The same operation sequences are driven by `proptest` in unit tests and by `cargo fuzz`.

use arbitrary::Arbitrary;
use proptest::strategy::{Just, Strategy};

use crate::{AvlTree, SelectError};

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ItemValue {
    /// Resolves to a currently stored key, if there is one.
    Index(usize),
    Random(u32),
}

proptest::prop_compose! {
    fn index_strategy()(
        index in 0usize..1000,
    ) -> ItemValue {
        ItemValue::Index(index)
    }
}

proptest::prop_compose! {
    fn random_strategy()(
        random in 0u32..1000,
    ) -> ItemValue {
        ItemValue::Random(random)
    }
}

fn value_strategy() -> impl Strategy<Value = ItemValue> {
    proptest::prop_oneof![index_strategy(), random_strategy()]
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Insert(ItemValue),
    Contains(ItemValue),
    Remove(ItemValue),
    Select(usize),
    RankOf(ItemValue),
    First,
    PopFirst,
    Last,
    PopLast,
}

impl Op {
    fn finalize(self, sorted: &[u32]) -> FinalOp {
        fn get_value(v: &[u32], i: ItemValue) -> u32 {
            match i {
                ItemValue::Index(idx) => {
                    if v.is_empty() {
                        idx as u32
                    } else {
                        v[idx % v.len()]
                    }
                }
                ItemValue::Random(v) => v,
            }
        }

        match self {
            Op::Insert(item) => FinalOp::Insert(get_value(sorted, item)),
            Op::Contains(item) => FinalOp::Contains(get_value(sorted, item)),
            Op::Remove(item) => FinalOp::Remove(get_value(sorted, item)),
            // One past the end is kept reachable to exercise the error path.
            Op::Select(rank) => FinalOp::Select(rank % (sorted.len() + 1)),
            Op::RankOf(item) => FinalOp::RankOf(get_value(sorted, item)),
            Op::First => FinalOp::First,
            Op::PopFirst => FinalOp::PopFirst,
            Op::Last => FinalOp::Last,
            Op::PopLast => FinalOp::PopLast,
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum FinalOp {
    Insert(u32),
    Contains(u32),
    Remove(u32),
    Select(usize),
    RankOf(u32),
    First,
    PopFirst,
    Last,
    PopLast,
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        value_strategy().prop_map(Op::Insert),
        value_strategy().prop_map(Op::Contains),
        value_strategy().prop_map(Op::Remove),
        (0usize..1000).prop_map(Op::Select),
        value_strategy().prop_map(Op::RankOf),
        Just(Op::First),
        Just(Op::PopFirst),
        Just(Op::Last),
        Just(Op::PopLast),
    ]
}

pub fn run_model_equivalence(ops: Vec<Op>) {
    let mut sorted: Vec<u32> = Vec::with_capacity(ops.len());
    let mut tree: AvlTree<u32> = AvlTree::new();

    // Equal keys are appended after existing occurrences.
    fn insert_sorted(v: &mut Vec<u32>, value: u32) {
        let idx = v.partition_point(|&x| x <= value);
        v.insert(idx, value);
    }

    fn remove_sorted(v: &mut Vec<u32>, value: u32) -> Option<u32> {
        let idx = v.binary_search(&value).ok()?;
        Some(v.remove(idx))
    }

    fn rank_sorted(v: &[u32], value: u32) -> Option<usize> {
        let idx = v.partition_point(|&x| x < value);
        (v.get(idx) == Some(&value)).then_some(idx)
    }

    for (op_id, op) in ops.into_iter().enumerate() {
        let final_op = op.finalize(&sorted);

        match final_op {
            FinalOp::Insert(value) => {
                insert_sorted(&mut sorted, value);
                tree.insert(value);
            }

            FinalOp::Contains(value) => {
                let from_vec = sorted.binary_search(&value).is_ok();
                let from_tree = tree.contains(&value);

                assert_eq!(from_vec, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Remove(value) => {
                let from_vec = remove_sorted(&mut sorted, value);
                let from_tree = tree.remove(&value);

                assert_eq!(from_vec, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Select(rank) => {
                let from_vec = sorted.get(rank).ok_or(SelectError::OutOfRange {
                    rank,
                    len: sorted.len(),
                });
                let from_tree = tree.select(rank);

                assert_eq!(from_vec, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::RankOf(value) => {
                let from_vec = rank_sorted(&sorted, value);
                let from_tree = tree.rank_of(&value);

                assert_eq!(from_vec, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::First => {
                assert_eq!(sorted.first(), tree.first(), "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::PopFirst => {
                let from_vec = (!sorted.is_empty()).then(|| sorted.remove(0));
                let from_tree = tree.pop_first();

                assert_eq!(from_vec, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Last => {
                assert_eq!(sorted.last(), tree.last(), "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::PopLast => {
                let from_vec = sorted.pop();
                let from_tree = tree.pop_last();

                assert_eq!(from_vec, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }
        }

        tree.assert_invariants();
        assert_eq!(sorted.len(), tree.len());
        assert!(sorted.iter().eq(tree.iter()));
    }
}
