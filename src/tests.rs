use std::ops::Range;

use proptest::prelude::*;

use crate::{harness, model, AvlTree, HarnessError, SelectError};

fn insert_find_all(keys: &[u32]) {
    let mut tree: AvlTree<u32> = AvlTree::new();

    for &key in keys {
        tree.insert(key);
        tree.assert_invariants();
    }

    for key in keys {
        assert!(tree.contains(key), "{key} not found");
    }

    let mut sorted = keys.to_vec();
    sorted.sort_unstable();

    for (rank, key) in sorted.iter().enumerate() {
        assert_eq!(tree.select(rank), Ok(key));
    }
    assert!(tree.select(sorted.len()).is_err());
}

fn insert_remove_all(keys: &[u32]) {
    let mut tree: AvlTree<u32> = AvlTree::new();

    for &key in keys {
        tree.insert(key);
        tree.assert_invariants();
    }

    for key in keys {
        assert_eq!(tree.remove(key), Some(*key));
        tree.assert_invariants();
    }
    assert!(tree.is_empty());

    for &key in keys {
        tree.insert(key);
        tree.assert_invariants();
    }

    for key in keys.iter().rev() {
        assert_eq!(tree.remove(key), Some(*key));
        tree.assert_invariants();
    }
    assert!(tree.is_empty());
}

fn permutations(n: u32) -> Vec<Vec<u32>> {
    if n == 0 {
        return vec![vec![]];
    }

    let mut out = Vec::new();
    for shorter in permutations(n - 1) {
        for idx in 0..=shorter.len() {
            let mut perm = shorter.clone();
            perm.insert(idx, n - 1);
            out.push(perm);
        }
    }
    out
}

fn tree_of(keys: &[u32]) -> AvlTree<u32> {
    keys.iter().copied().collect()
}

#[test]
fn zero_elems_find() {
    insert_find_all(&[]);
}

#[test]
fn single_elem_find() {
    insert_find_all(&[0]);
}

#[test]
fn two_elems_find() {
    insert_find_all(&[0, 1]);
    insert_find_all(&[1, 0]);
}

#[test]
fn three_elems_find() {
    insert_find_all(&[0, 1, 2]);
    insert_find_all(&[0, 2, 1]);
    insert_find_all(&[1, 0, 2]);
    insert_find_all(&[1, 2, 0]);
    insert_find_all(&[2, 0, 1]);
    insert_find_all(&[2, 1, 0]);
}

#[test]
fn six_elems_find() {
    for perm in permutations(6) {
        insert_find_all(&perm);
    }
}

#[test]
fn remove_one() {
    insert_remove_all(&[0]);
}

#[test]
fn remove_two() {
    insert_remove_all(&[0, 1]);
    insert_remove_all(&[1, 0]);
}

#[test]
fn remove_three() {
    insert_remove_all(&[0, 1, 2]);
    insert_remove_all(&[0, 2, 1]);
    insert_remove_all(&[1, 0, 2]);
    insert_remove_all(&[1, 2, 0]);
    insert_remove_all(&[2, 0, 1]);
    insert_remove_all(&[2, 1, 0]);
}

#[test]
fn remove_six() {
    for perm in permutations(6) {
        insert_remove_all(&perm);
    }
}

#[test]
fn single_rotations() {
    // Right-right and left-left cases both settle on the middle key.
    for keys in [[1, 2, 3], [3, 2, 1]] {
        let tree = tree_of(&keys);
        tree.assert_invariants();
        assert_eq!(tree.height(), 2);
        assert_eq!(tree.post_order().copied().collect::<Vec<_>>(), [1, 3, 2]);
    }
}

#[test]
fn double_rotations() {
    for keys in [[3, 1, 2], [1, 3, 2]] {
        let tree = tree_of(&keys);
        tree.assert_invariants();
        assert_eq!(tree.height(), 2);
        assert_eq!(tree.post_order().copied().collect::<Vec<_>>(), [1, 3, 2]);
    }
}

#[test]
fn remove_with_two_children_promotes_successor() {
    let mut tree = tree_of(&[2, 1, 3]);

    assert_eq!(tree.remove(&2), Some(2));
    tree.assert_invariants();
    assert_eq!(tree.post_order().copied().collect::<Vec<_>>(), [1, 3]);
}

#[test]
fn ascending_insertion_stays_balanced() {
    let mut tree = AvlTree::new();

    for key in 0..1023u32 {
        tree.insert(key);
    }
    tree.assert_invariants();

    assert_eq!(tree.len(), 1023);
    assert!(tree.height() <= 14, "height {}", tree.height());
    for rank in [0, 1, 511, 1022] {
        assert_eq!(tree.select(rank), Ok(&(rank as u32)));
    }
}

#[test]
fn select_out_of_range() {
    let mut tree: AvlTree<u32> = AvlTree::new();
    assert_eq!(tree.select(0), Err(SelectError::OutOfRange { rank: 0, len: 0 }));

    tree.extend([10, 20, 30]);
    assert_eq!(tree.select(2), Ok(&30));
    assert_eq!(tree.select(3), Err(SelectError::OutOfRange { rank: 3, len: 3 }));
    assert_eq!(
        tree.select(usize::MAX),
        Err(SelectError::OutOfRange {
            rank: usize::MAX,
            len: 3
        })
    );
}

#[test]
fn duplicates_remove_one_occurrence() {
    let mut tree = tree_of(&[7, 3, 9]);
    tree.insert(7);
    tree.insert(7);
    tree.assert_invariants();
    assert_eq!(tree.len(), 5);

    assert_eq!(tree.remove(&7), Some(7));
    tree.assert_invariants();
    assert_eq!(tree.len(), 4);
    assert!(tree.contains(&7));
    assert_eq!(tree.iter().copied().collect::<Vec<_>>(), [3, 7, 7, 9]);
    assert_eq!(tree.rank_of(&7), Some(1));
}

#[test]
fn remove_absent_is_noop() {
    let mut tree = tree_of(&[50, 20, 80, 10, 30, 70, 90, 60]);
    let keys: Vec<u32> = tree.iter().copied().collect();
    let shape: Vec<u32> = tree.post_order().copied().collect();
    let height = tree.height();

    assert_eq!(tree.remove(&55), None);
    tree.assert_invariants();

    assert_eq!(tree.iter().copied().collect::<Vec<_>>(), keys);
    assert_eq!(tree.post_order().copied().collect::<Vec<_>>(), shape);
    assert_eq!(tree.height(), height);
    assert_eq!(tree.len(), keys.len());
}

#[test]
fn rank_of_is_inverse_of_select() {
    let tree = tree_of(&[5, 3, 5, 5, 1, 8]);

    assert_eq!(tree.rank_of(&1), Some(0));
    assert_eq!(tree.rank_of(&3), Some(1));
    assert_eq!(tree.rank_of(&5), Some(2));
    assert_eq!(tree.rank_of(&8), Some(5));
    assert_eq!(tree.rank_of(&4), None);

    for rank in 0..tree.len() {
        let key = tree.select(rank).unwrap();
        let first = tree.rank_of(key).unwrap();
        assert!(first <= rank);
        assert_eq!(tree.select(first), Ok(key));
    }
}

#[test]
fn reversed_comparator() {
    let mut tree = AvlTree::with_comparator(|a: &u32, b: &u32| b.cmp(a));
    tree.extend(1..=5);
    tree.assert_invariants();

    assert_eq!(tree.select(0), Ok(&5));
    assert_eq!(tree.select(4), Ok(&1));
    assert_eq!(tree.first(), Some(&5));
    assert_eq!(tree.iter().copied().collect::<Vec<_>>(), [5, 4, 3, 2, 1]);

    assert_eq!(tree.remove(&4), Some(4));
    tree.assert_invariants();
    assert_eq!(tree.rank_of(&3), Some(1));
}

#[test]
fn closure_comparator_on_strings() {
    let mut tree =
        AvlTree::with_comparator(|a: &String, b: &String| a.to_lowercase().cmp(&b.to_lowercase()));

    for word in ["banana", "Apple", "cherry"] {
        tree.insert(word.to_owned());
    }
    tree.assert_invariants();

    assert!(tree.contains(&"BANANA".to_owned()));
    assert_eq!(tree.select(0).map(String::as_str), Ok("Apple"));
    assert_eq!(tree.remove(&"CHERRY".to_owned()).as_deref(), Some("cherry"));
}

#[test]
fn first_last_pop() {
    let mut tree = tree_of(&[4, 2, 6, 1, 3, 5, 7]);
    assert_eq!(tree.first(), Some(&1));
    assert_eq!(tree.last(), Some(&7));

    assert_eq!(tree.pop_first(), Some(1));
    tree.assert_invariants();
    assert_eq!(tree.pop_last(), Some(7));
    tree.assert_invariants();

    let mut drained = Vec::new();
    while let Some(key) = tree.pop_first() {
        tree.assert_invariants();
        drained.push(key);
    }
    assert_eq!(drained, [2, 3, 4, 5, 6]);
    assert_eq!(tree.first(), None);
    assert_eq!(tree.pop_last(), None);
}

#[test]
fn iterators_report_exact_len() {
    let tree = tree_of(&[3, 1, 2, 5, 4]);

    let mut iter = tree.iter();
    assert_eq!(iter.len(), 5);
    iter.next();
    assert_eq!(iter.len(), 4);

    let post = tree.post_order();
    assert_eq!(post.len(), 5);
    assert_eq!(post.count(), 5);
}

#[test]
fn clear_and_reuse() {
    let mut tree = tree_of(&[1, 2, 3, 4, 5, 6, 7, 8]);
    tree.clear();

    assert!(tree.is_empty());
    assert_eq!(tree.len(), 0);
    assert_eq!(tree.height(), 0);
    assert_eq!(tree.iter().next(), None);

    tree.insert(42);
    tree.assert_invariants();
    assert_eq!(tree.select(0), Ok(&42));
}

#[test]
fn debug_formats_as_set() {
    let tree = tree_of(&[3, 1, 2]);
    assert_eq!(format!("{tree:?}"), "{1, 2, 3}");
}

#[test]
fn dotgraph() {
    let mut out = String::new();
    AvlTree::<u32>::new().dotgraph("empty", &mut out).unwrap();
    assert_eq!(out, "digraph \"graph-empty\" {}");

    let mut out = String::new();
    tree_of(&[1, 2, 3]).dotgraph("t", &mut out).unwrap();
    assert!(out.starts_with("digraph \"graph-t\" {"));
    assert!(out.contains("[label=\"2:2/3\"]"));
    assert!(out.contains("[label=\"1:1/1\"]"));
    assert!(out.contains("[label=\"3:1/1\"]"));
    assert!(out.contains("\"grapht-0\" -> \"grapht-1\";"));
    assert!(out.ends_with(" }\n}"));
}

fn run_harness(input: &str) -> Result<String, HarnessError> {
    let mut output = Vec::new();
    harness::run(input.as_bytes(), &mut output)?;
    Ok(String::from_utf8(output).unwrap())
}

#[test]
fn harness_insert_and_remove() {
    let out = run_harness("5\n40 0\n10 1\n4 1\n-10 0\n50 2\n").unwrap();
    assert_eq!(out, "40\n40\n10\n4\n50\n");
}

#[test]
fn harness_remove_root() {
    let out = run_harness("3\n1 0\n2 0\n-1 0\n").unwrap();
    assert_eq!(out, "1\n1\n2\n");
}

#[test]
fn harness_ascending() {
    let out = run_harness("5\n1 0\n2 1\n3 2\n4 3\n5 4\n").unwrap();
    assert_eq!(out, "1\n2\n3\n4\n5\n");
}

#[test]
fn harness_descending() {
    let out = run_harness("5\n5 0\n4 1\n3 2\n2 3\n1 0\n").unwrap();
    assert_eq!(out, "5\n5\n5\n5\n1\n");

    // Removing an absent key leaves the minimum at rank 0.
    let out = run_harness("5\n5 0\n4 1\n3 2\n2 3\n-1 0\n").unwrap();
    assert_eq!(out, "5\n5\n5\n5\n2\n");
}

#[test]
fn harness_mixed() {
    let out = run_harness("10\n5 0\n2 1\n-2 0\n2 1\n-5 0\n7 1\n3 2\n8 3\n1 4\n-2 0\n").unwrap();
    assert_eq!(out, "5\n5\n5\n5\n2\n7\n7\n8\n8\n1\n");
}

#[test]
fn harness_tokens_span_lines() {
    let out = run_harness("2 40\n0 10 1").unwrap();
    assert_eq!(out, "40\n40\n");
}

#[test]
fn harness_errors() {
    assert!(matches!(run_harness(""), Err(HarnessError::MissingCount)));
    assert!(matches!(
        run_harness("2\n1 0\n2"),
        Err(HarnessError::MissingToken {
            command: 1,
            what: "rank"
        })
    ));
    assert!(matches!(
        run_harness("1\nx 0"),
        Err(HarnessError::InvalidToken { token }) if token == "x"
    ));
    assert!(matches!(
        run_harness("1\n-5 0"),
        Err(HarnessError::Select {
            command: 0,
            source: SelectError::OutOfRange { rank: 0, len: 0 }
        })
    ));
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn model_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_model_equivalence(ops);
    }

    #[test]
    fn select_matches_sorted(keys in proptest::collection::vec(0u32..64, 0..200)) {
        let tree = tree_of(&keys);
        tree.assert_invariants();

        let mut sorted = keys.clone();
        sorted.sort_unstable();

        for (rank, key) in sorted.iter().enumerate() {
            prop_assert_eq!(tree.select(rank), Ok(key));
        }
    }
}
