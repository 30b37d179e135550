extern crate std;

use std::{fmt, ops::Range, prelude::v1::*};

use proptest::prelude::*;

use crate::model::{self, TestNode};

use super::*;

fn tree_of(keys: &[u32]) -> AvlTree<TestNode> {
    let mut tree: AvlTree<TestNode> = AvlTree::new();

    for &key in keys {
        assert!(tree.insert(TestNode::new(key)).is_none());
        tree.assert_invariants();
    }

    tree
}

// Nodes as `(key, balance)` in preorder.
fn preorder(tree: &AvlTree<TestNode>) -> Vec<(u32, i8)> {
    fn walk(tree: &AvlTree<TestNode>, node: Link<TestNode>, out: &mut Vec<(u32, i8)>) {
        let Some(node) = node else { return };

        unsafe {
            let links = tree.links(node);
            out.push((node.as_ref().key, links.balance()));
            walk(tree, links.left(), out);
            walk(tree, links.right(), out);
        }
    }

    let mut out = Vec::with_capacity(tree.len());
    walk(tree, tree.root, &mut out);
    out
}

fn keys(tree: &AvlTree<TestNode>) -> Vec<u32> {
    tree.iter().map(|node| node.key).collect()
}

// Every ordering of `0..n`, by Heap's algorithm.
fn permutations(n: u32) -> Vec<Vec<u32>> {
    fn generate(k: usize, keys: &mut Vec<u32>, out: &mut Vec<Vec<u32>>) {
        if k <= 1 {
            out.push(keys.clone());
            return;
        }

        for i in 0..k - 1 {
            generate(k - 1, keys, out);
            let swap = if k % 2 == 0 { i } else { 0 };
            keys.swap(swap, k - 1);
        }
        generate(k - 1, keys, out);
    }

    let mut keys: Vec<u32> = (0..n).collect();
    let mut out = Vec::new();
    generate(keys.len(), &mut keys, &mut out);
    out
}

fn insert_find_all(keys: &[u32]) {
    let tree = tree_of(keys);
    assert_eq!(tree.len(), keys.len());

    for key in keys {
        let node = tree.get_raw(key).expect("item not found");
        assert_eq!(unsafe { node.as_ref().key() }, key);
    }
}

fn insert_remove_all(keys: &[u32]) {
    let mut tree = tree_of(keys);

    for key in keys {
        let node = tree.get_raw(key).expect("item not found");
        let removed = unsafe { tree.remove_at(node) };
        assert_eq!(removed.key, *key);
        tree.assert_invariants();
    }
    assert!(tree.is_empty());

    for &key in keys {
        tree.insert(TestNode::new(key));
        tree.assert_invariants();
    }

    for key in keys.iter().rev() {
        assert_eq!(tree.remove(key).map(|node| node.key), Some(*key));
        tree.assert_invariants();
    }
    assert!(tree.is_empty());
}

#[test]
fn find_after_every_insertion_order() {
    for n in 0..=5 {
        for keys in permutations(n) {
            insert_find_all(&keys);
        }
    }
}

#[test]
fn remove_after_every_insertion_order() {
    for n in 0..=5 {
        for keys in permutations(n) {
            insert_remove_all(&keys);
        }
    }
}

#[test]
fn empty_tree() {
    let mut tree: AvlTree<TestNode> = AvlTree::new();

    assert!(tree.is_empty());
    assert_eq!(tree.height(), 0);
    assert!(tree.first().is_none());
    assert!(tree.last().is_none());
    assert!(tree.pop_first().is_none());
    assert!(tree.pop_last().is_none());
    assert!(tree.remove(&0).is_none());
    assert!(tree.has_uniform_leaf_depth());
    tree.assert_invariants();
}

#[test]
fn ascending_insertions_stay_perfect() {
    let tree = tree_of(&[1, 2, 3, 4, 5, 6, 7]);

    assert_eq!(
        preorder(&tree),
        [(4, 0), (2, 0), (1, 0), (3, 0), (6, 0), (5, 0), (7, 0)]
    );
    assert_eq!(tree.height(), 3);
    assert!(tree.has_uniform_leaf_depth());
}

#[test]
fn descending_insertions_stay_perfect() {
    let tree = tree_of(&[7, 6, 5, 4, 3, 2, 1]);

    assert_eq!(
        preorder(&tree),
        [(4, 0), (2, 0), (1, 0), (3, 0), (6, 0), (5, 0), (7, 0)]
    );
    assert!(tree.has_uniform_leaf_depth());
}

#[test]
fn remove_root_with_two_children() {
    let mut tree = tree_of(&[10, 5, 15, 3, 7, 12, 18]);

    let removed = tree.remove(&10).expect("10 not found");
    assert_eq!(removed.key, 10);
    tree.assert_invariants();

    // The in-order predecessor takes the root's place.
    assert_eq!(
        preorder(&tree),
        [(7, 0), (5, 1), (3, 0), (15, 0), (12, 0), (18, 0)]
    );
    assert_eq!(keys(&tree), [3, 5, 7, 12, 15, 18]);
}

#[test]
fn remove_with_adjacent_predecessor() {
    //     2
    //    / \
    //   1   3
    let mut tree = tree_of(&[2, 1, 3]);

    tree.remove(&2).expect("2 not found");
    tree.assert_invariants();

    assert_eq!(preorder(&tree), [(1, -1), (3, 0)]);
}

#[test]
fn removal_rotates_when_sibling_is_balanced() {
    //       4
    //      / \
    //     2   5
    //    / \
    //   1   3
    let mut tree = tree_of(&[4, 2, 5, 1, 3]);

    tree.remove(&5).expect("5 not found");
    tree.assert_invariants();

    assert_eq!(preorder(&tree), [(2, -1), (1, 0), (4, 1), (3, 0)]);
    assert_eq!(tree.height(), 3);
}

#[test]
fn removal_shrinkage_propagates_to_root() {
    // Removing 1 shortens the left side and forces a rotation at the root.
    let mut tree = tree_of(&[3, 2, 5, 1, 4, 6, 7]);

    tree.remove(&1).expect("1 not found");
    tree.assert_invariants();

    assert_eq!(keys(&tree), [2, 3, 4, 5, 6, 7]);
    assert_eq!(tree.height(), 3);
}

#[test]
fn duplicate_insert_replaces_node() {
    let mut tree = tree_of(&[2, 1, 3]);
    let before = preorder(&tree);

    let original = tree.get_raw(&2).expect("2 not found");
    let replacement = TestNode::new(2);
    let replacement_ptr = NonNull::from(&*replacement);

    let displaced = tree.insert(replacement).expect("duplicate was not displaced");
    tree.assert_invariants();

    assert_eq!(NonNull::from(&*displaced), original);
    assert_eq!(tree.get_raw(&2), Some(replacement_ptr));
    assert_eq!(tree.len(), 3);
    assert_eq!(preorder(&tree), before);
}

#[test]
fn remove_absent_key() {
    let mut tree = tree_of(&[10, 5, 15, 3, 7]);
    let before = preorder(&tree);

    assert!(tree.remove(&4).is_none());
    assert!(tree.remove(&100).is_none());
    tree.assert_invariants();

    assert_eq!(tree.len(), 5);
    assert_eq!(preorder(&tree), before);
}

#[test]
fn lookups() {
    let tree = tree_of(&[8, 4, 12, 2, 6]);

    assert!(tree.contains_key(&6));
    assert!(!tree.contains_key(&7));
    assert_eq!(tree.get(&12).map(|node| node.key), Some(12));
    assert!(tree.get(&13).is_none());
    assert_eq!(tree.first().map(|node| node.key), Some(2));
    assert_eq!(tree.last().map(|node| node.key), Some(12));
}

#[test]
fn pop_both_ends() {
    let mut tree = tree_of(&[5, 3, 8, 1, 4, 7, 9, 2, 6, 10]);

    assert_eq!(tree.pop_first().map(|node| node.key), Some(1));
    tree.assert_invariants();
    assert_eq!(tree.pop_last().map(|node| node.key), Some(10));
    tree.assert_invariants();

    assert_eq!(keys(&tree), [2, 3, 4, 5, 6, 7, 8, 9]);

    while let Some(node) = tree.pop_first() {
        tree.assert_invariants();
        assert!(tree.iter().all(|other| other.key > node.key));
    }
    assert!(tree.is_empty());
}

#[test]
fn iterate_both_ends() {
    let tree = tree_of(&[4, 2, 6, 1, 3, 5, 7]);

    let mut iter = tree.iter();
    assert_eq!(iter.len(), 7);
    assert_eq!(iter.next().map(|node| node.key), Some(1));
    assert_eq!(iter.next_back().map(|node| node.key), Some(7));
    assert_eq!(iter.len(), 5);

    let middle: Vec<u32> = iter.map(|node| node.key).collect();
    assert_eq!(middle, [2, 3, 4, 5, 6]);

    let reversed: Vec<u32> = tree.iter().rev().map(|node| node.key).collect();
    assert_eq!(reversed, [7, 6, 5, 4, 3, 2, 1]);
}

#[test]
fn clear_empties_tree() {
    let mut tree = tree_of(&[3, 1, 4, 5, 9, 2, 6]);

    tree.clear();
    tree.assert_invariants();
    assert!(tree.is_empty());
    assert!(tree.iter().next().is_none());

    tree.insert(TestNode::new(1));
    tree.assert_invariants();
    assert_eq!(keys(&tree), [1]);
}

#[test]
fn cursor_walks_through_ghost() {
    let tree = tree_of(&[2, 1, 3]);

    let mut cursor = tree.cursor_first();
    assert_eq!(cursor.get().map(|node| node.key), Some(1));
    assert!(cursor.peek_prev().is_none());

    cursor.move_next();
    cursor.move_next();
    assert_eq!(cursor.get().map(|node| node.key), Some(3));

    cursor.move_next();
    assert!(cursor.get().is_none());
    assert_eq!(cursor.peek_next().map(|node| node.key), Some(1));
    assert_eq!(cursor.peek_prev().map(|node| node.key), Some(3));

    cursor.move_next();
    assert_eq!(cursor.get().map(|node| node.key), Some(1));

    let cursor = tree.cursor_last();
    assert_eq!(cursor.get().map(|node| node.key), Some(3));
}

#[test]
fn cursor_removes_inner_nodes() {
    let mut tree = tree_of(&[4, 2, 6, 1, 3, 5, 7]);

    {
        let mut cursor = tree.cursor_first_mut();
        cursor.move_next();
        cursor.move_next();
        cursor.move_next();

        // 4 has two children, so removing it exchanges it with 3.
        assert_eq!(cursor.remove_current().map(|node| node.key), Some(4));
        assert_eq!(cursor.get().map(|node| node.key), Some(5));

        assert_eq!(
            cursor.remove_current_and_move_prev().map(|node| node.key),
            Some(5)
        );
        assert_eq!(cursor.get().map(|node| node.key), Some(3));
    }

    tree.assert_invariants();
    assert_eq!(keys(&tree), [1, 2, 3, 6, 7]);

    let mut cursor = tree.cursor_last_mut();
    cursor.move_next();
    assert!(cursor.remove_current().is_none());
    assert!(cursor.remove_current_and_move_prev().is_none());
}

#[test]
fn leaf_depth_uniformity() {
    // A node with one child is not a leaf.
    assert!(tree_of(&[1, 2]).has_uniform_leaf_depth());
    assert!(tree_of(&[2, 1, 3]).has_uniform_leaf_depth());
    assert!(!tree_of(&[1, 2, 3, 4]).has_uniform_leaf_depth());
}

struct Key(u32);

impl From<&u32> for Key {
    fn from(key: &u32) -> Self {
        Key(*key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[test]
fn dotgraph_labels_balance() {
    let tree = tree_of(&[2, 1, 3, 4]);

    let mut out = String::new();
    tree.dotgraph::<_, Key>("t", &mut out).unwrap();

    assert!(out.starts_with("digraph \"graph-t\" {"));
    assert!(out.contains("\"grapht-2\" [label=\"2:-1\"];"));
    assert!(out.contains("\"grapht-3\" [label=\"3:-1\"];"));
    assert!(out.contains("\"grapht-2\" -> \"grapht-3\";"));
    assert!(out.contains("\"grapht-3\" -> \"grapht-4\";"));
    assert!(out.ends_with(" }\n}"));

    let empty: AvlTree<TestNode> = AvlTree::new();
    let mut out = String::new();
    empty.dotgraph::<_, Key>("e", &mut out).unwrap();
    assert_eq!(out, "digraph \"graph-e\" {}");
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
    fn map_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_map_equivalence(ops);
    }

    #[test]
    fn cursor_equivalence(
        values in proptest::collection::vec(any::<u32>(), 0..100),
        ops in proptest::collection::vec(model::cursor_op_strategy(), FUZZ_RANGE),
    ) {
        model::run_cursor_equivalence(values, ops);
    }

    #[test]
    fn height_stays_logarithmic(keys in proptest::collection::vec(any::<u32>(), FUZZ_RANGE)) {
        let mut tree: AvlTree<TestNode> = AvlTree::new();

        for key in keys {
            tree.insert(TestNode::new(key));
            model::assert_height_bound(tree.len(), tree.height());
        }
        tree.assert_invariants();
    }

    #[test]
    fn insert_then_remove_in_any_order(
        (inserts, removes) in (1u32..200).prop_flat_map(|n| {
            let keys: Vec<u32> = (0..n).collect();
            (Just(keys.clone()).prop_shuffle(), Just(keys).prop_shuffle())
        }),
    ) {
        let mut tree: AvlTree<TestNode> = AvlTree::new();

        for &key in &inserts {
            prop_assert!(tree.insert(TestNode::new(key)).is_none());
        }
        tree.assert_invariants();
        prop_assert_eq!(tree.len(), inserts.len());

        for key in removes {
            prop_assert_eq!(tree.remove(&key).map(|node| node.key), Some(key));
            tree.assert_invariants();
        }
        prop_assert!(tree.is_empty());
    }
}
