// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One script, three trees.
//!
//! The flat hierarchy, the child-vector tree and the linked tree place siblings by the same
//! rules, so they agree on preorder after the same operations. Only the flat hierarchy's
//! handles move when the tree changes.
//!
//! Run:
//! - `cargo run -p understory_examples --example baseline_trees`

use understory_hierarchy::{FlatHierarchy, Unordered};
use understory_hierarchy_baselines::{ChildVecTree, LinkedTree, TreeContract, preorder_values};

fn script<T: TreeContract<Value = char>>(tree: &mut T) -> Vec<(usize, char)> {
    let a = tree.create_root('a');
    tree.create_child(a, 'b');
    let c = tree.create_child(a, 'c');
    let d = tree.create_root('d');
    // Reparenting returns the handle the node has afterwards.
    let d = tree.reparent(d, c);
    tree.create_child(d, 'e');
    preorder_values(tree)
}

fn main() {
    let flat = script(&mut FlatHierarchy::<char, u8, Unordered>::new());
    let vecs = script(&mut ChildVecTree::<char, Unordered>::new());
    let links = script(&mut LinkedTree::<char, Unordered>::new());
    for (depth, value) in &flat {
        println!("{:indent$}{value}", "", indent = 2 * depth);
    }
    assert_eq!(flat, vecs);
    assert_eq!(flat, links);
}
