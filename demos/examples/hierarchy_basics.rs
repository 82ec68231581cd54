// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat hierarchy basics.
//!
//! Build a small sorted forest, move a subtree, reject a cyclic move, and erase.
//!
//! Run:
//! - `cargo run -p understory_examples --example hierarchy_basics`

use understory_hierarchy::{FlatHierarchy, HierarchyError};

fn print(h: &FlatHierarchy<u32>) {
    for (depth, value) in h.iter() {
        println!("{:indent$}{value}", "", indent = 2 * usize::from(depth));
    }
    println!();
}

fn main() {
    // Indices shift on every insertion, so look nodes up by value before each use.
    let mut h = FlatHierarchy::<u32>::new();
    h.create_root(10);
    h.create_child_of(h.find_value(&10).unwrap(), 30);
    h.create_child_of(h.find_value(&10).unwrap(), 20);
    h.create_root(40);
    h.create_child_of(h.find_value(&20).unwrap(), 25);
    print(&h);
    assert_eq!(h.values(), [10, 20, 25, 30, 40]);
    assert_eq!(h.depths(), [0, 1, 2, 1, 0]);

    // Move root 40 under 20; it lands after 25 in sorted position.
    let moved = h.make_child_of(h.find_value(&40).unwrap(), h.find_value(&20).unwrap());
    print(&h);
    assert_eq!(h.values()[moved], 40);
    assert_eq!(h.parent_of(moved), h.find_value(&20));
    assert_eq!(h.roots().count(), 1);

    // A node cannot move into its own subtree.
    let err = h
        .try_make_child_of(h.find_value(&10).unwrap(), h.find_value(&25).unwrap())
        .unwrap_err();
    println!("rejected: {err}");
    assert!(matches!(err, HierarchyError::Cycle { .. }));

    // Erasing 20 takes 25 and 40 with it.
    let removed = h.erase(h.find_value(&20).unwrap());
    print(&h);
    assert_eq!(removed, 3);
    assert_eq!(h.values(), [10, 30]);
}
