// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keeping caches in step with a hierarchy.
//!
//! Mutations take the caches as a sink. Always-valid caches are patched or rebuilt on every
//! change; deferred caches go stale and are refreshed on demand.
//!
//! Run:
//! - `RUST_LOG=understory_hierarchy=trace cargo run -p understory_examples --example cache_sync`

use tracing_subscriber::EnvFilter;
use understory_hierarchy::{CacheKinds, FlatHierarchy, HierarchyCaches, SyncMode};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut h = FlatHierarchy::<u32>::new();
    let mut live = HierarchyCaches::with_mode(SyncMode::AlwaysValid);
    live.refresh(h.shape(), CacheKinds::all());

    // A root with four chains of three nodes each.
    let root = h.create_root_with(0, &mut live);
    for chain in 1..=4 {
        let mut parent = h.create_child_of_with(root, chain * 100, &mut live);
        for step in 1..3 {
            parent = h.create_child_of_with(parent, chain * 100 + step, &mut live);
        }
    }
    assert!(live.stale(h.shape()).is_empty());
    tracing::info!(nodes = h.len(), max_depth = h.find_max_depth(), "built hierarchy");

    let shape = h.shape();
    let children: Vec<u32> = live
        .next_sibling
        .children(shape, root)
        .map(|c| *h.value(c))
        .collect();
    println!("children of the root: {children:?}");
    assert_eq!(children, [100, 200, 300, 400]);

    let leaf = h.find_value(&302).unwrap();
    let chain = h.find_value(&300).unwrap();
    assert!(live.ancestor.is_ancestor_of(shape, leaf, chain));
    assert_eq!(live.ancestor.parent_of(shape, leaf), h.find_value(&301));
    println!(
        "subtree of 300 spans {} nodes",
        live.last_descendant.subtree_len(shape, chain)
    );

    // Deferred caches only notice the change through their stamps.
    let mut lazy = HierarchyCaches::new();
    lazy.refresh(h.shape(), CacheKinds::all());
    let moved = h.make_child_of_with(
        h.find_value(&400).unwrap(),
        h.find_value(&102).unwrap(),
        &mut lazy,
    );
    println!("stale after move: {:?}", lazy.stale(h.shape()));
    assert_eq!(lazy.stale(h.shape()), CacheKinds::all());
    lazy.refresh(h.shape(), CacheKinds::ANCESTOR);
    assert!(lazy.ancestor.is_ancestor_of(h.shape(), moved, root));
    assert_eq!(lazy.stale(h.shape()), CacheKinds::NEXT_SIBLING | CacheKinds::LAST_DESCENDANT);
}
