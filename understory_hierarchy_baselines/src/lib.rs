// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Hierarchy Baselines: conventional trees behind one operation contract.
//!
//! These trees exist to check and measure [`understory_hierarchy::FlatHierarchy`] against the
//! layouts it replaces. They are not tuned; they are the straightforward versions.
//!
//! - [`ChildVecTree`]: generational slots, a child vector per node kept in sibling order, and
//!   parent plus left/right sibling links.
//! - [`LinkedTree`]: first-child/next-sibling links in an arena with an O(1) free list.
//! - [`FlatHierarchy`](understory_hierarchy::FlatHierarchy) implements [`TreeContract`] with
//!   plain indices as handles.
//!
//! All three place siblings with the same [`SiblingOrder`](understory_hierarchy::SiblingOrder)
//! policy. Sorted siblings land before the first sibling ordered after them; without sorting,
//! new children go first and new roots go last. Running one script of operations against any
//! of them yields the same [`preorder`] sequence.
//!
//! ```
//! use understory_hierarchy::FlatHierarchy;
//! use understory_hierarchy_baselines::{preorder_values, ChildVecTree, LinkedTree, TreeContract};
//!
//! fn build<T: TreeContract<Value = u32>>(tree: &mut T) {
//!     let root = tree.create_root(0);
//!     tree.create_child(root, 1);
//!     let b = tree.create_child(root, 2);
//!     tree.create_child(b, 3);
//! }
//!
//! let mut flat = FlatHierarchy::<u32>::new();
//! let mut vecs = ChildVecTree::<u32>::new();
//! let mut links = LinkedTree::<u32>::new();
//! build(&mut flat);
//! build(&mut vecs);
//! build(&mut links);
//! let expected = [(0, 0), (1, 1), (1, 2), (2, 3)];
//! assert_eq!(preorder_values(&flat), expected);
//! assert_eq!(preorder_values(&vecs), expected);
//! assert_eq!(preorder_values(&links), expected);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod child_vec;
mod flat;
mod linked;

use alloc::vec::Vec;
use core::fmt::Debug;

pub use child_vec::{ChildVecTree, NodeId};
pub use linked::{LinkId, LinkedTree};

/// Operations every tree in this crate supports.
///
/// Handles are only valid until the next mutation for trees whose handles are positions
/// ([`FlatHierarchy`](understory_hierarchy::FlatHierarchy)); the other trees keep handles stable
/// until the node is erased.
pub trait TreeContract {
    /// Payload stored per node.
    type Value;
    /// Node handle.
    type Handle: Copy + Eq + Debug;

    /// Add a root.
    fn create_root(&mut self, value: Self::Value) -> Self::Handle;

    /// Add a child of `parent`.
    fn create_child(&mut self, parent: Self::Handle, value: Self::Value) -> Self::Handle;

    /// Move `child` and its subtree under `parent`. Returns `child`'s handle afterwards.
    fn reparent(&mut self, child: Self::Handle, parent: Self::Handle) -> Self::Handle;

    /// Remove `node` and its subtree. Returns the number of nodes removed.
    fn erase(&mut self, node: Self::Handle) -> usize;

    /// Every root, in sibling order.
    fn roots(&self) -> Vec<Self::Handle>;

    /// Direct children of `parent`, in sibling order.
    fn children(&self, parent: Self::Handle) -> Vec<Self::Handle>;

    /// The `n`th direct child of `parent`.
    fn nth_child(&self, parent: Self::Handle, n: usize) -> Option<Self::Handle>;

    /// Parent of `node`, or `None` for a root.
    fn parent(&self, node: Self::Handle) -> Option<Self::Handle>;

    /// Payload of `node`.
    fn value(&self, node: Self::Handle) -> &Self::Value;

    /// Number of live nodes.
    fn len(&self) -> usize;

    /// True if there are no nodes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Every node with its depth, in preorder.
pub fn preorder<T: TreeContract + ?Sized>(tree: &T) -> Vec<(usize, T::Handle)> {
    let mut out = Vec::with_capacity(tree.len());
    let mut stack: Vec<(usize, T::Handle)> =
        tree.roots().into_iter().rev().map(|r| (0, r)).collect();
    while let Some((depth, node)) = stack.pop() {
        out.push((depth, node));
        stack.extend(
            tree.children(node)
                .into_iter()
                .rev()
                .map(|c| (depth + 1, c)),
        );
    }
    out
}

/// Every node's depth and payload, in preorder.
pub fn preorder_values<T>(tree: &T) -> Vec<(usize, T::Value)>
where
    T: TreeContract + ?Sized,
    T::Value: Copy,
{
    preorder(tree)
        .into_iter()
        .map(|(depth, node)| (depth, *tree.value(node)))
        .collect()
}

/// True if `descendant` lies strictly below `ancestor`, found by walking parents.
pub fn is_ancestor_of<T: TreeContract + ?Sized>(
    tree: &T,
    ancestor: T::Handle,
    descendant: T::Handle,
) -> bool {
    let mut current = tree.parent(descendant);
    while let Some(node) = current {
        if node == ancestor {
            return true;
        }
        current = tree.parent(node);
    }
    false
}
