// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Hierarchy: a flat, array-backed forest with companion caches.
//!
//! Understory Hierarchy stores a forest of small `Copy` payloads (widget ids, scene handles)
//! as two parallel arrays in preorder: one of depths, one of values. Subtrees are contiguous,
//! so the common structural questions become short scans over a compact depth array, and
//! optional caches turn them into constant-time lookups.
//!
//! - Represents any number of trees with sorted or unsorted siblings.
//! - Creates roots and children, moves subtrees, and erases subtrees in place.
//! - Answers ancestor, parent, child, sibling, and subtree-bound queries linearly or, with a
//!   cache, in O(1).
//!
//! ## Layout
//!
//! A hierarchy of `n` nodes is `depths[0..n]` and `values[0..n]`. The forest is well formed
//! when:
//!
//! - `depths[0] == 0` (the first node is a root),
//! - `depths[i + 1] <= depths[i] + 1` (each step goes down by at most one level),
//! - every depth is below [`Depth::MAX_DEPTH`].
//!
//! The subtree of `i` is `i` followed by the maximal run of nodes deeper than `depths[i]`.
//! Indices are positions, so mutations shift them; every mutation returns the position it
//! produced.
//!
//! ## Caches
//!
//! Caches are separate values that borrow nothing. Each one is built from a [`Shape`] and
//! remembers its [`Stamp`]: the hierarchy's revision and length. Reading a cache whose stamp
//! does not match the hierarchy is a contract violation.
//!
//! - [`AncestorCache`]: `is_ancestor_of`, `ancestor_at_depth`, and `parent_of` in O(1).
//! - [`NextSiblingCache`]: sibling jumps, child counts, `nth_child`.
//! - [`LastDescendantCache`]: subtree bounds in O(1); mutations use it to skip scans.
//! - [`HierarchyCaches`]: all three, with [`CacheKinds`] to report and refresh stale ones.
//!
//! Hand caches to the `*_with` mutations to keep them in step. A cache in
//! [`SyncMode::AlwaysValid`] updates itself inside the mutating call (the ancestor cache
//! patches only the columns the mutation touched); a cache in [`SyncMode::Deferred`] goes
//! stale and is rebuilt when the caller asks.
//!
//! ## Contract checks
//!
//! Misuse such as making a node its own parent, moving a node under its own descendant, or
//! exceeding the maximum depth is checked by [`flat_assert!`] in debug builds and with the
//! `checked` feature. The `try_*` mutations validate the same conditions up front and return
//! a [`HierarchyError`] instead.
//!
//! ## Minimal usage
//!
//! ```
//! use understory_hierarchy::{AncestorCache, FlatHierarchy, SyncMode};
//!
//! // Children are kept sorted by value.
//! let mut h = FlatHierarchy::<u32>::new();
//! let root = h.create_root(0);
//! h.create_child_of(root, 20);
//! let a = h.create_child_of(root, 10);
//! let leaf = h.create_child_of(a, 11);
//! assert_eq!(h.values(), &[0, 10, 11, 20]);
//! assert_eq!(h.depths(), &[0, 1, 2, 1]);
//! assert_eq!(h.last_descendant(root), 3);
//!
//! // O(1) ancestor queries, kept valid across mutations.
//! let mut cache = AncestorCache::with_mode(SyncMode::AlwaysValid);
//! cache.rebuild(h.shape(), None);
//! assert!(cache.is_ancestor_of(h.shape(), leaf, root));
//!
//! // Move `leaf` under the node holding 20.
//! let b = h.find_value(&20).unwrap();
//! let leaf = h.make_child_of_with(leaf, b, &mut cache);
//! assert_eq!(h.values(), &[0, 10, 20, 11]);
//! assert!(cache.is_ancestor_of(h.shape(), leaf, 2));
//! assert!(!cache.is_ancestor_of(h.shape(), leaf, 1));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod assert;
pub mod reduce;
pub mod relocate;

mod ancestor;
mod caches;
mod depth;
mod error;
mod hierarchy;
mod order;
mod sibling;
mod sync;

pub use ancestor::AncestorCache;
pub use caches::{CacheKinds, HierarchyCaches};
pub use depth::{Depth, MAX_MAX_DEPTH};
pub use error::HierarchyError;
pub use hierarchy::{Children, FlatHierarchy, Shape};
pub use order::{Ascending, OrderBy, SiblingOrder, Unordered};
pub use sibling::{BUCKET_BUDGET_BYTES, LastDescendantCache, NextSiblingCache, SiblingJumps};
pub use sync::{CacheSync, Change, Stamp, SyncMode};
