// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A bundle of every cache, synchronized together.

use crate::ancestor::AncestorCache;
use crate::depth::Depth;
use crate::hierarchy::Shape;
use crate::sibling::{LastDescendantCache, NextSiblingCache};
use crate::sync::{CacheSync, Change, SyncMode};

bitflags::bitflags! {
    /// Selects caches in a [`HierarchyCaches`] bundle.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct CacheKinds: u8 {
        /// The [`AncestorCache`].
        const ANCESTOR        = 0b0000_0001;
        /// The [`NextSiblingCache`].
        const NEXT_SIBLING    = 0b0000_0010;
        /// The [`LastDescendantCache`].
        const LAST_DESCENDANT = 0b0000_0100;
    }
}

impl Default for CacheKinds {
    fn default() -> Self {
        Self::all()
    }
}

/// All three caches for one hierarchy.
///
/// Pass `&mut caches` to the `*_with` mutations; the bundle forwards every change to each
/// cache and serves subtree bounds from the last-descendant cache while it is valid.
///
/// ```
/// use understory_hierarchy::{CacheKinds, FlatHierarchy, HierarchyCaches, SyncMode};
///
/// let mut h = FlatHierarchy::<u32>::new();
/// let mut caches = HierarchyCaches::with_mode(SyncMode::Deferred);
/// let root = h.create_root_with(1, &mut caches);
/// h.create_child_of_with(root, 2, &mut caches);
/// assert_eq!(caches.stale(h.shape()), CacheKinds::all());
///
/// caches.refresh(h.shape(), CacheKinds::ANCESTOR | CacheKinds::NEXT_SIBLING);
/// assert_eq!(caches.stale(h.shape()), CacheKinds::LAST_DESCENDANT);
/// assert!(caches.ancestor.is_ancestor_of(h.shape(), 1, root));
/// ```
#[derive(Clone, Debug, Default)]
pub struct HierarchyCaches {
    /// O(1) ancestor queries.
    pub ancestor: AncestorCache,
    /// Sibling jumps.
    pub next_sibling: NextSiblingCache,
    /// Subtree bounds.
    pub last_descendant: LastDescendantCache,
}

impl HierarchyCaches {
    /// Create empty, invalid caches in [`SyncMode::Deferred`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create empty caches that all use `mode`.
    pub fn with_mode(mode: SyncMode) -> Self {
        Self {
            ancestor: AncestorCache::with_mode(mode),
            next_sibling: NextSiblingCache::with_mode(mode),
            last_descendant: LastDescendantCache::with_mode(mode),
        }
    }

    /// Which caches do not match `shape`.
    pub fn stale<D: Depth>(&self, shape: Shape<'_, D>) -> CacheKinds {
        let mut kinds = CacheKinds::empty();
        kinds.set(CacheKinds::ANCESTOR, !self.ancestor.is_valid(shape));
        kinds.set(CacheKinds::NEXT_SIBLING, !self.next_sibling.is_valid(shape));
        kinds.set(
            CacheKinds::LAST_DESCENDANT,
            !self.last_descendant.is_valid(shape),
        );
        kinds
    }

    /// Rebuild the stale caches among `kinds`. Returns the caches that were rebuilt.
    pub fn refresh<D: Depth>(&mut self, shape: Shape<'_, D>, kinds: CacheKinds) -> CacheKinds {
        let rebuilt = self.stale(shape) & kinds;
        if rebuilt.contains(CacheKinds::ANCESTOR) {
            self.ancestor.rebuild(shape, None);
        }
        if rebuilt.contains(CacheKinds::NEXT_SIBLING) {
            self.next_sibling.rebuild(shape);
        }
        if rebuilt.contains(CacheKinds::LAST_DESCENDANT) {
            self.last_descendant.rebuild(shape);
        }
        rebuilt
    }

    /// Mark every cache as stale.
    pub fn invalidate(&mut self) {
        self.ancestor.invalidate();
        self.next_sibling.invalidate();
        self.last_descendant.invalidate();
    }
}

impl<D: Depth> CacheSync<D> for HierarchyCaches {
    fn after_change(&mut self, shape: Shape<'_, D>, change: Change) {
        self.ancestor.after_change(shape, change);
        self.next_sibling.after_change(shape, change);
        self.last_descendant.after_change(shape, change);
    }

    fn last_descendant_hint(&self, shape: Shape<'_, D>, node: usize) -> Option<usize> {
        self.last_descendant.last_descendant_hint(shape, node)
    }
}
