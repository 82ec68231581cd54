// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cache synchronization seam used by the `*_with` mutations.
//!
//! Caches are companions, not owners: a hierarchy never holds its caches. A mutation that is
//! handed caches calls [`CacheSync::after_change`] once the arrays are updated; each cache then
//! either patches itself (when it runs in [`SyncMode::AlwaysValid`]) or stays stale until the
//! caller rebuilds it. Staleness is detected through [`Stamp`]s, so a cache that was not handed
//! to a mutation at all is refused on its next read.

use crate::depth::Depth;
use crate::hierarchy::Shape;

/// How a cache reacts to a mutation it is handed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SyncMode {
    /// Become stale; the caller pays for a full rebuild later.
    #[default]
    Deferred,
    /// Patch in the mutating call so reads stay valid.
    AlwaysValid,
}

/// A completed structural mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Change {
    /// Stamp of the hierarchy before the mutation.
    pub before: Stamp,
    /// Indices below this one kept their depth and position.
    pub first_dirty: usize,
}

/// Identifies one state of a hierarchy: its revision plus its length.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Stamp {
    /// Structural revision.
    pub revision: u64,
    /// Node count at that revision.
    pub len: usize,
}

impl<D: Depth> From<Shape<'_, D>> for Stamp {
    fn from(shape: Shape<'_, D>) -> Self {
        shape.stamp()
    }
}

/// Something that must be kept consistent with a hierarchy's depths.
pub trait CacheSync<D: Depth> {
    /// Called after a structural mutation with the post-mutation shape.
    fn after_change(&mut self, shape: Shape<'_, D>, change: Change);

    /// Last descendant of `node` in `shape`, if this cache can answer in O(1).
    ///
    /// Mutations use this to find subtree bounds without scanning.
    fn last_descendant_hint(&self, shape: Shape<'_, D>, node: usize) -> Option<usize> {
        let _ = (shape, node);
        None
    }
}

impl<D: Depth> CacheSync<D> for () {
    #[inline]
    fn after_change(&mut self, _shape: Shape<'_, D>, _change: Change) {}
}

impl<D: Depth, T: CacheSync<D> + ?Sized> CacheSync<D> for &mut T {
    fn after_change(&mut self, shape: Shape<'_, D>, change: Change) {
        (**self).after_change(shape, change);
    }

    fn last_descendant_hint(&self, shape: Shape<'_, D>, node: usize) -> Option<usize> {
        (**self).last_descendant_hint(shape, node)
    }
}

impl<D: Depth, A: CacheSync<D>, B: CacheSync<D>> CacheSync<D> for (A, B) {
    fn after_change(&mut self, shape: Shape<'_, D>, change: Change) {
        self.0.after_change(shape, change);
        self.1.after_change(shape, change);
    }

    fn last_descendant_hint(&self, shape: Shape<'_, D>, node: usize) -> Option<usize> {
        self.0
            .last_descendant_hint(shape, node)
            .or_else(|| self.1.last_descendant_hint(shape, node))
    }
}

impl<D: Depth, A: CacheSync<D>, B: CacheSync<D>, C: CacheSync<D>> CacheSync<D> for (A, B, C) {
    fn after_change(&mut self, shape: Shape<'_, D>, change: Change) {
        self.0.after_change(shape, change);
        self.1.after_change(shape, change);
        self.2.after_change(shape, change);
    }

    fn last_descendant_hint(&self, shape: Shape<'_, D>, node: usize) -> Option<usize> {
        self.0
            .last_descendant_hint(shape, node)
            .or_else(|| self.1.last_descendant_hint(shape, node))
            .or_else(|| self.2.last_descendant_hint(shape, node))
    }
}
