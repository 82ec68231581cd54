// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Next-sibling and last-descendant caches.
//!
//! Both are flat arrays with one entry per node, rebuilt by backward sweeps over the depth
//! array. A sweep tracks state per depth, but only for a window of
//! `BUCKET_BUDGET_BYTES / size_of::<usize>()` depths at a time, so the scratch memory stays
//! fixed no matter how deep the hierarchy is. Deeper hierarchies take one sweep per window.

use alloc::vec::Vec;

use crate::depth::Depth;
use crate::flat_assert;
use crate::hierarchy::Shape;
use crate::sync::{CacheSync, Change, Stamp, SyncMode};

/// Stack budget for the per-depth state of one sweep.
pub const BUCKET_BUDGET_BYTES: usize = 4096;

/// Depths handled by one sweep.
const WINDOW: usize = BUCKET_BUDGET_BYTES / size_of::<usize>();

/// Sentinel stored for "no such node".
const NOT_FOUND: usize = usize::MAX;

#[inline]
fn window_slot(depth: usize, base: usize) -> Option<usize> {
    depth.checked_sub(base).filter(|&k| k < WINDOW)
}

/// Nearest following sibling of every node.
#[derive(Clone, Debug, Default)]
pub struct NextSiblingCache {
    next: Vec<usize>,
    stamp: Option<Stamp>,
    mode: SyncMode,
}

impl NextSiblingCache {
    /// Create an empty, invalid cache in [`SyncMode::Deferred`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache using `mode`.
    pub fn with_mode(mode: SyncMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// How this cache reacts to mutations it is handed.
    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    /// True if the cache was built for exactly this shape.
    pub fn is_valid<D: Depth>(&self, shape: Shape<'_, D>) -> bool {
        self.stamp == Some(shape.stamp())
    }

    /// Mark the cache as stale.
    pub fn invalidate(&mut self) {
        self.stamp = None;
    }

    /// Recompute every entry. O(node count x windows).
    pub fn rebuild<D: Depth>(&mut self, shape: Shape<'_, D>) {
        let depths = shape.depths();
        let len = depths.len();
        self.next.clear();
        self.next.resize(len, NOT_FOUND);

        let max_depth = shape.max_depth().to_usize();
        let mut bucket = [NOT_FOUND; WINDOW];
        let mut base = 0;
        let mut sweeps = 0;
        while len > 0 && base <= max_depth {
            bucket.fill(NOT_FOUND);
            for i in (0..len).rev() {
                let depth = depths[i].to_usize();
                // `i` starts a new parent for everything one level below it.
                if let Some(k) = window_slot(depth + 1, base) {
                    bucket[k] = NOT_FOUND;
                }
                if let Some(k) = window_slot(depth, base) {
                    self.next[i] = bucket[k];
                    bucket[k] = i;
                }
            }
            base += WINDOW;
            sweeps += 1;
        }
        self.stamp = Some(shape.stamp());
        tracing::debug!(len, sweeps, "rebuilt next-sibling cache");
    }

    /// Rebuild only if stale. Returns true if a rebuild happened.
    pub fn rebuild_if_stale<D: Depth>(&mut self, shape: Shape<'_, D>) -> bool {
        if self.is_valid(shape) {
            return false;
        }
        self.rebuild(shape);
        true
    }

    fn assert_valid<D: Depth>(&self, shape: Shape<'_, D>) {
        flat_assert!(
            self.is_valid(shape),
            "stale next-sibling cache: built for {:?}, hierarchy is at {:?}",
            self.stamp,
            shape.stamp()
        );
    }

    /// The next node with the same parent as `node`.
    pub fn next_sibling<D: Depth>(&self, shape: Shape<'_, D>, node: usize) -> Option<usize> {
        self.assert_valid(shape);
        let next = self.next[node];
        (next != NOT_FOUND).then_some(next)
    }

    /// Direct children of `parent`, found by sibling jumps.
    pub fn children<'a, D: Depth>(
        &'a self,
        shape: Shape<'_, D>,
        parent: usize,
    ) -> SiblingJumps<'a> {
        self.assert_valid(shape);
        let first = parent + 1;
        let next = (first < shape.len()
            && shape.depth(first) > shape.depth(parent))
        .then_some(first);
        SiblingJumps {
            next_sibling: &self.next,
            next,
        }
    }

    /// Number of direct children of `parent`. O(children).
    pub fn count_direct_children<D: Depth>(&self, shape: Shape<'_, D>, parent: usize) -> usize {
        self.children(shape, parent).count()
    }

    /// The `n`th direct child of `parent`. O(n).
    pub fn nth_child<D: Depth>(
        &self,
        shape: Shape<'_, D>,
        parent: usize,
        n: usize,
    ) -> Option<usize> {
        self.children(shape, parent).nth(n)
    }
}

impl<D: Depth> CacheSync<D> for NextSiblingCache {
    fn after_change(&mut self, shape: Shape<'_, D>, _change: Change) {
        if self.mode == SyncMode::AlwaysValid {
            self.rebuild(shape);
        }
    }
}

/// Iterator over a chain of siblings. See [`NextSiblingCache::children`].
#[derive(Clone, Debug)]
pub struct SiblingJumps<'a> {
    next_sibling: &'a [usize],
    next: Option<usize>,
}

impl Iterator for SiblingJumps<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        let next = self.next_sibling[current];
        self.next = (next != NOT_FOUND).then_some(next);
        Some(current)
    }
}

/// Last descendant of every node.
#[derive(Clone, Debug, Default)]
pub struct LastDescendantCache {
    last: Vec<usize>,
    stamp: Option<Stamp>,
    mode: SyncMode,
}

impl LastDescendantCache {
    /// Create an empty, invalid cache in [`SyncMode::Deferred`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache using `mode`.
    pub fn with_mode(mode: SyncMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// How this cache reacts to mutations it is handed.
    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    /// True if the cache was built for exactly this shape.
    pub fn is_valid<D: Depth>(&self, shape: Shape<'_, D>) -> bool {
        self.stamp == Some(shape.stamp())
    }

    /// Mark the cache as stale.
    pub fn invalidate(&mut self) {
        self.stamp = None;
    }

    /// Recompute every entry.
    ///
    /// Within a window, `w[k]` holds the nearest index seen so far whose depth is at most
    /// `base + k`. Entries at or above `top` are all equal to `top_index` and are only
    /// written out when a deeper node needs them, which keeps each sweep linear.
    pub fn rebuild<D: Depth>(&mut self, shape: Shape<'_, D>) {
        let depths = shape.depths();
        let len = depths.len();
        self.last.clear();
        self.last.resize(len, NOT_FOUND);

        let max_depth = shape.max_depth().to_usize();
        let mut w = [len; WINDOW];
        let mut base = 0;
        let mut sweeps = 0;
        while len > 0 && base <= max_depth {
            let mut top = 0;
            let mut top_index = len;
            // Nearest index seen so far with a depth below the window.
            let mut below = len;
            for i in (0..len).rev() {
                let depth = depths[i].to_usize();
                if depth < base {
                    below = i;
                    continue;
                }
                let Some(k) = window_slot(depth, base) else {
                    continue;
                };
                let end = if k >= top { top_index } else { w[k] };
                self.last[i] = end.min(below) - 1;
                if k > top {
                    w[top..k].fill(top_index);
                }
                top = k;
                top_index = i;
            }
            base += WINDOW;
            sweeps += 1;
        }
        self.stamp = Some(shape.stamp());
        tracing::debug!(len, sweeps, "rebuilt last-descendant cache");
    }

    /// Rebuild only if stale. Returns true if a rebuild happened.
    pub fn rebuild_if_stale<D: Depth>(&mut self, shape: Shape<'_, D>) -> bool {
        if self.is_valid(shape) {
            return false;
        }
        self.rebuild(shape);
        true
    }

    /// Last node in `node`'s subtree; `node` itself for a leaf. O(1).
    pub fn last_descendant<D: Depth>(&self, shape: Shape<'_, D>, node: usize) -> usize {
        flat_assert!(
            self.is_valid(shape),
            "stale last-descendant cache: built for {:?}, hierarchy is at {:?}",
            self.stamp,
            shape.stamp()
        );
        self.last[node]
    }

    /// Number of nodes in `node`'s subtree, counting `node`.
    pub fn subtree_len<D: Depth>(&self, shape: Shape<'_, D>, node: usize) -> usize {
        self.last_descendant(shape, node) - node + 1
    }
}

impl<D: Depth> CacheSync<D> for LastDescendantCache {
    fn after_change(&mut self, shape: Shape<'_, D>, _change: Change) {
        if self.mode == SyncMode::AlwaysValid {
            self.rebuild(shape);
        }
    }

    fn last_descendant_hint(&self, shape: Shape<'_, D>, node: usize) -> Option<usize> {
        self.is_valid(shape).then(|| self.last[node])
    }
}
