// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! O(1) ancestor queries.
//!
//! The cache is a table with one row per depth that can own descendants and one column per
//! node. Cell `[d][i]` counts how many consecutive nodes ending at `i` are deeper than `d`:
//!
//! ```text
//! cell[d][0] = 0
//! cell[d][i] = cell[d][i - 1] + 1   if depth[i] > d
//!            = 0                    otherwise
//! ```
//!
//! Walking back `cell[d][i]` steps from `i` lands on the nearest node at depth `d` before `i`
//! whose subtree still contains `i`. So `a` is an ancestor of `i` exactly when
//! `i - a == cell[depth[a]][i]`.
//!
//! Rows live in pooled buffers sized to a power-of-two column capacity. Adding rows only
//! allocates a new pooled buffer; adding columns re-lays out every row and invalidates the
//! cache.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;

use crate::depth::Depth;
use crate::flat_assert;
use crate::hierarchy::Shape;
use crate::sync::{CacheSync, Change, Stamp, SyncMode};

/// Cells worth of slack rows added to every row allocation.
const SLACK_CELLS: usize = 1024;

#[derive(Clone, Copy, Debug)]
struct RowSlot {
    buffer: usize,
    offset: usize,
}

/// Table answering ancestor queries for one hierarchy in O(1).
///
/// Build it with [`rebuild`](Self::rebuild). Reads assert that the cache matches the
/// hierarchy's current [`Shape`]; see [`SyncMode`] for keeping it current across mutations.
#[derive(Clone, Default)]
pub struct AncestorCache {
    buffers: Vec<Box<[u32]>>,
    rows: Vec<RowSlot>,
    column_capacity: usize,
    /// Rows holding computed cells; every cell outside `rows_in_use x columns_in_use` is zero.
    rows_in_use: usize,
    columns_in_use: usize,
    stamp: Option<Stamp>,
    mode: SyncMode,
}

impl core::fmt::Debug for AncestorCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AncestorCache")
            .field("rows", &self.rows_in_use)
            .field("columns", &self.columns_in_use)
            .field("row_capacity", &self.rows.len())
            .field("column_capacity", &self.column_capacity)
            .field("buffers", &self.buffers.len())
            .field("stamp", &self.stamp)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl AncestorCache {
    /// Create an empty, invalid cache in [`SyncMode::Deferred`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache with room for `rows` depths and `columns` nodes.
    pub fn with_capacity(rows: usize, columns: usize) -> Self {
        let mut cache = Self::new();
        cache.reserve(rows, columns);
        cache
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

    /// Change the synchronization mode.
    pub fn set_mode(&mut self, mode: SyncMode) {
        self.mode = mode;
    }

    /// Number of allocated rows.
    pub fn row_capacity(&self) -> usize {
        self.rows.len()
    }

    /// Number of allocated columns per row, always zero or a power of two.
    pub fn column_capacity(&self) -> usize {
        self.column_capacity
    }

    /// True if the cache was built for exactly this shape.
    pub fn is_valid<D: Depth>(&self, shape: Shape<'_, D>) -> bool {
        self.stamp == Some(shape.stamp())
    }

    /// Mark the cache as stale.
    pub fn invalidate(&mut self) {
        self.stamp = None;
    }

    /// Make room for `rows` depths and `columns` nodes.
    ///
    /// Growing rows keeps the cache valid. Growing columns lays every row out again with the
    /// column capacity rounded up to a power of two, which invalidates the cache. Pooled
    /// buffers that still hold at least one row of the new width are zeroed and carved into
    /// rows again; smaller ones are freed, and only the rows still missing are allocated.
    pub fn reserve(&mut self, rows: usize, columns: usize) {
        if columns > self.column_capacity {
            let rows = rows.max(self.rows.len());
            let column_capacity = columns.next_power_of_two();
            let pooled = self.buffers.len();
            self.buffers.retain(|b| b.len() >= column_capacity);
            tracing::debug!(
                rows,
                old_columns = self.column_capacity,
                new_columns = column_capacity,
                recycled = self.buffers.len(),
                freed = pooled - self.buffers.len(),
                "ancestor cache columns grew; cache invalidated"
            );
            self.column_capacity = column_capacity;
            self.rows.clear();
            for (buffer, cells) in self.buffers.iter_mut().enumerate() {
                cells.fill(0);
                let count = cells.len() / column_capacity;
                self.rows.extend((0..count).map(|r| RowSlot {
                    buffer,
                    offset: r * column_capacity,
                }));
            }
            self.rows_in_use = 0;
            self.columns_in_use = 0;
            self.stamp = None;
            self.grow_rows(rows);
        } else if rows > self.rows.len() {
            self.grow_rows(rows);
        }
    }

    fn grow_rows(&mut self, rows: usize) {
        let Some(missing) = rows.checked_sub(self.rows.len()).filter(|&m| m > 0) else {
            return;
        };
        let slack = SLACK_CELLS.checked_div(self.column_capacity).unwrap_or(0);
        let count = missing + slack;
        let buffer = self.buffers.len();
        self.buffers
            .push(vec![0; count * self.column_capacity].into_boxed_slice());
        let columns = self.column_capacity;
        self.rows.extend((0..count).map(|r| RowSlot {
            buffer,
            offset: r * columns,
        }));
    }

    #[inline]
    fn row(&self, depth: usize) -> &[u32] {
        let slot = self.rows[depth];
        &self.buffers[slot.buffer][slot.offset..slot.offset + self.column_capacity]
    }

    #[inline]
    fn row_mut(&mut self, depth: usize) -> &mut [u32] {
        let slot = self.rows[depth];
        &mut self.buffers[slot.buffer][slot.offset..slot.offset + self.column_capacity]
    }

    /// Run the recurrence for row `depth` over `start..end`.
    fn fill_row<D: Depth>(&mut self, depth: usize, depths: &[D], start: usize, end: usize) {
        let row = self.row_mut(depth);
        let mut run = if start == 0 { 0 } else { row[start - 1] };
        for (i, &d) in depths[..end].iter().enumerate().skip(start) {
            run = if i > 0 && d.to_usize() > depth {
                run + 1
            } else {
                0
            };
            row[i] = run;
        }
    }

    fn check_columns<D: Depth>(shape: Shape<'_, D>) {
        flat_assert!(
            u32::try_from(shape.len()).is_ok(),
            "{} nodes exceed the ancestor cache's u32 cells",
            shape.len()
        );
    }

    /// Recompute the whole table for `shape`. O(max depth x node count).
    ///
    /// `max_depth`, when supplied, must equal the shape's real maximum depth; it saves the
    /// reduction in unchecked builds.
    pub fn rebuild<D: Depth>(&mut self, shape: Shape<'_, D>, max_depth: Option<D>) {
        let max_depth = match max_depth {
            Some(max) => {
                flat_assert!(
                    max == shape.max_depth(),
                    "supplied max depth {max:?} differs from the real {:?}",
                    shape.max_depth()
                );
                max
            }
            None => shape.max_depth(),
        };
        Self::check_columns(shape);
        let rows = max_depth.to_usize();
        let columns = shape.len();
        self.reserve(rows, columns);
        for depth in 0..rows {
            self.fill_row(depth, shape.depths(), 0, columns);
        }
        self.clear_outside(rows, columns);
        self.rows_in_use = rows;
        self.columns_in_use = columns;
        self.stamp = Some(shape.stamp());
        tracing::debug!(rows, columns, "rebuilt ancestor cache");
    }

    /// Bring a table that was valid before a localized mutation up to date with `shape`.
    ///
    /// Columns before `start` must be unchanged by the mutation, and so must the cells at and
    /// after `end` (clamped to the node count). Rows that were computed before are re-run over
    /// `start..end`; rows the new maximum depth adds are computed in full; columns past the new
    /// node count are cleared. Falls back to [`rebuild`](Self::rebuild) when the column
    /// capacity has to grow.
    pub fn patch<D: Depth>(&mut self, shape: Shape<'_, D>, start: usize, end: usize) {
        Self::check_columns(shape);
        let columns = shape.len();
        if columns > self.column_capacity {
            self.rebuild(shape, None);
            return;
        }
        let end = end.min(columns);
        let start = start.min(end);
        let old_rows = self.rows_in_use;
        let new_rows = shape.max_depth().to_usize();
        self.reserve(new_rows, columns);
        for depth in 0..old_rows {
            self.fill_row(depth, shape.depths(), start, end);
        }
        for depth in old_rows..new_rows {
            self.fill_row(depth, shape.depths(), 0, columns);
        }
        let rows = old_rows.max(new_rows);
        self.clear_outside(rows, columns);
        self.rows_in_use = rows;
        self.columns_in_use = columns;
        self.stamp = Some(shape.stamp());
        tracing::trace!(start, end, rows, columns, "patched ancestor cache");
    }

    /// Zero every computed cell at or beyond `row_bound` rows or `column_bound` columns.
    pub fn clear_outside(&mut self, row_bound: usize, column_bound: usize) {
        let dirty_columns = self.columns_in_use;
        for depth in 0..self.rows_in_use {
            let row = self.row_mut(depth);
            if depth >= row_bound {
                row[..dirty_columns].fill(0);
            } else if column_bound < dirty_columns {
                row[column_bound..dirty_columns].fill(0);
            }
        }
        self.rows_in_use = self.rows_in_use.min(row_bound);
        self.columns_in_use = self.columns_in_use.min(column_bound);
    }

    fn assert_valid<D: Depth>(&self, shape: Shape<'_, D>) {
        flat_assert!(
            self.is_valid(shape),
            "stale ancestor cache: built for {:?}, hierarchy is at {:?}",
            self.stamp,
            shape.stamp()
        );
    }

    /// True if `descendant` lies strictly inside `ancestor`'s subtree. O(1).
    pub fn is_ancestor_of<D: Depth>(
        &self,
        shape: Shape<'_, D>,
        descendant: usize,
        ancestor: usize,
    ) -> bool {
        self.assert_valid(shape);
        if descendant <= ancestor || descendant >= shape.len() {
            return false;
        }
        let row = shape.depth(ancestor).to_usize();
        if row >= self.rows_in_use {
            return false;
        }
        self.row(row)[descendant] as usize == descendant - ancestor
    }

    /// The ancestor of `node` at `depth`, or `None` if `depth` is not above `node`.
    pub fn ancestor_at_depth<D: Depth>(
        &self,
        shape: Shape<'_, D>,
        node: usize,
        depth: D,
    ) -> Option<usize> {
        self.assert_valid(shape);
        if depth >= shape.depth(node) {
            return None;
        }
        let distance = self.row(depth.to_usize())[node] as usize;
        Some(node - distance)
    }

    /// Parent of `node`, or `None` for a root.
    pub fn parent_of<D: Depth>(&self, shape: Shape<'_, D>, node: usize) -> Option<usize> {
        let depth = shape.depth(node);
        if depth == D::ZERO {
            self.assert_valid(shape);
            return None;
        }
        self.ancestor_at_depth(shape, node, depth.wrapping_sub(D::ONE))
    }
}

impl<D: Depth> CacheSync<D> for AncestorCache {
    fn after_change(&mut self, shape: Shape<'_, D>, change: Change) {
        if self.mode != SyncMode::AlwaysValid {
            return;
        }
        if self.stamp == Some(change.before) {
            self.patch(shape, change.first_dirty, shape.len());
        } else {
            self.rebuild(shape, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::FlatHierarchy;
    use crate::order::Unordered;

    fn sample() -> FlatHierarchy<u32, u8, Unordered> {
        // 0
        // +-1
        // | +-2
        // | | +-3
        // | +-4
        // +-5
        // 6
        // +-7
        let mut h = FlatHierarchy::new();
        let r = h.create_root(0);
        h.create_root(6);
        h.create_child_of(1, 7);
        h.create_child_of(r, 5);
        h.create_child_of(r, 1);
        h.create_child_of(1, 4);
        h.create_child_of(1, 2);
        h.create_child_of(2, 3);
        assert_eq!(h.values(), &[0, 1, 2, 3, 4, 5, 6, 7]);
        h
    }

    fn assert_agrees(h: &FlatHierarchy<u32, u8, Unordered>, cache: &AncestorCache) {
        let shape = h.shape();
        for a in 0..h.len() {
            for d in 0..h.len() {
                assert_eq!(
                    cache.is_ancestor_of(shape, d, a),
                    shape.is_ancestor_of(a, d),
                    "is {d} under {a}?"
                );
            }
            assert_eq!(cache.parent_of(shape, a), shape.parent_of(a));
        }
    }

    #[test]
    fn rebuild_matches_linear_answers() {
        let h = sample();
        let mut cache = AncestorCache::new();
        assert!(!cache.is_valid(h.shape()));
        cache.rebuild(h.shape(), None);
        assert!(cache.is_valid(h.shape()));
        assert_agrees(&h, &cache);
        assert!(cache.is_ancestor_of(h.shape(), 3, 0));
        assert!(!cache.is_ancestor_of(h.shape(), 5, 1));
        assert!(!cache.is_ancestor_of(h.shape(), 7, 0));
    }

    #[test]
    fn ancestor_at_depth_walks_up() {
        let h = sample();
        let mut cache = AncestorCache::new();
        cache.rebuild(h.shape(), Some(3));
        let shape = h.shape();
        assert_eq!(cache.ancestor_at_depth(shape, 3, 0), Some(0));
        assert_eq!(cache.ancestor_at_depth(shape, 3, 1), Some(1));
        assert_eq!(cache.ancestor_at_depth(shape, 3, 2), Some(2));
        assert_eq!(cache.ancestor_at_depth(shape, 3, 3), None);
        assert_eq!(cache.parent_of(shape, 7), Some(6));
        assert_eq!(cache.parent_of(shape, 6), None);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let h = sample();
        let mut cache = AncestorCache::new();
        cache.rebuild(h.shape(), None);
        let first: Vec<Vec<u32>> = (0..3).map(|d| cache.row(d)[..h.len()].to_vec()).collect();
        cache.rebuild(h.shape(), None);
        let second: Vec<Vec<u32>> = (0..3).map(|d| cache.row(d)[..h.len()].to_vec()).collect();
        assert_eq!(first, second);
        assert_eq!(first[0], [0, 1, 2, 3, 4, 5, 0, 1]);
        assert_eq!(first[1], [0, 0, 1, 2, 3, 0, 0, 0]);
        assert_eq!(first[2], [0, 0, 0, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn always_valid_cache_follows_mutations() {
        let mut h = sample();
        let mut cache = AncestorCache::with_mode(SyncMode::AlwaysValid);
        cache.rebuild(h.shape(), None);

        let leaf = h.create_child_of_with(3, 8, &mut cache);
        assert!(cache.is_valid(h.shape()));
        assert_eq!(h.depth(leaf), 4);
        assert_agrees(&h, &cache);

        let seven = h.find_value(&7).unwrap();
        let moved = h.make_child_of_with(2, seven, &mut cache);
        assert!(cache.is_valid(h.shape()));
        assert_eq!(h.parent_of(moved).map(|p| *h.value(p)), Some(7));
        assert_agrees(&h, &cache);

        h.erase_with(0, &mut cache);
        assert!(cache.is_valid(h.shape()));
        assert_agrees(&h, &cache);

        h.create_root_with(9, &mut cache);
        assert_agrees(&h, &cache);
    }

    #[test]
    fn deferred_cache_goes_stale() {
        let mut h = sample();
        let mut cache = AncestorCache::new();
        cache.rebuild(h.shape(), None);
        h.erase_with(1, &mut cache);
        assert!(!cache.is_valid(h.shape()));
        cache.rebuild(h.shape(), None);
        assert_agrees(&h, &cache);
    }

    #[test]
    #[cfg_attr(not(any(debug_assertions, feature = "checked")), ignore)]
    #[should_panic(expected = "stale ancestor cache")]
    fn stale_read_is_rejected() {
        let mut h = sample();
        let mut cache = AncestorCache::new();
        cache.rebuild(h.shape(), None);
        h.erase(1);
        cache.is_ancestor_of(h.shape(), 2, 0);
    }

    #[test]
    fn row_growth_keeps_cache_valid() {
        let h = sample();
        let mut cache = AncestorCache::new();
        cache.rebuild(h.shape(), None);
        assert_eq!(cache.column_capacity(), 8);
        let rows = cache.row_capacity();
        cache.reserve(rows + 1, 8);
        assert!(cache.row_capacity() > rows);
        assert!(cache.is_valid(h.shape()));
        assert_agrees(&h, &cache);
    }

    #[test]
    fn column_growth_invalidates() {
        let h = sample();
        let mut cache = AncestorCache::with_capacity(2, 3);
        assert_eq!(cache.column_capacity(), 4);
        cache.rebuild(h.shape(), None);
        cache.reserve(3, 9);
        assert_eq!(cache.column_capacity(), 16);
        assert!(!cache.is_valid(h.shape()));
    }

    #[test]
    fn column_growth_recycles_large_enough_buffers() {
        let mut cache = AncestorCache::with_capacity(2, 4);
        cache.reserve(300, 4);
        assert_eq!(cache.buffers.len(), 2);
        let pooled: Vec<*const u32> = cache.buffers.iter().map(|b| b.as_ptr()).collect();

        // Both buffers hold more than one 8-cell row, so both are carved again.
        cache.reserve(300, 8);
        assert_eq!(cache.column_capacity(), 8);
        assert!(cache.row_capacity() >= 300);
        assert_eq!(cache.buffers[0].as_ptr(), pooled[0]);
        assert_eq!(cache.buffers[1].as_ptr(), pooled[1]);
        assert_eq!(cache.buffers.len(), 3, "only the missing rows are allocated");
        assert!(cache.buffers.iter().all(|b| b.iter().all(|&c| c == 0)));

        // The recycled rows serve a real table.
        let h = sample();
        cache.rebuild(h.shape(), None);
        assert_eq!(cache.column_capacity(), 8);
        assert_agrees(&h, &cache);

        // Rows wider than every buffer leave a single fresh allocation.
        cache.reserve(4, 4096);
        assert_eq!(cache.buffers.len(), 1);
        assert!(!cache.is_valid(h.shape()));
    }

    #[test]
    fn bounded_patch_matches_rebuild() {
        // 0
        // +-1
        // | +-2      2 moves up beside 1 in the second shape
        // +-3
        // 4
        // +-5
        let before = [0_u8, 1, 2, 1, 0, 1];
        let after = [0_u8, 1, 1, 1, 0, 1];
        let mut cache = AncestorCache::with_mode(SyncMode::AlwaysValid);
        cache.rebuild(Shape::new(&before, 1), None);

        let shape = Shape::new(&after, 2);
        cache.patch(shape, 2, 3);
        assert!(cache.is_valid(shape));
        let mut fresh = AncestorCache::new();
        fresh.rebuild(shape, None);
        for a in 0..after.len() {
            for d in 0..after.len() {
                assert_eq!(
                    cache.is_ancestor_of(shape, d, a),
                    fresh.is_ancestor_of(shape, d, a),
                    "is {d} under {a}?"
                );
            }
        }
        assert_eq!(cache.parent_of(shape, 2), Some(0));

        // An end past the node count is clamped.
        let shape = Shape::new(&before, 3);
        cache.patch(shape, 0, usize::MAX);
        assert!(cache.is_ancestor_of(shape, 2, 1));
        assert_eq!(cache.parent_of(shape, 5), Some(4));
    }

    #[test]
    fn clear_outside_zeroes_dropped_columns() {
        let mut h = sample();
        let mut cache = AncestorCache::with_mode(SyncMode::AlwaysValid);
        cache.rebuild(h.shape(), None);
        h.erase_with(6, &mut cache);
        assert_eq!(h.len(), 6);
        for depth in 0..cache.rows_in_use {
            assert!(cache.row(depth)[6..].iter().all(|&c| c == 0));
        }
    }
}
