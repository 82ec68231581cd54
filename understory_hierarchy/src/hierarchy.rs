// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The flat hierarchy: structure, mutations, and linear queries.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::depth::Depth;
use crate::error::HierarchyError;
use crate::flat_assert;
use crate::order::{Ascending, SiblingOrder};
use crate::reduce;
use crate::relocate::relocate;
use crate::sync::{CacheSync, Change, Stamp};

/// A forest stored as two parallel arrays in preorder.
///
/// Node `i` has depth `depths()[i]` and payload `values()[i]`. The subtree of `i` is the
/// contiguous run of deeper nodes that follows it, so structural queries reduce to scans over
/// a compact depth array. See the [crate docs](crate) for the invariants.
///
/// Indices are positions, not stable handles: creating, moving, or erasing nodes shifts the
/// indices of the nodes behind them. Every mutation returns the position it produced.
#[derive(Clone)]
pub struct FlatHierarchy<V, D: Depth = u8, O = Ascending> {
    depths: Vec<D>,
    values: Vec<V>,
    order: O,
    revision: u64,
}

impl<V, D: Depth, O: Debug> Debug for FlatHierarchy<V, D, O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FlatHierarchy")
            .field("len", &self.depths.len())
            .field("max_depth", &self.find_max_depth())
            .field("order", &self.order)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

impl<V, D: Depth, O: Default> Default for FlatHierarchy<V, D, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, D: Depth, O: Default> FlatHierarchy<V, D, O> {
    /// Create an empty hierarchy.
    pub fn new() -> Self {
        Self::with_order(O::default())
    }

    /// Create an empty hierarchy with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_order(capacity, O::default())
    }
}

impl<V, D: Depth, O> FlatHierarchy<V, D, O> {
    /// Create an empty hierarchy using `order` to place siblings.
    pub fn with_order(order: O) -> Self {
        Self {
            depths: Vec::new(),
            values: Vec::new(),
            order,
            revision: 0,
        }
    }

    /// Create an empty hierarchy with room for `capacity` nodes, using `order`.
    pub fn with_capacity_and_order(capacity: usize, order: O) -> Self {
        Self {
            depths: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
            order,
            revision: 0,
        }
    }

    /// Reserve room for `additional` more nodes.
    pub fn reserve(&mut self, additional: usize) {
        self.depths.reserve(additional);
        self.values.reserve(additional);
    }

    /// Number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.depths.len()
    }

    /// True if there are no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }

    /// Depth of every node, in preorder.
    #[inline]
    pub fn depths(&self) -> &[D] {
        &self.depths
    }

    /// Payload of every node, in preorder.
    #[inline]
    pub fn values(&self) -> &[V] {
        &self.values
    }

    /// Depth of `node`.
    #[inline]
    pub fn depth(&self, node: usize) -> D {
        self.depths[node]
    }

    /// Payload of `node`.
    #[inline]
    pub fn value(&self, node: usize) -> &V {
        &self.values[node]
    }

    /// Mutable payload of `node`.
    ///
    /// Editing a payload is not a structural change and does not invalidate caches. Under a
    /// sorting policy, keeping siblings ordered after the edit is up to the caller.
    #[inline]
    pub fn value_mut(&mut self, node: usize) -> &mut V {
        &mut self.values[node]
    }

    /// Iterate `(depth, value)` pairs in preorder.
    pub fn iter(&self) -> impl Iterator<Item = (D, &V)> + '_ {
        self.depths.iter().copied().zip(self.values.iter())
    }

    /// Structural revision, bumped by every mutation.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Read-only view of the structure, as consumed by caches.
    #[inline]
    pub fn shape(&self) -> Shape<'_, D> {
        Shape::new(&self.depths, self.revision)
    }

    /// The sibling ordering policy.
    pub fn order(&self) -> &O {
        &self.order
    }

    /// Remove every node.
    pub fn clear(&mut self) {
        self.depths.clear();
        self.values.clear();
        self.revision += 1;
    }

    /// Maximum depth of any node; zero when empty.
    pub fn find_max_depth(&self) -> D {
        reduce::max_depth(&self.depths)
    }

    /// Minimum depth over `first..last`; `None` for an empty range.
    pub fn find_min_depth_between(&self, first: usize, last: usize) -> Option<D> {
        self.shape().min_depth_between(first, last)
    }

    /// Last node of `node`'s subtree (`node` itself for a leaf). O(subtree size).
    pub fn last_descendant(&self, node: usize) -> usize {
        self.shape().last_descendant(node)
    }

    /// True if `descendant` lies in the subtree of `ancestor` (and is not `ancestor` itself).
    ///
    /// Linear in the distance between the two; see
    /// [`AncestorCache::is_ancestor_of`](crate::AncestorCache::is_ancestor_of) for O(1).
    pub fn is_ancestor_of(&self, ancestor: usize, descendant: usize) -> bool {
        self.shape().is_ancestor_of(ancestor, descendant)
    }

    /// Parent of `node`, or `None` for a root.
    pub fn parent_of(&self, node: usize) -> Option<usize> {
        self.shape().parent_of(node)
    }

    /// Number of direct children of `parent`.
    pub fn count_direct_children(&self, parent: usize) -> usize {
        self.shape().count_direct_children(parent)
    }

    /// The `n`th direct child of `parent`, counting from zero.
    pub fn nth_child(&self, parent: usize, n: usize) -> Option<usize> {
        self.shape().nth_child(parent, n)
    }

    /// Direct children of `parent`, in order.
    pub fn children(&self, parent: usize) -> Children<'_, D> {
        self.shape().children(parent)
    }

    /// Indices of every root, in order.
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.shape().roots()
    }

    /// Subtree end, from the caches when they can answer, else by scanning.
    fn subtree_last<C: CacheSync<D>>(&self, node: usize, caches: &C) -> usize {
        let shape = self.shape();
        caches
            .last_descendant_hint(shape, node)
            .unwrap_or_else(|| shape.last_descendant(node))
    }

    /// Bump the revision and hand the change to `caches`.
    fn commit_change<C: CacheSync<D>>(&mut self, before: Stamp, first_dirty: usize, caches: &mut C) {
        self.revision += 1;
        caches.after_change(self.shape(), Change { before, first_dirty });
    }
}

impl<V: PartialEq, D: Depth, O> FlatHierarchy<V, D, O> {
    /// First node whose payload equals `value`.
    pub fn find_value(&self, value: &V) -> Option<usize> {
        self.find_value_from(value, 0)
    }

    /// First node at or after `start` whose payload equals `value`.
    pub fn find_value_from(&self, value: &V, start: usize) -> Option<usize> {
        self.values
            .get(start..)?
            .iter()
            .position(|v| v == value)
            .map(|i| start + i)
    }

    /// First descendant of `parent` whose payload equals `value`.
    pub fn find_value_under(&self, value: &V, parent: usize) -> Option<usize> {
        let parent_depth = self.depths[parent];
        self.depths[parent + 1..]
            .iter()
            .zip(&self.values[parent + 1..])
            .take_while(|(d, _)| **d > parent_depth)
            .position(|(_, v)| v == value)
            .map(|i| parent + 1 + i)
    }
}

impl<V: Copy, D: Depth, O: SiblingOrder<V>> FlatHierarchy<V, D, O> {
    /// Add a root. Returns its index.
    ///
    /// With a sorting policy the root lands before the first root ordered after `value`;
    /// otherwise it is appended.
    pub fn create_root(&mut self, value: V) -> usize {
        self.create_root_with(value, &mut ())
    }

    /// [`create_root`](Self::create_root), synchronizing `caches`.
    pub fn create_root_with<C: CacheSync<D>>(&mut self, value: V, caches: &mut C) -> usize {
        let before = self.shape().stamp();
        let mut index = self.len();
        if self.order.uses_sorting() {
            let mut current = 0;
            while current < self.len() {
                if self.order.is_ordered_before(&value, &self.values[current]) {
                    index = current;
                    break;
                }
                current = self.subtree_last(current, caches) + 1;
            }
        }
        self.depths.insert(index, D::ZERO);
        self.values.insert(index, value);
        self.commit_change(before, index, caches);
        index
    }

    /// Add a child of `parent`. Returns its index.
    ///
    /// With a sorting policy the child lands before the first sibling ordered after `value`,
    /// else after `parent`'s last descendant. Without sorting it becomes the first child.
    pub fn create_child_of(&mut self, parent: usize, value: V) -> usize {
        self.create_child_of_with(parent, value, &mut ())
    }

    /// [`create_child_of`](Self::create_child_of), synchronizing `caches`.
    pub fn create_child_of_with<C: CacheSync<D>>(
        &mut self,
        parent: usize,
        value: V,
        caches: &mut C,
    ) -> usize {
        flat_assert!(
            parent < self.len(),
            "parent {parent} out of range ({} nodes)",
            self.len()
        );
        let depth = self.depths[parent].wrapping_add(D::ONE);
        flat_assert!(
            depth < D::MAX_DEPTH,
            "child of {parent} would reach the maximum depth {:?}",
            D::MAX_DEPTH
        );

        let before = self.shape().stamp();
        let mut index = parent + 1;
        if self.order.uses_sorting() {
            let end = self.subtree_last(parent, caches) + 1;
            index = end;
            let mut current = parent + 1;
            while current < end {
                if self.order.is_ordered_before(&value, &self.values[current]) {
                    index = current;
                    break;
                }
                current = self.subtree_last(current, caches) + 1;
            }
        }
        self.depths.insert(index, depth);
        self.values.insert(index, value);
        self.commit_change(before, index, caches);
        index
    }

    /// Checked [`create_child_of`](Self::create_child_of).
    pub fn try_create_child_of(&mut self, parent: usize, value: V) -> Result<usize, HierarchyError> {
        self.check_index(parent)?;
        let depth = self.depths[parent].to_usize() + 1;
        if depth >= D::MAX_DEPTH.to_usize() {
            return Err(HierarchyError::DepthOverflow {
                depth,
                max: D::MAX_DEPTH.to_usize(),
            });
        }
        Ok(self.create_child_of(parent, value))
    }

    /// Move the subtree rooted at `child` under `parent`. Returns `child`'s new index.
    ///
    /// The subtree keeps its shape; every depth in it shifts so that `child` sits one level
    /// below `parent`. With a sorting policy it lands in sorted position among `parent`'s
    /// children, otherwise it becomes the first child. If `child` already is a direct child of
    /// `parent` nothing moves and `child` is returned.
    ///
    /// `child == parent` and `parent` inside `child`'s subtree are contract violations.
    pub fn make_child_of(&mut self, child: usize, parent: usize) -> usize {
        self.make_child_of_with(child, parent, &mut ())
    }

    /// [`make_child_of`](Self::make_child_of), synchronizing `caches`.
    pub fn make_child_of_with<C: CacheSync<D>>(
        &mut self,
        child: usize,
        parent: usize,
        caches: &mut C,
    ) -> usize {
        flat_assert!(
            child < self.len() && parent < self.len(),
            "reparenting {child} under {parent} in a hierarchy of {} nodes",
            self.len()
        );
        flat_assert!(child != parent, "self-adoption of node {child}");
        flat_assert!(
            !self.is_ancestor_of(child, parent),
            "cycle: {parent} is a descendant of {child}"
        );

        let parent_depth = self.depths[parent];
        let target_depth = parent_depth.wrapping_add(D::ONE);
        let parent_last = self.subtree_last(parent, caches);
        if self.depths[child] == target_depth && parent < child && child <= parent_last {
            return child;
        }

        let before = self.shape().stamp();
        let source = child;
        let count = self.subtree_last(child, caches) - child + 1;

        let mut dest = parent + 1;
        if self.order.uses_sorting() {
            let end = parent_last + 1;
            dest = end;
            let mut current = parent + 1;
            while current < end {
                if self
                    .order
                    .is_ordered_before(&self.values[child], &self.values[current])
                {
                    dest = current;
                    break;
                }
                current = self.subtree_last(current, caches) + 1;
            }
        }

        let delta = target_depth.wrapping_sub(self.depths[child]);
        let index = if dest != source && dest != source + count {
            relocate(&mut self.depths, &mut self.values, source, dest, count)
        } else {
            source
        };

        for depth in &mut self.depths[index..index + count] {
            *depth = depth.wrapping_add(delta);
            flat_assert!(
                *depth < D::MAX_DEPTH,
                "over/underflow: relocated depth {:?} reaches {:?}",
                *depth,
                D::MAX_DEPTH
            );
        }

        self.commit_change(before, source.min(index), caches);
        index
    }

    /// Checked [`make_child_of`](Self::make_child_of).
    ///
    /// Validates every precondition first; on error nothing is modified.
    pub fn try_make_child_of(&mut self, child: usize, parent: usize) -> Result<usize, HierarchyError> {
        self.check_index(child)?;
        self.check_index(parent)?;
        if child == parent {
            return Err(HierarchyError::SelfAdoption { node: child });
        }
        if self.is_ancestor_of(child, parent) {
            return Err(HierarchyError::Cycle { child, parent });
        }
        let last = self.last_descendant(child);
        let deepest = reduce::max_depth(&self.depths[child..=last]).to_usize();
        let depth = deepest - self.depths[child].to_usize() + self.depths[parent].to_usize() + 1;
        if depth >= D::MAX_DEPTH.to_usize() {
            return Err(HierarchyError::DepthOverflow {
                depth,
                max: D::MAX_DEPTH.to_usize(),
            });
        }
        Ok(self.make_child_of(child, parent))
    }

    /// Remove `node` and its whole subtree. Returns the number of nodes removed.
    pub fn erase(&mut self, node: usize) -> usize {
        self.erase_with(node, &mut ())
    }

    /// [`erase`](Self::erase), synchronizing `caches`.
    pub fn erase_with<C: CacheSync<D>>(&mut self, node: usize, caches: &mut C) -> usize {
        flat_assert!(
            node < self.len(),
            "erasing {node} from a hierarchy of {} nodes",
            self.len()
        );
        let before = self.shape().stamp();
        let last = self.subtree_last(node, caches);
        self.depths.drain(node..=last);
        self.values.drain(node..=last);
        self.commit_change(before, node, caches);
        last - node + 1
    }

    fn check_index(&self, index: usize) -> Result<(), HierarchyError> {
        if index < self.len() {
            Ok(())
        } else {
            Err(HierarchyError::IndexOutOfRange {
                index,
                len: self.len(),
            })
        }
    }
}

/// Read-only view of a hierarchy's depths at one revision.
///
/// Caches are built from and checked against a `Shape`, which keeps them independent of the
/// payload and ordering types.
#[derive(Clone, Copy, Debug)]
pub struct Shape<'a, D> {
    depths: &'a [D],
    revision: u64,
}

impl<'a, D: Depth> Shape<'a, D> {
    /// View `depths` as revision `revision` of some hierarchy.
    pub fn new(depths: &'a [D], revision: u64) -> Self {
        Self { depths, revision }
    }

    /// The depth array.
    #[inline]
    pub fn depths(&self) -> &'a [D] {
        self.depths
    }

    /// Structural revision.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Revision and length, used by caches to detect staleness.
    #[inline]
    pub fn stamp(&self) -> Stamp {
        Stamp {
            revision: self.revision,
            len: self.depths.len(),
        }
    }

    /// Node count.
    #[inline]
    pub fn len(&self) -> usize {
        self.depths.len()
    }

    /// True if there are no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }

    /// Depth of `node`.
    #[inline]
    pub fn depth(&self, node: usize) -> D {
        self.depths[node]
    }

    /// Maximum depth; zero when empty.
    pub fn max_depth(&self) -> D {
        reduce::max_depth(self.depths)
    }

    /// Minimum depth over `first..last`; `None` for an empty range.
    pub fn min_depth_between(&self, first: usize, last: usize) -> Option<D> {
        reduce::min_depth(&self.depths[first..last])
    }

    /// Last node of `node`'s subtree.
    pub fn last_descendant(&self, node: usize) -> usize {
        let depth = self.depths[node];
        self.depths[node + 1..]
            .iter()
            .position(|&d| d <= depth)
            .map_or(self.depths.len() - 1, |offset| node + offset)
    }

    /// True if `descendant` lies strictly inside `ancestor`'s subtree.
    pub fn is_ancestor_of(&self, ancestor: usize, descendant: usize) -> bool {
        if ancestor >= descendant || descendant >= self.depths.len() {
            return false;
        }
        let depth = self.depths[ancestor];
        self.min_depth_between(ancestor + 1, descendant + 1)
            .is_some_and(|min| min > depth)
    }

    /// Parent of `node`, or `None` for a root.
    pub fn parent_of(&self, node: usize) -> Option<usize> {
        let depth = self.depths[node];
        if depth == D::ZERO {
            return None;
        }
        self.depths[..node].iter().rposition(|&d| d < depth)
    }

    /// Number of direct children of `parent`.
    pub fn count_direct_children(&self, parent: usize) -> usize {
        self.children(parent).count()
    }

    /// The `n`th direct child of `parent`.
    pub fn nth_child(&self, parent: usize, n: usize) -> Option<usize> {
        self.children(parent).nth(n)
    }

    /// Direct children of `parent`.
    pub fn children(&self, parent: usize) -> Children<'a, D> {
        Children {
            depths: self.depths,
            next: parent + 1,
            depth: self.depths[parent].wrapping_add(D::ONE),
        }
    }

    /// Indices of all roots.
    pub fn roots(self) -> impl Iterator<Item = usize> + 'a {
        self.depths
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == D::ZERO)
            .map(|(i, _)| i)
    }

    /// True if the depths describe a valid forest.
    ///
    /// The first node is a root, depth grows by at most one per step, and every depth is
    /// below [`Depth::MAX_DEPTH`].
    pub fn is_well_formed(&self) -> bool {
        self.depths.first().is_none_or(|&d| d == D::ZERO)
            && self.depths.iter().all(|&d| d < D::MAX_DEPTH)
            && self
                .depths
                .windows(2)
                .all(|w| w[1] <= w[0].wrapping_add(D::ONE))
    }
}

/// Iterator over the direct children of a node. See [`Shape::children`].
#[derive(Clone, Debug)]
pub struct Children<'a, D> {
    depths: &'a [D],
    next: usize,
    depth: D,
}

impl<D: Depth> Iterator for Children<'_, D> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while let Some(&d) = self.depths.get(self.next) {
            let index = self.next;
            self.next += 1;
            if d == self.depth {
                return Some(index);
            }
            if d < self.depth {
                self.next = self.depths.len();
                return None;
            }
        }
        None
    }
}
