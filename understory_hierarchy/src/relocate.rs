// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Block relocation used by every order-changing mutation.
//!
//! Moving a subtree of `count` elements from `source` to `dest` is a rotation of the region
//! `[min(source, dest), max(source + count, dest))`: one side is the moving block, the other
//! is the block it jumps over. The smaller side is parked in a scratch buffer, the larger side
//! slides over with an overlap-safe `copy_within`, and the scratch lands in the gap. Cost is
//! proportional to the distance moved, not to the length of the arrays.

use smallvec::SmallVec;

use crate::flat_assert;

/// Elements of scratch kept inline on the stack before spilling to the heap.
pub const INLINE_SCRATCH_LEN: usize = 32;

/// Rotate `slice` left by `split`, so that `slice[split]` becomes the first element.
pub fn rotate_block<T: Copy>(slice: &mut [T], split: usize) {
    flat_assert!(split <= slice.len(), "split {split} past end {}", slice.len());
    let left = split;
    let right = slice.len() - split;
    if left == 0 || right == 0 {
        return;
    }
    if left <= right {
        let scratch = SmallVec::<[T; INLINE_SCRATCH_LEN]>::from_slice(&slice[..left]);
        trace_spill(&scratch);
        slice.copy_within(left.., 0);
        slice[right..].copy_from_slice(&scratch);
    } else {
        let scratch = SmallVec::<[T; INLINE_SCRATCH_LEN]>::from_slice(&slice[left..]);
        trace_spill(&scratch);
        slice.copy_within(..left, right);
        slice[..right].copy_from_slice(&scratch);
    }
}

#[inline]
fn trace_spill<T: Copy>(scratch: &SmallVec<[T; INLINE_SCRATCH_LEN]>) {
    if scratch.spilled() {
        tracing::trace!(len = scratch.len(), "relocation scratch spilled to the heap");
    }
}

/// Move `count` elements starting at `source` in front of the element currently at `dest`,
/// in both arrays.
///
/// `dest` must not fall strictly inside the moving block. Returns the index of the first
/// moved element after the move.
pub fn relocate<D: Copy, V: Copy>(
    depths: &mut [D],
    values: &mut [V],
    source: usize,
    dest: usize,
    count: usize,
) -> usize {
    flat_assert!(
        depths.len() == values.len(),
        "depth and value arrays out of sync: {} != {}",
        depths.len(),
        values.len()
    );
    flat_assert!(
        source + count <= depths.len() && dest <= depths.len(),
        "relocation of {count} from {source} to {dest} exceeds length {}",
        depths.len()
    );
    flat_assert!(
        dest <= source || dest >= source + count,
        "destination {dest} lies inside the moving block [{source}, {})",
        source + count
    );
    if source < dest {
        rotate_block(&mut depths[source..dest], count);
        rotate_block(&mut values[source..dest], count);
        dest - count
    } else {
        rotate_block(&mut depths[dest..source + count], source - dest);
        rotate_block(&mut values[dest..source + count], source - dest);
        dest
    }
}
