// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vectorized depth reductions.
//!
//! The maximum depth sizes the [`AncestorCache`](crate::AncestorCache); the minimum depth over a
//! range answers "does anything between these two indices dip to or below depth `d`", which is
//! the uncached ancestor test.
//!
//! For 1, 2 and 4 byte depths the slice is split into an unaligned head, a body of
//! 16-byte-aligned chunks, and a tail. The body is reduced lane-wise into a `[D; LANES]`
//! accumulator, which the compiler lowers to packed `max`/`min` instructions, and the lanes are
//! folded to a scalar at the end. Wider depth types use [`max_scalar`].

use crate::depth::Depth;

/// Width in bytes of one reduction chunk.
pub const VECTOR_BYTES: usize = 16;

/// Maximum depth in `depths`; zero when empty.
pub fn max_depth<D: Depth>(depths: &[D]) -> D {
    D::max_of(depths)
}

/// Minimum depth in `depths`; `None` when empty.
pub fn min_depth<D: Depth>(depths: &[D]) -> Option<D> {
    D::min_of(depths)
}

/// Scalar maximum, the fallback for depth types wider than 4 bytes.
pub fn max_scalar<D: Depth>(depths: &[D]) -> D {
    depths.iter().copied().fold(D::ZERO, Ord::max)
}

/// Split `depths` into an unaligned head, 16-byte chunks of `LANES` elements, and a tail.
#[inline]
fn split_aligned<D: Depth, const LANES: usize>(depths: &[D]) -> (&[D], &[[D; LANES]], &[D]) {
    debug_assert_eq!(
        LANES * size_of::<D>(),
        VECTOR_BYTES,
        "lane count must fill exactly one vector"
    );
    let head_len = depths.as_ptr().align_offset(VECTOR_BYTES).min(depths.len());
    let (head, rest) = depths.split_at(head_len);
    let (body, tail) = rest.as_chunks::<LANES>();
    (head, body, tail)
}

/// Lane-wise maximum over aligned chunks.
pub(crate) fn max_lanes<D: Depth, const LANES: usize>(depths: &[D]) -> D {
    let (head, body, tail) = split_aligned::<D, LANES>(depths);
    let mut lanes = [D::ZERO; LANES];
    for chunk in body {
        for (lane, &d) in lanes.iter_mut().zip(chunk) {
            *lane = (*lane).max(d);
        }
    }
    head.iter()
        .chain(tail)
        .chain(&lanes)
        .copied()
        .fold(D::ZERO, Ord::max)
}

/// Lane-wise minimum over aligned chunks. `depths` must not be empty.
pub(crate) fn min_lanes<D: Depth, const LANES: usize>(depths: &[D]) -> D {
    let (head, body, tail) = split_aligned::<D, LANES>(depths);
    let mut result = depths[0];
    if let Some((first, rest)) = body.split_first() {
        let mut lanes = *first;
        for chunk in rest {
            for (lane, &d) in lanes.iter_mut().zip(chunk) {
                *lane = (*lane).min(d);
            }
        }
        result = lanes.iter().copied().fold(result, Ord::min);
    }
    head.iter().chain(tail).copied().fold(result, Ord::min)
}
