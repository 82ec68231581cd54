// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Depth value types.
//!
//! A depth type is an unsigned integer whose most significant bit is never used by a valid
//! hierarchy. Wrapping arithmetic on relocated depths therefore trips [`Depth::MAX_DEPTH`]
//! instead of silently producing a plausible value.

use core::fmt::Debug;
use core::hash::Hash;

use crate::reduce;

/// Largest maximum depth any depth type exposes, independent of its width.
pub const MAX_MAX_DEPTH: usize = (1 << 15) - 1;

mod sealed {
    #[expect(
        unnameable_types,
        reason = "Sealing trait; only the depth types in this module implement it."
    )]
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for u32 {}
    impl Sealed for u64 {}
}

/// Unsigned integer type used to store node depths.
///
/// Implemented for `u8`, `u16`, `u32` and `u64`. Narrower types make the depth array more
/// cache friendly and let the reductions in [`reduce`](crate::reduce) process more lanes
/// per vector.
pub trait Depth: sealed::Sealed + Copy + Ord + Default + Debug + Hash + Send + Sync + 'static {
    /// Depth of a root.
    const ZERO: Self;
    /// One level.
    const ONE: Self;
    /// Exclusive upper bound for stored depths.
    ///
    /// `min(Self::MAX >> 1, 2^15 - 1)`: the top bit stays clear.
    const MAX_DEPTH: Self;

    /// Widen to `usize`.
    fn to_usize(self) -> usize;

    /// Wrapping addition.
    fn wrapping_add(self, rhs: Self) -> Self;

    /// Wrapping subtraction.
    fn wrapping_sub(self, rhs: Self) -> Self;

    /// Maximum of `depths`, or zero for an empty slice.
    fn max_of(depths: &[Self]) -> Self;

    /// Minimum of `depths`, or `None` for an empty slice.
    fn min_of(depths: &[Self]) -> Option<Self>;
}

macro_rules! impl_depth {
    ($ty:ty, $lanes:literal) => {
        impl Depth for $ty {
            const ZERO: Self = 0;
            const ONE: Self = 1;
            #[allow(
                clippy::cast_possible_truncation,
                reason = "The bound is clamped below the type's own maximum first."
            )]
            const MAX_DEPTH: Self = if (<$ty>::MAX >> 1) as u64 > MAX_MAX_DEPTH as u64 {
                MAX_MAX_DEPTH as $ty
            } else {
                <$ty>::MAX >> 1
            };

            #[inline]
            fn to_usize(self) -> usize {
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "Valid depths are below MAX_DEPTH, which fits in 16 bits."
                )]
                let value = self as usize;
                value
            }

            #[inline]
            fn wrapping_add(self, rhs: Self) -> Self {
                <$ty>::wrapping_add(self, rhs)
            }

            #[inline]
            fn wrapping_sub(self, rhs: Self) -> Self {
                <$ty>::wrapping_sub(self, rhs)
            }

            #[inline]
            fn max_of(depths: &[Self]) -> Self {
                reduce::max_lanes::<$ty, $lanes>(depths)
            }

            #[inline]
            fn min_of(depths: &[Self]) -> Option<Self> {
                if depths.is_empty() {
                    return None;
                }
                Some(reduce::min_lanes::<$ty, $lanes>(depths))
            }
        }
    };
}

impl_depth!(u8, 16);
impl_depth!(u16, 8);
impl_depth!(u32, 4);

impl Depth for u64 {
    const ZERO: Self = 0;
    const ONE: Self = 1;
    const MAX_DEPTH: Self = MAX_MAX_DEPTH as Self;

    #[inline]
    fn to_usize(self) -> usize {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Valid depths are below MAX_DEPTH, which fits in 16 bits."
        )]
        let value = self as usize;
        value
    }

    #[inline]
    fn wrapping_add(self, rhs: Self) -> Self {
        Self::wrapping_add(self, rhs)
    }

    #[inline]
    fn wrapping_sub(self, rhs: Self) -> Self {
        Self::wrapping_sub(self, rhs)
    }

    fn max_of(depths: &[Self]) -> Self {
        reduce::max_scalar(depths)
    }

    fn min_of(depths: &[Self]) -> Option<Self> {
        depths.iter().copied().min()
    }
}
