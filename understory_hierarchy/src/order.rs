// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sibling ordering policies.

use core::fmt::Debug;

/// Decides where new and re-parented nodes land among their siblings.
///
/// When [`uses_sorting`](SiblingOrder::uses_sorting) returns `false`,
/// [`is_ordered_before`](SiblingOrder::is_ordered_before) is never called: roots are appended
/// and children are placed directly after their parent.
pub trait SiblingOrder<V> {
    /// Whether siblings are kept sorted.
    fn uses_sorting(&self) -> bool;

    /// True if `a` belongs strictly before `b` among siblings.
    fn is_ordered_before(&self, a: &V, b: &V) -> bool;
}

/// Ascending order by `PartialOrd`. Equal values keep insertion order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Ascending;

impl<V: PartialOrd> SiblingOrder<V> for Ascending {
    #[inline]
    fn uses_sorting(&self) -> bool {
        true
    }

    #[inline]
    fn is_ordered_before(&self, a: &V, b: &V) -> bool {
        a < b
    }
}

/// No sorting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Unordered;

impl<V> SiblingOrder<V> for Unordered {
    #[inline]
    fn uses_sorting(&self) -> bool {
        false
    }

    #[inline]
    fn is_ordered_before(&self, _a: &V, _b: &V) -> bool {
        false
    }
}

/// Sort with a caller-supplied "is ordered before" predicate.
#[derive(Clone, Copy)]
pub struct OrderBy<F>(pub F);

impl<F> Debug for OrderBy<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OrderBy").finish_non_exhaustive()
    }
}

impl<V, F: Fn(&V, &V) -> bool> SiblingOrder<V> for OrderBy<F> {
    #[inline]
    fn uses_sorting(&self) -> bool {
        true
    }

    #[inline]
    fn is_ordered_before(&self, a: &V, b: &V) -> bool {
        (self.0)(a, b)
    }
}
