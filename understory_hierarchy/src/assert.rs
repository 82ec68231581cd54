// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contract checks for programmer misuse.
//!
//! Structural misuse (self-adoption, cycles, depth overflow, reading a stale cache) is not a
//! runtime condition to recover from. In checked builds (debug builds, or any build with the
//! `checked` feature) [`flat_assert!`](crate::flat_assert) panics with the failing expression,
//! its location, and a formatted message. In unchecked builds the check compiles to nothing.

/// True when [`flat_assert!`](crate::flat_assert) evaluates its condition.
pub const CHECKS_ENABLED: bool = cfg!(any(debug_assertions, feature = "checked"));

/// Assert a hierarchy contract.
///
/// Behaves like [`assert!`] when [`CHECKS_ENABLED`] is true and is elided otherwise.
/// The condition must be free of side effects.
///
/// ```should_panic
/// use understory_hierarchy::flat_assert;
///
/// let depth: u8 = 200;
/// flat_assert!(depth < 127, "depth {depth} overflows the configured maximum");
/// # if !understory_hierarchy::assert::CHECKS_ENABLED { panic!(); }
/// ```
#[macro_export]
macro_rules! flat_assert {
    ($cond:expr $(,)?) => {
        if $crate::assert::CHECKS_ENABLED {
            ::core::assert!($cond, ::core::concat!("contract violated: ", ::core::stringify!($cond)));
        }
    };
    ($cond:expr, $($arg:tt)+) => {
        if $crate::assert::CHECKS_ENABLED {
            ::core::assert!($cond, $($arg)+);
        }
    };
}
