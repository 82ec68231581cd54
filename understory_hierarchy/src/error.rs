// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by the fallible mutation variants.

/// Why a structural mutation was rejected.
///
/// Returned by [`FlatHierarchy::try_create_child_of`](crate::FlatHierarchy::try_create_child_of)
/// and [`FlatHierarchy::try_make_child_of`](crate::FlatHierarchy::try_make_child_of). The
/// hierarchy is left untouched when one of these is returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum HierarchyError {
    /// A node was asked to become its own parent.
    #[error("node {node} cannot become a child of itself")]
    SelfAdoption {
        /// The node in question.
        node: usize,
    },
    /// The new parent lies inside the subtree being moved.
    #[error("node {parent} is a descendant of {child}; reparenting would create a cycle")]
    Cycle {
        /// Root of the subtree being moved.
        child: usize,
        /// Requested parent.
        parent: usize,
    },
    /// The operation would push a node to or beyond the depth type's maximum.
    #[error("depth {depth} reaches the maximum depth {max}")]
    DepthOverflow {
        /// Deepest depth the operation would produce.
        depth: usize,
        /// Exclusive bound of the depth type.
        max: usize,
    },
    /// An index does not name a node.
    #[error("index {index} is out of range for a hierarchy of {len} nodes")]
    IndexOutOfRange {
        /// Offending index.
        index: usize,
        /// Node count.
        len: usize,
    },
}
