// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`TreeContract`] for the flat hierarchy.

use alloc::vec::Vec;

use understory_hierarchy::{Depth, FlatHierarchy, SiblingOrder};

use crate::TreeContract;

impl<V: Copy, D: Depth, O: SiblingOrder<V>> TreeContract for FlatHierarchy<V, D, O> {
    type Value = V;
    type Handle = usize;

    fn create_root(&mut self, value: V) -> usize {
        Self::create_root(self, value)
    }

    fn create_child(&mut self, parent: usize, value: V) -> usize {
        self.create_child_of(parent, value)
    }

    fn reparent(&mut self, child: usize, parent: usize) -> usize {
        self.make_child_of(child, parent)
    }

    fn erase(&mut self, node: usize) -> usize {
        Self::erase(self, node)
    }

    fn roots(&self) -> Vec<usize> {
        Self::roots(self).collect()
    }

    fn children(&self, parent: usize) -> Vec<usize> {
        Self::children(self, parent).collect()
    }

    fn nth_child(&self, parent: usize, n: usize) -> Option<usize> {
        Self::nth_child(self, parent, n)
    }

    fn parent(&self, node: usize) -> Option<usize> {
        self.parent_of(node)
    }

    fn value(&self, node: usize) -> &V {
        Self::value(self, node)
    }

    fn len(&self) -> usize {
        Self::len(self)
    }
}
