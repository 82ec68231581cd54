// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! First-child/next-sibling tree in an arena.

use alloc::vec::Vec;

use understory_hierarchy::{Ascending, SiblingOrder, flat_assert};

use crate::TreeContract;

/// Identifier for a node in a [`LinkedTree`].
///
/// Plain slot index; erased slots are reused without a generation check.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct LinkId(u32);

impl LinkId {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "LinkId stores a 32-bit slot index."
    )]
    const fn new(idx: usize) -> Self {
        Self(idx as u32)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct Node<V> {
    value: V,
    parent: Option<LinkId>,
    first_child: Option<LinkId>,
    next_sibling: Option<LinkId>,
}

#[derive(Clone, Debug)]
enum Slot<V> {
    InUse(Node<V>),
    /// Next free slot.
    Free(Option<LinkId>),
}

/// A tree where each node links to its first child and its next sibling.
///
/// Siblings form a singly linked list, so finding a node's position among its siblings walks
/// that list. Slots of erased nodes go on an intrusive free list and are reused in O(1).
pub struct LinkedTree<V, O = Ascending> {
    slots: Vec<Slot<V>>,
    first_free: Option<LinkId>,
    first_root: Option<LinkId>,
    order: O,
    len: usize,
}

impl<V, O: core::fmt::Debug> core::fmt::Debug for LinkedTree<V, O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LinkedTree")
            .field("slots", &self.slots.len())
            .field("len", &self.len)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

impl<V, O: Default> Default for LinkedTree<V, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, O: Default> LinkedTree<V, O> {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self::with_order(O::default())
    }
}

impl<V, O> LinkedTree<V, O> {
    /// Create a new empty tree placing siblings with `order`.
    pub fn with_order(order: O) -> Self {
        Self {
            slots: Vec::new(),
            first_free: None,
            first_root: None,
            order,
            len: 0,
        }
    }

    fn node(&self, id: LinkId) -> &Node<V> {
        match &self.slots[id.idx()] {
            Slot::InUse(node) => node,
            Slot::Free(_) => panic!("{id:?} refers to a free slot"),
        }
    }

    fn node_mut(&mut self, id: LinkId) -> &mut Node<V> {
        match &mut self.slots[id.idx()] {
            Slot::InUse(node) => node,
            Slot::Free(_) => panic!("{id:?} refers to a free slot"),
        }
    }

    /// Iterate a sibling list starting at `first`.
    fn siblings_from(&self, first: Option<LinkId>) -> impl Iterator<Item = LinkId> + '_ {
        core::iter::successors(first, |&id| self.node(id).next_sibling)
    }

    fn first_of(&self, parent: Option<LinkId>) -> Option<LinkId> {
        match parent {
            Some(p) => self.node(p).first_child,
            None => self.first_root,
        }
    }

    fn set_first_of(&mut self, parent: Option<LinkId>, first: Option<LinkId>) {
        match parent {
            Some(p) => self.node_mut(p).first_child = first,
            None => self.first_root = first,
        }
    }

    fn allocate(&mut self, value: V) -> LinkId {
        let node = Node {
            value,
            parent: None,
            first_child: None,
            next_sibling: None,
        };
        self.len += 1;
        match self.first_free {
            Some(id) => {
                let Slot::Free(next) = self.slots[id.idx()] else {
                    unreachable!("free list points at a live slot");
                };
                self.first_free = next;
                self.slots[id.idx()] = Slot::InUse(node);
                id
            }
            None => {
                self.slots.push(Slot::InUse(node));
                LinkId::new(self.slots.len() - 1)
            }
        }
    }

    fn release(&mut self, id: LinkId) {
        self.slots[id.idx()] = Slot::Free(self.first_free);
        self.first_free = Some(id);
        self.len -= 1;
    }

    /// Unlink `id` from its sibling list.
    fn detach(&mut self, id: LinkId) {
        let parent = self.node(id).parent;
        let next = self.node(id).next_sibling;
        let previous = self
            .siblings_from(self.first_of(parent))
            .take_while(|&s| s != id)
            .last();
        match previous {
            Some(p) => self.node_mut(p).next_sibling = next,
            None => self.set_first_of(parent, next),
        }
        let node = self.node_mut(id);
        node.parent = None;
        node.next_sibling = None;
    }

    fn is_ancestor(&self, ancestor: LinkId, mut node: LinkId) -> bool {
        while let Some(parent) = self.node(node).parent {
            if parent == ancestor {
                return true;
            }
            node = parent;
        }
        false
    }

    /// Panics if a parent link disagrees with the sibling list that holds the node, or if the
    /// free list and live count disagree with the arena.
    pub fn sanity_check(&self) {
        let mut reachable = 0;
        let mut stack: Vec<(Option<LinkId>, Option<LinkId>)> = alloc::vec![(None, self.first_root)];
        while let Some((parent, first)) = stack.pop() {
            for id in self.siblings_from(first) {
                assert_eq!(self.node(id).parent, parent, "{id:?} has the wrong parent");
                reachable += 1;
                stack.push((Some(id), self.node(id).first_child));
            }
        }
        assert_eq!(reachable, self.len, "reachable nodes disagree with len");
        let free = core::iter::successors(self.first_free, |&id| match self.slots[id.idx()] {
            Slot::Free(next) => next,
            Slot::InUse(_) => panic!("free list reaches live slot {id:?}"),
        })
        .count();
        assert_eq!(free + self.len, self.slots.len(), "slots leaked");
    }
}

impl<V, O: SiblingOrder<V>> LinkedTree<V, O> {
    /// Insert a node under `parent`, or as a root if `None`.
    pub fn insert(&mut self, parent: Option<LinkId>, value: V) -> LinkId {
        let id = self.allocate(value);
        self.attach(id, parent);
        id
    }

    /// Remove `id` and its subtree. Returns the number of nodes removed.
    pub fn remove(&mut self, id: LinkId) -> usize {
        self.detach(id);
        let mut removed = 0;
        let mut stack = alloc::vec![id];
        while let Some(next) = stack.pop() {
            stack.extend(self.siblings_from(self.node(next).first_child));
            self.release(next);
            removed += 1;
        }
        removed
    }

    /// Move `id` and its subtree under `new_parent`.
    ///
    /// A node that already is a direct child of `new_parent` stays where it is.
    pub fn reparent(&mut self, id: LinkId, new_parent: LinkId) {
        flat_assert!(id != new_parent, "self-adoption of {id:?}");
        flat_assert!(
            !self.is_ancestor(id, new_parent),
            "cycle: {new_parent:?} is a descendant of {id:?}"
        );
        if self.node(id).parent == Some(new_parent) {
            return;
        }
        self.detach(id);
        self.attach(id, Some(new_parent));
    }

    fn attach(&mut self, id: LinkId, parent: Option<LinkId>) {
        let first = self.first_of(parent);
        // Node to link after; `None` means at the head of the list.
        let after = if self.order.uses_sorting() {
            let value = &self.node(id).value;
            self.siblings_from(first)
                .take_while(|&s| !self.order.is_ordered_before(value, &self.node(s).value))
                .last()
        } else if parent.is_some() {
            None
        } else {
            self.siblings_from(first).last()
        };
        match after {
            Some(a) => {
                let next = self.node(a).next_sibling;
                self.node_mut(id).next_sibling = next;
                self.node_mut(a).next_sibling = Some(id);
            }
            None => {
                self.node_mut(id).next_sibling = first;
                self.set_first_of(parent, Some(id));
            }
        }
        self.node_mut(id).parent = parent;
    }
}

impl<V, O: SiblingOrder<V>> TreeContract for LinkedTree<V, O> {
    type Value = V;
    type Handle = LinkId;

    fn create_root(&mut self, value: V) -> LinkId {
        self.insert(None, value)
    }

    fn create_child(&mut self, parent: LinkId, value: V) -> LinkId {
        self.insert(Some(parent), value)
    }

    fn reparent(&mut self, child: LinkId, parent: LinkId) -> LinkId {
        Self::reparent(self, child, parent);
        child
    }

    fn erase(&mut self, node: LinkId) -> usize {
        self.remove(node)
    }

    fn roots(&self) -> Vec<LinkId> {
        self.siblings_from(self.first_root).collect()
    }

    fn children(&self, parent: LinkId) -> Vec<LinkId> {
        self.siblings_from(self.node(parent).first_child).collect()
    }

    fn nth_child(&self, parent: LinkId, n: usize) -> Option<LinkId> {
        self.siblings_from(self.node(parent).first_child).nth(n)
    }

    fn parent(&self, node: LinkId) -> Option<LinkId> {
        self.node(node).parent
    }

    fn value(&self, node: LinkId) -> &V {
        &self.node(node).value
    }

    fn len(&self) -> usize {
        self.len
    }
}
