// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Child-vector tree: generational slots, per-node child lists, sibling links.

use alloc::vec::Vec;

use understory_hierarchy::{Ascending, SiblingOrder, flat_assert};

use crate::TreeContract;

/// Identifier for a node in a [`ChildVecTree`] (generational).
///
/// A slot index plus a generation. Freed slots are reused with a higher generation, so a stale
/// `NodeId` never aliases a different live node.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(u32, u32);

impl NodeId {
    const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct Node<V> {
    generation: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    left_sibling: Option<NodeId>,
    right_sibling: Option<NodeId>,
    value: V,
}

impl<V> Node<V> {
    fn new(generation: u32, value: V) -> Self {
        Self {
            generation,
            parent: None,
            children: Vec::new(),
            left_sibling: None,
            right_sibling: None,
            value,
        }
    }
}

/// A tree where every node owns a vector of its children.
pub struct ChildVecTree<V, O = Ascending> {
    nodes: Vec<Option<Node<V>>>, // slots
    generations: Vec<u32>,       // last generation per slot (persists across frees)
    free_list: Vec<usize>,
    roots: Vec<NodeId>,
    order: O,
    len: usize,
}

impl<V, O: core::fmt::Debug> core::fmt::Debug for ChildVecTree<V, O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChildVecTree")
            .field("nodes_total", &self.nodes.len())
            .field("nodes_alive", &self.len)
            .field("free_list", &self.free_list.len())
            .field("roots", &self.roots.len())
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

impl<V, O: Default> Default for ChildVecTree<V, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, O: Default> ChildVecTree<V, O> {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self::with_order(O::default())
    }
}

impl<V, O> ChildVecTree<V, O> {
    /// Create a new empty tree placing siblings with `order`.
    pub fn with_order(order: O) -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            roots: Vec::new(),
            order,
            len: 0,
        }
    }

    /// Returns `true` if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .is_some_and(|n| n.generation == id.1)
    }

    /// Roots in sibling order.
    pub fn root_ids(&self) -> &[NodeId] {
        &self.roots
    }

    /// Children of `id` in sibling order.
    pub fn child_ids(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Sibling to the left of `id`.
    pub fn left_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).left_sibling
    }

    /// Sibling to the right of `id`.
    pub fn right_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).right_sibling
    }

    /// Panics if any parent, child, or sibling link disagrees with its counterpart.
    pub fn sanity_check(&self) {
        self.check_siblings(None, &self.roots);
        let mut alive = 0;
        for (idx, slot) in self.nodes.iter().enumerate() {
            let Some(node) = slot else {
                continue;
            };
            alive += 1;
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId stores a 32-bit slot index."
            )]
            let id = NodeId::new(idx as u32, node.generation);
            self.check_siblings(Some(id), &node.children);
            if let Some(parent) = node.parent {
                assert!(
                    self.node(parent).children.contains(&id),
                    "{id:?} missing from its parent's children"
                );
            } else {
                assert!(self.roots.contains(&id), "{id:?} is neither child nor root");
            }
        }
        assert_eq!(alive, self.len, "live node count drifted");
    }

    fn check_siblings(&self, parent: Option<NodeId>, siblings: &[NodeId]) {
        for (i, &id) in siblings.iter().enumerate() {
            let node = self.node(id);
            assert_eq!(node.parent, parent, "{id:?} has the wrong parent");
            let left = i.checked_sub(1).map(|l| siblings[l]);
            let right = siblings.get(i + 1).copied();
            assert_eq!(node.left_sibling, left, "left link of {id:?}");
            assert_eq!(node.right_sibling, right, "right link of {id:?}");
        }
    }

    /// Access a node; panics if `id` is stale.
    fn node(&self, id: NodeId) -> &Node<V> {
        self.nodes[id.idx()]
            .as_ref()
            .filter(|n| n.generation == id.1)
            .expect("dangling NodeId")
    }

    /// Access a node mutably; panics if `id` is stale.
    fn node_mut(&mut self, id: NodeId) -> &mut Node<V> {
        self.nodes[id.idx()]
            .as_mut()
            .filter(|n| n.generation == id.1)
            .expect("dangling NodeId")
    }

    fn siblings_mut(&mut self, parent: Option<NodeId>) -> &mut Vec<NodeId> {
        match parent {
            Some(p) => &mut self.node_mut(p).children,
            None => &mut self.roots,
        }
    }

    fn allocate(&mut self, value: V) -> NodeId {
        self.len += 1;
        if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, value));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId stores a 32-bit slot index."
            )]
            NodeId::new(idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, value)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId stores a 32-bit slot index."
            )]
            NodeId::new((self.nodes.len() - 1) as u32, generation)
        }
    }

    fn detach(&mut self, id: NodeId) {
        let (parent, left, right) = {
            let n = self.node(id);
            (n.parent, n.left_sibling, n.right_sibling)
        };
        self.siblings_mut(parent).retain(|c| *c != id);
        if let Some(l) = left {
            self.node_mut(l).right_sibling = right;
        }
        if let Some(r) = right {
            self.node_mut(r).left_sibling = left;
        }
        let n = self.node_mut(id);
        n.parent = None;
        n.left_sibling = None;
        n.right_sibling = None;
    }
}

impl<V, O: SiblingOrder<V>> ChildVecTree<V, O> {
    /// Insert a node under `parent`, or as a root if `None`.
    pub fn insert(&mut self, parent: Option<NodeId>, value: V) -> NodeId {
        let id = self.allocate(value);
        self.attach(id, parent);
        id
    }

    /// Remove `id` and its subtree. Returns the number of nodes removed.
    pub fn remove(&mut self, id: NodeId) -> usize {
        if !self.is_alive(id) {
            return 0;
        }
        self.detach(id);
        let mut removed = 0;
        let mut stack = alloc::vec![id];
        while let Some(next) = stack.pop() {
            let node = self.nodes[next.idx()].take().expect("dangling NodeId");
            stack.extend(node.children);
            self.free_list.push(next.idx());
            removed += 1;
        }
        self.len -= removed;
        removed
    }

    /// Move `id` and its subtree under `new_parent`.
    ///
    /// A node that already is a direct child of `new_parent` stays where it is.
    pub fn reparent(&mut self, id: NodeId, new_parent: NodeId) {
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

    fn is_ancestor(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        while let Some(parent) = self.node(node).parent {
            if parent == ancestor {
                return true;
            }
            node = parent;
        }
        false
    }

    fn attach(&mut self, id: NodeId, parent: Option<NodeId>) {
        let (pos, left, right) = {
            let value = &self.node(id).value;
            let siblings = match parent {
                Some(p) => &self.node(p).children,
                None => &self.roots,
            };
            let pos = if self.order.uses_sorting() {
                siblings
                    .iter()
                    .position(|s| self.order.is_ordered_before(value, &self.node(*s).value))
                    .unwrap_or(siblings.len())
            } else if parent.is_some() {
                0
            } else {
                siblings.len()
            };
            let left = pos.checked_sub(1).map(|i| siblings[i]);
            (pos, left, siblings.get(pos).copied())
        };
        self.siblings_mut(parent).insert(pos, id);
        if let Some(l) = left {
            self.node_mut(l).right_sibling = Some(id);
        }
        if let Some(r) = right {
            self.node_mut(r).left_sibling = Some(id);
        }
        let n = self.node_mut(id);
        n.parent = parent;
        n.left_sibling = left;
        n.right_sibling = right;
    }
}

impl<V, O: SiblingOrder<V>> TreeContract for ChildVecTree<V, O> {
    type Value = V;
    type Handle = NodeId;

    fn create_root(&mut self, value: V) -> NodeId {
        self.insert(None, value)
    }

    fn create_child(&mut self, parent: NodeId, value: V) -> NodeId {
        self.insert(Some(parent), value)
    }

    fn reparent(&mut self, child: NodeId, parent: NodeId) -> NodeId {
        Self::reparent(self, child, parent);
        child
    }

    fn erase(&mut self, node: NodeId) -> usize {
        self.remove(node)
    }

    fn roots(&self) -> Vec<NodeId> {
        self.roots.clone()
    }

    fn children(&self, parent: NodeId) -> Vec<NodeId> {
        self.node(parent).children.clone()
    }

    fn nth_child(&self, parent: NodeId, n: usize) -> Option<NodeId> {
        self.node(parent).children.get(n).copied()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    fn value(&self, node: NodeId) -> &V {
        &self.node(node).value
    }

    fn len(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use understory_hierarchy::Unordered;

    #[test]
    fn sorted_insert_links_siblings() {
        let mut tree = ChildVecTree::<u32>::new();
        let root = tree.insert(None, 0);
        let c = tree.insert(Some(root), 30);
        let a = tree.insert(Some(root), 10);
        let b = tree.insert(Some(root), 20);
        assert_eq!(tree.child_ids(root), &[a, b, c]);
        assert_eq!(tree.left_sibling(b), Some(a));
        assert_eq!(tree.right_sibling(b), Some(c));
        assert_eq!(tree.left_sibling(a), None);
        tree.sanity_check();
    }

    #[test]
    fn unordered_children_go_first() {
        let mut tree = ChildVecTree::<u32, Unordered>::new();
        let r0 = tree.insert(None, 5);
        let r1 = tree.insert(None, 1);
        let a = tree.insert(Some(r0), 1);
        let b = tree.insert(Some(r0), 2);
        assert_eq!(tree.root_ids(), &[r0, r1]);
        assert_eq!(tree.child_ids(r0), &[b, a]);
        tree.sanity_check();
    }

    #[test]
    fn liveness_insert_remove_reuse() {
        let mut tree = ChildVecTree::<u32>::new();
        let root = tree.insert(None, 0);
        let a = tree.insert(Some(root), 1);
        tree.insert(Some(a), 2);
        assert!(tree.is_alive(a));

        // Removing `a` frees its subtree; the id becomes stale.
        assert_eq!(tree.remove(a), 2);
        assert!(!tree.is_alive(a));
        assert_eq!(TreeContract::len(&tree), 1);

        // Slot reuse bumps the generation.
        let b = tree.insert(Some(root), 3);
        assert!(tree.is_alive(b));
        assert!(!tree.is_alive(a));
        if a.0 == b.0 {
            assert!(b.1 > a.1, "generation must increase on reuse");
        }
        tree.sanity_check();
    }

    #[test]
    fn reparent_keeps_subtree_and_links() {
        let mut tree = ChildVecTree::<u32>::new();
        let root = tree.insert(None, 0);
        let a = tree.insert(Some(root), 1);
        let b = tree.insert(Some(root), 2);
        let leaf = tree.insert(Some(a), 5);
        tree.reparent(a, b);
        assert_eq!(tree.child_ids(root), &[b]);
        assert_eq!(tree.child_ids(b), &[a]);
        assert_eq!(tree.child_ids(a), &[leaf]);
        assert_eq!(tree.left_sibling(b), None);
        tree.sanity_check();

        // Already a direct child: nothing moves.
        tree.reparent(a, b);
        assert_eq!(tree.child_ids(b), &[a]);
    }
}
