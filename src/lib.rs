//! An intrusive AVL tree.
//!
//! Nodes are caller-owned allocations which embed a [`Links`] block and implement
//! [`cordyceps::Linked`]. The tree takes ownership of a node's handle on insertion and hands it back
//! on removal. [`AvlMap`] wraps the tree into an owning ordered map.

// Conventions used in comments:
// - The balance factor of a node `x` is denoted `b(x)`. It is the height of `x`'s left subtree
//   minus the height of its right subtree; a missing subtree has height 0.
// - A node is left-heavy if `b(x) > 0` and right-heavy if `b(x) < 0`.
//
// The invariant of an AVL tree is that `b(x) ∈ {-1, 0, 1}` for every node `x`. It holds between
// public operations. While an insertion or removal unwinds, a single node may reach `b(x) = ±2`;
// it is rotated back into shape before the unwinding passes it.
//
// Insertion and removal descend recursively and report on the way back up whether the subtree they
// return from changed height. A node adjusts `b(x)` only when told that one of its subtrees grew or
// shrank, so subtree heights are never measured.

use core::{
    cell::UnsafeCell, cmp::Ordering, fmt, marker::PhantomPinned, mem, ops::Not, pin::Pin,
    ptr::NonNull,
};
use std::borrow::Borrow;

use cordyceps::Linked;

mod balance;
mod cursor;
mod debug;
mod error;
mod iter;
pub mod map;

#[cfg(any(test, feature = "model"))]
pub mod model;

#[cfg(test)]
mod tests;

pub use cursor::{Cursor, CursorMut};
pub use error::KeyError;
pub use iter::Iter;
pub use map::AvlMap;

pub trait TreeNode<L>: Linked<L> {
    type Key: Ord + fmt::Debug;

    fn key(&self) -> &Self::Key;
}

/// An intrusive AVL tree.
///
/// Lookups, insertions and removals complete in _O(log(n))_ time. Balance factors are maintained
/// incrementally: no operation ever recomputes the height of a subtree.
pub struct AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    root: Link<T>,
    len: usize,
}

/// The tree links embedded in every node of an [`AvlTree`].
pub struct Links<T: ?Sized> {
    inner: UnsafeCell<LinksInner<T>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Dir {
    Left = 0,
    Right = 1,
}

impl Dir {
    /// The change in a node's balance factor when its `self` subtree grows by one level.
    #[inline]
    fn balance_delta(self) -> i8 {
        match self {
            Dir::Left => 1,
            Dir::Right => -1,
        }
    }
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

#[repr(C)]
struct LinksInner<T: ?Sized> {
    parent: Link<T>,
    children: [Link<T>; 2],
    balance: i8,
    _unpin: PhantomPinned,
}

type Link<T> = Option<NonNull<T>>;

// Result of inserting into a subtree.
struct Inserted<T: ?Sized> {
    // Root of the subtree after rebalancing.
    root: NonNull<T>,
    // Whether the subtree is one level taller than before.
    grew: bool,
    // The node which the inserted item replaced, if its key was already present.
    displaced: Link<T>,
}

// Result of removing from a subtree.
struct Removed<T: ?Sized> {
    root: Link<T>,
    shrank: bool,
    removed: Link<T>,
}

impl<T> AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns a new empty tree.
    pub const fn new() -> AvlTree<T> {
        AvlTree { root: None, len: 0 }
    }

    /// Returns `true` if the tree contains no elements.
    pub const fn is_empty(&self) -> bool {
        let empty = self.len() == 0;

        if cfg!(debug_assertions) {
            // Can't use assert_eq!() in const fn.
            assert!(empty == self.root.is_none());
        }

        empty
    }

    /// Returns the number of elements in the tree.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns the number of nodes on the longest path from the root to a leaf.
    ///
    /// This walks the heavier side of every node and completes in _O(log(n))_ time.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut opt_cur = self.root;

        while let Some(cur) = opt_cur {
            height += 1;

            unsafe {
                let links = self.links(cur);
                opt_cur = if links.balance() < 0 {
                    links.right()
                } else {
                    links.left()
                };
            }
        }

        height
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        let mut count = 0;

        if let Some(root) = self.root {
            unsafe {
                assert_eq!(self.links(root).parent(), None, "root has a parent link");
                self.assert_invariants_at(root, &mut count);
            }
        }

        assert_eq!(count, self.len, "reachable node count must match `len`");

        // Ensure in-order traversal is strictly increasing.
        let mut keys = self.iter().map(|node| node.key());
        if let Some(mut prev) = keys.next() {
            for key in keys {
                assert!(prev < key, "keys out of order: {prev:?} before {key:?}");
                prev = key;
            }
        }
    }

    // Checks the subtree rooted at `node` and returns its height.
    unsafe fn assert_invariants_at(&self, node: NonNull<T>, count: &mut usize) -> usize {
        *count += 1;

        unsafe {
            let links = self.links(node);
            let mut heights = [0_usize; 2];

            for dir in [Dir::Left, Dir::Right] {
                if let Some(child) = links.child(dir) {
                    // Ensure child's parent link points to this node.
                    let parent = self
                        .links(child)
                        .parent()
                        .expect("child parent pointer not set");
                    assert_eq!(node, parent);

                    heights[dir as usize] = self.assert_invariants_at(child, count);
                }
            }

            // Ensure the stored balance factor is exact and within bounds.
            let balance = links.balance();
            let actual = heights[0] as isize - heights[1] as isize;
            assert_eq!(
                balance as isize,
                actual,
                "stale balance factor at {:?}",
                node.as_ref().key()
            );
            assert!(
                (-1..=1).contains(&balance),
                "unbalanced node {:?}: {balance}",
                node.as_ref().key()
            );

            1 + heights[0].max(heights[1])
        }
    }

    /// Returns `true` if the tree contains an element with the given key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.get_raw(key).is_some()
    }

    /// Returns a reference to the node corresponding to `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<Pin<&T>>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let ptr = self.get_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_ref())) }
    }

    /// Returns a pinned mutable reference to the node corresponding to `key`.
    ///
    /// # Safety
    ///
    /// The caller must ensure that neither the links nor the key of the returned node are modified.
    pub unsafe fn get_mut<Q>(&mut self, key: &Q) -> Option<Pin<&mut T>>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let mut ptr = self.get_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_mut())) }
    }

    fn get_raw<Q>(&self, key: &Q) -> Link<T>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let mut opt_cur = self.root;

        loop {
            let cur = opt_cur?;

            unsafe {
                match key.cmp(cur.as_ref().key().borrow()) {
                    Ordering::Less => opt_cur = self.links(cur).left(),
                    Ordering::Equal => return Some(cur),
                    Ordering::Greater => opt_cur = self.links(cur).right(),
                }
            }
        }
    }

    /// Returns the minimum element of the tree.
    pub fn first(&self) -> Option<Pin<&T>> {
        let first = self.first_raw()?;
        unsafe { Some(Pin::new_unchecked(first.as_ref())) }
    }

    /// Returns the maximum element of the tree.
    pub fn last(&self) -> Option<Pin<&T>> {
        let last = self.last_raw()?;
        unsafe { Some(Pin::new_unchecked(last.as_ref())) }
    }

    /// Removes and returns the minimum element of the tree.
    pub fn pop_first(&mut self) -> Option<T::Handle> {
        let first = self.first_raw()?;
        unsafe { Some(self.remove_at(first)) }
    }

    /// Removes and returns the maximum element of the tree.
    pub fn pop_last(&mut self) -> Option<T::Handle> {
        let last = self.last_raw()?;
        unsafe { Some(self.remove_at(last)) }
    }

    /// Returns an iterator over the elements of the tree, in ascending key order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// Returns a cursor pointing at the minimum element of the tree.
    pub fn cursor_first(&self) -> Cursor<'_, T> {
        Cursor::new(self, self.first_raw())
    }

    /// Returns a cursor pointing at the maximum element of the tree.
    pub fn cursor_last(&self) -> Cursor<'_, T> {
        Cursor::new(self, self.last_raw())
    }

    /// Returns an editing cursor pointing at the minimum element of the tree.
    pub fn cursor_first_mut(&mut self) -> CursorMut<'_, T> {
        let first = self.first_raw();
        CursorMut::new(self, first)
    }

    /// Returns an editing cursor pointing at the maximum element of the tree.
    pub fn cursor_last_mut(&mut self) -> CursorMut<'_, T> {
        let last = self.last_raw();
        CursorMut::new(self, last)
    }

    #[inline]
    fn first_raw(&self) -> Link<T> {
        self.root
            .map(|root| unsafe { self.extreme_in_subtree(root, Dir::Left) })
    }

    #[inline]
    fn last_raw(&self) -> Link<T> {
        self.root
            .map(|root| unsafe { self.extreme_in_subtree(root, Dir::Right) })
    }

    // Returns the node reached by following `dir` links from `root` for as long as possible.
    //
    // With `Dir::Left` this is the minimum of the subtree, with `Dir::Right` the maximum.
    #[inline]
    unsafe fn extreme_in_subtree(&self, root: NonNull<T>, dir: Dir) -> NonNull<T> {
        let mut cur = root;

        while let Some(next) = unsafe { self.links(cur).child(dir) } {
            cur = next;
        }

        cur
    }

    // Returns the in-order neighbour of `node`: the successor for `Dir::Right`, the predecessor for
    // `Dir::Left`.
    unsafe fn step_raw(&self, node: NonNull<T>, dir: Dir) -> Link<T> {
        unsafe {
            if let Some(child) = self.links(node).child(dir) {
                return Some(self.extreme_in_subtree(child, !dir));
            }

            // Ascend until arriving from the opposite side.
            let mut cur = node;
            while let Some(parent) = self.links(cur).parent() {
                if self.which_child(parent, cur) == !dir {
                    return Some(parent);
                }

                cur = parent;
            }

            None
        }
    }

    // Returns the in-order predecessor of `node`.
    #[inline]
    unsafe fn predecessor_raw(&self, node: NonNull<T>) -> Link<T> {
        unsafe { self.step_raw(node, Dir::Left) }
    }

    // Returns the in-order successor of `node`.
    #[inline]
    unsafe fn successor_raw(&self, node: NonNull<T>) -> Link<T> {
        unsafe { self.step_raw(node, Dir::Right) }
    }

    /// Inserts an item into the tree.
    ///
    /// If the tree already contains an item with an equal key, `item` takes its place without
    /// changing the shape of the tree, and the displaced item is returned.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, item: T::Handle) -> Option<T::Handle> {
        let ptr = T::into_ptr(item);

        unsafe {
            self.links_mut(ptr).clear();

            let inserted = self.insert_into(self.root, ptr);
            self.root = Some(inserted.root);
            self.links_mut(inserted.root).set_parent(None);

            match inserted.displaced {
                Some(old) => {
                    tracing::trace!(key = ?old.as_ref().key(), "replaced item with equal key");
                    Some(T::from_ptr(old))
                }
                None => {
                    self.len += 1;
                    None
                }
            }
        }
    }

    // Inserts `item` into the subtree rooted at `subtree`.
    //
    // `item` must have cleared links.
    unsafe fn insert_into(&mut self, subtree: Link<T>, item: NonNull<T>) -> Inserted<T> {
        unsafe {
            let Some(node) = subtree else {
                // The item becomes a leaf, which is one level taller than the empty subtree.
                return Inserted {
                    root: item,
                    grew: true,
                    displaced: None,
                };
            };

            let dir = match item.as_ref().key().cmp(node.as_ref().key()) {
                Ordering::Less => Dir::Left,
                Ordering::Greater => Dir::Right,
                Ordering::Equal => {
                    self.replace_node(node, item);

                    return Inserted {
                        root: item,
                        grew: false,
                        displaced: Some(node),
                    };
                }
            };

            let child = self.links(node).child(dir);
            let inserted = self.insert_into(child, item);
            self.links_mut(node).set_child(dir, Some(inserted.root));
            self.links_mut(inserted.root).set_parent(Some(node));

            let mut root = node;
            let mut grew = false;

            if inserted.grew {
                match self.links_mut(node).update_balance(dir.balance_delta()) {
                    // The shorter side caught up; the height is unchanged.
                    0 => (),
                    // Balanced node became lopsided; the height grew by one.
                    1 | -1 => grew = true,
                    // A rotation restores the height the subtree had before the insertion.
                    _ => root = self.rebalance(node),
                }
            }

            Inserted {
                root,
                grew,
                displaced: inserted.displaced,
            }
        }
    }

    /// Removes the item with the given key from the tree.
    ///
    /// Returns `None`, leaving the tree untouched, if no item has that key.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<T::Handle>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        unsafe {
            let removed = self.remove_from(self.root, key);
            self.root = removed.root;
            self.maybe_set_parent(removed.root, None);

            let node = removed.removed?;
            self.len -= 1;

            Some(T::from_ptr(node))
        }
    }

    /// Removes an arbitrary node from the tree.
    ///
    /// # Safety
    ///
    /// It is the caller's responsibility to ensure that `node` is an element of `self`, and not any
    /// other tree.
    pub unsafe fn remove_at(&mut self, node: NonNull<T>) -> T::Handle {
        unsafe {
            let key = node.as_ref().key();
            self.remove(key).expect("node must be an element of the tree")
        }
    }

    // Removes the node with key `key` from the subtree rooted at `subtree`.
    unsafe fn remove_from<Q>(&mut self, subtree: Link<T>, key: &Q) -> Removed<T>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        unsafe {
            let Some(mut node) = subtree else {
                return Removed {
                    root: None,
                    shrank: false,
                    removed: None,
                };
            };

            let dir = match key.cmp(node.as_ref().key().borrow()) {
                Ordering::Less => Dir::Left,
                Ordering::Greater => Dir::Right,
                Ordering::Equal => match (self.links(node).left(), self.links(node).right()) {
                    (Some(left), Some(_)) => {
                        // Predecessor substitution. The predecessor takes over this node's place
                        // and balance factor, while this node moves into the predecessor's old
                        // slot at the bottom of the left subtree. There it has no right child, so
                        // removing it from the left subtree ends in the case below.
                        let pred = self.extreme_in_subtree(left, Dir::Right);
                        self.swap_nodes(node, pred);
                        node = pred;

                        Dir::Left
                    }

                    (only, None) | (None, only) => {
                        let parent = self.links(node).parent();
                        self.maybe_set_parent(only, parent);
                        self.links_mut(node).clear();

                        return Removed {
                            root: only,
                            shrank: true,
                            removed: Some(node),
                        };
                    }
                },
            };

            let child = self.links(node).child(dir);
            let removed = self.remove_from(child, key);
            self.links_mut(node).set_child(dir, removed.root);
            self.maybe_set_parent(removed.root, Some(node));

            let mut root = node;
            let mut shrank = false;

            if removed.shrank {
                // The `dir` side lost a level, tipping the balance towards `!dir`.
                let balance = self
                    .links_mut(node)
                    .update_balance(-dir.balance_delta());

                // Going from lopsided to balanced means the taller side lost a level.
                shrank = balance == 0;

                if balance.abs() == 2 {
                    root = self.rebalance(node);

                    // Unlike insertion, a rotation after removal shortens the subtree unless the
                    // sibling was balanced, in which case the new root ends up lopsided.
                    shrank = self.links(root).balance() == 0;
                }
            }

            Removed {
                root: Some(root),
                shrank,
                removed: removed.removed,
            }
        }
    }

    /// Clears the tree, removing all elements.
    pub fn clear(&mut self) {
        let mut opt_cur = self.root.take();

        while let Some(cur) = opt_cur {
            unsafe {
                // Descend to the minimum node. It is a left child, or the root.
                let cur = self.extreme_in_subtree(cur, Dir::Left);
                let parent = self.links(cur).parent();
                let right = self.links(cur).right();

                // Elevate the node's right child (which may be None).
                if let Some(parent) = parent {
                    self.links_mut(parent).set_left(right);
                }
                self.maybe_set_parent(right, parent);

                // Drop the node.
                self.links_mut(cur).clear();
                drop(T::from_ptr(cur));
                self.len -= 1;

                // If the node had no right child, climb to the parent. If the node had no parent,
                // the tree is empty.
                opt_cur = right.or(parent);
            }
        }

        debug_assert_eq!(self.len(), 0);
    }

    // Support methods ========================================================

    #[inline]
    unsafe fn links<'a>(&self, node: NonNull<T>) -> &'a Links<T> {
        unsafe { T::links(node).as_ref() }
    }

    #[inline]
    unsafe fn links_mut<'a>(&mut self, node: NonNull<T>) -> &'a mut Links<T> {
        unsafe { T::links(node).as_mut() }
    }

    unsafe fn maybe_set_parent(&mut self, opt_node: Link<T>, parent: Link<T>) {
        let Some(node) = opt_node else {
            return;
        };

        unsafe { self.links_mut(node).set_parent(parent) };
    }

    #[inline]
    unsafe fn replace_child_or_set_root(
        &mut self,
        parent: Link<T>,
        old_child: NonNull<T>,
        new_child: Link<T>,
    ) {
        match parent {
            Some(parent) => unsafe { self.replace_child(parent, old_child, new_child) },
            None => self.root = new_child,
        }
    }

    // Replaces the child pointer of `parent` pointing at `old_child` with `new_child`.
    //
    // `new_child`'s parent pointer is not updated.
    //
    // # Safety
    //
    // The caller must ensure that the following conditions hold:
    // - `old_child` is a child node of `parent`.
    // - `new_child` is not a child node of `parent`.
    #[cfg(not(debug_assertions))]
    #[inline]
    unsafe fn replace_child(&mut self, parent: NonNull<T>, old_child: NonNull<T>, new_child: Link<T>) {
        unsafe {
            let dir = self.which_child(parent, old_child);
            self.links_mut(parent).set_child(dir, new_child);
        }
    }

    // Replaces the child pointer of `parent` pointing at `old_child` with `new_child`.
    //
    // `new_child`'s parent pointer is not updated.
    //
    // # Safety
    //
    // The caller must ensure that the following conditions hold:
    // - `old_child` is a child node of `parent`.
    // - `new_child` is not a child node of `parent`.
    #[cfg(debug_assertions)]
    unsafe fn replace_child(&mut self, parent: NonNull<T>, old_child: NonNull<T>, new_child: Link<T>) {
        unsafe {
            let links = self.links(parent);

            let dir = if links.left() == Some(old_child) {
                Dir::Left
            } else if links.right() == Some(old_child) {
                Dir::Right
            } else {
                unreachable!("`old_child` must be a child of `parent`");
            };

            if let Some(new_child) = new_child {
                assert_ne!(
                    links.child(!dir),
                    Some(new_child),
                    "`new_child` must not be a child of `parent`"
                );
            }

            self.links_mut(parent).set_child(dir, new_child);
        }
    }

    // Puts `new` in the place of `old`, which leaves the tree with cleared links.
    //
    // `new` inherits `old`'s parent, children and balance factor, so the shape of the tree is
    // unchanged. The keys of the two nodes must be equal.
    unsafe fn replace_node(&mut self, old: NonNull<T>, new: NonNull<T>) {
        unsafe {
            let old_links = self.links(old);
            let parent = old_links.parent();
            let left = old_links.left();
            let right = old_links.right();
            let balance = old_links.balance();

            self.replace_child_or_set_root(parent, old, Some(new));
            self.maybe_set_parent(left, Some(new));
            self.maybe_set_parent(right, Some(new));

            let new_links = self.links_mut(new);
            new_links.set_parent(parent);
            new_links.set_left(left);
            new_links.set_right(right);
            new_links.set_balance(balance);

            self.links_mut(old).clear();
        }
    }

    // Exchanges the positions of two distinct nodes of the tree, along with their balance factors.
    //
    // Each node keeps its own key and payload, so the caller is responsible for restoring key
    // order. Either node may be the parent of the other.
    unsafe fn swap_nodes(&mut self, a: NonNull<T>, b: NonNull<T>) {
        if a == b {
            return;
        }

        unsafe {
            tracing::trace!(a = ?a.as_ref().key(), b = ?b.as_ref().key(), "exchanging nodes");

            let a_links = self.links(a);
            let a_slot = a_links.parent().map(|p| (p, self.which_child(p, a)));
            let a_children = [a_links.left(), a_links.right()];
            let a_balance = a_links.balance();

            let b_links = self.links(b);
            let b_slot = b_links.parent().map(|p| (p, self.which_child(p, b)));
            let b_children = [b_links.left(), b_links.right()];
            let b_balance = b_links.balance();

            // Links of the pair that point at one of them must point at the other afterwards.
            let swapped = |link: Link<T>| {
                link.map(|n| {
                    if n == a {
                        b
                    } else if n == b {
                        a
                    } else {
                        n
                    }
                })
            };

            for (node, slot, children, balance) in [
                (a, b_slot, b_children, b_balance),
                (b, a_slot, a_children, a_balance),
            ] {
                let links = self.links_mut(node);
                links.set_parent(swapped(slot.map(|(p, _)| p)));
                links.set_left(swapped(children[0]));
                links.set_right(swapped(children[1]));
                links.set_balance(balance);
            }

            // Re-point the neighbours outside the pair.
            for (node, slot) in [(a, b_slot), (b, a_slot)] {
                match slot {
                    None => self.root = Some(node),
                    Some((p, _)) if p == a || p == b => (),
                    Some((p, dir)) => {
                        self.links_mut(p).set_child(dir, Some(node));
                    }
                }

                let links = self.links(node);
                for child in [links.left(), links.right()].into_iter().flatten() {
                    if child != a && child != b {
                        self.links_mut(child).set_parent(Some(node));
                    }
                }
            }
        }
    }

    #[inline]
    unsafe fn which_child(&self, parent: NonNull<T>, child: NonNull<T>) -> Dir {
        if unsafe { self.links(parent).left() } == Some(child) {
            Dir::Left
        } else {
            Dir::Right
        }
    }
}

impl<T> Default for AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for AvlTree<T>
where
    T: TreeNode<Links<T>> + fmt::Debug + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> Drop for AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: ?Sized> Links<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: UnsafeCell::new(LinksInner {
                parent: None,
                children: [None; 2],
                balance: 0,
                _unpin: PhantomPinned,
            }),
        }
    }

    #[inline]
    fn is_leaf(&self) -> bool {
        self.left().is_none() && self.right().is_none()
    }

    #[inline]
    fn balance(&self) -> i8 {
        unsafe { (*self.inner.get()).balance }
    }

    #[inline]
    fn parent(&self) -> Link<T> {
        unsafe { (*self.inner.get()).parent }
    }

    #[inline]
    fn child(&self, dir: Dir) -> Link<T> {
        unsafe { (*self.inner.get()).children[dir as usize] }
    }

    #[inline]
    fn left(&self) -> Link<T> {
        self.child(Dir::Left)
    }

    #[inline]
    fn right(&self) -> Link<T> {
        self.child(Dir::Right)
    }

    #[inline]
    fn set_parent(&mut self, parent: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().parent, parent)
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().children[dir as usize], child)
    }

    #[inline]
    fn set_left(&mut self, left: Link<T>) -> Link<T> {
        self.set_child(Dir::Left, left)
    }

    #[inline]
    fn set_right(&mut self, right: Link<T>) -> Link<T> {
        self.set_child(Dir::Right, right)
    }

    #[inline]
    fn set_balance(&mut self, balance: i8) {
        self.inner.get_mut().balance = balance;
    }

    // Adds `diff` to the balance factor and returns the result.
    #[inline]
    fn update_balance(&mut self, diff: i8) -> i8 {
        let inner = self.inner.get_mut();
        inner.balance = inner
            .balance
            .checked_add(diff)
            .expect("balance factor overflow");
        inner.balance
    }

    // Detaches the links from any tree.
    #[inline]
    fn clear(&mut self) {
        let inner = self.inner.get_mut();
        inner.parent = None;
        inner.children = [None; 2];
        inner.balance = 0;
    }
}

impl<T: ?Sized> Default for Links<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Links<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Links")
            .field("parent", &self.parent())
            .field("left", &self.left())
            .field("right", &self.right())
            .field("balance", &self.balance())
            .finish()
    }
}
