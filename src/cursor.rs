use core::{marker::PhantomData, pin::Pin, ptr::NonNull};

use crate::{AvlTree, Link, Links, TreeNode};

/// A read-only cursor over an [`AvlTree`].
///
/// A cursor points either to an element of the tree or to a "ghost" non-element that sits between
/// the last element and the first.
pub struct Cursor<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    curs: CursorRaw<T>,
    phantom: PhantomData<&'tree AvlTree<T>>,
}

impl<'tree, T> Cursor<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) fn new(tree: &'tree AvlTree<T>, at: Link<T>) -> Cursor<'tree, T> {
        Cursor {
            curs: CursorRaw {
                tree: tree.into(),
                ptr: at,
            },
            phantom: PhantomData,
        }
    }

    /// Moves the cursor to the next element, or from the ghost to the first element.
    pub fn move_next(&mut self) {
        unsafe { self.curs.move_next() }
    }

    /// Moves the cursor to the previous element, or from the ghost to the last element.
    pub fn move_prev(&mut self) {
        unsafe { self.curs.move_prev() }
    }

    /// Returns the element under the cursor, or `None` at the ghost.
    pub fn get(&self) -> Option<&'tree T> {
        unsafe { self.curs.get() }
    }

    /// Returns the element after the cursor without moving it.
    pub fn peek_next(&self) -> Option<&'tree T> {
        unsafe { self.curs.peek_next() }
    }

    /// Returns the element before the cursor without moving it.
    pub fn peek_prev(&self) -> Option<&'tree T> {
        unsafe { self.curs.peek_prev() }
    }
}

/// A cursor over an [`AvlTree`] which supports removal.
///
/// Like [`Cursor`], it points either to an element or to the ghost non-element between the last
/// element and the first.
pub struct CursorMut<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    curs: CursorRaw<T>,
    phantom: PhantomData<&'tree mut AvlTree<T>>,
}

impl<'tree, T> CursorMut<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) fn new(tree: &'tree mut AvlTree<T>, at: Link<T>) -> CursorMut<'tree, T> {
        CursorMut {
            curs: CursorRaw {
                tree: tree.into(),
                ptr: at,
            },
            phantom: PhantomData,
        }
    }

    /// Returns a read-only cursor at the same position.
    ///
    /// The `CursorMut` remains immutably borrowed for the lifetime of the returned `Cursor`.
    pub fn as_cursor(&self) -> Cursor<'_, T> {
        Cursor {
            curs: CursorRaw {
                tree: self.curs.tree,
                ptr: self.curs.ptr,
            },
            phantom: PhantomData,
        }
    }

    /// Moves the cursor to the next element, or from the ghost to the first element.
    pub fn move_next(&mut self) {
        unsafe { self.curs.move_next() }
    }

    /// Moves the cursor to the previous element, or from the ghost to the last element.
    pub fn move_prev(&mut self) {
        unsafe { self.curs.move_prev() }
    }

    /// Returns the element under the cursor, or `None` at the ghost.
    pub fn get(&self) -> Option<&T> {
        unsafe { self.curs.get() }
    }

    /// Returns a pinned mutable reference to the element under the cursor.
    ///
    /// # Safety
    ///
    /// The caller must not change the element's key or links through the returned reference.
    pub unsafe fn get_mut(&mut self) -> Option<Pin<&mut T>> {
        self.curs
            .ptr
            .map(|mut p| unsafe { Pin::new_unchecked(p.as_mut()) })
    }

    /// Returns the element after the cursor without moving it.
    pub fn peek_next(&self) -> Option<&T> {
        unsafe { self.curs.peek_next() }
    }

    /// Returns the element before the cursor without moving it.
    pub fn peek_prev(&self) -> Option<&T> {
        unsafe { self.curs.peek_prev() }
    }

    /// Removes the element under the cursor and moves the cursor to the next element.
    ///
    /// At the ghost this returns `None` and changes nothing.
    pub fn remove_current(&mut self) -> Option<T::Handle> {
        unsafe { self.curs.remove_current() }
    }

    /// Removes the element under the cursor and moves the cursor to the previous element.
    ///
    /// At the ghost this returns `None` and changes nothing.
    pub fn remove_current_and_move_prev(&mut self) -> Option<T::Handle> {
        unsafe { self.curs.remove_current_and_move_prev() }
    }
}

// Removal exchanges nodes rather than their contents, so a pointer to any element other than the
// removed one stays valid across `remove_at`.
struct CursorRaw<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    tree: NonNull<AvlTree<T>>,
    ptr: Link<T>,
}

impl<T> CursorRaw<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    unsafe fn next_ptr(&self) -> Link<T> {
        unsafe {
            let tree = self.tree.as_ref();

            match self.ptr {
                Some(p) => tree.successor_raw(p),
                None => tree.first_raw(),
            }
        }
    }

    unsafe fn prev_ptr(&self) -> Link<T> {
        unsafe {
            let tree = self.tree.as_ref();

            match self.ptr {
                Some(p) => tree.predecessor_raw(p),
                None => tree.last_raw(),
            }
        }
    }

    unsafe fn move_next(&mut self) {
        self.ptr = unsafe { self.next_ptr() };
    }

    unsafe fn move_prev(&mut self) {
        self.ptr = unsafe { self.prev_ptr() };
    }

    unsafe fn get<'a>(&self) -> Option<&'a T> {
        self.ptr.map(|p| unsafe { p.as_ref() })
    }

    unsafe fn peek_next<'a>(&self) -> Option<&'a T> {
        unsafe { self.next_ptr().map(|p| p.as_ref()) }
    }

    unsafe fn peek_prev<'a>(&self) -> Option<&'a T> {
        unsafe { self.prev_ptr().map(|p| p.as_ref()) }
    }

    unsafe fn remove_current(&mut self) -> Option<T::Handle> {
        let remove = self.ptr?;

        unsafe {
            self.move_next();
            Some(self.tree.as_mut().remove_at(remove))
        }
    }

    unsafe fn remove_current_and_move_prev(&mut self) -> Option<T::Handle> {
        let remove = self.ptr?;

        unsafe {
            self.move_prev();
            Some(self.tree.as_mut().remove_at(remove))
        }
    }
}
