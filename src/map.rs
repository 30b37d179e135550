extern crate alloc;

use alloc::boxed::Box;
use core::{borrow::Borrow, fmt, iter::FusedIterator, marker::PhantomPinned, mem, ptr::NonNull};

use cordyceps::Linked;

use crate::{AvlTree, KeyError, Links, TreeNode};

/// An ordered map based on an [AVL tree].
///
/// Each entry lives in its own heap-allocated node of an intrusive [`AvlTree`].
///
/// [AVL tree]: https://en.wikipedia.org/wiki/AVL_tree
pub struct AvlMap<K: Ord + fmt::Debug, V> {
    tree: AvlTree<MapNode<K, V>>,
}

struct MapNode<K, V> {
    links: Links<MapNode<K, V>>,
    key: K,
    value: V,
    _unpin: PhantomPinned,
}

impl<K, V> MapNode<K, V> {
    fn new(key: K, value: V) -> Box<Self> {
        Box::new(MapNode {
            links: Links::new(),
            key,
            value,
            _unpin: PhantomPinned,
        })
    }
}

unsafe impl<K, V> Linked<Links<MapNode<K, V>>> for MapNode<K, V> {
    type Handle = Box<Self>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        Box::leak(r).into()
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<MapNode<K, V>>> {
        let ptr = ptr.as_ptr();
        unsafe { NonNull::new_unchecked(core::ptr::addr_of_mut!((*ptr).links)) }
    }
}

impl<K: Ord + fmt::Debug, V> TreeNode<Links<MapNode<K, V>>> for MapNode<K, V> {
    type Key = K;

    fn key(&self) -> &Self::Key {
        &self.key
    }
}

impl<K: Ord + fmt::Debug, V> AvlMap<K, V> {
    /// Creates a new, empty `AvlMap`.
    pub const fn new() -> Self {
        Self {
            tree: AvlTree::new(),
        }
    }

    /// Returns `true` if the map contains no elements.
    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of elements in the map.
    pub const fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns the height of the underlying tree.
    pub fn height(&self) -> usize {
        self.tree.height()
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        self.tree.assert_invariants();
    }

    /// Returns `true` if the map contains a value associated with `key`.
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.contains_key(key)
    }

    /// Returns a reference to the value associated with `key`.
    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.get(key).map(|node| &node.get_ref().value)
    }

    /// Returns a reference to the value associated with `key`, or a [`KeyError`] if there is none.
    #[inline]
    pub fn try_get<Q>(&self, key: &Q) -> Result<&V, KeyError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).ok_or(KeyError)
    }

    /// Returns a mutable reference to the value associated with `key`.
    #[inline]
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        // SAFETY: Only the value is exposed, and pinning is not structural for `node.value`.
        unsafe {
            self.tree
                .get_mut(key)
                .map(|node| &mut node.get_unchecked_mut().value)
        }
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map already contains `key`, its value is overwritten in place and the old value is
    /// returned. The tree is not restructured in that case.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(existing) = self.get_mut(&key) {
            return Some(mem::replace(existing, value));
        }

        let displaced = self.tree.insert(MapNode::new(key, value));
        debug_assert!(displaced.is_none());

        None
    }

    /// Removes the value associated with `key` from the map.
    ///
    /// Returns `None` if the map does not contain `key`.
    #[inline]
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.remove(key).map(|node| {
            let MapNode { value, .. } = *node;
            value
        })
    }

    /// Returns the first key-value pair in the map.
    ///
    /// The returned key is the minimum key in the map.
    #[inline]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.tree.first().map(|node| {
            let node = node.get_ref();
            (&node.key, &node.value)
        })
    }

    /// Removes and returns the first key-value pair in the map.
    ///
    /// The returned key is the minimum key in the map.
    #[inline]
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.tree.pop_first().map(|node| {
            let MapNode { key, value, .. } = *node;
            (key, value)
        })
    }

    /// Returns the last key-value pair in the map.
    ///
    /// The returned key is the maximum key in the map.
    #[inline]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.tree.last().map(|node| {
            let node = node.get_ref();
            (&node.key, &node.value)
        })
    }

    /// Removes and returns the last key-value pair in the map.
    ///
    /// The returned key is the maximum key in the map.
    #[inline]
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.tree.pop_last().map(|node| {
            let MapNode { key, value, .. } = *node;
            (key, value)
        })
    }

    /// Returns an iterator over the entries of the map, sorted by key.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.tree.iter(),
        }
    }

    /// Returns an iterator over the keys of the map, in sorted order.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over the values of the map, in key order.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator + '_ {
        self.iter().map(|(_, value)| value)
    }

    /// Clears the map, removing all elements.
    #[inline]
    pub fn clear(&mut self) {
        self.tree.clear();
    }
}

impl<K: Ord + fmt::Debug, V> Default for AvlMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for AvlMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord + fmt::Debug, V> Extend<(K, V)> for AvlMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord + fmt::Debug, V> FromIterator<(K, V)> for AvlMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = AvlMap::new();
        map.extend(iter);
        map
    }
}

impl<'a, K: Ord + fmt::Debug, V> IntoIterator for &'a AvlMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the entries of an [`AvlMap`], sorted by key.
pub struct Iter<'a, K: Ord + fmt::Debug, V> {
    inner: crate::Iter<'a, MapNode<K, V>>,
}

impl<'a, K: Ord + fmt::Debug, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|node| (&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K: Ord + fmt::Debug, V> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|node| (&node.key, &node.value))
    }
}

impl<'a, K: Ord + fmt::Debug, V> ExactSizeIterator for Iter<'a, K, V> {}

impl<'a, K: Ord + fmt::Debug, V> FusedIterator for Iter<'a, K, V> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_remove() {
        let mut map = AvlMap::new();

        assert_eq!(map.insert(2, "two"), None);
        assert_eq!(map.insert(1, "one"), None);
        assert_eq!(map.insert(3, "three"), None);
        map.assert_invariants();

        assert_eq!(map.len(), 3);
        assert_eq!(map.get(&1), Some(&"one"));
        assert_eq!(map.get(&4), None);
        assert!(map.contains_key(&3));

        assert_eq!(map.remove(&2), Some("two"));
        assert_eq!(map.remove(&2), None);
        map.assert_invariants();
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn insert_existing_overwrites_in_place() {
        let mut map: AvlMap<u32, u32> = (0..10).map(|k| (k, k)).collect();
        let before: Vec<_> = map.keys().copied().collect();
        let height = map.height();

        assert_eq!(map.insert(4, 40), Some(4));

        assert_eq!(map.get(&4), Some(&40));
        assert_eq!(map.len(), 10);
        assert_eq!(map.height(), height);
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), before);
        map.assert_invariants();
    }

    #[test]
    fn try_get_reports_missing_key() {
        let map: AvlMap<&str, u32> = [("a", 1), ("b", 2)].into_iter().collect();

        assert_eq!(map.try_get("a"), Ok(&1));
        assert_eq!(map.try_get("z"), Err(KeyError));
        assert_eq!(KeyError.to_string(), "key not found");
    }

    #[test]
    fn get_mut_updates_value() {
        let mut map = AvlMap::new();
        map.insert("x".to_string(), vec![1]);

        map.get_mut("x").expect("missing").push(2);

        assert_eq!(map.get("x"), Some(&vec![1, 2]));
    }

    #[test]
    fn first_last_pop() {
        let mut map: AvlMap<i32, char> = [(5, 'e'), (1, 'a'), (3, 'c')].into_iter().collect();

        assert_eq!(map.first_key_value(), Some((&1, &'a')));
        assert_eq!(map.last_key_value(), Some((&5, &'e')));
        assert_eq!(map.pop_first(), Some((1, 'a')));
        assert_eq!(map.pop_last(), Some((5, 'e')));
        assert_eq!(map.pop_last(), Some((3, 'c')));
        assert_eq!(map.pop_first(), None);
        assert!(map.is_empty());
    }

    #[test]
    fn iter_both_ends() {
        let map: AvlMap<u32, u32> = (0..6).map(|k| (k, k * 10)).collect();

        let mut iter = map.iter();
        assert_eq!(iter.len(), 6);
        assert_eq!(iter.next(), Some((&0, &0)));
        assert_eq!(iter.next_back(), Some((&5, &50)));
        assert_eq!(iter.len(), 4);

        let middle: Vec<_> = iter.map(|(k, _)| *k).collect();
        assert_eq!(middle, [1, 2, 3, 4]);

        let reversed: Vec<_> = map.values().rev().copied().collect();
        assert_eq!(reversed, [50, 40, 30, 20, 10, 0]);
    }

    #[test]
    fn debug_format() {
        let map: AvlMap<u32, &str> = [(2, "b"), (1, "a")].into_iter().collect();
        assert_eq!(format!("{map:?}"), r#"{1: "a", 2: "b"}"#);
    }

    #[test]
    fn drop_releases_values() {
        use std::rc::Rc;

        let value = Rc::new(());
        {
            let mut map = AvlMap::new();
            for key in 0..32 {
                map.insert(key, Rc::clone(&value));
            }
            map.remove(&7);
            assert_eq!(Rc::strong_count(&value), 32);
        }
        assert_eq!(Rc::strong_count(&value), 1);
    }
}
