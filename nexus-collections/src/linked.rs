//! Linked trait for intrusive doubly-linked list nodes.
//!
//! Nodes embed their own prev/next links, allowing O(1) insertion and removal
//! without the list owning the data. A node can sit in a list and a tree at
//! the same time by embedding both sets of links; range spaces use this to
//! keep an in-order list alongside their search tree.

use crate::{Index, Storage};

/// Trait for types that can participate in a doubly-linked list.
///
/// Implementors embed prev/next indices directly in their struct.
/// This enables O(1) removal given only a node's index (no search required).
///
/// # Example
///
/// ```
/// use nexus_collections::{Index, Linked};
///
/// struct Span {
///     lo: u32,
///     hi: u32,
///     next: u32,
///     prev: u32,
/// }
///
/// impl Linked<u32> for Span {
///     fn next(&self) -> u32 { self.next }
///     fn prev(&self) -> u32 { self.prev }
///     fn set_next(&mut self, idx: u32) { self.next = idx; }
///     fn set_prev(&mut self, idx: u32) { self.prev = idx; }
/// }
/// ```
pub trait Linked<Idx: Index> {
    /// Returns the next node's index, or `Idx::NONE` if this is the tail.
    fn next(&self) -> Idx;

    /// Returns the previous node's index, or `Idx::NONE` if this is the head.
    fn prev(&self) -> Idx;

    /// Sets the next node's index.
    fn set_next(&mut self, idx: Idx);

    /// Sets the previous node's index.
    fn set_prev(&mut self, idx: Idx);
}

/// A doubly-linked list over external storage.
///
/// The list itself only stores head, tail, and length. Nodes live in
/// user-provided storage and embed their own links via the [`Linked`] trait.
///
/// # Example
///
/// ```
/// use nexus_collections::{Index, Linked, List, Pool, Storage};
///
/// #[derive(Debug)]
/// struct Node {
///     value: u64,
///     next: u32,
///     prev: u32,
/// }
///
/// impl Node {
///     fn new(value: u64) -> Self {
///         Self { value, next: u32::NONE, prev: u32::NONE }
///     }
/// }
///
/// impl Linked<u32> for Node {
///     fn next(&self) -> u32 { self.next }
///     fn prev(&self) -> u32 { self.prev }
///     fn set_next(&mut self, idx: u32) { self.next = idx; }
///     fn set_prev(&mut self, idx: u32) { self.prev = idx; }
/// }
///
/// let mut storage: Pool<Node> = Pool::new();
/// let mut list: List<u32> = List::new();
///
/// let a = storage.insert(Node::new(1));
/// let b = storage.insert(Node::new(2));
/// let c = storage.insert(Node::new(3));
///
/// list.push_back(&mut storage, a);
/// list.push_back(&mut storage, c);
/// list.insert_before(&mut storage, c, b);
///
/// let order: Vec<u64> = list
///     .indices(&storage)
///     .map(|i| storage.get(i).unwrap().value)
///     .collect();
/// assert_eq!(order, vec![1, 2, 3]);
///
/// // Remove from middle - O(1)
/// list.remove(&mut storage, b);
/// assert_eq!(list.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct List<Idx: Index> {
    head: Idx,
    tail: Idx,
    len: usize,
}

impl<Idx: Index> Default for List<Idx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Idx: Index> List<Idx> {
    /// Creates an empty list.
    #[inline]
    pub const fn new() -> Self {
        Self {
            head: Idx::NONE,
            tail: Idx::NONE,
            len: 0,
        }
    }

    /// Returns the head node's index, or `Idx::NONE` if empty.
    #[inline]
    pub const fn head(&self) -> Idx {
        self.head
    }

    /// Returns the tail node's index, or `Idx::NONE` if empty.
    #[inline]
    pub const fn tail(&self) -> Idx {
        self.tail
    }

    /// Returns the number of nodes in the list.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the list is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends a node to the back of the list.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is not valid in storage.
    #[inline]
    pub fn push_back<T, S>(&mut self, storage: &mut S, idx: Idx)
    where
        T: Linked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let tail = self.tail;
        {
            let node = storage.get_mut(idx).expect("invalid index");
            node.set_prev(tail);
            node.set_next(Idx::NONE);
        }

        if tail.is_some() {
            storage.get_mut(tail).expect("corrupt tail").set_next(idx);
        } else {
            self.head = idx;
        }

        self.tail = idx;
        self.len += 1;
    }

    /// Unlinks a node from the list.
    ///
    /// The node remains in storage with its links cleared.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is not valid in storage.
    #[inline]
    pub fn remove<T, S>(&mut self, storage: &mut S, idx: Idx)
    where
        T: Linked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let (prev, next) = {
            let node = storage.get(idx).expect("invalid index");
            (node.prev(), node.next())
        };

        if prev.is_some() {
            storage.get_mut(prev).expect("corrupt prev link").set_next(next);
        } else {
            self.head = next;
        }

        if next.is_some() {
            storage.get_mut(next).expect("corrupt next link").set_prev(prev);
        } else {
            self.tail = prev;
        }

        let node = storage.get_mut(idx).expect("invalid index");
        node.set_prev(Idx::NONE);
        node.set_next(Idx::NONE);

        self.len -= 1;
    }

    /// Links `idx` directly after `after`.
    ///
    /// # Panics
    ///
    /// Panics if `after` or `idx` is not valid in storage.
    #[inline]
    pub fn insert_after<T, S>(&mut self, storage: &mut S, after: Idx, idx: Idx)
    where
        T: Linked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let next = storage.get(after).expect("invalid index").next();

        {
            let node = storage.get_mut(idx).expect("invalid index");
            node.set_prev(after);
            node.set_next(next);
        }

        storage.get_mut(after).expect("invalid index").set_next(idx);

        if next.is_some() {
            storage.get_mut(next).expect("corrupt next link").set_prev(idx);
        } else {
            self.tail = idx;
        }

        self.len += 1;
    }

    /// Links `idx` directly before `before`.
    ///
    /// # Panics
    ///
    /// Panics if `before` or `idx` is not valid in storage.
    #[inline]
    pub fn insert_before<T, S>(&mut self, storage: &mut S, before: Idx, idx: Idx)
    where
        T: Linked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let prev = storage.get(before).expect("invalid index").prev();

        {
            let node = storage.get_mut(idx).expect("invalid index");
            node.set_next(before);
            node.set_prev(prev);
        }

        storage.get_mut(before).expect("invalid index").set_prev(idx);

        if prev.is_some() {
            storage.get_mut(prev).expect("corrupt prev link").set_next(idx);
        } else {
            self.head = idx;
        }

        self.len += 1;
    }

    /// Forgets every node without touching storage.
    ///
    /// Used when the backing storage is cleared in bulk, at which point the
    /// nodes (and their links) no longer exist.
    #[inline]
    pub fn reset(&mut self) {
        self.head = Idx::NONE;
        self.tail = Idx::NONE;
        self.len = 0;
    }

    /// Returns an iterator over node indices, head to tail.
    ///
    /// The iterator is double-ended.
    pub fn indices<'a, T, S>(&self, storage: &'a S) -> Indices<'a, T, S, Idx>
    where
        T: Linked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        Indices {
            storage,
            front: self.head,
            back: self.tail,
            remaining: self.len,
            _marker: core::marker::PhantomData,
        }
    }
}

/// Iterator over the node indices of a [`List`].
pub struct Indices<'a, T, S, Idx: Index> {
    storage: &'a S,
    front: Idx,
    back: Idx,
    remaining: usize,
    _marker: core::marker::PhantomData<fn() -> T>,
}

impl<T, S, Idx> Iterator for Indices<'_, T, S, Idx>
where
    Idx: Index,
    T: Linked<Idx>,
    S: Storage<T, Index = Idx>,
{
    type Item = Idx;

    #[inline]
    fn next(&mut self) -> Option<Idx> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.front;
        self.front = self.storage.get(idx).expect("corrupt list").next();
        self.remaining -= 1;
        Some(idx)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, S, Idx> DoubleEndedIterator for Indices<'_, T, S, Idx>
where
    Idx: Index,
    T: Linked<Idx>,
    S: Storage<T, Index = Idx>,
{
    #[inline]
    fn next_back(&mut self) -> Option<Idx> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.back;
        self.back = self.storage.get(idx).expect("corrupt list").prev();
        self.remaining -= 1;
        Some(idx)
    }
}

impl<T, S, Idx> ExactSizeIterator for Indices<'_, T, S, Idx>
where
    Idx: Index,
    T: Linked<Idx>,
    S: Storage<T, Index = Idx>,
{
}

/// Two walks are equal when they cover the same nodes of the same storage.
impl<T, S, Idx: Index> PartialEq for Indices<'_, T, S, Idx> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.storage, other.storage)
            && self.remaining == other.remaining
            && (self.remaining == 0 || self.front == other.front)
    }
}

impl<T, S, Idx: Index> Eq for Indices<'_, T, S, Idx> {}
