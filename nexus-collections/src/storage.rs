//! Storage trait for slab-like containers with stable indices.
//!
//! Storage provides insert/remove/get operations where indices remain
//! valid until explicitly removed. Node-based structures ([`List`],
//! [`RbTree`]) link nodes by index instead of by pointer, so a rotation or a
//! removal can never leave a dangling reference behind.
//!
//! Storage is also the allocation capability of those structures: removed
//! slots go onto a free list and are handed out again by the next insert, and
//! [`Storage::clear`] releases everything in one sweep.
//!
//! [`List`]: crate::List
//! [`RbTree`]: crate::RbTree

use crate::Index;

/// Slab-like storage with stable indices.
///
/// # Requirements
///
/// Implementations must provide:
/// - **Stable indices**: an index remains valid until explicitly removed
/// - **O(1)** insert, remove, get operations
/// - **Slot reuse**: removed slots are reused by future inserts
///
/// Insertion is infallible. Running out of memory is not recoverable and
/// aborts through the global allocator, the same way `Vec::push` does.
///
/// # Implementations
///
/// - [`Pool<T>`] - growable, free-list recycling (in this crate)
/// - `slab::Slab<T>` - growable (feature `slab`)
pub trait Storage<T> {
    /// Index type for this storage.
    type Index: Index;

    /// Inserts a value, returning its stable index.
    fn insert(&mut self, value: T) -> Self::Index;

    /// Removes and returns the value at `index`, if present.
    ///
    /// The slot is recycled by a later [`insert`](Storage::insert).
    fn remove(&mut self, index: Self::Index) -> Option<T>;

    /// Returns a reference to the value at `index`, if present.
    fn get(&self, index: Self::Index) -> Option<&T>;

    /// Returns a mutable reference to the value at `index`, if present.
    fn get_mut(&mut self, index: Self::Index) -> Option<&mut T>;

    /// Returns the number of occupied slots.
    fn len(&self) -> usize;

    /// Returns `true` if no slots are occupied.
    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every stored value and releases all slots.
    ///
    /// Any structure still holding indices into this storage is left with
    /// dangling links and must be reset as well.
    fn clear(&mut self);
}

// =============================================================================
// Pool - growable slots with a LIFO free list
// =============================================================================

/// Growable storage with free-list slot recycling.
///
/// Slots live in a single `Vec`. Removing a value pushes its index onto a
/// free stack; the next insert pops it, so a workload that churns nodes
/// without growing never touches the allocator.
///
/// # Example
///
/// ```
/// use nexus_collections::{Pool, Storage};
///
/// let mut pool: Pool<u64> = Pool::with_capacity(16);
///
/// let a = pool.insert(42);
/// assert_eq!(pool.get(a), Some(&42));
///
/// assert_eq!(pool.remove(a), Some(42));
/// let b = pool.insert(7);
/// assert_eq!(a, b); // slot reused
/// ```
#[derive(Debug, Clone)]
pub struct Pool<T, Idx: Index = u32> {
    slots: Vec<Option<T>>,
    free: Vec<Idx>,
    len: usize,
}

impl<T, Idx: Index> Default for Pool<T, Idx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, Idx: Index> Pool<T, Idx> {
    /// Creates an empty pool without allocating.
    #[inline]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Creates an empty pool with room for `capacity` values before it grows.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Returns the number of slots allocated so far (occupied or free).
    #[inline]
    pub fn slots(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of recycled slots waiting for reuse.
    #[inline]
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// Returns the number of values the pool can hold without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    #[inline]
    fn slot(&self, index: Idx) -> Option<&Option<T>> {
        if index.is_none() {
            return None;
        }
        self.slots.get(index.as_usize())
    }
}

impl<T, Idx: Index> Storage<T> for Pool<T, Idx> {
    type Index = Idx;

    #[inline]
    fn insert(&mut self, value: T) -> Self::Index {
        self.len += 1;

        if let Some(idx) = self.free.pop() {
            self.slots[idx.as_usize()] = Some(value);
            return idx;
        }

        let i = self.slots.len();
        assert!(
            i < Idx::NONE.as_usize(),
            "pool exhausted the index type's range"
        );
        self.slots.push(Some(value));
        Idx::from_usize(i)
    }

    #[inline]
    fn remove(&mut self, index: Self::Index) -> Option<T> {
        if index.is_none() {
            return None;
        }
        let value = self.slots.get_mut(index.as_usize())?.take()?;
        self.free.push(index);
        self.len -= 1;
        Some(value)
    }

    #[inline]
    fn get(&self, index: Self::Index) -> Option<&T> {
        self.slot(index)?.as_ref()
    }

    #[inline]
    fn get_mut(&mut self, index: Self::Index) -> Option<&mut T> {
        if index.is_none() {
            return None;
        }
        self.slots.get_mut(index.as_usize())?.as_mut()
    }

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.len = 0;
    }
}

// =============================================================================
// slab::Slab implementation
// =============================================================================

#[cfg(feature = "slab")]
impl<T> Storage<T> for slab::Slab<T> {
    type Index = usize;

    #[inline]
    fn insert(&mut self, value: T) -> Self::Index {
        slab::Slab::insert(self, value)
    }

    #[inline]
    fn remove(&mut self, index: Self::Index) -> Option<T> {
        self.try_remove(index)
    }

    #[inline]
    fn get(&self, index: Self::Index) -> Option<&T> {
        slab::Slab::get(self, index)
    }

    #[inline]
    fn get_mut(&mut self, index: Self::Index) -> Option<&mut T> {
        slab::Slab::get_mut(self, index)
    }

    #[inline]
    fn len(&self) -> usize {
        slab::Slab::len(self)
    }

    fn clear(&mut self) {
        slab::Slab::clear(self)
    }
}
