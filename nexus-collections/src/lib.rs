//! Intrusive collections with external storage.
//!
//! This crate provides the building blocks for node-based data structures
//! that must not chase raw pointers: storage pools with stable indices, and
//! structures that link nodes living in that storage. The key insight:
//! separate storage from structure.
//!
//! ```text
//! Storage (Pool)   - owns nodes, provides stable indices, recycles slots
//! List / RbTree    - coordinate indices, don't own data
//! ```
//!
//! Benefits:
//! - **Stable indices**: Remove from middle without invalidating other indices
//! - **No dangling links**: A rotation or removal only rewrites indices
//! - **Slot recycling**: Removed nodes go on a free list and are reused
//! - **Shared nodes**: One node can sit in a list and a tree at once
//!
//! # Quick Start
//!
//! ```
//! use nexus_collections::{Index, Linked, List, Pool, Storage};
//!
//! struct Node {
//!     value: u64,
//!     next: u32,
//!     prev: u32,
//! }
//!
//! impl Linked<u32> for Node {
//!     fn next(&self) -> u32 { self.next }
//!     fn prev(&self) -> u32 { self.prev }
//!     fn set_next(&mut self, idx: u32) { self.next = idx; }
//!     fn set_prev(&mut self, idx: u32) { self.prev = idx; }
//! }
//!
//! let mut storage: Pool<Node> = Pool::with_capacity(16);
//! let mut list: List<u32> = List::new();
//!
//! let key = storage.insert(Node { value: 42, next: u32::NONE, prev: u32::NONE });
//! list.push_back(&mut storage, key);
//!
//! list.remove(&mut storage, key);
//! assert_eq!(storage.remove(key).map(|n| n.value), Some(42));
//! ```
//!
//! # Critical Invariant: Same Storage Instance
//!
//! All operations on a list or tree must use the same storage instance.
//! This is the caller's responsibility (same discipline as the `slab` crate).
//! Passing a different storage panics on a missing index or silently
//! corrupts the structure.
//!
//! # Storage Options
//!
//! | Storage | Capacity | Allocation | Use Case |
//! |---------|----------|------------|----------|
//! | [`Pool`] | Growable | Single `Vec`, LIFO free list | Default choice |
//! | `slab::Slab` | Growable | May reallocate | Existing slab users |
//!
//! # Feature Flags
//!
//! - `slab` - Enable [`Storage`] impl for `slab::Slab`

#![warn(missing_docs)]

pub mod index;
pub mod linked;
pub mod rbtree;
pub mod storage;

pub use index::Index;
pub use linked::{Indices, Linked, List};
pub use rbtree::{Color, RbTree, Side, TreeNode};
pub use storage::{Pool, Storage};
