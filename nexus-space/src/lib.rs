//! Discrete range spaces.
//!
//! A range space maps points of a discrete, ordered metric (integers, IPv4 or
//! IPv6 addresses) to payloads, and updates whole intervals at once:
//!
//! ```text
//! mark   - overwrite every point in an interval
//! fill   - map only the points that are not mapped yet
//! blend  - merge a color into every point's payload
//! erase  - unmap an interval
//! ```
//!
//! The space stores maximal intervals of equal payload, never points, so its
//! size depends on how fragmented the mapping is and not on the size of the
//! metric. Lookups are `O(log n)`; an update touching `k` existing intervals
//! costs `O(k + log n)`.
//!
//! # Quick Start
//!
//! ```
//! use nexus_space::{DiscreteSpace, Interval};
//!
//! let mut acl: DiscreteSpace<u16, bool> = DiscreteSpace::new();
//! acl.mark(Interval::new(0, 1023), false);
//! acl.mark(Interval::new(80, 80), true);
//! acl.mark(Interval::new(443, 443), true);
//!
//! assert_eq!(acl.find(443), Some(&true));
//! assert_eq!(acl.find(22), Some(&false));
//! assert_eq!(acl.find(8080), None);
//! assert_eq!(acl.count(), 5);
//! ```
//!
//! # IP Addresses
//!
//! [`IpSpace`] holds one space per address family and routes by the family
//! of its argument. [`IpRange`] parses `addr`, `min-max` and `addr/prefix`.
//!
//! # Storage
//!
//! Nodes live in a [`nexus_collections::Storage`], [`nexus_collections::Pool`]
//! by default. Removed intervals go back to the pool's free list and are
//! reused by later updates; [`DiscreteSpace::clear`] releases everything.
//!
//! # Feature Flags
//!
//! - `slab` - Allow `slab::Slab` as node storage
//!
//! # Logging
//!
//! Bulk updates emit `tracing` events at `trace` level, `clear` at `debug`
//! level. The crate never installs a subscriber.

#![warn(missing_docs)]

pub mod error;
pub mod interval;
pub mod ip;
pub mod metric;
pub mod space;

pub use error::RangeError;
pub use interval::{Interval, Relation};
pub use ip::{IpRange, IpSpace};
pub use metric::DiscreteMetric;
pub use space::{DiscreteSpace, Node};
