//! Closed intervals over a discrete metric.

use core::cmp::Ordering;
use core::fmt;
use core::ops::RangeInclusive;

use crate::DiscreteMetric;

/// How two intervals relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// No common values and not adjacent.
    None,
    /// Identical intervals.
    Equal,
    /// Every value of the left interval is in the right one.
    Subset,
    /// Every value of the right interval is in the left one.
    Superset,
    /// Some, but not all, values are shared.
    Overlap,
    /// Disjoint with no gap between them.
    Adjacent,
}

/// A closed interval `[min, max]` over a discrete metric.
///
/// An interval is empty iff `min > max`. The canonical empty interval,
/// which is also the default, is `[M::MAX, M::MIN]`.
///
/// # Example
///
/// ```
/// use nexus_space::{Interval, Relation};
///
/// let a = Interval::new(10u32, 20);
/// let b = Interval::new(21u32, 30);
///
/// assert!(a.contains(15));
/// assert!(a.is_adjacent_to(&b));
/// assert_eq!(a.relationship(&b), Relation::Adjacent);
/// assert_eq!(a.hull(&b), Interval::new(10, 30));
/// assert!(Interval::<u32>::default().is_empty());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval<M> {
    min: M,
    max: M,
}

impl<M: DiscreteMetric> Default for Interval<M> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<M: DiscreteMetric> Interval<M> {
    /// The interval covering every value of the metric.
    pub const ALL: Self = Self {
        min: M::MIN,
        max: M::MAX,
    };

    /// Creates `[min, max]`. If `min > max` the interval is empty.
    #[inline]
    pub const fn new(min: M, max: M) -> Self {
        Self { min, max }
    }

    /// Creates the interval holding exactly `value`.
    #[inline]
    pub const fn singleton(value: M) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// Creates the canonical empty interval.
    #[inline]
    pub const fn empty() -> Self {
        Self {
            min: M::MAX,
            max: M::MIN,
        }
    }

    /// Smallest value in the interval. Unspecified if empty.
    #[inline]
    pub fn min(&self) -> M {
        self.min
    }

    /// Largest value in the interval. Unspecified if empty.
    #[inline]
    pub fn max(&self) -> M {
        self.max
    }

    /// Sets the smallest value.
    #[inline]
    pub fn set_min(&mut self, min: M) -> &mut Self {
        self.min = min;
        self
    }

    /// Sets the largest value.
    #[inline]
    pub fn set_max(&mut self, max: M) -> &mut Self {
        self.max = max;
        self
    }

    /// Makes the interval empty.
    #[inline]
    pub fn clear(&mut self) -> &mut Self {
        *self = Self::empty();
        self
    }

    /// Returns `true` if the interval holds no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    /// Returns `true` if the interval holds exactly one value.
    #[inline]
    pub fn is_singleton(&self) -> bool {
        self.min == self.max
    }

    /// Returns `true` if the interval covers the whole metric.
    #[inline]
    pub fn is_maximal(&self) -> bool {
        self.min == M::MIN && self.max == M::MAX
    }

    /// Returns `true` if `value` is in the interval.
    #[inline]
    pub fn contains(&self, value: M) -> bool {
        self.min <= value && value <= self.max
    }

    /// Returns `true` if the intervals share at least one value.
    #[inline]
    pub fn has_intersection(&self, other: &Self) -> bool {
        (other.min <= self.min && self.min <= other.max)
            || (self.min <= other.min && other.min <= self.max)
    }

    /// Values in both intervals. Empty if they are disjoint.
    #[inline]
    pub fn intersection(&self, other: &Self) -> Self {
        Self::new(self.min.max(other.min), self.max.min(other.max))
    }

    /// Returns `true` if the intervals are disjoint with no gap between them.
    ///
    /// The successor is only taken of a value that is strictly less than
    /// another value, so it never wraps.
    pub fn is_adjacent_to(&self, other: &Self) -> bool {
        if self.max < other.min {
            self.max.succ() == other.min
        } else if other.max < self.min {
            other.max.succ() == self.min
        } else {
            false
        }
    }

    /// Returns `true` if the union of the intervals is an interval.
    #[inline]
    pub fn has_union(&self, other: &Self) -> bool {
        self.has_intersection(other) || self.is_adjacent_to(other)
    }

    /// Returns `true` if every value of `other` is in `self`.
    #[inline]
    pub fn is_superset_of(&self, other: &Self) -> bool {
        self.min <= other.min && other.max <= self.max
    }

    /// Returns `true` if every value of `self` is in `other`.
    #[inline]
    pub fn is_subset_of(&self, other: &Self) -> bool {
        other.is_superset_of(self)
    }

    /// Returns `true` if `self` is a superset of `other` and not equal to it.
    #[inline]
    pub fn is_strict_superset_of(&self, other: &Self) -> bool {
        (self.min < other.min && other.max <= self.max)
            || (self.min <= other.min && other.max < self.max)
    }

    /// Returns `true` if `self` is a subset of `other` and not equal to it.
    #[inline]
    pub fn is_strict_subset_of(&self, other: &Self) -> bool {
        other.is_strict_superset_of(self)
    }

    /// Classifies how `self` relates to `other`.
    pub fn relationship(&self, other: &Self) -> Relation {
        if self.has_intersection(other) {
            if self == other {
                Relation::Equal
            } else if self.is_subset_of(other) {
                Relation::Subset
            } else if self.is_superset_of(other) {
                Relation::Superset
            } else {
                Relation::Overlap
            }
        } else if self.is_adjacent_to(other) {
            Relation::Adjacent
        } else {
            Relation::None
        }
    }

    /// Smallest interval containing both. An empty operand is ignored.
    #[inline]
    pub fn hull(&self, other: &Self) -> Self {
        if self.is_empty() {
            *other
        } else if other.is_empty() {
            *self
        } else {
            Self::new(self.min.min(other.min), self.max.max(other.max))
        }
    }

    /// Shrinks `self` to its intersection with `other`.
    #[inline]
    pub fn clip(&mut self, other: &Self) -> &mut Self {
        *self = self.intersection(other);
        self
    }

    /// Grows `self` to its hull with `other`.
    #[inline]
    pub fn extend(&mut self, other: &Self) -> &mut Self {
        *self = self.hull(other);
        self
    }

    /// Total order by `(min, max)`, for containers that need one.
    ///
    /// Intervals have no `Ord` impl because the natural order between
    /// intervals is containment, which is partial.
    #[inline]
    pub fn lexicographic_cmp(&self, other: &Self) -> Ordering {
        self.min.cmp(&other.min).then(self.max.cmp(&other.max))
    }
}

impl<M: DiscreteMetric> From<M> for Interval<M> {
    fn from(value: M) -> Self {
        Self::singleton(value)
    }
}

impl<M: DiscreteMetric> From<RangeInclusive<M>> for Interval<M> {
    fn from(range: RangeInclusive<M>) -> Self {
        let (min, max) = range.into_inner();
        Self::new(min, max)
    }
}

impl<M: DiscreteMetric> fmt::Debug for Interval<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("[empty]")
        } else {
            write!(f, "[{:?}, {:?}]", self.min, self.max)
        }
    }
}

impl<M: DiscreteMetric + fmt::Display> fmt::Display for Interval<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("empty")
        } else {
            write!(f, "{}-{}", self.min, self.max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn iv(min: u8, max: u8) -> Interval<u8> {
        Interval::new(min, max)
    }

    #[test]
    fn default_is_empty() {
        let e = Interval::<u8>::default();
        assert!(e.is_empty());
        assert_eq!(e, Interval::empty());
        assert!(!e.contains(0));
        assert!(!e.contains(255));
        assert!(!iv(3, 3).is_empty());
        assert!(iv(4, 3).is_empty());
    }

    #[test]
    fn all_is_maximal() {
        assert!(Interval::<u8>::ALL.is_maximal());
        assert!(!iv(0, 254).is_maximal());
        assert!(Interval::<u8>::ALL.contains(0));
        assert!(Interval::<u8>::ALL.contains(255));
    }

    #[test]
    fn intersection_and_overlap() {
        assert!(iv(1, 5).has_intersection(&iv(5, 9)));
        assert!(iv(5, 9).has_intersection(&iv(1, 5)));
        assert!(iv(1, 9).has_intersection(&iv(3, 4)));
        assert!(!iv(1, 4).has_intersection(&iv(5, 9)));
        assert_eq!(iv(1, 6).intersection(&iv(4, 9)), iv(4, 6));
        assert!(iv(1, 3).intersection(&iv(5, 9)).is_empty());
    }

    #[test]
    fn adjacency_is_guarded_at_bounds() {
        assert!(iv(0, 4).is_adjacent_to(&iv(5, 9)));
        assert!(iv(5, 9).is_adjacent_to(&iv(0, 4)));
        assert!(!iv(0, 4).is_adjacent_to(&iv(6, 9)));
        assert!(!iv(0, 5).is_adjacent_to(&iv(5, 9)));

        // Touching the metric's ends must not wrap around.
        assert!(!iv(250, 255).is_adjacent_to(&iv(0, 3)));
        assert!(!iv(0, 3).is_adjacent_to(&iv(250, 255)));
        assert!(iv(0, 254).is_adjacent_to(&iv(255, 255)));
        assert!(iv(0, 0).is_adjacent_to(&iv(1, 255)));
    }

    #[test]
    fn subset_superset() {
        assert!(iv(2, 4).is_subset_of(&iv(1, 5)));
        assert!(iv(1, 5).is_subset_of(&iv(1, 5)));
        assert!(!iv(1, 5).is_strict_subset_of(&iv(1, 5)));
        assert!(iv(1, 4).is_strict_subset_of(&iv(1, 5)));
        assert!(iv(1, 5).is_strict_superset_of(&iv(2, 5)));
        assert!(!iv(1, 5).is_superset_of(&iv(0, 5)));
    }

    #[test]
    fn relationship_classifier() {
        assert_eq!(iv(1, 5).relationship(&iv(1, 5)), Relation::Equal);
        assert_eq!(iv(2, 4).relationship(&iv(1, 5)), Relation::Subset);
        assert_eq!(iv(1, 5).relationship(&iv(2, 4)), Relation::Superset);
        assert_eq!(iv(1, 5).relationship(&iv(4, 9)), Relation::Overlap);
        assert_eq!(iv(1, 5).relationship(&iv(6, 9)), Relation::Adjacent);
        assert_eq!(iv(1, 5).relationship(&iv(7, 9)), Relation::None);
    }

    #[test]
    fn hull_ignores_empty_operands() {
        let e = Interval::<u8>::empty();
        assert_eq!(iv(3, 4).hull(&e), iv(3, 4));
        assert_eq!(e.hull(&iv(3, 4)), iv(3, 4));
        assert_eq!(iv(3, 4).hull(&iv(8, 9)), iv(3, 9));
        assert!(e.hull(&e).is_empty());

        let mut acc = Interval::<u8>::empty();
        acc.extend(&iv(10, 12)).extend(&iv(1, 2));
        assert_eq!(acc, iv(1, 12));
        acc.clip(&iv(5, 200));
        assert_eq!(acc, iv(5, 12));
    }

    #[test]
    fn lexicographic_order() {
        assert_eq!(iv(1, 5).lexicographic_cmp(&iv(2, 3)), Ordering::Less);
        assert_eq!(iv(1, 5).lexicographic_cmp(&iv(1, 3)), Ordering::Greater);
        assert_eq!(iv(1, 5).lexicographic_cmp(&iv(1, 5)), Ordering::Equal);
    }

    #[test]
    fn conversions_and_display() {
        assert_eq!(Interval::from(7u8), iv(7, 7));
        assert_eq!(Interval::from(3u8..=9), iv(3, 9));

        let r = Interval::new(Ipv4Addr::new(10, 0, 0, 0), Ipv4Addr::new(10, 0, 0, 255));
        assert_eq!(r.to_string(), "10.0.0.0-10.0.0.255");
        assert_eq!(format!("{:?}", iv(1, 2)), "[1, 2]");
        assert_eq!(format!("{:?}", Interval::<u8>::empty()), "[empty]");
    }
}
