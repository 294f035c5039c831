//! Discrete metrics: ordered values with a successor and a predecessor.

use core::fmt::Debug;
use std::net::{Ipv4Addr, Ipv6Addr};

/// An ordered value type with type-level bounds and unit steps.
///
/// Every value except [`MAX`](Self::MAX) has a successor and every value
/// except [`MIN`](Self::MIN) has a predecessor. [`succ`](Self::succ) and
/// [`pred`](Self::pred) wrap at the bounds; callers that may sit on a bound
/// use [`checked_succ`](Self::checked_succ) / [`checked_pred`](Self::checked_pred).
///
/// # Example
///
/// ```
/// use nexus_space::DiscreteMetric;
/// use std::net::Ipv4Addr;
///
/// let a = Ipv4Addr::new(10, 0, 0, 255);
/// assert_eq!(a.succ(), Ipv4Addr::new(10, 0, 1, 0));
/// assert_eq!(Ipv4Addr::MAX.checked_succ(), None);
/// ```
pub trait DiscreteMetric: Copy + Ord + Debug {
    /// Smallest value of the metric.
    const MIN: Self;

    /// Largest value of the metric.
    const MAX: Self;

    /// Next value. Wraps to [`MIN`](Self::MIN) at [`MAX`](Self::MAX).
    fn succ(self) -> Self;

    /// Previous value. Wraps to [`MAX`](Self::MAX) at [`MIN`](Self::MIN).
    fn pred(self) -> Self;

    /// Next value, or `None` at [`MAX`](Self::MAX).
    #[inline]
    fn checked_succ(self) -> Option<Self> {
        if self == Self::MAX { None } else { Some(self.succ()) }
    }

    /// Previous value, or `None` at [`MIN`](Self::MIN).
    #[inline]
    fn checked_pred(self) -> Option<Self> {
        if self == Self::MIN { None } else { Some(self.pred()) }
    }
}

macro_rules! impl_metric_for_unsigned {
    ($($ty:ty),*) => {
        $(
            impl DiscreteMetric for $ty {
                const MIN: Self = <$ty>::MIN;
                const MAX: Self = <$ty>::MAX;

                #[inline]
                fn succ(self) -> Self {
                    self.wrapping_add(1)
                }

                #[inline]
                fn pred(self) -> Self {
                    self.wrapping_sub(1)
                }
            }
        )*
    };
}

impl_metric_for_unsigned!(u8, u16, u32, u64, u128, usize);

impl DiscreteMetric for Ipv4Addr {
    const MIN: Self = Ipv4Addr::UNSPECIFIED;
    const MAX: Self = Ipv4Addr::BROADCAST;

    #[inline]
    fn succ(self) -> Self {
        Ipv4Addr::from_bits(self.to_bits().wrapping_add(1))
    }

    #[inline]
    fn pred(self) -> Self {
        Ipv4Addr::from_bits(self.to_bits().wrapping_sub(1))
    }
}

impl DiscreteMetric for Ipv6Addr {
    const MIN: Self = Ipv6Addr::UNSPECIFIED;
    const MAX: Self = Ipv6Addr::from_bits(u128::MAX);

    #[inline]
    fn succ(self) -> Self {
        Ipv6Addr::from_bits(self.to_bits().wrapping_add(1))
    }

    #[inline]
    fn pred(self) -> Self {
        Ipv6Addr::from_bits(self.to_bits().wrapping_sub(1))
    }
}
