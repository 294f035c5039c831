//! IP address ranges and a range space covering both address families.
//!
//! [`IpSpace`] keeps one [`DiscreteSpace`] per family and routes each call
//! by the family of its argument. An [`IpRange`] always carries exactly one
//! family, so routing is total: mixed-family input is rejected when the
//! range is built, never silently dropped later.

use core::fmt;
use core::str::FromStr;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::space::{self, DiscreteSpace};
use crate::{Interval, RangeError};

/// A closed range of IPv4 or IPv6 addresses.
///
/// # Example
///
/// ```
/// use nexus_space::IpRange;
///
/// let a: IpRange = "10.0.0.0/24".parse().unwrap();
/// let b: IpRange = "10.0.0.0-10.0.0.255".parse().unwrap();
/// assert_eq!(a, b);
///
/// let c: IpRange = "1337::ded:beef-1337::ded:ceef".parse().unwrap();
/// assert!(c.is_ipv6());
///
/// assert!("10.0.0.1-::1".parse::<IpRange>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpRange {
    /// IPv4 range.
    V4(Interval<Ipv4Addr>),
    /// IPv6 range.
    V6(Interval<Ipv6Addr>),
}

impl IpRange {
    /// Creates `[min, max]`.
    ///
    /// # Errors
    ///
    /// [`RangeError::FamilyMismatch`] if the endpoints are from different
    /// families, [`RangeError::Inverted`] if `min > max`.
    pub fn new(min: IpAddr, max: IpAddr) -> Result<Self, RangeError> {
        match (min, max) {
            (IpAddr::V4(min), IpAddr::V4(max)) if min <= max => {
                Ok(Self::V4(Interval::new(min, max)))
            }
            (IpAddr::V6(min), IpAddr::V6(max)) if min <= max => {
                Ok(Self::V6(Interval::new(min, max)))
            }
            (IpAddr::V4(_), IpAddr::V4(_)) | (IpAddr::V6(_), IpAddr::V6(_)) => {
                Err(RangeError::Inverted)
            }
            _ => Err(RangeError::FamilyMismatch),
        }
    }

    /// Creates the range of the network `addr/prefix`.
    ///
    /// Host bits of `addr` are ignored.
    ///
    /// # Errors
    ///
    /// [`RangeError::InvalidPrefix`] if `prefix` is longer than the address.
    pub fn from_network(addr: IpAddr, prefix: u8) -> Result<Self, RangeError> {
        match addr {
            IpAddr::V4(addr) => {
                if prefix > 32 {
                    return Err(RangeError::InvalidPrefix(prefix.to_string()));
                }
                let mask = u32::MAX.checked_shl(32 - u32::from(prefix)).unwrap_or(0);
                let min = addr.to_bits() & mask;
                Ok(Self::V4(Interval::new(
                    Ipv4Addr::from_bits(min),
                    Ipv4Addr::from_bits(min | !mask),
                )))
            }
            IpAddr::V6(addr) => {
                if prefix > 128 {
                    return Err(RangeError::InvalidPrefix(prefix.to_string()));
                }
                let mask = u128::MAX.checked_shl(128 - u32::from(prefix)).unwrap_or(0);
                let min = addr.to_bits() & mask;
                Ok(Self::V6(Interval::new(
                    Ipv6Addr::from_bits(min),
                    Ipv6Addr::from_bits(min | !mask),
                )))
            }
        }
    }

    /// Lowest address.
    pub fn min(&self) -> IpAddr {
        match self {
            Self::V4(r) => IpAddr::V4(r.min()),
            Self::V6(r) => IpAddr::V6(r.min()),
        }
    }

    /// Highest address.
    pub fn max(&self) -> IpAddr {
        match self {
            Self::V4(r) => IpAddr::V4(r.max()),
            Self::V6(r) => IpAddr::V6(r.max()),
        }
    }

    /// Returns `true` for an IPv4 range.
    pub fn is_ipv4(&self) -> bool {
        matches!(self, Self::V4(_))
    }

    /// Returns `true` for an IPv6 range.
    pub fn is_ipv6(&self) -> bool {
        matches!(self, Self::V6(_))
    }

    /// Returns `true` if the range holds no addresses.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::V4(r) => r.is_empty(),
            Self::V6(r) => r.is_empty(),
        }
    }

    /// Returns `true` if `addr` is in the range. Always `false` across families.
    pub fn contains(&self, addr: IpAddr) -> bool {
        match (self, addr) {
            (Self::V4(r), IpAddr::V4(a)) => r.contains(a),
            (Self::V6(r), IpAddr::V6(a)) => r.contains(a),
            _ => false,
        }
    }
}

impl From<Interval<Ipv4Addr>> for IpRange {
    fn from(range: Interval<Ipv4Addr>) -> Self {
        Self::V4(range)
    }
}

impl From<Interval<Ipv6Addr>> for IpRange {
    fn from(range: Interval<Ipv6Addr>) -> Self {
        Self::V6(range)
    }
}

impl From<IpAddr> for IpRange {
    fn from(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(a) => Self::V4(Interval::singleton(a)),
            IpAddr::V6(a) => Self::V6(Interval::singleton(a)),
        }
    }
}

fn parse_addr(text: &str) -> Result<IpAddr, RangeError> {
    text.trim()
        .parse()
        .map_err(|_| RangeError::InvalidAddress(text.trim().to_string()))
}

impl FromStr for IpRange {
    type Err = RangeError;

    /// Parses `addr`, `min-max` or `addr/prefix`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((addr, prefix)) = s.split_once('/') {
            let addr = parse_addr(addr)?;
            let prefix = prefix
                .trim()
                .parse::<u8>()
                .map_err(|_| RangeError::InvalidPrefix(prefix.trim().to_string()))?;
            Self::from_network(addr, prefix)
        } else if let Some((min, max)) = s.split_once('-') {
            Self::new(parse_addr(min)?, parse_addr(max)?)
        } else {
            parse_addr(s).map(Self::from)
        }
    }
}

impl fmt::Display for IpRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4(r) => fmt::Display::fmt(r, f),
            Self::V6(r) => fmt::Display::fmt(r, f),
        }
    }
}

/// A range space over IPv4 and IPv6 addresses.
///
/// # Example
///
/// ```
/// use nexus_space::{IpRange, IpSpace};
/// use std::net::IpAddr;
///
/// let mut space: IpSpace<u32> = IpSpace::new();
/// space.mark("172.16.0.0/24".parse().unwrap(), 1);
/// space.mark("2001:db8::/32".parse().unwrap(), 2);
///
/// let v4: IpAddr = "172.16.0.97".parse().unwrap();
/// let v6: IpAddr = "2001:db8::1".parse().unwrap();
/// assert_eq!(space.find(v4), Some(&1));
/// assert_eq!(space.find(v6), Some(&2));
/// assert_eq!(space.count(), 2);
/// ```
pub struct IpSpace<P> {
    ip4: DiscreteSpace<Ipv4Addr, P>,
    ip6: DiscreteSpace<Ipv6Addr, P>,
}

impl<P> Default for IpSpace<P>
where
    P: Clone + PartialEq + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<P> IpSpace<P>
where
    P: Clone + PartialEq + Default,
{
    /// Creates an empty space.
    pub fn new() -> Self {
        Self {
            ip4: DiscreteSpace::new(),
            ip6: DiscreteSpace::new(),
        }
    }

    /// Maps every address in `range` to `payload`.
    pub fn mark(&mut self, range: IpRange, payload: P) -> &mut Self {
        match range {
            IpRange::V4(r) => {
                self.ip4.mark(r, payload);
            }
            IpRange::V6(r) => {
                self.ip6.mark(r, payload);
            }
        }
        self
    }

    /// Maps the unmapped addresses in `range` to `payload`.
    pub fn fill(&mut self, range: IpRange, payload: P) -> &mut Self {
        match range {
            IpRange::V4(r) => {
                self.ip4.fill(r, payload);
            }
            IpRange::V6(r) => {
                self.ip6.fill(r, payload);
            }
        }
        self
    }

    /// Blends `color` into every address in `range`. See [`DiscreteSpace::blend`].
    pub fn blend<U, F>(&mut self, range: IpRange, color: &U, blender: F) -> &mut Self
    where
        U: ?Sized,
        F: FnMut(&mut P, &U) -> bool,
    {
        match range {
            IpRange::V4(r) => {
                self.ip4.blend(r, color, blender);
            }
            IpRange::V6(r) => {
                self.ip6.blend(r, color, blender);
            }
        }
        self
    }

    /// Unmaps every address in `range`.
    pub fn erase(&mut self, range: IpRange) -> &mut Self {
        match range {
            IpRange::V4(r) => {
                self.ip4.erase(r);
            }
            IpRange::V6(r) => {
                self.ip6.erase(r);
            }
        }
        self
    }

    /// Returns the payload of `addr`, if it is mapped.
    pub fn find(&self, addr: IpAddr) -> Option<&P> {
        match addr {
            IpAddr::V4(a) => self.ip4.find(a),
            IpAddr::V6(a) => self.ip6.find(a),
        }
    }

    /// Returns the payload of an IPv4 address, if it is mapped.
    pub fn find_v4(&self, addr: Ipv4Addr) -> Option<&P> {
        self.ip4.find(addr)
    }

    /// Returns the payload of an IPv6 address, if it is mapped.
    pub fn find_v6(&self, addr: Ipv6Addr) -> Option<&P> {
        self.ip6.find(addr)
    }

    /// Returns the number of maximal ranges over both families.
    pub fn count(&self) -> usize {
        self.ip4.count() + self.ip6.count()
    }

    /// Returns `true` if no address is mapped.
    pub fn is_empty(&self) -> bool {
        self.ip4.is_empty() && self.ip6.is_empty()
    }

    /// Unmaps every address in both families.
    pub fn clear(&mut self) {
        self.ip4.clear();
        self.ip6.clear();
    }

    /// Returns an iterator over all ranges, IPv4 before IPv6, each ascending.
    pub fn iter(&self) -> Iter<'_, P> {
        Iter {
            ip4: self.ip4.iter(),
            ip6: self.ip6.iter(),
        }
    }

    /// The IPv4 space.
    pub fn ip4(&self) -> &DiscreteSpace<Ipv4Addr, P> {
        &self.ip4
    }

    /// The IPv6 space.
    pub fn ip6(&self) -> &DiscreteSpace<Ipv6Addr, P> {
        &self.ip6
    }
}

impl<P> fmt::Debug for IpSpace<P>
where
    P: Clone + PartialEq + Default + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IpSpace")
            .field("ip4", &self.ip4)
            .field("ip6", &self.ip6)
            .finish()
    }
}

impl<'a, P> IntoIterator for &'a IpSpace<P>
where
    P: Clone + PartialEq + Default,
{
    type Item = (IpRange, &'a P);
    type IntoIter = Iter<'a, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

type FamilyIter<'a, M, P> = space::Iter<'a, M, P, nexus_collections::Pool<space::Node<M, P>>, u32>;

/// Iterator over the ranges of an [`IpSpace`].
///
/// Walks the IPv4 ranges to completion before the IPv6 ranges; from the
/// back it walks IPv6 first. Two iterators compare equal when both family
/// walks are at the same position.
pub struct Iter<'a, P: 'a> {
    ip4: FamilyIter<'a, Ipv4Addr, P>,
    ip6: FamilyIter<'a, Ipv6Addr, P>,
}

impl<'a, P: 'a> Iterator for Iter<'a, P> {
    type Item = (IpRange, &'a P);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some((r, p)) = self.ip4.next() {
            return Some((IpRange::V4(r), p));
        }
        self.ip6.next().map(|(r, p)| (IpRange::V6(r), p))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.ip4.len() + self.ip6.len();
        (n, Some(n))
    }
}

impl<'a, P: 'a> DoubleEndedIterator for Iter<'a, P> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if let Some((r, p)) = self.ip6.next_back() {
            return Some((IpRange::V6(r), p));
        }
        self.ip4.next_back().map(|(r, p)| (IpRange::V4(r), p))
    }
}

impl<'a, P: 'a> ExactSizeIterator for Iter<'a, P> {}

impl<'a, P: 'a> PartialEq for Iter<'a, P> {
    fn eq(&self, other: &Self) -> bool {
        self.ip4 == other.ip4 && self.ip6 == other.ip6
    }
}

impl<'a, P: 'a> Eq for Iter<'a, P> {}
