//! Sentinel-based index trait for link fields.
//!
//! Node-based structures in this crate (lists, trees) store links to other
//! nodes as raw storage indices. A reserved sentinel (`MAX`) stands in for
//! "no link" so a node carries five or six links without paying for
//! `Option` discriminants.

/// A copyable storage index with a sentinel "none" value.
///
/// # Example
///
/// ```
/// use nexus_collections::Index;
///
/// let idx: u32 = 5;
/// assert!(idx.is_some());
/// assert!(u32::NONE.is_none());
/// assert_eq!(idx.into_option(), Some(5));
/// assert_eq!(u32::NONE.into_option(), None);
/// ```
pub trait Index: Copy + Eq + core::fmt::Debug {
    /// Sentinel value representing "no index".
    const NONE: Self;

    /// Returns `true` if this is the sentinel value.
    #[inline]
    fn is_none(self) -> bool {
        self == Self::NONE
    }

    /// Returns `true` if this is not the sentinel value.
    #[inline]
    fn is_some(self) -> bool {
        !self.is_none()
    }

    /// Converts the sentinel to `None` and every other value to `Some`.
    #[inline]
    fn into_option(self) -> Option<Self> {
        if self.is_none() { None } else { Some(self) }
    }

    /// Returns the index as a slot position.
    fn as_usize(self) -> usize;

    /// Creates an index from a slot position.
    fn from_usize(val: usize) -> Self;
}

macro_rules! impl_index_for_unsigned {
    ($($ty:ty),*) => {
        $(
            impl Index for $ty {
                const NONE: Self = <$ty>::MAX;

                #[inline]
                fn as_usize(self) -> usize {
                    self as usize
                }

                #[inline]
                fn from_usize(val: usize) -> Self {
                    debug_assert!(val < <$ty>::MAX as usize, "slot position collides with sentinel");
                    val as Self
                }
            }
        )*
    };
}

impl_index_for_unsigned!(u16, u32, u64, usize);
