//! Integer widths usable for container lengths and row indices.

use std::fmt;
use std::hash::Hash;

/// An unsigned integer type that stores a container's length, capacity,
/// and cursor indices.
///
/// Narrow size types shrink the container header and cursors. All address
/// arithmetic happens in `usize`; conversions back into the size type are
/// checked.
pub trait SizeType:
    Copy + Ord + Hash + Default + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Largest representable value, widened to `usize` (saturating).
    const MAX_USIZE: usize;

    /// Widen to `usize`.
    fn to_usize(self) -> usize;

    /// Narrow from `usize`, or `None` if `n` does not fit.
    fn from_usize(n: usize) -> Option<Self>;
}

macro_rules! impl_size_type {
    ($($t:ty),+ $(,)?) => {
        $(
            impl SizeType for $t {
                const MAX_USIZE: usize = if (<$t>::MAX as u128) > (usize::MAX as u128) {
                    usize::MAX
                } else {
                    <$t>::MAX as usize
                };

                #[inline]
                fn to_usize(self) -> usize {
                    // Values above MAX_USIZE never get stored: from_usize
                    // is the only way in.
                    self as usize
                }

                #[inline]
                fn from_usize(n: usize) -> Option<Self> {
                    <$t>::try_from(n).ok()
                }
            }
        )+
    };
}

impl_size_type!(u8, u16, u32, u64, usize);
