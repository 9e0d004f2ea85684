//! Offset calculation for N parallel arrays packed into one buffer.
//!
//! Field sub-arrays are laid out in declaration order. Field 0 starts at
//! byte 0; every later field starts at the end of its predecessor rounded
//! up to its own alignment:
//!
//! ```text
//! offset[0] = 0
//! offset[i] = round_up(offset[i-1] + capacity * size[i-1], align[i])
//! size      = offset[N-1] + capacity * size[N-1]
//! ```
//!
//! The buffer itself is aligned to the largest field alignment, so every
//! sub-array start is correctly aligned in memory and no two sub-arrays
//! overlap.

use std::alloc::Layout;
use std::ops::Range;

use smallvec::SmallVec;

use crate::error::StoreError;

/// Largest field-set arity kept inline (no heap spill) in per-field tables.
pub const INLINE_FIELDS: usize = 12;

/// Per-field table of [`FieldLayout`]s, in declaration order.
pub type FieldLayouts = SmallVec<[FieldLayout; INLINE_FIELDS]>;

/// Size, alignment, and drop requirements of one field type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldLayout {
    /// `size_of::<T>()`.
    pub size: usize,
    /// `align_of::<T>()`. Always a power of two.
    pub align: usize,
    /// `needs_drop::<T>()`.
    pub needs_drop: bool,
}

impl FieldLayout {
    /// Describe the field type `T`.
    pub const fn of<T>() -> Self {
        Self {
            size: std::mem::size_of::<T>(),
            align: std::mem::align_of::<T>(),
            needs_drop: std::mem::needs_drop::<T>(),
        }
    }
}

/// Round `n` up to the next multiple of `base`.
///
/// # Panics
///
/// Panics if `base == 0` or if the result overflows `usize`.
pub fn round_up(n: usize, base: usize) -> usize {
    match checked_round_up(n, base) {
        Some(v) => v,
        None => panic!("round_up({n}, {base}) overflows usize"),
    }
}

/// Round `n` up to the next multiple of `base`, or `None` on overflow.
///
/// Power-of-two bases take the bitmask shortcut.
///
/// # Panics
///
/// Panics if `base == 0`.
pub fn checked_round_up(n: usize, base: usize) -> Option<usize> {
    assert!(base > 0, "round_up base must be positive");
    if base.is_power_of_two() {
        let mask = base - 1;
        n.checked_add(mask).map(|v| v & !mask)
    } else {
        n.div_ceil(base).checked_mul(base)
    }
}

/// Byte layout of a buffer holding `capacity` elements of every field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageLayout {
    fields: FieldLayouts,
    offsets: SmallVec<[usize; INLINE_FIELDS]>,
    capacity: usize,
    size: usize,
    align: usize,
}

impl StorageLayout {
    /// Compute the layout of `fields` for `capacity` rows.
    ///
    /// Returns [`StoreError::CapacityOverflow`] if any offset or the total
    /// size overflows, or if the total size cannot be described by a
    /// [`std::alloc::Layout`].
    ///
    /// # Panics
    ///
    /// Panics if `fields` is empty or any alignment is not a power of two.
    pub fn compute(fields: &[FieldLayout], capacity: usize) -> Result<Self, StoreError> {
        assert!(!fields.is_empty(), "a field set needs at least one field");
        let overflow = || StoreError::CapacityOverflow {
            requested: capacity,
        };

        let mut offsets = SmallVec::with_capacity(fields.len());
        let mut end = 0usize;
        let mut align = 1usize;
        for field in fields {
            assert!(
                field.align.is_power_of_two(),
                "field alignment {} is not a power of two",
                field.align
            );
            let start = checked_round_up(end, field.align).ok_or_else(overflow)?;
            let bytes = field.size.checked_mul(capacity).ok_or_else(overflow)?;
            end = start.checked_add(bytes).ok_or_else(overflow)?;
            offsets.push(start);
            align = align.max(field.align);
        }

        // Layout::from_size_align rejects sizes that overflow isize once
        // rounded up to the alignment.
        if end > isize::MAX as usize - (align - 1) {
            return Err(overflow());
        }

        Ok(Self {
            fields: fields.iter().copied().collect(),
            offsets,
            capacity,
            size: end,
            align,
        })
    }

    /// The degenerate zero-capacity layout for `fields`.
    pub fn empty(fields: &[FieldLayout]) -> Self {
        match Self::compute(fields, 0) {
            Ok(layout) => layout,
            // Zero capacity never multiplies into an overflow.
            Err(e) => unreachable!("zero-capacity layout failed: {e}"),
        }
    }

    /// Number of rows the buffer has room for.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total buffer size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Buffer alignment: the largest field alignment.
    pub fn align(&self) -> usize {
        self.align
    }

    /// Number of fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Start offset of every field sub-array, in declaration order.
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Start offset of field `i`.
    pub fn offset(&self, i: usize) -> usize {
        self.offsets[i]
    }

    /// Layout of field `i`.
    pub fn field(&self, i: usize) -> FieldLayout {
        self.fields[i]
    }

    /// Per-field layouts, in declaration order.
    pub fn fields(&self) -> &[FieldLayout] {
        &self.fields
    }

    /// Byte range occupied by field `i`'s full sub-array.
    pub fn field_bytes(&self, i: usize) -> Range<usize> {
        let start = self.offsets[i];
        start..start + self.fields[i].size * self.capacity
    }

    /// The allocation layout, or `None` when the buffer needs no memory
    /// (zero capacity or only zero-sized fields).
    pub fn to_alloc_layout(&self) -> Option<Layout> {
        if self.size == 0 {
            return None;
        }
        Layout::from_size_align(self.size, self.align).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layouts_u8_i32_f64() -> Vec<FieldLayout> {
        vec![
            FieldLayout::of::<u8>(),
            FieldLayout::of::<i32>(),
            FieldLayout::of::<f64>(),
        ]
    }

    #[test]
    fn round_up_power_of_two() {
        assert_eq!(round_up(0, 8), 0);
        assert_eq!(round_up(1, 8), 8);
        assert_eq!(round_up(8, 8), 8);
        assert_eq!(round_up(9, 4), 12);
        assert_eq!(round_up(5, 1), 5);
    }

    #[test]
    fn round_up_other_bases() {
        assert_eq!(round_up(7, 3), 9);
        assert_eq!(round_up(9, 3), 9);
        assert_eq!(round_up(0, 6), 0);
    }

    #[test]
    #[should_panic(expected = "base must be positive")]
    fn round_up_rejects_zero_base() {
        round_up(3, 0);
    }

    #[test]
    fn checked_round_up_reports_overflow() {
        assert_eq!(checked_round_up(usize::MAX, 2), None);
        assert_eq!(checked_round_up(usize::MAX, 3), None);
        assert_eq!(checked_round_up(usize::MAX, 1), Some(usize::MAX));
    }

    #[test]
    fn u8_i32_f64_capacity_five() {
        let layout = StorageLayout::compute(&layouts_u8_i32_f64(), 5).unwrap();
        // u8 x5 = 5 bytes, padded to 8 for i32; i32 x5 = 20 bytes ends at 28,
        // padded to 32 for f64; f64 x5 = 40 bytes.
        assert_eq!(layout.offsets(), &[0, 8, 32]);
        assert_eq!(layout.size(), 72);
        assert_eq!(layout.align(), 8);
    }

    #[test]
    fn u8_i32_f64_capacity_two() {
        let layout = StorageLayout::compute(&layouts_u8_i32_f64(), 2).unwrap();
        assert_eq!(layout.offsets(), &[0, 4, 16]);
        assert_eq!(layout.size(), 32);
    }

    #[test]
    fn zero_capacity_is_degenerate_but_valid() {
        let layout = StorageLayout::compute(&layouts_u8_i32_f64(), 0).unwrap();
        assert_eq!(layout.offsets(), &[0, 0, 0]);
        assert_eq!(layout.size(), 0);
        assert!(layout.to_alloc_layout().is_none());
        assert_eq!(layout, StorageLayout::empty(&layouts_u8_i32_f64()));
    }

    #[test]
    fn zero_sized_fields_take_no_space() {
        let fields = [FieldLayout::of::<()>(), FieldLayout::of::<u16>()];
        let layout = StorageLayout::compute(&fields, 10).unwrap();
        assert_eq!(layout.offsets(), &[0, 0]);
        assert_eq!(layout.size(), 20);
    }

    #[test]
    fn field_bytes_cover_capacity() {
        let layout = StorageLayout::compute(&layouts_u8_i32_f64(), 5).unwrap();
        assert_eq!(layout.field_bytes(0), 0..5);
        assert_eq!(layout.field_bytes(1), 8..28);
        assert_eq!(layout.field_bytes(2), 32..72);
    }

    #[test]
    fn huge_capacity_overflows() {
        let result = StorageLayout::compute(&layouts_u8_i32_f64(), usize::MAX / 4);
        assert_eq!(
            result,
            Err(StoreError::CapacityOverflow {
                requested: usize::MAX / 4
            })
        );
    }

    #[test]
    fn needs_drop_is_recorded() {
        assert!(!FieldLayout::of::<u64>().needs_drop);
        assert!(FieldLayout::of::<String>().needs_drop);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_field() -> impl Strategy<Value = FieldLayout> {
            (0u32..7, 0usize..5).prop_map(|(align_pow, mult)| {
                let align = 1usize << align_pow;
                FieldLayout {
                    size: align * mult,
                    align,
                    needs_drop: false,
                }
            })
        }

        proptest! {
            #[test]
            fn sub_arrays_aligned_and_disjoint(
                fields in proptest::collection::vec(arb_field(), 1..INLINE_FIELDS),
                capacity in 0usize..1000,
            ) {
                let layout = StorageLayout::compute(&fields, capacity).unwrap();
                prop_assert_eq!(layout.offsets()[0], 0);
                for i in 0..fields.len() {
                    prop_assert_eq!(layout.offset(i) % fields[i].align, 0);
                    prop_assert_eq!(layout.align() % fields[i].align, 0);
                    if i > 0 {
                        prop_assert!(layout.offset(i) >= layout.field_bytes(i - 1).end);
                    }
                }
                let last = fields.len() - 1;
                prop_assert_eq!(layout.field_bytes(last).end, layout.size());
            }

            #[test]
            fn size_monotone_in_capacity(
                fields in proptest::collection::vec(arb_field(), 1..INLINE_FIELDS),
                capacity in 0usize..1000,
            ) {
                let small = StorageLayout::compute(&fields, capacity).unwrap();
                let big = StorageLayout::compute(&fields, capacity + 1).unwrap();
                prop_assert!(big.size() >= small.size());
                for i in 0..fields.len() {
                    prop_assert!(big.offset(i) >= small.offset(i));
                }
            }
        }
    }
}
