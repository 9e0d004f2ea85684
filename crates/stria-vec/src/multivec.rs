//! The structure-of-arrays container.

#![allow(unsafe_code)]

use std::alloc::{handle_alloc_error, Layout};
use std::fmt;
use std::marker::PhantomData;
use std::slice;

use stria_arena::lifecycle::{construct_range, copy_range, destroy_range, fill_range, move_range};
use stria_arena::{
    Admits, CloneFields, DefaultFields, Field, FieldAt, FieldSet, Raw, RawBuffer, Standard,
    StoragePolicy,
};
use stria_core::{InitMode, SizeType, StorageLayout, StoreError};

use crate::cursor::{Cursor, Cursors, RevCursor, RowPosition};
use crate::rows::{Rows, RowsMut};

/// A growable list of rows stored as one array per field, all packed into a
/// single allocation.
///
/// `F` is a tuple of field types; field `I` of row `i` is reached with
/// [`at::<I>(i)`](Self::at). `P` fixes the allocator, the size type used for
/// lengths and indices, and whether elements are constructed and dropped
/// (see [`StoragePolicy`]).
///
/// ```
/// use stria_vec::MultiVec;
///
/// let mut v: MultiVec<(u8, f32)> = MultiVec::new();
/// v.push_back((1, 0.5));
/// v.push_back((2, 1.5));
/// assert_eq!(*v.at::<1>(1), 1.5);
/// assert_eq!(v.field::<0>(), &[1, 2]);
/// ```
///
/// Growth is exact: [`push_back`](Self::push_back) behaves as
/// `resize(len + 1)` and reserves one more row. Policies that set
/// [`StoragePolicy::AMORTIZED`] grow appends geometrically instead. Any growth
/// may move the buffer, which the borrow checker enforces for references.
/// Raw pointers from [`data`](Self::data) and [`storage`](Self::storage)
/// are invalidated by it.
pub struct MultiVec<F: FieldSet, P: StoragePolicy = Standard> {
    buf: RawBuffer<P::Alloc>,
    len: P::Size,
    _marker: PhantomData<(F, fn() -> P)>,
}

/// A [`MultiVec`] in raw mode: trivially copyable fields, no element
/// lifecycle, in-place growth.
pub type RawMultiVec<F> = MultiVec<F, Raw>;

fn narrow<S: SizeType>(n: usize) -> S {
    match S::from_usize(n) {
        Some(s) => s,
        None => unreachable!("{n} rows exceed the container's size type"),
    }
}

#[cold]
fn alloc_failure(err: StoreError) -> ! {
    if let StoreError::AllocFailed { size, align } = err {
        if let Ok(layout) = Layout::from_size_align(size, align) {
            handle_alloc_error(layout);
        }
    }
    panic!("{err}");
}

impl<F, P> MultiVec<F, P>
where
    P: StoragePolicy,
    F: Admits<P::Init>,
{
    /// An empty container. Does not allocate.
    pub fn new() -> Self {
        Self::with_allocator(P::Alloc::default())
    }

    /// An empty container using `alloc`. Does not allocate.
    pub fn with_allocator(alloc: P::Alloc) -> Self {
        Self {
            buf: RawBuffer::new(&F::layouts(), alloc),
            len: P::Size::default(),
            _marker: PhantomData,
        }
    }

    /// An empty container with room for exactly `capacity` rows.
    pub fn with_capacity(capacity: P::Size) -> Self {
        let mut v = Self::new();
        v.reserve(capacity);
        v
    }

    /// `len` default rows. In raw mode the rows hold unspecified values.
    pub fn with_len(len: P::Size) -> Self
    where
        F: DefaultFields,
    {
        let mut v = Self::new();
        v.resize(len);
        v
    }

    /// `len` rows, each a clone of `values`.
    pub fn from_elem(len: P::Size, values: &F) -> Self
    where
        F: CloneFields,
    {
        let mut v = Self::new();
        v.resize_with_values(len, values);
        v
    }
}

impl<F: FieldSet, P: StoragePolicy> MultiVec<F, P> {
    fn raw_mode() -> bool {
        <P::Init as InitMode>::DISABLED
    }

    /// Number of rows.
    pub fn len(&self) -> P::Size {
        self.len
    }

    /// Rows the current buffer has room for.
    pub fn capacity(&self) -> P::Size {
        narrow(self.buf.capacity())
    }

    /// `true` when there are no rows.
    pub fn is_empty(&self) -> bool {
        self.len.to_usize() == 0
    }

    /// Grow the buffer to exactly `capacity` rows. Never shrinks; a request
    /// at or below the current capacity does nothing.
    ///
    /// # Panics
    ///
    /// Panics on capacity overflow; aborts through
    /// [`handle_alloc_error`] if the allocator fails.
    pub fn reserve(&mut self, capacity: P::Size) {
        if let Err(e) = self.try_reserve(capacity) {
            alloc_failure(e);
        }
    }

    /// Fallible [`reserve`](Self::reserve). On error the container is
    /// unchanged.
    pub fn try_reserve(&mut self, capacity: P::Size) -> Result<(), StoreError> {
        self.grow_exact(capacity.to_usize())
    }

    /// Set the length to `len`, default-constructing new rows or dropping
    /// surplus ones. Growth reserves exactly `len`.
    ///
    /// # Panics
    ///
    /// As for [`reserve`](Self::reserve). A panicking `Default` impl leaves
    /// the container as it was before the call.
    pub fn resize(&mut self, len: P::Size)
    where
        F: DefaultFields,
    {
        if let Err(e) = self.try_resize(len) {
            alloc_failure(e);
        }
    }

    /// Fallible [`resize`](Self::resize).
    pub fn try_resize(&mut self, len: P::Size) -> Result<(), StoreError>
    where
        F: DefaultFields,
    {
        let (old, new) = (self.len.to_usize(), len.to_usize());
        if new <= old {
            self.truncate(len);
            return Ok(());
        }
        self.grow_exact(new)?;
        // SAFETY: `[old, new)` is inside the capacity and uninitialized.
        unsafe { construct_range::<F, P::Init>(&self.buf.arrays(), old, new) };
        self.len = len;
        Ok(())
    }

    /// [`resize`](Self::resize), cloning `values` into new rows.
    pub fn resize_with_values(&mut self, len: P::Size, values: &F)
    where
        F: CloneFields,
    {
        if let Err(e) = self.try_resize_with_values(len, values) {
            alloc_failure(e);
        }
    }

    /// Fallible [`resize_with_values`](Self::resize_with_values).
    pub fn try_resize_with_values(&mut self, len: P::Size, values: &F) -> Result<(), StoreError>
    where
        F: CloneFields,
    {
        let (old, new) = (self.len.to_usize(), len.to_usize());
        if new <= old {
            self.truncate(len);
            return Ok(());
        }
        self.grow_exact(new)?;
        // SAFETY: `[old, new)` is inside the capacity and uninitialized.
        unsafe { fill_range::<F, P::Init>(&self.buf.arrays(), old, new, values) };
        self.len = len;
        Ok(())
    }

    /// Drop every row from `len` on. Does nothing if `len >= self.len()`.
    pub fn truncate(&mut self, len: P::Size) {
        let (old, new) = (self.len.to_usize(), len.to_usize());
        if new >= old {
            return;
        }
        // Shorten first so a panicking destructor cannot cause a double drop.
        self.len = len;
        // SAFETY: `[new, old)` was initialized and is now outside `len`.
        unsafe { destroy_range::<F, P::Init>(&self.buf.arrays(), new, old) };
    }

    /// Drop every row. The capacity is kept.
    pub fn clear(&mut self) {
        self.truncate(P::Size::default());
    }

    /// Append a row. Equivalent to `resize(len + 1)` with `values` as the
    /// new row, unless the policy grows appends geometrically.
    ///
    /// # Panics
    ///
    /// As for [`reserve`](Self::reserve).
    pub fn push_back(&mut self, values: F) {
        if let Err(e) = self.try_push_back(values) {
            alloc_failure(e);
        }
    }

    /// Fallible [`push_back`](Self::push_back). On error `values` is
    /// dropped and the container is unchanged.
    pub fn try_push_back(&mut self, values: F) -> Result<(), StoreError> {
        let row = self.grow_for_one()?;
        // SAFETY: `row < capacity` and uninitialized.
        unsafe { values.write_row(&self.buf.arrays(), row) };
        self.len = narrow(row + 1);
        Ok(())
    }

    /// Append a default row and return mutable references to its fields.
    ///
    /// In raw mode the new row holds unspecified values.
    pub fn emplace_back(&mut self) -> F::Mut<'_>
    where
        F: DefaultFields,
    {
        let row = self.grow_for_one().unwrap_or_else(|e| alloc_failure(e));
        let arrays = self.buf.arrays();
        // SAFETY: `row < capacity` and uninitialized.
        unsafe { construct_range::<F, P::Init>(&arrays, row, row + 1) };
        self.len = narrow(row + 1);
        // SAFETY: just constructed; borrowed through `&mut self`.
        unsafe { F::row_mut(&arrays, row) }
    }

    /// Drop the last row.
    ///
    /// # Panics
    ///
    /// Panics if the container is empty.
    pub fn pop_back(&mut self) {
        let len = self.len.to_usize();
        assert!(len > 0, "pop_back on an empty MultiVec");
        self.len = narrow(len - 1);
        // SAFETY: the last row was initialized and is now outside `len`.
        unsafe { destroy_range::<F, P::Init>(&self.buf.arrays(), len - 1, len) };
    }

    /// Remove the last row and return it, or `None` if empty.
    pub fn pop(&mut self) -> Option<F> {
        let len = self.len.to_usize();
        if len == 0 {
            return None;
        }
        self.len = narrow(len - 1);
        // SAFETY: the last row was initialized; ownership moves out.
        Some(unsafe { F::read_row(&self.buf.arrays(), len - 1) })
    }

    /// Swap the rows at two cursors, field by field.
    pub fn swap(&mut self, a: Cursor<P::Size>, b: Cursor<P::Size>) {
        self.swap_rows(a.index(), b.index());
    }

    /// Swap rows `a` and `b`, field by field. `a == b` does nothing.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn swap_rows(&mut self, a: P::Size, b: P::Size) {
        let (a, b) = (self.check(a), self.check(b));
        if a != b {
            // SAFETY: both rows are initialized.
            unsafe { F::swap_rows(&self.buf.arrays(), a, b) };
        }
    }

    /// Field `I` of row `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row >= len`.
    pub fn at<const I: usize>(&self, row: P::Size) -> &Field<F, I>
    where
        F: FieldAt<I>,
    {
        let row = self.check(row);
        // SAFETY: bounds checked; field `I` has type `Field<F, I>`.
        unsafe { &*self.buf.column::<Field<F, I>>(I).add(row) }
    }

    /// Mutable field `I` of row `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row >= len`.
    pub fn at_mut<const I: usize>(&mut self, row: P::Size) -> &mut Field<F, I>
    where
        F: FieldAt<I>,
    {
        let row = self.check(row);
        // SAFETY: bounds checked; exclusive through `&mut self`.
        unsafe { &mut *self.buf.column::<Field<F, I>>(I).add(row) }
    }

    /// Field `I` of the row a cursor addresses.
    pub fn get<const I: usize>(&self, pos: impl RowPosition<P::Size>) -> &Field<F, I>
    where
        F: FieldAt<I>,
    {
        self.at::<I>(pos.row())
    }

    /// Mutable field `I` of the row a cursor addresses.
    pub fn get_mut<const I: usize>(&mut self, pos: impl RowPosition<P::Size>) -> &mut Field<F, I>
    where
        F: FieldAt<I>,
    {
        self.at_mut::<I>(pos.row())
    }

    /// Field `I` of row `row` without a bounds check.
    ///
    /// # Safety
    ///
    /// `row` must be less than `len()`.
    pub unsafe fn get_unchecked<const I: usize>(&self, row: P::Size) -> &Field<F, I>
    where
        F: FieldAt<I>,
    {
        debug_assert!(row < self.len);
        // SAFETY: caller guarantees `row < len`.
        unsafe { &*self.buf.column::<Field<F, I>>(I).add(row.to_usize()) }
    }

    /// Mutable field `I` of row `row` without a bounds check.
    ///
    /// # Safety
    ///
    /// `row` must be less than `len()`.
    pub unsafe fn get_unchecked_mut<const I: usize>(&mut self, row: P::Size) -> &mut Field<F, I>
    where
        F: FieldAt<I>,
    {
        debug_assert!(row < self.len);
        // SAFETY: caller guarantees `row < len`.
        unsafe { &mut *self.buf.column::<Field<F, I>>(I).add(row.to_usize()) }
    }

    /// Pointer to the start of field `I`'s array. Invalidated by growth.
    pub fn data<const I: usize>(&self) -> *const Field<F, I>
    where
        F: FieldAt<I>,
    {
        self.buf.column::<Field<F, I>>(I)
    }

    /// Mutable pointer to the start of field `I`'s array.
    pub fn data_mut<const I: usize>(&mut self) -> *mut Field<F, I>
    where
        F: FieldAt<I>,
    {
        self.buf.column::<Field<F, I>>(I)
    }

    /// Field `I` of every row, as a slice.
    pub fn field<const I: usize>(&self) -> &[Field<F, I>]
    where
        F: FieldAt<I>,
    {
        // SAFETY: the column pointer is aligned and non-null even when
        // nothing is allocated; rows `[0, len)` are initialized.
        unsafe { slice::from_raw_parts(self.buf.column(I), self.len.to_usize()) }
    }

    /// Field `I` of every row, as a mutable slice.
    pub fn field_mut<const I: usize>(&mut self) -> &mut [Field<F, I>]
    where
        F: FieldAt<I>,
    {
        // SAFETY: as in `field`, exclusive through `&mut self`.
        unsafe { slice::from_raw_parts_mut(self.buf.column(I), self.len.to_usize()) }
    }

    /// Start of the underlying buffer. Invalidated by growth.
    pub fn storage(&self) -> *const u8 {
        self.buf.as_ptr()
    }

    /// Byte layout of the current buffer.
    pub fn layout(&self) -> &StorageLayout {
        self.buf.layout()
    }

    /// Cursor at row 0.
    pub fn begin(&self) -> Cursor<P::Size> {
        Cursor::new(P::Size::default())
    }

    /// Cursor one past the last row.
    pub fn end(&self) -> Cursor<P::Size> {
        Cursor::new(self.len)
    }

    /// Reverse cursor at the last row.
    pub fn rbegin(&self) -> RevCursor<P::Size> {
        RevCursor::new(self.end())
    }

    /// Reverse cursor one before row 0.
    pub fn rend(&self) -> RevCursor<P::Size> {
        RevCursor::new(self.begin())
    }

    /// Every cursor from `begin()` to `end()`.
    pub fn cursors(&self) -> Cursors<P::Size> {
        Cursors::new(self.len)
    }

    /// References to every field of row `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row >= len`.
    pub fn row(&self, row: P::Size) -> F::Ref<'_> {
        let row = self.check(row);
        // SAFETY: bounds checked; shared through `&self`.
        unsafe { F::row_ref(&self.buf.arrays(), row) }
    }

    /// Mutable references to every field of row `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row >= len`.
    pub fn row_mut(&mut self, row: P::Size) -> F::Mut<'_> {
        let row = self.check(row);
        // SAFETY: bounds checked; exclusive through `&mut self`.
        unsafe { F::row_mut(&self.buf.arrays(), row) }
    }

    /// Iterate over rows as tuples of references.
    pub fn iter(&self) -> Rows<'_, F> {
        // SAFETY: `[0, len)` initialized, shared through `&self`.
        unsafe { Rows::new(self.buf.arrays(), self.len.to_usize()) }
    }

    /// Iterate over rows as tuples of mutable references.
    pub fn iter_mut(&mut self) -> RowsMut<'_, F> {
        // SAFETY: `[0, len)` initialized, exclusive through `&mut self`.
        unsafe { RowsMut::new(self.buf.arrays(), self.len.to_usize()) }
    }

    /// The allocator backing this container.
    pub fn allocator(&self) -> &P::Alloc {
        self.buf.allocator()
    }

    fn check(&self, row: P::Size) -> usize {
        let (row, len) = (row.to_usize(), self.len.to_usize());
        assert!(row < len, "row index {row} out of bounds for length {len}");
        row
    }

    fn grow_exact(&mut self, capacity: usize) -> Result<(), StoreError> {
        if capacity <= self.buf.capacity() {
            return Ok(());
        }
        if capacity > P::Size::MAX_USIZE {
            return Err(StoreError::CapacityOverflow {
                requested: capacity,
            });
        }
        let len = self.len.to_usize();
        if Self::raw_mode() {
            // SAFETY: raw mode only admits trivial field sets, and raw
            // buffers are always fully initialized.
            return unsafe { self.buf.grow_in_place(capacity, len) };
        }
        let mut fresh = RawBuffer::with_capacity(
            self.buf.layout().fields(),
            capacity,
            self.buf.allocator().clone(),
            false,
        )?;
        // SAFETY: distinct buffers, both with room for `len` rows.
        unsafe { move_range::<F>(&self.buf.arrays(), len, &fresh.arrays()) };
        // The old buffer now holds only moved-from bytes; dropping it just
        // releases the memory.
        self.buf.swap(&mut fresh);
        Ok(())
    }

    /// Make room for one more row; returns the index it goes in.
    fn grow_for_one(&mut self) -> Result<usize, StoreError> {
        let len = self.len.to_usize();
        let capacity = self.buf.capacity();
        if len < capacity {
            return Ok(len);
        }
        let max = P::Size::MAX_USIZE;
        let required = len + 1;
        if len >= max {
            return Err(StoreError::CapacityOverflow { requested: required });
        }
        let target = if P::AMORTIZED {
            capacity
                .saturating_mul(2)
                .max(required)
                .max(P::MIN_GROWTH)
                .min(max)
        } else {
            required
        };
        self.grow_exact(target)?;
        Ok(len)
    }
}

impl<F: FieldSet, P: StoragePolicy> Drop for MultiVec<F, P> {
    fn drop(&mut self) {
        // SAFETY: `[0, len)` is initialized; the buffer releases its memory
        // afterwards.
        unsafe { destroy_range::<F, P::Init>(&self.buf.arrays(), 0, self.len.to_usize()) };
    }
}

impl<F: CloneFields, P: StoragePolicy> Clone for MultiVec<F, P> {
    /// Deep copy into a buffer of exactly `len()` rows.
    fn clone(&self) -> Self {
        let len = self.len.to_usize();
        let fresh = RawBuffer::with_capacity(
            self.buf.layout().fields(),
            len,
            self.buf.allocator().clone(),
            Self::raw_mode(),
        )
        .unwrap_or_else(|e| alloc_failure(e));
        // SAFETY: distinct buffers; `fresh` has room for `len` rows. If a
        // clone panics, `fresh` is released with no live rows.
        unsafe { copy_range::<F, P::Init>(&self.buf.arrays(), len, &fresh.arrays()) };
        Self {
            buf: fresh,
            len: self.len,
            _marker: PhantomData,
        }
    }
}

impl<F, P> Default for MultiVec<F, P>
where
    P: StoragePolicy,
    F: Admits<P::Init>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FieldSet, P: StoragePolicy> fmt::Debug for MultiVec<F, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiVec")
            .field("len", &self.len)
            .field("capacity", &self.buf.capacity())
            .field("mode", &<P::Init as InitMode>::NAME)
            .field("offsets", &self.buf.layout().offsets())
            .finish()
    }
}

impl<F: FieldSet, P: StoragePolicy> Extend<F> for MultiVec<F, P> {
    fn extend<I: IntoIterator<Item = F>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let wanted = self.len.to_usize().saturating_add(iter.size_hint().0);
        if let Err(e) = self.grow_exact(wanted) {
            alloc_failure(e);
        }
        for values in iter {
            self.push_back(values);
        }
    }
}

impl<F, P> FromIterator<F> for MultiVec<F, P>
where
    P: StoragePolicy,
    F: Admits<P::Init>,
{
    fn from_iter<I: IntoIterator<Item = F>>(iter: I) -> Self {
        let mut v = Self::new();
        v.extend(iter);
        v
    }
}

impl<'a, F: FieldSet + 'a, P: StoragePolicy> IntoIterator for &'a MultiVec<F, P> {
    type Item = F::Ref<'a>;
    type IntoIter = Rows<'a, F>;

    fn into_iter(self) -> Rows<'a, F> {
        self.iter()
    }
}

impl<'a, F: FieldSet + 'a, P: StoragePolicy> IntoIterator for &'a mut MultiVec<F, P> {
    type Item = F::Mut<'a>;
    type IntoIter = RowsMut<'a, F>;

    fn into_iter(self) -> RowsMut<'a, F> {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stria_arena::Amortized;

    #[test]
    fn new_does_not_allocate() {
        let v: MultiVec<(u8, u64)> = MultiVec::new();
        assert_eq!(v.len(), 0);
        assert_eq!(v.capacity(), 0);
        assert!(v.is_empty());
        assert!(v.field::<1>().is_empty());
    }

    #[test]
    fn push_reserves_exactly_one_more_row() {
        let mut v: MultiVec<(u8, u16)> = MultiVec::new();
        v.push_back((b'a', 1));
        assert_eq!(v.capacity(), 1);
        for i in 2..=5 {
            v.push_back((b'a', i));
        }
        assert_eq!(v.capacity(), 5);
        v.emplace_back();
        assert_eq!(v.capacity(), 6);
        assert_eq!(v.field::<1>(), &[1, 2, 3, 4, 5, 0]);
    }

    #[test]
    fn amortized_push_grows_geometrically_from_four() {
        let mut v: MultiVec<(u32,), Amortized> = MultiVec::new();
        v.push_back((1,));
        assert_eq!(v.capacity(), 4);
        for i in 2..=5 {
            v.push_back((i,));
        }
        assert_eq!(v.capacity(), 8);
        assert_eq!(v.field::<0>(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn reserve_is_exact_and_never_shrinks() {
        let mut v: MultiVec<(u8, i32, f64)> = MultiVec::with_capacity(5);
        assert_eq!(v.capacity(), 5);
        assert_eq!(v.layout().offsets(), &[0, 8, 32]);
        let before = v.storage();
        v.reserve(3);
        assert_eq!(v.capacity(), 5);
        assert_eq!(v.storage(), before);
    }

    #[test]
    fn emplace_back_returns_the_new_row() {
        let mut v: MultiVec<(u8, String)> = MultiVec::new();
        let (n, s) = v.emplace_back();
        *n = 9;
        s.push_str("nine");
        assert_eq!(v.len(), 1);
        assert_eq!(v.row(0), (&9, &String::from("nine")));
    }

    #[test]
    fn pop_returns_owned_row() {
        let mut v: MultiVec<(u8, String)> = MultiVec::new();
        v.push_back((1, "a".into()));
        v.push_back((2, "b".into()));
        assert_eq!(v.pop(), Some((2, String::from("b"))));
        assert_eq!(v.len(), 1);
        v.pop_back();
        assert_eq!(v.pop(), None);
    }

    #[test]
    #[should_panic(expected = "pop_back on an empty MultiVec")]
    fn pop_back_on_empty_panics() {
        let mut v: MultiVec<(u8,)> = MultiVec::new();
        v.pop_back();
    }

    #[test]
    #[should_panic(expected = "row index 2 out of bounds for length 2")]
    fn at_checks_bounds() {
        let v: MultiVec<(u8, u16)> = MultiVec::with_len(2);
        v.at::<1>(2);
    }

    #[test]
    fn debug_names_mode_and_offsets() {
        let v: MultiVec<(u8, u32)> = MultiVec::with_capacity(2);
        let text = format!("{v:?}");
        assert!(text.contains("initialize"));
        assert!(text.contains("[0, 4]"));
    }
}
