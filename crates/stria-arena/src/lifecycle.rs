//! Construct, fill, copy, move, and destroy element ranges across every
//! field of a buffer in lockstep.
//!
//! All entry points walk fields in declaration order. If a `Default` or
//! `Clone` impl panics part-way, the column being built drops the elements
//! it already produced, every previously completed column is dropped in
//! reverse order, and the panic resumes. A range is therefore either fully
//! constructed in all fields or not constructed at all.
//!
//! The mode parameter `M` selects the raw path: with
//! [`Uninitialized`](stria_core::Uninitialized), construction and
//! destruction are no-ops and copies are per-field block copies.

#![allow(unsafe_code)]

use std::mem;
use std::ptr;

use smallvec::SmallVec;
use stria_core::{InitMode, INLINE_FIELDS};

use crate::fields::{CloneFields, DefaultFields, FieldSet};
use crate::raw::FieldArrays;

/// Type-erased "drop `[first, last)` of this column".
pub(crate) type DropColumn = unsafe fn(*mut u8, usize, usize);

/// Drop elements `[first, last)` of a column of `T`s.
///
/// # Safety
///
/// `base` must be the base of a `T` column whose elements in the range are
/// initialized; they are uninitialized afterwards.
pub(crate) unsafe fn drop_column<T>(base: *mut u8, first: usize, last: usize) {
    if mem::needs_drop::<T>() && first < last {
        // SAFETY: caller contract.
        unsafe {
            let start = base.cast::<T>().add(first);
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(start, last - first));
        }
    }
}

/// Drops a column's elements `[first, built)` unless forgotten.
struct PartialColumn<T> {
    base: *mut T,
    first: usize,
    built: usize,
}

impl<T> Drop for PartialColumn<T> {
    fn drop(&mut self) {
        // SAFETY: exactly `[first, built)` was written before the unwind.
        unsafe { drop_column::<T>(self.base.cast(), self.first, self.built) }
    }
}

/// Write `T::default()` into `[first, last)`.
///
/// # Safety
///
/// The range must be in bounds and uninitialized.
pub(crate) unsafe fn default_column<T: Default>(base: *mut T, first: usize, last: usize) {
    let mut guard = PartialColumn {
        base,
        first,
        built: first,
    };
    while guard.built < last {
        // SAFETY: in bounds and uninitialized per caller contract.
        unsafe { base.add(guard.built).write(T::default()) };
        guard.built += 1;
    }
    mem::forget(guard);
}

/// Write clones of `value` into `[first, last)`.
///
/// # Safety
///
/// The range must be in bounds and uninitialized.
pub(crate) unsafe fn fill_column<T: Clone>(base: *mut T, first: usize, last: usize, value: &T) {
    let mut guard = PartialColumn {
        base,
        first,
        built: first,
    };
    while guard.built < last {
        // SAFETY: in bounds and uninitialized per caller contract.
        unsafe { base.add(guard.built).write(value.clone()) };
        guard.built += 1;
    }
    mem::forget(guard);
}

/// Clone `count` elements from `src` into uninitialized `dst`.
///
/// # Safety
///
/// `src[..count]` initialized, `dst[..count]` in bounds and uninitialized,
/// the two ranges disjoint.
pub(crate) unsafe fn clone_column<T: Clone>(src: *const T, dst: *mut T, count: usize) {
    let mut guard = PartialColumn {
        base: dst,
        first: 0,
        built: 0,
    };
    while guard.built < count {
        // SAFETY: caller contract.
        unsafe { dst.add(guard.built).write((*src.add(guard.built)).clone()) };
        guard.built += 1;
    }
    mem::forget(guard);
}

/// Drops every completed column over `[first, last)`, newest first, unless
/// committed.
pub(crate) struct Rollback {
    first: usize,
    last: usize,
    done: SmallVec<[(*mut u8, DropColumn); INLINE_FIELDS]>,
}

impl Rollback {
    pub(crate) fn new(first: usize, last: usize) -> Self {
        Self {
            first,
            last,
            done: SmallVec::new(),
        }
    }

    /// Record that `base[first..last]` is fully built.
    pub(crate) fn push(&mut self, base: *mut u8, drop: DropColumn) {
        self.done.push((base, drop));
    }

    /// Every column succeeded: keep them.
    pub(crate) fn commit(mut self) {
        self.done.clear();
    }
}

impl Drop for Rollback {
    fn drop(&mut self) {
        while let Some((base, drop)) = self.done.pop() {
            // SAFETY: `push` is only called after the column was fully built
            // over `[first, last)`.
            unsafe { drop(base, self.first, self.last) };
        }
    }
}

/// Default-construct rows `[first, last)` in every field.
///
/// No-op in raw mode.
///
/// # Safety
///
/// `arrays` must belong to a buffer for `F` with capacity `>= last`, and
/// the rows must be uninitialized.
pub unsafe fn construct_range<F: DefaultFields, M: InitMode>(
    arrays: &FieldArrays,
    first: usize,
    last: usize,
) {
    if M::DISABLED || first >= last {
        return;
    }
    // SAFETY: forwarded caller contract.
    unsafe { F::default_rows(arrays, first, last) }
}

/// Write a clone of `values` into every row of `[first, last)`.
///
/// In raw mode the rows may hold stale bytes; they are overwritten without
/// being dropped (trivial fields have no drop glue).
///
/// # Safety
///
/// As for [`construct_range`].
pub unsafe fn fill_range<F: CloneFields, M: InitMode>(
    arrays: &FieldArrays,
    first: usize,
    last: usize,
    values: &F,
) {
    if first >= last {
        return;
    }
    // SAFETY: forwarded caller contract.
    unsafe { F::fill_rows(arrays, first, last, values) }
}

/// Clone rows `[0, count)` of `src` into the uninitialized rows
/// `[0, count)` of `dst`.
///
/// Raw mode copies each field's bytes in one block.
///
/// # Safety
///
/// Both arrays must belong to distinct `F` buffers with capacity
/// `>= count`; `src` rows initialized, `dst` rows uninitialized.
pub unsafe fn copy_range<F: CloneFields, M: InitMode>(
    src: &FieldArrays,
    count: usize,
    dst: &FieldArrays,
) {
    if count == 0 {
        return;
    }
    if M::DISABLED {
        // SAFETY: trivial fields; bitwise copy equals clone.
        unsafe { block_copy::<F>(src, count, dst) };
    } else {
        // SAFETY: forwarded caller contract.
        unsafe { F::clone_rows(src, dst, count) };
    }
}

/// Relocate rows `[0, count)` of `src` into rows `[0, count)` of `dst`.
///
/// Afterwards the source rows are logically uninitialized and must not be
/// dropped. Relocation is a bitwise copy and cannot fail.
///
/// # Safety
///
/// As for [`copy_range`].
pub unsafe fn move_range<F: FieldSet>(src: &FieldArrays, count: usize, dst: &FieldArrays) {
    if count == 0 {
        return;
    }
    // SAFETY: forwarded caller contract.
    unsafe { block_copy::<F>(src, count, dst) };
}

/// Drop rows `[first, last)` in every field.
///
/// No-op in raw mode and for fields without drop glue.
///
/// # Safety
///
/// The rows must be initialized; they are uninitialized afterwards.
pub unsafe fn destroy_range<F: FieldSet, M: InitMode>(
    arrays: &FieldArrays,
    first: usize,
    last: usize,
) {
    if M::DISABLED || !F::NEEDS_DROP || first >= last {
        return;
    }
    // SAFETY: forwarded caller contract.
    unsafe { F::drop_rows(arrays, first, last) }
}

unsafe fn block_copy<F: FieldSet>(src: &FieldArrays, count: usize, dst: &FieldArrays) {
    for (i, field) in F::layouts().iter().enumerate() {
        let bytes = count * field.size;
        if bytes > 0 {
            // SAFETY: distinct buffers, both with at least `count` rows.
            unsafe { ptr::copy_nonoverlapping(src.base(i), dst.base(i), bytes) };
        }
    }
}
