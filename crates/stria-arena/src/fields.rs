//! Field sets: the compile-time list of column types a container stores.
//!
//! A field set is a tuple `(T0, T1, ..)` of 1 to 12 types. Tuple order is
//! layout order and lifecycle order. The traits here are implemented for
//! every arity by `impl_field_set!`; user code never implements them.
//!
//! | Trait | Implemented when | Provides |
//! |-------|------------------|----------|
//! | [`FieldSet`] | always | layouts, row read/write/swap, drop |
//! | [`DefaultFields`] | every field `Default` | default construction |
//! | [`CloneFields`] | every field `Clone` | fill and deep copy |
//! | [`TrivialFields`] | every field `Copy + FromBytes` | raw-mode admission |
//! | [`FieldAt<I>`] | `I < N` | the type of field `I` |

#![allow(unsafe_code)]

use std::ptr;

use stria_core::{FieldLayouts, FieldLayout, Initialize, Uninitialized};
use zerocopy::FromBytes;

use crate::lifecycle::{clone_column, default_column, drop_column, fill_column, Rollback};
use crate::raw::FieldArrays;

/// A tuple of column types stored as parallel arrays.
///
/// # Safety
///
/// `layouts()` must describe the tuple's element types in order, and every
/// row method must access field `i` through `arrays.column::<Ti>(i)`.
pub unsafe trait FieldSet: Sized {
    /// Number of fields.
    const COUNT: usize;

    /// Whether any field has drop glue.
    const NEEDS_DROP: bool;

    /// One shared reference per field.
    type Ref<'a>
    where
        Self: 'a;

    /// One mutable reference per field.
    type Mut<'a>
    where
        Self: 'a;

    /// Per-field layouts, in declaration order.
    fn layouts() -> FieldLayouts;

    /// Move every element of `self` into row `row`.
    ///
    /// # Safety
    ///
    /// `row` must be in bounds of `arrays` and uninitialized.
    unsafe fn write_row(self, arrays: &FieldArrays, row: usize);

    /// Move row `row` out into an owned tuple.
    ///
    /// # Safety
    ///
    /// `row` must be initialized; it is logically uninitialized afterwards.
    unsafe fn read_row(arrays: &FieldArrays, row: usize) -> Self;

    /// Borrow every field of row `row`.
    ///
    /// # Safety
    ///
    /// `row` must be initialized, and the buffer must outlive `'a` without
    /// being mutated.
    unsafe fn row_ref<'a>(arrays: &FieldArrays, row: usize) -> Self::Ref<'a>;

    /// Mutably borrow every field of row `row`.
    ///
    /// # Safety
    ///
    /// As for [`row_ref`](Self::row_ref), with exclusive access for `'a`.
    unsafe fn row_mut<'a>(arrays: &FieldArrays, row: usize) -> Self::Mut<'a>;

    /// Swap rows `a` and `b` field by field. `a == b` is allowed.
    ///
    /// # Safety
    ///
    /// Both rows must be initialized.
    unsafe fn swap_rows(arrays: &FieldArrays, a: usize, b: usize);

    /// Drop rows `[first, last)`, field by field.
    ///
    /// # Safety
    ///
    /// The rows must be initialized; they are uninitialized afterwards.
    unsafe fn drop_rows(arrays: &FieldArrays, first: usize, last: usize);
}

/// Field sets whose every field is `Default`.
///
/// # Safety
///
/// Same contract as [`FieldSet`].
pub unsafe trait DefaultFields: FieldSet {
    /// Default-construct rows `[first, last)` with rollback on panic.
    ///
    /// # Safety
    ///
    /// The rows must be in bounds and uninitialized.
    unsafe fn default_rows(arrays: &FieldArrays, first: usize, last: usize);
}

/// Field sets whose every field is `Clone`.
///
/// # Safety
///
/// Same contract as [`FieldSet`].
pub unsafe trait CloneFields: FieldSet {
    /// Clone each of `values`' fields into rows `[first, last)` with
    /// rollback on panic.
    ///
    /// # Safety
    ///
    /// The rows must be in bounds and uninitialized.
    unsafe fn fill_rows(arrays: &FieldArrays, first: usize, last: usize, values: &Self);

    /// Clone rows `[0, count)` from `src` into `dst` with rollback on panic.
    ///
    /// # Safety
    ///
    /// `src` rows initialized, `dst` rows uninitialized, buffers distinct.
    unsafe fn clone_rows(src: &FieldArrays, dst: &FieldArrays, count: usize);
}

/// Field sets that can live in raw storage: every field is `Copy` and valid
/// for any bit pattern.
///
/// # Safety
///
/// Implemented only through `impl_field_set!`, whose bounds guarantee the
/// property.
pub unsafe trait TrivialFields: FieldSet + CloneFields + Copy {}

/// Compile-time access to the type of field `I`.
pub trait FieldAt<const I: usize>: FieldSet {
    /// The field's element type.
    type Type;
}

/// Shorthand for the type of field `I` of `F`.
pub type Field<F, const I: usize> = <F as FieldAt<I>>::Type;

/// Field sets a container with initialization mode `M` may store.
///
/// Every field set admits [`Initialize`]; only [`TrivialFields`] admit
/// [`Uninitialized`].
pub trait Admits<M>: FieldSet {}

impl<F: FieldSet> Admits<Initialize> for F {}
impl<F: TrivialFields> Admits<Uninitialized> for F {}

macro_rules! impl_field_set {
    (@at [$($All:ident),+]; $idx:tt : $T:ident) => {
        impl<$($All),+> FieldAt<$idx> for ($($All,)+) {
            type Type = $T;
        }
    };

    (@each $all:tt; $($idx:tt : $T:ident),+) => {
        $( impl_field_set!(@at $all; $idx : $T); )+
    };

    ($($idx:tt : $T:ident),+) => {
        unsafe impl<$($T),+> FieldSet for ($($T,)+) {
            const COUNT: usize = [$($idx),+].len();
            const NEEDS_DROP: bool = false $(|| std::mem::needs_drop::<$T>())+;

            type Ref<'a> = ($(&'a $T,)+) where Self: 'a;
            type Mut<'a> = ($(&'a mut $T,)+) where Self: 'a;

            fn layouts() -> FieldLayouts {
                let mut layouts = FieldLayouts::new();
                $( layouts.push(FieldLayout::of::<$T>()); )+
                layouts
            }

            unsafe fn write_row(self, arrays: &FieldArrays, row: usize) {
                // SAFETY: caller contract; field `$idx` has type `$T`.
                unsafe { $( arrays.column::<$T>($idx).add(row).write(self.$idx); )+ }
            }

            unsafe fn read_row(arrays: &FieldArrays, row: usize) -> Self {
                // SAFETY: caller contract.
                unsafe { ($( arrays.column::<$T>($idx).add(row).read(), )+) }
            }

            unsafe fn row_ref<'a>(arrays: &FieldArrays, row: usize) -> Self::Ref<'a> {
                // SAFETY: caller contract.
                unsafe { ($( &*arrays.column::<$T>($idx).add(row), )+) }
            }

            unsafe fn row_mut<'a>(arrays: &FieldArrays, row: usize) -> Self::Mut<'a> {
                // SAFETY: caller contract; fields live in disjoint arrays.
                unsafe { ($( &mut *arrays.column::<$T>($idx).add(row), )+) }
            }

            unsafe fn swap_rows(arrays: &FieldArrays, a: usize, b: usize) {
                $(
                    let column = arrays.column::<$T>($idx);
                    // SAFETY: caller contract; `ptr::swap` allows `a == b`.
                    unsafe { ptr::swap(column.add(a), column.add(b)) };
                )+
            }

            unsafe fn drop_rows(arrays: &FieldArrays, first: usize, last: usize) {
                // SAFETY: caller contract.
                unsafe { $( drop_column::<$T>(arrays.base($idx), first, last); )+ }
            }
        }

        unsafe impl<$($T: Default),+> DefaultFields for ($($T,)+) {
            unsafe fn default_rows(arrays: &FieldArrays, first: usize, last: usize) {
                let mut rollback = Rollback::new(first, last);
                $(
                    // SAFETY: caller contract; a panic here drops the columns
                    // recorded so far.
                    unsafe { default_column::<$T>(arrays.column($idx), first, last) };
                    rollback.push(arrays.base($idx), drop_column::<$T>);
                )+
                rollback.commit();
            }
        }

        unsafe impl<$($T: Clone),+> CloneFields for ($($T,)+) {
            unsafe fn fill_rows(arrays: &FieldArrays, first: usize, last: usize, values: &Self) {
                let mut rollback = Rollback::new(first, last);
                $(
                    // SAFETY: caller contract.
                    unsafe { fill_column::<$T>(arrays.column($idx), first, last, &values.$idx) };
                    rollback.push(arrays.base($idx), drop_column::<$T>);
                )+
                rollback.commit();
            }

            unsafe fn clone_rows(src: &FieldArrays, dst: &FieldArrays, count: usize) {
                let mut rollback = Rollback::new(0, count);
                $(
                    // SAFETY: caller contract.
                    unsafe { clone_column::<$T>(src.column($idx), dst.column($idx), count) };
                    rollback.push(dst.base($idx), drop_column::<$T>);
                )+
                rollback.commit();
            }
        }

        unsafe impl<$($T: Copy + FromBytes),+> TrivialFields for ($($T,)+) {}

        impl_field_set!(@each [$($T),+]; $($idx : $T),+);
    };
}

impl_field_set!(0: A);
impl_field_set!(0: A, 1: B);
impl_field_set!(0: A, 1: B, 2: C);
impl_field_set!(0: A, 1: B, 2: C, 3: D);
impl_field_set!(0: A, 1: B, 2: C, 3: D, 4: E);
impl_field_set!(0: A, 1: B, 2: C, 3: D, 4: E, 5: G);
impl_field_set!(0: A, 1: B, 2: C, 3: D, 4: E, 5: G, 6: H);
impl_field_set!(0: A, 1: B, 2: C, 3: D, 4: E, 5: G, 6: H, 7: J);
impl_field_set!(0: A, 1: B, 2: C, 3: D, 4: E, 5: G, 6: H, 7: J, 8: K);
impl_field_set!(0: A, 1: B, 2: C, 3: D, 4: E, 5: G, 6: H, 7: J, 8: K, 9: L);
impl_field_set!(0: A, 1: B, 2: C, 3: D, 4: E, 5: G, 6: H, 7: J, 8: K, 9: L, 10: M);
impl_field_set!(0: A, 1: B, 2: C, 3: D, 4: E, 5: G, 6: H, 7: J, 8: K, 9: L, 10: M, 11: N);
