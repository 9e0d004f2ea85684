//! Row iterators yielding one reference per field.

#![allow(unsafe_code)]

use std::iter::FusedIterator;
use std::marker::PhantomData;

use stria_arena::{FieldArrays, FieldSet};

/// Iterator over shared row views, created by
/// [`MultiVec::iter`](crate::MultiVec::iter).
pub struct Rows<'a, F: FieldSet> {
    arrays: FieldArrays,
    front: usize,
    back: usize,
    _borrow: PhantomData<&'a F>,
}

impl<'a, F: FieldSet> Rows<'a, F> {
    /// # Safety
    ///
    /// Rows `[0, len)` of `arrays` must be initialized and stay shared for
    /// `'a`.
    pub(crate) unsafe fn new(arrays: FieldArrays, len: usize) -> Self {
        Self {
            arrays,
            front: 0,
            back: len,
            _borrow: PhantomData,
        }
    }
}

impl<'a, F: FieldSet + 'a> Iterator for Rows<'a, F> {
    type Item = F::Ref<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        // SAFETY: `front < back <= len`, shared for `'a` per `new`.
        let row = unsafe { F::row_ref(&self.arrays, self.front) };
        self.front += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl<'a, F: FieldSet + 'a> DoubleEndedIterator for Rows<'a, F> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        // SAFETY: as in `next`.
        Some(unsafe { F::row_ref(&self.arrays, self.back) })
    }
}

impl<'a, F: FieldSet + 'a> ExactSizeIterator for Rows<'a, F> {}
impl<'a, F: FieldSet + 'a> FusedIterator for Rows<'a, F> {}

/// Iterator over mutable row views, created by
/// [`MultiVec::iter_mut`](crate::MultiVec::iter_mut).
pub struct RowsMut<'a, F: FieldSet> {
    arrays: FieldArrays,
    front: usize,
    back: usize,
    _borrow: PhantomData<&'a mut F>,
}

impl<'a, F: FieldSet> RowsMut<'a, F> {
    /// # Safety
    ///
    /// Rows `[0, len)` of `arrays` must be initialized and exclusively
    /// borrowed for `'a`.
    pub(crate) unsafe fn new(arrays: FieldArrays, len: usize) -> Self {
        Self {
            arrays,
            front: 0,
            back: len,
            _borrow: PhantomData,
        }
    }
}

impl<'a, F: FieldSet + 'a> Iterator for RowsMut<'a, F> {
    type Item = F::Mut<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        // SAFETY: every row is yielded at most once, so the mutable views
        // never alias.
        let row = unsafe { F::row_mut(&self.arrays, self.front) };
        self.front += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl<'a, F: FieldSet + 'a> DoubleEndedIterator for RowsMut<'a, F> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        // SAFETY: as in `next`.
        Some(unsafe { F::row_mut(&self.arrays, self.back) })
    }
}

impl<'a, F: FieldSet + 'a> ExactSizeIterator for RowsMut<'a, F> {}
impl<'a, F: FieldSet + 'a> FusedIterator for RowsMut<'a, F> {}
