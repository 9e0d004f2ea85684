//! Index cursors over container rows.
//!
//! A [`Cursor`] is just a logical row index: it borrows nothing, so it
//! stays valid (as a number) across reallocation. Dereferencing happens
//! through the container, where the bound is checked. [`RevCursor`] walks
//! the same rows backwards.

use std::cmp::Ordering;
use std::iter::FusedIterator;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use stria_core::SizeType;

/// Anything that names one row of a container.
pub trait RowPosition<S: SizeType> {
    /// The forward row index this position addresses.
    fn row(&self) -> S;
}

/// Forward index cursor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cursor<S: SizeType = usize> {
    index: S,
}

impl<S: SizeType> Cursor<S> {
    /// A cursor at `index`.
    pub fn new(index: S) -> Self {
        Self { index }
    }

    /// The row index.
    pub fn index(self) -> S {
        self.index
    }

    /// Advance by one, returning the advanced cursor.
    pub fn inc(&mut self) -> &mut Self {
        *self += 1;
        self
    }

    /// Step back by one, returning the moved cursor.
    pub fn dec(&mut self) -> &mut Self {
        *self -= 1;
        self
    }

    /// Advance by one, returning the position before the move.
    pub fn post_inc(&mut self) -> Self {
        let before = *self;
        *self += 1;
        before
    }

    /// Step back by one, returning the position before the move.
    pub fn post_dec(&mut self) -> Self {
        let before = *self;
        *self -= 1;
        before
    }

    fn offset(self, n: isize) -> Self {
        let moved = self
            .index
            .to_usize()
            .checked_add_signed(n)
            .and_then(S::from_usize);
        match moved {
            Some(index) => Self { index },
            None => panic!("cursor at {} moved by {n} leaves the index range", self.index),
        }
    }
}

impl<S: SizeType> RowPosition<S> for Cursor<S> {
    fn row(&self) -> S {
        self.index
    }
}

impl<S: SizeType> Add<isize> for Cursor<S> {
    type Output = Self;

    fn add(self, n: isize) -> Self {
        self.offset(n)
    }
}

impl<S: SizeType> Add<Cursor<S>> for isize {
    type Output = Cursor<S>;

    fn add(self, c: Cursor<S>) -> Cursor<S> {
        c.offset(self)
    }
}

impl<S: SizeType> Sub<isize> for Cursor<S> {
    type Output = Self;

    fn sub(self, n: isize) -> Self {
        self.offset(-n)
    }
}

impl<S: SizeType> AddAssign<isize> for Cursor<S> {
    fn add_assign(&mut self, n: isize) {
        *self = self.offset(n);
    }
}

impl<S: SizeType> SubAssign<isize> for Cursor<S> {
    fn sub_assign(&mut self, n: isize) {
        *self = self.offset(-n);
    }
}

/// Signed distance between two cursors.
impl<S: SizeType> Sub for Cursor<S> {
    type Output = isize;

    fn sub(self, other: Self) -> isize {
        self.index.to_usize() as isize - other.index.to_usize() as isize
    }
}

/// Reverse cursor: addresses the row just before its base.
///
/// `rbegin()` wraps `end()` and `rend()` wraps `begin()`, so the reverse
/// range visits rows `len - 1` down to `0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RevCursor<S: SizeType = usize> {
    base: Cursor<S>,
}

impl<S: SizeType> RevCursor<S> {
    /// A reverse cursor over `base`.
    pub fn new(base: Cursor<S>) -> Self {
        Self { base }
    }

    /// The underlying forward cursor, one past the addressed row.
    pub fn base(self) -> Cursor<S> {
        self.base
    }

    /// Advance (towards row 0), returning the advanced cursor.
    pub fn inc(&mut self) -> &mut Self {
        self.base.dec();
        self
    }

    /// Step back (towards the end), returning the moved cursor.
    pub fn dec(&mut self) -> &mut Self {
        self.base.inc();
        self
    }

    /// Advance, returning the position before the move.
    pub fn post_inc(&mut self) -> Self {
        let before = *self;
        self.base.dec();
        before
    }

    /// Step back, returning the position before the move.
    pub fn post_dec(&mut self) -> Self {
        let before = *self;
        self.base.inc();
        before
    }
}

impl<S: SizeType> RowPosition<S> for RevCursor<S> {
    /// # Panics
    ///
    /// Panics on `rend()`, whose base is row 0.
    fn row(&self) -> S {
        assert!(
            self.base.index.to_usize() > 0,
            "reverse cursor at rend does not address a row"
        );
        (self.base - 1).index
    }
}

impl<S: SizeType> Add<isize> for RevCursor<S> {
    type Output = Self;

    fn add(self, n: isize) -> Self {
        Self {
            base: self.base - n,
        }
    }
}

impl<S: SizeType> Add<RevCursor<S>> for isize {
    type Output = RevCursor<S>;

    fn add(self, r: RevCursor<S>) -> RevCursor<S> {
        r + self
    }
}

impl<S: SizeType> Sub<isize> for RevCursor<S> {
    type Output = Self;

    fn sub(self, n: isize) -> Self {
        Self {
            base: self.base + n,
        }
    }
}

impl<S: SizeType> AddAssign<isize> for RevCursor<S> {
    fn add_assign(&mut self, n: isize) {
        self.base -= n;
    }
}

impl<S: SizeType> SubAssign<isize> for RevCursor<S> {
    fn sub_assign(&mut self, n: isize) {
        self.base += n;
    }
}

impl<S: SizeType> Sub for RevCursor<S> {
    type Output = isize;

    fn sub(self, other: Self) -> isize {
        other.base - self.base
    }
}

impl<S: SizeType> PartialOrd for RevCursor<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S: SizeType> Ord for RevCursor<S> {
    fn cmp(&self, other: &Self) -> Ordering {
        other.base.cmp(&self.base)
    }
}

/// Iterator over the cursors `[begin, end)` of a container.
#[derive(Clone, Debug)]
pub struct Cursors<S: SizeType = usize> {
    front: usize,
    back: usize,
    _size: std::marker::PhantomData<S>,
}

impl<S: SizeType> Cursors<S> {
    pub(crate) fn new(len: S) -> Self {
        Self {
            front: 0,
            back: len.to_usize(),
            _size: std::marker::PhantomData,
        }
    }

    fn at(i: usize) -> Cursor<S> {
        match S::from_usize(i) {
            Some(index) => Cursor { index },
            // Bounded by the length the iterator was built from.
            None => unreachable!("cursor index {i} exceeds the size type"),
        }
    }
}

impl<S: SizeType> Iterator for Cursors<S> {
    type Item = Cursor<S>;

    fn next(&mut self) -> Option<Cursor<S>> {
        if self.front == self.back {
            return None;
        }
        let cursor = Self::at(self.front);
        self.front += 1;
        Some(cursor)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl<S: SizeType> DoubleEndedIterator for Cursors<S> {
    fn next_back(&mut self) -> Option<Cursor<S>> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(Self::at(self.back))
    }
}

impl<S: SizeType> ExactSizeIterator for Cursors<S> {}
impl<S: SizeType> FusedIterator for Cursors<S> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pre_and_post_increment() {
        let mut c = Cursor::new(3usize);
        assert_eq!(c.post_inc().index(), 3);
        assert_eq!(c.index(), 4);
        assert_eq!(c.inc().index(), 5);
        assert_eq!(c.post_dec().index(), 5);
        assert_eq!(c.dec().index(), 3);
    }

    #[test]
    fn arithmetic_and_distance() {
        let a = Cursor::new(2u16);
        let b = a + 5;
        assert_eq!(b.index(), 7);
        assert_eq!(b - a, 5);
        assert_eq!(a - b, -5);
        assert_eq!((b - 7).index(), 0);
        let mut c = a;
        c += 3;
        c -= 1;
        assert_eq!(c.index(), 4);
        assert!(a < b);
    }

    #[test]
    fn offset_commutes() {
        let a = Cursor::new(2u16);
        assert_eq!(5isize + a, a + 5);
        assert_eq!((-2isize + a).index(), 0);
        let r = RevCursor::new(Cursor::new(4usize));
        assert_eq!((1isize + r).row(), 2);
        assert_eq!(1isize + r, r + 1);
    }

    #[test]
    #[should_panic(expected = "leaves the index range")]
    fn cursor_below_zero_panics() {
        let _ = Cursor::new(0usize) - 1;
    }

    #[test]
    #[should_panic(expected = "leaves the index range")]
    fn cursor_past_size_type_panics() {
        let _ = Cursor::new(255u8) + 1;
    }

    #[test]
    fn reverse_cursor_addresses_base_minus_one() {
        let end = Cursor::new(4usize);
        let mut r = RevCursor::new(end);
        assert_eq!(r.row(), 3);
        r.inc();
        assert_eq!(r.row(), 2);
        assert_eq!((r + 2).row(), 0);
        assert_eq!((r + 2).base().index(), 1);
        assert_eq!(r.post_dec().row(), 2);
        assert_eq!(r.row(), 3);
    }

    #[test]
    fn reverse_ordering_is_inverted() {
        let rbegin = RevCursor::new(Cursor::new(5usize));
        let rend = RevCursor::new(Cursor::new(0usize));
        assert!(rbegin < rend);
        assert_eq!(rend - rbegin, 5);
    }

    #[test]
    #[should_panic(expected = "does not address a row")]
    fn rend_is_not_a_row() {
        RevCursor::new(Cursor::new(0usize)).row();
    }

    #[test]
    fn cursors_iterate_both_ways() {
        let forward: Vec<usize> = Cursors::new(4usize).map(Cursor::index).collect();
        assert_eq!(forward, [0, 1, 2, 3]);
        let backward: Vec<usize> = Cursors::new(4usize).rev().map(Cursor::index).collect();
        assert_eq!(backward, [3, 2, 1, 0]);
        assert_eq!(Cursors::new(9u8).len(), 9);
    }
}
