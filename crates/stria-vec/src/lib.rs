//! Structure-of-arrays container for Stria.
//!
//! [`MultiVec`] stores rows of a tuple type `(T0, .., Tn)` as N parallel
//! arrays packed into one allocation. Rows are addressed by a single index;
//! each field is reachable as a typed reference, a slice, or a raw pointer.
//!
//! [`Cursor`] and [`RevCursor`] are index-only positions. They carry no
//! borrow, so they survive reallocation as plain numbers and are
//! bounds-checked when dereferenced through the container.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod cursor;
pub mod multivec;
pub mod rows;

pub use cursor::{Cursor, Cursors, RevCursor, RowPosition};
pub use multivec::{MultiVec, RawMultiVec};
pub use rows::{Rows, RowsMut};
