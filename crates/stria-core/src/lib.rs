//! Core types and layout math for the Stria structure-of-arrays container.
//!
//! This is the leaf crate with zero internal dependencies and no `unsafe`.
//! It defines the pieces every other Stria crate agrees on: the per-field
//! [`FieldLayout`], the offset calculator ([`StorageLayout`]), the
//! [`SizeType`] abstraction for index widths, the initialization-mode
//! markers ([`Initialize`], [`Uninitialized`]), and [`StoreError`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod layout;
pub mod mode;
pub mod size;

pub use error::StoreError;
pub use layout::{checked_round_up, round_up, FieldLayout, FieldLayouts, StorageLayout, INLINE_FIELDS};
pub use mode::{InitMode, Initialize, Uninitialized};
pub use size::SizeType;
