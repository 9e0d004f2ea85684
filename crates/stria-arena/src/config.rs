//! Storage policies: the allocator, size type, and initialization mode a
//! container is instantiated with.
//!
//! A policy is a zero-sized marker type. All knobs are associated types or
//! constants, so a container's behaviour is fixed at compile time and a
//! policy costs nothing at runtime.

use stria_core::{InitMode, Initialize, SizeType, Uninitialized};

use crate::raw::{BufferAllocator, Global};

/// Compile-time configuration of a container.
pub trait StoragePolicy: 'static {
    /// Memory source.
    type Alloc: BufferAllocator;

    /// Integer type for length, capacity, and indices.
    type Size: SizeType;

    /// Whether elements are constructed and dropped.
    type Init: InitMode;

    /// Whether single-row appends grow geometrically.
    ///
    /// Default: `false`, so `push_back` reserves exactly one more row, the
    /// same as `resize(len + 1)`. When `true`, appends grow to
    /// `max(2 * capacity, len + 1, MIN_GROWTH)`.
    const AMORTIZED: bool = false;

    /// Smallest capacity amortized growth moves to from an empty buffer.
    ///
    /// Default: 4. Ignored unless [`AMORTIZED`](Self::AMORTIZED) is set.
    const MIN_GROWTH: usize = 4;
}

/// Global allocator, `usize` sizes, full element lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Standard;

impl StoragePolicy for Standard {
    type Alloc = Global;
    type Size = usize;
    type Init = Initialize;
}

/// [`Standard`] with geometric growth for appends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Amortized;

impl StoragePolicy for Amortized {
    type Alloc = Global;
    type Size = usize;
    type Init = Initialize;
    const AMORTIZED: bool = true;
}

/// Global allocator, `usize` sizes, elements treated as plain bytes.
///
/// Only trivially copyable field sets are accepted (see
/// [`crate::fields::Admits`]). Growth reallocates in place and never runs
/// constructors, so newly exposed rows hold unspecified values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Raw;

impl StoragePolicy for Raw {
    type Alloc = Global;
    type Size = usize;
    type Init = Uninitialized;
}
