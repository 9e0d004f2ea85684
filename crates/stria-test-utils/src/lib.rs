//! Test utilities for Stria development.
//!
//! - [`Tracked`]: a field type that counts constructions and drops on the
//!   current thread and can be armed to panic on a chosen construction.
//! - [`PoisonAllocator`]: initializes every byte it hands out to `0xFF`,
//!   so raw-mode tests can tell written slots from untouched ones.
//! - [`CountingAllocator`]: counts allocations, grows, and releases, and
//!   can be armed to refuse the next request.
//! - Ready-made [`StoragePolicy`](stria_arena::StoragePolicy) types wiring
//!   those allocators into containers.
//!
//! All counters are thread-local, so tests running in parallel do not
//! observe each other.

#![deny(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod alloc;
pub mod tracked;

pub use alloc::{
    alloc_stats, fail_next_allocation, reset_alloc_stats, AllocStats, CountingAllocator,
    PoisonAllocator, POISON,
};
pub use tracked::{fail_construction_at, reset_tracked, tracked_stats, Tracked, TrackedStats};

use stria_arena::StoragePolicy;
use stria_core::{Initialize, Uninitialized};

/// Raw mode over [`PoisonAllocator`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Poisoned;

impl StoragePolicy for Poisoned {
    type Alloc = PoisonAllocator;
    type Size = usize;
    type Init = Uninitialized;
}

/// Full lifecycle over [`CountingAllocator`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Counted;

impl StoragePolicy for Counted {
    type Alloc = CountingAllocator;
    type Size = usize;
    type Init = Initialize;
}

/// Raw mode over [`CountingAllocator`].
#[derive(Clone, Copy, Debug, Default)]
pub struct CountedRaw;

impl StoragePolicy for CountedRaw {
    type Alloc = CountingAllocator;
    type Size = usize;
    type Init = Uninitialized;
}
