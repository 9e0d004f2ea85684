//! Stria: structure-of-arrays containers packed into a single allocation.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Stria sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use stria::prelude::*;
//!
//! let mut particles: MultiVec<(u8, i32, f64)> = MultiVec::new();
//! particles.push_back((1, -1, 0.5));
//! particles.push_back((2, -2, 1.5));
//! particles.reserve(5);
//!
//! // Each field lives in its own aligned sub-array of one buffer.
//! assert_eq!(particles.layout().offsets(), &[0, 8, 32]);
//! assert_eq!(particles.field::<2>(), &[0.5, 1.5]);
//!
//! // Cursors are plain indices, dereferenced through the container.
//! let last = particles.rbegin();
//! assert_eq!(*particles.get::<1>(last), -2);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `stria-core` | Layout arithmetic, size types, modes, errors |
//! | [`arena`] | `stria-arena` | Allocators, raw buffers, field sets, lifecycle, policies |
//! | [`vec`] | `stria-vec` | `MultiVec`, cursors, row iterators |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Layout arithmetic, size types, initialization modes, and errors
/// (`stria-core`).
pub use stria_core as types;

/// Allocators, raw buffers, field-set traits, the lifecycle engine, and
/// storage policies (`stria-arena`).
///
/// Most users only need [`arena::Standard`] and [`arena::Raw`]; both are
/// also in the [`prelude`].
pub use stria_arena as arena;

/// The [`vec::MultiVec`] container and its cursors (`stria-vec`).
pub use stria_vec as vec;

/// Common imports for typical Stria usage.
///
/// ```rust
/// use stria::prelude::*;
/// ```
pub mod prelude {
    // Containers and positions
    pub use stria_vec::{Cursor, MultiVec, RawMultiVec, RevCursor, RowPosition};

    // Configuration
    pub use stria_arena::{Amortized, BufferAllocator, Global, Raw, Standard, StoragePolicy};

    // Field sets
    pub use stria_arena::{Field, FieldAt, FieldSet};

    // Errors and layout
    pub use stria_core::{SizeType, StorageLayout, StoreError};
}
