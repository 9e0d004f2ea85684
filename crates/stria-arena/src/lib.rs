//! Raw storage and element lifecycle for Stria containers.
//!
//! This crate owns every `unsafe` operation behind the safe container API
//! in `stria-vec`:
//!
//! ```text
//! RawBuffer (one allocation, StorageLayout from stria-core)
//! ├── BufferAllocator (Global, or a policy-supplied allocator)
//! └── FieldArrays (one base pointer per field sub-array)
//!
//! FieldSet (tuple impls, 1..=12 fields)
//! ├── DefaultFields / CloneFields   per-field typed operations
//! ├── TrivialFields                 Copy + FromBytes, admits raw mode
//! └── FieldAt<I>                    compile-time field indexing
//!
//! lifecycle (construct / fill / copy / move / destroy over all fields)
//! ```
//!
//! # Unsafe islands
//!
//! `raw`, `fields`, and `lifecycle` opt back in to `unsafe_code`; the rest
//! of the crate denies it. Every `unsafe` block carries a `SAFETY` comment
//! naming the invariant it relies on.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod config;
pub mod fields;
pub mod lifecycle;
pub mod raw;

pub use config::{Amortized, Raw, Standard, StoragePolicy};
pub use fields::{Admits, CloneFields, DefaultFields, Field, FieldAt, FieldSet, TrivialFields};
pub use raw::{BufferAllocator, FieldArrays, Global, RawBuffer};
