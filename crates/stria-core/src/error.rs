//! Storage error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur while growing a container's storage.
///
/// Both variants are raised before any element is migrated, so a container
/// that reports one of them is still in its pre-call state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// The requested capacity cannot be represented: the byte size of the
    /// buffer overflows `usize`/`isize`, or the element count does not fit
    /// the container's size type.
    CapacityOverflow {
        /// Number of rows requested.
        requested: usize,
    },
    /// The allocator refused to provide the buffer.
    AllocFailed {
        /// Buffer size in bytes.
        size: usize,
        /// Buffer alignment in bytes.
        align: usize,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityOverflow { requested } => {
                write!(f, "capacity overflow: cannot hold {requested} rows")
            }
            Self::AllocFailed { size, align } => {
                write!(
                    f,
                    "allocation failed: {size} bytes with alignment {align}"
                )
            }
        }
    }
}

impl Error for StoreError {}
