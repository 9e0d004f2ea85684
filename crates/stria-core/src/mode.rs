//! Initialization modes: full element lifecycle vs raw byte storage.
//!
//! A container's mode is chosen at the type level through its storage
//! policy. [`Initialize`] runs constructors and destructors for every
//! element. [`Uninitialized`] treats the buffer as plain bytes: growth
//! exposes unspecified (but initialized) bytes, copies are block copies,
//! and nothing is ever dropped. The arena crate only admits
//! `Uninitialized` for field sets whose every field is trivially
//! copyable and valid for any bit pattern.

mod sealed {
    pub trait Sealed {}
}

/// Type-level initialization mode. Sealed: only [`Initialize`] and
/// [`Uninitialized`] implement it.
pub trait InitMode: sealed::Sealed + Send + Sync + 'static {
    /// `true` when element construction and destruction are skipped.
    const DISABLED: bool;

    /// Short name for diagnostics.
    const NAME: &'static str;
}

/// Every element is constructed, cloned, and dropped individually.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Initialize;

/// Elements are plain bytes; construction and destruction are skipped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Uninitialized;

impl sealed::Sealed for Initialize {}
impl sealed::Sealed for Uninitialized {}

impl InitMode for Initialize {
    const DISABLED: bool = false;
    const NAME: &'static str = "initialize";
}

impl InitMode for Uninitialized {
    const DISABLED: bool = true;
    const NAME: &'static str = "uninitialized";
}
