//! Allocator-backed buffers holding N field sub-arrays.
//!
//! A [`RawBuffer`] owns one allocation sized by a
//! [`StorageLayout`]. It knows nothing about element types: it hands out
//! per-field base pointers ([`FieldArrays`]) and leaves construction and
//! destruction to [`crate::lifecycle`].

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::ptr::{self, NonNull};

use smallvec::SmallVec;
use stria_core::{FieldLayout, StorageLayout, StoreError, INLINE_FIELDS};

fn alloc_failed(layout: Layout) -> StoreError {
    StoreError::AllocFailed {
        size: layout.size(),
        align: layout.align(),
    }
}

/// Source of backing memory for container buffers.
///
/// Allocators are stateless handles or cheap shared references: every
/// container keeps its own copy, and clones of a container clone the
/// allocator.
///
/// # Safety
///
/// A block returned by any method must be valid for reads and writes of
/// `layout.size()` bytes, aligned to `layout.align()`, and must stay valid
/// until it is passed to [`deallocate`](Self::deallocate) or one of the
/// grow methods. Blocks returned by
/// [`allocate_initialized`](Self::allocate_initialized) and
/// [`grow_initialized`](Self::grow_initialized) must have every byte
/// initialized.
pub unsafe trait BufferAllocator: Clone + Default {
    /// Allocate a block for `layout`. `layout.size()` is never zero.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, StoreError>;

    /// Allocate a block whose bytes are all initialized.
    ///
    /// The default zero-fills.
    fn allocate_initialized(&self, layout: Layout) -> Result<NonNull<u8>, StoreError> {
        let block = self.allocate(layout)?;
        // SAFETY: `block` is valid for `layout.size()` bytes of writes.
        unsafe { ptr::write_bytes(block.as_ptr(), 0, layout.size()) };
        Ok(block)
    }

    /// Release a block.
    ///
    /// # Safety
    ///
    /// `block` must have been returned by this allocator (or a clone of it)
    /// for exactly `layout`, and not released since.
    unsafe fn deallocate(&self, block: NonNull<u8>, layout: Layout);

    /// Grow `block` from `old` to `new`, preserving its first `old.size()`
    /// bytes. On failure the original block is untouched.
    ///
    /// The default allocates a new block, copies, and releases the old one.
    ///
    /// # Safety
    ///
    /// Same ownership requirements as [`deallocate`](Self::deallocate);
    /// `new.size() >= old.size()`.
    unsafe fn grow(
        &self,
        block: NonNull<u8>,
        old: Layout,
        new: Layout,
    ) -> Result<NonNull<u8>, StoreError> {
        let fresh = self.allocate(new)?;
        // SAFETY: both blocks are live, distinct, and at least `old.size()`
        // bytes long.
        unsafe {
            ptr::copy_nonoverlapping(block.as_ptr(), fresh.as_ptr(), old.size());
            self.deallocate(block, old);
        }
        Ok(fresh)
    }

    /// [`grow`](Self::grow), then initialize the new tail bytes.
    ///
    /// The default zero-fills the tail.
    ///
    /// # Safety
    ///
    /// As for [`grow`](Self::grow). The first `old.size()` bytes of `block`
    /// must already be initialized.
    unsafe fn grow_initialized(
        &self,
        block: NonNull<u8>,
        old: Layout,
        new: Layout,
    ) -> Result<NonNull<u8>, StoreError> {
        // SAFETY: forwarded caller contract.
        let grown = unsafe { self.grow(block, old, new)? };
        // SAFETY: the grown block holds `new.size()` bytes.
        unsafe {
            ptr::write_bytes(
                grown.as_ptr().add(old.size()),
                0,
                new.size() - old.size(),
            )
        };
        Ok(grown)
    }
}

/// The process-wide allocator from `std::alloc`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Global;

// SAFETY: every method forwards to `std::alloc` with the caller's layout.
unsafe impl BufferAllocator for Global {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, StoreError> {
        debug_assert!(layout.size() > 0);
        // SAFETY: non-zero size, checked by callers.
        NonNull::new(unsafe { alloc::alloc(layout) }).ok_or_else(|| alloc_failed(layout))
    }

    fn allocate_initialized(&self, layout: Layout) -> Result<NonNull<u8>, StoreError> {
        debug_assert!(layout.size() > 0);
        // SAFETY: non-zero size, checked by callers.
        NonNull::new(unsafe { alloc::alloc_zeroed(layout) }).ok_or_else(|| alloc_failed(layout))
    }

    unsafe fn deallocate(&self, block: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded caller contract.
        unsafe { alloc::dealloc(block.as_ptr(), layout) }
    }

    unsafe fn grow(
        &self,
        block: NonNull<u8>,
        old: Layout,
        new: Layout,
    ) -> Result<NonNull<u8>, StoreError> {
        debug_assert!(new.size() >= old.size());
        if old.align() != new.align() {
            let fresh = self.allocate(new)?;
            // SAFETY: distinct live blocks, `old.size()` bytes each way.
            unsafe {
                ptr::copy_nonoverlapping(block.as_ptr(), fresh.as_ptr(), old.size());
                self.deallocate(block, old);
            }
            return Ok(fresh);
        }
        // SAFETY: `block` was allocated with `old`; `new.size()` came from a
        // valid Layout so it does not overflow isize when rounded.
        NonNull::new(unsafe { alloc::realloc(block.as_ptr(), old, new.size()) })
            .ok_or_else(|| alloc_failed(new))
    }
}

/// Base pointer of every field sub-array, in declaration order.
///
/// A snapshot: it is invalidated by any reallocation of the buffer it was
/// taken from.
#[derive(Clone, Debug)]
pub struct FieldArrays {
    ptrs: SmallVec<[*mut u8; INLINE_FIELDS]>,
}

impl FieldArrays {
    /// Number of fields.
    pub fn len(&self) -> usize {
        self.ptrs.len()
    }

    /// Always `false`: a field set has at least one field.
    pub fn is_empty(&self) -> bool {
        self.ptrs.is_empty()
    }

    /// Untyped base pointer of field `i`.
    pub fn base(&self, i: usize) -> *mut u8 {
        self.ptrs[i]
    }

    /// Base pointer of field `i`, typed as `T`.
    ///
    /// Only meaningful when `T` is field `i`'s declared type.
    pub fn column<T>(&self, i: usize) -> *mut T {
        self.ptrs[i].cast()
    }
}

/// One allocation laid out as N parallel sub-arrays.
///
/// Dropping a `RawBuffer` releases its memory but never drops elements.
pub struct RawBuffer<A: BufferAllocator> {
    ptr: NonNull<u8>,
    layout: StorageLayout,
    alloc: A,
}

// SAFETY: `RawBuffer` owns its allocation exclusively; it holds no
// element values itself (containers add their own bounds on elements).
unsafe impl<A: BufferAllocator + Send> Send for RawBuffer<A> {}
// SAFETY: shared access only reads the pointer and layout.
unsafe impl<A: BufferAllocator + Sync> Sync for RawBuffer<A> {}

impl<A: BufferAllocator> RawBuffer<A> {
    /// A zero-capacity buffer. Does not allocate.
    pub fn new(fields: &[FieldLayout], alloc: A) -> Self {
        let layout = StorageLayout::empty(fields);
        Self {
            ptr: dangling(layout.align()),
            layout,
            alloc,
        }
    }

    /// A buffer with room for exactly `capacity` rows.
    ///
    /// With `initialized`, every byte of the block is initialized by the
    /// allocator (raw-mode containers read them back as plain values).
    pub fn with_capacity(
        fields: &[FieldLayout],
        capacity: usize,
        alloc: A,
        initialized: bool,
    ) -> Result<Self, StoreError> {
        let layout = StorageLayout::compute(fields, capacity)?;
        let ptr = match layout.to_alloc_layout() {
            None => dangling(layout.align()),
            Some(l) if initialized => alloc.allocate_initialized(l)?,
            Some(l) => alloc.allocate(l)?,
        };
        Ok(Self { ptr, layout, alloc })
    }

    /// The byte layout of the current allocation.
    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Rows the buffer has room for.
    pub fn capacity(&self) -> usize {
        self.layout.capacity()
    }

    /// Start of the allocation.
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /// The buffer's allocator.
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Base pointer of every field sub-array.
    pub fn arrays(&self) -> FieldArrays {
        let base = self.ptr.as_ptr();
        FieldArrays {
            // `wrapping_add` keeps the zero-size case (dangling base, all
            // offsets 0) free of pointer-arithmetic preconditions.
            ptrs: self
                .layout
                .offsets()
                .iter()
                .map(|&offset| base.wrapping_add(offset))
                .collect(),
        }
    }

    /// Base pointer of field `field`'s sub-array, typed as `T`.
    ///
    /// Only meaningful when `T` is the field's declared type.
    pub fn column<T>(&self, field: usize) -> *mut T {
        self.ptr
            .as_ptr()
            .wrapping_add(self.layout.offset(field))
            .cast()
    }

    /// Exchange allocations (and allocators) with `other`.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    /// Grow to exactly `new_capacity` rows inside the same allocation,
    /// shifting the first `len` elements of every field to its
    /// new offset.
    ///
    /// Fields move in reverse declaration order: every offset only grows,
    /// so moving the last field first never clobbers bytes an earlier field
    /// still needs. New bytes are initialized by the allocator.
    ///
    /// On error the buffer is unchanged.
    ///
    /// # Safety
    ///
    /// Elements must be plain bytes (no drop glue, no address-sensitive
    /// state), `len <= self.capacity() <= new_capacity`, and every byte of
    /// the current block must be initialized.
    pub unsafe fn grow_in_place(&mut self, new_capacity: usize, len: usize) -> Result<(), StoreError> {
        debug_assert!(len <= self.capacity() && self.capacity() <= new_capacity);
        let next = StorageLayout::compute(self.layout.fields(), new_capacity)?;
        let Some(new_block) = next.to_alloc_layout() else {
            // Only zero-sized fields: nothing to move.
            self.layout = next;
            return Ok(());
        };

        let ptr = match self.layout.to_alloc_layout() {
            None => self.alloc.allocate_initialized(new_block)?,
            // SAFETY: `self.ptr` is our live block for `old`, fully
            // initialized per the caller contract.
            Some(old) => unsafe { self.alloc.grow_initialized(self.ptr, old, new_block)? },
        };

        for i in (0..next.field_count()).rev() {
            let from = self.layout.offset(i);
            let to = next.offset(i);
            let bytes = len * next.field(i).size;
            if from != to && bytes > 0 {
                // SAFETY: both ranges lie inside the grown block; `ptr::copy`
                // tolerates the overlap between old and new positions.
                unsafe { ptr::copy(ptr.as_ptr().add(from), ptr.as_ptr().add(to), bytes) };
            }
        }

        self.ptr = ptr;
        self.layout = next;
        Ok(())
    }
}

impl<A: BufferAllocator> Drop for RawBuffer<A> {
    fn drop(&mut self) {
        if let Some(layout) = self.layout.to_alloc_layout() {
            // SAFETY: a non-empty layout means `ptr` came from `alloc` for
            // exactly this layout.
            unsafe { self.alloc.deallocate(self.ptr, layout) };
        }
    }
}

impl<A: BufferAllocator> std::fmt::Debug for RawBuffer<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawBuffer")
            .field("capacity", &self.layout.capacity())
            .field("size", &self.layout.size())
            .field("offsets", &self.layout.offsets())
            .finish()
    }
}

fn dangling(align: usize) -> NonNull<u8> {
    // SAFETY: alignments are at least 1, so the address is non-null.
    unsafe { NonNull::new_unchecked(ptr::without_provenance_mut(align)) }
}
