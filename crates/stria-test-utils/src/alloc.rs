//! Instrumented allocators.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::cell::Cell;
use std::ptr::{self, NonNull};

use stria_arena::{BufferAllocator, Global};
use stria_core::StoreError;

/// Byte written into every slot a [`PoisonAllocator`] initializes.
pub const POISON: u8 = 0xFF;

/// Global allocator that initializes memory to [`POISON`] instead of zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoisonAllocator;

// SAFETY: forwards to `Global`; initialized blocks are fully written.
unsafe impl BufferAllocator for PoisonAllocator {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, StoreError> {
        Global.allocate(layout)
    }

    fn allocate_initialized(&self, layout: Layout) -> Result<NonNull<u8>, StoreError> {
        let block = Global.allocate(layout)?;
        // SAFETY: fresh block of `layout.size()` bytes.
        unsafe { ptr::write_bytes(block.as_ptr(), POISON, layout.size()) };
        Ok(block)
    }

    unsafe fn deallocate(&self, block: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded caller contract.
        unsafe { Global.deallocate(block, layout) }
    }

    unsafe fn grow(
        &self,
        block: NonNull<u8>,
        old: Layout,
        new: Layout,
    ) -> Result<NonNull<u8>, StoreError> {
        // SAFETY: forwarded caller contract.
        unsafe { Global.grow(block, old, new) }
    }

    unsafe fn grow_initialized(
        &self,
        block: NonNull<u8>,
        old: Layout,
        new: Layout,
    ) -> Result<NonNull<u8>, StoreError> {
        // SAFETY: forwarded caller contract.
        let grown = unsafe { Global.grow(block, old, new)? };
        // SAFETY: the tail `[old.size(), new.size())` lies in the new block.
        unsafe {
            ptr::write_bytes(
                grown.as_ptr().add(old.size()),
                POISON,
                new.size() - old.size(),
            )
        };
        Ok(grown)
    }
}

thread_local! {
    static ALLOCATIONS: Cell<usize> = const { Cell::new(0) };
    static GROWS: Cell<usize> = const { Cell::new(0) };
    static DEALLOCATIONS: Cell<usize> = const { Cell::new(0) };
    static FAIL_NEXT: Cell<bool> = const { Cell::new(false) };
}

/// Snapshot of this thread's [`CountingAllocator`] counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocStats {
    /// Fresh blocks handed out.
    pub allocations: usize,
    /// Successful grow calls.
    pub grows: usize,
    /// Blocks released.
    pub deallocations: usize,
}

/// Current counters.
pub fn alloc_stats() -> AllocStats {
    AllocStats {
        allocations: ALLOCATIONS.with(Cell::get),
        grows: GROWS.with(Cell::get),
        deallocations: DEALLOCATIONS.with(Cell::get),
    }
}

/// Zero the counters and disarm any pending failure.
pub fn reset_alloc_stats() {
    ALLOCATIONS.with(|c| c.set(0));
    GROWS.with(|c| c.set(0));
    DEALLOCATIONS.with(|c| c.set(0));
    FAIL_NEXT.with(|c| c.set(false));
}

/// Make the next allocate or grow call fail with
/// [`StoreError::AllocFailed`].
pub fn fail_next_allocation() {
    FAIL_NEXT.with(|c| c.set(true));
}

fn take_failure(layout: Layout) -> Result<(), StoreError> {
    if FAIL_NEXT.with(|c| c.replace(false)) {
        return Err(StoreError::AllocFailed {
            size: layout.size(),
            align: layout.align(),
        });
    }
    Ok(())
}

fn bump(counter: &'static std::thread::LocalKey<Cell<usize>>) {
    counter.with(|c| c.set(c.get() + 1));
}

/// Global allocator that counts every call on the current thread.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CountingAllocator;

// SAFETY: forwards to `Global`.
unsafe impl BufferAllocator for CountingAllocator {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, StoreError> {
        take_failure(layout)?;
        let block = Global.allocate(layout)?;
        bump(&ALLOCATIONS);
        Ok(block)
    }

    fn allocate_initialized(&self, layout: Layout) -> Result<NonNull<u8>, StoreError> {
        take_failure(layout)?;
        let block = Global.allocate_initialized(layout)?;
        bump(&ALLOCATIONS);
        Ok(block)
    }

    unsafe fn deallocate(&self, block: NonNull<u8>, layout: Layout) {
        bump(&DEALLOCATIONS);
        // SAFETY: forwarded caller contract.
        unsafe { Global.deallocate(block, layout) }
    }

    unsafe fn grow(
        &self,
        block: NonNull<u8>,
        old: Layout,
        new: Layout,
    ) -> Result<NonNull<u8>, StoreError> {
        take_failure(new)?;
        // SAFETY: forwarded caller contract.
        let grown = unsafe { Global.grow(block, old, new)? };
        bump(&GROWS);
        Ok(grown)
    }
}
