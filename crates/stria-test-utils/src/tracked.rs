//! Lifecycle-counting field type.

use std::cell::Cell;

thread_local! {
    static CONSTRUCTIONS: Cell<usize> = const { Cell::new(0) };
    static DROPS: Cell<usize> = const { Cell::new(0) };
    static FAIL_AT: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Snapshot of this thread's [`Tracked`] counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackedStats {
    /// Successful constructions (new, default, clone).
    pub constructions: usize,
    /// Drops.
    pub drops: usize,
}

impl TrackedStats {
    /// Instances currently alive.
    pub fn live(&self) -> isize {
        self.constructions as isize - self.drops as isize
    }
}

/// Current counters.
pub fn tracked_stats() -> TrackedStats {
    TrackedStats {
        constructions: CONSTRUCTIONS.with(Cell::get),
        drops: DROPS.with(Cell::get),
    }
}

/// Zero the counters and disarm any pending failure.
pub fn reset_tracked() {
    CONSTRUCTIONS.with(|c| c.set(0));
    DROPS.with(|d| d.set(0));
    FAIL_AT.with(|f| f.set(None));
}

/// Make the `k`-th construction from now (1-based) panic. The failure fires
/// once.
pub fn fail_construction_at(k: usize) {
    assert!(k > 0, "construction counts start at 1");
    let at = CONSTRUCTIONS.with(Cell::get) + k;
    FAIL_AT.with(|f| f.set(Some(at)));
}

/// A `u32` wrapper that counts its own constructions and drops.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tracked {
    value: u32,
}

impl Tracked {
    /// Construct, or panic if this construction is armed to fail.
    pub fn new(value: u32) -> Self {
        let n = CONSTRUCTIONS.with(Cell::get) + 1;
        if FAIL_AT.with(|f| f.get() == Some(n)) {
            FAIL_AT.with(|f| f.set(None));
            panic!("tracked construction {n} failed");
        }
        CONSTRUCTIONS.with(|c| c.set(n));
        Self { value }
    }

    pub fn value(&self) -> u32 {
        self.value
    }
}

impl Default for Tracked {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        Self::new(self.value)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        DROPS.with(|d| d.set(d.get() + 1));
    }
}
