//! Panic and allocation-failure behaviour, measured with instrumented field
//! types and allocators.

use std::panic::{catch_unwind, AssertUnwindSafe};

use stria_core::StoreError;
use stria_test_utils::{
    alloc_stats, fail_construction_at, fail_next_allocation, reset_alloc_stats, reset_tracked,
    tracked_stats, Counted, CountedRaw, Tracked,
};
use stria_vec::MultiVec;

type Rows = MultiVec<(Tracked, Tracked, Tracked)>;

fn row(n: u32) -> (Tracked, Tracked, Tracked) {
    (Tracked::new(n), Tracked::new(n + 100), Tracked::new(n + 200))
}

#[test]
fn drop_destroys_every_field() {
    reset_tracked();
    {
        let mut v = Rows::new();
        for i in 0..10 {
            v.push_back(row(i));
        }
        v.resize(15);
        v.pop_back();
        let _ = v.pop();
    }
    let stats = tracked_stats();
    assert_eq!(stats.constructions, 45);
    assert_eq!(stats.live(), 0);
}

#[test]
fn growth_relocates_without_constructing() {
    reset_tracked();
    let mut v = Rows::new();
    for i in 0..4 {
        v.push_back(row(i));
    }
    let before = tracked_stats();
    v.reserve(64);
    assert_eq!(tracked_stats(), before);
    assert_eq!(v.at::<2>(3).value(), 203);
}

#[test]
fn panicking_default_in_a_later_field_rolls_back_the_resize() {
    reset_tracked();
    let mut v = Rows::new();
    v.push_back(row(1));
    v.push_back(row(2));
    let capacity = v.capacity();

    // Growing to 6 builds 4 rows per field: field 0 succeeds, field 1 fails
    // on its third element.
    fail_construction_at(4 + 3);
    let result = catch_unwind(AssertUnwindSafe(|| v.resize(6)));
    assert!(result.is_err());

    assert_eq!(v.len(), 2);
    assert!(v.capacity() >= capacity);
    assert_eq!(tracked_stats().live(), 6);
    assert_eq!(v.at::<1>(1).value(), 102);

    drop(v);
    assert_eq!(tracked_stats().live(), 0);
}

#[test]
fn panicking_clone_leaves_the_source_intact() {
    reset_tracked();
    let mut v = Rows::new();
    for i in 0..3 {
        v.push_back(row(i));
    }
    // Field 0 and 1 clone fine, field 2 fails on its last element.
    fail_construction_at(3 + 3 + 3);
    let result = catch_unwind(AssertUnwindSafe(|| v.clone()));
    assert!(result.is_err());

    assert_eq!(tracked_stats().live(), 9);
    assert_eq!(v.len(), 3);
    assert_eq!(v.at::<2>(2).value(), 202);
}

#[test]
fn panicking_fill_keeps_length() {
    reset_tracked();
    let template = row(7);
    let mut v = Rows::new();
    fail_construction_at(2);
    let result = catch_unwind(AssertUnwindSafe(|| v.resize_with_values(4, &template)));
    assert!(result.is_err());
    assert!(v.is_empty());
    drop(template);
    assert_eq!(tracked_stats().live(), 0);
}

#[test]
fn truncation_drops_only_the_tail() {
    reset_tracked();
    let mut v = Rows::new();
    for i in 0..5 {
        v.push_back(row(i));
    }
    v.truncate(2);
    assert_eq!(tracked_stats().live(), 6);
    v.clear();
    assert_eq!(tracked_stats().live(), 0);
    assert_eq!(v.capacity(), 5);
}

#[test]
fn failed_reserve_keeps_state() {
    reset_alloc_stats();
    let mut v: MultiVec<(u8, String), Counted> = MultiVec::new();
    v.push_back((1, "kept".into()));
    let (ptr, len, cap) = (v.storage(), v.len(), v.capacity());

    fail_next_allocation();
    let err = v.try_reserve(1000).unwrap_err();
    assert!(matches!(err, StoreError::AllocFailed { .. }));
    assert_eq!((v.storage(), v.len(), v.capacity()), (ptr, len, cap));
    assert_eq!(*v.at::<1>(0), "kept");

    v.reserve(1000);
    assert_eq!(v.capacity(), 1000);
    assert_eq!(*v.at::<1>(0), "kept");
}

#[test]
fn failed_in_place_growth_keeps_state() {
    reset_alloc_stats();
    let mut v: MultiVec<(u8, u64), CountedRaw> = MultiVec::new();
    v.push_back((3, 0xDEAD_BEEF));
    let (ptr, len, cap) = (v.storage(), v.len(), v.capacity());

    fail_next_allocation();
    let err = v.try_reserve(100).unwrap_err();
    assert!(matches!(err, StoreError::AllocFailed { .. }));
    assert_eq!((v.storage(), v.len(), v.capacity()), (ptr, len, cap));
    assert_eq!(v.row(0), (&3, &0xDEAD_BEEF));
    assert_eq!(alloc_stats().grows, 0);

    v.reserve(100);
    assert_eq!(v.capacity(), 100);
    assert_eq!(v.row(0), (&3, &0xDEAD_BEEF));
}

#[test]
fn failed_fill_allocation_keeps_state() {
    reset_alloc_stats();
    let mut v: MultiVec<(u8, String), Counted> = MultiVec::from_elem(2, &(1, "a".into()));
    let (ptr, cap) = (v.storage(), v.capacity());

    fail_next_allocation();
    let template = (9, "z".to_string());
    assert!(v.try_resize_with_values(6, &template).is_err());
    assert_eq!((v.storage(), v.len(), v.capacity()), (ptr, 2, cap));

    assert_eq!(v.try_resize_with_values(6, &template), Ok(()));
    assert_eq!(v.field::<1>(), &["a", "a", "z", "z", "z", "z"]);
}

#[test]
fn failed_push_keeps_state() {
    reset_alloc_stats();
    let mut v: MultiVec<(u32,), Counted> = MultiVec::with_capacity(1);
    v.push_back((5,));
    fail_next_allocation();
    assert!(v.try_push_back((6,)).is_err());
    assert_eq!(v.field::<0>(), &[5]);
    assert!(v.try_push_back((6,)).is_ok());
    assert_eq!(v.field::<0>(), &[5, 6]);
}

#[test]
fn standard_growth_allocates_and_releases() {
    reset_alloc_stats();
    {
        let mut v: MultiVec<(u8, u64), Counted> = MultiVec::new();
        v.reserve(4);
        v.reserve(16);
        let stats = alloc_stats();
        assert_eq!(stats.allocations, 2);
        assert_eq!(stats.grows, 0);
        assert_eq!(stats.deallocations, 1);
    }
    assert_eq!(alloc_stats().deallocations, 2);
}

#[test]
fn overflowing_reserve_is_reported() {
    let mut v: MultiVec<(u64, u64)> = MultiVec::new();
    assert!(matches!(
        v.try_reserve(usize::MAX / 8),
        Err(StoreError::CapacityOverflow { .. })
    ));
    assert_eq!(v.capacity(), 0);
}
