//! Raw-mode containers: trivially copyable fields, no element lifecycle,
//! in-place growth.

use stria_arena::Raw;
use stria_test_utils::{alloc_stats, reset_alloc_stats, CountedRaw, Poisoned};
use stria_vec::{MultiVec, RawMultiVec};
use zerocopy::FromBytes;

#[test]
fn written_slots_survive_growth() {
    let mut v: RawMultiVec<(u8, i32, f64)> = MultiVec::new();
    v.push_back((1, -10, 0.25));
    v.push_back((2, -20, 0.5));
    v.reserve(5);
    assert_eq!(v.layout().offsets(), &[0, 8, 32]);
    v.reserve(40);
    v.push_back((3, -30, 0.75));
    assert_eq!(v.field::<0>(), &[1, 2, 3]);
    assert_eq!(v.field::<1>(), &[-10, -20, -30]);
    assert_eq!(v.field::<2>(), &[0.25, 0.5, 0.75]);
}

#[test]
fn grown_slots_are_not_default_constructed() {
    let mut v: MultiVec<(u8, u16), Poisoned> = MultiVec::new();
    v.push_back((b'a', 1));
    v.resize(6);
    *v.at_mut::<0>(5) = b'c';
    *v.at_mut::<1>(5) = 0xBBBB;

    assert_eq!(v.row(0), (&b'a', &1));
    assert_eq!(v.row(5), (&b'c', &0xBBBB));
    // Untouched rows keep whatever the allocator put there.
    assert_eq!(*v.at::<0>(3), 0xFF);
    assert_eq!(*v.at::<1>(3), 0xFFFF);
}

#[test]
fn growth_reallocates_in_place() {
    reset_alloc_stats();
    let mut v: MultiVec<(u16, u64), CountedRaw> = MultiVec::new();
    for i in 0..100u16 {
        v.push_back((i, u64::from(i) * 3));
    }
    let stats = alloc_stats();
    assert_eq!(stats.allocations, 1);
    assert!(stats.grows > 0);
    assert_eq!(stats.deallocations, 0);
    for i in 0..100u16 {
        assert_eq!(v.row(usize::from(i)), (&i, &(u64::from(i) * 3)));
    }
    drop(v);
    assert_eq!(alloc_stats().deallocations, 1);
}

#[test]
fn clone_and_pop_are_plain_copies() {
    let mut v: RawMultiVec<(u32, [u8; 4])> = (0..6u32).map(|i| (i, [i as u8; 4])).collect();
    let copy = v.clone();
    assert_eq!(v.pop(), Some((5, [5; 4])));
    v.pop_back();
    assert_eq!(v.len(), 4);
    assert_eq!(copy.len(), 6);
    assert_eq!(copy.field::<1>()[5], [5; 4]);
}

#[test]
fn emplace_exposes_a_row_to_write() {
    let mut v: MultiVec<(u8, i16), Raw> = MultiVec::with_capacity(1);
    let (a, b) = v.emplace_back();
    *a = 4;
    *b = -4;
    assert_eq!(v.row(0), (&4, &-4));
}

#[derive(Clone, Copy, Debug, PartialEq, FromBytes)]
#[repr(C)]
struct Vec3 {
    x: f32,
    y: f32,
    z: f32,
}

#[test]
fn user_structs_deriving_from_bytes_are_admitted() {
    let mut v: RawMultiVec<(Vec3, u32)> = MultiVec::new();
    v.push_back((Vec3 { x: 1.0, y: 2.0, z: 3.0 }, 7));
    v.reserve(9);
    assert_eq!(*v.at::<0>(0), Vec3 { x: 1.0, y: 2.0, z: 3.0 });
    assert_eq!(*v.at::<1>(0), 7);
}
