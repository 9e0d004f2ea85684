//! Random operation sequences checked against a `Vec` of tuples.

#![cfg(not(miri))]

use proptest::prelude::*;
use stria_vec::MultiVec;

#[derive(Clone, Debug)]
enum Op {
    Push(u8, String),
    Pop,
    Resize(usize),
    Reserve(usize),
    Swap(usize, usize),
    Set(usize, u8),
    Truncate(usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (any::<u8>(), "[a-z]{0,6}").prop_map(|(n, s)| Op::Push(n, s)),
        1 => Just(Op::Pop),
        1 => (0usize..40).prop_map(Op::Resize),
        1 => (0usize..80).prop_map(Op::Reserve),
        1 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Swap(a, b)),
        1 => (any::<usize>(), any::<u8>()).prop_map(|(i, n)| Op::Set(i, n)),
        1 => (0usize..40).prop_map(Op::Truncate),
    ]
}

fn snapshot(v: &MultiVec<(u8, String)>) -> Vec<(u8, String)> {
    v.iter().map(|(n, s)| (*n, s.clone())).collect()
}

proptest! {
    #[test]
    fn matches_vec_model(ops in proptest::collection::vec(arb_op(), 0..64)) {
        let mut v: MultiVec<(u8, String)> = MultiVec::new();
        let mut model: Vec<(u8, String)> = Vec::new();

        for op in ops {
            match op {
                Op::Push(n, s) => {
                    v.push_back((n, s.clone()));
                    model.push((n, s));
                }
                Op::Pop => prop_assert_eq!(v.pop(), model.pop()),
                Op::Resize(n) => {
                    v.resize(n);
                    model.resize(n, Default::default());
                }
                Op::Reserve(n) => {
                    let before = v.capacity();
                    v.reserve(n);
                    prop_assert_eq!(v.capacity(), before.max(n));
                }
                Op::Swap(a, b) if !model.is_empty() => {
                    let (a, b) = (a % model.len(), b % model.len());
                    v.swap_rows(a, b);
                    model.swap(a, b);
                }
                Op::Set(i, n) if !model.is_empty() => {
                    let i = i % model.len();
                    *v.at_mut::<0>(i) = n;
                    model[i].0 = n;
                }
                Op::Truncate(n) => {
                    v.truncate(n);
                    model.truncate(n);
                }
                Op::Swap(..) | Op::Set(..) => {}
            }
            prop_assert_eq!(v.len(), model.len());
            prop_assert!(v.len() <= v.capacity());
        }

        prop_assert_eq!(snapshot(&v), model.clone());
        prop_assert_eq!(snapshot(&v.clone()), model);
    }

    #[test]
    fn reverse_iteration_is_forward_reversed(values in proptest::collection::vec(any::<u32>(), 0..50)) {
        let v: MultiVec<(u32, u64)> = values.iter().map(|&x| (x, u64::from(x) << 1)).collect();
        let mut backwards = Vec::new();
        let mut it = v.rbegin();
        while it != v.rend() {
            backwards.push(*v.get::<0>(it));
            it.inc();
        }
        let mut expected = values.clone();
        expected.reverse();
        prop_assert_eq!(backwards, expected);
    }
}
