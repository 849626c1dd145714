//! Comparison tests between PooledVec and std::Vec
//!
//! Random operation sequences are applied to both containers and the results
//! compared after every step. The supported surface is append, indexed
//! read/write, clear and search; everything else is expected to be rejected.

use proptest::prelude::*;
use pooled_vec::{Config, Error, FixedPool, HeapPool, HeapPoolConfig, PooledVec};

// ============================================================================
// COMPARISON TESTING INFRASTRUCTURE
// ============================================================================

/// Operations that can be applied to a vector for comparison testing.
#[derive(Debug, Clone)]
enum VecOp<T> {
    Push(T),
    Set(usize, T),
    Get(usize),
    Clear,
    IndexOf(T),
    Remove(T),
    Extend(Vec<T>),
}

/// Apply an operation to both vectors and compare results.
fn apply_op<T, P>(std_vec: &mut Vec<T>, pooled: &mut PooledVec<T, P>, op: &VecOp<T>)
where
    T: Clone + PartialEq + std::fmt::Debug,
    P: pooled_vec::BufferPool<T>,
{
    match op {
        VecOp::Push(v) => {
            std_vec.push(v.clone());
            pooled.push(v.clone());
        }
        VecOp::Set(idx, v) => {
            let std_result = std_vec
                .get_mut(*idx)
                .map(|slot| std::mem::replace(slot, v.clone()));
            let pooled_result = pooled.set(*idx, v.clone()).ok();
            assert_eq!(std_result, pooled_result, "set({idx}) mismatch");
        }
        VecOp::Get(idx) => {
            assert_eq!(
                std_vec.get(*idx),
                pooled.get(*idx).ok(),
                "get({idx}) mismatch"
            );
        }
        VecOp::Clear => {
            std_vec.clear();
            pooled.clear();
        }
        VecOp::IndexOf(v) => {
            let std_result = std_vec.iter().position(|x| x == v);
            assert_eq!(std_result, pooled.index_of(v), "index_of mismatch");
            assert_eq!(std_vec.contains(v), pooled.contains(v), "contains mismatch");
        }
        VecOp::Remove(v) => {
            let expected = if std_vec.contains(v) {
                Err(Error::Unsupported {
                    operation: "remove_at",
                })
            } else {
                Ok(false)
            };
            assert_eq!(pooled.remove(v), expected, "remove mismatch");
        }
        VecOp::Extend(values) => {
            std_vec.extend(values.iter().cloned());
            pooled.extend(values.iter().cloned());
        }
    }
}

/// Assert that both vectors have identical contents.
fn assert_vecs_equal<T, P>(std_vec: &[T], pooled: &PooledVec<T, P>)
where
    T: Clone + PartialEq + std::fmt::Debug,
    P: pooled_vec::BufferPool<T>,
{
    assert_eq!(std_vec.len(), pooled.len(), "length mismatch");
    assert_eq!(std_vec.is_empty(), pooled.is_empty(), "is_empty mismatch");
    assert_eq!(
        pooled.segment_lens().iter().sum::<usize>(),
        pooled.len(),
        "segment lengths do not add up"
    );

    let starts = pooled.segment_starts();
    let lens = pooled.segment_lens();
    for i in 1..starts.len() {
        assert_eq!(
            starts[i],
            starts[i - 1] + lens[i - 1],
            "segments not contiguous"
        );
    }

    for (i, expected) in std_vec.iter().enumerate() {
        assert_eq!(Ok(expected), pooled.get(i), "element {i} mismatch");
    }
    assert!(pooled.get(std_vec.len()).is_err(), "read past the end succeeded");

    let iterated: Vec<T> = pooled.iter().cloned().collect();
    assert_eq!(std_vec, iterated.as_slice(), "iteration mismatch");
    assert_eq!(std_vec, pooled.to_vec().as_slice(), "to_vec mismatch");
}

// ============================================================================
// PROPTEST STRATEGIES
// ============================================================================

fn vec_op_strategy() -> impl Strategy<Value = VecOp<i32>> {
    prop_oneof![
        // Push is the most common operation
        5 => any::<i32>().prop_map(VecOp::Push),
        2 => (0usize..200, any::<i32>()).prop_map(|(idx, v)| VecOp::Set(idx, v)),
        2 => (0usize..200).prop_map(VecOp::Get),
        1 => Just(VecOp::Clear),
        // Small value range so searches actually hit
        1 => (-5i32..5).prop_map(VecOp::IndexOf),
        1 => (-5i32..5).prop_map(VecOp::Remove),
        2 => prop::collection::vec(-5i32..5, 0..50).prop_map(VecOp::Extend),
    ]
}

/// Strategy for generating a sequence of operations.
fn ops_sequence_strategy() -> impl Strategy<Value = Vec<VecOp<i32>>> {
    prop::collection::vec(vec_op_strategy(), 0..200)
}

fn config_strategy() -> impl Strategy<Value = Config> {
    prop_oneof![
        (1usize..16).prop_map(Config::fixed),
        (1usize..8, 8usize..64).prop_map(|(initial, max)| Config::doubling(initial, max)),
    ]
}

// ============================================================================
// PROPTEST TESTS
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// A random sequence of operations produces identical results.
    #[test]
    fn proptest_operations_match(ops in ops_sequence_strategy(), config in config_strategy()) {
        let mut std_vec: Vec<i32> = Vec::new();
        let mut pooled: PooledVec<i32> = PooledVec::with_config(config).unwrap();

        for op in &ops {
            apply_op(&mut std_vec, &mut pooled, op);
            assert_vecs_equal(&std_vec, &pooled);
        }
    }

    /// Push followed by iteration and copy-out.
    #[test]
    fn proptest_push_and_copy(values in prop::collection::vec(any::<i32>(), 0..500), pad in 0usize..4) {
        let mut pooled: PooledVec<i32> = PooledVec::new();
        for v in &values {
            pooled.push(*v);
        }

        let collected: Vec<_> = pooled.iter().copied().collect();
        prop_assert_eq!(&collected, &values);

        let mut dest = vec![0; values.len() + pad];
        pooled.copy_into(&mut dest, pad).unwrap();
        prop_assert_eq!(&dest[pad..], values.as_slice());
    }

    /// Every buffer rented during a random workload comes back exactly once.
    #[test]
    fn proptest_pool_discipline(ops in ops_sequence_strategy(), size in 1usize..8) {
        let pool: FixedPool<i32> = FixedPool::uniform(size, 200 * 50 / size + 1);
        {
            let mut std_vec: Vec<i32> = Vec::new();
            let mut pooled = PooledVec::with_config_in(Config::fixed(size), &pool).unwrap();
            for op in &ops {
                apply_op(&mut std_vec, &mut pooled, op);
            }
            prop_assert_eq!(pool.return_count(), 0);
            prop_assert!(pooled.segment_count() <= pool.outstanding());
        }
        prop_assert!(pool.all_returned());
        prop_assert_eq!(pool.rent_count(), pool.return_count());
    }

    /// After a clear, refilling up to the old length rents nothing new.
    #[test]
    fn proptest_clear_reuses_buffers(first in 1usize..300, second in 0usize..300) {
        let pool: HeapPool<usize> = HeapPool::with_config(HeapPoolConfig {
            max_pooled_capacity: 1 << 10,
            max_retained_per_class: 64,
        });
        let mut pooled = PooledVec::with_config_in(Config::doubling(4, 64), &pool).unwrap();
        pooled.extend(0..first);
        let rented = pool.stats().rented;

        pooled.clear();
        pooled.extend(0..second.min(first));
        prop_assert_eq!(pool.stats().rented, rented);
        prop_assert_eq!(pool.stats().returned, 0);

        pooled.extend(0..second);
        let expected: Vec<usize> = (0..second.min(first)).chain(0..second).collect();
        prop_assert_eq!(pooled.to_vec(), expected);
    }

    /// Equality ignores segment layout.
    #[test]
    fn proptest_eq_across_layouts(values in prop::collection::vec(any::<i32>(), 0..100)) {
        let mut a: PooledVec<i32> = PooledVec::with_config(Config::fixed(3)).unwrap();
        let mut b: PooledVec<i32> = PooledVec::with_config(Config::doubling(1, 32)).unwrap();
        a.extend(values.iter());
        b.extend(values.iter());
        prop_assert!(a == b);
    }
}
