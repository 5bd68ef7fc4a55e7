//! Property-based tests over arbitrary operation sequences.

use proptest::prelude::*;

use memocache::{Algorithm, CacheConfig, CallArgs, MemoCache};

const MAX_SIZE: usize = 8;

#[derive(Debug, Clone)]
enum CacheOp {
    Fetch(i64),
    FetchFloat(i64),
    Clear,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        8 => (0i64..32).prop_map(CacheOp::Fetch),
        2 => (0i64..8).prop_map(CacheOp::FetchFloat),
        1 => Just(CacheOp::Clear),
    ]
}

fn algorithm_strategy() -> impl Strategy<Value = Algorithm> {
    prop_oneof![
        Just(Algorithm::Lru),
        Just(Algorithm::Lfu),
        Just(Algorithm::Fifo),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // For any operation sequence on a bounded cache, the size bound holds
    // and every fetch is accounted as exactly one hit or one miss.
    #[test]
    fn size_and_counters_stay_consistent(
        algorithm in algorithm_strategy(),
        ops in prop::collection::vec(cache_op_strategy(), 1..120),
    ) {
        let cache: MemoCache<i64> = MemoCache::new(
            CacheConfig::new().algorithm(algorithm).max_size(MAX_SIZE),
        )
        .unwrap();

        let mut fetches_since_clear: u64 = 0;
        for op in ops {
            match op {
                CacheOp::Fetch(n) => {
                    let value = cache.fetch_or_compute(&CallArgs::new().arg(n), || n + 1000);
                    prop_assert_eq!(value, n + 1000, "cached value must match computed value");
                    fetches_since_clear += 1;
                }
                CacheOp::FetchFloat(n) => {
                    let x = n as f64 + 0.5;
                    let value = cache.fetch_or_compute(&CallArgs::new().arg(x), || n + 2000);
                    prop_assert_eq!(value, n + 2000);
                    fetches_since_clear += 1;
                }
                CacheOp::Clear => {
                    cache.clear();
                    fetches_since_clear = 0;
                }
            }

            let stats = cache.info();
            prop_assert!(stats.current_size <= MAX_SIZE, "size bound violated");
            prop_assert_eq!(
                stats.hits + stats.misses,
                fetches_since_clear,
                "every fetch is exactly one hit or one miss"
            );
            prop_assert!(stats.current_size as u64 <= stats.misses,
                "entries can only enter via misses");
        }
    }

    // Fetching the same signature twice in a row never computes twice,
    // regardless of what happened before.
    #[test]
    fn immediate_refetch_always_hits(
        algorithm in algorithm_strategy(),
        warmup in prop::collection::vec(0i64..32, 0..40),
        n in 0i64..32,
    ) {
        let cache: MemoCache<i64> = MemoCache::new(
            CacheConfig::new().algorithm(algorithm).max_size(MAX_SIZE),
        )
        .unwrap();

        for w in warmup {
            cache.fetch_or_compute(&CallArgs::new().arg(w), || w);
        }

        cache.fetch_or_compute(&CallArgs::new().arg(n), || n);
        let hits_before = cache.info().hits;
        let value = cache.fetch_or_compute(&CallArgs::new().arg(n), || -1);
        prop_assert_eq!(value, n, "refetch must return the cached value");
        prop_assert_eq!(cache.info().hits, hits_before + 1);
    }
}
