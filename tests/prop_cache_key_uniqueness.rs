// Property: cache key uniqueness
//
// Two requests for the same path differing only by range derive different
// cache keys, so full-object and partial entries never collide or
// overwrite each other.

use edge_range_cache::{CacheKeyDeriver, ProxyConfig, RangeRequest};
use proptest::prelude::*;
use std::sync::Arc;

fn deriver() -> CacheKeyDeriver {
    CacheKeyDeriver::new(Arc::new(ProxyConfig::default()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A ranged key never equals the full-object key for the same path.
    #[test]
    fn prop_ranged_never_collides_with_full(
        path in "/[a-z0-9/._-]{1,40}",
        offset in 0u64..=1_000_000u64,
        end in proptest::option::of(1u64..=1_000_000u64),
    ) {
        let d = deriver();
        let range = RangeRequest::new(offset, end);
        prop_assert_ne!(d.derive(&path, None), d.derive(&path, Some(&range)));
    }

    /// Distinct ranges derive distinct keys for the same path.
    #[test]
    fn prop_distinct_ranges_distinct_keys(
        path in "/[a-z0-9/._-]{1,40}",
        offset_a in 0u64..=1_000_000u64,
        end_a in proptest::option::of(1u64..=1_000_000u64),
        offset_b in 0u64..=1_000_000u64,
        end_b in proptest::option::of(1u64..=1_000_000u64),
    ) {
        let a = RangeRequest::new(offset_a, end_a);
        let b = RangeRequest::new(offset_b, end_b);
        prop_assume!(a != b);

        let d = deriver();
        prop_assert_ne!(d.derive(&path, Some(&a)), d.derive(&path, Some(&b)));
    }

    /// Distinct paths derive distinct keys for the same range.
    #[test]
    fn prop_distinct_paths_distinct_keys(
        path_a in "/[a-z0-9._-]{1,40}",
        path_b in "/[a-z0-9._-]{1,40}",
        offset in 0u64..=1_000_000u64,
    ) {
        prop_assume!(path_a != path_b);
        let d = deriver();
        let range = RangeRequest::new(offset, None);
        prop_assert_ne!(
            d.derive(&path_a, Some(&range)),
            d.derive(&path_b, Some(&range))
        );
    }

    /// Key derivation is deterministic.
    #[test]
    fn prop_derivation_deterministic(
        path in "/[a-z0-9/._-]{1,40}",
        offset in 0u64..=1_000_000u64,
        end in proptest::option::of(1u64..=1_000_000u64),
    ) {
        let d = deriver();
        let range = RangeRequest::new(offset, end);
        prop_assert_eq!(d.derive(&path, Some(&range)), d.derive(&path, Some(&range)));
    }
}
