//! Property-based tests for bucketing and weight validation.
//!
//! - Test mathematical invariants (bucket range, total allocation)
//! - Run with `ProptestConfig::with_cases(100)` to stay fast pre-commit

use proptest::prelude::*;
use sorteo::bucket::{pick_variation, stable_bucket};
use sorteo::experiment::{Experiment, Variation};
use sorteo::{AbEngine, Error, MemoryKvStore, NoopSink};

/// Weight tables that sum to exactly 100, 1 to 4 arms, no zero-weight arm.
fn arb_weight_table() -> impl Strategy<Value = Vec<u32>> {
    proptest::collection::vec(1u32..=99, 0..3).prop_map(|mut cuts| {
        cuts.sort_unstable();
        cuts.dedup();
        let mut weights = Vec::with_capacity(cuts.len() + 1);
        let mut last = 0;
        for cut in cuts {
            weights.push(cut - last);
            last = cut;
        }
        weights.push(100 - last);
        weights
    })
}

fn variations(weights: &[u32]) -> Vec<Variation> {
    weights
        .iter()
        .enumerate()
        .map(|(i, w)| Variation::new(format!("v{i}"), format!("V{i}"), *w))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_bucket_always_in_range(user in ".*", experiment in ".*") {
        let bucket = stable_bucket(&user, &experiment);
        prop_assert!(bucket < 1000);
    }

    #[test]
    fn prop_bucket_is_deterministic(user in "[a-z0-9-]{1,32}", experiment in "[a-z0-9-]{1,32}") {
        prop_assert_eq!(
            stable_bucket(&user, &experiment),
            stable_bucket(&user, &experiment)
        );
    }

    #[test]
    fn prop_full_weight_table_covers_every_bucket(weights in arb_weight_table()) {
        let table = variations(&weights);
        prop_assert_eq!(table.iter().map(Variation::weight).sum::<u32>(), 100);

        for bucket in 0..1000 {
            prop_assert!(pick_variation(&table, bucket).is_some());
        }
    }

    #[test]
    fn prop_allocation_matches_weights_exactly(weights in arb_weight_table()) {
        // With weights summing to 100, bucket b belongs to the arm whose
        // cumulative boundary first exceeds it; counting buckets per arm
        // must reproduce weight * 10 exactly
        let table = variations(&weights);
        let mut counts = vec![0u32; table.len()];

        for bucket in 0..1000 {
            let picked = pick_variation(&table, bucket).unwrap();
            let index = table.iter().position(|v| v.id() == picked.id()).unwrap();
            counts[index] += 1;
        }

        for (count, weight) in counts.iter().zip(&weights) {
            prop_assert_eq!(*count, weight * 10);
        }
    }

    #[test]
    fn prop_registry_rejects_any_sum_but_100(weights in proptest::collection::vec(0u32..=100, 1..5)) {
        let sum: u32 = weights.iter().sum();
        let experiment = Experiment::builder("exp-p", "Property", "conversion")
            .variations(variations(&weights))
            .build();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let outcome = runtime.block_on(async {
            let engine = AbEngine::builder(MemoryKvStore::new(), NoopSink).build().await;
            engine.create_experiment(experiment).await
        });

        if sum == 100 {
            prop_assert!(outcome.is_ok());
        } else {
            let rejected = matches!(outcome, Err(Error::InvalidWeights { sum: s }) if s == sum);
            prop_assert!(rejected);
        }
    }
}
