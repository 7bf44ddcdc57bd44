// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use trx_merge_engine::{
    merge::{MergedRun, MergerBuilder},
    source::TrxSource,
};

fn outcome_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["Passed", "Failed", "Error", "Timeout", "Pending", "NotExecuted"])
}

/// Results with distinct end times, spread over 1 to 3 sources.
fn sources_strategy() -> impl Strategy<Value = (Vec<GeneratedResult>, usize)> {
    prop::collection::vec((0usize..6, outcome_strategy()), 1..24).prop_flat_map(|results| {
        let minutes: Vec<u32> = (100..100 + results.len() as u32).collect();
        (Just(results), Just(minutes).prop_shuffle(), 1usize..4).prop_map(
            |(results, minutes, source_count)| {
                let results = results
                    .into_iter()
                    .zip(minutes)
                    .enumerate()
                    .map(|(execution, ((test, outcome), minute))| GeneratedResult {
                        test,
                        execution,
                        minute,
                        outcome,
                    })
                    .collect();
                (results, source_count)
            },
        )
    })
}

fn split(results: &[GeneratedResult], source_count: usize) -> Vec<TrxSource> {
    (0..source_count)
        .map(|n| {
            let chunk: Vec<_> = results
                .iter()
                .filter(|result| result.execution % source_count == n)
                .cloned()
                .collect();
            generated_source(&format!("source-{n}.trx"), &chunk)
        })
        .collect()
}

fn merge(sources: &[TrxSource]) -> MergedRun {
    MergerBuilder::new()
        .build()
        .merge(sources)
        .expect("generated sources merge")
}

fn retained_set(run: &MergedRun) -> BTreeSet<(String, String)> {
    retained(run).into_iter().collect()
}

proptest! {
    #[test]
    fn counters_sum_to_total((results, source_count) in sources_strategy()) {
        let run = merge(&split(&results, source_count));
        let counters = &run.summary.counters;
        let others: usize = counters.others.values().sum();
        prop_assert_eq!(counters.total, counters.passed + counters.failed + others);

        let tests: BTreeSet<_> = results.iter().map(|result| result.test).collect();
        prop_assert_eq!(counters.total, tests.len());
        prop_assert_eq!(run.document.root.descendants("UnitTestResult").count(), tests.len());
        prop_assert_eq!(run.document.root.descendants("TestEntry").count(), tests.len());
    }

    #[test]
    fn survivor_is_latest((results, source_count) in sources_strategy()) {
        let run = merge(&split(&results, source_count));

        let mut latest: BTreeMap<usize, &GeneratedResult> = BTreeMap::new();
        for result in &results {
            let entry = latest.entry(result.test).or_insert(result);
            if result.minute > entry.minute {
                *entry = result;
            }
        }
        let expected: BTreeSet<_> = latest
            .values()
            .map(|result| (result.execution_id(), result.outcome.to_owned()))
            .collect();
        prop_assert_eq!(retained_set(&run), expected);
    }

    #[test]
    fn source_order_is_irrelevant((results, source_count) in sources_strategy()) {
        let mut sources = split(&results, source_count);
        let forward = merge(&sources);
        sources.reverse();
        let backward = merge(&sources);

        prop_assert_eq!(retained_set(&forward), retained_set(&backward));
        prop_assert_eq!(&forward.summary, &backward.summary);
    }

    #[test]
    fn merging_dominated_input_is_idempotent((results, source_count) in sources_strategy()) {
        let run = merge(&split(&results, source_count));
        let merged = TrxSource::new(
            "merged.trx",
            run.document.to_string().expect("merged document serializes"),
        );

        // Older results for every test that was kept.
        let dominated: Vec<_> = results
            .iter()
            .map(|result| GeneratedResult {
                execution: result.execution + 1000,
                minute: result.minute - 100,
                outcome: "Failed",
                ..result.clone()
            })
            .collect();
        let dominated = generated_source("dominated.trx", &dominated);

        let merged_first = merge(&[merged.clone(), dominated.clone()]);
        prop_assert_eq!(retained(&merged_first), retained(&run));
        prop_assert_eq!(&merged_first.summary, &run.summary);

        // Results are listed in the order tests were first seen, so only compare contents here.
        let dominated_first = merge(&[dominated, merged]);
        prop_assert_eq!(retained_set(&dominated_first), retained_set(&run));
        prop_assert_eq!(&dominated_first.summary, &run.summary);
    }
}
