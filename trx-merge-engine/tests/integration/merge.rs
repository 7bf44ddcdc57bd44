// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use color_eyre::eyre::{Result, ensure};
use pretty_assertions::assert_eq;
use quick_trx::Document;
use trx_merge_engine::{
    errors::MergeErrorCategory,
    merge::{MergeDiagnostic, MergerBuilder},
    outcome::RunOutcome,
};

fn counters(document: &Document) -> Vec<(String, String)> {
    document
        .root
        .first_descendant("Counters")
        .map(|counters| {
            counters
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .unwrap_or_default()
}

fn owned(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

#[test]
fn rerun_replaces_failure() -> Result<()> {
    let sources = [fixture("initial-run.trx"), fixture("rerun.trx")];
    let run = MergerBuilder::new().build().merge(&sources)?;

    assert_eq!(
        retained(&run),
        owned(&[
            ("a1000000-0000-0000-0000-000000000001", "Passed"),
            ("b2000000-0000-0000-0000-000000000002", "Passed"),
            ("a1000000-0000-0000-0000-000000000003", "Passed"),
        ])
    );
    assert_eq!(
        counters(&run.document),
        owned(&[("total", "3"), ("passed", "3"), ("failed", "0")])
    );
    assert_eq!(run.summary.outcome, RunOutcome::Completed);

    let times = run
        .document
        .root
        .first_descendant("Times")
        .expect("both sources have Times");
    assert_eq!(
        times.attribute("creation"),
        Some("2023-05-10T10:00:00.1234567+00:00")
    );
    assert_eq!(times.attribute("finish"), Some("2023-05-10T10:05:04.0000000+00:00"));

    // The pass-through content of the replaced result is gone, along with its entry.
    let xml = run.document.to_string()?;
    ensure!(!xml.contains("Assert.AreEqual failed"), "stale output kept:\n{xml}");
    ensure!(
        !xml.contains("a1000000-0000-0000-0000-000000000002"),
        "stale execution kept:\n{xml}"
    );

    let displaced: Vec<_> = run
        .diagnostics
        .iter()
        .filter(|d| matches!(d, MergeDiagnostic::Retained { displaced: true, .. }))
        .map(|d| d.to_string())
        .collect();
    assert_eq!(
        displaced,
        vec![
            "New result of test Calculator.Divides (22222222-2222-2222-2222-222222222222) was \
             found in file "
                .to_owned()
                + sources[1].name()
        ]
    );
    Ok(())
}

#[test]
fn older_rerun_does_not_replace() -> Result<()> {
    // Source order is irrelevant when end times differ.
    let sources = [fixture("rerun.trx"), fixture("initial-run.trx")];
    let run = MergerBuilder::new().build().merge(&sources)?;

    assert_eq!(
        retained(&run),
        owned(&[
            ("b2000000-0000-0000-0000-000000000002", "Passed"),
            ("a1000000-0000-0000-0000-000000000001", "Passed"),
            ("a1000000-0000-0000-0000-000000000003", "Passed"),
        ])
    );
    assert_eq!(run.summary.outcome, RunOutcome::Completed);
    Ok(())
}

#[test]
fn error_outcome_without_times() -> Result<()> {
    let run = MergerBuilder::new()
        .build()
        .merge(&[fixture("error-no-times.trx")])?;

    assert_eq!(run.summary.outcome, RunOutcome::Error);
    assert_eq!(
        counters(&run.document),
        owned(&[("total", "2"), ("passed", "1"), ("failed", "0"), ("error", "1")])
    );
    ensure!(run.times.is_empty(), "no Times block was observed");
    ensure!(run.document.root.first_descendant("Times").is_none());
    Ok(())
}

#[test]
fn prefixed_source_merges_by_local_name() -> Result<()> {
    let sources = [
        fixture("initial-run.trx"),
        fixture("rerun.trx"),
        fixture("prefixed.trx"),
    ];
    let run = MergerBuilder::new().build().merge(&sources)?;

    assert_eq!(
        retained(&run),
        owned(&[
            ("a1000000-0000-0000-0000-000000000001", "Passed"),
            ("b2000000-0000-0000-0000-000000000002", "Passed"),
            ("d4000000-0000-0000-0000-000000000003", "Failed"),
        ])
    );
    assert_eq!(run.summary.outcome, RunOutcome::Failed);
    assert_eq!(run.document.namespace(), Some(TRX_NAMESPACE));

    let times = run.document.root.first_descendant("Times").expect("Times");
    assert_eq!(times.attribute("creation"), Some("2023-05-10T09:55:00.0000000+00:00"));
    assert_eq!(times.attribute("queuing"), Some("2023-05-10T10:00:00.2234567+00:00"));
    assert_eq!(times.attribute("finish"), Some("2023-05-10T10:06:00.0000000+00:00"));

    // The output uses a default namespace, not the source's prefix.
    let xml = run.document.to_string()?;
    ensure!(!xml.contains("<t:"), "prefix leaked into output:\n{xml}");
    Ok(())
}

#[test]
fn output_namespace_replaces_everything() -> Result<()> {
    let mut builder = MergerBuilder::new();
    builder.set_namespace("urn:example:merged");
    let run = builder
        .build()
        .merge(&[fixture("initial-run.trx"), fixture("prefixed.trx")])?;

    let xml = run.document.to_string()?;
    ensure!(!xml.contains(TRX_NAMESPACE), "old namespace kept:\n{xml}");
    assert_eq!(xml.matches("xmlns").count(), 1, "one declaration:\n{xml}");

    let reparsed = Document::from_slice(xml.as_bytes())?;
    let mut stack = vec![&reparsed.root];
    while let Some(element) = stack.pop() {
        assert_eq!(
            element.namespace.as_deref(),
            Some("urn:example:merged"),
            "namespace of {}",
            element.name
        );
        stack.extend(element.child_elements());
    }
    Ok(())
}

#[test]
fn malformed_source_names_the_file() {
    let sources = [fixture("initial-run.trx"), fixture("malformed.trx")];
    let error = MergerBuilder::new()
        .build()
        .merge(&sources)
        .expect_err("malformed.trx is not well-formed");
    assert_eq!(error.source_name(), sources[1].name());
    assert_eq!(error.kind().category(), MergeErrorCategory::MalformedSource);
}

#[test]
fn missing_end_time_names_the_file() {
    let sources = [fixture("missing-end-time.trx")];
    let error = MergerBuilder::new()
        .build()
        .merge(&sources)
        .expect_err("endTime is required");
    assert_eq!(error.source_name(), sources[0].name());
    assert_eq!(
        error.kind().category(),
        MergeErrorCategory::MissingRequiredAttribute
    );
}

#[test]
fn output_round_trips() -> Result<()> {
    let run = MergerBuilder::new()
        .build()
        .merge(&[fixture("initial-run.trx"), fixture("rerun.trx")])?;
    let xml = run.document.to_string()?;
    ensure!(
        xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#),
        "declaration is written:\n{xml}"
    );
    let reparsed = Document::from_slice(xml.as_bytes())?;
    assert_eq!(reparsed, run.document);
    Ok(())
}
