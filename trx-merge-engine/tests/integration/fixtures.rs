// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::{Utf8Path, Utf8PathBuf};
use quick_trx::Element;
use std::fmt::Write;
use trx_merge_engine::{merge::MergedRun, source::TrxSource};

pub(crate) static TRX_NAMESPACE: &str = "http://microsoft.com/schemas/VisualStudio/TeamTest/2010";

pub(crate) fn fixtures_dir() -> Utf8PathBuf {
    Utf8Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("crate is in a workspace")
        .join("fixtures/trx")
}

pub(crate) fn fixture(name: &str) -> TrxSource {
    TrxSource::from_path(&fixtures_dir().join(name)).expect("fixture is readable")
}

/// `(executionId, outcome)` for every result in the merged document, in order.
pub(crate) fn retained(run: &MergedRun) -> Vec<(String, String)> {
    run.document
        .root
        .descendants("UnitTestResult")
        .map(|e| (attr(e, "executionId"), attr(e, "outcome")))
        .collect()
}

pub(crate) fn attr(element: &Element, name: &str) -> String {
    element.attribute(name).unwrap_or_default().to_owned()
}

/// One generated `UnitTestResult`.
#[derive(Clone, Debug)]
pub(crate) struct GeneratedResult {
    pub(crate) test: usize,
    pub(crate) execution: usize,
    pub(crate) minute: u32,
    pub(crate) outcome: &'static str,
}

impl GeneratedResult {
    pub(crate) fn test_id(&self) -> String {
        format!("00000000-0000-0000-0000-{:012}", self.test)
    }

    pub(crate) fn execution_id(&self) -> String {
        format!("e0000000-0000-0000-0000-{:012}", self.execution)
    }

    pub(crate) fn end_time(&self) -> String {
        format!("2023-05-10T{:02}:{:02}:00Z", 10 + self.minute / 60, self.minute % 60)
    }
}

/// Renders a TRX document holding `results`.
pub(crate) fn generated_source(name: &str, results: &[GeneratedResult]) -> TrxSource {
    let mut unit_test_results = String::new();
    let mut unit_tests = String::new();
    let mut entries = String::new();
    for result in results {
        let test_id = result.test_id();
        let execution_id = result.execution_id();
        writeln!(
            unit_test_results,
            r#"<UnitTestResult executionId="{execution_id}" testId="{test_id}" testName="Generated.Test{}" endTime="{}" outcome="{}" />"#,
            result.test,
            result.end_time(),
            result.outcome,
        )
        .expect("writing to a String is infallible");
        writeln!(
            unit_tests,
            r#"<UnitTest name="Test{}" id="{test_id}"><Execution id="{execution_id}" /></UnitTest>"#,
            result.test,
        )
        .expect("writing to a String is infallible");
        writeln!(
            entries,
            r#"<TestEntry testId="{test_id}" executionId="{execution_id}" />"#,
        )
        .expect("writing to a String is infallible");
    }

    let contents = format!(
        r#"<TestRun xmlns="{TRX_NAMESPACE}"><Results>{unit_test_results}</Results><TestDefinitions>{unit_tests}</TestDefinitions><TestEntries>{entries}</TestEntries></TestRun>"#
    );
    TrxSource::new(name, contents)
}
