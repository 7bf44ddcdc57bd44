// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-outcome bookkeeping and classification of the overall run.

use indexmap::map::IndexMap;
use quick_trx::Element;
use std::fmt;

pub(crate) static RESULT_SUMMARY_TAG: &str = "ResultSummary";
static COUNTERS_TAG: &str = "Counters";
static OUTCOME_ATTR: &str = "outcome";

static TOTAL_KEY: &str = "total";
static PASSED_KEY: &str = "passed";
static FAILED_KEY: &str = "failed";
static ERROR_KEYS: &[&str] = &["error", "timeout", "aborted"];
static IN_PROGRESS_KEYS: &[&str] = &["inprogress", "pending"];

/// The outcome of a single test result, such as `Passed` or `Failed`.
///
/// The text is kept verbatim for output; comparisons use the lower-cased form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestOutcome {
    raw: String,
    normalized: String,
}

impl TestOutcome {
    /// Creates a new outcome, or `None` if `raw` is blank.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return None;
        }
        let normalized = raw.trim().to_lowercase();
        Some(Self { raw, normalized })
    }

    /// The outcome exactly as written in the source document.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The lower-cased outcome, used as the ledger key.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// The overall outcome of a merged run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RunOutcome {
    /// Every retained result passed, or finished without a failing or pending status.
    Completed,

    /// At least one retained result failed.
    Failed,

    /// No failures, but at least one result errored, timed out or was aborted.
    Error,

    /// No failures or errors, but at least one result is still in progress or pending.
    InProgress,
}

impl RunOutcome {
    /// Returns the string written to the `outcome` attribute of `ResultSummary`.
    pub fn as_str(self) -> &'static str {
        match self {
            RunOutcome::Completed => "Completed",
            RunOutcome::Failed => "Failed",
            RunOutcome::Error => "Error",
            RunOutcome::InProgress => "InProgress",
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live counts of retained results, keyed by normalized outcome.
///
/// A count goes up when a result is retained for an identity and down when that result is later
/// displaced by a newer one, so at any point the ledger describes exactly the retained results.
#[derive(Clone, Debug, Default)]
pub struct OutcomeLedger {
    // Insertion order is the order outcomes were first seen, which is the order they're written.
    counts: IndexMap<String, usize>,
}

impl OutcomeLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a newly retained result.
    pub fn increment(&mut self, outcome: &TestOutcome) {
        *self
            .counts
            .entry(outcome.normalized().to_owned())
            .or_insert(0) += 1;
    }

    /// Records that a previously retained result was displaced.
    pub fn decrement(&mut self, outcome: &TestOutcome) {
        let count = self
            .counts
            .get_mut(outcome.normalized())
            .filter(|count| **count > 0);
        debug_assert!(
            count.is_some(),
            "decremented outcome `{}` which has no retained results",
            outcome.normalized()
        );
        if let Some(count) = count {
            *count -= 1;
        }
    }

    /// Returns the live count for a normalized outcome.
    pub fn count(&self, normalized: &str) -> usize {
        self.counts.get(normalized).copied().unwrap_or(0)
    }

    /// Returns the counters and the overall outcome.
    pub fn summarize(&self) -> ResultSummary {
        let mut others = IndexMap::new();
        for (outcome, &count) in &self.counts {
            if count > 0 && outcome != PASSED_KEY && outcome != FAILED_KEY {
                others.insert(outcome.clone(), count);
            }
        }

        let counters = Counters {
            total: self.counts.values().sum(),
            passed: self.count(PASSED_KEY),
            failed: self.count(FAILED_KEY),
            others,
        };
        let outcome = self.classify();

        ResultSummary { counters, outcome }
    }

    // The order of these checks matters: a run with both failures and errors is `Failed`.
    fn classify(&self) -> RunOutcome {
        let any = |keys: &[&str]| keys.iter().any(|key| self.count(key) > 0);

        if self.count(FAILED_KEY) > 0 {
            RunOutcome::Failed
        } else if any(ERROR_KEYS) {
            RunOutcome::Error
        } else if any(IN_PROGRESS_KEYS) {
            RunOutcome::InProgress
        } else {
            RunOutcome::Completed
        }
    }
}

/// The counts written to the `Counters` element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Counters {
    /// The number of retained results.
    pub total: usize,

    /// Results with a `Passed` outcome. Always written.
    pub passed: usize,

    /// Results with a `Failed` outcome. Always written.
    pub failed: usize,

    /// Every other outcome with a non-zero count, in the order first seen.
    pub others: IndexMap<String, usize>,
}

impl Counters {
    /// Iterates over `(attribute, count)` pairs in the order they are written.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        [
            (TOTAL_KEY, self.total),
            (PASSED_KEY, self.passed),
            (FAILED_KEY, self.failed),
        ]
        .into_iter()
        .chain(self.others.iter().map(|(k, &v)| (k.as_str(), v)))
    }
}

/// The summary of a merged run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultSummary {
    /// Per-outcome counts.
    pub counters: Counters,

    /// The overall outcome.
    pub outcome: RunOutcome,
}

impl ResultSummary {
    /// Builds the `ResultSummary` element with its nested `Counters`.
    pub fn to_element(&self, namespace: Option<&str>) -> Element {
        let mut counters = Element::new(COUNTERS_TAG);
        counters.set_namespace(namespace);
        for (name, count) in self.counters.iter() {
            counters.set_attribute(name, count.to_string());
        }

        let mut summary = Element::new(RESULT_SUMMARY_TAG);
        summary
            .set_namespace(namespace)
            .set_attribute(OUTCOME_ATTR, self.outcome.as_str())
            .add_child(counters);
        summary
    }
}
