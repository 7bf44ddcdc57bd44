// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Folding multiple TRX documents into one.
//!
//! The entry point is [`TrxMerger`], created through a [`MergerBuilder`].

use crate::{
    TestRecord,
    errors::{MergeError, MergeErrorKind},
    identity::{TestEntryKey, TestIdentity},
    outcome::{OutcomeLedger, ResultSummary},
    record::{
        DEFINITION_ID_ATTR, RESULTS_TAG, TEST_DEFINITIONS_TAG, TEST_ENTRIES_TAG, TEST_ENTRY_TAG,
        TEST_RUN_TAG, UNIT_TEST_RESULT_TAG, UNIT_TEST_TAG, entry_key_of,
    },
    source::TrxSource,
    times::{TIMES_TAG, TimeEnvelope, TimesObservation},
};
use indexmap::map::IndexMap;
use quick_trx::{Document, Element};
use std::{collections::HashMap, fmt};
use tracing::{debug, info};

/// Builds a [`TrxMerger`].
#[derive(Clone, Debug, Default)]
pub struct MergerBuilder {
    namespace: Option<String>,
}

impl MergerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the namespace every element of the merged document is moved into.
    ///
    /// A blank namespace is the same as not setting one: the merged document then uses the
    /// namespace of the last source's root element.
    pub fn set_namespace(&mut self, namespace: impl Into<String>) -> &mut Self {
        let namespace = namespace.into();
        self.namespace = (!namespace.trim().is_empty()).then_some(namespace);
        self
    }

    /// Creates the merger.
    pub fn build(&self) -> TrxMerger {
        TrxMerger {
            namespace: self.namespace.clone(),
        }
    }
}

/// Merges TRX documents, keeping only the latest result for each test.
#[derive(Clone, Debug)]
pub struct TrxMerger {
    namespace: Option<String>,
}

impl TrxMerger {
    /// Returns the namespace the merged document is rewritten into, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Merges `sources`, in order.
    ///
    /// Order matters only when two results for the same test have the same `endTime`, in which
    /// case the one seen first is kept.
    ///
    /// If any source can't be parsed, or contains a `UnitTestResult` that can't be merged, the
    /// whole merge fails and the error names that source.
    pub fn merge<'a>(
        &self,
        sources: impl IntoIterator<Item = &'a TrxSource>,
    ) -> Result<MergedRun, MergeError> {
        let mut state = MergeState::default();
        for source in sources {
            state
                .fold_source(source)
                .map_err(|kind| MergeError::new(source.name(), kind))?;
        }
        Ok(state.finish(self.namespace.as_deref()))
    }
}

/// The result of a successful merge.
#[derive(Clone, Debug)]
pub struct MergedRun {
    /// The merged document, ready to be written out.
    pub document: Document,

    /// The counters and overall outcome, as written to `ResultSummary`.
    pub summary: ResultSummary,

    /// The widest timing window across every source.
    pub times: TimeEnvelope,

    /// Events that happened while merging, in order.
    pub diagnostics: Vec<MergeDiagnostic>,
}

impl MergedRun {
    /// The number of results kept in the merged document.
    pub fn result_count(&self) -> usize {
        self.summary.counters.total
    }
}

/// Something notable that happened during a merge. None of these are errors.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum MergeDiagnostic {
    /// A source was read.
    SourceRead {
        /// The name of the source.
        source_name: String,

        /// The number of `UnitTestResult` elements it contained.
        result_count: usize,
    },

    /// A result was kept for a test, possibly displacing an older one.
    Retained {
        /// The test the result belongs to.
        identity: TestIdentity,

        /// The source the kept result came from.
        source_name: String,

        /// True if an older result for the same test was discarded.
        displaced: bool,
    },

    /// A kept result had no `TestEntry` with the same `testId` and `executionId` in its source.
    MissingEntry {
        /// The key that was looked up.
        key: TestEntryKey,

        /// The source the result came from.
        source_name: String,
    },

    /// A kept result's `testId` had no `UnitTest` definition in any source seen so far.
    MissingDefinition {
        /// The `testId` that was looked up.
        test_id: String,

        /// The source the result came from.
        source_name: String,
    },
}

impl fmt::Display for MergeDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceRead {
                source_name,
                result_count,
            } => write!(f, "Found {result_count} tests in file {source_name}"),
            Self::Retained {
                identity,
                source_name,
                displaced: true,
            } => write!(
                f,
                "New result of test {identity} was found in file {source_name}"
            ),
            Self::Retained {
                identity,
                source_name,
                displaced: false,
            } => write!(f, "Test {identity} was found in file {source_name}"),
            Self::MissingEntry { key, source_name } => write!(
                f,
                "no TestEntry for test {} (execution {}) in file {source_name}",
                key.test_id, key.execution_id
            ),
            Self::MissingDefinition {
                test_id,
                source_name,
            } => write!(f, "no UnitTest definition for test {test_id} in file {source_name}"),
        }
    }
}

#[derive(Debug)]
struct Slot {
    record: TestRecord,
    entry: Option<Element>,
}

#[derive(Debug, Default)]
struct MergeState {
    // Insertion order is the order each test was first retained.
    slots: IndexMap<TestIdentity, Slot>,
    // Keyed by testId, in the order each testId was first retained.
    definitions: IndexMap<String, Element>,
    ledger: OutcomeLedger,
    times: TimeEnvelope,
    // The root namespace of the last source folded in.
    namespace: Option<String>,
    diagnostics: Vec<MergeDiagnostic>,
}

impl MergeState {
    fn fold_source(&mut self, source: &TrxSource) -> Result<(), MergeErrorKind> {
        let document = Document::from_slice(source.contents())?;
        let root = &document.root;
        self.namespace = root.namespace.clone();

        if let Some(times) = root.first_descendant(TIMES_TAG) {
            self.times.observe(TimesObservation::from_element(times)?);
        }

        let index = SourceIndex::new(root);
        let results: Vec<_> = root.descendants(UNIT_TEST_RESULT_TAG).collect();
        self.record(MergeDiagnostic::SourceRead {
            source_name: source.name().to_owned(),
            result_count: results.len(),
        });

        for result in results {
            let record = TestRecord::from_element(result.clone())?;
            self.offer(record, &index, source.name());
        }

        Ok(())
    }

    fn offer(&mut self, record: TestRecord, index: &SourceIndex<'_>, source_name: &str) {
        let displaced = match self.slots.get(record.identity()) {
            Some(held) if !record.supersedes(&held.record) => return,
            Some(held) => {
                self.ledger.decrement(held.record.outcome());
                true
            }
            None => false,
        };

        let test_id = &record.identity().test_id;
        match index.definitions.get(test_id.as_str()) {
            // IndexMap::insert keeps the position of an existing key.
            Some(&definition) => {
                self.definitions.insert(test_id.clone(), definition.clone());
            }
            None if !self.definitions.contains_key(test_id) => {
                self.record(MergeDiagnostic::MissingDefinition {
                    test_id: test_id.clone(),
                    source_name: source_name.to_owned(),
                });
            }
            None => {}
        }

        let entry = index.entries.get(record.entry_key()).map(|&entry| entry.clone());
        if entry.is_none() {
            self.record(MergeDiagnostic::MissingEntry {
                key: record.entry_key().clone(),
                source_name: source_name.to_owned(),
            });
        }

        self.ledger.increment(record.outcome());
        self.record(MergeDiagnostic::Retained {
            identity: record.identity().clone(),
            source_name: source_name.to_owned(),
            displaced,
        });

        self.slots
            .insert(record.identity().clone(), Slot { record, entry });
    }

    // Every diagnostic is logged here and nowhere else.
    fn record(&mut self, diagnostic: MergeDiagnostic) {
        match &diagnostic {
            MergeDiagnostic::MissingEntry { .. } | MergeDiagnostic::MissingDefinition { .. } => {
                info!("{diagnostic}")
            }
            _ => debug!("{diagnostic}"),
        }
        self.diagnostics.push(diagnostic);
    }

    fn finish(self, output_namespace: Option<&str>) -> MergedRun {
        let namespace = self.namespace.as_deref();
        let wrapper = |name: &str| {
            let mut element = Element::new(name);
            element.set_namespace(namespace);
            element
        };

        let mut results = wrapper(RESULTS_TAG);
        let mut entries = wrapper(TEST_ENTRIES_TAG);
        for slot in self.slots.into_values() {
            results.add_child(slot.record.into_element());
            if let Some(entry) = slot.entry {
                entries.add_child(entry);
            }
        }
        let mut definitions = wrapper(TEST_DEFINITIONS_TAG);
        definitions.add_children(self.definitions.into_values());

        let summary = self.ledger.summarize();

        let mut root = wrapper(TEST_RUN_TAG);
        if let Some(times) = self.times.to_element(namespace) {
            root.add_child(times);
        }
        root.add_child(results)
            .add_child(definitions)
            .add_child(entries)
            .add_child(summary.to_element(namespace));

        let mut document = Document::new(root);
        if let Some(output_namespace) = output_namespace {
            document.replace_all_namespaces(output_namespace);
        }

        MergedRun {
            document,
            summary,
            times: self.times,
            diagnostics: self.diagnostics,
        }
    }
}

/// Lookups into a single source. Where a key appears more than once, the first element wins.
struct SourceIndex<'a> {
    definitions: HashMap<&'a str, &'a Element>,
    entries: HashMap<TestEntryKey, &'a Element>,
}

impl<'a> SourceIndex<'a> {
    fn new(root: &'a Element) -> Self {
        let mut definitions = HashMap::new();
        for definition in root.descendants(UNIT_TEST_TAG) {
            if let Some(id) = definition.attribute(DEFINITION_ID_ATTR) {
                definitions.entry(id).or_insert(definition);
            }
        }

        let mut entries = HashMap::new();
        for entry in root.descendants(TEST_ENTRY_TAG) {
            if let Some(key) = entry_key_of(entry) {
                entries.entry(key).or_insert(entry);
            }
        }

        Self {
            definitions,
            entries,
        }
    }
}
