// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::MergeErrorKind,
    identity::{TestEntryKey, TestIdentities, TestIdentity},
    outcome::TestOutcome,
    times::TrxTimestamp,
};
use quick_trx::Element;

pub(crate) static TEST_RUN_TAG: &str = "TestRun";
pub(crate) static UNIT_TEST_RESULT_TAG: &str = "UnitTestResult";
pub(crate) static UNIT_TEST_TAG: &str = "UnitTest";
pub(crate) static TEST_ENTRY_TAG: &str = "TestEntry";
pub(crate) static RESULTS_TAG: &str = "Results";
pub(crate) static TEST_DEFINITIONS_TAG: &str = "TestDefinitions";
pub(crate) static TEST_ENTRIES_TAG: &str = "TestEntries";

static TEST_ID_ATTR: &str = "testId";
static TEST_NAME_ATTR: &str = "testName";
static EXECUTION_ID_ATTR: &str = "executionId";
static END_TIME_ATTR: &str = "endTime";
static OUTCOME_ATTR: &str = "outcome";
pub(crate) static DEFINITION_ID_ATTR: &str = "id";

/// A single `UnitTestResult`, with the attributes needed to merge it extracted up front.
///
/// The element itself is carried along unchanged, including any attributes and children the merge
/// doesn't look at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestRecord {
    identities: TestIdentities,
    end_time: TrxTimestamp,
    outcome: TestOutcome,
    element: Element,
}

impl TestRecord {
    /// Extracts a record from a `UnitTestResult` element.
    ///
    /// Returns an error if a required attribute is missing, if `testId` or `outcome` is empty, or
    /// if `endTime` can't be parsed.
    pub fn from_element(element: Element) -> Result<Self, MergeErrorKind> {
        let test_id = required(&element, TEST_ID_ATTR)?;
        if test_id.trim().is_empty() {
            return Err(MergeErrorKind::EmptyAttribute {
                element: UNIT_TEST_RESULT_TAG,
                attribute: TEST_ID_ATTR,
            });
        }
        let test_name = required(&element, TEST_NAME_ATTR)?;
        let execution_id = required(&element, EXECUTION_ID_ATTR)?;
        let identities = TestIdentities::new(test_id, test_name, execution_id);

        let end_time = TrxTimestamp::from_attribute(&element, UNIT_TEST_RESULT_TAG, END_TIME_ATTR)?
            .ok_or(MergeErrorKind::MissingAttribute {
                element: UNIT_TEST_RESULT_TAG,
                attribute: END_TIME_ATTR,
            })?;

        let outcome = TestOutcome::new(required(&element, OUTCOME_ATTR)?).ok_or(
            MergeErrorKind::EmptyAttribute {
                element: UNIT_TEST_RESULT_TAG,
                attribute: OUTCOME_ATTR,
            },
        )?;

        Ok(Self {
            identities,
            end_time,
            outcome,
            element,
        })
    }

    /// The deduplication key for this record.
    pub fn identity(&self) -> &TestIdentity {
        &self.identities.identity
    }

    /// The key of the `TestEntry` for this execution.
    pub fn entry_key(&self) -> &TestEntryKey {
        &self.identities.entry
    }

    /// Both keys, for display.
    pub fn identities(&self) -> &TestIdentities {
        &self.identities
    }

    /// When this execution finished.
    pub fn end_time(&self) -> &TrxTimestamp {
        &self.end_time
    }

    /// The outcome of this execution.
    pub fn outcome(&self) -> &TestOutcome {
        &self.outcome
    }

    /// The original `UnitTestResult` element.
    pub fn element(&self) -> &Element {
        &self.element
    }

    /// Returns true if `self` should displace `held`: its `endTime` is strictly later.
    pub fn supersedes(&self, held: &TestRecord) -> bool {
        held.end_time.value() < self.end_time.value()
    }

    /// Consumes the record, returning the original element.
    pub fn into_element(self) -> Element {
        self.element
    }
}

fn required<'a>(element: &'a Element, attribute: &'static str) -> Result<&'a str, MergeErrorKind> {
    element
        .attribute(attribute)
        .ok_or(MergeErrorKind::MissingAttribute {
            element: UNIT_TEST_RESULT_TAG,
            attribute,
        })
}

/// Returns the `(testId, executionId)` key of a `TestEntry`, or `None` if either is absent.
pub(crate) fn entry_key_of(element: &Element) -> Option<TestEntryKey> {
    let test_id = element.attribute(TEST_ID_ATTR)?;
    let execution_id = element.attribute(EXECUTION_ID_ATTR)?;
    Some(TestEntryKey::new(test_id, execution_id))
}
