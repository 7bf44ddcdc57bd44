// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keys used to deduplicate test results.

use std::fmt;

/// The deduplication key for a test result: `(testId, testName)`.
///
/// Two results with the same identity occupy the same logical slot, and only the one with the
/// latest `endTime` is kept.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestIdentity {
    /// The `testId` attribute, stable across runs for the same test.
    pub test_id: String,

    /// The `testName` attribute.
    pub test_name: String,
}

impl TestIdentity {
    /// Creates a new `TestIdentity`.
    pub fn new(test_id: impl Into<String>, test_name: impl Into<String>) -> Self {
        Self {
            test_id: test_id.into(),
            test_name: test_name.into(),
        }
    }
}

impl fmt::Display for TestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.test_name, self.test_id)
    }
}

/// Identifies one execution of a test: `(testId, executionId)`.
///
/// This is how `UnitTestResult` elements are paired with their `TestEntry`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestEntryKey {
    /// The `testId` attribute.
    pub test_id: String,

    /// The `executionId` attribute, unique per execution.
    pub execution_id: String,
}

impl TestEntryKey {
    /// Creates a new `TestEntryKey`.
    pub fn new(test_id: impl Into<String>, execution_id: impl Into<String>) -> Self {
        Self {
            test_id: test_id.into(),
            execution_id: execution_id.into(),
        }
    }
}

/// Both keys derived from a single test result.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TestIdentities {
    /// The deduplication key.
    pub identity: TestIdentity,

    /// The key of the matching `TestEntry`.
    pub entry: TestEntryKey,
}

impl TestIdentities {
    /// Resolves the keys for a result with the given attributes.
    ///
    /// Identical `(test_id, test_name)` pairs always produce equal identities, regardless of which
    /// document they came from.
    pub fn new(test_id: &str, test_name: &str, execution_id: &str) -> Self {
        Self {
            identity: TestIdentity::new(test_id, test_name),
            entry: TestEntryKey::new(test_id, execution_id),
        }
    }
}

impl fmt::Display for TestIdentities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [execution {}]",
            self.identity, self.entry.execution_id
        )
    }
}
