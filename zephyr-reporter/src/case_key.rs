// Copyright (c) The zephyr-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identifiers for test executions and the test cases they belong to.

use regex::Regex;
use std::{borrow::Borrow, fmt, sync::LazyLock};

static CASE_KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"T\d+").expect("case key pattern is valid"));

/// The key of a test case in the test-management system, without its project prefix, e.g.
/// `T123`.
///
/// Several [`TestNodeId`]s map to the same key when a test is parametrized.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TestCaseKey(String);

impl TestCaseKey {
    /// Extracts the case key from a node id: the leftmost occurrence of `T` followed by digits.
    ///
    /// Returns `None` for tests that aren't linked to a test case.
    pub fn extract(node_id: &str) -> Option<Self> {
        CASE_KEY_PATTERN
            .find(node_id)
            .map(|m| Self(m.as_str().to_owned()))
    }

    /// Creates a key from a string that is already a case key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TestCaseKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TestCaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The identity of a single concrete test execution, including any parametrization suffix,
/// e.g. `tests/test_login.py::test_T12_login[admin]`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TestNodeId(String);

impl TestNodeId {
    /// Creates a new node id.
    pub fn new(node_id: impl Into<String>) -> Self {
        Self(node_id.into())
    }

    /// Returns the node id as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the case key this execution belongs to, if any.
    pub fn case_key(&self) -> Option<TestCaseKey> {
        TestCaseKey::extract(&self.0)
    }
}

impl Borrow<str> for TestNodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TestNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
