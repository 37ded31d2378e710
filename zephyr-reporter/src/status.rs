// Copyright (c) The zephyr-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test outcomes and the server's status catalogs.

use crate::errors::StatusCatalogError;
use std::{collections::BTreeMap, fmt};
use zephyr_metadata::{StatusEntry, StatusId};

/// The outcome of a single test execution, as reported by the host test runner.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum TestOutcome {
    /// The test passed.
    Pass,

    /// The test failed.
    Fail,
}

impl TestOutcome {
    /// Converts the host runner's pass/fail flag.
    pub fn from_passed(passed: bool) -> Self {
        if passed { Self::Pass } else { Self::Fail }
    }

    /// Returns true if this is a failure.
    pub fn is_failure(self) -> bool {
        self == Self::Fail
    }

    /// Combines the outcome recorded so far for a test case with the outcome of a later
    /// execution of the same case.
    ///
    /// A failure is never replaced: once any execution fails, the case has failed.
    pub fn merge(self, later: Self) -> Self {
        if later.is_failure() { later } else { self }
    }
}

/// The statuses a test result can have on the server.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum ResultStatus {
    /// Passed.
    Pass,

    /// Failed.
    Fail,

    /// Not run yet.
    NotExecuted,

    /// Being run.
    InProgress,

    /// Could not be run.
    Blocked,
}

impl ResultStatus {
    /// All statuses known to the reporter.
    pub const ALL: [Self; 5] = [
        Self::Pass,
        Self::Fail,
        Self::NotExecuted,
        Self::InProgress,
        Self::Blocked,
    ];

    /// Returns the normalized (uppercase) name of the status.
    pub fn name(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::NotExecuted => "NOT EXECUTED",
            Self::InProgress => "IN PROGRESS",
            Self::Blocked => "BLOCKED",
        }
    }

    /// Returns true if `remote_name`, as returned by the server, names this status.
    pub fn matches(self, remote_name: &str) -> bool {
        remote_name.trim().eq_ignore_ascii_case(self.name())
    }
}

impl From<TestOutcome> for ResultStatus {
    fn from(outcome: TestOutcome) -> Self {
        match outcome {
            TestOutcome::Pass => Self::Pass,
            TestOutcome::Fail => Self::Fail,
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The ids the server assigns to each [`ResultStatus`].
///
/// Resolved once per session. Construction fails if the server doesn't know about `PASS` or
/// `FAIL`, so every [`TestOutcome`] has an id.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatusCatalog {
    pass: StatusId,
    fail: StatusId,
    others: BTreeMap<ResultStatus, StatusId>,
}

impl StatusCatalog {
    /// Builds the catalog from the server's test result statuses.
    ///
    /// Names are matched case-insensitively. If several entries share a name, the first one wins.
    pub fn from_entries(entries: &[StatusEntry]) -> Result<Self, StatusCatalogError> {
        let mut ids = BTreeMap::new();
        for entry in entries {
            if let Some(status) = ResultStatus::ALL
                .into_iter()
                .find(|status| status.matches(&entry.name))
            {
                ids.entry(status).or_insert(entry.id);
            }
        }

        let mut take = |status: ResultStatus| {
            ids.remove(&status).ok_or_else(|| StatusCatalogError::MissingStatus {
                status,
                known: entries.iter().map(|entry| entry.name.clone()).collect(),
            })
        };
        let pass = take(ResultStatus::Pass)?;
        let fail = take(ResultStatus::Fail)?;

        Ok(Self {
            pass,
            fail,
            others: ids,
        })
    }

    /// Returns the id of a status, if the server has it.
    pub fn get(&self, status: ResultStatus) -> Option<StatusId> {
        match status {
            ResultStatus::Pass => Some(self.pass),
            ResultStatus::Fail => Some(self.fail),
            other => self.others.get(&other).copied(),
        }
    }

    /// Returns the id of the status corresponding to a test outcome.
    pub fn status_id(&self, outcome: TestOutcome) -> StatusId {
        match outcome {
            TestOutcome::Pass => self.pass,
            TestOutcome::Fail => self.fail,
        }
    }
}

/// Picks the status a new test cycle starts with: `Not Executed` if the server has it, otherwise
/// the first status in the catalog.
pub fn initial_cycle_status(entries: &[StatusEntry]) -> Option<StatusId> {
    entries
        .iter()
        .find(|entry| ResultStatus::NotExecuted.matches(&entry.name))
        .or_else(|| entries.first())
        .map(|entry| entry.id)
}
