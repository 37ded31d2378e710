// Copyright (c) The zephyr-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collects test outcomes over a session, keyed by test case.
//!
//! The main type here is [`ResultAggregator`], which is fed one event per test execution and
//! turned into an immutable [`ResultSnapshot`] once the session ends.

use crate::{
    case_key::{TestCaseKey, TestNodeId},
    status::TestOutcome,
};
use indexmap::IndexMap;
use std::sync::{Mutex, PoisonError};
use tracing::trace;

/// The outcome of one execution, along with the case it belongs to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Execution {
    /// The case key extracted from the node id.
    pub case_key: TestCaseKey,

    /// The outcome of the execution.
    pub outcome: TestOutcome,
}

/// Collects test outcomes as they are reported.
///
/// [`record`](Self::record) takes `&self`, so the aggregator can be shared between worker
/// threads. Each call updates all state under a single lock.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    state: Mutex<ResultSnapshot>,
}

impl ResultAggregator {
    /// Creates an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of a single test execution.
    ///
    /// Returns the case key the execution was recorded under, or `None` if the node id has no
    /// case key (in which case nothing is recorded).
    pub fn record(&self, node_id: &str, outcome: TestOutcome) -> Option<TestCaseKey> {
        let Some(case_key) = TestCaseKey::extract(node_id) else {
            trace!(node_id, "no test case key found, not tracking");
            return None;
        };

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.insert(TestNodeId::new(node_id), case_key.clone(), outcome);
        trace!(node_id, %case_key, ?outcome, "recorded test outcome");

        Some(case_key)
    }

    /// Returns a copy of the results recorded so far.
    pub fn snapshot(&self) -> ResultSnapshot {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Finishes collection, returning the final results.
    pub fn into_snapshot(self) -> ResultSnapshot {
        self.state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// The results of a session: per-execution outcomes and the reduced outcome of each case.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ResultSnapshot {
    // Keys are in the order cases were first seen.
    cases: IndexMap<TestCaseKey, TestOutcome>,
    executions: IndexMap<TestNodeId, Execution>,
}

impl ResultSnapshot {
    fn insert(&mut self, node_id: TestNodeId, case_key: TestCaseKey, outcome: TestOutcome) {
        // A rerun of the same node overwrites its previous outcome but keeps its position.
        self.executions.insert(
            node_id,
            Execution {
                case_key: case_key.clone(),
                outcome,
            },
        );

        self.cases
            .entry(case_key)
            .and_modify(|existing| *existing = existing.merge(outcome))
            .or_insert(outcome);
    }

    /// Returns true if no case was recorded.
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Returns the case keys in the order they were first recorded.
    pub fn case_keys(&self) -> impl ExactSizeIterator<Item = &TestCaseKey> + '_ {
        self.cases.keys()
    }

    /// Returns the reduced outcome of every case, in the order cases were first recorded.
    pub fn case_outcomes(&self) -> &IndexMap<TestCaseKey, TestOutcome> {
        &self.cases
    }

    /// Returns the reduced outcome of a case: failed if any execution failed.
    pub fn case_outcome(&self, case_key: &str) -> Option<TestOutcome> {
        self.cases.get(case_key).copied()
    }

    /// Returns every recorded execution, in the order node ids were first recorded.
    pub fn executions(&self) -> &IndexMap<TestNodeId, Execution> {
        &self.executions
    }

    /// Returns the outcomes of the executions of one case, in the order node ids were first
    /// recorded.
    pub fn outcomes_for<'a>(
        &'a self,
        case_key: &'a TestCaseKey,
    ) -> impl Iterator<Item = TestOutcome> + 'a {
        self.executions
            .values()
            .filter(move |execution| &execution.case_key == case_key)
            .map(|execution| execution.outcome)
    }
}
